//! Control-flow lowering: turns a checked word's statement tree into a flat
//! list of basic blocks, the shape a relooper pass or a direct
//! structured-control-flow WASM emitter can both consume.
//!
//! A block's `branches` are tried in order; the first entry whose `cond`
//! is `None` is an unconditional fallthrough and ends the list (nothing
//! after it can ever be reached). An empty `branches` list means the
//! block falls off the end of the function — only valid when its last
//! statement is a `Return`.
//!
//! `Goto`/label statements are not resolved into the graph here — this
//! AST has no `Label` statement kind to resolve a jump target against, so
//! a `Goto` is carried through into a block's own `stmts` unchanged for a
//! later pass to handle.
//!
//! A `for`-loop's post-statement is recorded once in the header block's
//! `piggyback` list rather than duplicated into every `continue`
//! predecessor — `Stmt`/`Exp` have no `Clone` impl in this crate, so
//! physical duplication isn't available here. A backend that needs a
//! separate copy per predecessor edge (e.g. because it lowers `piggyback`
//! by inlining rather than by a shared label) does that duplication
//! itself; `relooper_handle` exists for exactly this kind of
//! backend-owned annotation.

use crate::ast::{Blk, Exp, JumpKind, LoopKind, OpKind, Stmt, StmtKind, WordDef, exp_new_op, exp_new_reg, stmt_new_assign};
use crate::value::Value;
use std::cell::Cell;

pub type BlockId = usize;

/// Opaque slot a relooper/codegen pass can stash its own bookkeeping in;
/// this crate never interprets it.
pub type RelooperHandle = u32;

#[derive(Debug)]
pub struct Branch {
    pub cond: Option<Exp>,
    pub target: BlockId,
}

#[derive(Debug)]
pub struct BasicBlock {
    pub stmts: Vec<Stmt>,
    pub branches: Vec<Branch>,
    pub piggyback: Vec<Stmt>,
    pub relooper_handle: Cell<Option<RelooperHandle>>,
}

impl BasicBlock {
    fn new() -> Self {
        BasicBlock {
            stmts: Vec::new(),
            branches: Vec::new(),
            piggyback: Vec::new(),
            relooper_handle: Cell::new(None),
        }
    }
}

/// Builds the block list for one checked word's body. Block 0 is always
/// the entry block.
pub struct IrBuilder {
    blocks: Vec<BasicBlock>,
    current: BlockId,
    break_targets: Vec<BlockId>,
    continue_targets: Vec<BlockId>,
    next_reg: u32,
}

impl IrBuilder {
    fn new() -> Self {
        IrBuilder {
            blocks: vec![BasicBlock::new()],
            current: 0,
            break_targets: Vec::new(),
            continue_targets: Vec::new(),
            next_reg: 0,
        }
    }

    pub fn build(word: WordDef) -> Vec<BasicBlock> {
        #[cfg(debug_assertions)]
        debug_assert_blk_checked(&word.body);

        let mut builder = IrBuilder::new();
        builder.lower_blk(word.body);
        builder.blocks
    }

    fn new_block(&mut self) -> BlockId {
        self.blocks.push(BasicBlock::new());
        self.blocks.len() - 1
    }

    fn seal_new_block(&mut self) -> BlockId {
        let next = self.new_block();
        self.current = next;
        next
    }

    fn push_stmt(&mut self, stmt: Stmt) {
        self.blocks[self.current].stmts.push(stmt);
    }

    fn push_branch(&mut self, cond: Option<Exp>, target: BlockId) {
        self.blocks[self.current].branches.push(Branch { cond, target });
    }

    fn fresh_reg(&mut self) -> u32 {
        let reg = self.next_reg;
        self.next_reg += 1;
        reg
    }

    fn lower_blk(&mut self, blk: Blk) {
        for stmt in blk.stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: Stmt) {
        let Stmt { kind, pos } = stmt;
        match kind {
            StmtKind::If { cond, then_blk, elifs, else_blk } => self.lower_if(cond, then_blk, elifs, else_blk),
            StmtKind::Loop { kind, init, cond, post, body } => self.lower_loop(kind, init, cond, post, body),
            StmtKind::Switch { cond, body } => self.lower_switch(cond, body),
            StmtKind::Jump { kind, cond } => self.lower_jump(kind, cond),
            StmtKind::Blk(inner) => self.lower_blk(inner),
            StmtKind::Return { arg } => {
                self.push_stmt(Stmt { kind: StmtKind::Return { arg }, pos });
                self.seal_new_block();
            }
            other => self.push_stmt(Stmt { kind: other, pos }),
        }
    }

    /// Lays every arm (`if`, each `elif`, a trailing `else`) as a flat,
    /// ordered branch list on the block the `if` started in, rather than
    /// a chain of per-condition dispatch blocks — each arm's body gets its
    /// own block and gotos the shared join.
    fn lower_if(&mut self, cond: Exp, then_blk: Blk, elifs: Vec<(Exp, Blk)>, else_blk: Option<Blk>) {
        let join = self.new_block();
        let entry = self.current;

        let has_else = else_blk.is_some();
        let mut conds: Vec<Option<Exp>> = vec![Some(cond)];
        let mut bodies: Vec<Blk> = vec![then_blk];
        for (c, b) in elifs {
            conds.push(Some(c));
            bodies.push(b);
        }
        if let Some(b) = else_blk {
            conds.push(None);
            bodies.push(b);
        }

        let targets: Vec<BlockId> = bodies.iter().map(|_| self.new_block()).collect();

        self.current = entry;
        for (cond, target) in conds.into_iter().zip(targets.iter().copied()) {
            self.push_branch(cond, target);
        }
        if !has_else {
            self.push_branch(None, join);
        }

        for (body, target) in bodies.into_iter().zip(targets.into_iter()) {
            self.current = target;
            self.lower_blk(body);
            self.push_branch(None, join);
        }

        self.current = join;
    }

    /// `continue` always targets `head`; a `for`-loop's `post` statement is
    /// stashed on `head`'s `piggyback` rather than re-lowered into a
    /// dedicated back-edge block (see the module doc comment).
    fn lower_loop(&mut self, _kind: LoopKind, init: Option<Box<Stmt>>, cond: Option<Exp>, post: Option<Box<Stmt>>, body: Blk) {
        if let Some(init) = init {
            self.lower_stmt(*init);
        }

        let head = self.new_block();
        self.push_branch(None, head);
        self.current = head;

        let body_start = self.new_block();
        let after = self.new_block();
        match cond {
            Some(cond) => {
                self.push_branch(Some(cond), body_start);
                self.push_branch(None, after);
            }
            None => self.push_branch(None, body_start),
        }

        if let Some(post_stmt) = post {
            self.blocks[head].piggyback.push(*post_stmt);
        }

        self.break_targets.push(after);
        self.continue_targets.push(head);

        self.current = body_start;
        self.lower_blk(body);
        self.push_branch(None, head);

        self.break_targets.pop();
        self.continue_targets.pop();
        self.current = after;
    }

    /// Hoists the discriminant into a synthetic register (so it's only
    /// evaluated once) and dispatches on it with one equality branch per
    /// case; a case with no body falls through to the next, matching
    /// C-style switch fallthrough. A `default` case wins only when no
    /// value matches, regardless of where it appears in source order.
    fn lower_switch(&mut self, cond: Exp, body: Blk) {
        let after = self.new_block();
        self.break_targets.push(after);

        let reg = self.fresh_reg();
        let reg_pos = cond.pos.clone();
        self.push_stmt(stmt_new_assign(exp_new_reg(reg, reg_pos.clone()), cond, reg_pos));

        let mut segments: Vec<(Option<Exp>, Vec<Stmt>)> = Vec::new();
        for stmt in body.stmts {
            match stmt.kind {
                StmtKind::Case { val } => segments.push((val, Vec::new())),
                other => {
                    if let Some(last) = segments.last_mut() {
                        last.1.push(Stmt { kind: other, pos: stmt.pos });
                    }
                }
            }
        }

        let dispatch = self.current;
        let mut conds: Vec<Option<Exp>> = Vec::new();
        let targets: Vec<BlockId> = segments.iter().map(|_| self.new_block()).collect();
        let mut bodies: Vec<Vec<Stmt>> = Vec::new();
        for (val, stmts) in segments {
            conds.push(val);
            bodies.push(stmts);
        }

        self.current = dispatch;
        let mut default_target = None;
        for (val, target) in conds.into_iter().zip(targets.iter().copied()) {
            match val {
                Some(case_val) => {
                    let val_pos = case_val.pos.clone();
                    let eq = exp_new_op(OpKind::Eq, exp_new_reg(reg, val_pos.clone()), Some(case_val), val_pos);
                    self.push_branch(Some(eq), target);
                }
                None => default_target = Some(target),
            }
        }
        self.push_branch(None, default_target.unwrap_or(after));

        let last = targets.len().saturating_sub(1);
        for i in 0..targets.len() {
            self.current = targets[i];
            for stmt in std::mem::take(&mut bodies[i]) {
                self.lower_stmt(stmt);
            }
            let next = if i < last { targets[i + 1] } else { after };
            self.push_branch(None, next);
        }

        self.break_targets.pop();
        self.current = after;
    }

    fn lower_jump(&mut self, kind: JumpKind, cond: Option<Exp>) {
        let target = match kind {
            JumpKind::Break => *self.break_targets.last().expect("break outside a loop or switch"),
            JumpKind::Continue => *self.continue_targets.last().expect("continue outside a loop"),
        };
        match cond {
            Some(cond) => {
                let fallthrough = self.new_block();
                self.push_branch(Some(cond), target);
                self.push_branch(None, fallthrough);
                self.current = fallthrough;
            }
            None => {
                self.push_branch(None, target);
                self.seal_new_block();
            }
        }
    }
}

#[cfg(debug_assertions)]
fn debug_assert_blk_checked(blk: &Blk) {
    for stmt in &blk.stmts {
        debug_assert_stmt_checked(stmt);
    }
}

#[cfg(debug_assertions)]
fn debug_assert_stmt_checked(stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Exp(exp) => debug_assert_exp_checked(exp),
        StmtKind::Assign { l, r } => {
            debug_assert_exp_checked(l);
            debug_assert_exp_checked(r);
        }
        StmtKind::If { cond, then_blk, elifs, else_blk } => {
            debug_assert_exp_checked(cond);
            debug_assert_blk_checked(then_blk);
            for (c, b) in elifs {
                debug_assert_exp_checked(c);
                debug_assert_blk_checked(b);
            }
            if let Some(b) = else_blk {
                debug_assert_blk_checked(b);
            }
        }
        StmtKind::Loop { cond, body, .. } => {
            if let Some(c) = cond {
                debug_assert_exp_checked(c);
            }
            debug_assert_blk_checked(body);
        }
        StmtKind::Switch { cond, body } => {
            debug_assert_exp_checked(cond);
            debug_assert_blk_checked(body);
        }
        StmtKind::Return { arg: Some(arg) } => debug_assert_exp_checked(arg),
        StmtKind::Blk(b) => debug_assert_blk_checked(b),
        StmtKind::Pragma { val_exp, desc_exp, .. } => {
            debug_assert_exp_checked(val_exp);
            if let Some(d) = desc_exp {
                debug_assert_exp_checked(d);
            }
        }
        _ => {}
    }
}

#[cfg(debug_assertions)]
fn debug_assert_exp_checked(exp: &Exp) {
    debug_assert!(
        exp.meta().kind() != crate::meta::MetaKind::None,
        "lowering an expression the checker never annotated"
    );
}
