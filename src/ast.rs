//! Position-tagged AST entities and their smart constructors.
//!
//! Everything in this module is produced by an external parser and consumed
//! by [`crate::checker`]; this crate never constructs source text into an
//! `Exp`/`Stmt` tree itself. The smart constructors here exist so a parser
//! doing error recovery can hand back a `None` for a node it couldn't
//! finish building, the same way the original C constructors return `NULL`
//! for a malformed child.

use crate::meta::Meta;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

/// A declaration, shared via a non-owning handle (see the cyclic-reference
/// design note: an `Exp::id` back-reference must never become an ownership
/// edge back into the tree that contains it).
pub type IdHandle = Rc<Id>;

/// Source position for diagnostics. Line/column are 0-indexed, matching the
/// teacher's `SourceLocation` convention (LSP wants 0-indexed positions).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pos {
    pub file: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(line: usize, column: usize) -> Self {
        Pos {
            file: None,
            line,
            column,
        }
    }

    pub fn in_file(file: PathBuf, line: usize, column: usize) -> Self {
        Pos {
            file: Some(file),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line + 1, self.column + 1),
            None => write!(f, "{}:{}", self.line + 1, self.column + 1),
        }
    }
}

/// A declared name: variable, parameter, function, struct, contract,
/// tuple-of-ids (destructuring target), or enum member.
#[derive(Debug)]
pub enum Id {
    Var {
        name: String,
        pos: Pos,
        meta: RefCell<Meta>,
        is_used: Cell<bool>,
    },
    Param {
        name: String,
        pos: Pos,
        meta: RefCell<Meta>,
        is_used: Cell<bool>,
    },
    Func {
        name: String,
        pos: Pos,
        is_used: Cell<bool>,
        params: Vec<IdHandle>,
        returns: Meta,
    },
    Struct {
        name: String,
        pos: Pos,
        meta: RefCell<Meta>,
        is_used: Cell<bool>,
        fields: Vec<IdHandle>,
    },
    Contract {
        name: String,
        pos: Pos,
        meta: RefCell<Meta>,
        is_used: Cell<bool>,
        fields: Vec<IdHandle>,
    },
    TupleOfIds {
        pos: Pos,
        is_used: Cell<bool>,
        elems: Vec<IdHandle>,
    },
    EnumMember {
        name: String,
        pos: Pos,
        meta: RefCell<Meta>,
        is_used: Cell<bool>,
        value: i64,
    },
}

impl Id {
    pub fn name(&self) -> &str {
        match self {
            Id::Var { name, .. }
            | Id::Param { name, .. }
            | Id::Func { name, .. }
            | Id::Struct { name, .. }
            | Id::Contract { name, .. }
            | Id::EnumMember { name, .. } => name,
            Id::TupleOfIds { .. } => "",
        }
    }

    pub fn pos(&self) -> &Pos {
        match self {
            Id::Var { pos, .. }
            | Id::Param { pos, .. }
            | Id::Func { pos, .. }
            | Id::Struct { pos, .. }
            | Id::Contract { pos, .. }
            | Id::TupleOfIds { pos, .. }
            | Id::EnumMember { pos, .. } => pos,
        }
    }

    /// The declaration's own Meta. Functions don't carry a scalar Meta of
    /// their own in this model (their type is the `(params) -> returns)`
    /// signature); callers needing the return type use [`Id::returns`].
    pub fn meta(&self) -> Meta {
        match self {
            Id::Var { meta, .. }
            | Id::Param { meta, .. }
            | Id::Struct { meta, .. }
            | Id::Contract { meta, .. }
            | Id::EnumMember { meta, .. } => meta.borrow().clone(),
            Id::Func { returns, .. } => returns.clone(),
            Id::TupleOfIds { elems, .. } => {
                Meta::tuple(elems.iter().map(|e| e.meta()).collect())
            }
        }
    }

    pub fn is_used(&self) -> bool {
        match self {
            Id::Var { is_used, .. }
            | Id::Param { is_used, .. }
            | Id::Func { is_used, .. }
            | Id::Struct { is_used, .. }
            | Id::Contract { is_used, .. }
            | Id::TupleOfIds { is_used, .. }
            | Id::EnumMember { is_used, .. } => is_used.get(),
        }
    }

    pub fn mark_used(&self) {
        match self {
            Id::Var { is_used, .. }
            | Id::Param { is_used, .. }
            | Id::Func { is_used, .. }
            | Id::Struct { is_used, .. }
            | Id::Contract { is_used, .. }
            | Id::TupleOfIds { is_used, .. }
            | Id::EnumMember { is_used, .. } => is_used.set(true),
        }
    }

    pub fn is_func(&self) -> bool {
        matches!(self, Id::Func { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Id::Struct { .. })
    }

    pub fn is_contract(&self) -> bool {
        matches!(self, Id::Contract { .. })
    }

    pub fn is_tuple(&self) -> bool {
        matches!(self, Id::TupleOfIds { .. })
    }

    pub fn params(&self) -> &[IdHandle] {
        match self {
            Id::Func { params, .. } => params,
            _ => &[],
        }
    }

    pub fn returns(&self) -> Meta {
        match self {
            Id::Func { returns, .. } => returns.clone(),
            other => other.meta(),
        }
    }

    pub fn fields(&self) -> &[IdHandle] {
        match self {
            Id::Struct { fields, .. } | Id::Contract { fields, .. } => fields,
            _ => &[],
        }
    }

    pub fn tuple_elems(&self) -> &[IdHandle] {
        match self {
            Id::TupleOfIds { elems, .. } => elems,
            _ => &[],
        }
    }
}

/// Operator kind for `Exp::Op`, grouped the way the checker dispatches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Inc,
    Dec,
    Not,
    Neg,
    And,
    Or,
    Assign,
}

impl OpKind {
    pub fn is_arith(self) -> bool {
        matches!(self, OpKind::Add | OpKind::Sub | OpKind::Mul | OpKind::Div | OpKind::Mod)
    }

    pub fn is_bit(self) -> bool {
        matches!(
            self,
            OpKind::BitAnd | OpKind::BitOr | OpKind::BitXor | OpKind::Shl | OpKind::Shr
        )
    }

    pub fn is_cmp(self) -> bool {
        matches!(
            self,
            OpKind::Eq | OpKind::Ne | OpKind::Lt | OpKind::Gt | OpKind::Le | OpKind::Ge
        )
    }

    pub fn is_unary(self) -> bool {
        matches!(self, OpKind::Inc | OpKind::Dec | OpKind::Not | OpKind::Neg)
    }

    pub fn is_bool_cmp(self) -> bool {
        matches!(self, OpKind::And | OpKind::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKind {
    Query,
    Insert,
    Update,
    Delete,
}

/// An expression node: the variant-specific payload, wrapped by
/// [`Exp`] with the three fields every expression carries regardless of
/// kind (`meta`, the resolved `id` back-reference, and source `pos`).
#[derive(Debug)]
pub enum ExpKind {
    Null,
    Id(String),
    Val(Value),
    Type {
        ty: crate::meta::MetaKind,
        key: Option<Box<Exp>>,
        value: Option<Box<Exp>>,
        name: Option<String>,
    },
    Array {
        base: Box<Exp>,
        index: Box<Exp>,
    },
    Op {
        op: OpKind,
        l: Box<Exp>,
        r: Option<Box<Exp>>,
    },
    Access {
        base: Box<Exp>,
        field: Box<Exp>,
    },
    Call {
        callee: Box<Exp>,
        args: Vec<Exp>,
    },
    Sql {
        kind: SqlKind,
        text: String,
    },
    Ternary {
        pre: Box<Exp>,
        inner: Box<Exp>,
        post: Box<Exp>,
    },
    Tuple(Vec<Exp>),
    Reg(u32),
    Global(String),
    Mem {
        base: u32,
        addr: u32,
        offset: u32,
    },
}

#[derive(Debug)]
pub struct Exp {
    pub kind: ExpKind,
    pub pos: Pos,
    meta: RefCell<Meta>,
    id: RefCell<Option<IdHandle>>,
}

impl Exp {
    fn new(kind: ExpKind, pos: Pos) -> Self {
        Exp {
            kind,
            pos,
            meta: RefCell::new(Meta::none()),
            id: RefCell::new(None),
        }
    }

    pub fn meta(&self) -> Meta {
        self.meta.borrow().clone()
    }

    pub fn set_meta(&self, meta: Meta) {
        *self.meta.borrow_mut() = meta;
    }

    pub fn id(&self) -> Option<IdHandle> {
        self.id.borrow().clone()
    }

    pub fn set_id(&self, id: IdHandle) {
        *self.id.borrow_mut() = Some(id);
    }

    pub fn is_lvalue_shape(&self) -> bool {
        matches!(self.kind, ExpKind::Id(_) | ExpKind::Array { .. } | ExpKind::Access { .. })
    }
}

pub fn exp_new_null(pos: Pos) -> Exp {
    Exp::new(ExpKind::Null, pos)
}

pub fn exp_new_id(name: impl Into<String>, pos: Pos) -> Exp {
    Exp::new(ExpKind::Id(name.into()), pos)
}

pub fn exp_new_val(value: Value, pos: Pos) -> Exp {
    Exp::new(ExpKind::Val(value), pos)
}

pub fn exp_new_lit_int(magnitude: u64, pos: Pos) -> Exp {
    exp_new_val(
        Value::Int {
            magnitude,
            negative: false,
        },
        pos,
    )
}

pub fn exp_new_type(
    ty: crate::meta::MetaKind,
    key: Option<Exp>,
    value: Option<Exp>,
    name: Option<String>,
    pos: Pos,
) -> Exp {
    Exp::new(
        ExpKind::Type {
            ty,
            key: key.map(Box::new),
            value: value.map(Box::new),
            name,
        },
        pos,
    )
}

/// Models error recovery for a malformed subscript: if either child is
/// missing, there is no sensible node to build.
pub fn exp_new_array(base: Option<Exp>, index: Option<Exp>, pos: Pos) -> Option<Exp> {
    Some(Exp::new(
        ExpKind::Array {
            base: Box::new(base?),
            index: Box::new(index?),
        },
        pos,
    ))
}

pub fn exp_new_op(op: OpKind, l: Exp, r: Option<Exp>, pos: Pos) -> Exp {
    Exp::new(
        ExpKind::Op {
            op,
            l: Box::new(l),
            r: r.map(Box::new),
        },
        pos,
    )
}

pub fn exp_new_access(base: Option<Exp>, field: Option<Exp>, pos: Pos) -> Option<Exp> {
    Some(Exp::new(
        ExpKind::Access {
            base: Box::new(base?),
            field: Box::new(field?),
        },
        pos,
    ))
}

pub fn exp_new_call(callee: Exp, args: Vec<Exp>, pos: Pos) -> Exp {
    Exp::new(
        ExpKind::Call {
            callee: Box::new(callee),
            args,
        },
        pos,
    )
}

pub fn exp_new_sql(kind: SqlKind, text: impl Into<String>, pos: Pos) -> Exp {
    Exp::new(
        ExpKind::Sql {
            kind,
            text: text.into(),
        },
        pos,
    )
}

pub fn exp_new_ternary(pre: Exp, inner: Exp, post: Exp, pos: Pos) -> Exp {
    Exp::new(
        ExpKind::Ternary {
            pre: Box::new(pre),
            inner: Box::new(inner),
            post: Box::new(post),
        },
        pos,
    )
}

pub fn exp_new_tuple(elems: Vec<Exp>, pos: Pos) -> Exp {
    Exp::new(ExpKind::Tuple(elems), pos)
}

pub fn exp_new_reg(idx: u32, pos: Pos) -> Exp {
    Exp::new(ExpKind::Reg(idx), pos)
}

pub fn exp_new_global(name: impl Into<String>, pos: Pos) -> Exp {
    Exp::new(ExpKind::Global(name.into()), pos)
}

pub fn exp_new_mem(base: u32, addr: u32, offset: u32, pos: Pos) -> Exp {
    Exp::new(ExpKind::Mem { base, addr, offset }, pos)
}

/// Lexical block kind — drives which statements are legal (e.g. `CASE`
/// only inside a `Switch` body) and how lowering opens new basic blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlkKind {
    Func,
    Loop,
    If,
    Switch,
    Plain,
}

/// A lexical block: an ordered sequence of statements plus an
/// embedder-owned scope frame handle this crate never interprets.
#[derive(Debug)]
pub struct Blk {
    pub kind: BlkKind,
    pub stmts: Vec<Stmt>,
    pub pos: Pos,
    /// Opaque scope-frame token assigned by the embedder; this crate only
    /// threads it through to `Scope::lookup_name`, never reads it itself.
    pub scope_frame: u64,
}

impl Blk {
    pub fn new(kind: BlkKind, pos: Pos) -> Self {
        Blk {
            kind,
            stmts: Vec::new(),
            pos,
            scope_frame: 0,
        }
    }

    pub fn with_scope_frame(kind: BlkKind, pos: Pos, scope_frame: u64) -> Self {
        Blk {
            kind,
            stmts: Vec::new(),
            pos,
            scope_frame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    For,
    While,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Break,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PragmaKind {
    Assert,
}

#[derive(Debug)]
pub enum StmtKind {
    Null,
    Id(IdHandle),
    Exp(Exp),
    Assign {
        l: Exp,
        r: Exp,
    },
    If {
        cond: Exp,
        then_blk: Blk,
        elifs: Vec<(Exp, Blk)>,
        else_blk: Option<Blk>,
    },
    Loop {
        kind: LoopKind,
        init: Option<Box<Stmt>>,
        cond: Option<Exp>,
        post: Option<Box<Stmt>>,
        body: Blk,
    },
    Switch {
        cond: Exp,
        body: Blk,
    },
    Case {
        val: Option<Exp>,
    },
    Return {
        arg: Option<Exp>,
    },
    Goto {
        label: String,
    },
    Jump {
        kind: JumpKind,
        cond: Option<Exp>,
    },
    Ddl(String),
    Blk(Blk),
    Pragma {
        kind: PragmaKind,
        val_exp: Exp,
        val_str: String,
        desc_exp: Option<Exp>,
    },
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

impl Stmt {
    fn new(kind: StmtKind, pos: Pos) -> Self {
        Stmt { kind, pos }
    }
}

pub fn stmt_new_null(pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Null, pos)
}

/// The id may be null because of grammar error recovery, so this
/// is the one constructor in the original C code that explicitly documents
/// returning `NULL` for a `NULL` child, preserved here as `None`.
pub fn stmt_new_id(id: Option<IdHandle>, pos: Pos) -> Option<Stmt> {
    Some(Stmt::new(StmtKind::Id(id?), pos))
}

pub fn stmt_new_exp(exp: Exp, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Exp(exp), pos)
}

pub fn stmt_new_assign(l: Exp, r: Exp, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Assign { l, r }, pos)
}

pub fn stmt_new_if(cond: Exp, then_blk: Blk, pos: Pos) -> Stmt {
    Stmt::new(
        StmtKind::If {
            cond,
            then_blk,
            elifs: Vec::new(),
            else_blk: None,
        },
        pos,
    )
}

pub fn stmt_add_elif(stmt: &mut Stmt, cond: Exp, blk: Blk) {
    if let StmtKind::If { elifs, .. } = &mut stmt.kind {
        elifs.push((cond, blk));
    }
}

pub fn stmt_set_else(stmt: &mut Stmt, blk: Blk) {
    if let StmtKind::If { else_blk, .. } = &mut stmt.kind {
        *else_blk = Some(blk);
    }
}

/// Guarantees the returned loop statement has a non-null body block: if the
/// caller didn't supply one, a fresh loop block is created at the same
/// position.
pub fn stmt_new_loop(
    kind: LoopKind,
    init: Option<Stmt>,
    cond: Option<Exp>,
    post: Option<Stmt>,
    body: Option<Blk>,
    pos: Pos,
) -> Stmt {
    let body = body.unwrap_or_else(|| Blk::new(BlkKind::Loop, pos.clone()));
    Stmt::new(
        StmtKind::Loop {
            kind,
            init: init.map(Box::new),
            cond,
            post: post.map(Box::new),
            body,
        },
        pos,
    )
}

pub fn stmt_new_switch(cond: Exp, body: Blk, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Switch { cond, body }, pos)
}

pub fn stmt_new_case(val: Option<Exp>, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Case { val }, pos)
}

pub fn stmt_new_return(arg: Option<Exp>, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Return { arg }, pos)
}

pub fn stmt_new_goto(label: impl Into<String>, pos: Pos) -> Stmt {
    Stmt::new(
        StmtKind::Goto {
            label: label.into(),
        },
        pos,
    )
}

pub fn stmt_new_jump(kind: JumpKind, cond: Option<Exp>, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Jump { kind, cond }, pos)
}

pub fn stmt_new_ddl(text: impl Into<String>, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Ddl(text.into()), pos)
}

pub fn stmt_new_blk(blk: Blk, pos: Pos) -> Stmt {
    Stmt::new(StmtKind::Blk(blk), pos)
}

pub fn stmt_new_pragma(
    kind: PragmaKind,
    val_exp: Exp,
    val_str: impl Into<String>,
    desc_exp: Option<Exp>,
    pos: Pos,
) -> Stmt {
    Stmt::new(
        StmtKind::Pragma {
            kind,
            val_exp,
            val_str: val_str.into(),
            desc_exp,
        },
        pos,
    )
}

/// Synthesizes an assignment statement for a declaration with an
/// initializer. If `var_id` is a tuple-of-ids, each element becomes an
/// id-expression whose `id` back-reference and Meta are copied from the
/// element Id, and the left-hand side is a tuple expression; otherwise the
/// left-hand side is a single id expression.
pub fn stmt_make_assign(var_id: &IdHandle, val_exp: Exp) -> Stmt {
    let pos = val_exp.pos.clone();
    let l_exp = if var_id.is_tuple() {
        let elem_exps: Vec<Exp> = var_id
            .tuple_elems()
            .iter()
            .map(|elem_id| {
                let id_exp = exp_new_id(elem_id.name(), elem_id.pos().clone());
                id_exp.set_id(elem_id.clone());
                id_exp.set_meta(elem_id.meta());
                id_exp
            })
            .collect();
        exp_new_tuple(elem_exps, pos.clone())
    } else {
        let id_exp = exp_new_id(var_id.name(), var_id.pos().clone());
        id_exp.set_id(var_id.clone());
        id_exp.set_meta(var_id.meta());
        id_exp
    };
    stmt_new_assign(l_exp, val_exp, pos)
}

/// Reserved function names for synthesized malloc calls, recognized by the
/// checker as intrinsics rather than ordinary calls.
pub const FN_MALLOC32: &str = "malloc32";
pub const FN_MALLOC64: &str = "malloc64";

/// Synthesizes `reg[reg_idx] := malloc_N(size)` where N is chosen by
/// `align` (4 -> 32-bit allocator, 8 -> 64-bit allocator). Both the
/// register and the call's Meta are `Int32`.
pub fn stmt_make_malloc(reg_idx: u32, size: u32, align: u8, pos: Pos) -> Stmt {
    assert!(align == 4 || align == 8, "malloc align must be 4 or 8, got {align}");

    let reg_exp = exp_new_reg(reg_idx, pos.clone());
    reg_exp.set_meta(Meta::int32());

    let arg_exp = exp_new_lit_int(size as u64, pos.clone());
    arg_exp.set_meta(Meta::int32());

    let fn_name = if align == 4 { FN_MALLOC32 } else { FN_MALLOC64 };
    let callee = exp_new_id(fn_name, pos.clone());
    let call_exp = exp_new_call(callee, vec![arg_exp], pos.clone());
    call_exp.set_meta(Meta::int32());

    stmt_new_assign(reg_exp, call_exp, pos)
}

/// A checked function's declaration plus its statement body. This is the
/// unit `Checker::check_word` and `IrBuilder::build` operate on.
#[derive(Debug)]
pub struct WordDef {
    pub id: IdHandle,
    pub body: Blk,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaKind;

    fn var(name: &str) -> IdHandle {
        Rc::new(Id::Var {
            name: name.to_string(),
            pos: Pos::new(0, 0),
            meta: RefCell::new(Meta::of(MetaKind::Int32)),
            is_used: Cell::new(false),
        })
    }

    #[test]
    fn stmt_new_id_propagates_null() {
        assert!(stmt_new_id(None, Pos::new(0, 0)).is_none());
        assert!(stmt_new_id(Some(var("x")), Pos::new(0, 0)).is_some());
    }

    #[test]
    fn stmt_new_loop_always_has_a_body() {
        let stmt = stmt_new_loop(LoopKind::While, None, None, None, None, Pos::new(1, 0));
        match stmt.kind {
            StmtKind::Loop { body, .. } => assert_eq!(body.kind, BlkKind::Loop),
            _ => panic!("expected Loop"),
        }
    }

    #[test]
    fn stmt_make_assign_single_var() {
        let id = var("count");
        let rhs = exp_new_lit_int(3, Pos::new(2, 0));
        let stmt = stmt_make_assign(&id, rhs);
        match stmt.kind {
            StmtKind::Assign { l, .. } => {
                assert!(matches!(l.kind, ExpKind::Id(ref n) if n == "count"));
                assert_eq!(l.meta().kind(), MetaKind::Int32);
            }
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn stmt_make_assign_tuple() {
        let a = var("a");
        let b = var("b");
        let tup = Rc::new(Id::TupleOfIds {
            pos: Pos::new(0, 0),
            is_used: Cell::new(false),
            elems: vec![a, b],
        });
        let rhs = exp_new_tuple(
            vec![exp_new_lit_int(1, Pos::new(0, 0)), exp_new_lit_int(2, Pos::new(0, 0))],
            Pos::new(0, 0),
        );
        let stmt = stmt_make_assign(&tup, rhs);
        match stmt.kind {
            StmtKind::Assign { l, .. } => match l.kind {
                ExpKind::Tuple(elems) => assert_eq!(elems.len(), 2),
                _ => panic!("expected tuple lvalue"),
            },
            _ => panic!("expected Assign"),
        }
    }

    #[test]
    fn stmt_make_malloc_picks_allocator_by_align() {
        let s32 = stmt_make_malloc(0, 16, 4, Pos::new(0, 0));
        let s64 = stmt_make_malloc(0, 16, 8, Pos::new(0, 0));
        for (stmt, expected) in [(s32, FN_MALLOC32), (s64, FN_MALLOC64)] {
            match stmt.kind {
                StmtKind::Assign { r, .. } => match r.kind {
                    ExpKind::Call { callee, .. } => {
                        assert!(matches!(callee.kind, ExpKind::Id(ref n) if n == expected));
                    }
                    _ => panic!("expected call"),
                },
                _ => panic!("expected assign"),
            }
        }
    }

    #[test]
    #[should_panic]
    fn stmt_make_malloc_rejects_bad_align() {
        stmt_make_malloc(0, 16, 16, Pos::new(0, 0));
    }
}
