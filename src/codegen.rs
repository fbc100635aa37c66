//! Code-generation facade.
//!
//! This crate never emits WebAssembly itself. `CodeGen` is the one seam a
//! backend implements; everything here does is classify an already-lowered
//! `Exp`/`Stmt` shape and call the single facade method that shape maps to.

use crate::ast::{Exp, ExpKind};

/// Implemented by the embedder's backend. `ExprRef` is whatever handle
/// that backend threads through its own instruction builder (a value id,
/// an in-progress instruction sequence, …) — this crate never constructs
/// one itself.
pub trait CodeGen {
    type ExprRef;

    fn gen_exp(&mut self, exp: &Exp) -> Self::ExprRef;

    /// A bare expression statement — a non-void call's result is computed
    /// and discarded.
    fn gen_stmt_exp(&mut self, exp: &Exp) -> Self::ExprRef;

    fn gen_store_global(&mut self, name: &str, rhs: &Exp) -> Self::ExprRef;
    fn gen_store_reg(&mut self, reg: u32, rhs: &Exp) -> Self::ExprRef;
    fn gen_store_mem(&mut self, base: u32, addr: u32, offset: u32, rhs: &Exp) -> Self::ExprRef;
    fn gen_store_array(&mut self, base: &Exp, index: &Exp, rhs: &Exp) -> Self::ExprRef;

    fn gen_stmt_return(&mut self, arg: Option<&Exp>) -> Self::ExprRef;

    /// DDL text is carried through unevaluated — executing it is out of
    /// this crate's scope.
    fn gen_stmt_ddl(&mut self, text: &str) -> Self::ExprRef;

    fn gen_stmt_pragma(&mut self, cond: &Exp, text_offset: u32, desc: Option<&Exp>) -> Self::ExprRef;
}

/// Classifies `lhs`'s lowered shape into one of the four storage classes —
/// global symbol, register, fixed-address memory, variable-index memory —
/// and calls the matching facade method. `lhs` must already be one of
/// `Global`/`Reg`/`Mem`/`Array`; lowering is responsible for rewriting
/// every checked lvalue into one of those shapes before codegen runs, so
/// anything else reaching here is a lowering bug, not a user error.
pub fn gen_stmt_assign<C: CodeGen>(codegen: &mut C, lhs: &Exp, rhs: &Exp) -> C::ExprRef {
    match &lhs.kind {
        ExpKind::Global(name) => codegen.gen_store_global(name, rhs),
        ExpKind::Reg(reg) => codegen.gen_store_reg(*reg, rhs),
        ExpKind::Mem { base, addr, offset } => codegen.gen_store_mem(*base, *addr, *offset, rhs),
        ExpKind::Array { base, index } => codegen.gen_store_array(base, index, rhs),
        other => unreachable!("lowering bug: lvalue {other:?} was never rewritten to a storage-class Exp"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Pos, exp_new_global, exp_new_lit_int, exp_new_mem, exp_new_reg};

    #[derive(Debug, PartialEq)]
    enum Recorded {
        Global(String),
        Reg(u32),
        Mem(u32, u32, u32),
        Array,
    }

    struct Recorder(Vec<Recorded>);

    impl CodeGen for Recorder {
        type ExprRef = ();

        fn gen_exp(&mut self, _exp: &Exp) -> Self::ExprRef {}
        fn gen_stmt_exp(&mut self, _exp: &Exp) -> Self::ExprRef {}

        fn gen_store_global(&mut self, name: &str, _rhs: &Exp) -> Self::ExprRef {
            self.0.push(Recorded::Global(name.to_string()));
        }
        fn gen_store_reg(&mut self, reg: u32, _rhs: &Exp) -> Self::ExprRef {
            self.0.push(Recorded::Reg(reg));
        }
        fn gen_store_mem(&mut self, base: u32, addr: u32, offset: u32, _rhs: &Exp) -> Self::ExprRef {
            self.0.push(Recorded::Mem(base, addr, offset));
        }
        fn gen_store_array(&mut self, _base: &Exp, _index: &Exp, _rhs: &Exp) -> Self::ExprRef {
            self.0.push(Recorded::Array);
        }
        fn gen_stmt_return(&mut self, _arg: Option<&Exp>) -> Self::ExprRef {}
        fn gen_stmt_ddl(&mut self, _text: &str) -> Self::ExprRef {}
        fn gen_stmt_pragma(&mut self, _cond: &Exp, _text_offset: u32, _desc: Option<&Exp>) -> Self::ExprRef {}
    }

    #[test]
    fn dispatches_each_storage_class_to_its_own_method() {
        let mut rec = Recorder(Vec::new());
        let rhs = exp_new_lit_int(1, Pos::new(0, 0));

        gen_stmt_assign(&mut rec, &exp_new_global("counter", Pos::new(0, 0)), &rhs);
        gen_stmt_assign(&mut rec, &exp_new_reg(3, Pos::new(0, 0)), &rhs);
        gen_stmt_assign(&mut rec, &exp_new_mem(0, 16, 4, Pos::new(0, 0)), &rhs);

        assert_eq!(rec.0, vec![
            Recorded::Global("counter".to_string()),
            Recorded::Reg(3),
            Recorded::Mem(0, 16, 4),
        ]);
    }

    #[test]
    #[should_panic(expected = "lowering bug")]
    fn panics_on_an_unlowered_lvalue() {
        struct Noop;
        impl CodeGen for Noop {
            type ExprRef = ();
            fn gen_exp(&mut self, _: &Exp) {}
            fn gen_stmt_exp(&mut self, _: &Exp) {}
            fn gen_store_global(&mut self, _: &str, _: &Exp) {}
            fn gen_store_reg(&mut self, _: u32, _: &Exp) {}
            fn gen_store_mem(&mut self, _: u32, _: u32, _: u32, _: &Exp) {}
            fn gen_store_array(&mut self, _: &Exp, _: &Exp, _: &Exp) {}
            fn gen_stmt_return(&mut self, _: Option<&Exp>) {}
            fn gen_stmt_ddl(&mut self, _: &str) {}
            fn gen_stmt_pragma(&mut self, _: &Exp, _: u32, _: Option<&Exp>) {}
        }
        let mut codegen = Noop;
        let lhs = exp_new_lit_int(1, Pos::new(0, 0));
        let rhs = exp_new_lit_int(1, Pos::new(0, 0));
        gen_stmt_assign(&mut codegen, &lhs, &rhs);
    }
}
