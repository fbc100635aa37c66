//! Statement checking.
//!
//! Grounded in `check_stmt.c`'s per-kind dispatch: conditions must be
//! `Bool`, a `RETURN`'s argument must match the enclosing function's
//! declared return type, and nested blocks get their own `scope_frame`
//! with a fresh `0..len` sequence number run.

use crate::ast::{Blk, Stmt, StmtKind};
use crate::checker::Checker;
use crate::checker::expr::{check_assign, check_exp};
use crate::error::{Error, ErrorKind};
use crate::meta::meta_equals;
use crate::scope::Scope;

pub(crate) fn check_stmt<S: Scope>(
    checker: &Checker<S>,
    stmt: &mut Stmt,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    match &mut stmt.kind {
        StmtKind::Null => Ok(()),
        StmtKind::Id(id) => {
            id.mark_used();
            Ok(())
        }
        StmtKind::Exp(exp) => check_exp(checker, exp, scope_frame, seq_no),
        StmtKind::Assign { l, r } => check_assign(checker, l, r, scope_frame, seq_no).map(|_| ()),
        StmtKind::If { cond, then_blk, elifs, else_blk } => {
            check_cond(checker, cond, scope_frame, seq_no)?;
            check_blk(checker, then_blk)?;
            for (elif_cond, elif_blk) in elifs.iter_mut() {
                check_cond(checker, elif_cond, scope_frame, seq_no)?;
                check_blk(checker, elif_blk)?;
            }
            if let Some(else_blk) = else_blk {
                check_blk(checker, else_blk)?;
            }
            Ok(())
        }
        StmtKind::Loop { init, cond, post, body } => {
            if let Some(init) = init {
                check_stmt(checker, init, scope_frame, seq_no)?;
            }
            if let Some(cond) = cond {
                check_cond(checker, cond, scope_frame, seq_no)?;
            }
            if let Some(post) = post {
                check_stmt(checker, post, scope_frame, seq_no)?;
            }
            check_blk(checker, body)
        }
        StmtKind::Switch { cond, body } => {
            check_exp(checker, cond, scope_frame, seq_no)?;
            let cond_meta = cond.meta();
            for case_stmt in body.stmts.iter_mut() {
                if let StmtKind::Case { val: Some(val) } = &mut case_stmt.kind {
                    check_exp(checker, val, body.scope_frame, 0)?;
                    let val_meta = val.meta();
                    if !meta_equals(&cond_meta, &val_meta) {
                        return Err(Error::new(
                            ErrorKind::MismatchedType,
                            val.pos.clone(),
                            vec![cond_meta.to_string(), val_meta.to_string()],
                        ));
                    }
                }
            }
            check_blk(checker, body)
        }
        StmtKind::Case { .. } => Ok(()),
        StmtKind::Return { arg } => {
            let expected = checker
                .ctx
                .current_func
                .borrow()
                .clone()
                .map(|f| f.returns())
                .unwrap_or_else(crate::meta::Meta::void);
            match arg {
                Some(arg) => {
                    check_exp(checker, arg, scope_frame, seq_no)?;
                    let actual = arg.meta();
                    if !meta_equals(&expected, &actual) {
                        return Err(Error::new(
                            ErrorKind::MismatchedType,
                            arg.pos.clone(),
                            vec![expected.to_string(), actual.to_string()],
                        ));
                    }
                    Ok(())
                }
                None if expected.is_void() => Ok(()),
                None => Err(Error::new(ErrorKind::MismatchedType, stmt.pos.clone(), vec![expected.to_string(), "void".to_string()])),
            }
        }
        StmtKind::Goto { .. } => Ok(()),
        StmtKind::Jump { kind: _kind, cond } => {
            if let Some(cond) = cond {
                check_cond(checker, cond, scope_frame, seq_no)?;
            }
            Ok(())
        }
        StmtKind::Ddl(_) => Ok(()),
        StmtKind::Blk(blk) => check_blk(checker, blk),
        StmtKind::Pragma { val_exp, desc_exp, .. } => {
            check_exp(checker, val_exp, scope_frame, seq_no)?;
            if !val_exp.meta().is_bool() {
                return Err(Error::new(ErrorKind::InvalidCondType, val_exp.pos.clone(), vec![val_exp.meta().to_string()]));
            }
            if let Some(desc_exp) = desc_exp {
                check_exp(checker, desc_exp, scope_frame, seq_no)?;
            }
            Ok(())
        }
    }
}

fn check_cond<S: Scope>(
    checker: &Checker<S>,
    cond: &mut crate::ast::Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    check_exp(checker, cond, scope_frame, seq_no)?;
    if !cond.meta().is_bool() {
        return Err(Error::new(ErrorKind::InvalidCondType, cond.pos.clone(), vec![cond.meta().to_string()]));
    }
    Ok(())
}

/// Checks a nested block's own statements, sequenced `0..len` against the
/// block's own `scope_frame` rather than the enclosing statement's.
fn check_blk<S: Scope>(checker: &Checker<S>, blk: &mut Blk) -> Result<(), Error> {
    let scope_frame = blk.scope_frame;
    for seq_no in 0..blk.stmts.len() {
        check_stmt(checker, &mut blk.stmts[seq_no], scope_frame, seq_no)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::checker::CheckerConfig;
    use crate::meta::{Meta, MetaKind};
    use crate::scope::tests::MapScope;
    use crate::value::Value;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn if_condition_must_be_bool() {
        let scope = MapScope::new();
        let checker = Checker::new(&scope, CheckerConfig::new());
        let cond = exp_new_lit_int(1, Pos::new(0, 0));
        let mut stmt = stmt_new_if(cond, Blk::new(BlkKind::If, Pos::new(0, 0)), Pos::new(0, 0));
        let err = check_stmt(&checker, &mut stmt, 0, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidCondType);
    }

    #[test]
    fn return_must_match_function_return_type() {
        let scope = MapScope::new();
        let checker = Checker::new(&scope, CheckerConfig::new());
        *checker.ctx.current_func.borrow_mut() = Some(Rc::new(Id::Func {
            name: "f".to_string(),
            pos: Pos::new(0, 0),
            is_used: Cell::new(false),
            params: vec![],
            returns: Meta::of(MetaKind::Int32),
        }));

        let mut ok_stmt = stmt_new_return(Some(exp_new_lit_int(1, Pos::new(0, 0))), Pos::new(0, 0));
        assert!(check_stmt(&checker, &mut ok_stmt, 0, 0).is_ok());

        let mut bad_stmt = stmt_new_return(None, Pos::new(1, 0));
        let err = check_stmt(&checker, &mut bad_stmt, 0, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MismatchedType);
    }

    #[test]
    fn switch_case_values_must_match_discriminant() {
        let scope = MapScope::new();
        let checker = Checker::new(&scope, CheckerConfig::new());
        let cond = exp_new_lit_int(1, Pos::new(0, 0));
        let mut body = Blk::new(BlkKind::Switch, Pos::new(0, 0));
        body.stmts.push(stmt_new_case(Some(exp_new_val(Value::Str("x".to_string()), Pos::new(1, 0))), Pos::new(1, 0)));
        let mut stmt = stmt_new_switch(cond, body, Pos::new(0, 0));
        let err = check_stmt(&checker, &mut stmt, 0, 0).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MismatchedType);
    }
}
