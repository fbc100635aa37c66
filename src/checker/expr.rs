//! Expression checking: name resolution, type rules, and constant folding.
//!
//! Grounded in `check_exp.c`'s per-kind dispatch. Every `check_*` helper
//! takes `checker: &Checker<S>` — checking never needs `&mut Checker`,
//! since every mutation it makes (the current-function/acquired-id
//! context, an `Exp`'s resolved `meta`/`id`) goes through `RefCell`/`Cell`.
//! That matters most in `check_access`, which holds an `AcquiredGuard`
//! borrowed from `checker.ctx` across a recursive `check_exp` call; a
//! `&mut Checker` reborrow there would conflict with the guard's live
//! borrow. The one spot that needs real ownership of an `Exp`'s children
//! is constant folding, which rewrites `Op` into `Val`; see
//! [`fold_binary`]/[`fold_unary`].

use crate::ast::{Exp, ExpKind, OpKind};
use crate::checker::Checker;
use crate::error::{Error, ErrorKind};
use crate::meta::{Meta, MetaKind, meta_assignable, meta_equals, meta_merge};
use crate::scope::Scope;
use crate::value::{self, Value};
use std::mem;

#[derive(Clone, Copy, PartialEq, Eq)]
enum ExpTag {
    Null,
    Id,
    Val,
    Type,
    Array,
    Op,
    Access,
    Call,
    Sql,
    Ternary,
    Tuple,
    Reg,
    Global,
    Mem,
}

fn tag(exp: &Exp) -> ExpTag {
    match &exp.kind {
        ExpKind::Null => ExpTag::Null,
        ExpKind::Id(_) => ExpTag::Id,
        ExpKind::Val(_) => ExpTag::Val,
        ExpKind::Type { .. } => ExpTag::Type,
        ExpKind::Array { .. } => ExpTag::Array,
        ExpKind::Op { .. } => ExpTag::Op,
        ExpKind::Access { .. } => ExpTag::Access,
        ExpKind::Call { .. } => ExpTag::Call,
        ExpKind::Sql { .. } => ExpTag::Sql,
        ExpKind::Ternary { .. } => ExpTag::Ternary,
        ExpKind::Tuple(_) => ExpTag::Tuple,
        ExpKind::Reg(_) => ExpTag::Reg,
        ExpKind::Global(_) => ExpTag::Global,
        ExpKind::Mem { .. } => ExpTag::Mem,
    }
}

/// Entry point for checking one expression node. Recurses into children via
/// the per-kind helpers below, writing the resolved `Meta` (and, for
/// name-shaped nodes, the resolved `IdHandle`) back onto `exp`.
pub(crate) fn check_exp<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    match tag(exp) {
        ExpTag::Null => {
            exp.set_meta(Meta::void());
            Ok(())
        }
        ExpTag::Id => check_id(checker, exp, scope_frame, seq_no),
        ExpTag::Val => check_val(exp),
        ExpTag::Type => check_type(checker, exp, scope_frame, seq_no),
        ExpTag::Array => check_array(checker, exp, scope_frame, seq_no),
        ExpTag::Op => check_op(checker, exp, scope_frame, seq_no),
        ExpTag::Access => check_access(checker, exp, scope_frame, seq_no),
        ExpTag::Call => check_call(checker, exp, scope_frame, seq_no),
        ExpTag::Sql => check_sql(exp),
        ExpTag::Ternary => check_ternary(checker, exp, scope_frame, seq_no),
        ExpTag::Tuple => check_tuple(checker, exp, scope_frame, seq_no),
        // Lowering-synthesized nodes already carry a fixed type by
        // construction (see `ast::stmt_make_malloc`); re-checking one is a
        // no-op rather than an error.
        ExpTag::Reg => {
            exp.set_meta(Meta::int32());
            Ok(())
        }
        ExpTag::Global => {
            exp.set_meta(Meta::reference());
            Ok(())
        }
        ExpTag::Mem => {
            exp.set_meta(Meta::int32());
            Ok(())
        }
    }
}

/// Name lookup chain: an in-flight field-access redirect first, then a
/// parameter of the function being checked, then ordinary block scoping. A
/// name that resolves straight to a contract (not through a parameter or an
/// already-acquired field) is redirected to a field of that same name on the
/// contract itself — this is what makes a bare contract name followed by
/// `.member` resolve the right member through `check_access`'s own redirect,
/// rather than landing on the contract declaration's own Meta.
fn check_id<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let name = match &exp.kind {
        ExpKind::Id(n) => n.clone(),
        _ => unreachable!("check_id called on a non-Id node"),
    };

    let resolved = if let Some(acquired) = checker.ctx.acquired() {
        checker.scope.lookup_field(&acquired, &name)
    } else if let Some(current) = checker.ctx.current_func.borrow().clone() {
        checker
            .scope
            .lookup_param(&current, &name)
            .or_else(|| redirect_contract(checker, checker.scope.lookup_name(scope_frame, seq_no, &name), &name))
    } else {
        redirect_contract(checker, checker.scope.lookup_name(scope_frame, seq_no, &name), &name)
    };

    let id = resolved.ok_or_else(|| Error::new(ErrorKind::UndefinedId, exp.pos.clone(), vec![name]))?;
    id.mark_used();
    exp.set_meta(id.meta());
    exp.set_id(id);
    Ok(())
}

/// If `resolved` is itself a contract, redirect to a field of the same name
/// on that contract rather than the contract declaration's own Meta.
fn redirect_contract<S: Scope>(checker: &Checker<S>, resolved: Option<crate::ast::IdHandle>, name: &str) -> Option<crate::ast::IdHandle> {
    let id = resolved?;
    if checker.scope.is_contract(&id) {
        checker.scope.lookup_field(&id, name)
    } else {
        Some(id)
    }
}

/// `VAL`-kind Metas. Bool and string literals are untyped here, broader
/// than the narrower int/float-only rule this was distilled from — kept
/// consistent with `Meta::untyped`'s own widest-family invariant.
fn check_val(exp: &mut Exp) -> Result<(), Error> {
    let meta = match &exp.kind {
        ExpKind::Val(v) => match v {
            Value::Null => Meta::reference(),
            Value::Bool(_) => Meta::untyped(MetaKind::Bool),
            Value::Int { .. } => Meta::untyped(MetaKind::Int64),
            Value::Float(_) => Meta::untyped(MetaKind::Double),
            Value::Str(_) => Meta::untyped(MetaKind::String),
            Value::Obj(_) => Meta::reference(),
            Value::Addr(_) => Meta::int32(),
        },
        _ => unreachable!("check_val called on a non-Val node"),
    };
    exp.set_meta(meta);
    Ok(())
}

fn check_type<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Type { ty, key, value, name } => match *ty {
            MetaKind::Map => {
                let key_exp = key
                    .as_deref_mut()
                    .ok_or_else(|| Error::new(ErrorKind::UndefinedType, exp.pos.clone(), vec!["map key".to_string()]))?;
                check_exp(checker, key_exp, scope_frame, seq_no)?;
                let key_meta = key_exp.meta();
                if !key_meta.is_comparable() {
                    return Err(Error::new(ErrorKind::InvalidKeyType, key_exp.pos.clone(), vec![key_meta.to_string()]));
                }

                let value_exp = value.as_deref_mut().ok_or_else(|| {
                    Error::new(ErrorKind::UndefinedType, exp.pos.clone(), vec!["map value".to_string()])
                })?;
                check_exp(checker, value_exp, scope_frame, seq_no)?;
                Meta::map(key_meta, value_exp.meta())
            }
            MetaKind::Struct => {
                let name = name
                    .as_deref()
                    .ok_or_else(|| Error::new(ErrorKind::UndefinedType, exp.pos.clone(), vec![]))?;
                let id = checker
                    .scope
                    .lookup_name(scope_frame, seq_no, name)
                    .filter(|id| checker.scope.is_struct(id) || checker.scope.is_contract(id))
                    .ok_or_else(|| Error::new(ErrorKind::UndefinedType, exp.pos.clone(), vec![name.to_string()]))?;
                id.mark_used();
                Meta::aggregate(MetaKind::Struct, id)
            }
            other => Meta::of(other),
        },
        _ => unreachable!("check_type called on a non-Type node"),
    };
    exp.set_meta(result);
    Ok(())
}

/// Map subscript checks the index against the declared key type; array
/// subscript requires an integer index. Either way the result is the
/// *element*'s Meta, not the whole container's — see `DESIGN.md` for why
/// this departs from copying the container Meta wholesale onto the result.
fn check_array<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Array { base, index } => {
            check_exp(checker, base, scope_frame, seq_no)?;
            check_exp(checker, index, scope_frame, seq_no)?;
            let base_meta = base.meta();

            if base_meta.is_map() {
                let index_meta = index.meta();
                let key_meta = base_meta.map_key().cloned().unwrap_or_else(Meta::none);
                if !meta_equals(&index_meta, &key_meta) {
                    return Err(Error::new(
                        ErrorKind::InvalidKeyType,
                        index.pos.clone(),
                        vec![key_meta.to_string(), index_meta.to_string()],
                    ));
                }
                base_meta.map_value().cloned().unwrap_or_else(Meta::none)
            } else if base_meta.is_array() {
                if !index.meta().is_integer() {
                    return Err(Error::new(
                        ErrorKind::InvalidSubscript,
                        index.pos.clone(),
                        vec![index.meta().to_string()],
                    ));
                }
                base_meta.array_elem().cloned().unwrap_or_else(Meta::none)
            } else {
                return Err(Error::new(ErrorKind::InvalidSubscript, base.pos.clone(), vec![base_meta.to_string()]));
            }
        }
        _ => unreachable!("check_array called on a non-Array node"),
    };
    exp.set_meta(result);
    Ok(())
}

fn op_of(exp: &Exp) -> OpKind {
    match &exp.kind {
        ExpKind::Op { op, .. } => *op,
        _ => unreachable!("op_of called on a non-Op node"),
    }
}

fn check_op<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let op = op_of(exp);
    if op == OpKind::Assign {
        check_op_assign(checker, exp, scope_frame, seq_no)
    } else if op.is_unary() {
        check_op_unary(checker, exp, op, scope_frame, seq_no)
    } else if op.is_arith() {
        check_op_arith(checker, exp, op, scope_frame, seq_no)
    } else if op.is_bit() {
        check_op_bit(checker, exp, op, scope_frame, seq_no)
    } else if op.is_cmp() {
        check_op_cmp(checker, exp, op, scope_frame, seq_no)
    } else if op.is_bool_cmp() {
        check_op_bool_cmp(checker, exp, op, scope_frame, seq_no)
    } else {
        unreachable!("OpKind {op:?} not handled by any check_op_* family")
    }
}

/// `+` additionally accepts a pair of strings (folded as concatenation);
/// `%` is narrower than the rest of the family and requires both operands
/// be integers. Every other arith op requires both operands numeric.
fn check_op_arith<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    op: OpKind,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, r, .. } => {
            check_exp(checker, l, scope_frame, seq_no)?;
            let r_exp = r.as_deref_mut().expect("arithmetic op missing rhs");
            check_exp(checker, r_exp, scope_frame, seq_no)?;

            let lm = l.meta();
            let rm = r_exp.meta();
            let operands_ok = match op {
                OpKind::Add => (lm.is_numeric() && rm.is_numeric()) || (lm.is_string() && rm.is_string()),
                OpKind::Mod => lm.is_integer() && rm.is_integer(),
                _ => lm.is_numeric() && rm.is_numeric(),
            };
            if !operands_ok {
                return Err(Error::new(ErrorKind::InvalidOpType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            if !meta_equals(&lm, &rm) {
                return Err(Error::new(ErrorKind::MismatchedType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            meta_merge(&lm, &rm)
        }
        _ => unreachable!("check_op_arith called on a non-Op node"),
    };
    exp.set_meta(result);
    fold_binary(exp, op)
}

fn check_op_bit<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    op: OpKind,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, r, .. } => {
            check_exp(checker, l, scope_frame, seq_no)?;
            let r_exp = r.as_deref_mut().expect("bitwise op missing rhs");
            check_exp(checker, r_exp, scope_frame, seq_no)?;

            let lm = l.meta();
            let rm = r_exp.meta();
            if !lm.is_integer() || !rm.is_integer() {
                return Err(Error::new(ErrorKind::InvalidOpType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            if !meta_equals(&lm, &rm) {
                return Err(Error::new(ErrorKind::MismatchedType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            meta_merge(&lm, &rm)
        }
        _ => unreachable!("check_op_bit called on a non-Op node"),
    };
    exp.set_meta(result);
    fold_binary(exp, op)
}

/// Thin wrapper around [`meta_equals`] for the equality-family comparison
/// operators, kept as its own call site so a future widening (e.g. letting
/// an int compare against a float) only has one place to change.
fn is_comparable_for_cmp(l: &Meta, r: &Meta) -> bool {
    meta_equals(l, r)
}

fn check_op_cmp<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    op: OpKind,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, r, .. } => {
            check_exp(checker, l, scope_frame, seq_no)?;
            let r_exp = r.as_deref_mut().expect("comparison op missing rhs");
            check_exp(checker, r_exp, scope_frame, seq_no)?;

            let lm = l.meta();
            let rm = r_exp.meta();
            if !is_comparable_for_cmp(&lm, &rm) {
                return Err(Error::new(ErrorKind::InvalidOpType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            Meta::bool()
        }
        _ => unreachable!("check_op_cmp called on a non-Op node"),
    };
    exp.set_meta(result);
    fold_binary(exp, op)
}

fn check_op_bool_cmp<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    op: OpKind,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, r, .. } => {
            check_exp(checker, l, scope_frame, seq_no)?;
            let r_exp = r.as_deref_mut().expect("boolean op missing rhs");
            check_exp(checker, r_exp, scope_frame, seq_no)?;

            let lm = l.meta();
            let rm = r_exp.meta();
            if !lm.is_bool() || !rm.is_bool() {
                return Err(Error::new(ErrorKind::InvalidOpType, exp.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            Meta::bool()
        }
        _ => unreachable!("check_op_bool_cmp called on a non-Op node"),
    };
    exp.set_meta(result);
    fold_binary(exp, op)
}

fn check_op_unary<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    op: OpKind,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, .. } => {
            check_exp(checker, l, scope_frame, seq_no)?;
            let lm = l.meta();
            match op {
                OpKind::Inc | OpKind::Dec => {
                    if !l.is_lvalue_shape() {
                        return Err(Error::new(ErrorKind::InvalidLvalue, l.pos.clone(), vec![]));
                    }
                    if !lm.is_integer() {
                        return Err(Error::new(ErrorKind::InvalidOpType, l.pos.clone(), vec![lm.to_string()]));
                    }
                    lm
                }
                OpKind::Neg => {
                    if !lm.is_numeric() {
                        return Err(Error::new(ErrorKind::InvalidOpType, l.pos.clone(), vec![lm.to_string()]));
                    }
                    lm
                }
                OpKind::Not => {
                    if !lm.is_bool() {
                        return Err(Error::new(ErrorKind::InvalidOpType, l.pos.clone(), vec![lm.to_string()]));
                    }
                    lm
                }
                _ => unreachable!("check_op_unary called with a non-unary op"),
            }
        }
        _ => unreachable!("check_op_unary called on a non-Op node"),
    };
    exp.set_meta(result);
    if matches!(op, OpKind::Neg | OpKind::Not) {
        fold_unary(exp, op)?;
    }
    Ok(())
}

fn check_op_assign<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Op { l, r, .. } => {
            let r_exp = r.as_deref_mut().expect("assignment op missing rhs");
            check_assign(checker, l, r_exp, scope_frame, seq_no)?
        }
        _ => unreachable!("check_op_assign called on a non-Op node"),
    };
    exp.set_meta(result);
    Ok(())
}

/// Shared lvalue/rvalue type-matching rules for `StmtKind::Assign` and the
/// `OP_ASSIGN` expression form alike: tuple destructuring merges
/// element-wise, scalar assignment merges directly, and a literal rhs gets
/// range-checked against the merged width.
pub(crate) fn check_assign<S: Scope>(
    checker: &Checker<S>,
    l: &mut Exp,
    r: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<Meta, Error> {
    check_exp(checker, l, scope_frame, seq_no)?;
    if !l.is_lvalue_shape() && !matches!(l.kind, ExpKind::Tuple(_)) {
        return Err(Error::new(ErrorKind::InvalidLvalue, l.pos.clone(), vec![]));
    }
    check_exp(checker, r, scope_frame, seq_no)?;

    let result_meta = match &l.kind {
        ExpKind::Tuple(elems) => {
            let rm = r.meta();
            let r_elems = rm
                .tuple_elems()
                .ok_or_else(|| Error::new(ErrorKind::MismatchedType, r.pos.clone(), vec!["tuple".to_string(), rm.to_string()]))?;
            if r_elems.len() != elems.len() {
                return Err(Error::new(
                    ErrorKind::MismatchedElemCnt,
                    r.pos.clone(),
                    vec![elems.len().to_string(), r_elems.len().to_string()],
                ));
            }
            let mut merged = Vec::with_capacity(elems.len());
            for (le, re_meta) in elems.iter().zip(r_elems.iter()) {
                let lm = le.meta();
                if !meta_assignable(&lm, re_meta) {
                    return Err(Error::new(ErrorKind::MismatchedType, le.pos.clone(), vec![lm.to_string(), re_meta.to_string()]));
                }
                merged.push(meta_merge(&lm, re_meta));
            }
            Meta::tuple(merged)
        }
        _ => {
            let lm = l.meta();
            let rm = r.meta();
            if !meta_assignable(&lm, &rm) {
                return Err(Error::new(ErrorKind::MismatchedType, r.pos.clone(), vec![lm.to_string(), rm.to_string()]));
            }
            meta_merge(&lm, &rm)
        }
    };

    if let ExpKind::Val(v) = &r.kind {
        if !value::fits_range(v, &result_meta) {
            return Err(Error::new(ErrorKind::NumericOverflow, r.pos.clone(), vec![result_meta.to_string()]));
        }
    }

    Ok(result_meta)
}

/// Field access. `base`'s resolved aggregate (either its own Meta, for a
/// struct/ref-typed variable, or the struct/contract declaration it names
/// directly) becomes the redirect target for resolving `field` as a name.
fn check_access<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Access { base, field } => {
            check_exp(checker, base, scope_frame, seq_no)?;

            let aggregate_id = base.meta().aggregate_id().cloned().or_else(|| {
                base.id()
                    .filter(|id| checker.scope.is_struct(id) || checker.scope.is_contract(id))
            });
            let aggregate_id = aggregate_id
                .ok_or_else(|| Error::new(ErrorKind::NotAccessibleExp, base.pos.clone(), vec![base.meta().to_string()]))?;

            let _guard = checker.ctx.acquire(aggregate_id);
            check_exp(checker, field, scope_frame, seq_no)?;
            (field.meta(), field.id())
        }
        _ => unreachable!("check_access called on a non-Access node"),
    };
    exp.set_meta(result.0);
    if let Some(id) = result.1 {
        exp.set_id(id);
    }
    Ok(())
}

fn check_call<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let callee_name = match &exp.kind {
        ExpKind::Call { callee, .. } => match &callee.kind {
            ExpKind::Id(name) => Some(name.clone()),
            _ => None,
        },
        _ => unreachable!("check_call called on a non-Call node"),
    };

    match callee_name.as_deref() {
        Some(crate::ast::FN_MALLOC32) | Some(crate::ast::FN_MALLOC64) => {
            check_call_reserved(checker, exp, scope_frame, seq_no)
        }
        Some("map") => check_call_map(checker, exp, scope_frame, seq_no),
        Some(name) if checker.config.reserved(name).is_some() => check_call_reserved(checker, exp, scope_frame, seq_no),
        _ => check_call_normal(checker, exp, scope_frame, seq_no),
    }
}

/// `map(capacity)` is special-cased rather than resolved through ordinary
/// name lookup. The capacity argument must check out as an integer Meta —
/// elevated to a real diagnostic here rather than the silent assumption
/// this is grounded on.
fn check_call_map<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Call { args, .. } => {
            if args.len() != 1 {
                return Err(Error::new(
                    ErrorKind::MismatchedCount,
                    exp.pos.clone(),
                    vec!["1".to_string(), args.len().to_string()],
                ));
            }
            let arg = &mut args[0];
            check_exp(checker, arg, scope_frame, seq_no)?;
            if !arg.meta().is_integer() {
                return Err(Error::new(ErrorKind::InvalidSizeVal, arg.pos.clone(), vec![arg.meta().to_string()]));
            }
            Meta::untyped(MetaKind::Map)
        }
        _ => unreachable!("check_call_map called on a non-Call node"),
    };
    exp.set_meta(result);
    Ok(())
}

/// An embedder-registered builtin (or one of the synthesized malloc calls):
/// checked against its declared [`crate::checker::ReservedSignature`]
/// rather than a lookup-resolved `Id`.
fn check_call_reserved<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let name = match &exp.kind {
        ExpKind::Call { callee, .. } => match &callee.kind {
            ExpKind::Id(name) => name.clone(),
            _ => unreachable!("reserved call callee must be an Id"),
        },
        _ => unreachable!("check_call_reserved called on a non-Call node"),
    };

    let sig = match (name.as_str(), checker.config.reserved(&name)) {
        (crate::ast::FN_MALLOC32, None) => crate::checker::ReservedSignature {
            params: vec![Meta::int32()],
            returns: Meta::int32(),
        },
        (crate::ast::FN_MALLOC64, None) => crate::checker::ReservedSignature {
            params: vec![Meta::int32()],
            returns: Meta::int32(),
        },
        (_, Some(sig)) => sig.clone(),
        (_, None) => unreachable!("check_call_reserved dispatched for an unregistered name"),
    };

    let result = match &mut exp.kind {
        ExpKind::Call { args, .. } => {
            if args.len() != sig.params.len() {
                return Err(Error::new(
                    ErrorKind::MismatchedCount,
                    exp.pos.clone(),
                    vec![sig.params.len().to_string(), args.len().to_string()],
                ));
            }
            for (arg, expected) in args.iter_mut().zip(sig.params.iter()) {
                check_exp(checker, arg, scope_frame, seq_no)?;
                let am = arg.meta();
                if !meta_equals(&am, expected) {
                    return Err(Error::new(
                        ErrorKind::MismatchedType,
                        arg.pos.clone(),
                        vec![expected.to_string(), am.to_string()],
                    ));
                }
            }
            sig.returns.clone()
        }
        _ => unreachable!("check_call_reserved called on a non-Call node"),
    };
    exp.set_meta(result);
    Ok(())
}

fn check_call_normal<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Call { callee, args } => {
            check_exp(checker, callee, scope_frame, seq_no)?;
            let id = callee
                .id()
                .ok_or_else(|| Error::new(ErrorKind::NotCallableExp, callee.pos.clone(), vec![]))?;
            if !checker.scope.is_func(&id) {
                return Err(Error::new(ErrorKind::NotCallableExp, callee.pos.clone(), vec![id.name().to_string()]));
            }

            let params = id.params();
            if args.len() != params.len() {
                return Err(Error::new(
                    ErrorKind::MismatchedCount,
                    exp.pos.clone(),
                    vec![params.len().to_string(), args.len().to_string()],
                ));
            }
            for (arg, param) in args.iter_mut().zip(params.iter()) {
                check_exp(checker, arg, scope_frame, seq_no)?;
                let am = arg.meta();
                let pm = param.meta();
                if !meta_equals(&am, &pm) {
                    return Err(Error::new(ErrorKind::MismatchedType, arg.pos.clone(), vec![pm.to_string(), am.to_string()]));
                }
            }
            id.returns()
        }
        _ => unreachable!("check_call_normal called on a non-Call node"),
    };
    exp.set_meta(result);
    Ok(())
}

/// `INSERT`/`UPDATE`/`DELETE` report an affected-row count; `QUERY` is not
/// yet wired up to a result shape.
fn check_sql(exp: &mut Exp) -> Result<(), Error> {
    let result = match &exp.kind {
        ExpKind::Sql { kind, .. } => match kind {
            crate::ast::SqlKind::Query => Meta::void(),
            crate::ast::SqlKind::Insert | crate::ast::SqlKind::Update | crate::ast::SqlKind::Delete => Meta::int32(),
        },
        _ => unreachable!("check_sql called on a non-Sql node"),
    };
    exp.set_meta(result);
    Ok(())
}

fn check_ternary<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Ternary { pre, inner, post } => {
            check_exp(checker, pre, scope_frame, seq_no)?;
            if !pre.meta().is_bool() {
                return Err(Error::new(ErrorKind::InvalidCondType, pre.pos.clone(), vec![pre.meta().to_string()]));
            }
            check_exp(checker, inner, scope_frame, seq_no)?;
            check_exp(checker, post, scope_frame, seq_no)?;

            let im = inner.meta();
            let pm = post.meta();
            if !meta_equals(&im, &pm) {
                return Err(Error::new(ErrorKind::MismatchedType, post.pos.clone(), vec![im.to_string(), pm.to_string()]));
            }
            meta_merge(&im, &pm)
        }
        _ => unreachable!("check_ternary called on a non-Ternary node"),
    };
    exp.set_meta(result);
    Ok(())
}

fn check_tuple<S: Scope>(
    checker: &Checker<S>,
    exp: &mut Exp,
    scope_frame: u64,
    seq_no: usize,
) -> Result<(), Error> {
    let result = match &mut exp.kind {
        ExpKind::Tuple(elems) => {
            let mut metas = Vec::with_capacity(elems.len());
            for e in elems.iter_mut() {
                check_exp(checker, e, scope_frame, seq_no)?;
                metas.push(e.meta());
            }
            Meta::tuple(metas)
        }
        _ => unreachable!("check_tuple called on a non-Tuple node"),
    };
    exp.set_meta(result);
    Ok(())
}

/// Rewrites `Op{op, l, r}` into `Val(result)` when both operands are
/// already literal, untyped constants — the only case this crate folds.
/// Takes true ownership of the node's children via `mem::replace` since
/// `ExpKind` carries no `Default` to swap in otherwise.
fn fold_binary(exp: &mut Exp, op: OpKind) -> Result<(), Error> {
    let should_fold = match &exp.kind {
        ExpKind::Op { l, r, .. } => {
            matches!(l.kind, ExpKind::Val(_))
                && l.meta().untyped_flag()
                && r.as_deref()
                    .is_some_and(|r| matches!(r.kind, ExpKind::Val(_)) && r.meta().untyped_flag())
        }
        _ => false,
    };
    if !should_fold {
        return Ok(());
    }

    let folded = match mem::replace(&mut exp.kind, ExpKind::Null) {
        ExpKind::Op { l, r, .. } => {
            let l_val = match l.kind {
                ExpKind::Val(v) => v,
                _ => {
                    debug_assert!(false, "fold_binary: lhs was not a literal after passing the should_fold check");
                    return Ok(());
                }
            };
            let r_box = match r {
                Some(r) => r,
                None => {
                    debug_assert!(false, "fold_binary: binary op unexpectedly missing rhs");
                    return Ok(());
                }
            };
            let r_pos = r_box.pos.clone();
            let r_val = match r_box.kind {
                ExpKind::Val(v) => v,
                _ => {
                    debug_assert!(false, "fold_binary: rhs was not a literal after passing the should_fold check");
                    return Ok(());
                }
            };
            value::eval_binary(op, &l_val, &r_val, &r_pos)?
        }
        _ => unreachable!("fold_binary called on a non-Op node"),
    };

    exp.kind = ExpKind::Val(folded);
    Ok(())
}

fn fold_unary(exp: &mut Exp, op: OpKind) -> Result<(), Error> {
    let should_fold = match &exp.kind {
        ExpKind::Op { l, .. } => matches!(l.kind, ExpKind::Val(_)) && l.meta().untyped_flag(),
        _ => false,
    };
    if !should_fold {
        return Ok(());
    }

    let folded = match mem::replace(&mut exp.kind, ExpKind::Null) {
        ExpKind::Op { l, .. } => match l.kind {
            ExpKind::Val(v) => value::eval_unary(op, &v),
            _ => {
                debug_assert!(false, "fold_unary: operand was not a literal after passing the should_fold check");
                return Ok(());
            }
        },
        _ => unreachable!("fold_unary called on a non-Op node"),
    };

    exp.kind = ExpKind::Val(folded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Pos, exp_new_id, exp_new_lit_int, exp_new_op, exp_new_val};
    use crate::checker::{Checker, CheckerConfig};
    use crate::scope::tests::MapScope;

    fn checked(mut exp: Exp) -> Result<Exp, Error> {
        let scope = MapScope::new();
        let mut checker = Checker::new(&scope, CheckerConfig::new());
        check_exp(&mut checker, &mut exp, 0, 0)?;
        Ok(exp)
    }

    #[test]
    fn constant_addition_folds_to_a_literal() {
        let exp = exp_new_op(
            OpKind::Add,
            exp_new_lit_int(2, Pos::new(0, 0)),
            Some(exp_new_lit_int(3, Pos::new(0, 1))),
            Pos::new(0, 0),
        );
        let exp = checked(exp).unwrap();
        match exp.kind {
            ExpKind::Val(Value::Int { magnitude, negative }) => {
                assert_eq!(magnitude, 5);
                assert!(!negative);
            }
            other => panic!("expected a folded literal, got {other:?}"),
        }
    }

    #[test]
    fn division_by_zero_literal_reports_divisor_position() {
        let exp = exp_new_op(
            OpKind::Div,
            exp_new_lit_int(1, Pos::new(0, 0)),
            Some(exp_new_lit_int(0, Pos::new(4, 2))),
            Pos::new(0, 0),
        );
        let err = checked(exp).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivideByZero);
        assert_eq!(err.pos, Pos::new(4, 2));
    }

    #[test]
    fn mismatched_operand_types_are_rejected() {
        let exp = exp_new_op(
            OpKind::Add,
            exp_new_lit_int(1, Pos::new(0, 0)),
            Some(exp_new_val(Value::Str("x".to_string()), Pos::new(0, 1))),
            Pos::new(0, 0),
        );
        let err = checked(exp).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOpType);
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let exp = exp_new_id("missing", Pos::new(3, 1));
        let err = checked(exp).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedId);
    }
}
