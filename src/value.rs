//! Constant values, their operators, range checks, and casts.
//!
//! Mirrors `value.c`'s `value_eval_*` dispatch tables and `value_check`/
//! `value_cast_*` family almost one for one; see the module-level notes on
//! [`fits_range`] for the one deliberately preserved asymmetry in unsigned
//! 64-bit range checking.

use crate::ast::OpKind;
use crate::error::{Error, ErrorKind};
use crate::meta::{Meta, MetaKind};

/// A compile-time constant. `Int` carries its sign out of band so a single
/// representation covers every integer width from `Int8` to `Uint64`
/// without needing a widest-signed-type overflow trick.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int { magnitude: u64, negative: bool },
    Float(f64),
    Str(String),
    /// Opaque handle to a non-scalar constant (e.g. an interned struct
    /// literal); this crate never inspects its contents.
    Obj(u64),
    /// Opaque memory/global offset produced by earlier lowering.
    Addr(u32),
}

impl Value {
    pub fn int(magnitude: u64, negative: bool) -> Self {
        Value::Int { magnitude, negative }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int { magnitude, negative } => {
                if *negative {
                    i64::try_from(*magnitude).ok().map(|m| -m)
                } else {
                    i64::try_from(*magnitude).ok()
                }
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int { magnitude, negative } => {
                let m = *magnitude as f64;
                Some(if *negative { -m } else { m })
            }
            _ => None,
        }
    }

    fn discriminant_matches(&self, other: &Value) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Evaluate a binary operator on two already-folded constants, per
/// `value.c`'s `eval_fntab_arith`/`_cmp`/`_bit` tables. `pos` is only used
/// to build a `DivideByZero` error at the divisor's own position, not the
/// operator's.
pub fn eval_binary(
    op: OpKind,
    l: &Value,
    r: &Value,
    r_pos: &crate::ast::Pos,
) -> Result<Value, Error> {
    debug_assert!(
        l.discriminant_matches(r) || op.is_cmp(),
        "eval_binary on mismatched Value kinds: {l:?} vs {r:?}"
    );

    if op.is_arith() {
        return eval_arith(op, l, r, r_pos);
    }
    if op.is_bit() {
        return Ok(eval_bit(op, l, r));
    }
    if op.is_cmp() {
        return Ok(Value::Bool(eval_cmp(op, l, r)));
    }
    if op.is_bool_cmp() {
        return Ok(eval_bool_cmp(op, l, r));
    }
    unreachable!("eval_binary called with a unary op kind: {op:?}")
}

fn eval_arith(op: OpKind, l: &Value, r: &Value, r_pos: &crate::ast::Pos) -> Result<Value, Error> {
    if let (Value::Str(a), Value::Str(b)) = (l, r) {
        debug_assert!(op == OpKind::Add, "string operands only fold through Add");
        return Ok(Value::Str(format!("{a}{b}")));
    }

    if let (Value::Float(a), Value::Float(b)) = (l, r) {
        let v = match op {
            OpKind::Add => a + b,
            OpKind::Sub => a - b,
            OpKind::Mul => a * b,
            OpKind::Div => {
                if *b == 0.0 {
                    return Err(Error::new(ErrorKind::DivideByZero, r_pos.clone(), vec![]));
                }
                a / b
            }
            OpKind::Mod => {
                if *b == 0.0 {
                    return Err(Error::new(ErrorKind::DivideByZero, r_pos.clone(), vec![]));
                }
                a % b
            }
            _ => unreachable!(),
        };
        return Ok(Value::Float(v));
    }

    let (Value::Int { magnitude: am, negative: an }, Value::Int { magnitude: bm, negative: bn }) =
        (l, r)
    else {
        unreachable!("eval_arith on non-numeric Values");
    };

    let a = signed_value(*am, *an);
    let b = signed_value(*bm, *bn);

    let v = match op {
        OpKind::Add => a.checked_add(b),
        OpKind::Sub => a.checked_sub(b),
        OpKind::Mul => a.checked_mul(b),
        OpKind::Div => {
            if b == 0 {
                return Err(Error::new(ErrorKind::DivideByZero, r_pos.clone(), vec![]));
            }
            a.checked_div(b)
        }
        OpKind::Mod => {
            if b == 0 {
                return Err(Error::new(ErrorKind::DivideByZero, r_pos.clone(), vec![]));
            }
            a.checked_rem(b)
        }
        _ => unreachable!(),
    };

    let v = v.ok_or_else(|| Error::new(ErrorKind::NumericOverflow, r_pos.clone(), vec![]))?;
    Ok(Value::int(v.unsigned_abs(), v < 0))
}

fn signed_value(magnitude: u64, negative: bool) -> i128 {
    let m = magnitude as i128;
    if negative {
        -m
    } else {
        m
    }
}

fn eval_bit(op: OpKind, l: &Value, r: &Value) -> Value {
    let (Value::Int { magnitude: am, .. }, Value::Int { magnitude: bm, .. }) = (l, r) else {
        unreachable!("eval_bit on non-integer Values");
    };
    let v = match op {
        OpKind::BitAnd => am & bm,
        OpKind::BitOr => am | bm,
        OpKind::BitXor => am ^ bm,
        OpKind::Shl => am.wrapping_shl(*bm as u32),
        OpKind::Shr => am.wrapping_shr(*bm as u32),
        _ => unreachable!(),
    };
    Value::int(v, false)
}

fn eval_cmp(op: OpKind, l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Int { .. }, Value::Int { .. }) => {
            let a = l.as_i64().expect("int value");
            let b = r.as_i64().expect("int value");
            cmp_ord(op, a.cmp(&b))
        }
        (Value::Float(_), Value::Float(_)) | (Value::Int { .. }, Value::Float(_)) | (Value::Float(_), Value::Int { .. }) => {
            let a = l.as_f64().expect("numeric value");
            let b = r.as_f64().expect("numeric value");
            cmp_ord(op, a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal))
        }
        (Value::Bool(a), Value::Bool(b)) => cmp_eq(op, a == b),
        (Value::Str(a), Value::Str(b)) => match op {
            OpKind::Eq => a == b,
            OpKind::Ne => a != b,
            _ => cmp_ord(op, a.cmp(b)),
        },
        _ => unreachable!("eval_cmp on mismatched Value kinds: {l:?} vs {r:?}"),
    }
}

fn cmp_ord(op: OpKind, ord: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        OpKind::Eq => ord == Equal,
        OpKind::Ne => ord != Equal,
        OpKind::Lt => ord == Less,
        OpKind::Gt => ord == Greater,
        OpKind::Le => ord != Greater,
        OpKind::Ge => ord != Less,
        _ => unreachable!(),
    }
}

fn cmp_eq(op: OpKind, eq: bool) -> bool {
    match op {
        OpKind::Eq => eq,
        OpKind::Ne => !eq,
        _ => unreachable!("only eq/ne are defined over bool"),
    }
}

fn eval_bool_cmp(op: OpKind, l: &Value, r: &Value) -> Value {
    let (Value::Bool(a), Value::Bool(b)) = (l, r) else {
        unreachable!("eval_bool_cmp on non-bool Values");
    };
    Value::Bool(match op {
        OpKind::And => *a && *b,
        OpKind::Or => *a || *b,
        _ => unreachable!(),
    })
}

/// Evaluate a unary operator, per `value.c`'s `value_neg`/`value_not`.
pub fn eval_unary(op: OpKind, v: &Value) -> Value {
    match (op, v) {
        (OpKind::Neg, Value::Int { magnitude, negative }) => {
            if *magnitude == 0 {
                Value::int(0, false)
            } else {
                Value::int(*magnitude, !negative)
            }
        }
        (OpKind::Neg, Value::Float(f)) => Value::Float(-f),
        (OpKind::Not, Value::Bool(b)) => Value::Bool(!b),
        _ => unreachable!("eval_unary on an unsupported (op, Value) pair: {op:?}, {v:?}"),
    }
}

/// Width-by-width range check. Preserves the original's unsigned
/// 64-bit asymmetry exactly: a negative `Int` never fits `Uint64` (rejected
/// outright), but a non-negative `Int`'s magnitude is a `u64` already, so it
/// always fits — there is no magnitude ceiling left to compare against.
pub fn fits_range(value: &Value, meta: &Meta) -> bool {
    let Value::Int { magnitude, negative } = value else {
        return matches!(
            (value, meta.kind()),
            (Value::Bool(_), MetaKind::Bool)
                | (Value::Str(_), MetaKind::String)
                | (Value::Float(_), MetaKind::Float | MetaKind::Double)
                | (Value::Null, _)
        );
    };

    match meta.kind() {
        MetaKind::Byte | MetaKind::Uint8 => !negative && *magnitude <= u8::MAX as u64,
        MetaKind::Int8 => fits_signed(*magnitude, *negative, i8::MIN as i128, i8::MAX as i128),
        MetaKind::Uint16 => !negative && *magnitude <= u16::MAX as u64,
        MetaKind::Int16 => fits_signed(*magnitude, *negative, i16::MIN as i128, i16::MAX as i128),
        MetaKind::Uint32 => !negative && *magnitude <= u32::MAX as u64,
        MetaKind::Int32 => fits_signed(*magnitude, *negative, i32::MIN as i128, i32::MAX as i128),
        MetaKind::Uint64 => !negative,
        MetaKind::Int64 => fits_signed(*magnitude, *negative, i64::MIN as i128, i64::MAX as i128),
        MetaKind::Float | MetaKind::Double => true,
        _ => false,
    }
}

fn fits_signed(magnitude: u64, negative: bool, min: i128, max: i128) -> bool {
    let v = if negative { -(magnitude as i128) } else { magnitude as i128 };
    v >= min && v <= max
}

/// Coerce a constant to another Meta's kind.
pub fn cast(value: &Value, meta: &Meta) -> Value {
    match meta.kind() {
        MetaKind::Bool => Value::Bool(to_bool(value)),
        MetaKind::String => Value::Str(to_string(value)),
        k if k.is_fp() => Value::Float(as_f64_for_cast(value)),
        k if k.is_integer() => {
            let f = as_f64_for_cast(value);
            Value::int(f.abs() as u64, f < 0.0)
        }
        _ => value.clone(),
    }
}

/// Like `Value::as_f64`, but also handles `Str` by parsing it as a base-10
/// number (with an optional leading `-`) so a string constant round-trips
/// through an integer/float cast instead of silently becoming zero.
fn as_f64_for_cast(value: &Value) -> f64 {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => value.as_f64().unwrap_or(0.0),
    }
}

fn to_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int { magnitude, .. } => *magnitude != 0,
        Value::Float(f) => *f != 0.0,
        Value::Str(s) => !(s.is_empty() || s == "false"),
        Value::Obj(h) => *h != 0,
        Value::Addr(a) => *a != 0,
    }
}

/// Fixed-precision print for floats, not Rust's shortest round-trip
/// `Display` — kept deterministic on purpose.
fn to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int { magnitude, negative } => {
            if *negative {
                format!("-{magnitude}")
            } else {
                magnitude.to_string()
            }
        }
        Value::Float(f) => format!("{f:.6}"),
        Value::Str(s) => s.clone(),
        Value::Obj(h) => format!("obj#{h}"),
        Value::Addr(a) => format!("addr#{a}"),
    }
}

trait MetaKindExt {
    fn is_fp(self) -> bool;
    fn is_integer(self) -> bool;
}

impl MetaKindExt for MetaKind {
    fn is_fp(self) -> bool {
        matches!(self, MetaKind::Float | MetaKind::Double)
    }

    fn is_integer(self) -> bool {
        matches!(
            self,
            MetaKind::Byte
                | MetaKind::Int8
                | MetaKind::Uint8
                | MetaKind::Int16
                | MetaKind::Uint16
                | MetaKind::Int32
                | MetaKind::Uint32
                | MetaKind::Int64
                | MetaKind::Uint64
        )
    }
}
