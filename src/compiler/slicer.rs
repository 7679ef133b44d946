//! Range slicer
//!
//! Turns one (operator, value[, value2]) triple into a `[start, finish]`
//! bound pair for a single key component. Strings support EQUAL and PREFIX,
//! numerics support EQUAL and IN_RANGE; everything else is rejected here so
//! the per-table strategies can rely on the pairing being legal.

use crate::model::{MatchOp, Value};

use super::errors::{CompileError, CompileResult};

/// Byte guaranteed to sort after any character the store accepts, used to
/// close a lexicographic prefix scan.
pub const PREFIX_SENTINEL: char = '\x7f';

/// Slices an operator and value into inclusive `(start, finish)` bounds.
///
/// `value2` is consulted only for IN_RANGE, where it is mandatory and must
/// carry the same tag as `value`.
pub fn slice(op: MatchOp, value: Value, value2: Option<Value>) -> CompileResult<(Value, Value)> {
    match &value {
        Value::Str(_) => {
            if !matches!(op, MatchOp::Equal | MatchOp::Prefix) {
                return Err(CompileError::bad_operator("<string component>", op.name()));
            }
        }
        Value::U64(_) | Value::Dbl(_) => {
            if !matches!(op, MatchOp::Equal | MatchOp::InRange) {
                return Err(CompileError::bad_operator("<numeric component>", op.name()));
            }
        }
    }

    let finish = match op {
        MatchOp::Prefix => {
            let Value::Str(s) = &value else { unreachable!() };
            Value::Str(format!("{}{}", s, PREFIX_SENTINEL))
        }
        MatchOp::InRange => {
            let v2 = value2
                .ok_or_else(|| CompileError::invalid_term("IN_RANGE term is missing value2"))?;
            if !v2.same_tag(&value) {
                return Err(CompileError::invalid_term(
                    "IN_RANGE bounds carry different types",
                ));
            }
            v2
        }
        _ => value.clone(),
    };

    Ok((value, finish))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_is_point_range() {
        let (s, f) = slice(MatchOp::Equal, Value::Str("vrouter1".into()), None).unwrap();
        assert_eq!(s, f);
        assert_eq!(s, Value::Str("vrouter1".into()));

        let (s, f) = slice(MatchOp::Equal, Value::U64(80), None).unwrap();
        assert_eq!(s, Value::U64(80));
        assert_eq!(f, Value::U64(80));
    }

    #[test]
    fn test_prefix_extends_with_sentinel() {
        let (s, f) = slice(MatchOp::Prefix, Value::Str("vr".into()), None).unwrap();
        assert_eq!(s, Value::Str("vr".into()));
        assert_eq!(f, Value::Str("vr\x7f".into()));
        // Finish bounds every string with the prefix
        assert!(Value::Str("vrouter-zz".into()) < f);
        assert!(s < f);
    }

    #[test]
    fn test_in_range_uses_value2() {
        let (s, f) = slice(MatchOp::InRange, Value::U64(10), Some(Value::U64(20))).unwrap();
        assert_eq!(s, Value::U64(10));
        assert_eq!(f, Value::U64(20));

        let (s, f) = slice(MatchOp::InRange, Value::Dbl(0.5), Some(Value::Dbl(1.5))).unwrap();
        assert!(s < f);
    }

    #[test]
    fn test_start_never_exceeds_finish() {
        let cases = [
            slice(MatchOp::Equal, Value::U64(7), None),
            slice(MatchOp::Equal, Value::Dbl(7.5), None),
            slice(MatchOp::Equal, Value::Str("m".into()), None),
            slice(MatchOp::Prefix, Value::Str("m".into()), None),
            slice(MatchOp::InRange, Value::U64(1), Some(Value::U64(9))),
        ];
        for case in cases {
            let (s, f) = case.unwrap();
            assert!(s.partial_cmp(&f).map(|o| o != std::cmp::Ordering::Greater) == Some(true));
        }
    }

    #[test]
    fn test_prefix_on_numeric_rejected() {
        assert!(slice(MatchOp::Prefix, Value::U64(5), None).is_err());
        assert!(slice(MatchOp::Prefix, Value::Dbl(5.0), None).is_err());
    }

    #[test]
    fn test_in_range_on_string_rejected() {
        let err = slice(
            MatchOp::InRange,
            Value::Str("a".into()),
            Some(Value::Str("z".into())),
        )
        .unwrap_err();
        assert_eq!(err.code().code(), "QUARRY_BAD_OPERATOR");
    }

    #[test]
    fn test_unsupported_ops_rejected() {
        assert!(slice(MatchOp::NotEqual, Value::Str("a".into()), None).is_err());
        assert!(slice(MatchOp::RegexMatch, Value::Str("a".into()), None).is_err());
        assert!(slice(MatchOp::Leak, Value::U64(1), None).is_err());
    }

    #[test]
    fn test_in_range_missing_or_mistyped_value2() {
        assert!(slice(MatchOp::InRange, Value::U64(1), None).is_err());
        assert!(slice(MatchOp::InRange, Value::U64(1), Some(Value::Dbl(2.0))).is_err());
    }
}
