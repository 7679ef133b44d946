//! Match operators
//!
//! The integer codes are a contract with callers embedding them in WHERE
//! JSON and must be preserved bit-for-bit. Only `Equal`, `InRange` and
//! `Prefix` are supported by this core; the remaining codes parse so callers
//! get a precise rejection instead of a malformed-JSON error.

use serde::{Deserialize, Serialize};

/// WHERE term operator, identified on the wire by a fixed integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i64)]
pub enum MatchOp {
    Equal = 1,
    NotEqual = 2,
    InRange = 3,
    NotInRange = 4,
    Leak = 5,
    Prefix = 6,
    RegexMatch = 7,
}

impl MatchOp {
    /// Decodes a wire operator code; unknown codes yield `None`.
    pub fn from_code(code: i64) -> Option<MatchOp> {
        match code {
            1 => Some(MatchOp::Equal),
            2 => Some(MatchOp::NotEqual),
            3 => Some(MatchOp::InRange),
            4 => Some(MatchOp::NotInRange),
            5 => Some(MatchOp::Leak),
            6 => Some(MatchOp::Prefix),
            7 => Some(MatchOp::RegexMatch),
            _ => None,
        }
    }

    /// The wire code for this operator.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Whether this core can compile the operator at all.
    pub fn is_supported(self) -> bool {
        matches!(self, MatchOp::Equal | MatchOp::InRange | MatchOp::Prefix)
    }

    /// Operator name for diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            MatchOp::Equal => "EQUAL",
            MatchOp::NotEqual => "NOT_EQUAL",
            MatchOp::InRange => "IN_RANGE",
            MatchOp::NotInRange => "NOT_IN_RANGE",
            MatchOp::Leak => "LEAK",
            MatchOp::Prefix => "PREFIX",
            MatchOp::RegexMatch => "REGEX_MATCH",
        }
    }
}
