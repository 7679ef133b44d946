//! Compile error types for the WHERE predicate compiler
//!
//! Error codes:
//! - QUARRY_PARSE_INVALID (REJECT) — malformed predicate JSON/tree
//! - QUARRY_INVALID_TERM (REJECT) — wrong-typed or incomplete term
//! - QUARRY_BAD_OPERATOR (REJECT) — operator/type pairing outside the allowed set
//! - QUARRY_UNKNOWN_FIELD (REJECT) — field not recognized for the table kind
//! - QUARRY_UNINDEXED_FIELD (REJECT) — stats field unknown or not indexed
//! - QUARRY_BAD_IP (REJECT) — endpoint value failed IPv4/IPv6 parse
//! - QUARRY_MISSING_CORRELATE (REJECT) — flow correlation invariant violated
//! - QUARRY_BAD_SUFFIX (REJECT) — stats suffix inconsistent with the schema
//! - QUARRY_WILDCARD_UNSUPPORTED (REJECT) — table kind has no wildcard scan
//!
//! All compile errors are synchronous rejections raised before any scan is
//! dispatched; runtime scan failures travel through `WhereOutcome` instead.

use std::fmt;

/// Compiler error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    ParseInvalid,
    InvalidTerm,
    BadOperator,
    UnknownField,
    UnindexedField,
    BadIp,
    MissingCorrelate,
    BadSuffix,
    WildcardUnsupported,
}

impl CompileErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::ParseInvalid => "QUARRY_PARSE_INVALID",
            CompileErrorCode::InvalidTerm => "QUARRY_INVALID_TERM",
            CompileErrorCode::BadOperator => "QUARRY_BAD_OPERATOR",
            CompileErrorCode::UnknownField => "QUARRY_UNKNOWN_FIELD",
            CompileErrorCode::UnindexedField => "QUARRY_UNINDEXED_FIELD",
            CompileErrorCode::BadIp => "QUARRY_BAD_IP",
            CompileErrorCode::MissingCorrelate => "QUARRY_MISSING_CORRELATE",
            CompileErrorCode::BadSuffix => "QUARRY_BAD_SUFFIX",
            CompileErrorCode::WildcardUnsupported => "QUARRY_WILDCARD_UNSUPPORTED",
        }
    }
}

impl fmt::Display for CompileErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Compile error with message and the offending field, if any
#[derive(Debug, Clone)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
    field: Option<String>,
}

impl CompileError {
    pub fn parse_invalid(reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::ParseInvalid,
            message: reason.into(),
            field: None,
        }
    }

    pub fn invalid_term(reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::InvalidTerm,
            message: reason.into(),
            field: None,
        }
    }

    pub fn bad_operator(field: impl Into<String>, op_name: &str) -> Self {
        let f = field.into();
        Self {
            code: CompileErrorCode::BadOperator,
            message: format!("operator {} not allowed on field '{}'", op_name, f),
            field: Some(f),
        }
    }

    pub fn unknown_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: CompileErrorCode::UnknownField,
            message: format!("field '{}' is not recognized for this table", f),
            field: Some(f),
        }
    }

    pub fn unindexed_field(field: impl Into<String>) -> Self {
        let f = field.into();
        Self {
            code: CompileErrorCode::UnindexedField,
            message: format!("stats field '{}' is unknown or not indexed", f),
            field: Some(f),
        }
    }

    pub fn bad_ip(field: impl Into<String>, raw: &str) -> Self {
        let f = field.into();
        Self {
            code: CompileErrorCode::BadIp,
            message: format!("field '{}' value '{}' is not a valid IP address", f, raw),
            field: Some(f),
        }
    }

    pub fn missing_correlate(reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::MissingCorrelate,
            message: reason.into(),
            field: None,
        }
    }

    pub fn bad_suffix(reason: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::BadSuffix,
            message: reason.into(),
            field: None,
        }
    }

    pub fn wildcard_unsupported(table: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::WildcardUnsupported,
            message: format!("table '{}' has no wildcard scan", table.into()),
            field: None,
        }
    }

    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REJECT] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for compile operations
pub type CompileResult<T> = Result<T, CompileError>;
