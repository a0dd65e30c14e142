//! Fault classifier.
//!
//! Maps an arbitrary internal fault onto a `(safe_message, code)` pair by
//! case-insensitive keyword match on the fault's description. Rules are
//! evaluated top to bottom and the first hit wins; descriptions often mention
//! several providers, so the order below must not change.

use crate::envelope::ErrorCode;
use crate::fault::Fault;

struct Rule {
    keywords: &'static [&'static str],
    message: &'static str,
    code: ErrorCode,
}

const RULES: &[Rule] = &[
    Rule {
        keywords: &["dynamodb", "botocore"],
        message: "Database operation failed",
        code: ErrorCode::DbError,
    },
    Rule {
        keywords: &["iam", "unauthorized"],
        message: "Access denied",
        code: ErrorCode::AuthError,
    },
    Rule {
        keywords: &["lambda", "service"],
        message: "Service unavailable",
        code: ErrorCode::ServiceError,
    },
];

const FALLBACK: (&str, ErrorCode) = ("Internal server error", ErrorCode::InternalError);

/// Classify a rendered fault description.
pub fn classify(description: &str) -> (&'static str, ErrorCode) {
    let lowered = description.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lowered.contains(kw)))
        .map(|rule| (rule.message, rule.code))
        .unwrap_or(FALLBACK)
}

/// Classify a [`Fault`] by its description.
pub fn classify_fault(fault: &Fault) -> (&'static str, ErrorCode) {
    classify(&fault.description())
}
