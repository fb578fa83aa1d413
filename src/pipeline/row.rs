use chrono::NaiveDateTime;

use crate::transform::{CanonicalRow, transform};
use crate::types::{EntityKind, RawRow, ValidationOutcome};
use crate::validation::validate;

/// Result of running one row through validation and transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Accepted and transformed; waiting for the batch load.
    Ready(CanonicalRow),
    /// A business rule failed. Never reaches the transformer.
    Rejected(String),
    /// Coercion failed, or the kind has no transformer.
    Failed(String),
}

/// Validate then transform a single row.
pub fn stage_row(kind: EntityKind, row: &RawRow, now: NaiveDateTime) -> RowOutcome {
    if let Some(ValidationOutcome::Rejected(reason)) = validate(kind, row, now) {
        return RowOutcome::Rejected(reason);
    }
    match transform(kind, row, now) {
        Ok(canonical) => RowOutcome::Ready(canonical),
        Err(e) => RowOutcome::Failed(e.to_string()),
    }
}
