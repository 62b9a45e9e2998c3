//! Record-level errors.
//!
//! Stream records come from a schema the core does not control. Conversion
//! failures are typed so callers can log them, but the reconciler never lets
//! them escape: a malformed record is dropped, not surfaced.

use thiserror::Error;

/// Errors converting a raw stream record into a core type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field is absent or empty
    #[error("record {doc_id}: missing field `{field}`")]
    MissingField {
        /// Document the record came from
        doc_id: String,
        /// Name of the missing field
        field: &'static str,
    },
}
