use thiserror::Error;

use super::types::MoveId;

/// Errors that abort an Intrastat computation.
///
/// Missing classification data is never an error: it degrades to an unset
/// field and is reported as an [`IntrastatWarning`] instead.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IntrastatError {
    /// A record referenced by another record is not present in the store.
    #[error("{kind} {id} not found")]
    MissingRecord {
        /// Record kind (e.g. "product", "shipment").
        kind: &'static str,
        /// Display form of the missing identifier.
        id: String,
    },

    /// Invalid or inconsistent configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Subdivision code without an Intrastat mapping during an import.
    #[error("unknown subdivision code: {0}")]
    UnknownSubdivision(String),
}

impl IntrastatError {
    pub(crate) fn missing(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::MissingRecord {
            kind,
            id: id.to_string(),
        }
    }
}

/// Data-incompleteness notice for a declared move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntrastatWarning {
    /// The move the warning is about.
    pub move_id: MoveId,
    /// Name of the incomplete field (e.g. "intrastat_tariff_code").
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for IntrastatWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "move {}: {}: {}", self.move_id, self.field, self.message)
    }
}

impl IntrastatWarning {
    pub fn new(move_id: MoveId, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            move_id,
            field: field.into(),
            message: message.into(),
        }
    }
}
