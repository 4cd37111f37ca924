/// Error types for TableView
///
/// Configuration mistakes (bad descriptors, bad options) are reported once,
/// when a view is built. Everything else is raised by an interaction that
/// breaks a contract: an action run against the wrong selection, a key that
/// is not in the collection, a page number of zero.
///
/// A record that lacks a field being filtered or sorted on is not an error;
/// the field is treated as absent.

use crate::record::RecordKey;

/// Descriptor and option errors, raised while a view is being configured.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown filter kind '{0}'")]
    UnknownFilterKind(String),

    #[error("duplicate filter key '{0}'")]
    DuplicateFilterKey(String),

    #[error("select filter '{0}' has no options")]
    MissingFilterOptions(String),

    #[error("columns '{first}' and '{second}' are both marked as the default sort")]
    MultipleDefaultSorts { first: String, second: String },

    #[error("default sort column '{0}' has no sort accessor")]
    DefaultSortNotSortable(String),

    #[error("invalid view options: {0}")]
    InvalidOptions(String),
}

/// Errors returned by table, view and repository operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The action's selection requirement does not fit the target it was run against.
    #[error("action '{action}' cannot run against {target}")]
    InvalidActionTarget { action: String, target: String },

    #[error("action '{action}' requires at least one selected record")]
    EmptySelection { action: String },

    #[error("record has no key")]
    MissingKey,

    #[error("duplicate record key {0}")]
    DuplicateKey(RecordKey),

    #[error("no record with key {0}")]
    UnknownRecord(RecordKey),

    #[error("record key changed from {old} to {new}")]
    KeyChanged { old: RecordKey, new: RecordKey },

    #[error("index {index} out of range [0, {len}]")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("invalid value '{value}' for filter '{key}'")]
    InvalidFilterValue { key: String, value: String },

    #[error("column {0} does not exist")]
    UnknownColumn(usize),

    #[error("column '{0}' is not sortable")]
    ColumnNotSortable(String),

    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("page size must be greater than zero")]
    InvalidPageSize,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("repository error: {0}")]
    Repository(String),
}

pub type Result<T> = std::result::Result<T, Error>;
