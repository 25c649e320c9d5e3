use thiserror::Error;

/// Failures raised while turning raw branch arrays into an [`EventRecord`].
///
/// [`EventRecord`]: crate::event::EventRecord
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("{branch}: field `{field}` has {found} entries, expected {expected}")]
    LengthMismatch {
        branch: &'static str,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{branch}: negative object count {count}")]
    NegativeCount { branch: &'static str, count: i64 },

    /// The line is not a valid event record at all
    #[error("Malformed event record: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Invalid threshold `{name}`: {reason}")]
    InvalidThreshold { name: String, reason: String },

    #[error("Efficiency definition `{definition}` references unknown condition `{condition}`")]
    UnknownCondition { definition: String, condition: String },

    #[error("Duplicate condition name `{0}`")]
    DuplicateCondition(String),

    #[error("Trigger menu is empty")]
    EmptyMenu,
}
