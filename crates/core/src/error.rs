/// Errors raised at the boundaries of the engine.
///
/// Clinical operations themselves never fail: malformed times, vitals or log text degrade to
/// defined (possibly empty) output. These variants cover configuration, identifiers, labels
/// and snapshot encoding only.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid patient id: {0}")]
    InvalidPatientId(String),
    #[error("invalid label: {0}")]
    InvalidLabel(#[from] casualty_types::TextError),
    #[error("label '{shorter}' is contained in label '{longer}'")]
    LabelConflict { shorter: String, longer: String },
    #[error("duplicate label '{0}'")]
    DuplicateLabel(String),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("{0}")]
    Decode(String),
    #[error("failed to serialize snapshot as JSON: {0}")]
    JsonSerialization(serde_json::Error),
    #[error("failed to serialize snapshot as YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
