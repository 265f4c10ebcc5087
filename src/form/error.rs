use thiserror::Error;

/// Raised when an edit names a field the instance does not carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown attribute field '{0}'")]
pub struct UnknownField(pub String);
