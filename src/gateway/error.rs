use std::{fmt, str::FromStr};

use thiserror::Error;

/// The four remote calls an attribute editor makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchInstance,
    FetchLayout,
    PatchField,
    CompleteInstance,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FetchInstance => "fetch-instance",
            Operation::FetchLayout => "fetch-layout",
            Operation::PatchField => "patch-field",
            Operation::CompleteInstance => "complete-instance",
        }
    }
}

/// Name that is not one of the four gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gateway operation '{0}'")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "fetch-instance" | "fetchInstance" => Ok(Operation::FetchInstance),
            "fetch-layout" | "fetchLayout" => Ok(Operation::FetchLayout),
            "patch-field" | "patchField" => Ok(Operation::PatchField),
            "complete-instance" | "completeInstance" => Ok(Operation::CompleteInstance),
            other => Err(UnknownOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single gateway call.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The remote side answered with an error.
    #[error("{operation} rejected: {message}")]
    Rejected { operation: Operation, message: String },
    /// The response body did not have the expected shape.
    #[error("{operation} returned a malformed response: {source}")]
    Malformed {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
    /// No answer could be obtained at all.
    #[error("{operation} unavailable")]
    Unavailable { operation: Operation },
}

impl GatewayError {
    pub fn rejected(operation: Operation, message: impl Into<String>) -> Self {
        GatewayError::Rejected {
            operation,
            message: message.into(),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            GatewayError::Rejected { operation, .. }
            | GatewayError::Malformed { operation, .. }
            | GatewayError::Unavailable { operation } => *operation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_parse_from_kebab_and_camel_case() {
        assert_eq!("patch-field".parse::<Operation>(), Ok(Operation::PatchField));
        assert_eq!("completeInstance".parse::<Operation>(), Ok(Operation::CompleteInstance));
        for operation in [
            Operation::FetchInstance,
            Operation::FetchLayout,
            Operation::PatchField,
            Operation::CompleteInstance,
        ] {
            assert_eq!(operation.as_str().parse::<Operation>(), Ok(operation));
        }
    }

    #[test]
    fn unknown_operation_names_the_input() {
        let err = "bogus".parse::<Operation>().unwrap_err();
        assert_eq!(err.to_string(), "unknown gateway operation 'bogus'");
    }
}
