//! Plan parsing errors

/// Whether an error came from the document skeleton or from an action grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanErrorKind {
    /// Document skeleton violation; message already carries a marked trace
    Structure,
    /// Anything else; the parser appends a numbered trace and a hint
    Grammar,
}

/// Raised on any structural or grammatical violation in a plan document
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct InvalidPlanError {
    pub kind: PlanErrorKind,
    pub message: String,
}

impl InvalidPlanError {
    pub fn structure(message: impl Into<String>) -> Self {
        InvalidPlanError {
            kind: PlanErrorKind::Structure,
            message: message.into(),
        }
    }

    pub fn grammar(message: impl Into<String>) -> Self {
        InvalidPlanError {
            kind: PlanErrorKind::Grammar,
            message: message.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        self.kind == PlanErrorKind::Structure
    }
}

/// Raised when a `Plan` is built in violation of its invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanConstructionError {
    #[error("Plan must contain at least one action")]
    NoActions,
}
