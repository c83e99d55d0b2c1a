use crate::Id;

/// Convenience wrapper to represent success or a meaningful core error.
pub type PlanResult<T> = std::result::Result<T, PlanError>;

/// Errors produced by the planning-task preprocessor core.
///
/// Unifier incompatibility is deliberately *not* a variant here: it is
/// expected control flow and is represented by a plain `bool` or a local
/// `Result<(), Incompatible>` inside `pcore-types::unifier` rather than
/// bubbling up through this type.
#[derive(thiserror::Error, Clone, Debug)]
pub enum PlanError {
    #[error("pass assumption violated by `{pass}`: {msg}")]
    PassAssumption { pass: String, msg: String },

    #[error("unsupported input for `{pruner}`: {msg}")]
    Unsupported { pruner: String, msg: String },

    #[error("upstream failure in `{pruner}`: {trace}")]
    Upstream { pruner: String, trace: String },

    #[error("malformed task: {0}")]
    MalformedTask(String),

    #[error("undefined {kind} `{name}`")]
    Undefined { name: Id, kind: &'static str },

    #[error("`{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl PlanError {
    pub fn pass_assumption<S: ToString, M: ToString>(pass: S, msg: M) -> Self {
        Self::PassAssumption {
            pass: pass.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn unsupported<S: ToString, M: ToString>(pruner: S, msg: M) -> Self {
        Self::Unsupported {
            pruner: pruner.to_string(),
            msg: msg.to_string(),
        }
    }

    pub fn upstream<S: ToString, M: ToString>(pruner: S, trace: M) -> Self {
        Self::Upstream {
            pruner: pruner.to_string(),
            trace: trace.to_string(),
        }
    }

    pub fn malformed_task<S: ToString>(msg: S) -> Self {
        Self::MalformedTask(msg.to_string())
    }

    pub fn undefined(name: Id, kind: &'static str) -> Self {
        Self::Undefined { name, kind }
    }

    pub fn already_registered<S: ToString>(name: S) -> Self {
        Self::AlreadyRegistered(name.to_string())
    }

    pub fn invariant<S: ToString>(msg: S) -> Self {
        Self::InvariantViolation(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_pruner_name() {
        let e = PlanError::unsupported("irrelevance", "conditional effects");
        assert!(e.to_string().contains("irrelevance"));
        assert!(e.to_string().contains("conditional effects"));
    }
}
