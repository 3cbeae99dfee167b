//! The crate-wide error type.
//!
//! Configuration problems (missing table rows, malformed parameters, bad run settings) and
//! invariant violations are both fatal for a run, so every fallible operation in the crate
//! returns `Result<_, HepceError>` and the driver aborts on the first error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HepceError {
    /// A covariate combination is absent from a parameter table.
    #[error("no entry in table `{table}` for key {key}")]
    MissingEntry { table: &'static str, key: String },

    /// The same covariate combination appears twice while building a table.
    #[error("duplicate parameter table entry for key {key}")]
    DuplicateEntry { key: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid simulation configuration: {0}")]
    InvalidConfig(String),

    /// A sub-stochastic decision vector summed to more than one.
    #[error("decision probabilities sum to {sum}, which exceeds 1")]
    ProbabilityOverflow { sum: f64 },

    #[error("unknown {kind} name `{name}`")]
    UnknownStateName { kind: &'static str, name: String },

    /// A person was observed in a combined state that no sequence of events can produce.
    #[error("person {person} is in an impossible state: {detail}")]
    InvariantViolation { person: usize, detail: String },

    #[error("parameters have not been loaded into the context")]
    ParametersNotLoaded,

    #[error("the simulation configuration has not been set")]
    ConfigNotSet,

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl HepceError {
    pub fn missing_entry(table: &'static str, key: &impl std::fmt::Debug) -> Self {
        Self::MissingEntry {
            table,
            key: format!("{key:?}"),
        }
    }

    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
