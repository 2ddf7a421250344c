use thiserror::Error;

/// Errors surfaced by the simulation core.
#[derive(Debug, Error)]
pub enum SimError {
    /// Parameters that cannot produce a valid arena or population.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A tick produced state that would corrupt every later spatial query.
    #[error("invariant violated at tick {tick} by agent {agent}: {detail}")]
    FatalInvariantViolation {
        tick: u64,
        agent: usize,
        detail: String,
    },

    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
