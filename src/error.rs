use thiserror::Error;

/// Error cases surfaced by the engine.
///
/// Per-frame anomalies (degenerate boxes, unmatchable plates, starved
/// tracks, evidence-free identities) are recovered locally and logged;
/// only startup validation and frame-order violations are fatal.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid plate grammar: {0}")]
    InvalidGrammar(String),

    #[error("frame {frame} arrived after frame {last}; frames must be strictly increasing")]
    OutOfOrderFrame { frame: u64, last: u64 },

    #[error("innovation covariance is singular")]
    SingularInnovation,
}
