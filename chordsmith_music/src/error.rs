// Error type shared by every fallible operation in the crate.
//
// All variants are programmer-facing contract violations: the library never
// retries and never clamps its way past one. Zero-sum weight tables are not an
// error at all; `markov::weighted_select` falls back to the tonic.

/// Errors raised by chord construction, config parsing and generation.
#[derive(Debug, thiserror::Error)]
pub enum HarmonyError {
    #[error("invalid scale degree {0}: expected 1..=7")]
    InvalidDegree(u8),

    #[error("unknown {kind} '{value}'")]
    UnknownEnum { kind: &'static str, value: String },

    #[error("invalid generation config: {0}")]
    InvalidConfig(String),

    #[error("pitch {0} is outside the MIDI range 0..=127")]
    PitchOutOfRange(u16),

    #[error("malformed preset: {0}")]
    Preset(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarmonyError>;
