use thiserror::Error;

/// Exit code a caller should use on a particle-id range violation.
pub const PARTICLE_ID_RANGE_EXIT_CODE: i32 = 9;

#[derive(Error, Debug, Clone)]
pub enum CoreError {
    #[error("snapshot {snapshot}: particle id {particle_id} out of range [0, {num_part})")]
    InputRangeError { snapshot: usize, particle_id: u64, num_part: u64 },

    #[error("invalid match configuration: {0}")]
    PolicyViolation(String),

    #[error("failed to allocate scratch arena of {requested} entries: {reason}")]
    ResourceAllocationFailure { requested: usize, reason: String },

    #[error("source halo ordinal {0} is out of range for the source catalog")]
    SourceOutOfRange(usize),

    #[error("target halo ordinal {0} is out of range for the target catalog")]
    TargetOutOfRange(usize),
}

impl CoreError {
    /// The process exit code this condition warrants, if any. Library code never calls
    /// `std::process::exit` itself; a binary entry point is expected to match on this and
    /// terminate accordingly.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CoreError::InputRangeError { .. } => Some(PARTICLE_ID_RANGE_EXIT_CODE),
            _ => None,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
