use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Topics or data do not match the event's ABI layout.
    #[error("{event}: {message}")]
    Abi {
        event: &'static str,
        message: String,
    },

    #[error("{event}: topic {index} is not canonically encoded")]
    NonCanonicalTopic { event: &'static str, index: usize },

    #[error("{event}: {field} does not fit its type")]
    OutOfRange {
        event: &'static str,
        field: &'static str,
    },
}
