//! Error types for the simulation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Rejected at construction time, before any simulation state exists.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A placement targeted a cell that already holds an animal.
    #[error("Cell ({x}, {y}) is already occupied")]
    OccupiedCell { x: i32, y: i32 },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occupied_cell_message() {
        let err = Error::OccupiedCell { x: 3, y: 7 };
        assert_eq!(err.to_string(), "Cell (3, 7) is already occupied");
    }

    #[test]
    fn test_serde_json_conversion() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
