use thiserror::Error;

/// A malformed record reported by the tag decoder.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("tag {code} is truncated: expected {expected} bytes, found {actual}")]
    Truncated {
        code: u16,
        expected: usize,
        actual: usize,
    },
    #[error("tag {code} is missing required field `{field}`")]
    MissingField { code: u16, field: &'static str },
    #[error("malformed tag record: {0}")]
    Json(#[from] serde_json::Error),
}
