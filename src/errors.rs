use reqwest::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum SnowflakeError {
    #[error("signing failed: {0}")]
    Signing(#[from] rsa::Error),
    #[error("could not encode public key for fingerprint: {0}")]
    KeyEncoding(#[from] rsa::pkcs8::spki::Error),
    #[error("statement submission failed: HTTP {status}: {body}")]
    StatementQueryFailed { status: StatusCode, body: String },
    #[error("partition {index} fetch failed: HTTP {status}: {body}")]
    PartitionQueryFailed {
        index: usize,
        status: StatusCode,
        body: String,
    },
    #[error("partition {index} out of range: result set has {count} partitions")]
    PartitionOutOfRange { index: usize, count: usize },
    #[error("row {row} has {actual} values but the result set has {expected} columns")]
    RowShapeMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error(transparent)]
    JSONError(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
}

pub type SnowflakeResult<T> = Result<T, SnowflakeError>;
