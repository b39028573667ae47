use super::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Mismatched security target and result arrays")]
    MismatchedTargetResult,

    #[error("The security target block is not in the bundle")]
    MissingSecurityTarget,

    #[error("Invalid null security source")]
    InvalidSecuritySource,

    #[error("BIBs must not target other BIBs")]
    InvalidBIBTarget,

    #[error("Invalid security context {0}")]
    InvalidContext(u64),

    #[error("Invalid security context parameter id {0}")]
    InvalidContextParameter(u64),

    #[error("Invalid security context result id {0}")]
    InvalidContextResult(u64),

    #[error("The same security target appears more than once")]
    DuplicateOpTarget,

    #[error("No targets in BPSec extension block")]
    NoTargets,

    #[error("Unsupported SHA variant {0}")]
    UnsupportedShaVariant(u64),

    #[error("Integrity check failed")]
    IntegrityCheckFailed,

    #[error("Algorithm failure: {0}")]
    Algorithm(String),

    #[error("Failed to parse {field}: {source}")]
    InvalidField {
        field: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    InvalidEid(#[from] eid::Error),

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),
}

pub trait CaptureFieldErr<T> {
    fn map_field_err(self, field: &'static str) -> Result<T, Error>;
}

impl<T, E: Into<Box<dyn std::error::Error + Send + Sync>>> CaptureFieldErr<T>
    for std::result::Result<T, E>
{
    fn map_field_err(self, field: &'static str) -> Result<T, Error> {
        self.map_err(|e| Error::InvalidField {
            field,
            source: e.into(),
        })
    }
}
