use super::*;
use thiserror::Error;

/// The primary error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// There is additional data after the end of the outer CBOR array.
    #[error("Bundle has additional data after end of CBOR array")]
    AdditionalData,

    /// The bundle protocol version is not 7.
    #[error("Unsupported bundle protocol version {0}")]
    InvalidVersion(u64),

    /// The bundle has no payload block.
    #[error("Bundle has no payload block")]
    MissingPayload,

    /// The final block of the bundle is not the payload block.
    #[error("Final block of bundle is not a payload block")]
    PayloadNotFinal,

    /// Two canonical blocks share a block number.
    #[error("Bundle has more than one block with block number {0}")]
    DuplicateBlockNumber(u64),

    /// A block has an invalid block number for its type.
    #[error("{1:?} block cannot be block number {0}")]
    InvalidBlockNumber(u64, BlockType),

    /// The bundle has multiple blocks of a type that must be unique.
    #[error("Bundle has multiple {0:?} blocks")]
    DuplicateBlocks(BlockType),

    /// A block's content continues past its declared value.
    #[error("{0:?} block has additional data after its content")]
    AdditionalBlockData(BlockType),

    /// The bundle lifetime is zero.
    #[error("Bundle lifetime must be greater than zero")]
    InvalidLifetime,

    /// The is-fragment flag does not agree with the fragment fields.
    #[error("Fragment flag does not match the presence of fragment information")]
    FragmentInfoMismatch,

    /// An invalid combination of bundle processing control flags.
    #[error("Invalid bundle or block flag combination")]
    InvalidFlags,

    /// A builder was asked to build without a required field.
    #[error("Builder is missing required field '{0}'")]
    Incomplete(&'static str),

    /// An error related to BPSec processing.
    #[error(transparent)]
    InvalidBPSec(#[from] bpsec::Error),

    /// An error related to CRC processing.
    #[error(transparent)]
    InvalidCrc(#[from] crc::Error),

    /// An error related to Endpoint ID processing.
    #[error(transparent)]
    InvalidEid(#[from] eid::Error),

    /// An error related to CBOR decoding.
    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),

    /// A generic error for when parsing a specific field fails.
    #[error("Failed to parse {field}: {source}")]
    InvalidField {
        /// The name of the field that failed to parse.
        field: &'static str,
        /// The underlying error that caused the failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A trait for mapping errors to a [`Error::InvalidField`].
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
