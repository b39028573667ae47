use super::*;

pub mod bib;
mod error;

pub use error::Error;

/// A security context identifier, RFC 9172 section 11.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
#[allow(non_camel_case_types)]
pub enum Context {
    BIB_HMAC_SHA2,
    Unrecognised(u64),
}

impl std::fmt::Display for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Context::BIB_HMAC_SHA2 => write!(f, "BIB-HMAC-SHA2"),
            Context::Unrecognised(v) => write!(f, "Unrecognised {v}"),
        }
    }
}

impl From<Context> for u64 {
    fn from(value: Context) -> Self {
        match value {
            Context::BIB_HMAC_SHA2 => 1,
            Context::Unrecognised(v) => v,
        }
    }
}

impl From<u64> for Context {
    fn from(value: u64) -> Self {
        match value {
            1 => Self::BIB_HMAC_SHA2,
            value => Self::Unrecognised(value),
        }
    }
}

impl cbor::encode::ToCbor for Context {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for Context {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        u64::from_cbor(data).map(|(v, len)| (v.into(), len))
    }
}

/// The integrity scope flags of BIB-HMAC-SHA2, RFC 9173 section 3.2.2.
///
/// The flags select which parts of the bundle are bound into the
/// integrity-protected plaintext alongside the target block's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeFlags {
    pub include_primary_block: bool,
    pub include_target_header: bool,
    pub include_security_header: bool,
    pub unrecognised: u64,
}

impl Default for ScopeFlags {
    fn default() -> Self {
        Self {
            include_primary_block: true,
            include_target_header: true,
            include_security_header: true,
            unrecognised: 0,
        }
    }
}

impl From<u64> for ScopeFlags {
    fn from(value: u64) -> Self {
        Self {
            include_primary_block: value & (1 << 0) != 0,
            include_target_header: value & (1 << 1) != 0,
            include_security_header: value & (1 << 2) != 0,
            unrecognised: value & !7,
        }
    }
}

impl From<ScopeFlags> for u64 {
    fn from(value: ScopeFlags) -> Self {
        let mut flags = value.unrecognised;
        if value.include_primary_block {
            flags |= 1 << 0;
        }
        if value.include_target_header {
            flags |= 1 << 1;
        }
        if value.include_security_header {
            flags |= 1 << 2;
        }
        flags
    }
}

impl cbor::encode::ToCbor for ScopeFlags {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for ScopeFlags {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        u64::from_cbor(data).map(|(v, len)| (v.into(), len))
    }
}
