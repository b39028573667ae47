use super::*;
use error::CaptureFieldErr;

/// The content of a Hop Count block, RFC 9171 section 4.4.3.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HopInfo {
    /// The maximum number of hops the bundle may traverse.
    pub limit: u64,
    /// The number of hops the bundle has traversed so far.
    pub count: u64,
}

impl cbor::encode::ToCbor for HopInfo {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&(self.limit, self.count))
    }
}

impl cbor::decode::FromCbor for HopInfo {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |a, _| {
            Ok::<_, Error>(HopInfo {
                limit: a.parse().map_field_err("hop limit")?,
                count: a.parse().map_field_err("hop count")?,
            })
        })
    }
}
