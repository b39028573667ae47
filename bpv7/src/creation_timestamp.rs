use super::*;
use error::CaptureFieldErr;

/// The bundle creation timestamp, a pair of DTN time and a sequence number.
///
/// A creation time of `None` encodes as 0, marking a source with no clock.
#[derive(Default, Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct CreationTimestamp {
    pub creation_time: Option<DtnTime>,
    pub sequence_number: u64,
}

impl CreationTimestamp {
    pub fn new(creation_time: DtnTime, sequence_number: u64) -> Self {
        Self {
            creation_time: (creation_time.millisecs() != 0).then_some(creation_time),
            sequence_number,
        }
    }

    pub fn now() -> Self {
        let timestamp = time::OffsetDateTime::now_utc();
        Self {
            creation_time: timestamp.try_into().ok(),
            sequence_number: (timestamp.nanosecond() % 1_000_000) as u64,
        }
    }
}

impl cbor::encode::ToCbor for CreationTimestamp {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit_array(Some(2), |a| {
            a.emit(&self.creation_time.unwrap_or_default());
            a.emit(&self.sequence_number);
        })
    }
}

impl cbor::decode::FromCbor for CreationTimestamp {
    type Error = Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |a, _| {
            let creation_time: DtnTime = a.parse().map_field_err("bundle creation time")?;
            let sequence_number = a.parse().map_field_err("sequence number")?;
            Ok::<_, Error>(CreationTimestamp {
                creation_time: (creation_time.millisecs() != 0).then_some(creation_time),
                sequence_number,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for ts in [
            CreationTimestamp::default(),
            CreationTimestamp::new(DtnTime::new(812_061_000_000), 42),
        ] {
            let encoded = cbor::encode::emit(&ts);
            let (decoded, len) =
                <CreationTimestamp as cbor::decode::FromCbor>::from_cbor(&encoded).unwrap();
            assert_eq!(len, encoded.len());
            assert_eq!(decoded, ts);
        }
    }

    #[test]
    fn anonymous() {
        // (0, 0) decodes as a source with no clock
        let (ts, _) =
            <CreationTimestamp as cbor::decode::FromCbor>::from_cbor(&[0x82, 0x00, 0x00]).unwrap();
        assert!(ts.creation_time.is_none());
        assert_eq!(ts.sequence_number, 0);
    }
}
