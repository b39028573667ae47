use super::*;

const DTN_EPOCH: time::OffsetDateTime = time::macros::datetime!(2000-01-01 00:00:00 UTC);

/// An instant expressed as milliseconds since the DTN epoch,
/// 2000-01-01T00:00:00Z.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DtnTime {
    millisecs: u64,
}

impl DtnTime {
    pub fn now() -> Self {
        time::OffsetDateTime::now_utc()
            .try_into()
            .expect("system clock before the DTN epoch")
    }

    pub fn new(millisecs: u64) -> Self {
        Self { millisecs }
    }

    pub fn millisecs(&self) -> u64 {
        self.millisecs
    }
}

impl cbor::encode::ToCbor for DtnTime {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&self.millisecs)
    }
}

impl cbor::decode::FromCbor for DtnTime {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        u64::from_cbor(data).map(|(millisecs, len)| (Self { millisecs }, len))
    }
}

impl TryFrom<time::OffsetDateTime> for DtnTime {
    type Error = time::error::ConversionRange;

    fn try_from(instant: time::OffsetDateTime) -> Result<Self, Self::Error> {
        // Instants before the DTN epoch have no representation
        let since_epoch = instant - DTN_EPOCH;
        if since_epoch.is_negative() {
            return Err(time::error::ConversionRange);
        }
        u64::try_from(since_epoch.whole_milliseconds())
            .map(|millisecs| Self { millisecs })
            .map_err(|_| time::error::ConversionRange)
    }
}

impl From<DtnTime> for time::OffsetDateTime {
    fn from(dtn_time: DtnTime) -> Self {
        DTN_EPOCH.saturating_add(
            time::Duration::milliseconds((dtn_time.millisecs.min(i64::MAX as u64)) as i64),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch() {
        let t: DtnTime = DTN_EPOCH.try_into().unwrap();
        assert_eq!(t.millisecs(), 0);

        let later = DTN_EPOCH + time::Duration::milliseconds(3_600_000);
        let t: DtnTime = later.try_into().unwrap();
        assert_eq!(t.millisecs(), 3_600_000);
        assert_eq!(time::OffsetDateTime::from(t), later);
    }

    #[test]
    fn pre_epoch() {
        let before = DTN_EPOCH - time::Duration::seconds(1);
        assert!(DtnTime::try_from(before).is_err());
    }
}
