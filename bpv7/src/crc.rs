use super::*;
use thiserror::Error;

const X25: ::crc::Crc<u16> = ::crc::Crc::<u16>::new(&::crc::CRC_16_IBM_SDLC);
const CASTAGNOLI: ::crc::Crc<u32> = ::crc::Crc::<u32>::new(&::crc::CRC_32_ISCSI);

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid CRC type {0}")]
    InvalidType(u64),

    #[error("Block has unexpected CRC value length {0}")]
    InvalidLength(usize),

    #[error("Block has a CRC value with no CRC type specified")]
    UnexpectedCrcValue,

    #[error("Incorrect CRC value")]
    IncorrectCrc,

    #[error("Missing CRC value")]
    MissingCrc,

    #[error(transparent)]
    InvalidCBOR(#[from] cbor::decode::Error),
}

#[allow(non_camel_case_types)]
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CrcType {
    #[default]
    None,
    CRC16_X25,
    CRC32_CASTAGNOLI,
    Unrecognised(u64),
}

impl From<u64> for CrcType {
    fn from(value: u64) -> Self {
        match value {
            0 => Self::None,
            1 => Self::CRC16_X25,
            2 => Self::CRC32_CASTAGNOLI,
            v => Self::Unrecognised(v),
        }
    }
}

impl From<CrcType> for u64 {
    fn from(value: CrcType) -> Self {
        match value {
            CrcType::None => 0,
            CrcType::CRC16_X25 => 1,
            CrcType::CRC32_CASTAGNOLI => 2,
            CrcType::Unrecognised(v) => v,
        }
    }
}

impl cbor::encode::ToCbor for CrcType {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for CrcType {
    type Error = self::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        u64::from_cbor(data)
            .map(|(v, len)| (v.into(), len))
            .map_err(Into::into)
    }
}

impl CrcType {
    /// The serialized width of the CRC value in bytes, zero when no value is
    /// carried.
    pub fn width(&self) -> usize {
        match self {
            CrcType::CRC16_X25 => 2,
            CrcType::CRC32_CASTAGNOLI => 4,
            _ => 0,
        }
    }
}

/// A computed per-block CRC.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CrcValue {
    None,
    Crc16(u16),
    Crc32(u32),
}

impl CrcValue {
    pub fn crc_type(&self) -> CrcType {
        match self {
            CrcValue::None => CrcType::None,
            CrcValue::Crc16(_) => CrcType::CRC16_X25,
            CrcValue::Crc32(_) => CrcType::CRC32_CASTAGNOLI,
        }
    }

    /// The big-endian bytes carried in the block's CRC field.
    pub fn to_be_bytes(self) -> Vec<u8> {
        match self {
            CrcValue::None => Vec::new(),
            CrcValue::Crc16(v) => v.to_be_bytes().to_vec(),
            CrcValue::Crc32(v) => v.to_be_bytes().to_vec(),
        }
    }
}

/// Compute the CRC of a block's canonical CBOR form.
///
/// `data` must be the complete encoded block with the CRC field present as a
/// zero-filled byte string of the correct width.
pub fn compute(data: &[u8], crc_type: CrcType) -> Result<CrcValue, Error> {
    match crc_type {
        CrcType::None => Ok(CrcValue::None),
        CrcType::CRC16_X25 => Ok(CrcValue::Crc16(X25.checksum(data))),
        CrcType::CRC32_CASTAGNOLI => Ok(CrcValue::Crc32(CASTAGNOLI.checksum(data))),
        CrcType::Unrecognised(t) => Err(Error::InvalidType(t)),
    }
}

/// Complete an encoded block whose CRC field was accounted for but not
/// written, appending the byte-string header and computed CRC.
pub fn append_crc_value(crc_type: CrcType, mut data: Vec<u8>) -> Vec<u8> {
    let width = crc_type.width();
    if width == 0 {
        return data;
    }

    // Extend to the canonical form, a fixed-width byte string of zeroes,
    // then patch the computed value over the placeholder
    data.push(0x40 | width as u8);
    data.resize(data.len() + width, 0);

    let crc = compute(&data, crc_type).expect("CRC type with a width is computable");
    let at = data.len() - width;
    data[at..].copy_from_slice(&crc.to_be_bytes());
    data
}

/// Parse the trailing CRC field of a block and check it against the block's
/// bytes, with the embedded CRC value zeroed.
///
/// `data` must be the slice the block array was parsed from, and `block` must
/// be positioned at the CRC field.
pub fn parse_crc_value(
    data: &[u8],
    block: &mut cbor::decode::Array,
    crc_type: CrcType,
) -> Result<CrcValue, Error> {
    let width = crc_type.width();
    let stored = block.try_parse_value(|value, _, tags| match value {
        cbor::decode::Value::Bytes(crc) => match crc_type {
            CrcType::None => Err(Error::UnexpectedCrcValue),
            CrcType::Unrecognised(_) => Ok(CrcValue::None),
            _ if crc.len() != width => Err(Error::InvalidLength(crc.len())),
            CrcType::CRC16_X25 => {
                Ok(CrcValue::Crc16(u16::from_be_bytes(crc.try_into().unwrap())))
            }
            CrcType::CRC32_CASTAGNOLI => {
                Ok(CrcValue::Crc32(u32::from_be_bytes(crc.try_into().unwrap())))
            }
        },
        value => Err(cbor::decode::Error::IncorrectType(
            "Definite-length Byte String".to_string(),
            value.type_name(!tags.is_empty()),
        )
        .into()),
    })?;

    let crc_val_end = block.offset();
    let crc_end = block.end()?.unwrap_or(crc_val_end);

    match (crc_type, stored) {
        (CrcType::None, None) => Ok(CrcValue::None),
        (CrcType::Unrecognised(t), _) => Err(Error::InvalidType(t)),
        (_, Some(stored)) => {
            // Rebuild the canonical form, with the stored value zeroed
            let mut canonical = Vec::with_capacity(crc_end);
            canonical.extend_from_slice(&data[..crc_val_end - width]);
            canonical.resize(crc_val_end, 0);
            canonical.extend_from_slice(&data[crc_val_end..crc_end]);

            if compute(&canonical, crc_type)? != stored {
                Err(Error::IncorrectCrc)
            } else {
                Ok(stored)
            }
        }
        _ => Err(Error::MissingCrc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_vectors() {
        // Standard check inputs for CRC-16/IBM-SDLC and CRC-32/ISCSI
        assert_eq!(X25.checksum(b"123456789"), 0x906e);
        assert_eq!(CASTAGNOLI.checksum(b"123456789"), 0xe3069283);

        assert_eq!(
            compute(b"123456789", CrcType::CRC16_X25).unwrap(),
            CrcValue::Crc16(0x906e)
        );
        assert!(matches!(
            compute(b"123456789", CrcType::Unrecognised(3)),
            Err(Error::InvalidType(3))
        ));
    }

    fn emit_crc_array(crc_type: CrcType) -> Vec<u8> {
        append_crc_value(
            crc_type,
            cbor::encode::emit_array(Some(3), |a| {
                a.emit(&1);
                a.emit(&2);
                a.skip_value();
            }),
        )
    }

    fn check_crc_array(data: &[u8], crc_type: CrcType) -> Result<CrcValue, Error> {
        cbor::decode::parse_array(data, |a, _| {
            a.parse::<u64>()?;
            a.parse::<u64>()?;
            parse_crc_value(data, a, crc_type)
        })
        .map(|(v, _)| v)
    }

    #[test]
    fn roundtrip() {
        for crc_type in [CrcType::CRC16_X25, CrcType::CRC32_CASTAGNOLI] {
            let data = emit_crc_array(crc_type);
            check_crc_array(&data, crc_type).unwrap();

            // Any single corrupt byte must be caught
            for i in 0..data.len() {
                let mut corrupt = data.clone();
                corrupt[i] ^= 0x01;
                assert!(
                    check_crc_array(&corrupt, crc_type).is_err(),
                    "corruption at byte {i} not detected"
                );
            }
        }
    }

    #[test]
    fn missing_crc() {
        let data = cbor::encode::emit_array(Some(2), |a| {
            a.emit(&1);
            a.emit(&2);
        });
        assert!(matches!(
            check_crc_array(&data, CrcType::CRC16_X25),
            Err(Error::MissingCrc)
        ));
    }
}
