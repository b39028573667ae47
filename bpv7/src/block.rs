use super::*;
use error::CaptureFieldErr;

/// The type-specific content of a canonical block.
///
/// Recognised block types decode their inner value; all other types are
/// preserved as opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Payload(Box<[u8]>),
    PreviousNode(Eid),
    /// Bundle age in milliseconds.
    BundleAge(u64),
    HopCount(HopInfo),
    BlockIntegrity(bpsec::bib::IntegrityBlock),
    Unrecognised { block_type: u64, data: Box<[u8]> },
}

impl Data {
    pub fn block_type(&self) -> BlockType {
        match self {
            Data::Payload(_) => BlockType::Payload,
            Data::PreviousNode(_) => BlockType::PreviousNode,
            Data::BundleAge(_) => BlockType::BundleAge,
            Data::HopCount(_) => BlockType::HopCount,
            Data::BlockIntegrity(_) => BlockType::BlockIntegrity,
            Data::Unrecognised { block_type, .. } => BlockType::Unrecognised(*block_type),
        }
    }

    /// The bytes carried in the block's data field.
    pub fn emit_content(&self) -> Vec<u8> {
        match self {
            Data::Payload(data) => data.to_vec(),
            Data::PreviousNode(eid) => cbor::encode::emit(eid),
            Data::BundleAge(age) => cbor::encode::emit(age),
            Data::HopCount(hop_info) => cbor::encode::emit(hop_info),
            Data::BlockIntegrity(bib) => cbor::encode::emit(bib),
            Data::Unrecognised { data, .. } => data.to_vec(),
        }
    }
}

/// A canonical block, RFC 9171 section 4.3.2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub flags: BlockFlags,
    pub crc_type: CrcType,
    pub data: Data,
}

impl Block {
    pub fn emit(&self) -> Vec<u8> {
        crc::append_crc_value(
            self.crc_type,
            cbor::encode::emit_array(
                Some(if matches!(self.crc_type, CrcType::None) {
                    5
                } else {
                    6
                }),
                |a| {
                    a.emit(&self.data.block_type());
                    a.emit(&self.number);
                    a.emit(&self.flags);
                    a.emit(&self.crc_type);
                    a.emit(&cbor::encode::Bytes(&self.data.emit_content()));
                    if !matches!(self.crc_type, CrcType::None) {
                        a.skip_value();
                    }
                },
            ),
        )
    }
}

fn parse_content<T>(content: &[u8], block_type: BlockType) -> Result<T, Error>
where
    T: cbor::decode::FromCbor,
    Error: From<T::Error>,
{
    let (v, len) = T::from_cbor(content)?;
    if len != content.len() {
        Err(Error::AdditionalBlockData(block_type))
    } else {
        Ok(v)
    }
}

impl cbor::decode::FromCbor for Block {
    type Error = error::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |block, _| {
            let block_type: BlockType = block.parse().map_field_err("block type code")?;

            let number = block.parse::<u64>().map_field_err("block number")?;
            match (number, block_type) {
                (1, BlockType::Payload) => {}
                (0, _) | (1, _) | (_, BlockType::Primary) | (_, BlockType::Payload) => {
                    return Err(Error::InvalidBlockNumber(number, block_type));
                }
                _ => {}
            }

            let flags = block
                .parse()
                .map_field_err("block processing control flags")?;

            let crc_type: CrcType = block.parse().map_field_err("CRC type")?;

            let content: Box<[u8]> = block
                .parse_value(|value, _, tags| match value {
                    cbor::decode::Value::Bytes(data) => Ok(data.into()),
                    value => Err(Error::from(cbor::decode::Error::IncorrectType(
                        "Definite-length Byte String".to_string(),
                        value.type_name(!tags.is_empty()),
                    ))),
                })
                .map_field_err("block data")?;

            crc::parse_crc_value(data, block, crc_type)?;

            let data = match block_type {
                BlockType::Payload => Data::Payload(content),
                BlockType::PreviousNode => Data::PreviousNode(
                    parse_content(&content, block_type).map_field_err("previous node EID")?,
                ),
                BlockType::BundleAge => Data::BundleAge(
                    parse_content(&content, block_type).map_field_err("bundle age")?,
                ),
                BlockType::HopCount => Data::HopCount(
                    parse_content(&content, block_type).map_field_err("hop count")?,
                ),
                BlockType::BlockIntegrity => Data::BlockIntegrity(
                    parse_content(&content, block_type).map_field_err("integrity block")?,
                ),
                BlockType::Unrecognised(block_type) => Data::Unrecognised {
                    block_type,
                    data: content,
                },
                BlockType::Primary => unreachable!(),
            };

            Ok(Block {
                number,
                flags,
                crc_type,
                data,
            })
        })
    }
}
