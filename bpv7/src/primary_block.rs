use super::*;
use error::CaptureFieldErr;

/// The fragment fields of a fragmented bundle's primary block.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct FragmentInfo {
    pub offset: u64,
    pub total_len: u64,
}

/// The primary block of a bundle, RFC 9171 section 4.3.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryBlock {
    pub flags: BundleFlags,
    pub crc_type: CrcType,
    pub source: Eid,
    pub destination: Eid,
    pub report_to: Eid,
    pub timestamp: CreationTimestamp,
    /// Bundle lifetime in milliseconds.
    pub lifetime: u64,
    pub fragment_info: Option<FragmentInfo>,
}

impl PrimaryBlock {
    fn field_count(&self) -> usize {
        let mut count = if matches!(self.crc_type, CrcType::None) {
            8
        } else {
            9
        };
        if self.fragment_info.is_some() {
            count += 2;
        }
        count
    }

    fn emit_fields(&self) -> Vec<u8> {
        cbor::encode::emit_array(Some(self.field_count()), |a| {
            // Version
            a.emit(&7);
            a.emit(&self.flags);
            a.emit(&self.crc_type);
            a.emit(&self.destination);
            a.emit(&self.source);
            a.emit(&self.report_to);
            a.emit(&self.timestamp);
            a.emit(&self.lifetime);

            if let Some(fragment_info) = &self.fragment_info {
                a.emit(&fragment_info.offset);
                a.emit(&fragment_info.total_len);
            }

            if !matches!(self.crc_type, CrcType::None) {
                a.skip_value();
            }
        })
    }

    pub fn emit(&self) -> Vec<u8> {
        crc::append_crc_value(self.crc_type, self.emit_fields())
    }

    /// The serialization used when binding integrity protection: the block's
    /// CBOR with the CRC value zero-filled.
    pub(crate) fn emit_canonical(&self) -> Vec<u8> {
        let mut data = self.emit_fields();
        let width = self.crc_type.width();
        if width > 0 {
            data.push(0x40 | width as u8);
            data.resize(data.len() + width, 0);
        }
        data
    }

    pub fn validate(&self) -> Result<(), Error> {
        if let CrcType::Unrecognised(t) = self.crc_type {
            return Err(crc::Error::InvalidType(t).into());
        }

        if self.lifetime == 0 {
            return Err(Error::InvalidLifetime);
        }

        if self.flags.is_fragment != self.fragment_info.is_some() {
            return Err(Error::FragmentInfoMismatch);
        }

        // https://www.rfc-editor.org/rfc/rfc9171.html#section-4.2.3-5
        if matches!(&self.source, Eid::Null)
            && (self.flags.is_fragment
                || !self.flags.do_not_fragment
                || self.flags.receipt_report_requested
                || self.flags.forward_report_requested
                || self.flags.delivery_report_requested
                || self.flags.delete_report_requested)
        {
            return Err(Error::InvalidFlags);
        }

        // https://www.rfc-editor.org/rfc/rfc9171.html#section-4.2.3-4
        if self.flags.is_admin_record
            && (self.flags.receipt_report_requested
                || self.flags.forward_report_requested
                || self.flags.delivery_report_requested
                || self.flags.delete_report_requested)
        {
            return Err(Error::InvalidFlags);
        }

        Ok(())
    }
}

impl cbor::decode::FromCbor for PrimaryBlock {
    type Error = error::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |block, _| {
            let version = block.parse::<u64>().map_field_err("version")?;
            if version != 7 {
                return Err(Error::InvalidVersion(version));
            }

            let flags: BundleFlags = block
                .parse()
                .map_field_err("bundle processing control flags")?;

            let crc_type: CrcType = block.parse().map_field_err("CRC type")?;

            let destination = block.parse().map_field_err("destination EID")?;
            let source = block.parse().map_field_err("source EID")?;
            let report_to = block.parse().map_field_err("report-to EID")?;

            let timestamp = block.parse().map_field_err("creation timestamp")?;

            let lifetime = block.parse().map_field_err("lifetime")?;

            let fragment_info = if flags.is_fragment {
                Some(FragmentInfo {
                    offset: block.parse().map_field_err("fragment offset")?,
                    total_len: block
                        .parse()
                        .map_field_err("total application data unit length")?,
                })
            } else {
                None
            };

            crc::parse_crc_value(data, block, crc_type)?;

            Ok(PrimaryBlock {
                flags,
                crc_type,
                source,
                destination,
                report_to,
                timestamp,
                lifetime,
                fragment_info,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_block(crc_type: CrcType) -> PrimaryBlock {
        PrimaryBlock {
            flags: BundleFlags::default(),
            crc_type,
            source: "dtn://node1/out".parse().unwrap(),
            destination: "dtn://node2/inbox".parse().unwrap(),
            report_to: Eid::Null,
            timestamp: CreationTimestamp::default(),
            lifetime: 3_600_000,
            fragment_info: None,
        }
    }

    fn parse(data: &[u8]) -> Result<PrimaryBlock, Error> {
        let (block, len) = <PrimaryBlock as cbor::decode::FromCbor>::from_cbor(data)?;
        assert_eq!(len, data.len());
        Ok(block)
    }

    #[test]
    fn roundtrip() {
        for crc_type in [
            CrcType::None,
            CrcType::CRC16_X25,
            CrcType::CRC32_CASTAGNOLI,
        ] {
            let block = new_block(crc_type);
            assert_eq!(parse(&block.emit()).unwrap(), block);
        }
    }

    #[test]
    fn roundtrip_fragment() {
        let mut block = new_block(CrcType::CRC32_CASTAGNOLI);
        block.flags.is_fragment = true;
        block.flags.do_not_fragment = false;
        block.fragment_info = Some(FragmentInfo {
            offset: 0,
            total_len: 1024,
        });
        let parsed = parse(&block.emit()).unwrap();
        assert_eq!(parsed, block);
        parsed.validate().unwrap();
    }

    #[test]
    fn version_check() {
        let mut data = new_block(CrcType::None).emit();
        // Version is the second byte of the block array
        assert_eq!(data[1], 0x07);
        data[1] = 0x08;
        assert!(matches!(parse(&data), Err(Error::InvalidVersion(8))));
    }

    #[test]
    fn corrupt_crc() {
        for crc_type in [CrcType::CRC16_X25, CrcType::CRC32_CASTAGNOLI] {
            let mut data = new_block(crc_type).emit();
            let last = data.len() - 1;
            data[last] ^= 0xFF;
            assert!(matches!(
                parse(&data),
                Err(Error::InvalidCrc(crc::Error::IncorrectCrc))
            ));
        }
    }

    #[test]
    fn validation() {
        let mut block = new_block(CrcType::None);
        block.lifetime = 0;
        assert!(matches!(block.validate(), Err(Error::InvalidLifetime)));

        let mut block = new_block(CrcType::None);
        block.flags.is_fragment = true;
        assert!(matches!(
            block.validate(),
            Err(Error::FragmentInfoMismatch)
        ));

        // An anonymous source must set do-not-fragment
        let mut block = new_block(CrcType::None);
        block.source = Eid::Null;
        assert!(matches!(block.validate(), Err(Error::InvalidFlags)));
        block.flags.do_not_fragment = true;
        block.validate().unwrap();

        // Admin records must not request status reports
        let mut block = new_block(CrcType::None);
        block.flags.is_admin_record = true;
        block.flags.delivery_report_requested = true;
        assert!(matches!(block.validate(), Err(Error::InvalidFlags)));
    }

    #[test]
    fn canonical_form() {
        // The canonical form is the emitted form with the CRC zeroed
        let block = new_block(CrcType::CRC16_X25);
        let emitted = block.emit();
        let canonical = block.emit_canonical();
        assert_eq!(emitted.len(), canonical.len());
        assert_eq!(emitted[..emitted.len() - 2], canonical[..emitted.len() - 2]);
        assert_eq!(canonical[emitted.len() - 2..], [0, 0]);

        let block = new_block(CrcType::None);
        assert_eq!(block.emit(), block.emit_canonical());
    }
}
