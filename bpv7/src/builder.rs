use super::*;

/// A builder for [`Bundle`]s.
///
/// Setters consume and return the builder; [`build`](Builder::build) is
/// one-shot and rejects missing required fields (source, destination and
/// payload).
pub struct Builder {
    flags: BundleFlags,
    crc_type: CrcType,
    source: Option<Eid>,
    destination: Option<Eid>,
    report_to: Eid,
    timestamp: CreationTimestamp,
    lifetime: u64,
    payload: Option<Template>,
    extensions: Vec<Template>,
}

struct Template {
    number: Option<u64>,
    flags: BlockFlags,
    crc_type: Option<CrcType>,
    data: block::Data,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            flags: BundleFlags::default(),
            crc_type: CrcType::CRC32_CASTAGNOLI,
            source: None,
            destination: None,
            report_to: Eid::Null,
            timestamp: CreationTimestamp::default(),
            lifetime: 24 * 60 * 60 * 1_000,
            payload: None,
            extensions: Vec::new(),
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_flags(mut self, flags: BundleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// The CRC type used for the primary block and any block that does not
    /// declare its own.
    pub fn with_crc_type(mut self, crc_type: CrcType) -> Self {
        self.crc_type = crc_type;
        self
    }

    pub fn with_source(mut self, source: Eid) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_destination(mut self, destination: Eid) -> Self {
        self.destination = Some(destination);
        self
    }

    pub fn with_report_to(mut self, report_to: Eid) -> Self {
        self.report_to = report_to;
        self
    }

    pub fn with_creation_timestamp(mut self, timestamp: CreationTimestamp) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The bundle lifetime in milliseconds.
    pub fn with_lifetime(mut self, lifetime: u64) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_payload(mut self, payload: Box<[u8]>) -> Self {
        self.payload = Some(Template {
            number: Some(1),
            flags: BlockFlags::default(),
            crc_type: None,
            data: block::Data::Payload(payload),
        });
        self
    }

    /// Begin an extension block; finish it with [`BlockBuilder::build`].
    pub fn add_extension_block(self, data: block::Data) -> BlockBuilder {
        BlockBuilder::new(self, data)
    }

    pub fn build(self) -> Result<Bundle, Error> {
        let Some(source) = self.source else {
            return Err(Error::Incomplete("source"));
        };
        let Some(destination) = self.destination else {
            return Err(Error::Incomplete("destination"));
        };
        let Some(payload) = self.payload else {
            return Err(Error::Incomplete("payload"));
        };

        let primary = primary_block::PrimaryBlock {
            flags: self.flags,
            crc_type: self.crc_type,
            source,
            destination,
            report_to: self.report_to,
            timestamp: self.timestamp,
            lifetime: self.lifetime,
            fragment_info: None,
        };

        // Extension blocks keep their declared order; explicit block numbers
        // are honoured, the rest are numbered from 2 upwards
        let used: Vec<u64> = self.extensions.iter().filter_map(|t| t.number).collect();
        let mut next_number = 2u64;
        let mut blocks = Vec::with_capacity(self.extensions.len() + 1);
        for template in self.extensions {
            let number = match template.number {
                Some(number) => number,
                None => {
                    while used.contains(&next_number) {
                        next_number += 1;
                    }
                    let number = next_number;
                    next_number += 1;
                    number
                }
            };
            blocks.push(block::Block {
                number,
                flags: template.flags,
                crc_type: template.crc_type.unwrap_or(self.crc_type),
                data: template.data,
            });
        }

        // The payload block comes last
        blocks.push(block::Block {
            number: 1,
            flags: payload.flags,
            crc_type: payload.crc_type.unwrap_or(self.crc_type),
            data: payload.data,
        });

        Ok(Bundle { primary, blocks })
    }
}

/// A sub-builder for a single extension block.
pub struct BlockBuilder {
    builder: Builder,
    template: Template,
}

impl BlockBuilder {
    fn new(builder: Builder, data: block::Data) -> Self {
        Self {
            builder,
            template: Template {
                number: None,
                flags: BlockFlags::default(),
                crc_type: None,
                data,
            },
        }
    }

    pub fn with_flags(mut self, flags: BlockFlags) -> Self {
        self.template.flags = flags;
        self
    }

    pub fn with_crc_type(mut self, crc_type: CrcType) -> Self {
        self.template.crc_type = Some(crc_type);
        self
    }

    /// Give the block an explicit block number instead of the next free one.
    ///
    /// No uniqueness check happens here; [`Bundle::validate`] rejects
    /// collisions.
    pub fn with_block_number(mut self, number: u64) -> Self {
        self.template.number = Some(number);
        self
    }

    /// Finish the block and return the bundle builder.
    pub fn build(mut self) -> Builder {
        if let block::Data::Payload(_) = &self.template.data {
            self.template.number = Some(1);
            self.builder.payload = Some(self.template);
        } else {
            self.builder.extensions.push(self.template);
        }
        self.builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_fields() {
        assert!(matches!(
            Builder::new().build(),
            Err(Error::Incomplete("source"))
        ));
        assert!(matches!(
            Builder::new()
                .with_source("ipn:1.0".parse().unwrap())
                .build(),
            Err(Error::Incomplete("destination"))
        ));
        assert!(matches!(
            Builder::new()
                .with_source("ipn:1.0".parse().unwrap())
                .with_destination("ipn:2.0".parse().unwrap())
                .build(),
            Err(Error::Incomplete("payload"))
        ));
    }

    #[test]
    fn defaults() {
        let bundle = Builder::new()
            .with_source("ipn:1.0".parse().unwrap())
            .with_destination("ipn:2.0".parse().unwrap())
            .with_payload(Box::from(*b"x"))
            .build()
            .unwrap();

        assert_eq!(bundle.primary.report_to, Eid::Null);
        assert_eq!(bundle.primary.crc_type, CrcType::CRC32_CASTAGNOLI);
        assert_eq!(bundle.blocks.len(), 1);
        assert_eq!(bundle.payload_block().unwrap().number, 1);
        bundle.validate().unwrap();
    }

    #[test]
    fn block_numbering() {
        let bundle = Builder::new()
            .with_source("ipn:1.0".parse().unwrap())
            .with_destination("ipn:2.0".parse().unwrap())
            .with_payload(Box::from(*b"x"))
            .add_extension_block(block::Data::BundleAge(0))
            .build()
            .add_extension_block(block::Data::HopCount(HopInfo { limit: 8, count: 0 }))
            .with_block_number(3)
            .build()
            .add_extension_block(block::Data::PreviousNode("ipn:9.0".parse().unwrap()))
            .build()
            .build()
            .unwrap();

        let numbers: Vec<u64> = bundle.blocks.iter().map(|b| b.number).collect();
        assert_eq!(numbers, &[2, 3, 4, 1]);
        bundle.validate().unwrap();
    }
}
