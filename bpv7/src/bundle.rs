use super::*;
use error::CaptureFieldErr;
use std::collections::HashSet;

/// A BPv7 bundle: one primary block plus ordered canonical blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub primary: primary_block::PrimaryBlock,
    pub blocks: Vec<block::Block>,
}

impl Bundle {
    /// Encode the bundle as its CBOR wire form, an indefinite-length array
    /// of blocks, computing CRC values as declared by each block.
    pub fn emit(&self) -> Vec<u8> {
        cbor::encode::emit_array(None, |a| {
            a.emit_raw(&self.primary.emit());
            for block in &self.blocks {
                a.emit_raw(&block.emit());
            }
        })
    }

    /// Decode a bundle from its CBOR wire form.
    ///
    /// Decoding is all-or-nothing: every block is reconstructed, every CRC
    /// checked, and the whole bundle validated, or an error is returned.
    /// Both definite- and indefinite-length outer arrays are accepted.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let (bundle, len) = cbor::decode::parse_array(data, |a, _| {
            let primary = a
                .parse::<primary_block::PrimaryBlock>()
                .map_field_err("primary block")?;

            let mut blocks = Vec::new();
            while let Some(block) = a.try_parse::<block::Block>()? {
                blocks.push(block);
            }

            Ok::<_, Error>(Bundle { primary, blocks })
        })?;
        if len != data.len() {
            return Err(Error::AdditionalData);
        }

        bundle.validate()?;
        Ok(bundle)
    }

    /// Check the structural and cross-block invariants of the bundle.
    pub fn validate(&self) -> Result<(), Error> {
        self.primary.validate()?;

        let mut seen = HashSet::new();
        for block in &self.blocks {
            if let CrcType::Unrecognised(t) = block.crc_type {
                return Err(crc::Error::InvalidType(t).into());
            }
            if !seen.insert(block.number) {
                return Err(Error::DuplicateBlockNumber(block.number));
            }
        }

        // Exactly one payload block, numbered 1, as the final block
        let mut payload = None;
        for (idx, block) in self.blocks.iter().enumerate() {
            if matches!(block.data, block::Data::Payload(_)) {
                if payload.is_some() {
                    return Err(Error::DuplicateBlocks(BlockType::Payload));
                }
                payload = Some((idx, block));
            }
        }
        let Some((idx, payload_block)) = payload else {
            return Err(Error::MissingPayload);
        };
        if payload_block.number != 1 {
            return Err(Error::InvalidBlockNumber(
                payload_block.number,
                BlockType::Payload,
            ));
        }
        if idx + 1 != self.blocks.len() {
            return Err(Error::PayloadNotFinal);
        }

        for block_type in [
            BlockType::PreviousNode,
            BlockType::BundleAge,
            BlockType::HopCount,
        ] {
            if self.blocks_by_type(block_type).count() > 1 {
                return Err(Error::DuplicateBlocks(block_type));
            }
        }

        // Every integrity target must be a block in the bundle, and never
        // another BIB
        for block in self.blocks_by_type(BlockType::BlockIntegrity) {
            let block::Data::BlockIntegrity(bib) = &block.data else {
                unreachable!()
            };
            for target in &bib.targets {
                let Some(target_block) = self.block_by_number(*target) else {
                    return Err(bpsec::Error::MissingSecurityTarget.into());
                };
                if matches!(target_block.data, block::Data::BlockIntegrity(_)) {
                    return Err(bpsec::Error::InvalidBIBTarget.into());
                }
            }
        }

        Ok(())
    }

    /// Assign a CRC type to the primary block and every canonical block.
    ///
    /// CRC values are computed from the declared type on every [`emit`](Self::emit).
    pub fn set_crc_type(&mut self, crc_type: CrcType) {
        self.primary.crc_type = crc_type;
        for block in &mut self.blocks {
            block.crc_type = crc_type;
        }
    }

    pub fn payload_block(&self) -> Option<&block::Block> {
        self.blocks
            .iter()
            .find(|b| matches!(b.data, block::Data::Payload(_)))
    }

    /// The application data carried by the payload block.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.payload_block()?.data {
            block::Data::Payload(data) => Some(data),
            _ => unreachable!(),
        }
    }

    pub fn block_by_number(&self, number: u64) -> Option<&block::Block> {
        self.blocks.iter().find(|b| b.number == number)
    }

    pub fn blocks_by_type(&self, block_type: BlockType) -> impl Iterator<Item = &block::Block> {
        self.blocks
            .iter()
            .filter(move |b| b.data.block_type() == block_type)
    }

    /// Seal every unsigned integrity block, computing one MAC per declared
    /// target under `key`.
    pub fn seal(&mut self, key: &[u8]) -> Result<(), Error> {
        for i in 0..self.blocks.len() {
            let block::Data::BlockIntegrity(bib) = &self.blocks[i].data else {
                continue;
            };
            if bib.is_sealed() {
                continue;
            }

            let security_number = self.blocks[i].number;
            let security_flags = self.blocks[i].flags;
            let targets = bib.targets.clone();

            let mut results = Vec::with_capacity(targets.len());
            for target in &targets {
                let block::Data::BlockIntegrity(bib) = &self.blocks[i].data else {
                    unreachable!()
                };
                let target_block = self
                    .block_by_number(*target)
                    .ok_or(bpsec::Error::MissingSecurityTarget)?;
                if matches!(target_block.data, block::Data::BlockIntegrity(_)) {
                    return Err(bpsec::Error::InvalidBIBTarget.into());
                }

                results.push(bib.sign_target(
                    key,
                    &bpsec::bib::OperationArgs {
                        primary: &self.primary,
                        target: target_block,
                        security_number,
                        security_flags,
                    },
                )?);
            }

            let block::Data::BlockIntegrity(bib) = &mut self.blocks[i].data else {
                unreachable!()
            };
            bib.results = results;
        }
        Ok(())
    }

    /// Verify every sealed integrity block against `key`.
    ///
    /// Unsigned integrity blocks carry nothing to check and are skipped.
    pub fn verify(&self, key: &[u8]) -> Result<(), Error> {
        for block in &self.blocks {
            let block::Data::BlockIntegrity(bib) = &block.data else {
                continue;
            };
            if !bib.is_sealed() {
                continue;
            }
            if bib.results.len() != bib.targets.len() {
                return Err(bpsec::Error::MismatchedTargetResult.into());
            }

            for (target, mac) in bib.targets.iter().zip(&bib.results) {
                let target_block = self
                    .block_by_number(*target)
                    .ok_or(bpsec::Error::MissingSecurityTarget)?;

                bib.verify_target(
                    key,
                    &bpsec::bib::OperationArgs {
                        primary: &self.primary,
                        target: target_block,
                        security_number: block.number,
                        security_flags: block.flags,
                    },
                    mac,
                )?;
            }
        }
        Ok(())
    }
}
