use super::*;
use error::CaptureFieldErr;
use hmac::{Hmac, Mac, digest::KeyInit};
use sha2::{Sha256, Sha384, Sha512};

/// The SHA variant of BIB-HMAC-SHA2, RFC 9173 section 3.3.1.
#[allow(clippy::upper_case_acronyms)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShaVariant {
    HMAC_256_256,
    #[default]
    HMAC_384_384,
    HMAC_512_512,
    Unrecognised(u64),
}

impl From<u64> for ShaVariant {
    fn from(value: u64) -> Self {
        match value {
            5 => Self::HMAC_256_256,
            6 => Self::HMAC_384_384,
            7 => Self::HMAC_512_512,
            v => Self::Unrecognised(v),
        }
    }
}

impl From<ShaVariant> for u64 {
    fn from(value: ShaVariant) -> Self {
        match value {
            ShaVariant::HMAC_256_256 => 5,
            ShaVariant::HMAC_384_384 => 6,
            ShaVariant::HMAC_512_512 => 7,
            ShaVariant::Unrecognised(v) => v,
        }
    }
}

impl cbor::encode::ToCbor for ShaVariant {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit(&u64::from(*self))
    }
}

impl cbor::decode::FromCbor for ShaVariant {
    type Error = cbor::decode::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        u64::from_cbor(data).map(|(v, len)| (v.into(), len))
    }
}

/// The security context parameters of BIB-HMAC-SHA2.
///
/// Only parameters that differ from the RFC 9173 defaults are emitted, with
/// `securityContextFlags` bit 0 signalling their presence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Parameters {
    pub variant: ShaVariant,
    pub wrapped_key: Option<Box<[u8]>>,
    pub flags: ScopeFlags,
}

impl cbor::encode::ToCbor for Parameters {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        let mut mask: u32 = 0;
        if self.variant != ShaVariant::default() {
            mask |= 1 << 1;
        }
        if self.wrapped_key.is_some() {
            mask |= 1 << 2;
        }
        if self.flags != ScopeFlags::default() {
            mask |= 1 << 3;
        }
        encoder.emit_array(Some(mask.count_ones() as usize), |a| {
            if mask & (1 << 1) != 0 {
                a.emit(&(1u64, &self.variant));
            }
            if mask & (1 << 2) != 0 {
                a.emit(&(
                    2u64,
                    cbor::encode::Bytes(self.wrapped_key.as_ref().unwrap()),
                ));
            }
            if mask & (1 << 3) != 0 {
                a.emit(&(3u64, &self.flags));
            }
        })
    }
}

fn parse_bytes(pair: &mut cbor::decode::Array) -> Result<Box<[u8]>, Error> {
    pair.parse_value(|value, _, tags| match value {
        cbor::decode::Value::Bytes(data) => Ok(data.into()),
        value => Err(Error::from(cbor::decode::Error::IncorrectType(
            "Definite-length Byte String".to_string(),
            value.type_name(!tags.is_empty()),
        ))),
    })
}

fn parse_parameters(a: &mut cbor::decode::Array) -> Result<Parameters, Error> {
    let mut parameters = Parameters::default();
    loop {
        let done = a
            .try_parse_value(|value, _, tags| match value {
                cbor::decode::Value::Array(pair) => {
                    match pair.parse::<u64>().map_field_err("parameter id")? {
                        1 => {
                            parameters.variant =
                                pair.parse().map_field_err("SHA variant parameter")?;
                        }
                        2 => {
                            parameters.wrapped_key = Some(parse_bytes(pair)?);
                        }
                        3 => {
                            parameters.flags =
                                pair.parse().map_field_err("integrity scope flags")?;
                        }
                        id => return Err(Error::InvalidContextParameter(id)),
                    }
                    Ok(())
                }
                value => Err(Error::from(cbor::decode::Error::IncorrectType(
                    "Array".to_string(),
                    value.type_name(!tags.is_empty()),
                ))),
            })?
            .is_none();
        if done {
            return Ok(parameters);
        }
    }
}

fn parse_results(a: &mut cbor::decode::Array) -> Result<Vec<Box<[u8]>>, Error> {
    let mut results = Vec::new();
    loop {
        let mut mac = None;
        let done = a
            .try_parse_value(|value, _, tags| match value {
                cbor::decode::Value::Array(target_results) => {
                    loop {
                        let done = target_results
                            .try_parse_value(|value, _, tags| match value {
                                cbor::decode::Value::Array(pair) => {
                                    match pair.parse::<u64>().map_field_err("result id")? {
                                        1 => mac = Some(parse_bytes(pair)?),
                                        id => return Err(Error::InvalidContextResult(id)),
                                    }
                                    Ok(())
                                }
                                value => Err(Error::from(cbor::decode::Error::IncorrectType(
                                    "Array".to_string(),
                                    value.type_name(!tags.is_empty()),
                                ))),
                            })?
                            .is_none();
                        if done {
                            return Ok(());
                        }
                    }
                }
                value => Err(Error::from(cbor::decode::Error::IncorrectType(
                    "Array".to_string(),
                    value.type_name(!tags.is_empty()),
                ))),
            })?
            .is_none();
        if done {
            return Ok(results);
        }
        results.push(mac.ok_or(Error::InvalidContextResult(1))?);
    }
}

/// A Block Integrity Block body under the BIB-HMAC-SHA2 security context.
///
/// A block with empty `results` is unsigned; sealing fills one MAC per
/// target, in target order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityBlock {
    pub targets: Vec<u64>,
    pub source: Eid,
    pub parameters: Parameters,
    pub results: Vec<Box<[u8]>>,
}

impl IntegrityBlock {
    pub fn is_sealed(&self) -> bool {
        !self.results.is_empty()
    }

    pub(crate) fn sign_target(&self, key: &[u8], args: &OperationArgs) -> Result<Box<[u8]>, Error> {
        calculate_hmac(
            self.parameters.variant,
            key,
            &build_ippt(&self.parameters.flags, args),
        )
    }

    pub(crate) fn verify_target(
        &self,
        key: &[u8],
        args: &OperationArgs,
        mac: &[u8],
    ) -> Result<(), Error> {
        verify_hmac(
            self.parameters.variant,
            key,
            &build_ippt(&self.parameters.flags, args),
            mac,
        )
    }
}

impl cbor::encode::ToCbor for IntegrityBlock {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        let parameters_present = self.parameters != Parameters::default();
        encoder.emit_array(Some(if parameters_present { 6 } else { 5 }), |a| {
            // Security targets
            a.emit(&self.targets);

            // Security context id and flags
            a.emit(&Context::BIB_HMAC_SHA2);
            a.emit(&u64::from(parameters_present));

            // Security source
            a.emit(&self.source);

            // Security context parameters
            if parameters_present {
                a.emit(&self.parameters);
            }

            // Security results, one per target
            a.emit_array(Some(self.results.len()), |a| {
                for mac in &self.results {
                    a.emit_array(Some(1), |a| {
                        a.emit(&(1u64, cbor::encode::Bytes(mac)));
                    });
                }
            });
        })
    }
}

impl cbor::decode::FromCbor for IntegrityBlock {
    type Error = error::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |asb, _| {
            // Security targets
            let targets = asb
                .parse_array(|a, _| {
                    let mut targets: Vec<u64> = Vec::new();
                    while let Some(target) = a.try_parse::<u64>()? {
                        if targets.contains(&target) {
                            return Err(Error::DuplicateOpTarget);
                        }
                        targets.push(target);
                    }
                    Ok(targets)
                })
                .map_field_err("security targets")?;
            if targets.is_empty() {
                return Err(Error::NoTargets);
            }

            // Security context id
            match asb.parse::<Context>().map_field_err("security context id")? {
                Context::BIB_HMAC_SHA2 => {}
                Context::Unrecognised(id) => return Err(Error::InvalidContext(id)),
            }

            // Security context flags
            let context_flags: u64 = asb.parse().map_field_err("security context flags")?;

            // Security source
            let source: Eid = asb.parse().map_field_err("security source")?;
            if matches!(source, Eid::Null) {
                return Err(Error::InvalidSecuritySource);
            }

            // Security context parameters, present iff flag bit 0 is set
            let parameters = if context_flags & 1 == 0 {
                Parameters::default()
            } else {
                asb.parse_array(|a, _| parse_parameters(a))
                    .map_field_err("security context parameters")?
            };

            // Security results
            let results = asb
                .parse_array(|a, _| parse_results(a))
                .map_field_err("security results")?;
            if !results.is_empty() && results.len() != targets.len() {
                return Err(Error::MismatchedTargetResult);
            }

            Ok(IntegrityBlock {
                targets,
                source,
                parameters,
                results,
            })
        })
    }
}

/// The bundle context a security operation binds to.
pub(crate) struct OperationArgs<'a> {
    pub primary: &'a primary_block::PrimaryBlock,
    pub target: &'a block::Block,
    pub security_number: u64,
    pub security_flags: BlockFlags,
}

/// Build the Integrity-Protected Plaintext for one target.
pub(crate) fn build_ippt(flags: &ScopeFlags, args: &OperationArgs) -> Vec<u8> {
    let mut ippt = cbor::encode::emit(&u64::from(*flags));

    if flags.include_primary_block {
        ippt.extend(args.primary.emit_canonical());
    }

    if flags.include_target_header {
        ippt.extend(cbor::encode::emit_array(Some(4), |a| {
            a.emit(&args.target.data.block_type());
            a.emit(&args.target.number);
            a.emit(&args.target.flags);
            a.emit(&args.target.crc_type);
        }));
    }

    if flags.include_security_header {
        ippt.extend(cbor::encode::emit_array(Some(3), |a| {
            a.emit(&BlockType::BlockIntegrity);
            a.emit(&args.security_number);
            a.emit(&args.security_flags);
        }));
    }

    // The target block's content, as the encoded data field
    ippt.extend(cbor::encode::emit(&cbor::encode::Bytes(
        &args.target.data.emit_content(),
    )));
    ippt
}

fn mac_over<M>(key: &[u8], message: &[u8]) -> Result<Box<[u8]>, Error>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|e| Error::Algorithm(e.to_string()))?;
    mac.update(message);
    Ok(Box::from(mac.finalize().into_bytes().as_slice()))
}

fn verify_over<M>(key: &[u8], message: &[u8], tag: &[u8]) -> Result<(), Error>
where
    M: Mac + KeyInit,
{
    let mut mac = <M as Mac>::new_from_slice(key).map_err(|e| Error::Algorithm(e.to_string()))?;
    mac.update(message);
    mac.verify_slice(tag).map_err(|_| Error::IntegrityCheckFailed)
}

pub(crate) fn calculate_hmac(
    variant: ShaVariant,
    key: &[u8],
    ippt: &[u8],
) -> Result<Box<[u8]>, Error> {
    match variant {
        ShaVariant::HMAC_256_256 => mac_over::<Hmac<Sha256>>(key, ippt),
        ShaVariant::HMAC_384_384 => mac_over::<Hmac<Sha384>>(key, ippt),
        ShaVariant::HMAC_512_512 => mac_over::<Hmac<Sha512>>(key, ippt),
        ShaVariant::Unrecognised(v) => Err(Error::UnsupportedShaVariant(v)),
    }
}

pub(crate) fn verify_hmac(
    variant: ShaVariant,
    key: &[u8],
    ippt: &[u8],
    tag: &[u8],
) -> Result<(), Error> {
    match variant {
        ShaVariant::HMAC_256_256 => verify_over::<Hmac<Sha256>>(key, ippt, tag),
        ShaVariant::HMAC_384_384 => verify_over::<Hmac<Sha384>>(key, ippt, tag),
        ShaVariant::HMAC_512_512 => verify_over::<Hmac<Sha512>>(key, ippt, tag),
        ShaVariant::Unrecognised(v) => Err(Error::UnsupportedShaVariant(v)),
    }
}

/// A staged builder for unsigned [`IntegrityBlock`]s.
#[derive(Default)]
pub struct Builder {
    targets: Vec<u64>,
    source: Option<Eid>,
    parameters: Parameters,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a security target by block number.
    pub fn with_target(mut self, block_number: u64) -> Self {
        self.targets.push(block_number);
        self
    }

    pub fn with_source(mut self, source: Eid) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_sha_variant(mut self, variant: ShaVariant) -> Self {
        self.parameters.variant = variant;
        self
    }

    pub fn with_scope_flags(mut self, flags: ScopeFlags) -> Self {
        self.parameters.flags = flags;
        self
    }

    pub fn with_wrapped_key(mut self, wrapped_key: Box<[u8]>) -> Self {
        self.parameters.wrapped_key = Some(wrapped_key);
        self
    }

    pub fn build(self) -> Result<IntegrityBlock, crate::Error> {
        if self.targets.is_empty() {
            return Err(crate::Error::Incomplete("security targets"));
        }
        for (i, target) in self.targets.iter().enumerate() {
            if self.targets[..i].contains(target) {
                return Err(Error::DuplicateOpTarget.into());
            }
        }
        let Some(source) = self.source else {
            return Err(crate::Error::Incomplete("security source"));
        };
        if matches!(source, Eid::Null) {
            return Err(Error::InvalidSecuritySource.into());
        }
        if let ShaVariant::Unrecognised(v) = self.parameters.variant {
            return Err(Error::UnsupportedShaVariant(v).into());
        }

        Ok(IntegrityBlock {
            targets: self.targets,
            source,
            parameters: self.parameters,
            results: Vec::new(),
        })
    }
}
