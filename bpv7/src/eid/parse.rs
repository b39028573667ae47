use super::*;
use error::CaptureFieldErr;
use winnow::{
    ModalResult, Parser,
    ascii::dec_uint,
    combinator::{alt, preceded, terminated},
    token::take_while,
};

fn parse_ipn(input: &mut &str) -> ModalResult<Eid> {
    (dec_uint, preceded(".", dec_uint))
        .map(|(node_number, service_number)| match (node_number, service_number) {
            (0, 0) => Eid::Null,
            (node_number, service_number) => Eid::Ipn {
                node_number,
                service_number,
            },
        })
        .parse_next(input)
}

fn parse_node_name(input: &mut &str) -> ModalResult<Box<str>> {
    take_while(1.., |c: char| ('\x21'..='\x7e').contains(&c) && c != '/')
        .map(Into::into)
        .parse_next(input)
}

fn parse_dtn_parts(input: &mut &str) -> ModalResult<Eid> {
    (
        terminated(parse_node_name, "/"),
        take_while(0.., '\x21'..='\x7e'),
    )
        .map(|(node_name, demux): (Box<str>, &str)| Eid::Dtn {
            node_name,
            demux: demux.into(),
        })
        .parse_next(input)
}

pub(super) fn parse_dtn(input: &mut &str) -> ModalResult<Eid> {
    alt(("none".map(|_| Eid::Null), preceded("//", parse_dtn_parts))).parse_next(input)
}

fn parse_eid(input: &mut &str) -> ModalResult<Eid> {
    alt((preceded("dtn:", parse_dtn), preceded("ipn:", parse_ipn))).parse_next(input)
}

impl std::str::FromStr for Eid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_eid
            .parse(s)
            .map_err(|e| Error::ParseError(e.to_string()))
    }
}

impl TryFrom<&str> for Eid {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Eid> for String {
    fn from(value: Eid) -> Self {
        value.to_string()
    }
}

impl cbor::decode::FromCbor for Eid {
    type Error = error::Error;

    fn from_cbor(data: &[u8]) -> Result<(Self, usize), Self::Error> {
        cbor::decode::parse_array(data, |a, _| {
            match a.parse::<u64>().map_field_err("EID scheme")? {
                1 => a
                    .parse_value(|value, _, tags| match value {
                        cbor::decode::Value::UnsignedInteger(0)
                        | cbor::decode::Value::Text("none") => Ok(Eid::Null),
                        cbor::decode::Value::Text(s) => parse_dtn
                            .parse(s)
                            .map_err(|e| Error::ParseError(e.to_string())),
                        value => Err(cbor::decode::Error::IncorrectType(
                            "Untagged Text String".to_string(),
                            value.type_name(!tags.is_empty()),
                        )
                        .into()),
                    })
                    .map_field_err("'dtn' scheme-specific part"),
                2 => a.parse_array(|a, _| {
                    let node_number = a.parse::<u64>().map_field_err("node number")?;
                    let service_number = a.parse::<u64>().map_field_err("service number")?;
                    if a.end()?.is_none() {
                        return Err(Error::IpnInvalidComponents);
                    }
                    Ok(match (node_number, service_number) {
                        (0, 0) => Eid::Null,
                        _ => Eid::Ipn {
                            node_number,
                            service_number,
                        },
                    })
                }),
                scheme => Err(Error::UnsupportedScheme(scheme)),
            }
        })
    }
}
