use super::*;

mod error;
mod parse;

#[cfg(test)]
mod str_tests;


pub use error::Error;

/// An Endpoint Identifier, naming a DTN endpoint.
///
/// Two URI schemes are supported: `dtn` (scheme code 1) and `ipn` (scheme
/// code 2), per RFC 9171 section 4.2.5.
#[derive(Default, Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Eid {
    /// The null endpoint, `dtn:none`.
    #[default]
    Null,
    /// A `dtn` scheme EID, `dtn://<node-name>/<demux>`.
    Dtn {
        node_name: Box<str>,
        demux: Box<str>,
    },
    /// An `ipn` scheme EID, `ipn:<node-number>.<service-number>`.
    Ipn {
        node_number: u64,
        service_number: u64,
    },
}

impl Eid {
    /// The scheme-specific part of the EID URI.
    pub fn ssp(&self) -> String {
        match self {
            Eid::Null => "none".to_string(),
            Eid::Dtn { node_name, demux } => format!("//{node_name}/{demux}"),
            Eid::Ipn {
                node_number,
                service_number,
            } => format!("{node_number}.{service_number}"),
        }
    }
}

impl std::fmt::Display for Eid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eid::Null => f.write_str("dtn:none"),
            Eid::Dtn { node_name, demux } => write!(f, "dtn://{node_name}/{demux}"),
            Eid::Ipn {
                node_number,
                service_number,
            } => write!(f, "ipn:{node_number}.{service_number}"),
        }
    }
}

impl cbor::encode::ToCbor for Eid {
    fn to_cbor(&self, encoder: &mut cbor::encode::Encoder) {
        encoder.emit_array(Some(2), |a| match self {
            Eid::Null => {
                a.emit(&1);
                a.emit(&0);
            }
            Eid::Dtn { node_name, demux } => {
                a.emit(&1);
                a.emit(&format!("//{node_name}/{demux}"));
            }
            Eid::Ipn {
                node_number,
                service_number,
            } => {
                a.emit(&2);
                a.emit(&(*node_number, *service_number));
            }
        })
    }
}
