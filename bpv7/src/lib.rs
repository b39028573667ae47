/*!
An implementation of the Bundle Protocol version 7 (BPv7), as defined in
[RFC 9171](https://www.rfc-editor.org/rfc/rfc9171.html), with BPSec
BIB-HMAC-SHA2 integrity protection ([RFC 9172](https://www.rfc-editor.org/rfc/rfc9172.html)/
[RFC 9173](https://www.rfc-editor.org/rfc/rfc9173.html)).

This crate provides the building blocks for working with BPv7 bundles:
creation via a [`Builder`](builder::Builder), CBOR encoding and decoding with
per-block CRC protection, structural validation, and sealing/verifying
integrity blocks.

# Usage Example

The following example builds a bundle, encodes it, and parses it back.

```rust
use tundra_bpv7::{builder::Builder, bundle::Bundle, eid::Eid};

let source: Eid = "ipn:1.0".parse()?;
let destination: Eid = "ipn:2.0".parse()?;

let bundle = Builder::new()
    .with_source(source)
    .with_destination(destination)
    .with_payload(b"Hello, world!".as_slice().into())
    .build()?;

let data = bundle.emit();

let parsed = Bundle::parse(&data)?;
assert_eq!(parsed, bundle);
assert_eq!(parsed.payload(), Some(b"Hello, world!".as_slice()));
# Ok::<_, tundra_bpv7::Error>(())
```

# Integrity Example

```rust
use tundra_bpv7::{block, bpsec, builder::Builder, eid::Eid};

let bib = bpsec::bib::Builder::new()
    .with_target(1)
    .with_source("ipn:1.0".parse::<Eid>()?)
    .build()?;

let mut bundle = Builder::new()
    .with_source("ipn:1.0".parse::<Eid>()?)
    .with_destination("ipn:2.0".parse::<Eid>()?)
    .with_payload(b"payload".as_slice().into())
    .add_extension_block(block::Data::BlockIntegrity(bib))
    .build()
    .build()?;

let key = [0u8; 32];
bundle.seal(&key)?;
bundle.verify(&key)?;
# Ok::<_, tundra_bpv7::Error>(())
```
*/

use tundra_cbor as cbor;

pub mod block;
pub mod bpsec;
pub mod builder;
pub mod bundle;
pub mod crc;
pub mod creation_timestamp;
pub mod dtn_time;
pub mod eid;
pub mod hop_info;
pub mod primary_block;

mod block_flags;
mod block_type;
mod bundle_flags;
mod error;


pub use block_flags::BlockFlags;
pub use block_type::BlockType;
pub use bundle::Bundle;
pub use bundle_flags::BundleFlags;
pub use self::crc::CrcType;
pub use creation_timestamp::CreationTimestamp;
pub use dtn_time::DtnTime;
pub use eid::Eid;
pub use error::Error;
pub use hop_info::HopInfo;
