/*!
A compact CBOR ([RFC 8949](https://www.rfc-editor.org/rfc/rfc8949.html))
encoder and decoder tuned for protocol work.

The [`encode`] module writes values through a closure-driven
[`Encoder`](encode::Encoder), which makes it easy to emit arrays whose exact
element layout is dictated by a wire specification, including definite-length
arrays with a trailing value that is appended after the fact (see
[`encode::Array::skip_value`]).

The [`decode`] module parses borrowed data without intermediate copies,
tracking byte offsets so callers can locate a value within the original
buffer, which protocols with embedded checksums need.
*/

pub mod decode;
pub mod encode;

#[cfg(test)]
mod decode_tests;
