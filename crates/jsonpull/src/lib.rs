//! A pull-based streaming UTF-8 JSON reader that preserves the exact byte
//! representation of any value it passes through.
//!
//! The reader tokenizes a refillable byte stream into JSON structural events
//! and primitive values. It can be consumed two ways:
//!
//! - **Structured decoding** — navigate objects and arrays and ask for typed
//!   primitives (`next_string`, `next_long`, `next_double`, ...).
//! - **Passthrough streaming** — hand the reader a [`Sink`] and let
//!   [`JsonReader::stream_value`] copy the bytes of the next JSON value,
//!   however deeply nested, verbatim into it. Re-emitted values keep their
//!   original whitespace, comments, and escape spellings.
//!
//! A lenient mode accepts a documented superset of RFC 8259: `//`, `/* */`
//! and `#` comments, single-quoted and unquoted strings and names, `;` for
//! `,`, `=`/`=>` for `:`, and elided array elements as `null`.
//!
//! # Examples
//!
//! ```rust
//! use jsonpull::JsonReader;
//!
//! let mut reader = JsonReader::of(r#"{"id": 42, "tags": ["a", "b"]}"#);
//! reader.begin_object()?;
//! assert_eq!(reader.next_name()?, "id");
//! assert_eq!(reader.next_long()?, 42);
//! assert_eq!(reader.next_name()?, "tags");
//! reader.begin_array()?;
//! while reader.has_next()? {
//!     reader.next_string()?;
//! }
//! reader.end_array()?;
//! reader.end_object()?;
//! # Ok::<(), jsonpull::ReadError>(())
//! ```
//!
//! Byte-exact passthrough of a sub-value:
//!
//! ```rust
//! use jsonpull::JsonReader;
//!
//! let mut reader = JsonReader::of(r#"{"raw": {"keep":  "spacing"}}"#);
//! reader.begin_object()?;
//! assert_eq!(reader.next_name()?, "raw");
//! let mut sink = Vec::new();
//! reader.stream_value(&mut sink)?;
//! assert_eq!(sink, br#"{"keep":  "spacing"}"#);
//! reader.end_object()?;
//! # Ok::<(), jsonpull::ReadError>(())
//! ```

#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod byte_set;
mod error;
mod numbers;
mod options;
mod reader;
mod scope;
mod sink;
mod source;
mod strings;
mod value_source;

pub use byte_set::ByteSet;
pub use error::{ReadError, Result, StreamError};
pub use options::{ReaderOptions, SelectOptions};
pub use reader::{DryRunHint, JsonReader, Token};
pub use sink::{Blackhole, Sink, ValueSink};
#[cfg(feature = "std")]
pub use sink::IoSink;
pub use source::{ByteSource, FillSource};
pub use value_source::ValueSource;

#[cfg(test)]
mod tests;
