//! Editor-style text storage: a byte [`GapBuffer`] plus a [`CodedString`]
//! view that addresses it by decoded rune instead of by byte.
//!
//! The gap buffer keeps a movable run of spare capacity inside the byte
//! array, so edits clustered around one spot (the common case for a text
//! editor) cost O(1) after the first. The coded string layers a
//! variable-width encoding (UTF-8 by default) on top, maintaining a
//! run-length index of bytes-per-rune so rune↔byte mapping stays cheap on
//! realistic text. Malformed bytes never fail: decoding uses the replace
//! policy and yields U+FFFD.
//!
//! ```
//! use runebuf::CodedString;
//!
//! let mut text = CodedString::from("κόσμε");
//! assert_eq!(text.len(), 5);            // runes
//! assert_eq!(text.buffer().len(), 10);  // bytes
//!
//! text.insert(5, "!");
//! text.delete(0..2);
//! assert_eq!(text.to_string(), "σμε!");
//! assert_eq!(text.byte_slice(0), Ok(0..2));
//! ```

mod codec;
mod codedstring;
mod error;
mod gapbuffer;
mod utils;

pub use codec::{Decoder, Encoder, Encoding};
pub use codedstring::{CodedString, Runes};
pub use error::{Error, Result};
pub use gapbuffer::{Bytes, GapBuffer};
