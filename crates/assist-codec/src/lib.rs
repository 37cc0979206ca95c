//! # assist-codec
//!
//! JSON building blocks shared by the wire model: a closed [`DynamicValue`]
//! for open-ended payloads and the decoding helpers in [`codec`] for
//! tagged and shape-probed unions.

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{Probe, decode, decode_str, encode, probe, require_tag};
pub use error::{Error, de_error};
pub use value::{DynamicValue, Map};
