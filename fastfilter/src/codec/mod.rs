//! Codec for the `terms` parameter.
//!
//! `terms` is base64 text wrapping the portable serialization of a
//! compressed `u32` set (see [`set`] for the byte layout). Decoding happens
//! in two steps so that bad text and bad bytes surface as different errors:
//!
//! 1. base64 text → bytes, failing with [`Error::InvalidEncodingText`]
//! 2. bytes → [`DecodedSet`], failing with [`Error::MalformedEncoding`]

mod container;
pub mod set;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

pub use set::DecodedSet;

use crate::error::{Error, Result};

/// Standard alphabet; `=` padding is written on encode and optional on decode.
const TERMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decodes base64 `terms` text into a queryable set.
pub fn decode_terms(text: &str) -> Result<DecodedSet> {
    let bytes = TERMS_ENGINE
        .decode(text)
        .map_err(|e| Error::InvalidEncodingText(e.to_string()))?;
    DecodedSet::deserialize(&bytes)
}

/// Encodes a set as base64 `terms` text.
pub fn encode_terms(set: &DecodedSet) -> String {
    TERMS_ENGINE.encode(set.serialize())
}
