//! Identifier payload and placeholder QR artifact.
//!
//! The payload is a reversible text encoding (base64 of JSON) of a
//! registration's core fields. The image is a decorative 8x8 pattern derived
//! from that text; it cannot be decoded back, so check-in always works from
//! the text payload.

pub mod pattern;
pub mod payload;

pub use pattern::render_pattern;
pub use payload::{PayloadChild, PayloadError, QrPayload};
