//! Encoder implementations

pub mod json;
pub mod text;

pub use json::{JsonEncoder, MapJsonEncoder};
pub use text::TextEncoder;

pub use crate::core::Encoder;

use crate::core::Record;

/// Encodes nothing, so every record is suppressed
#[derive(Debug, Clone, Copy, Default)]
pub struct NopEncoder;

impl Encoder for NopEncoder {
    fn encode(&self, _buf: &mut Vec<u8>, _record: &Record<'_>) {}
}
