//! Encoder trait: turns a record into bytes

use super::record::Record;

/// Serializes one record, including its trailing newline, into `buf`
///
/// `buf` is empty on entry. Leaving it empty suppresses the record; that is
/// not an error.
pub trait Encoder: Send + Sync {
    fn encode(&self, buf: &mut Vec<u8>, record: &Record<'_>);
}

impl<F> Encoder for F
where
    F: Fn(&mut Vec<u8>, &Record<'_>) + Send + Sync,
{
    fn encode(&self, buf: &mut Vec<u8>, record: &Record<'_>) {
        self(buf, record)
    }
}
