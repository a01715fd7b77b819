//! Process-wide random source for serial numbers and key generation

use rand::Rng;

/// Front door to the process-wide CSPRNG.
///
/// Shared by all in-flight requests; the underlying generator is safe for
/// concurrent use, so no serialization happens at this boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomService;

impl RandomService {
    pub fn new() -> Self {
        Self
    }

    /// Uniform random positive serial number in `[1, i64::MAX)`, big-endian
    /// with leading zero bytes stripped.
    ///
    /// The range matches what deployed verifiers have seen from this
    /// authority; widening it changes interoperability assumptions.
    pub fn serial_number(&self) -> Vec<u8> {
        let value: u64 = rand::rng().random_range(1..i64::MAX as u64);
        let bytes = value.to_be_bytes();
        let start = bytes
            .iter()
            .position(|&b| b != 0)
            .unwrap_or(bytes.len() - 1);
        bytes[start..].to_vec()
    }
}
