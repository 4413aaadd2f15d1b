//! Wallet address decoding
//!
//! Turns the textual address a client claims into the raw public key that
//! signatures are checked against.

use base32::Alphabet;
use thiserror::Error;

/// Raw public key bytes as consumed by the signature scheme.
pub type PublicKeyBytes = [u8; 32];

/// Version byte of a Stellar account ID (renders as a leading 'G').
const ACCOUNT_ID_VERSION: u8 = 6 << 3;

/// Length of an encoded account ID in characters.
const ENCODED_LEN: usize = 56;

/// Address decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address format: {0}")]
    InvalidFormat(String),

    #[error("Invalid address checksum")]
    InvalidChecksum,

    #[error("Address is not in canonical form")]
    NonCanonical,
}

/// Converts between an address string and public key bytes.
///
/// Implementations must be pure and canonical: a key has exactly one accepted
/// spelling, and every accepted spelling decodes to the same key each time.
pub trait AddressCodec: Send + Sync {
    /// Decode an address into the public key it names.
    fn decode(&self, address: &str) -> Result<PublicKeyBytes, AddressError>;

    /// Render a public key in its canonical address form.
    fn encode(&self, public_key: &PublicKeyBytes) -> String;
}

/// Stellar account IDs ("G..." addresses).
///
/// Layout before base32: version byte, 32 key bytes, CRC16-XModem checksum
/// (little-endian).
#[derive(Debug, Clone, Copy, Default)]
pub struct StellarAddressCodec;

impl AddressCodec for StellarAddressCodec {
    fn decode(&self, address: &str) -> Result<PublicKeyBytes, AddressError> {
        if address.len() != ENCODED_LEN {
            return Err(AddressError::InvalidFormat(format!(
                "Expected {} characters, got {}",
                ENCODED_LEN,
                address.len()
            )));
        }

        if !address.starts_with('G') {
            return Err(AddressError::InvalidFormat(
                "Account addresses must start with 'G'".to_string(),
            ));
        }

        let decoded = base32::decode(Alphabet::Rfc4648 { padding: false }, address)
            .ok_or_else(|| AddressError::InvalidFormat("Invalid base32 encoding".to_string()))?;

        if decoded.len() != 35 {
            return Err(AddressError::InvalidFormat(format!(
                "Expected 35 bytes, got {}",
                decoded.len()
            )));
        }

        if decoded[0] != ACCOUNT_ID_VERSION {
            return Err(AddressError::InvalidFormat(format!(
                "Unexpected version byte {:#04x}",
                decoded[0]
            )));
        }

        let (payload, checksum) = decoded.split_at(33);
        if checksum != crc16_xmodem(payload) {
            return Err(AddressError::InvalidChecksum);
        }

        let mut public_key = [0u8; 32];
        public_key.copy_from_slice(&payload[1..]);

        // The decoder tolerates lowercase input; only the uppercase spelling is accepted.
        if self.encode(&public_key) != address {
            return Err(AddressError::NonCanonical);
        }

        Ok(public_key)
    }

    fn encode(&self, public_key: &PublicKeyBytes) -> String {
        let mut raw = Vec::with_capacity(35);
        raw.push(ACCOUNT_ID_VERSION);
        raw.extend_from_slice(public_key);
        let checksum = crc16_xmodem(&raw);
        raw.extend_from_slice(&checksum);

        base32::encode(Alphabet::Rfc4648 { padding: false }, &raw)
    }
}

/// CRC16-XModem, little-endian byte order
fn crc16_xmodem(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0;

    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }

    crc.to_le_bytes()
}
