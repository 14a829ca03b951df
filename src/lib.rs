pub mod error;
pub mod fingerprint;
pub mod generator;
pub mod kdf;
pub mod profile;

pub use error::{ConfigError, Error, Result};
pub use fingerprint::{Fingerprint, fingerprint, fingerprint_index};
pub use generator::{generate_password, render_password};
pub use kdf::{DerivedEntropy, derive_entropy, derive_entropy_cancellable};
pub use profile::{CharacterClass, CharacterSet, HashAlgorithm, Profile, ProfilePreview};

pub fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    Ok(std::str::from_utf8(bytes)?)
}
