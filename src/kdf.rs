use std::fmt;

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::profile::{HashAlgorithm, Profile};

pub const ENTROPY_LEN: usize = 32;

const CANCEL_POLL_INTERVAL: u32 = 1024;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// PBKDF2 output read as a 256-bit big-endian unsigned integer.
pub struct DerivedEntropy(Zeroizing<[u8; ENTROPY_LEN]>);

impl DerivedEntropy {
    pub fn from_bytes(bytes: [u8; ENTROPY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; ENTROPY_LEN] {
        &self.0
    }

    pub(crate) fn into_inner(self) -> Zeroizing<[u8; ENTROPY_LEN]> {
        self.0
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        let mut hex = Zeroizing::new(String::with_capacity(ENTROPY_LEN * 2));
        for byte in self.0.iter() {
            hex.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
            hex.push(HEX_DIGITS[usize::from(byte & 0x0f)] as char);
        }
        hex
    }
}

impl fmt::Debug for DerivedEntropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedEntropy(..)")
    }
}

/// `site || login || lowercase hex(counter)`, no separators.
pub fn salt(site: &str, login: &str, counter: u32) -> String {
    format!("{site}{login}{counter:x}")
}

pub fn derive_entropy(
    master_secret: &str,
    site: &str,
    login: &str,
    profile: &Profile,
) -> Result<DerivedEntropy> {
    profile.validate()?;

    let salt = salt(site, login, profile.counter).into_bytes();
    let password = master_secret.as_bytes();
    let rounds = profile.iterations;
    let mut output = Zeroizing::new([0u8; ENTROPY_LEN]);

    match profile.hash_algorithm {
        HashAlgorithm::Sha256 => pbkdf2_hmac::<Sha256>(password, &salt, rounds, &mut *output),
        HashAlgorithm::Sha384 => pbkdf2_hmac::<Sha384>(password, &salt, rounds, &mut *output),
        HashAlgorithm::Sha512 => pbkdf2_hmac::<Sha512>(password, &salt, rounds, &mut *output),
    }

    Ok(DerivedEntropy(output))
}

/// Same output as [`derive_entropy`], but `cancel` is polled every
/// 1024 iterations and a `true` answer aborts with [`Error::Cancelled`].
pub fn derive_entropy_cancellable<F>(
    master_secret: &str,
    site: &str,
    login: &str,
    profile: &Profile,
    cancel: F,
) -> Result<DerivedEntropy>
where
    F: FnMut() -> bool,
{
    profile.validate()?;

    let salt = salt(site, login, profile.counter).into_bytes();
    let password = master_secret.as_bytes();
    let rounds = profile.iterations;

    let output = match profile.hash_algorithm {
        HashAlgorithm::Sha256 => pbkdf2_block::<Hmac<Sha256>, _>(password, &salt, rounds, cancel),
        HashAlgorithm::Sha384 => pbkdf2_block::<Hmac<Sha384>, _>(password, &salt, rounds, cancel),
        HashAlgorithm::Sha512 => pbkdf2_block::<Hmac<Sha512>, _>(password, &salt, rounds, cancel),
    }?;

    Ok(DerivedEntropy(output))
}

// Every supported digest is at least 32 bytes wide, so block index 1 alone
// covers the whole output.
fn pbkdf2_block<M, F>(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    mut cancel: F,
) -> Result<Zeroizing<[u8; ENTROPY_LEN]>>
where
    M: Mac + KeyInit + Clone,
    F: FnMut() -> bool,
{
    let prf = <M as KeyInit>::new_from_slice(password)?;

    let mut mac = prf.clone();
    mac.update(salt);
    mac.update(&1u32.to_be_bytes());
    let mut block = mac.finalize().into_bytes();
    let mut accumulator = block.clone();

    for round in 1..iterations {
        if round % CANCEL_POLL_INTERVAL == 0 && cancel() {
            block.as_mut_slice().zeroize();
            accumulator.as_mut_slice().zeroize();
            return Err(Error::Cancelled);
        }

        let mut mac = prf.clone();
        mac.update(&block);
        let next = mac.finalize().into_bytes();
        block.as_mut_slice().zeroize();
        block = next;

        for (acc, byte) in accumulator.iter_mut().zip(block.iter()) {
            *acc ^= byte;
        }
    }

    let mut output = Zeroizing::new([0u8; ENTROPY_LEN]);
    output.copy_from_slice(&accumulator[..ENTROPY_LEN]);

    block.as_mut_slice().zeroize();
    accumulator.as_mut_slice().zeroize();

    Ok(output)
}
