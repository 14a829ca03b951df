use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::Result;

pub const FINGERPRINT_LEN: usize = 32;
pub const WINDOW_COUNT: usize = 3;

const WINDOW_LEN: usize = 3;

/// HMAC-SHA256 of an empty message keyed by the master secret. Safe to show,
/// lets a user notice a mistyped secret before using the derived password.
#[derive(Clone, PartialEq, Eq)]
pub struct Fingerprint(Zeroizing<[u8; FINGERPRINT_LEN]>);

impl Fingerprint {
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn index(&self, window: usize) -> Option<u32> {
        if window >= WINDOW_COUNT {
            return None;
        }

        let start = window * WINDOW_LEN;
        let [a, b, c] = [self.0[start], self.0[start + 1], self.0[start + 2]];
        Some(u32::from_be_bytes([0, a, b, c]))
    }

    pub fn windows(&self) -> [u32; WINDOW_COUNT] {
        let mut windows = [0; WINDOW_COUNT];
        for (window, slot) in windows.iter_mut().enumerate() {
            *slot = self.index(window).unwrap_or_default();
        }
        windows
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fingerprint").field(&self.windows()).finish()
    }
}

pub fn fingerprint(master_secret: &str) -> Result<Fingerprint> {
    let mac = Hmac::<Sha256>::new_from_slice(master_secret.as_bytes())?;

    let mut output = Zeroizing::new([0u8; FINGERPRINT_LEN]);
    output.copy_from_slice(&mac.finalize().into_bytes());

    Ok(Fingerprint(output))
}

pub fn fingerprint_index(fingerprint: &Fingerprint, window: usize) -> Option<u32> {
    fingerprint.index(window)
}
