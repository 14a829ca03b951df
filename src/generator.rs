use zeroize::Zeroizing;

use crate::error::Result;
use crate::kdf::{DerivedEntropy, ENTROPY_LEN, derive_entropy};
use crate::profile::Profile;

/// The entropy value while it is being spent. Big-endian base-256 digits,
/// divided in place so no fixed-width integer ever holds the whole value.
struct Quotient(Zeroizing<[u8; ENTROPY_LEN]>);

impl Quotient {
    /// Replaces the value with `value / divisor` and returns `value % divisor`.
    fn divmod(&mut self, divisor: usize) -> usize {
        debug_assert!(divisor > 0 && divisor <= u8::MAX as usize + 1);

        let divisor = divisor as u32;
        let mut remainder = 0u32;

        for digit in self.0.iter_mut() {
            let current = (remainder << 8) | u32::from(*digit);
            *digit = (current / divisor) as u8;
            remainder = current % divisor;
        }

        remainder as usize
    }
}

pub fn render_password(entropy: DerivedEntropy, profile: &Profile) -> Result<Zeroizing<String>> {
    profile.validate()?;

    let classes = profile.character_classes;
    let alphabet = classes.alphabet();
    let body_length = profile.length - classes.len();

    let mut quotient = Quotient(entropy.into_inner());
    let mut password = Zeroizing::new(Vec::with_capacity(profile.length));

    for _ in 0..body_length {
        password.push(alphabet[quotient.divmod(alphabet.len())]);
    }

    let guaranteed: Zeroizing<Vec<u8>> = Zeroizing::new(
        classes
            .iter()
            .map(|class| {
                let set = class.alphabet();
                set[quotient.divmod(set.len())]
            })
            .collect(),
    );

    // The divisor is the length accumulated so far, not the final length.
    for &ch in guaranteed.iter() {
        let index = if password.is_empty() {
            0
        } else {
            quotient.divmod(password.len())
        };
        password.insert(index, ch);
    }

    let mut rendered = Zeroizing::new(String::with_capacity(password.len()));
    rendered.extend(password.iter().copied().map(char::from));
    Ok(rendered)
}

pub fn generate_password(
    master_secret: &str,
    site: &str,
    login: &str,
    profile: &Profile,
) -> Result<Zeroizing<String>> {
    let entropy = derive_entropy(master_secret, site, login, profile)?;
    render_password(entropy, profile)
}
