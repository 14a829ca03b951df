use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const MIN_LENGTH: usize = 4;
pub const MAX_LENGTH: usize = 128;

pub const DEFAULT_LENGTH: usize = 16;
pub const DEFAULT_COUNTER: u32 = 1;
pub const DEFAULT_ITERATIONS: u32 = 100_000;

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NUMBERS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

// Markers follow the settings screen, not the rendering order.
const PREVIEW_ORDER: [CharacterClass; 4] = [
    CharacterClass::Uppercase,
    CharacterClass::Lowercase,
    CharacterClass::Numbers,
    CharacterClass::Symbols,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    Lowercase,
    Uppercase,
    Numbers,
    Symbols,
}

impl CharacterClass {
    /// Every class, in the order alphabets are concatenated and guaranteed
    /// characters are drawn. Changing this order changes every password.
    pub const ALL: [Self; 4] = [
        Self::Lowercase,
        Self::Uppercase,
        Self::Numbers,
        Self::Symbols,
    ];

    pub const fn alphabet(self) -> &'static [u8] {
        match self {
            Self::Lowercase => LOWERCASE,
            Self::Uppercase => UPPERCASE,
            Self::Numbers => NUMBERS,
            Self::Symbols => SYMBOLS,
        }
    }

    // Persisted bit values; not related to the rendering order.
    const fn bit(self) -> u8 {
        match self {
            Self::Uppercase => 1,
            Self::Lowercase => 2,
            Self::Numbers => 4,
            Self::Symbols => 8,
        }
    }

    pub const fn marker(self) -> char {
        match self {
            Self::Lowercase => 'a',
            Self::Uppercase => 'A',
            Self::Numbers => '1',
            Self::Symbols => '$',
        }
    }
}

/// Active character classes as the persisted bitmask. Iterates in
/// [`CharacterClass::ALL`] order whatever the bit values are.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CharacterSet(u8);

impl CharacterSet {
    pub const EMPTY: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    pub fn from_bits(bits: u8) -> Result<Self, ConfigError> {
        if bits & !Self::ALL.0 != 0 {
            return Err(ConfigError::UnknownCharacterClasses(bits));
        }
        Ok(Self(bits))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, class: CharacterClass) -> bool {
        self.0 & class.bit() != 0
    }

    #[must_use]
    pub const fn with(self, class: CharacterClass) -> Self {
        Self(self.0 | class.bit())
    }

    #[must_use]
    pub const fn without(self, class: CharacterClass) -> Self {
        Self(self.0 & !class.bit())
    }

    pub fn iter(self) -> impl Iterator<Item = CharacterClass> {
        CharacterClass::ALL
            .into_iter()
            .filter(move |class| self.contains(*class))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn alphabet(self) -> Vec<u8> {
        let mut alphabet = Vec::new();
        for class in self.iter() {
            alphabet.extend_from_slice(class.alphabet());
        }
        alphabet
    }
}

impl Default for CharacterSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<CharacterClass> for CharacterSet {
    fn from_iter<I: IntoIterator<Item = CharacterClass>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl TryFrom<u8> for CharacterSet {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<CharacterSet> for u8 {
    fn from(set: CharacterSet) -> Self {
        set.0
    }
}

impl fmt::Debug for CharacterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const fn bits(self) -> u16 {
        match self {
            Self::Sha256 => 256,
            Self::Sha384 => 384,
            Self::Sha512 => 512,
        }
    }

    pub const fn from_bits(bits: u16) -> Result<Self, ConfigError> {
        match bits {
            256 => Ok(Self::Sha256),
            384 => Ok(Self::Sha384),
            512 => Ok(Self::Sha512),
            other => Err(ConfigError::UnknownAlgorithm(other)),
        }
    }
}

impl TryFrom<u16> for HashAlgorithm {
    type Error = ConfigError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        Self::from_bits(bits)
    }
}

impl From<HashAlgorithm> for u16 {
    fn from(algorithm: HashAlgorithm) -> Self {
        algorithm.bits()
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA{}", self.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub length: usize,
    pub counter: u32,
    pub iterations: u32,
    #[serde(rename = "charsets")]
    pub character_classes: CharacterSet,
    #[serde(rename = "algorithm")]
    pub hash_algorithm: HashAlgorithm,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            counter: DEFAULT_COUNTER,
            iterations: DEFAULT_ITERATIONS,
            character_classes: CharacterSet::ALL,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl Profile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let classes = self.character_classes.len();

        if classes == 0 {
            return Err(ConfigError::NoCharacterClasses);
        }
        if self.length < classes {
            return Err(ConfigError::LengthBelowClassCount {
                length: self.length,
                classes,
            });
        }
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&self.length) {
            return Err(ConfigError::LengthOutOfRange {
                length: self.length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        if self.counter == 0 {
            return Err(ConfigError::ZeroCounter);
        }
        if self.iterations == 0 {
            return Err(ConfigError::ZeroIterations);
        }

        Ok(())
    }

    pub fn preview(&self) -> ProfilePreview {
        let classes = PREVIEW_ORDER
            .into_iter()
            .filter(|class| self.character_classes.contains(*class))
            .map(CharacterClass::marker)
            .collect();

        ProfilePreview {
            classes,
            length: self.length,
            counter: self.counter,
            iterations: self.iterations,
            algorithm: self.hash_algorithm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePreview {
    pub classes: String,
    pub length: usize,
    pub counter: u32,
    pub iterations: u32,
    pub algorithm: HashAlgorithm,
}
