/// TON mnemonic validation for the import screen
///
/// TON phrases use the BIP-39 English words but not the BIP-39 checksum.
/// A phrase is valid when its derived seed is a "basic seed":
///
/// 1. entropy = HMAC-SHA512(key = phrase, message = password)
/// 2. seed = PBKDF2-HMAC-SHA512(entropy, "TON seed version", 390 rounds)
/// 3. valid iff seed[0] == 0
use crate::error::MnemonicError;
use bip39::Language;
use hmac::{Hmac, Mac};
use sha2::Sha512;

pub const MNEMONIC_WORDS: usize = 24;

const SEED_VERSION_SALT: &[u8] = b"TON seed version";
// max(1, floor(100000 / 256))
const SEED_VERSION_ROUNDS: u32 = 390;

#[derive(Clone, PartialEq)]
pub struct Mnemonic {
    words: Vec<String>,
}

impl Mnemonic {
    /// Parse whitespace-separated words and validate them
    pub fn parse(phrase: &str) -> Result<Mnemonic, MnemonicError> {
        let words: Vec<String> = phrase
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect();
        validate_mnemonic(&words)?;
        Ok(Mnemonic { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn phrase(&self) -> String {
        self.words.join(" ")
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic").field("words", &"[REDACTED]").finish()
    }
}

pub fn validate_mnemonic(words: &[String]) -> Result<(), MnemonicError> {
    if words.len() != MNEMONIC_WORDS {
        return Err(MnemonicError::WordCount(words.len()));
    }
    if let Some(word) = words.iter().find(|w| Language::English.find_word(w).is_none()) {
        return Err(MnemonicError::UnknownWord(word.clone()));
    }
    if !is_basic_seed(&to_entropy(&words.join(" "), "")?) {
        return Err(MnemonicError::Checksum);
    }
    Ok(())
}

fn to_entropy(phrase: &str, password: &str) -> Result<[u8; 64], MnemonicError> {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(phrase.as_bytes()).map_err(|_| MnemonicError::Checksum)?;
    mac.update(password.as_bytes());

    let mut entropy = [0u8; 64];
    entropy.copy_from_slice(&mac.finalize().into_bytes());
    Ok(entropy)
}

fn is_basic_seed(entropy: &[u8; 64]) -> bool {
    let mut seed = [0u8; 64];
    pbkdf2::pbkdf2_hmac::<Sha512>(entropy, SEED_VERSION_SALT, SEED_VERSION_ROUNDS, &mut seed);
    seed[0] == 0
}
