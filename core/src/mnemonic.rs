mod error;

use std::fmt;

pub use error::*;
use hmac::{Hmac, Mac};
use nacl::sign::generate_keypair;
use pbkdf2::password_hash::Output;
use pbkdf2::{pbkdf2_hmac, Params};
use sha2::Sha512;

pub const MNEMONIC_WORD_COUNT: usize = 24;

const PBKDF_ITERATIONS: u32 = 100000;
const SEED_VERSION_ITERATIONS: u32 = PBKDF_ITERATIONS / 256;

/// TON mnemonic: 24 words and an optional password.
///
/// Words are not checked against a dictionary. A phrase is accepted when it
/// has the right shape and passes the seed version check of the TON scheme.
pub struct Mnemonic {
    words: Vec<String>,
    password: Option<String>,
}

/// Ed25519 key pair as produced by `nacl`: 32 byte public key and 64 byte
/// secret key (seed followed by the public key).
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"***REDACTED***")
            .finish()
    }
}

impl Mnemonic {
    pub fn new(words: Vec<&str>, password: &Option<String>) -> Result<Mnemonic, MnemonicError> {
        let normalized_words: Vec<String> = words.iter().map(|w| w.trim().to_lowercase()).collect();

        if normalized_words.len() != MNEMONIC_WORD_COUNT {
            return Err(MnemonicError::UnexpectedWordCount(normalized_words.len()));
        }
        for word in &normalized_words {
            if word.is_empty() || !word.chars().all(|c| c.is_ascii_lowercase()) {
                return Err(MnemonicError::InvalidWord(word.clone()));
            }
        }

        match password {
            Some(s) if !s.is_empty() => {
                let passless_entropy = to_entropy(&normalized_words, &None)?;
                let seed = pbkdf2_sha512(passless_entropy, "TON fast seed version", 1, 64)?;
                if seed[0] != 1 {
                    return Err(MnemonicError::InvalidFirstByte(seed[0]));
                }
                // must not be a valid passwordless mnemonic at the same time
                let entropy = to_entropy(&normalized_words, password)?;
                let seed = pbkdf2_sha512(entropy, "TON seed version", SEED_VERSION_ITERATIONS, 64)?;
                if seed[0] == 0 {
                    return Err(MnemonicError::InvalidFirstByte(seed[0]));
                }
            }
            _ => {
                let entropy = to_entropy(&normalized_words, &None)?;
                let seed = pbkdf2_sha512(entropy, "TON seed version", SEED_VERSION_ITERATIONS, 64)?;
                if seed[0] != 0 {
                    return Err(MnemonicError::InvalidPasswordlessMnemonicFirstByte(seed[0]));
                }
            }
        }

        Ok(Mnemonic {
            words: normalized_words,
            password: password.clone(),
        })
    }

    /// Splits on any whitespace, so line breaks and repeated spaces are fine.
    pub fn from_str(s: &str, password: &Option<String>) -> Result<Mnemonic, MnemonicError> {
        let words: Vec<&str> = s.split_whitespace().collect();
        Mnemonic::new(words, password)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn to_key_pair(&self) -> Result<KeyPair, MnemonicError> {
        let entropy = to_entropy(&self.words, &self.password)?;
        let seed = pbkdf2_sha512(entropy, "TON default seed", PBKDF_ITERATIONS, 64)?;
        let key_pair = generate_keypair(&seed[0..32]);
        log::trace!("derived key pair {}", hex::encode(key_pair.pkey));
        Ok(KeyPair {
            public_key: key_pair.pkey.to_vec(),
            secret_key: key_pair.skey.to_vec(),
        })
    }
}

fn to_entropy(words: &[String], password: &Option<String>) -> Result<Vec<u8>, MnemonicError> {
    let mut mac = Hmac::<Sha512>::new_from_slice(words.join(" ").as_bytes())?;
    if let Some(s) = password {
        mac.update(s.as_bytes());
    }
    Ok(mac.finalize().into_bytes().to_vec())
}

fn pbkdf2_sha512(
    key: Vec<u8>,
    salt: &str,
    rounds: u32,
    output_length: usize,
) -> Result<Vec<u8>, MnemonicError> {
    let params = Params {
        rounds,
        output_length,
    };

    let output = Output::init_with(params.output_length, |out| {
        pbkdf2_hmac::<Sha512>(key.as_slice(), salt.as_bytes(), params.rounds, out);
        Ok(())
    })
    .map_err(MnemonicError::PasswordHashError)?;
    Ok(output.as_bytes().to_vec())
}
