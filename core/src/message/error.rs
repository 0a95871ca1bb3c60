use thiserror::Error;

use crate::cell::TonCellError;

#[derive(Error, Debug)]
pub enum TonMessageError {
    #[error("NaCl cryptographic error ({0})")]
    NaclCryptographicError(String),

    #[error("TonCellError ({0})")]
    TonCellError(#[from] TonCellError),

    #[error("Invalid key pair ({0})")]
    InvalidKeyPair(String),

    #[error("Too many actions: {count}, at most {max} fit into one request")]
    TooManyActions { count: usize, max: usize },
}
