pub mod cell;
pub mod message;
pub mod mnemonic;
pub mod tlb_types;
pub mod types;
pub mod wallet;

pub use crate::types::{TonAddress, TonAddressParseError, TonHash};
