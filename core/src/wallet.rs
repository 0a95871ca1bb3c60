mod ton_wallet;
mod v5;
mod wallet_code;
mod wallet_id;

pub use ton_wallet::*;
pub use v5::*;
pub use wallet_code::*;
pub use wallet_id::*;
