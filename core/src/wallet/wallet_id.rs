use std::fmt;

use crate::cell::TonCellError;

pub const MAINNET_GLOBAL_ID: i32 = -239;
pub const TESTNET_GLOBAL_ID: i32 = -3;

pub const DEFAULT_WALLET_ID_V5R1: i32 = 0x7FFFFF11;
pub const DEFAULT_WALLET_ID_V5R1_TESTNET: i32 = 0x7FFFFFFD;

const WALLET_VERSION_V5R1: u8 = 0;
const MAX_SUBWALLET_NUMBER: u16 = 0x7FFF;

/// Wallet id of a v5r1 wallet.
///
/// The stored value is `network_global_id ^ context`, where the client
/// context is `1:1 workchain:int8 wallet_version:uint8 subwallet_number:uint15`
/// read as an `int32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletIdV5R1 {
    pub network_global_id: i32,
    pub workchain: i8,
    pub wallet_version: u8,
    pub subwallet_number: u16,
}

impl WalletIdV5R1 {
    pub fn new(
        network_global_id: i32,
        workchain: i8,
        subwallet_number: u16,
    ) -> Result<Self, TonCellError> {
        if subwallet_number > MAX_SUBWALLET_NUMBER {
            return Err(TonCellError::value_out_of_range(subwallet_number, 15));
        }
        Ok(Self {
            network_global_id,
            workchain,
            wallet_version: WALLET_VERSION_V5R1,
            subwallet_number,
        })
    }

    pub fn mainnet() -> Self {
        Self::with_defaults(MAINNET_GLOBAL_ID)
    }

    pub fn testnet() -> Self {
        Self::with_defaults(TESTNET_GLOBAL_ID)
    }

    fn with_defaults(network_global_id: i32) -> Self {
        Self {
            network_global_id,
            workchain: 0,
            wallet_version: WALLET_VERSION_V5R1,
            subwallet_number: 0,
        }
    }

    fn context(&self) -> u32 {
        1 << 31
            | (self.workchain as u8 as u32) << 23
            | (self.wallet_version as u32) << 15
            | (self.subwallet_number & MAX_SUBWALLET_NUMBER) as u32
    }

    pub fn to_i32(&self) -> i32 {
        self.network_global_id ^ self.context() as i32
    }

    /// Splits a stored wallet id back into its fields, given the network it
    /// belongs to.
    pub fn decode(wallet_id: i32, network_global_id: i32) -> Result<Self, TonCellError> {
        let context = (wallet_id ^ network_global_id) as u32;
        if context >> 31 == 0 {
            return Err(TonCellError::InvalidInput(format!(
                "wallet id {wallet_id:#x} doesn't carry a client context for network {network_global_id}"
            )));
        }
        Ok(Self {
            network_global_id,
            workchain: (context >> 23) as u8 as i8,
            wallet_version: (context >> 15) as u8,
            subwallet_number: (context & MAX_SUBWALLET_NUMBER as u32) as u16,
        })
    }
}

impl From<WalletIdV5R1> for i32 {
    fn from(value: WalletIdV5R1) -> Self {
        value.to_i32()
    }
}

impl fmt::Display for WalletIdV5R1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.to_i32())
    }
}
