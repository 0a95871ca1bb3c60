use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use crc::Crc;
use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{TonAddressParseError, TonHash, ZERO_HASH};
use crate::cell::{ArcCell, TonCellError};
use crate::tlb_types::block::state_init::StateInit;
use crate::tlb_types::traits::TLBObject;

lazy_static! {
    pub static ref CRC_16_XMODEM: Crc<u16> = Crc::<u16>::new(&crc::CRC_16_XMODEM);
}

const USER_FRIENDLY_LEN: usize = 48;

/// Standard internal address: workchain and 256-bit account id.
#[derive(PartialEq, Eq, Clone, Hash)]
pub struct TonAddress {
    pub workchain: i32,
    pub hash_part: TonHash,
}

impl TonAddress {
    pub const NULL: TonAddress = TonAddress {
        workchain: 0,
        hash_part: ZERO_HASH,
    };

    pub fn new(workchain: i32, hash_part: &TonHash) -> TonAddress {
        TonAddress {
            workchain,
            hash_part: *hash_part,
        }
    }

    pub fn null() -> TonAddress {
        TonAddress::NULL.clone()
    }

    /// Address of the contract deployed with the given code and data:
    /// the hash of its `StateInit` cell.
    pub fn derive(
        workchain: i32,
        code: &ArcCell,
        data: &ArcCell,
    ) -> Result<TonAddress, TonCellError> {
        let state_init = StateInit::new(code.clone(), data.clone()).to_cell()?;
        Ok(TonAddress::new(workchain, &state_init.cell_hash()))
    }

    pub fn from_hex_str(s: &str) -> Result<TonAddress, TonAddressParseError> {
        let (wc, hash) = s.split_once(':').ok_or_else(|| {
            TonAddressParseError::new(s, "Invalid hex address string: wrong address format")
        })?;
        let workchain = wc.parse::<i32>().map_err(|_| {
            TonAddressParseError::new(s, "Invalid hex address string: parse int error")
        })?;
        let bytes = hex::decode(hash)
            .map_err(|_| TonAddressParseError::new(s, "Invalid hex address string: hex decode error"))?;
        let hash_part = TonHash::try_from(bytes.as_slice()).map_err(|_| {
            TonAddressParseError::new(s, "Invalid hex address string: wrong hash length")
        })?;
        Ok(TonAddress::new(workchain, &hash_part))
    }

    pub fn from_base64_url(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_url_flags(s)?.0)
    }

    /// Parses url-safe base64 representation of an address
    ///
    /// # Returns
    /// the address, non-bounceable flag, non-production flag.
    pub fn from_base64_url_flags(
        s: &str,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        Self::from_base64_with(s, &URL_SAFE_NO_PAD)
    }

    pub fn from_base64_std(s: &str) -> Result<TonAddress, TonAddressParseError> {
        Ok(Self::from_base64_std_flags(s)?.0)
    }

    /// Parses standard base64 representation of an address
    ///
    /// # Returns
    /// the address, non-bounceable flag, non-production flag.
    pub fn from_base64_std_flags(
        s: &str,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        Self::from_base64_with(s, &STANDARD_NO_PAD)
    }

    fn from_base64_with<E: Engine>(
        s: &str,
        engine: &E,
    ) -> Result<(TonAddress, bool, bool), TonAddressParseError> {
        if s.len() != USER_FRIENDLY_LEN {
            return Err(TonAddressParseError::new(s, "Invalid base64 address: wrong length"));
        }
        let bytes = engine
            .decode(s)
            .map_err(|_| TonAddressParseError::new(s, "Invalid base64 address: decode error"))?;
        let bytes: [u8; 36] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| TonAddressParseError::new(s, "Invalid base64 address: wrong size"))?;

        let (non_production, non_bounceable) = match bytes[0] {
            0x11 => (false, false),
            0x51 => (false, true),
            0x91 => (true, false),
            0xD1 => (true, true),
            _ => {
                return Err(TonAddressParseError::new(
                    s,
                    "Invalid base64 address: wrong tag byte",
                ))
            }
        };
        let calc_crc = CRC_16_XMODEM.checksum(&bytes[0..34]);
        let addr_crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        if calc_crc != addr_crc {
            return Err(TonAddressParseError::new(s, "Invalid base64 address: CRC mismatch"));
        }
        let mut hash_part = ZERO_HASH;
        hash_part.copy_from_slice(&bytes[2..34]);
        let addr = TonAddress::new(bytes[1] as i8 as i32, &hash_part);
        Ok((addr, non_bounceable, non_production))
    }

    pub fn to_hex(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.hash_part))
    }

    /// Bounceable, mainnet, url-safe form.
    pub fn to_base64_url(&self) -> String {
        self.to_base64_url_flags(false, false)
    }

    pub fn to_base64_url_flags(&self, non_bounceable: bool, non_production: bool) -> String {
        URL_SAFE_NO_PAD.encode(self.user_friendly_bytes(non_bounceable, non_production))
    }

    pub fn to_base64_std(&self) -> String {
        self.to_base64_std_flags(false, false)
    }

    pub fn to_base64_std_flags(&self, non_bounceable: bool, non_production: bool) -> String {
        STANDARD_NO_PAD.encode(self.user_friendly_bytes(non_bounceable, non_production))
    }

    /// tag, workchain, hash, crc16 of the preceding 34 bytes
    fn user_friendly_bytes(&self, non_bounceable: bool, non_production: bool) -> [u8; 36] {
        let tag: u8 = match (non_production, non_bounceable) {
            (false, false) => 0x11,
            (false, true) => 0x51,
            (true, false) => 0x91,
            (true, true) => 0xD1,
        };
        let mut bytes = [0u8; 36];
        bytes[0] = tag;
        bytes[1] = (self.workchain & 0xff) as u8;
        bytes[2..34].copy_from_slice(&self.hash_part);
        let crc = CRC_16_XMODEM.checksum(&bytes[0..34]);
        bytes[34..36].copy_from_slice(&crc.to_be_bytes());
        bytes
    }
}

impl Display for TonAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_base64_url().as_str())
    }
}

impl Debug for TonAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_base64_url().as_str())
    }
}

impl FromStr for TonAddress {
    type Err = TonAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == USER_FRIENDLY_LEN {
            // Some form of base64 address, check which one
            if s.contains('-') || s.contains('_') {
                TonAddress::from_base64_url(s)
            } else {
                TonAddress::from_base64_std(s)
            }
        } else {
            TonAddress::from_hex_str(s)
        }
    }
}

impl Serialize for TonAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.to_base64_url().as_str())
    }
}

impl<'de> Deserialize<'de> for TonAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::TonAddressParseError;
    use crate::{TonAddress, TonHash};

    fn sample_hash() -> TonHash {
        hex::decode("e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76")
            .unwrap()
            .as_slice()
            .try_into()
            .unwrap()
    }

    #[test]
    fn format_works() {
        let addr = TonAddress::new(0, &sample_hash());
        assert_eq!(
            addr.to_hex(),
            "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
        );
        assert_eq!(
            addr.to_base64_url(),
            "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR"
        );
        assert_eq!(
            addr.to_base64_std(),
            "EQDk2VTvn04SUKJrW7rXahzdF8/Qi6utb0wj43InCu9vdjrR"
        );
    }

    #[test]
    fn parse_works() -> Result<(), TonAddressParseError> {
        let addr = TonAddress::new(0, &sample_hash());
        assert_eq!(
            "0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76"
                .parse::<TonAddress>()?,
            addr
        );
        assert_eq!(
            "EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR".parse::<TonAddress>()?,
            addr
        );
        assert_eq!(
            "EQDk2VTvn04SUKJrW7rXahzdF8/Qi6utb0wj43InCu9vdjrR".parse::<TonAddress>()?,
            addr
        );
        Ok(())
    }

    #[test]
    fn flags_are_reported() -> Result<(), TonAddressParseError> {
        let addr = TonAddress::new(-1, &sample_hash());
        let s = addr.to_base64_url_flags(true, true);
        assert!(s.starts_with("0f"));
        let (parsed, non_bounceable, non_production) = TonAddress::from_base64_url_flags(&s)?;
        assert_eq!(parsed, addr);
        assert!(non_bounceable);
        assert!(non_production);
        Ok(())
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(TonAddress::from_base64_url("EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrS").is_err());
        assert!(TonAddress::from_base64_url("EQDk2VTvn04").is_err());
        assert!(TonAddress::from_hex_str("0:e4d954").is_err());
        assert!(TonAddress::from_hex_str("zz:e4d954").is_err());
        assert!(TonAddress::from_hex_str("no colon").is_err());
    }

    #[test]
    fn serde_uses_url_form() -> anyhow::Result<()> {
        let addr = TonAddress::new(0, &sample_hash());
        let json = serde_json::to_string(&addr)?;
        assert_eq!(json, "\"EQDk2VTvn04SUKJrW7rXahzdF8_Qi6utb0wj43InCu9vdjrR\"");

        let value: Value = serde_json::from_str(
            "{\"addr\": \"0:e4d954ef9f4e1250a26b5bbad76a1cdd17cfd08babad6f4c23e372270aef6f76\"}",
        )?;
        let parsed: TonAddress = serde_json::from_value(value["addr"].clone())?;
        assert_eq!(parsed, addr);
        Ok(())
    }
}
