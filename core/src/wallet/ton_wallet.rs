use nacl::sign::signature;
use num_bigint::BigUint;

use crate::cell::{ArcCell, Cell, CellBuilder, TonCellError, EMPTY_ARC_CELL};
use crate::message::{SendMode, TonMessageError};
use crate::mnemonic::KeyPair;
use crate::tlb_types::block::message::{CommonMsgInfo, ExtInMsgInfo, IntMsgInfo, Message};
use crate::tlb_types::block::state_init::StateInit;
use crate::tlb_types::traits::TLBObject;
use crate::types::{TonAddress, TonHash, TON_HASH_BYTES};
use crate::wallet::v5::{WalletDataV5, WalletExtMsgBodyV5, MAX_MSGS_V5R1, SIGNATURE_LEN};
use crate::wallet::wallet_code::wallet_v5r1_code;
use crate::wallet::wallet_id::WalletIdV5R1;

/// Wallet v5r1 bound to a key pair.
///
/// Builds the messages of one transfer step by step: internal message,
/// signing body, signed body and external envelope.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct TonWallet {
    pub key_pair: KeyPair,
    pub address: TonAddress,
    pub wallet_id: WalletIdV5R1,
}

impl TonWallet {
    pub fn new(key_pair: KeyPair, wallet_id: WalletIdV5R1) -> Result<TonWallet, TonMessageError> {
        let public_key = public_key_hash(&key_pair)?;
        let data = WalletDataV5::new(wallet_id.to_i32(), public_key).to_cell()?.to_arc();
        let address = TonAddress::derive(wallet_id.workchain as i32, wallet_v5r1_code()?, &data)?;
        log::trace!("wallet v5r1 {} with id {}", address, wallet_id);

        Ok(TonWallet {
            key_pair,
            address,
            wallet_id,
        })
    }

    /// Initial data of the wallet contract, seqno 0.
    pub fn initial_data(&self) -> Result<ArcCell, TonMessageError> {
        let public_key = public_key_hash(&self.key_pair)?;
        let data = WalletDataV5::new(self.wallet_id.to_i32(), public_key).to_cell()?;
        Ok(data.to_arc())
    }

    pub fn state_init(&self) -> Result<StateInit, TonMessageError> {
        Ok(StateInit::new(
            wallet_v5r1_code()?.clone(),
            self.initial_data()?,
        ))
    }

    /// Internal message with an empty body carrying `amount` nanotons to `dest`.
    pub fn create_transfer(
        &self,
        dest: &TonAddress,
        amount: BigUint,
        bounce: bool,
    ) -> Result<Cell, TonCellError> {
        let info = IntMsgInfo::new(dest.clone(), amount, bounce);
        Message::new(CommonMsgInfo::Int(info), EMPTY_ARC_CELL.clone()).to_cell()
    }

    pub fn create_external_msg<T: AsRef<[ArcCell]>>(
        &self,
        valid_until: u32,
        seqno: u32,
        send_mode: SendMode,
        add_state_init: bool,
        internal_msgs: T,
    ) -> Result<Cell, TonMessageError> {
        let body = self.create_signing_body(valid_until, seqno, send_mode, internal_msgs)?;
        let signed = self.sign_external_body(&body)?;
        self.wrap_signed_body(signed, add_state_init)
    }

    /// The cell whose hash the owner signs.
    pub fn create_signing_body<T: AsRef<[ArcCell]>>(
        &self,
        valid_until: u32,
        seqno: u32,
        send_mode: SendMode,
        internal_msgs: T,
    ) -> Result<Cell, TonMessageError> {
        let msgs = internal_msgs.as_ref();
        if msgs.len() > MAX_MSGS_V5R1 {
            return Err(TonMessageError::TooManyActions {
                count: msgs.len(),
                max: MAX_MSGS_V5R1,
            });
        }
        let body = WalletExtMsgBodyV5 {
            wallet_id: self.wallet_id.to_i32(),
            valid_until,
            msg_seqno: seqno,
            msgs_modes: vec![send_mode.bits(); msgs.len()],
            msgs: msgs.to_vec(),
        };
        Ok(body.to_cell()?)
    }

    /// Ed25519 signature of `hash` with the wallet secret key.
    pub fn sign(&self, hash: &TonHash) -> Result<Vec<u8>, TonMessageError> {
        signature(hash.as_slice(), self.key_pair.secret_key.as_slice())
            .map_err(|err| TonMessageError::NaclCryptographicError(err.message))
    }

    /// Signs `external_body` and appends the signature after its bits and references.
    pub fn sign_external_body(&self, external_body: &Cell) -> Result<Cell, TonMessageError> {
        let sign = self.sign(&external_body.cell_hash())?;
        Ok(Self::append_signature(external_body, &sign)?)
    }

    pub fn append_signature(external_body: &Cell, signature: &[u8]) -> Result<Cell, TonCellError> {
        if signature.len() != SIGNATURE_LEN {
            return Err(TonCellError::InvalidInput(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                signature.len()
            )));
        }
        let mut builder = CellBuilder::new();
        builder.store_cell(external_body)?.store_slice(signature)?;
        builder.build()
    }

    pub fn wrap_signed_body(
        &self,
        signed_body: Cell,
        add_state_init: bool,
    ) -> Result<Cell, TonMessageError> {
        let msg_info = CommonMsgInfo::ExtIn(ExtInMsgInfo::new(self.address.clone()));
        let mut message = Message::new(msg_info, signed_body.to_arc());
        if add_state_init {
            message.with_state_init(self.state_init()?);
        }
        Ok(message.to_cell()?)
    }
}

fn public_key_hash(key_pair: &KeyPair) -> Result<TonHash, TonMessageError> {
    TonHash::try_from(key_pair.public_key.as_slice()).map_err(|_| {
        TonMessageError::InvalidKeyPair(format!(
            "public key must be {} bytes, got {}",
            TON_HASH_BYTES,
            key_pair.public_key.len()
        ))
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use num_bigint::BigUint;

    use super::*;
    use crate::mnemonic::Mnemonic;
    use crate::wallet::v5::WalletSignedExtMsgBodyV5;

    const MNEMONIC_STR_V5: &str = "section garden tomato dinner season dice renew length useful spin trade intact use universe what post spike keen mandate behind concert egg doll rug";

    const TESTNET_BOC_SEQNO_0: &str = "te6cckEBBAEAtAAB5YgAf9Pw6NIgSB9z6mGvgKY+J35BKYbRJoP5qmfaRWGZvbIDm0s7c////+/////4AAAABR5436PNQPVDD6Ejjv+jRVzQ6tETBk3xZBCxITcAs3ImsraKhAqJqqxsRyQiHmsgPRu0ODHxBQv/0DpqbmEB3hUBAgoOw8htAwIDAAAAYmIAH/T8OjSIEgfc+phr4CmPid+QSmG0SaD+apn2kVhmb2yICAAAAAAAAAAAAAAAAACAZEqt";
    const TESTNET_BOC_SEQNO_1: &str = "te6cckEBBAEAtAAB5YgAf9Pw6NIgSB9z6mGvgKY+J35BKYbRJoP5qmfaRWGZvbIDm0s7c////+/////4AAAADTXj5fHcfFXrE5Vw9PLCZWjWQ8T/l04TK1+RtMRZQuDoDzaWrmem9GdiiACAdkPYbf0FwcSNA3WCwrJdiLaDrhsBAgoOw8htAwIDAAAAYmIAH/T8OjSIEgfc+phr4CmPid+QSmG0SaD+apn2kVhmb2yICAAAAAAAAAAAAAAAAADBBJpn";

    fn make_keypair(mnemonic_str: &str) -> KeyPair {
        let mnemonic = Mnemonic::from_str(mnemonic_str, &None).unwrap();
        mnemonic.to_key_pair().unwrap()
    }

    fn self_transfer(wallet: &TonWallet) -> anyhow::Result<ArcCell> {
        Ok(wallet
            .create_transfer(&wallet.address, BigUint::from(1u32), true)?
            .to_arc())
    }

    const MODE: SendMode = SendMode::from_bits(3);

    #[test]
    fn wallet_addresses() -> anyhow::Result<()> {
        let key_pair = make_keypair(MNEMONIC_STR_V5);
        assert_eq!(
            hex::encode(&key_pair.public_key),
            "51ea5faa862652172a969254f03f457e305a120564b2b6fbb7b4215fb35e2002"
        );

        let mainnet = TonWallet::new(key_pair.clone(), WalletIdV5R1::mainnet())?;
        assert_eq!(
            mainnet.address,
            TonAddress::from_str("UQDv2YSmlrlLH3hLNOVxC8FcQf4F9eGNs4vb2zKma4txo6i3")?
        );
        assert_eq!(
            mainnet.address.to_base64_url(),
            "EQDv2YSmlrlLH3hLNOVxC8FcQf4F9eGNs4vb2zKma4txo_Vy"
        );

        let testnet = TonWallet::new(key_pair, WalletIdV5R1::testnet())?;
        assert_eq!(
            testnet.address.to_hex(),
            "0:3fe9f8746910240fb9f530d7c0531f13bf2094c3689341fcd533ed22b0ccded9"
        );
        assert_eq!(
            testnet.address.to_base64_url(),
            "EQA_6fh0aRAkD7n1MNfAUx8TvyCUw2iTQfzVM-0isMze2U-C"
        );
        Ok(())
    }

    #[test]
    fn signing_body_hash_fixtures() -> anyhow::Result<()> {
        let mainnet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::mainnet())?;
        let msg = self_transfer(&mainnet)?;
        let body = mainnet.create_signing_body(u32::MAX, 0, MODE, [msg])?;
        assert_eq!(
            body.cell_hash_hex(),
            "50ca0658ac270e8b0d3eb3c0efefec7b4a3f2b4e7958f9e9a229d92f7079590d"
        );

        let testnet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::testnet())?;
        let msg = self_transfer(&testnet)?;
        let body_0 = testnet.create_signing_body(u32::MAX, 0, MODE, [msg.clone()])?;
        let body_1 = testnet.create_signing_body(u32::MAX, 1, MODE, [msg])?;
        assert_eq!(
            body_0.cell_hash_hex(),
            "e91fede97dafa9d2f060764a2750e6333de5fb2e15770ef25c418acd86b19bc7"
        );
        assert_eq!(
            body_1.cell_hash_hex(),
            "ccfefc3bc9af310c31dc2a7886d860b4ed49ecaff1585bf72e2a02efe199846f"
        );
        Ok(())
    }

    #[test]
    fn signature_fixture() -> anyhow::Result<()> {
        let wallet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::testnet())?;
        let body = wallet.create_signing_body(u32::MAX, 0, MODE, [self_transfer(&wallet)?])?;
        let sign = wallet.sign(&body.cell_hash())?;
        assert_eq!(
            hex::encode(&sign),
            "8f3c6fd1e6a07aa187d091c77fd1a2ae687568898326f8b20858909b8059b913595b45420544d556362392110f35901e8dda1c18f88285ffe81d35373080ef0a"
        );

        let public_key: [u8; 32] = wallet.key_pair.public_key.as_slice().try_into()?;
        let verifying_key = VerifyingKey::from_bytes(&public_key)?;
        verifying_key.verify(&body.cell_hash(), &Signature::from_slice(&sign)?)?;
        Ok(())
    }

    #[test]
    fn signed_body_carries_signature_after_body() -> anyhow::Result<()> {
        let wallet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::testnet())?;
        let body = wallet.create_signing_body(u32::MAX, 3, MODE, [self_transfer(&wallet)?])?;
        let signed = wallet.sign_external_body(&body)?;

        assert_eq!(signed.bit_len(), body.bit_len() + 512);
        assert_eq!(signed.references(), body.references());

        let parsed = WalletSignedExtMsgBodyV5::from_cell(&signed)?;
        assert_eq!(parsed.body, WalletExtMsgBodyV5::from_cell(&body)?);
        assert_eq!(parsed.signature, wallet.sign(&body.cell_hash())?);
        Ok(())
    }

    #[test]
    fn external_msg_boc_fixtures() -> anyhow::Result<()> {
        let wallet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::testnet())?;
        let msg = self_transfer(&wallet)?;

        let ext_msg = wallet.create_external_msg(u32::MAX, 0, MODE, false, [msg.clone()])?;
        assert_eq!(ext_msg.bit_len(), 919);
        assert_eq!(ext_msg.references().len(), 1);
        assert_eq!(ext_msg.to_boc_b64(true)?, TESTNET_BOC_SEQNO_0);

        let ext_msg = wallet.create_external_msg(u32::MAX, 1, MODE, false, [msg])?;
        assert_eq!(ext_msg.to_boc_b64(true)?, TESTNET_BOC_SEQNO_1);
        Ok(())
    }

    #[test]
    fn external_msg_with_state_init() -> anyhow::Result<()> {
        let wallet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::mainnet())?;
        let ext_msg =
            wallet.create_external_msg(u32::MAX, 0, MODE, true, [self_transfer(&wallet)?])?;
        let message = Message::from_cell(&ext_msg)?;

        let state_init = message.init.clone().unwrap();
        assert_eq!(state_init, wallet.state_init()?);
        assert_eq!(state_init.cell_hash()?, wallet.address.hash_part);
        assert_eq!(
            message.info,
            CommonMsgInfo::ExtIn(ExtInMsgInfo::new(wallet.address.clone()))
        );
        Ok(())
    }

    #[test]
    fn append_signature_checks_length() -> anyhow::Result<()> {
        let body = CellBuilder::new().store_u32(32, 1)?.build()?;
        assert!(TonWallet::append_signature(&body, &[0; 63]).is_err());
        let signed = TonWallet::append_signature(&body, &[0xFF; 64])?;
        assert_eq!(signed.bit_len(), 32 + 512);
        Ok(())
    }

    #[test]
    fn too_many_actions() -> anyhow::Result<()> {
        let wallet = TonWallet::new(make_keypair(MNEMONIC_STR_V5), WalletIdV5R1::mainnet())?;
        let msgs = vec![EMPTY_ARC_CELL.clone(); MAX_MSGS_V5R1 + 1];
        assert!(matches!(
            wallet.create_signing_body(u32::MAX, 0, MODE, msgs),
            Err(TonMessageError::TooManyActions { count: 256, .. })
        ));
        Ok(())
    }

    #[test]
    fn invalid_public_key() {
        let key_pair = KeyPair {
            public_key: vec![1, 2, 3],
            secret_key: vec![4, 5, 6],
        };
        assert!(matches!(
            TonWallet::new(key_pair, WalletIdV5R1::mainnet()),
            Err(TonMessageError::InvalidKeyPair(_))
        ));
    }

    #[test]
    fn ton_wallet_debug() -> anyhow::Result<()> {
        let wallet = TonWallet {
            key_pair: KeyPair {
                public_key: vec![1, 2, 3],
                secret_key: vec![4, 5, 6],
            },
            address: TonAddress::from_str("EQDv2YSmlrlLH3hLNOVxC8FcQf4F9eGNs4vb2zKma4txo_Vy")?,
            wallet_id: WalletIdV5R1::mainnet(),
        };

        let debug_output = format!("{:?}", wallet);
        assert!(debug_output.contains("secret_key: \"***REDACTED***\""));
        assert!(!debug_output.contains("[4, 5, 6]"));
        Ok(())
    }
}
