use std::sync::atomic::Ordering;
use std::time::Duration;

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tokio_test::assert_ok;
use w5boc_client::assembler::AssemblerError;
use w5boc_client::config::AssemblerConfig;
use w5boc_core::cell::BagOfCells;
use w5boc_core::mnemonic::Mnemonic;
use w5boc_core::tlb_types::block::message::{CommonMsgInfo, Message};
use w5boc_core::tlb_types::traits::TLBObject;
use w5boc_core::wallet::WalletSignedExtMsgBodyV5;

mod common;

use common::*;

const TESTNET_BOC_SEQNO_0: &str = "te6cckEBBAEAtAAB5YgAf9Pw6NIgSB9z6mGvgKY+J35BKYbRJoP5qmfaRWGZvbIDm0s7c////+/////4AAAABR5436PNQPVDD6Ejjv+jRVzQ6tETBk3xZBCxITcAs3ImsraKhAqJqqxsRyQiHmsgPRu0ODHxBQv/0DpqbmEB3hUBAgoOw8htAwIDAAAAYmIAH/T8OjSIEgfc+phr4CmPid+QSmG0SaD+apn2kVhmb2yICAAAAAAAAAAAAAAAAACAZEqt";

#[tokio::test]
async fn test_testnet_transfer_fixture() -> anyhow::Result<()> {
    init_logging();
    let (assembler, provider) = new_assembler(testnet_config(), CountingSeqnoProvider::default());

    let transfer = assert_ok!(assembler.assemble(MNEMONIC).await);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        transfer.address.to_base64_url(),
        "EQA_6fh0aRAkD7n1MNfAUx8TvyCUw2iTQfzVM-0isMze2U-C"
    );
    assert_eq!(transfer.seqno, 0);
    assert_eq!(
        hex::encode(transfer.signing_hash),
        "e91fede97dafa9d2f060764a2750e6333de5fb2e15770ef25c418acd86b19bc7"
    );
    assert_eq!(transfer.boc_base64(), TESTNET_BOC_SEQNO_0);
    Ok(())
}

#[tokio::test]
async fn test_signature_verifies_against_public_key() -> anyhow::Result<()> {
    init_logging();
    let (assembler, _) = new_assembler(testnet_config(), CountingSeqnoProvider::default());
    let transfer = assembler.assemble(MNEMONIC).await?;

    let key_pair = Mnemonic::from_str(MNEMONIC, &None)?.to_key_pair()?;
    let public_key: [u8; 32] = key_pair.public_key.as_slice().try_into()?;
    let verifying_key = VerifyingKey::from_bytes(&public_key)?;
    let signature = Signature::from_slice(&transfer.signature)?;
    verifying_key.verify(&transfer.signing_hash, &signature)?;

    // the envelope carries the same signature right after the signing body
    let root = BagOfCells::parse(&transfer.boc)?.into_single_root()?;
    let message = Message::from_cell(&root)?;
    assert!(matches!(message.info, CommonMsgInfo::ExtIn(_)));
    assert!(message.init.is_none());
    let signed = WalletSignedExtMsgBodyV5::from_cell(&message.body)?;
    assert_eq!(signed.signature, transfer.signature);
    assert_eq!(signed.body.msg_seqno, 0);
    assert_eq!(signed.body.msgs_modes, vec![3]);
    Ok(())
}

#[tokio::test]
async fn test_seqno_changes_hash_and_signature() -> anyhow::Result<()> {
    let (assembler_0, _) = new_assembler(testnet_config(), CountingSeqnoProvider::default());
    let (assembler_1, _) = new_assembler(
        testnet_config(),
        CountingSeqnoProvider {
            seqno: 1,
            ..Default::default()
        },
    );

    let transfer_0 = assembler_0.assemble(MNEMONIC).await?;
    let transfer_1 = assembler_1.assemble(MNEMONIC).await?;
    assert_eq!(transfer_1.seqno, 1);
    assert_eq!(
        hex::encode(transfer_1.signing_hash),
        "ccfefc3bc9af310c31dc2a7886d860b4ed49ecaff1585bf72e2a02efe199846f"
    );
    assert_ne!(transfer_0.signing_hash, transfer_1.signing_hash);
    assert_ne!(transfer_0.signature, transfer_1.signature);
    assert_eq!(transfer_0.address, transfer_1.address);
    Ok(())
}

#[tokio::test]
async fn test_mainnet_defaults() -> anyhow::Result<()> {
    let (assembler, _) = new_assembler(
        AssemblerConfig::default(),
        CountingSeqnoProvider::default(),
    );
    let transfer = assembler.assemble(MNEMONIC).await?;
    assert_eq!(
        transfer.address.to_string(),
        "EQDv2YSmlrlLH3hLNOVxC8FcQf4F9eGNs4vb2zKma4txo_Vy"
    );
    assert_eq!(
        hex::encode(transfer.signing_hash),
        "50ca0658ac270e8b0d3eb3c0efefec7b4a3f2b4e7958f9e9a229d92f7079590d"
    );
    assert!(transfer.boc_base64().starts_with("te6cck"));

    let json: serde_json::Value = serde_json::from_str(&serde_json::to_string(&transfer)?)?;
    assert_eq!(json["address"], "EQDv2YSmlrlLH3hLNOVxC8FcQf4F9eGNs4vb2zKma4txo_Vy");
    assert_eq!(json["boc"], transfer.boc_base64());
    assert_eq!(json.as_object().map(|o| o.len()), Some(2));
    Ok(())
}

#[tokio::test]
async fn test_without_crc32() -> anyhow::Result<()> {
    let config = AssemblerConfig {
        with_crc32: false,
        ..testnet_config()
    };
    let (assembler, _) = new_assembler(config, CountingSeqnoProvider::default());
    let transfer = assembler.assemble(MNEMONIC).await?;
    assert_eq!(transfer.boc[4], 0x01);
    let root = BagOfCells::parse(&transfer.boc)?.into_single_root()?;
    let with_crc = BagOfCells::parse_base64(TESTNET_BOC_SEQNO_0)?.into_single_root()?;
    assert_eq!(root.cell_hash(), with_crc.cell_hash());
    Ok(())
}

#[tokio::test]
async fn test_wrong_word_count_skips_seqno_request() {
    let (assembler, provider) = new_assembler(testnet_config(), CountingSeqnoProvider::default());
    let words: Vec<&str> = MNEMONIC.split(' ').collect();

    let short = words[..23].join(" ");
    let result = assembler.assemble(&short).await;
    assert!(matches!(result, Err(AssemblerError::InvalidMnemonic(_))));

    let long = format!("{} rug", MNEMONIC);
    let result = assembler.assemble(&long).await;
    assert!(matches!(result, Err(AssemblerError::InvalidMnemonic(_))));

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_seqno_timeout_aborts() {
    let config = AssemblerConfig {
        seqno_timeout_ms: 50,
        ..testnet_config()
    };
    let (assembler, _) = new_assembler(config, PendingSeqnoProvider);

    let result = assembler.assemble(MNEMONIC).await;
    match result {
        Err(err @ AssemblerError::Timeout(_)) => {
            assert!(err.is_retryable());
            assert!(matches!(err, AssemblerError::Timeout(d) if d == Duration::from_millis(50)));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_seqno_failure_is_network_error() {
    let (assembler, _) = new_assembler(testnet_config(), FailingSeqnoProvider);

    let err = assembler.assemble(MNEMONIC).await.unwrap_err();
    assert!(err.is_retryable());
    match err {
        AssemblerError::Network { address, .. } => assert_eq!(
            address.to_base64_url(),
            "EQA_6fh0aRAkD7n1MNfAUx8TvyCUw2iTQfzVM-0isMze2U-C"
        ),
        other => panic!("expected network error, got {:?}", other),
    }
}
