use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use base64_serde::base64_serde_type;
use num_bigint::BigUint;
use serde::Serialize;
use strum::{Display as StrumDisplay, IntoStaticStr};
use thiserror::Error;
use w5boc_core::mnemonic::{Mnemonic, MnemonicError};
use w5boc_core::wallet::TonWallet;
use w5boc_core::{TonAddress, TonHash};

use crate::config::AssemblerConfig;
use crate::seqno::{SeqnoProvider, SeqnoProviderError};

base64_serde_type!(Base64Standard, STANDARD);

/// Steps of one assembly, in order. Any failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, StrumDisplay, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum AssemblyStage {
    Idle,
    KeysReady,
    SigningBodyBuilt,
    Signed,
    EnvelopeBuilt,
    Serialized,
}

#[derive(Error, Debug)]
pub enum AssemblerError {
    #[error("Invalid mnemonic ({0})")]
    InvalidMnemonic(#[from] MnemonicError),

    #[error("Seqno request failed (address: {address}, error: {error})")]
    Network {
        address: TonAddress,
        error: SeqnoProviderError,
    },

    #[error("Seqno request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error (stage: {stage}, error: {message})")]
    Internal {
        stage: AssemblyStage,
        message: String,
    },
}

impl AssemblerError {
    /// Network failures may go away if the whole assembly is run again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AssemblerError::Network { .. } | AssemblerError::Timeout(_)
        )
    }
}

fn internal<E: Display>(stage: AssemblyStage) -> impl FnOnce(E) -> AssemblerError {
    move |err| AssemblerError::Internal {
        stage,
        message: err.to_string(),
    }
}

/// Result of a successful assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedTransfer {
    pub address: TonAddress,
    #[serde(skip)]
    pub seqno: u32,
    #[serde(with = "Base64Standard")]
    pub boc: Vec<u8>,
    #[serde(skip)]
    pub signing_hash: TonHash,
    #[serde(skip)]
    pub signature: Vec<u8>,
}

impl SignedTransfer {
    pub fn boc_base64(&self) -> String {
        STANDARD.encode(&self.boc)
    }
}

/// Builds a signed external message asking a deployed v5r1 wallet to send
/// `amount` nanotons to itself.
#[derive(Clone)]
pub struct MessageAssembler {
    config: AssemblerConfig,
    seqno_provider: Arc<dyn SeqnoProvider>,
}

impl MessageAssembler {
    pub fn new(config: AssemblerConfig, seqno_provider: Arc<dyn SeqnoProvider>) -> Self {
        Self {
            config,
            seqno_provider,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub async fn assemble(&self, mnemonic: &str) -> Result<SignedTransfer, AssemblerError> {
        log::debug!("assembly stage: {}", AssemblyStage::Idle);

        let key_pair = Mnemonic::from_str(mnemonic, &None)?.to_key_pair()?;
        let wallet_id = self
            .config
            .wallet_id()
            .map_err(internal(AssemblyStage::KeysReady))?;
        let wallet =
            TonWallet::new(key_pair, wallet_id).map_err(internal(AssemblyStage::KeysReady))?;
        log::debug!(
            "assembly stage: {} (wallet: {})",
            AssemblyStage::KeysReady,
            wallet.address
        );

        // the only suspension point, nothing is signed before it completes
        let seqno = self.fetch_seqno(&wallet.address).await?;

        let stage = AssemblyStage::SigningBodyBuilt;
        let transfer = wallet
            .create_transfer(
                &wallet.address,
                BigUint::from(self.config.amount),
                self.config.bounce,
            )
            .map_err(internal(stage))?;
        let body = wallet
            .create_signing_body(
                self.config.valid_until,
                seqno,
                self.config.send_mode(),
                [transfer.to_arc()],
            )
            .map_err(internal(stage))?;
        let signing_hash = body.cell_hash();
        log::debug!("assembly stage: {} (seqno: {})", stage, seqno);
        log::trace!("signing hash {}", hex::encode(signing_hash));

        let stage = AssemblyStage::Signed;
        let signature = wallet.sign(&signing_hash).map_err(internal(stage))?;
        log::debug!("assembly stage: {}", stage);

        let stage = AssemblyStage::EnvelopeBuilt;
        let signed_body =
            TonWallet::append_signature(&body, &signature).map_err(internal(stage))?;
        let envelope = wallet
            .wrap_signed_body(signed_body, false)
            .map_err(internal(stage))?;
        log::debug!("assembly stage: {}", stage);

        let stage = AssemblyStage::Serialized;
        let boc = envelope
            .to_boc(self.config.with_crc32)
            .map_err(internal(stage))?;
        log::debug!("assembly stage: {}", stage);
        log::trace!("boc size {} bytes", boc.len());

        Ok(SignedTransfer {
            address: wallet.address,
            seqno,
            boc,
            signing_hash,
            signature,
        })
    }

    async fn fetch_seqno(&self, address: &TonAddress) -> Result<u32, AssemblerError> {
        let timeout = self.config.seqno_timeout();
        match tokio::time::timeout(timeout, self.seqno_provider.seqno(address)).await {
            Ok(Ok(seqno)) => Ok(seqno),
            Ok(Err(error)) => {
                log::warn!("seqno request for {} failed: {}", address, error);
                Err(AssemblerError::Network {
                    address: address.clone(),
                    error,
                })
            }
            Err(_) => {
                log::warn!("seqno request for {} timed out after {:?}", address, timeout);
                Err(AssemblerError::Timeout(timeout))
            }
        }
    }
}
