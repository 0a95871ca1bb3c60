use async_trait::async_trait;
use thiserror::Error;
use w5boc_core::TonAddress;

#[derive(Error, Debug)]
pub enum SeqnoProviderError {
    #[error("Network error ({0})")]
    Network(String),
}

/// Source of the current wallet seqno, usually a remote node.
#[async_trait]
pub trait SeqnoProvider: Send + Sync {
    async fn seqno(&self, address: &TonAddress) -> Result<u32, SeqnoProviderError>;
}

/// Returns the same seqno for any wallet.
#[derive(Debug, Clone, Copy)]
pub struct StaticSeqnoProvider {
    seqno: u32,
}

impl StaticSeqnoProvider {
    pub fn new(seqno: u32) -> Self {
        Self { seqno }
    }
}

#[async_trait]
impl SeqnoProvider for StaticSeqnoProvider {
    async fn seqno(&self, address: &TonAddress) -> Result<u32, SeqnoProviderError> {
        log::trace!("static seqno {} for {}", self.seqno, address);
        Ok(self.seqno)
    }
}
