use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use async_trait::async_trait;
use log::LevelFilter;
use w5boc_client::assembler::MessageAssembler;
use w5boc_client::config::{AssemblerConfig, Network};
use w5boc_client::logging;
use w5boc_client::seqno::{SeqnoProvider, SeqnoProviderError};
use w5boc_core::TonAddress;

#[allow(dead_code)]
pub const MNEMONIC: &str = "section garden tomato dinner season dice renew length useful spin trade intact use universe what post spike keen mandate behind concert egg doll rug";

#[allow(dead_code)]
static LOG: Once = Once::new();

#[allow(dead_code)]
pub fn init_logging() {
    LOG.call_once(|| {
        if let Err(err) = logging::init_logging(LevelFilter::Debug) {
            eprintln!("logging is not initialised: {err}");
        }
    })
}

/// Fixed seqno, counts requests.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingSeqnoProvider {
    pub seqno: u32,
    pub calls: AtomicUsize,
}

#[async_trait]
impl SeqnoProvider for CountingSeqnoProvider {
    async fn seqno(&self, _address: &TonAddress) -> Result<u32, SeqnoProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.seqno)
    }
}

/// Never answers.
#[allow(dead_code)]
pub struct PendingSeqnoProvider;

#[async_trait]
impl SeqnoProvider for PendingSeqnoProvider {
    async fn seqno(&self, _address: &TonAddress) -> Result<u32, SeqnoProviderError> {
        std::future::pending().await
    }
}

#[allow(dead_code)]
pub struct FailingSeqnoProvider;

#[async_trait]
impl SeqnoProvider for FailingSeqnoProvider {
    async fn seqno(&self, _address: &TonAddress) -> Result<u32, SeqnoProviderError> {
        Err(SeqnoProviderError::Network("connection refused".to_string()))
    }
}

#[allow(dead_code)]
pub fn testnet_config() -> AssemblerConfig {
    AssemblerConfig {
        network: Network::Testnet,
        ..Default::default()
    }
}

#[allow(dead_code)]
pub fn new_assembler<P: SeqnoProvider + 'static>(
    config: AssemblerConfig,
    provider: P,
) -> (MessageAssembler, Arc<P>) {
    let provider = Arc::new(provider);
    (MessageAssembler::new(config, provider.clone()), provider)
}
