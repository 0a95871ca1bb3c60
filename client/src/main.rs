use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use w5boc_client::assembler::MessageAssembler;
use w5boc_client::config::{AssemblerConfig, Network};
use w5boc_client::logging::init_logging;
use w5boc_client::seqno::StaticSeqnoProvider;

/// Prints a signed wallet v5r1 self-transfer as a base64 bag of cells.
#[derive(Parser, Debug)]
#[command(name = "w5boc", version, about)]
struct Args {
    /// JSON file with assembler settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use testnet instead of mainnet
    #[arg(long)]
    testnet: bool,

    /// Current wallet seqno
    #[arg(long, default_value_t = 0)]
    seqno: u32,

    /// 24 mnemonic words, read from stdin when absent
    #[arg(long, env = "W5BOC_MNEMONIC", hide_env_values = true)]
    mnemonic: Option<String>,

    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AssemblerConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AssemblerConfig::default(),
    };
    if args.testnet {
        config.network = Network::Testnet;
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    init_logging(config.level_filter()?)?;

    let mnemonic = match args.mnemonic {
        Some(words) => words,
        None => {
            let mut words = String::new();
            std::io::stdin()
                .read_to_string(&mut words)
                .context("Failed to read mnemonic from stdin")?;
            words
        }
    };
    if mnemonic.trim().is_empty() {
        bail!("Mnemonic is empty");
    }

    log::info!("assembling transfer on {}", config.network);
    let assembler = MessageAssembler::new(config, Arc::new(StaticSeqnoProvider::new(args.seqno)));
    let transfer = assembler.assemble(&mnemonic).await?;

    println!("{}", serde_json::to_string_pretty(&transfer)?);
    Ok(())
}
