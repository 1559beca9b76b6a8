use std::{fs, path::PathBuf};

use clap::Parser;
use guild_common::{config::LedgerConfig, MemberId};
use guild_ledger::{
    finance::FinanceCalculator,
    matrix::MatrixDocument,
    notify,
    sale::Sale,
    simplify::simplify_debts,
    suggestion::{seller_suggestions, PendingSplit},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "balance_report")]
#[command(about = "Inspect a guild debt matrix: current debts, auto-balance preview and seller ranking")]
struct Cli {
    /// Matrix document (`{ "matrix": { "payer_receiver": amount } }`)
    #[arg(short, long, value_name = "FILE")]
    matrix: PathBuf,

    /// Comma-separated member list. Defaults to everyone named in the matrix.
    #[arg(long, value_delimiter = ',')]
    members: Vec<String>,

    /// Active sales (JSON array) to include in the seller ranking.
    #[arg(short, long, value_name = "FILE")]
    pending: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => LedgerConfig::load_from_file(path)?,
        None => LedgerConfig::default(),
    };
    let calculator = FinanceCalculator::new(config.finance.clone());

    let doc: MatrixDocument = serde_json::from_str(&fs::read_to_string(&cli.matrix)?)?;
    let members: Vec<MemberId> = if cli.members.is_empty() {
        doc.matrix.members().into_iter().collect()
    } else {
        cli.members.iter().map(|m| MemberId::from(m.trim())).collect()
    };
    info!("Loaded {} debts across {} members", doc.matrix.len(), members.len());

    let pending: Vec<PendingSplit> = match &cli.pending {
        Some(path) => {
            let sales: Vec<Sale> = serde_json::from_str(&fs::read_to_string(path)?)?;
            sales.iter().map(|s| PendingSplit::from_sale(s, &calculator)).collect()
        }
        None => Vec::new(),
    };

    let simplified = simplify_debts(&doc.matrix, &members, config.balance_epsilon);

    println!("📋 Current debts:");
    println!("{}", notify::format_debt_lines(&simplified.before));
    println!();
    println!("✨ After auto-balance:");
    println!("{}", notify::format_debt_lines(&simplified.after));
    println!();
    println!("📈 Suggested selling order:");
    println!("{}", notify::suggestion_strip(&seller_suggestions(&doc.matrix, &members, &pending)));

    Ok(())
}
