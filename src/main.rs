// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Result};
use receipt_splitter::{list_receipts, load_receipt, logging, Config, LedgerSummary};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("list") => {
            logging::init_stderr();
            run_list()
        }
        Some("summary") => {
            logging::init_stderr();
            run_summary(&args[1..])
        }
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        Some("--version") | Some("-V") => {
            println!("receipt-splitter {}", receipt_splitter::VERSION);
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("Unknown command: {}", other)
        }
        None => run_ui_mode(),
    }
}

fn print_usage() {
    println!("receipt-splitter {}", receipt_splitter::VERSION);
    println!();
    println!("Usage:");
    println!("  receipt-splitter                              interactive mode");
    println!("  receipt-splitter list                         list receipts");
    println!("  receipt-splitter summary <file> [--tax] [--json]");
    println!();
    println!("Config is read from ledger.json (or $RECEIPT_SPLITTER_CONFIG).");
}

fn run_list() -> Result<()> {
    let config = Config::load()?;
    let receipts = list_receipts(&config.receipts_dir)?;

    if receipts.is_empty() {
        println!("No .csv receipts in {}", config.receipts_dir.display());
        return Ok(());
    }

    for path in receipts {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            println!("{}", name);
        }
    }
    Ok(())
}

/// Bare file names resolve against the receipts directory
fn resolve_receipt(config: &Config, arg: &str) -> PathBuf {
    let path = Path::new(arg);
    if path.exists() || path.components().count() > 1 {
        path.to_path_buf()
    } else {
        config.receipts_dir.join(path)
    }
}

fn run_summary(args: &[String]) -> Result<()> {
    let mut file = None;
    let mut apply_tax = false;
    let mut json = false;

    for arg in args {
        match arg.as_str() {
            "--tax" => apply_tax = true,
            "--json" => json = true,
            flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
            other if file.is_none() => file = Some(other.to_string()),
            other => bail!("Unexpected argument: {}", other),
        }
    }

    let Some(file) = file else {
        print_usage();
        bail!("summary needs a receipt file");
    };

    let config = Config::load()?;
    let mut receipt = load_receipt(&resolve_receipt(&config, &file), &config)?;
    if apply_tax {
        receipt.ledger.set_tax_rate(config.sales_tax);
    }

    let summary = LedgerSummary::build(&receipt.ledger, &config.default_actors);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} (opened {})", receipt.name, receipt.opened_at.format("%Y-%m-%d %H:%M"));
        println!();
        println!("{}", summary);
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    logging::init_file(Path::new(logging::LOG_FILE))?;

    let config = Config::load()?;
    let receipts = list_receipts(&config.receipts_dir)?;
    tracing::info!(
        actors = config.default_actors.len(),
        receipts = receipts.len(),
        "starting interactive mode"
    );

    let mut app = ui::App::new(config, receipts);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("Interactive mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: receipt-splitter summary <file>");
    std::process::exit(1);
}
