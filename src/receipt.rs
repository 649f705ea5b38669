// 📂 Receipt loader - CSV receipts into a Ledger
// Format (no header): item,cost[,quantity]

use crate::config::Config;
use crate::ledger::Ledger;
use crate::purchase::Purchase;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Receipt - a loaded CSV file and the ledger built from it
#[derive(Debug, Clone)]
pub struct Receipt {
    pub name: String,
    pub path: PathBuf,
    pub opened_at: DateTime<Utc>,
    pub ledger: Ledger,
}

/// List `.csv` files in `dir`, sorted by file name
///
/// A missing directory is not an error, it just has no receipts.
pub fn list_receipts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "receipts directory missing");
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read receipts directory: {}", dir.display()))?;

    let mut receipts = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv && path.is_file() {
            receipts.push(path);
        }
    }

    receipts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(receipts)
}

/// Load a receipt file, auto-subscribing default actors to shared items
pub fn load_receipt(path: &Path, config: &Config) -> Result<Receipt> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv")
        .to_string();

    let ledger = parse_receipt(file, &name, config)?;
    info!(
        receipt = %name,
        purchases = ledger.len(),
        "loaded receipt"
    );

    Ok(Receipt {
        name,
        path: path.to_path_buf(),
        opened_at: Utc::now(),
        ledger,
    })
}

/// Build a ledger from CSV rows; `source` names the input in errors
pub fn parse_receipt<R: Read>(reader: R, source: &str, config: &Config) -> Result<Ledger> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut ledger = Ledger::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(0);
                return Err(err).with_context(|| {
                    format!("Failed to parse CSV line {} in {}", line, source)
                });
            }
        };

        // Physical line where the record starts (blank lines and quoted newlines count)
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let purchase = parse_row(&record)
            .with_context(|| format!("Invalid row on line {} in {}", line, source))?;

        let shared = config.is_shared_item(&purchase.item);
        let id = ledger.add_purchase(purchase);

        if shared {
            if let Some(division) = ledger.division_mut(id) {
                for actor in &config.default_actors {
                    division.subscribe(actor);
                }
            }
        }
    }

    Ok(ledger)
}

fn parse_row(record: &StringRecord) -> Result<Purchase> {
    let item = record.get(0).ok_or_else(|| anyhow!("missing item"))?;
    let cost = record
        .get(1)
        .ok_or_else(|| anyhow!("missing cost for {:?}", item))?;
    let cost = parse_cost(cost)?;

    let quantity = match record.get(2) {
        Some(q) if !q.is_empty() => q
            .parse::<u32>()
            .with_context(|| format!("Invalid quantity: {:?}", q))?,
        _ => 1,
    };

    Ok(Purchase::new(item, cost, quantity, false))
}

/// Accepts "4.99" and "$4.99"
pub fn parse_cost(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let cost: f64 = digits
        .parse()
        .with_context(|| format!("Invalid cost: {:?}", raw))?;
    if !cost.is_finite() {
        return Err(anyhow!("Invalid cost: {:?}", raw));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_json(
            r#"{ "default_actors": ["alice", "bob"], "shared_items": ["Milk"] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_rows_with_default_quantity() {
        let csv = "bread,2.50\nmilk,3.00,2\neggs,4.00,\n";
        let ledger = parse_receipt(csv.as_bytes(), "test.csv", &config()).unwrap();

        assert_eq!(ledger.len(), 3);
        let bread = ledger.purchase(0).unwrap();
        assert_eq!(bread.item, "bread");
        assert_eq!(bread.quantity, 1);
        assert!(!bread.taxed);
        assert_eq!(ledger.purchase(1).unwrap().quantity, 2);
        assert_eq!(ledger.purchase(2).unwrap().quantity, 1);
        assert!((ledger.total() - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_shared_items_auto_subscribed() {
        let csv = "MILK,3.00\nbread,2.00\n";
        let ledger = parse_receipt(csv.as_bytes(), "test.csv", &config()).unwrap();

        let milk = ledger.division_at(0).unwrap();
        assert!(milk.is_subscribed("alice"));
        assert!(milk.is_subscribed("bob"));
        assert!(ledger.division_at(1).unwrap().is_empty());
        assert!((ledger.percent_paid() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_quoted_item_with_comma() {
        let csv = "\"chips, salted\",$1.25,4\n";
        let ledger = parse_receipt(csv.as_bytes(), "test.csv", &config()).unwrap();
        let chips = ledger.purchase(0).unwrap();
        assert_eq!(chips.item, "chips, salted");
        assert_eq!(chips.cost, 1.25);
        assert_eq!(chips.quantity, 4);
    }

    #[test]
    fn test_bad_cost_reports_line() {
        let csv = "bread,2.50\nmilk,cheap\n";
        let err = parse_receipt(csv.as_bytes(), "test.csv", &config()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 2"));
        assert!(message.contains("test.csv"));
    }

    #[test]
    fn test_error_line_counts_blank_lines() {
        let csv = "bread,2.50\n\nmilk,cheap\n";
        let err = parse_receipt(csv.as_bytes(), "r.csv", &config()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 3 in r.csv"), "{}", message);
    }

    #[test]
    fn test_error_line_after_multiline_item() {
        let csv = "\"multi\nline\",1.00\nmilk,cheap\n";
        let err = parse_receipt(csv.as_bytes(), "r.csv", &config()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("line 3 in r.csv"), "{}", message);
    }

    #[test]
    fn test_missing_cost_is_error() {
        let csv = "bread\n";
        assert!(parse_receipt(csv.as_bytes(), "test.csv", &config()).is_err());
    }

    #[test]
    fn test_negative_quantity_is_error() {
        let csv = "bread,1.00,-2\n";
        assert!(parse_receipt(csv.as_bytes(), "test.csv", &config()).is_err());
    }

    #[test]
    fn test_parse_cost() {
        assert_eq!(parse_cost("4.99").unwrap(), 4.99);
        assert_eq!(parse_cost(" $10 ").unwrap(), 10.0);
        assert!(parse_cost("ten").is_err());
        assert!(parse_cost("inf").is_err());
    }

    #[test]
    fn test_list_and_load_receipts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "soap,4.00\n").unwrap();
        fs::write(dir.path().join("a.csv"), "milk,3.00,2\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a receipt").unwrap();

        let receipts = list_receipts(dir.path()).unwrap();
        let names: Vec<_> = receipts
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv"]);

        let receipt = load_receipt(&receipts[0], &config()).unwrap();
        assert_eq!(receipt.name, "a.csv");
        assert_eq!(receipt.ledger.len(), 1);
        assert!((receipt.ledger.actor_total("bob") - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_receipts_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let receipts = list_receipts(&dir.path().join("nope")).unwrap();
        assert!(receipts.is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_receipt(&dir.path().join("gone.csv"), &config()).is_err());
    }
}
