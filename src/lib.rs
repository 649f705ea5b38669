// Receipt Splitter - Core Library
// Accounting model and receipt loading shared by the TUI and command mode

pub mod purchase;
pub mod division;
pub mod ledger;
pub mod summary;
pub mod receipt;
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use purchase::Purchase;
pub use division::Division;
pub use ledger::Ledger;
pub use summary::{ActorSummary, LedgerSummary, LineItem};
pub use receipt::{list_receipts, load_receipt, parse_cost, parse_receipt, Receipt};
pub use config::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
