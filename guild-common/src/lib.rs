pub mod audit;
pub mod config;
pub mod error;
pub mod identity;
pub mod utils;

pub use error::{LedgerError, Result};
pub use identity::{Identity, MemberId, Role};

/// Monetary amount in game currency.
///
/// Prices are whole numbers in practice, but tax and manual edits can carry
/// fractions, so the ledger keeps everything in `f64` and compares with a
/// tolerance where it matters.
pub type Amount = f64;
