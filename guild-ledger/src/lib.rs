pub mod finance;
pub mod history;
pub mod matrix;
pub mod notify;
pub mod policy;
pub mod sale;
pub mod service;
pub mod settlement;
pub mod simplify;
pub mod store;
pub mod suggestion;

pub use finance::{ExchangeType, FinanceBreakdown, FinanceCalculator};
pub use matrix::DebtMatrix;
pub use service::LedgerService;
