//! # sentinel-ledger
//!
//! Position and P&L ledger. Consumes only orders the risk gate approved,
//! moves cash between the free balance and open positions, and appends an
//! immutable [`Trade`] record for every execution.

pub mod ledger;
pub mod position;
pub mod trade;

pub use ledger::{Ledger, LedgerError, PortfolioSummary};
pub use position::Position;
pub use trade::Trade;
