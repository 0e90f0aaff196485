//! Core type definitions shared by the gate, the ledger and the engine.

pub mod decision;
pub mod market_data;
pub mod order;
pub mod timestamp;

pub use decision::*;
pub use market_data::*;
pub use order::*;
pub use timestamp::*;
