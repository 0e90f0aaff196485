//! Individual risk check implementations.

pub mod active_positions;
pub mod confidence;
pub mod leverage;
pub mod position_size;

pub use active_positions::MaxActivePositionsCheck;
pub use confidence::MinConfidenceCheck;
pub use leverage::MaxLeverageCheck;
pub use position_size::MaxPositionSizeCheck;

/// A 100-unit buy at 10 % of a 1 000 NAV, passing every default limit.
#[cfg(test)]
pub(crate) fn test_order(side: sentinel_core::types::Side) -> sentinel_core::types::OrderRequest {
    use sentinel_core::types::*;
    OrderRequest {
        strategy_id: StrategyId::new("test"),
        symbol: Symbol::new("BTC/USDT"),
        side,
        quantity: 100.0,
        price: 50_000.0,
        leverage: 1.0,
        confidence: 0.8,
        nav: 1_000.0,
        existing_position_value: 0.0,
        open_positions: 0,
        timestamp: Timestamp::now(),
    }
}
