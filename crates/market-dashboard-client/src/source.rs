use async_trait::async_trait;
use market_dashboard_core::candle::Candle;
use market_dashboard_core::indicator::IndicatorSnapshot;
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;

use crate::error::ClientError;

/// Backend that serves indicator snapshots and price history to the panels.
#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Source name (for logging/display).
    fn name(&self) -> &str;

    /// Fetch the latest indicator snapshot for a symbol and time-frame.
    async fn fetch_indicators(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
    ) -> Result<IndicatorSnapshot, ClientError>;

    /// Fetch up to `limit` of the most recent candles, oldest first.
    async fn fetch_prices(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<Candle>, ClientError>;
}
