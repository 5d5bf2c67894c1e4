use crate::errors::Result;
use crate::models::price::{Interval, PricePoint};
use async_trait::async_trait;

/// Base trait for historical price sources
#[async_trait]
pub trait MarketDataClient {
    /// Short name of the provider, used in logs
    fn provider_name(&self) -> &'static str;

    /// Fetch the trailing `lookback_days` calendar days of bars for `symbol`.
    /// Points come back in ascending date order; an unknown symbol yields an
    /// empty series rather than an error.
    async fn fetch(&self, symbol: &str, lookback_days: u32, interval: Interval) -> Result<Vec<PricePoint>>;
}
