use crate::chart::{ChartRenderer, ChartStyle};
use crate::config::Config;
use crate::errors::{Result, WatchlistError};
use crate::market_data::base::MarketDataClient;
use crate::metrics;
use crate::models::dashboard::{Dashboard, DashboardEntry, SectorSummary, SkipReason, StockDetail};
use crate::models::price::{Interval, PricePoint};
use crate::models::watchlist::WatchedSymbol;
use crate::util::round2;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

type FetchOutcome = std::result::Result<Vec<PricePoint>, SkipReason>;

/// 看板服务：抓取行情、计算指标、生成图表并按行业汇总
pub struct DashboardService {
    config: Config,
    client: Arc<dyn MarketDataClient + Send + Sync>,
    renderer: Arc<dyn ChartRenderer + Send + Sync>,
}

impl DashboardService {
    /// 创建新的看板服务实例
    pub fn new(
        config: Config,
        client: Arc<dyn MarketDataClient + Send + Sync>,
        renderer: Arc<dyn ChartRenderer + Send + Sync>,
    ) -> Self {
        Self {
            config,
            client,
            renderer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the dashboard for a watchlist snapshot.
    ///
    /// Never fails: symbols without data are skipped, failed charts become
    /// `None`. Entries keep the watchlist order.
    pub async fn run_dashboard(&self, watchlist: &[WatchedSymbol]) -> Dashboard {
        info!(
            "Building dashboard for {} symbols via {}",
            watchlist.len(),
            self.client.provider_name()
        );

        let fetched = self.fetch_all(watchlist).await;

        let mut entries = Vec::with_capacity(watchlist.len());
        let mut sector_inputs = Vec::with_capacity(watchlist.len());

        for (watched, outcome) in watchlist.iter().zip(fetched) {
            match self.process_symbol(watched, outcome) {
                Ok(entry) => {
                    sector_inputs.push((entry.sector.clone(), entry.metrics.percent_change));
                    entries.push(entry);
                }
                Err(reason) => warn!("Skipping {}: {}", watched.symbol, reason),
            }
        }

        let sector_summary = group_and_average(&sector_inputs);
        let sector_chart = self.render_sector_chart(&sector_summary);

        info!(
            "Dashboard ready: {} of {} symbols, {} sectors",
            entries.len(),
            watchlist.len(),
            sector_summary.len()
        );

        Dashboard {
            entries,
            sector_summary,
            sector_chart,
        }
    }

    /// 单只股票：抓取结果 -> 指标 -> 迷你图
    pub fn process_symbol(
        &self,
        watched: &WatchedSymbol,
        fetched: FetchOutcome,
    ) -> std::result::Result<DashboardEntry, SkipReason> {
        let points = fetched?;
        let metrics = metrics::compute_metrics(&points).map_err(|_| SkipReason::NoData)?;

        let chart = match self.renderer.render_series(&points, ChartStyle::Mini) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Chart for {} failed: {}", watched.symbol, e);
                None
            }
        };

        Ok(DashboardEntry {
            symbol: watched.symbol.clone(),
            display_name: watched.display_name.clone(),
            sector: watched.sector_label().to_string(),
            metrics,
            chart,
            trend: metrics.trend(),
        })
    }

    /// 个股详情，使用更长的回看窗口和完整样式图表
    pub async fn stock_detail(&self, symbol: &str) -> Result<StockDetail> {
        let lookback = self.config.detail_lookback_days;
        info!("Loading detail for {} ({} days)", symbol, lookback);

        let points = match fetch_series(
            self.client.as_ref(),
            symbol,
            lookback,
            self.config.fetch_timeout,
        )
        .await
        {
            Ok(points) => points,
            Err(SkipReason::NoData) => {
                return Err(WatchlistError::DataError(format!("No price data for {}", symbol)))
            }
            Err(reason) => return Err(WatchlistError::MarketDataError(format!("{}: {}", symbol, reason))),
        };

        let metrics = metrics::compute_metrics(&points)?;
        let chart = match self.renderer.render_series(&points, ChartStyle::Full) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Detail chart for {} failed: {}", symbol, e);
                None
            }
        };

        Ok(StockDetail {
            symbol: symbol.to_string(),
            points,
            trend: metrics.trend(),
            metrics,
            chart,
        })
    }

    // 并发抓取，结果按自选股顺序放回
    async fn fetch_all(&self, watchlist: &[WatchedSymbol]) -> Vec<FetchOutcome> {
        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_fetches.clamp(1, Semaphore::MAX_PERMITS)));
        let mut tasks = JoinSet::new();

        for (index, watched) in watchlist.iter().enumerate() {
            let client = Arc::clone(&self.client);
            let permits = Arc::clone(&permits);
            let symbol = watched.symbol.clone();
            let lookback = self.config.lookback_days;
            let timeout = self.config.fetch_timeout;

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (index, fetch_series(client.as_ref(), &symbol, lookback, timeout).await)
            });
        }

        let mut slots: Vec<Option<FetchOutcome>> = (0..watchlist.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => warn!("Fetch task ended abnormally: {}", e),
            }
        }

        slots
            .into_iter()
            .map(|slot| slot.unwrap_or_else(|| Err(SkipReason::FetchFailed("fetch task aborted".to_string()))))
            .collect()
    }

    fn render_sector_chart(&self, summary: &SectorSummary) -> Option<Vec<u8>> {
        if summary.is_empty() {
            return None;
        }
        match self.renderer.render_sector_bars(summary) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!("Sector chart failed: {}", e);
                None
            }
        }
    }
}

async fn fetch_series(
    client: &(dyn MarketDataClient + Send + Sync),
    symbol: &str,
    lookback_days: u32,
    timeout: Duration,
) -> FetchOutcome {
    match tokio::time::timeout(timeout, client.fetch(symbol, lookback_days, Interval::Daily)).await {
        Err(_) => Err(SkipReason::TimedOut),
        Ok(Err(e)) => Err(SkipReason::FetchFailed(e.to_string())),
        Ok(Ok(points)) if points.is_empty() => Err(SkipReason::NoData),
        Ok(Ok(points)) => Ok(points),
    }
}

/// 按行业求平均涨跌幅，保留两位小数
pub fn group_and_average(inputs: &[(String, f64)]) -> SectorSummary {
    let mut totals: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for (sector, change) in inputs {
        let total = totals.entry(sector.clone()).or_insert((0.0, 0));
        total.0 += change;
        total.1 += 1;
    }

    totals
        .into_iter()
        .map(|(sector, (sum, count))| (sector, round2(sum / count as f64)))
        .collect()
}
