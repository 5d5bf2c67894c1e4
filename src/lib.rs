// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod market_data;
pub mod metrics;
pub mod chart;
pub mod services;
pub mod store;

#[doc(hidden)]
pub mod util;

// 重新导出常用类型，方便使用
pub use chart::{init_fonts, ChartRenderer, ChartStyle, PlottersRenderer};
pub use config::Config;
pub use errors::{Result, WatchlistError};
pub use market_data::base::MarketDataClient;
pub use market_data::yahoo::YahooClient;
pub use metrics::compute_metrics;
pub use models::dashboard::{Dashboard, DashboardEntry, SectorSummary, SkipReason, StockDetail, SymbolMetrics, Trend};
pub use models::price::{Interval, PricePoint};
pub use models::watchlist::WatchedSymbol;
pub use services::dashboard_service::{group_and_average, DashboardService};
pub use store::WatchlistStore;
