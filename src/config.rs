use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct Config {
    pub lookback_days: u32,
    pub detail_lookback_days: u32,
    pub fetch_timeout: Duration,
    pub request_interval: Duration,
    pub max_concurrent_fetches: usize,
    pub base_url: String,
    pub full_chart_size: (u32, u32),
    pub mini_chart_size: (u32, u32),
    pub sector_chart_size: (u32, u32),
    pub font_path: Option<PathBuf>,
    pub watchlist_path: PathBuf,
}

impl Config {
    pub fn new() -> Self {
        Self {
            lookback_days: 7,
            detail_lookback_days: 30,
            fetch_timeout: Duration::from_secs(5),
            request_interval: Duration::from_millis(250),
            max_concurrent_fetches: 4,
            base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            full_chart_size: (800, 400),
            mini_chart_size: (200, 60),
            sector_chart_size: (800, 400),
            font_path: None,
            watchlist_path: PathBuf::from("watchlist.json"),
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    pub fn with_detail_lookback_days(mut self, days: u32) -> Self {
        self.detail_lookback_days = days;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    // 0 会被当作 1 处理，即顺序抓取；上限为信号量允许的最大许可数
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_full_chart_size(mut self, width: u32, height: u32) -> Self {
        self.full_chart_size = (width, height);
        self
    }

    pub fn with_mini_chart_size(mut self, width: u32, height: u32) -> Self {
        self.mini_chart_size = (width, height);
        self
    }

    pub fn with_sector_chart_size(mut self, width: u32, height: u32) -> Self {
        self.sector_chart_size = (width, height);
        self
    }

    pub fn with_font_path(mut self, path: Option<PathBuf>) -> Self {
        self.font_path = path;
        self
    }

    pub fn with_watchlist_path(mut self, path: &str) -> Self {
        self.watchlist_path = PathBuf::from(path);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
