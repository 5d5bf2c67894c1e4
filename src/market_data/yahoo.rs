use crate::config::Config;
use crate::errors::{Result, WatchlistError};
use crate::market_data::base::MarketDataClient;
use crate::models::price::{Interval, PricePoint};
use crate::util;
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Yahoo Finance 日线行情客户端
pub struct YahooClient {
    client: Client,
    base_url: String,
    request_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl YahooClient {
    /// 根据配置创建客户端
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(WatchlistError::RequestError)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            request_interval: config.request_interval,
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        let now = Instant::now();
        let should_wait = {
            let mut last = match self.last_request.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let should_wait = last
                .map(|previous| (previous + self.request_interval).saturating_duration_since(now))
                .filter(|wait| !wait.is_zero());
            // 预约下一个时间槽，并发请求依次排开
            *last = Some(now + should_wait.unwrap_or_default());
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("Waiting {:?} to respect the request interval", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    fn chart_url(&self, symbol: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| WatchlistError::MarketDataError(format!("invalid base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| WatchlistError::MarketDataError(format!("base url cannot have a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(&["v8", "finance", "chart", symbol]);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataClient for YahooClient {
    fn provider_name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, symbol: &str, lookback_days: u32, interval: Interval) -> Result<Vec<PricePoint>> {
        let url = self.chart_url(symbol)?;
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(lookback_days) * 86_400;

        self.wait_for_rate_limit().await;

        debug!("Requesting {} bars for {} ({} days)", interval.as_query_value(), symbol, lookback_days);
        let response = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.as_query_value().to_string()),
                ("events", "history".to_string()),
            ])
            .header("Referer", "https://finance.yahoo.com/")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            info!("Symbol {} not found at {}", symbol, self.provider_name());
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(WatchlistError::MarketDataError(format!(
                "yahoo returned status {} for {}",
                status, symbol
            )));
        }

        parse_chart_response(&body, symbol)
    }
}

/// 解析 v8 chart 接口返回的JSON
pub fn parse_chart_response(body: &str, symbol: &str) -> Result<Vec<PricePoint>> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            info!("Symbol {} not found: {}", symbol, error.description.unwrap_or_default());
            return Ok(Vec::new());
        }
        return Err(WatchlistError::MarketDataError(format!(
            "yahoo chart error for {}: {} {}",
            symbol,
            error.code,
            error.description.unwrap_or_default()
        )));
    }

    let result = match response.chart.result.and_then(|r| r.into_iter().next()) {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    // 区间内无交易时没有timestamp字段
    let timestamps = match result.timestamp {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };
    let quote = match result.indicators.quote.into_iter().next() {
        Some(quote) => quote,
        None => return Ok(Vec::new()),
    };
    let timezone = result.meta.and_then(|m| m.exchange_timezone_name);

    let mut points = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let ohlc = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
        );
        let (open, high, low, close) = match ohlc {
            (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
            _ => {
                debug!("Skipping incomplete bar {} for {}", ts, symbol);
                continue;
            }
        };

        let date = match util::timestamp_to_exchange_date(ts, timezone.as_deref()) {
            Some(date) => date,
            None => {
                warn!("Invalid timestamp {} for {}", ts, symbol);
                continue;
            }
        };

        points.push(PricePoint {
            date,
            open,
            high,
            low,
            close,
            volume: quote.volume.get(i).copied().flatten().map(|v| v as u64),
        });
    }

    util::normalize_series(&mut points, symbol);
    Ok(points)
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "exchangeTimezoneName", default)]
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "exchangeTimezoneName": "America/New_York"},
                "timestamp": [1709735400, 1709649000, 1709821800],
                "indicators": {"quote": [{
                    "open":   [170.0, 171.0, null],
                    "high":   [172.0, 173.0, 175.0],
                    "low":    [169.0, 170.0, 171.0],
                    "close":  [171.5, 170.1, 174.0],
                    "volume": [1000, 2000, 3000]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_sorts_and_drops_incomplete_rows() {
        let points = parse_chart_response(SAMPLE, "AAPL").unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(points[0].close, 170.1);
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
        assert_eq!(points[1].volume, Some(1000));
    }

    #[test]
    fn not_found_is_an_empty_series() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        assert!(parse_chart_response(body, "ZZZZ").unwrap().is_empty());
    }

    #[test]
    fn other_api_errors_propagate() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        assert!(matches!(
            parse_chart_response(body, "AAPL"),
            Err(WatchlistError::MarketDataError(_))
        ));
    }

    #[test]
    fn missing_timestamps_mean_no_trading() {
        let body = r#"{"chart":{"result":[{"meta":{},"indicators":{"quote":[{}]}}],"error":null}}"#;
        assert!(parse_chart_response(body, "AAPL").unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            parse_chart_response("<html>", "AAPL"),
            Err(WatchlistError::JsonError(_))
        ));
    }

    #[test]
    fn chart_url_encodes_symbol() {
        let config = Config::new().with_base_url("http://localhost:8080/");
        let client = YahooClient::new(&config).unwrap();
        let url = client.chart_url("BRK B").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v8/finance/chart/BRK%20B");
    }
}
