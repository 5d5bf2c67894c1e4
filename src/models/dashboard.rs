use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::models::price::PricePoint;
use crate::util::serialize_chart;

/// 行业 -> 平均涨跌幅(%)，保留两位小数
pub type SectorSummary = BTreeMap<String, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// 由一段日线数据推导出的涨跌指标
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SymbolMetrics {
    pub latest_close: f64,
    pub previous_close: f64,
    pub absolute_change: f64,
    pub percent_change: f64,
}

impl SymbolMetrics {
    /// Strictly positive change is `Up`; a flat day counts as `Down`.
    pub fn trend(&self) -> Trend {
        if self.absolute_change > 0.0 {
            Trend::Up
        } else {
            Trend::Down
        }
    }
}

/// 看板中的单只股票
#[derive(Debug, Clone, Serialize)]
pub struct DashboardEntry {
    pub symbol: String,
    pub display_name: String,
    pub sector: String,
    pub metrics: SymbolMetrics,
    #[serde(serialize_with = "serialize_chart")]
    pub chart: Option<Vec<u8>>,
    pub trend: Trend,
}

/// 一次看板聚合的完整结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dashboard {
    pub entries: Vec<DashboardEntry>,
    pub sector_summary: SectorSummary,
    #[serde(serialize_with = "serialize_chart")]
    pub sector_chart: Option<Vec<u8>>,
}

impl Dashboard {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Why a watched symbol was left out of the dashboard.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("no price data returned")]
    NoData,

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("fetch timed out")]
    TimedOut,
}

/// 个股详情
#[derive(Debug, Clone, Serialize)]
pub struct StockDetail {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub metrics: SymbolMetrics,
    pub trend: Trend,
    #[serde(serialize_with = "serialize_chart")]
    pub chart: Option<Vec<u8>>,
}
