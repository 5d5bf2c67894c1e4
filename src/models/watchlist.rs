use serde::{Deserialize, Serialize};

/// 没有行业标签时使用的默认分组
pub const UNKNOWN_SECTOR: &str = "Unknown";

/// 自选股条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedSymbol {
    pub symbol: String,
    pub display_name: String,
    #[serde(default)]
    pub sector: Option<String>,
}

impl WatchedSymbol {
    pub fn new(symbol: &str, display_name: &str, sector: Option<&str>) -> Self {
        Self {
            symbol: symbol.to_string(),
            display_name: display_name.to_string(),
            sector: sector.map(|s| s.to_string()),
        }
    }

    /// Sector used for the rollup. Missing and blank sectors both land in "Unknown".
    pub fn sector_label(&self) -> &str {
        match self.sector.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => UNKNOWN_SECTOR,
        }
    }
}
