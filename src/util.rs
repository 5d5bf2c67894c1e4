use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use log::debug;
use serde::Serializer;

use crate::models::price::PricePoint;

// 四舍五入到两位小数，-0.0 归一为 0.0
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// 图表编码为base64，便于嵌入页面
pub fn chart_to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn serialize_chart<S>(chart: &Option<Vec<u8>>, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match chart {
        Some(bytes) => serializer.serialize_some(&chart_to_base64(bytes)),
        None => serializer.serialize_none(),
    }
}

/// 按字符截断标签，超出部分用省略号代替
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

// 时间戳转换为交易所所在时区的日期
pub fn timestamp_to_exchange_date(timestamp: i64, timezone: Option<&str>) -> Option<NaiveDate> {
    let utc = DateTime::from_timestamp(timestamp, 0)?;
    let tz = timezone
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(chrono_tz::UTC);
    Some(tz.from_utc_datetime(&utc.naive_utc()).date_naive())
}

// 按日期升序排列，同一天保留最后一条
pub fn normalize_series(points: &mut Vec<PricePoint>, symbol: &str) {
    let original = points.len();
    points.sort_by(|a, b| a.date.cmp(&b.date));

    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points.drain(..) {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }
    *points = deduped;

    if points.len() != original {
        debug!("Dropped {} duplicate rows for {}", original - points.len(), symbol);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, close: f64) -> PricePoint {
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        PricePoint::new(date, close, close, close, close)
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_f64 + 1e-9), 1.01);
        assert_eq!(round2(-2.345_000_1), -2.35);
        assert_eq!(round2(4.0), 4.0);
    }

    #[test]
    fn round2_never_returns_negative_zero() {
        let rounded = round2(-0.001);
        assert_eq!(rounded, 0.0);
        assert!(rounded.is_sign_positive());
        assert_eq!(format!("{:.2}", rounded), "0.00");
    }

    #[test]
    fn truncate_label_keeps_short_labels() {
        assert_eq!(truncate_label("Energy", 10), "Energy");
        assert_eq!(truncate_label("Communication Services", 10), "Communica…");
    }

    #[test]
    fn new_york_evening_timestamp_stays_on_trading_day() {
        // 2024-03-05 21:00 UTC 是纽约当天 16:00
        let date = timestamp_to_exchange_date(1_709_672_400, Some("America/New_York")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn unknown_timezone_falls_back_to_utc() {
        let date = timestamp_to_exchange_date(1_709_596_800, Some("Mars/Olympus")).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn normalize_series_sorts_and_dedupes() {
        let mut points = vec![point(6, 11.0), point(4, 9.0), point(6, 12.0), point(5, 10.0)];
        normalize_series(&mut points, "TEST");
        let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
        assert_eq!(closes, vec![9.0, 10.0, 12.0]);
    }

    #[test]
    fn chart_bytes_encode_as_standard_base64() {
        assert_eq!(chart_to_base64(b"Mini:2"), "TWluaToy");
    }
}
