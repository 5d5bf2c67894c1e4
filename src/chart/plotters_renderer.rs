use crate::chart::{fonts_ready, ChartRenderer, ChartStyle, FONT_FAMILY};
use crate::config::Config;
use crate::errors::{Result, WatchlistError};
use crate::metrics;
use crate::models::dashboard::{SectorSummary, Trend};
use crate::models::price::PricePoint;
use crate::util::truncate_label;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

const UP_COLOR: RGBColor = RGBColor(22, 163, 74);
const DOWN_COLOR: RGBColor = RGBColor(220, 38, 38);
const LINE_COLOR: RGBColor = RGBColor(37, 99, 235);
const GRID_COLOR: RGBColor = RGBColor(230, 230, 230);
const MAX_SECTOR_LABEL: usize = 12;

/// 基于 plotters 位图后端的图表渲染器
pub struct PlottersRenderer {
    full_size: (u32, u32),
    mini_size: (u32, u32),
    sector_size: (u32, u32),
}

impl PlottersRenderer {
    pub fn new(config: &Config) -> Self {
        Self {
            full_size: config.full_chart_size,
            mini_size: config.mini_chart_size,
            sector_size: config.sector_chart_size,
        }
    }

    fn render<F>(&self, size: (u32, u32), draw: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&Canvas<'_>) -> DrawResult,
    {
        let (width, height) = size;
        if width == 0 || height == 0 {
            return Err(WatchlistError::ChartError(format!("invalid chart size {}x{}", width, height)));
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
            draw(&root).map_err(|e| WatchlistError::ChartError(e.to_string()))?;
            root.present().map_err(|e| WatchlistError::ChartError(e.to_string()))?;
        }

        encode_png(&buffer, width, height)
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render_series(&self, points: &[PricePoint], style: ChartStyle) -> Result<Vec<u8>> {
        if points.is_empty() {
            return Err(WatchlistError::ChartError("cannot chart an empty series".to_string()));
        }

        match style {
            ChartStyle::Full => {
                let with_text = fonts_ready();
                self.render(self.full_size, |root| draw_full(root, points, with_text))
            }
            ChartStyle::Mini => self.render(self.mini_size, |root| draw_mini(root, points)),
        }
    }

    fn render_sector_bars(&self, summary: &SectorSummary) -> Result<Vec<u8>> {
        if summary.is_empty() {
            return Err(WatchlistError::ChartError("no sectors to chart".to_string()));
        }

        let with_text = fonts_ready();
        self.render(self.sector_size, |root| draw_sector_bars(root, summary, with_text))
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(buffer, width, height, ColorType::Rgb8)
        .map_err(|e| WatchlistError::ChartError(e.to_string()))?;
    Ok(png)
}

// 上下各留10%的空白，价格完全不变时按价格的1%撑开
fn value_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }

    let spread = max - min;
    let pad = if spread > 0.0 {
        spread * 0.1
    } else {
        (max.abs() * 0.01).max(1.0)
    };
    (min - pad, max + pad)
}

fn series_coords(points: &[PricePoint]) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.close))
        .collect()
}

fn x_extent(points: &[PricePoint]) -> f64 {
    (points.len().max(2) - 1) as f64
}

fn draw_full(root: &Canvas<'_>, points: &[PricePoint], with_text: bool) -> DrawResult {
    root.fill(&WHITE)?;

    let coords = series_coords(points);
    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let (y_min, y_max) = value_range(&closes);

    let mut builder = ChartBuilder::on(root);
    builder.margin(12);
    if with_text {
        let first = &points[0];
        let last = &points[points.len() - 1];
        builder
            .caption(format!("Close price {} ~ {}", first.date, last.date), (FONT_FAMILY, 20))
            .x_label_area_size(36)
            .y_label_area_size(56);
    }
    let mut chart = builder.build_cartesian_2d(0f64..x_extent(points), y_min..y_max)?;

    let date_label = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        points
            .get(index as usize)
            .map(|p| p.date.format("%m-%d").to_string())
            .unwrap_or_default()
    };
    let price_label = |y: &f64| format!("{:.2}", y);

    // 无字体时只画网格，标签区域为空不会输出文字
    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(&GRID_COLOR)
        .x_labels(points.len().clamp(2, 10))
        .y_labels(6);
    if with_text {
        mesh.label_style((FONT_FAMILY, 12))
            .x_label_formatter(&date_label)
            .y_label_formatter(&price_label)
            .x_desc("Date")
            .y_desc("Close");
    }
    mesh.draw()?;

    chart.draw_series(LineSeries::new(coords.clone(), LINE_COLOR.stroke_width(2)))?;
    chart.draw_series(
        coords
            .iter()
            .map(|&(x, y)| Circle::new((x, y), 3, LINE_COLOR.filled())),
    )?;

    Ok(())
}

fn draw_mini(root: &Canvas<'_>, points: &[PricePoint]) -> DrawResult {
    root.fill(&WHITE)?;

    let trend = metrics::compute_metrics(points)
        .map(|m| m.trend())
        .unwrap_or(Trend::Down);
    let color = match trend {
        Trend::Up => UP_COLOR,
        Trend::Down => DOWN_COLOR,
    };

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let (y_min, y_max) = value_range(&closes);

    let mut chart = ChartBuilder::on(root)
        .margin(2)
        .build_cartesian_2d(0f64..x_extent(points), y_min..y_max)?;
    chart.draw_series(LineSeries::new(series_coords(points), color.stroke_width(2)))?;

    Ok(())
}

fn draw_sector_bars(root: &Canvas<'_>, summary: &SectorSummary, with_text: bool) -> DrawResult {
    root.fill(&WHITE)?;

    let labels: Vec<String> = summary
        .keys()
        .map(|k| truncate_label(k, MAX_SECTOR_LABEL))
        .collect();
    let values: Vec<f64> = summary.values().copied().collect();
    let count = values.len();

    // 柱状图必须包含零轴
    let (low, high) = value_range(&values);
    let (y_min, y_max) = (low.min(0.0), high.max(0.0));

    let mut builder = ChartBuilder::on(root);
    builder.margin(12);
    if with_text {
        builder
            .caption("Average % change by sector", (FONT_FAMILY, 20))
            .x_label_area_size(90)
            .y_label_area_size(56);
    }
    let mut chart = builder.build_cartesian_2d((0..count).into_segmented(), y_min..y_max)?;

    let sector_label = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let percent_label = |y: &f64| format!("{:.1}%", y);

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(&GRID_COLOR)
        .x_labels(count)
        .y_labels(6);
    if with_text {
        mesh.label_style((FONT_FAMILY, 12))
            .x_label_style((FONT_FAMILY, 12).into_font().transform(FontTransform::Rotate90))
            .x_label_formatter(&sector_label)
            .y_label_formatter(&percent_label)
            .y_desc("Avg % change");
    }
    mesh.draw()?;

    chart.draw_series(values.iter().enumerate().map(|(i, &v)| {
        let color = if v >= 0.0 { UP_COLOR } else { DOWN_COLOR };
        let mut bar = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), v)],
            color.filled(),
        );
        bar.set_margin(0, 0, 6, 6);
        bar
    }))?;

    Ok(())
}
