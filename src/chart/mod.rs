pub mod plotters_renderer;

use crate::errors::Result;
use crate::models::dashboard::SectorSummary;
use crate::models::price::PricePoint;
use log::{debug, info, warn};
use plotters::style::FontStyle;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub use plotters_renderer::PlottersRenderer;

/// 图表使用的字体族名
pub const FONT_FAMILY: &str = "sans-serif";

const DEFAULT_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static FONTS_READY: OnceLock<bool> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    /// Titled chart with axes, labels, grid and point markers
    Full,
    /// Axis-free thumbnail coloured by trend
    Mini,
}

/// Turns price data into PNG bytes
pub trait ChartRenderer {
    fn render_series(&self, points: &[PricePoint], style: ChartStyle) -> Result<Vec<u8>>;

    fn render_sector_bars(&self, summary: &SectorSummary) -> Result<Vec<u8>>;
}

/// 进程启动时注册一次字体，之后的调用直接返回首次结果
pub fn init_fonts(path: Option<&Path>) -> bool {
    *FONTS_READY.get_or_init(|| load_font(path))
}

pub fn fonts_ready() -> bool {
    FONTS_READY.get().copied().unwrap_or(false)
}

fn load_font(path: Option<&Path>) -> bool {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![p.to_path_buf()],
        None => DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
    };

    for candidate in candidates {
        let bytes = match std::fs::read(&candidate) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Font {} not readable: {}", candidate.display(), e);
                continue;
            }
        };

        // 字体注册要求 'static 数据，进程内只发生一次
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
        match plotters::style::register_font(FONT_FAMILY, FontStyle::Normal, bytes) {
            Ok(()) => {
                info!("Registered chart font {}", candidate.display());
                return true;
            }
            Err(_) => warn!("Font {} could not be loaded", candidate.display()),
        }
    }

    warn!("No chart font available, charts will be drawn without text");
    false
}
