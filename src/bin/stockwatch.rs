use stockwatch::chart::{self, PlottersRenderer};
use stockwatch::config::Config;
use stockwatch::market_data::yahoo::YahooClient;
use stockwatch::models::dashboard::Dashboard;
use stockwatch::services::dashboard_service::DashboardService;
use stockwatch::store::WatchlistStore;

use anyhow::{bail, Context};
use clap::{App, Arg, ArgMatches, SubCommand};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    let matches = cli().get_matches();

    let config = build_config(&matches)?;
    let mut store = WatchlistStore::load_from_file(&config.watchlist_path)?;

    match matches.subcommand() {
        Some(("dashboard", sub)) => {
            let days = parse_positive::<u32>(sub, "days")?;
            let service = build_service(config.with_lookback_days(days))?;
            info!("Dashboard window: last {} days", service.config().lookback_days);
            let dashboard = service.run_dashboard(store.get_all()).await;
            print_dashboard(&dashboard);

            if let Some(dir) = sub.value_of("out") {
                write_dashboard_charts(Path::new(dir), &dashboard)?;
            }
            if sub.is_present("json") {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            }
        }
        Some(("detail", sub)) => {
            let symbol = sub.value_of("symbol").unwrap_or_default();
            let days = parse_positive::<u32>(sub, "days")?;
            let service = build_service(config.with_detail_lookback_days(days))?;
            let detail = service.stock_detail(symbol).await?;

            info!("{} last {} days", detail.symbol, days);
            info!("{:<12} {:<10} {:<10} {:<10} {:<10}", "Date", "Open", "High", "Low", "Close");
            for p in &detail.points {
                info!("{:<12} {:<10.2} {:<10.2} {:<10.2} {:<10.2}", p.date, p.open, p.high, p.low, p.close);
            }
            info!(
                "Latest {:.2}, change {:+.2} ({:+.2}%), trend {:?}",
                detail.metrics.latest_close,
                detail.metrics.absolute_change,
                detail.metrics.percent_change,
                detail.trend
            );

            if let (Some(dir), Some(png)) = (sub.value_of("out"), detail.chart.as_ref()) {
                let path = write_png(Path::new(dir), &format!("{}_detail", detail.symbol), png)?;
                info!("Chart written to {}", path.display());
            }
        }
        Some(("add", sub)) => {
            let symbol = sub.value_of("symbol").unwrap_or_default();
            let name = sub.value_of("name").unwrap_or_default();
            let added = store.add(symbol, name, sub.value_of("sector"))?.clone();
            store.save()?;
            info!("Added {} ({}) in {}", added.symbol, added.display_name, added.sector_label());
        }
        Some(("remove", sub)) => {
            let removed = store.remove(sub.value_of("symbol").unwrap_or_default())?;
            store.save()?;
            info!("Removed {}", removed.symbol);
        }
        Some(("list", _)) => {
            if store.get_all().is_empty() {
                info!("Watchlist {} is empty", store.path().display());
            }
            for watched in store.get_all() {
                info!("{:<10} {:<30} {}", watched.symbol, watched.display_name, watched.sector_label());
            }
        }
        _ => info!("No command specified. Use --help for usage information."),
    }

    Ok(())
}

fn cli() -> App<'static> {
    App::new("stockwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Personal stock watchlist dashboard")
        .arg(
            Arg::with_name("watchlist")
                .short('w')
                .long("watchlist")
                .value_name("FILE")
                .help("Watchlist JSON file")
                .takes_value(true)
                .default_value("watchlist.json")
                .global(true),
        )
        .arg(
            Arg::with_name("font")
                .long("font")
                .value_name("PATH")
                .help("TrueType font used for chart text")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Per-symbol fetch timeout in seconds")
                .takes_value(true)
                .default_value("5")
                .global(true),
        )
        .arg(
            Arg::with_name("concurrency")
                .long("concurrency")
                .value_name("N")
                .help("Maximum symbols fetched at once")
                .takes_value(true)
                .default_value("4")
                .global(true),
        )
        .arg(
            Arg::with_name("chart-size")
                .long("chart-size")
                .value_name("WxH")
                .help("Pixel size of full and sector charts, e.g. 800x400")
                .takes_value(true)
                .default_value("800x400")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("dashboard")
                .about("Fetch recent prices for every watched symbol")
                .arg(
                    Arg::with_name("days")
                        .short('d')
                        .long("days")
                        .value_name("DAYS")
                        .help("Lookback window in calendar days")
                        .takes_value(true)
                        .default_value("7"),
                )
                .arg(
                    Arg::with_name("out")
                        .short('o')
                        .long("out")
                        .value_name("DIR")
                        .help("Directory to write chart PNGs into")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("json")
                        .long("json")
                        .help("Print the dashboard as JSON with base64 charts")
                        .takes_value(false),
                ),
        )
        .subcommand(
            SubCommand::with_name("detail")
                .about("Show a longer history and full chart for one symbol")
                .arg(
                    Arg::with_name("symbol")
                        .short('s')
                        .long("symbol")
                        .value_name("SYMBOL")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("days")
                        .short('d')
                        .long("days")
                        .value_name("DAYS")
                        .help("Lookback window in calendar days")
                        .takes_value(true)
                        .default_value("30"),
                )
                .arg(
                    Arg::with_name("out")
                        .short('o')
                        .long("out")
                        .value_name("DIR")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("add")
                .about("Add a symbol to the watchlist")
                .arg(Arg::with_name("symbol").short('s').long("symbol").required(true).takes_value(true))
                .arg(Arg::with_name("name").short('n').long("name").required(true).takes_value(true))
                .arg(Arg::with_name("sector").long("sector").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("remove")
                .about("Remove a symbol from the watchlist")
                .arg(Arg::with_name("symbol").short('s').long("symbol").required(true).takes_value(true)),
        )
        .subcommand(SubCommand::with_name("list").about("List watched symbols"))

}

fn parse_number<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> anyhow::Result<T> {
    let raw = matches.value_of(name).unwrap_or_default();
    match raw.parse::<T>() {
        Ok(value) => Ok(value),
        Err(_) => bail!("--{} expects a number, got {:?}", name, raw),
    }
}

fn parse_positive<T>(matches: &ArgMatches, name: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let value = parse_number::<T>(matches, name)?;
    if value == T::default() {
        bail!("--{} must be greater than zero", name);
    }
    Ok(value)
}

fn parse_chart_size(matches: &ArgMatches) -> anyhow::Result<(u32, u32)> {
    let raw = matches.value_of("chart-size").unwrap_or("800x400");
    let parsed = raw
        .split_once('x')
        .and_then(|(w, h)| Some((w.trim().parse::<u32>().ok()?, h.trim().parse::<u32>().ok()?)));
    match parsed {
        Some((width, height)) if width > 0 && height > 0 => Ok((width, height)),
        _ => bail!("--chart-size expects WIDTHxHEIGHT, got {:?}", raw),
    }
}

fn build_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    // 超时为 0 会让所有标的都被跳过
    let timeout = parse_positive::<u64>(matches, "timeout")?;
    let concurrency = parse_number::<usize>(matches, "concurrency")?;
    let (width, height) = parse_chart_size(matches)?;

    Ok(Config::new()
        .with_full_chart_size(width, height)
        .with_sector_chart_size(width, height)
        .with_watchlist_path(matches.value_of("watchlist").unwrap_or("watchlist.json"))
        .with_fetch_timeout(Duration::from_secs(timeout))
        .with_max_concurrent_fetches(concurrency)
        .with_font_path(matches.value_of("font").map(PathBuf::from)))
}

fn build_service(config: Config) -> anyhow::Result<DashboardService> {
    // 字体只在进程启动时注册一次
    chart::init_fonts(config.font_path.as_deref());

    let client = YahooClient::new(&config).context("failed to build market data client")?;
    let renderer = PlottersRenderer::new(&config);
    Ok(DashboardService::new(config, Arc::new(client), Arc::new(renderer)))
}

fn print_dashboard(dashboard: &Dashboard) {
    if dashboard.is_empty() {
        warn!("No symbols with price data");
        return;
    }

    info!("{:<10} {:<24} {:<14} {:>10} {:>10} {:>9}", "Symbol", "Name", "Sector", "Close", "Change", "Change%");
    info!("{:-<82}", "");
    for entry in &dashboard.entries {
        info!(
            "{:<10} {:<24} {:<14} {:>10.2} {:>+10.2} {:>+8.2}%",
            entry.symbol,
            entry.display_name,
            entry.sector,
            entry.metrics.latest_close,
            entry.metrics.absolute_change,
            entry.metrics.percent_change
        );
    }

    info!("{:-<82}", "");
    for (sector, average) in &dashboard.sector_summary {
        info!("{:<24} {:>+8.2}%", sector, average);
    }
}

fn write_dashboard_charts(dir: &Path, dashboard: &Dashboard) -> anyhow::Result<()> {
    let mut written = 0;
    for entry in &dashboard.entries {
        if let Some(png) = &entry.chart {
            write_png(dir, &entry.symbol, png)?;
            written += 1;
        }
    }
    if let Some(png) = &dashboard.sector_chart {
        write_png(dir, "sectors", png)?;
        written += 1;
    }
    info!("Wrote {} charts to {}", written, dir.display());
    Ok(())
}

fn write_png(dir: &Path, stem: &str, png: &[u8]) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    // 代码里可能有 '/' 或 '^'，文件名中替换掉
    let safe: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    let path = dir.join(format!("{}.png", safe));
    fs::write(&path, png).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(path)
}
