//! WatchlistStore persistence round trips through a temp directory.

use stockwatch::{WatchedSymbol, WatchlistStore};
use tempfile::tempdir;

#[test]
fn missing_file_loads_empty() {
    let dir = tempdir().unwrap();
    let store = WatchlistStore::load_from_file(&dir.path().join("watchlist.json")).unwrap();
    assert!(store.get_all().is_empty());
}

#[test]
fn saved_entries_reload_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("watchlist.json");

    let mut store = WatchlistStore::load_from_file(&path).unwrap();
    store.add("NVDA", "Nvidia", Some("Tech")).unwrap();
    store.add("XOM", "Exxon Mobil", Some("Energy")).unwrap();
    store.add("BRK-B", "Berkshire", None).unwrap();
    store.save().unwrap();

    let reloaded = WatchlistStore::load_from_file(&path).unwrap();
    let symbols: Vec<&str> = reloaded.get_all().iter().map(|w| w.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["NVDA", "XOM", "BRK-B"]);
    assert_eq!(
        reloaded.get_by_symbol("BRK-B"),
        Some(&WatchedSymbol::new("BRK-B", "Berkshire", None))
    );
}

#[test]
fn hand_written_file_without_sectors_loads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watchlist.json");
    std::fs::write(
        &path,
        r#"[{"symbol":"AAPL","display_name":"Apple"},{"symbol":"JPM","display_name":"JPMorgan","sector":"Financials"}]"#,
    )
    .unwrap();

    let store = WatchlistStore::load_from_file(&path).unwrap();
    assert_eq!(store.get_all().len(), 2);
    assert_eq!(store.get_all()[0].sector_label(), "Unknown");
    assert_eq!(store.get_all()[1].sector_label(), "Financials");
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("watchlist.json");
    std::fs::write(&path, "{not json").unwrap();
    assert!(WatchlistStore::load_from_file(&path).is_err());
}
