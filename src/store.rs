use crate::errors::{Result, WatchlistError};
use crate::models::watchlist::WatchedSymbol;
use log::info;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const MAX_SYMBOL_LEN: usize = 10;
const MAX_NAME_LEN: usize = 50;
const MAX_SECTOR_LEN: usize = 50;

/// 自选股列表，保存在一个JSON文件中
pub struct WatchlistStore {
    path: PathBuf,
    entries: Vec<WatchedSymbol>,
    // 索引用于快速查找
    symbol_index: HashMap<String, usize>,
}

impl WatchlistStore {
    /// 从文件加载，文件不存在时返回空列表
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Watchlist {} not found, starting empty", path.display());
            return Ok(Self::new_with_data(path, Vec::new()));
        }

        let text = fs::read_to_string(path)?;
        let entries: Vec<WatchedSymbol> = if text.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&text)?
        };
        info!("Loaded {} watched symbols from {}", entries.len(), path.display());

        Ok(Self::new_with_data(path, entries))
    }

    pub fn new_with_data(path: &Path, entries: Vec<WatchedSymbol>) -> Self {
        let mut store = Self {
            path: path.to_path_buf(),
            entries,
            symbol_index: HashMap::new(),
        };
        store.rebuild_index();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        info!("Saved {} watched symbols to {}", self.entries.len(), self.path.display());
        Ok(())
    }

    pub fn get_all(&self) -> &[WatchedSymbol] {
        &self.entries
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<&WatchedSymbol> {
        self.symbol_index.get(symbol).map(|&i| &self.entries[i])
    }

    /// Append a symbol. Inputs are trimmed; a blank sector is stored as none.
    pub fn add(&mut self, symbol: &str, display_name: &str, sector: Option<&str>) -> Result<&WatchedSymbol> {
        let symbol = symbol.trim();
        let display_name = display_name.trim();
        let sector = sector.map(str::trim).filter(|s| !s.is_empty());

        check_field("symbol", symbol, MAX_SYMBOL_LEN)?;
        check_field("name", display_name, MAX_NAME_LEN)?;
        if let Some(sector) = sector {
            check_field("sector", sector, MAX_SECTOR_LEN)?;
        }
        if self.symbol_index.contains_key(symbol) {
            return Err(WatchlistError::ValidationError(format!("{} is already on the watchlist", symbol)));
        }

        self.entries.push(WatchedSymbol::new(symbol, display_name, sector));
        let index = self.entries.len() - 1;
        self.symbol_index.insert(symbol.to_string(), index);
        Ok(&self.entries[index])
    }

    pub fn remove(&mut self, symbol: &str) -> Result<WatchedSymbol> {
        let index = self
            .symbol_index
            .get(symbol.trim())
            .copied()
            .ok_or_else(|| WatchlistError::DataError(format!("{} is not on the watchlist", symbol.trim())))?;
        let removed = self.entries.remove(index);
        self.rebuild_index();
        Ok(removed)
    }

    fn rebuild_index(&mut self) {
        self.symbol_index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.symbol_index.entry(entry.symbol.clone()).or_insert(i);
        }
    }
}

fn check_field(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.is_empty() {
        return Err(WatchlistError::ValidationError(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max_len {
        return Err(WatchlistError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}
