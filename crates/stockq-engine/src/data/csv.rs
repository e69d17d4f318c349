//! Loading bars from CSV files
//!
//! Two layouts are understood:
//!
//! - a single file with `Date,Open,High,Low,Close,Volume,Symbol` columns
//! - a directory tree `<root>/<YYYY-MM-DD>/<SYMBOL_SUFFIX>.csv`, one file per
//!   symbol per day, where `_` in the file stem stands for `.` in the symbol

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::memory::MemoryStore;
use crate::error::Result;
use crate::model::{PriceBar, parse_date};

/// Loader for CSV-backed data sets
pub struct CsvStore;

impl CsvStore {
    /// Load a file or a dated directory tree, whichever `path` points at
    pub fn open(path: impl AsRef<Path>) -> Result<MemoryStore> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::load_directory(path)
        } else {
            Self::load_file(path)
        }
    }

    /// Load a single CSV file; rows without a symbol are skipped
    pub fn load_file(path: impl AsRef<Path>) -> Result<MemoryStore> {
        let path = path.as_ref();
        let bars = read_bars(path)?;
        let total = bars.len();
        let store = MemoryStore::from_bars(bars.into_iter().filter(|b| !b.symbol.is_empty()));

        if store.len() < total {
            warn!(
                "Skipped {} rows without a symbol in {}",
                total - store.len(),
                path.display()
            );
        }
        info!("Loaded {} bars from {}", store.len(), path.display());
        Ok(store)
    }

    /// Load a `<root>/<date>/<symbol>.csv` tree
    pub fn load_directory(root: impl AsRef<Path>) -> Result<MemoryStore> {
        let root = root.as_ref();
        let mut store = MemoryStore::new();

        let mut day_dirs: Vec<_> = fs::read_dir(root)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_dir())
            .collect();
        day_dirs.sort();

        for dir in day_dirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if parse_date(name).is_err() {
                debug!("Skipping non-date directory {}", dir.display());
                continue;
            }

            let mut files: Vec<_> = fs::read_dir(&dir)?
                .filter_map(std::result::Result::ok)
                .map(|entry| entry.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
                .collect();
            files.sort();

            for file in files {
                let symbol = symbol_from_file(&file);
                for mut bar in read_bars(&file)? {
                    if bar.symbol.is_empty() {
                        bar.symbol.clone_from(&symbol);
                    }
                    store.insert(bar);
                }
            }
        }

        info!("Loaded {} bars from {}", store.len(), root.display());
        Ok(store)
    }
}

fn read_bars(path: &Path) -> Result<Vec<PriceBar>> {
    let mut reader = ::csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for record in reader.deserialize::<PriceBar>() {
        bars.push(record?);
    }
    Ok(bars)
}

/// `RELIANCE_NS.csv` -> `RELIANCE.NS`
fn symbol_from_file(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .replace('_', ".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MarketData;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stockq-csv-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_symbol_from_file() {
        assert_eq!(symbol_from_file(Path::new("/x/RELIANCE_NS.csv")), "RELIANCE.NS");
        assert_eq!(symbol_from_file(Path::new("AAPL.csv")), "AAPL");
    }

    #[tokio::test]
    async fn test_load_single_file() {
        let dir = scratch_dir("file");
        let file = dir.join("bars.csv");
        fs::write(
            &file,
            "Date,Open,High,Low,Close,Volume,Symbol\n\
             2024-03-14,10,11,9,10.5,100,TCS.NS\n\
             2024-03-15,10.5,12,10,11.5,150,TCS.NS\n\
             2024-03-15,20,21,19,20.5,300,\n",
        )
        .unwrap();

        let store = CsvStore::open(&file).unwrap();
        assert_eq!(store.len(), 2);
        let symbols = store.list_catalog_symbols(None).await.unwrap();
        assert_eq!(symbols, vec!["TCS.NS"]);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_load_dated_directory() {
        let root = scratch_dir("tree");
        for (date, close) in [("2024-03-14", 100.0), ("2024-03-15", 102.0)] {
            let day_dir = root.join(date);
            fs::create_dir_all(&day_dir).unwrap();
            fs::write(
                day_dir.join("INFY_NS.csv"),
                format!("Date,Open,High,Low,Close,Volume\n{date},1,1,1,{close},10\n"),
            )
            .unwrap();
        }
        fs::create_dir_all(root.join("not-a-date")).unwrap();

        let store = CsvStore::open(&root).unwrap();
        let dates = store.list_available_dates().await.unwrap();
        assert_eq!(dates.len(), 2);
        let symbols = store.list_catalog_symbols(None).await.unwrap();
        assert_eq!(symbols, vec!["INFY.NS"]);

        fs::remove_dir_all(root).unwrap();
    }
}
