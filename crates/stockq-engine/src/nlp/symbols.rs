//! Ticker resolution against the known-symbol catalog

use regex::Regex;

/// Lookup tables derived from a catalog
///
/// `full` maps lowercased canonical symbols (`reliance.ns`) and `base` maps
/// lowercased symbols with the exchange suffix stripped (`reliance`). Both
/// keep catalog order.
#[derive(Debug, Clone, Default)]
pub struct SymbolCatalog {
    full: Vec<(String, String)>,
    base: Vec<(String, String)>,
}

impl SymbolCatalog {
    pub fn new<S: AsRef<str>>(catalog: &[S]) -> Self {
        let mut full: Vec<(String, String)> = Vec::with_capacity(catalog.len());
        let mut base: Vec<(String, String)> = Vec::with_capacity(catalog.len());

        for symbol in catalog {
            let canonical = symbol.as_ref().to_string();
            let lower = canonical.to_lowercase();
            let base_key = lower.split('.').next().unwrap_or(&lower).to_string();

            upsert(&mut full, lower, canonical.clone());
            upsert(&mut base, base_key, canonical);
        }

        Self { full, base }
    }

    pub fn is_empty(&self) -> bool {
        self.full.is_empty()
    }

    /// Symbols mentioned in `text`, in catalog order
    ///
    /// Full symbols are substring-matched first. Only when none match are
    /// base symbols tried, as whole words, so "it" never matches inside
    /// "with".
    pub fn resolve(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for (key, canonical) in &self.full {
            if text.contains(key.as_str()) {
                push_unique(&mut found, canonical);
            }
        }

        if found.is_empty() {
            for (key, canonical) in &self.base {
                let pattern = format!(r"\b{}\b", regex::escape(key));
                if Regex::new(&pattern).is_ok_and(|re| re.is_match(text)) {
                    push_unique(&mut found, canonical);
                }
            }
        }

        found
    }
}

/// Later catalog entries win the value, the first entry keeps the position
fn upsert(map: &mut Vec<(String, String)>, key: String, value: String) {
    match map.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => map.push((key, value)),
    }
}

fn push_unique(found: &mut Vec<String>, symbol: &str) {
    if !found.iter().any(|s| s == symbol) {
        found.push(symbol.to_string());
    }
}

/// Resolve symbols in normalized text against `catalog`
pub fn resolve_symbols<S: AsRef<str>>(text: &str, catalog: &[S]) -> Vec<String> {
    SymbolCatalog::new(catalog).resolve(text)
}
