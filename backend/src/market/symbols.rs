use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Parses a symbol list: one symbol per line, uppercased and trimmed.
/// Blank lines, `#` comments and repeated symbols are dropped; order is kept.
pub fn parse_symbols(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_ascii_uppercase)
        .filter(|symbol| seen.insert(symbol.clone()))
        .collect()
}

pub fn load_symbols(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read symbol list {}", path.display()))?;

    let symbols = parse_symbols(&text);
    info!(count = symbols.len(), path = %path.display(), "loaded symbol list");
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_blanks_and_duplicates() {
        let text = "btcusdt\n\n# majors\n  ETHUSDT \nBTCUSDT\n#SOLUSDT\nsolusdt\n";
        assert_eq!(parse_symbols(text), vec!["BTCUSDT", "ETHUSDT", "SOLUSDT"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_symbols(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.txt"));
    }
}
