use anyhow::{Context, Result};
use std::path::Path;

/// Trimmed, non-blank lines of a text file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

pub fn read_base_url(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading base url file: {}", path.display()))?;
    Ok(raw.trim().to_string())
}

/// Each suffix from the to-visit file appended verbatim to `base`.
pub fn read_urls_to_visit(path: &Path, base: &str) -> Result<Vec<String>> {
    let suffixes = read_lines(path)
        .with_context(|| format!("reading to-visit file: {}", path.display()))?;
    Ok(suffixes.into_iter().map(|s| format!("{base}{s}")).collect())
}
