use crate::{
    engine::{ConvertError, Document, Engine},
    util::ensure_dir,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// `*.pdf` files directly inside `dir`, sorted by name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "pdf");
        if is_pdf && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn html_path(out_dir: &Path, pdf: &Path) -> PathBuf {
    let stem = pdf
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{stem}.html"))
}

/// Converts one file. The loaded document is dropped before this returns,
/// on success and on failure alike.
pub fn convert_file<E: Engine>(engine: &E, pdf: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
    let out = html_path(out_dir, pdf);
    info!("loading {}", pdf.display());
    let mut doc = engine.load(pdf)?;
    doc.save_html(&out)?;
    Ok(out)
}

/// Converts every PDF in `pdf_dir`. Per-file failures are logged and skipped.
pub fn convert_all<E: Engine>(engine: &E, pdf_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_dir(out_dir)?;
    let mut written = Vec::new();
    for pdf in list_pdfs(pdf_dir)? {
        info!("processing {}", pdf.display());
        match convert_file(engine, &pdf, out_dir) {
            Ok(out) => {
                info!("converted {} -> {}", pdf.display(), out.display());
                written.push(out);
            }
            Err(ConvertError::NotFound(p)) => error!("file not found: {}", p.display()),
            Err(ConvertError::InvalidFormat(p)) => error!("invalid PDF format: {}", p.display()),
            Err(err) => error!("error processing {}: {err}", pdf.display()),
        }
    }
    Ok(written)
}
