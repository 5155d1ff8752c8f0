use crate::{
    catalog::CatalogRecord,
    fetch::{FetchError, Fetcher},
    matcher::{TypeFilter, eligible_links, find_matches},
    page,
    util::sha256_hex,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

/// Everything the download stage needs besides the fetcher.
#[derive(Debug, Clone)]
pub struct DownloadPlan<'a> {
    pub catalog: &'a [CatalogRecord],
    pub columns: &'a [String],
    pub filter: &'a TypeFilter,
    pub id_column: &'a str,
    pub download_label: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadOutcome {
    pub pages_visited: usize,
    pub saved: Vec<PathBuf>,
}

pub struct Downloader<'f, F: Fetcher> {
    fetcher: &'f F,
    out_dir: PathBuf,
}

impl<'f, F: Fetcher> Downloader<'f, F> {
    pub fn new(fetcher: &'f F, out_dir: &Path) -> Self {
        Self {
            fetcher,
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Visits every page in order. A page that cannot be fetched is skipped.
    pub fn run(&self, urls: &[String], plan: &DownloadPlan<'_>) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::default();
        for url in urls {
            info!("visiting {url}");
            match self.process_page(url, plan) {
                Ok(saved) => {
                    outcome.pages_visited += 1;
                    outcome.saved.extend(saved);
                }
                Err(err) => warn!("skipping page: {err}"),
            }
        }
        info!(
            "download finished pages={} pdfs={}",
            outcome.pages_visited,
            outcome.saved.len()
        );
        outcome
    }

    pub fn process_page(
        &self,
        page_url: &str,
        plan: &DownloadPlan<'_>,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let body = self.fetcher.get_text(page_url)?;
        let rows = page::parse_rows(&body);
        let matches = find_matches(&rows, plan.catalog, plan.columns);
        debug!("page {page_url}: rows={} matches={}", rows.len(), matches.len());

        let mut saved = Vec::new();
        for (record, row) in matches {
            let Some(id) = record.value(plan.id_column) else {
                warn!("matched record has no {} value; skipping: {:?}", plan.id_column, record.cells());
                continue;
            };
            for (anchor, kind) in eligible_links(row, plan.filter) {
                let Some(href) = anchor.href.as_deref() else {
                    warn!("link {:?} on {page_url} has no href", anchor.label);
                    continue;
                };
                let detail_url = resolve_href(page_url, href);
                let pdf_urls = match self.resolve_pdf_links(&detail_url, plan.download_label) {
                    Ok(urls) => urls,
                    Err(err) => {
                        warn!("skipping link {:?}: {err}", anchor.label);
                        continue;
                    }
                };
                if pdf_urls.is_empty() {
                    warn!("no {:?} link on {detail_url}", plan.download_label);
                }

                // Several download links for one anchor all land on the same file.
                let target = output_path(&self.out_dir, id, kind);
                let mut written = false;
                for pdf_url in pdf_urls {
                    info!("downloading {pdf_url}");
                    match self.save_pdf(&pdf_url, &target) {
                        Ok(()) => written = true,
                        Err(err) => warn!("failed to download pdf: {err:#}"),
                    }
                }
                if written && !saved.contains(&target) {
                    saved.push(target);
                }
            }
        }
        Ok(saved)
    }

    /// Second hop: fetch the detail page and return the absolute hrefs of its
    /// `download_label` links.
    pub fn resolve_pdf_links(
        &self,
        detail_url: &str,
        download_label: &str,
    ) -> Result<Vec<String>, FetchError> {
        let body = self.fetcher.get_text(detail_url)?;
        let links = page::find_labelled_links(&body, download_label);
        Ok(links
            .iter()
            .map(|href| resolve_href(detail_url, href))
            .collect())
    }

    /// Overwrites `target` if it already exists.
    pub fn save_pdf(&self, pdf_url: &str, target: &Path) -> Result<()> {
        let bytes = self.fetcher.get(pdf_url)?;
        std::fs::write(target, &bytes)
            .with_context(|| format!("writing {}", target.display()))?;
        info!(
            "saved {} bytes={} sha256={}",
            target.display(),
            bytes.len(),
            sha256_hex(&bytes)
        );
        Ok(())
    }
}

pub fn output_path(dir: &Path, id: &str, kind: &str) -> PathBuf {
    dir.join(format!("{id}_{kind}.pdf"))
}

/// `href` joined onto `base`; returned unchanged when either does not parse.
pub fn resolve_href(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
