use crate::{
    catalog::CatalogRecord,
    config::Config,
    convert::convert_all,
    download::{DownloadOutcome, DownloadPlan, Downloader},
    engine::Engine,
    fetch::Fetcher,
    matcher::TypeFilter,
    util::ensure_dir,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Loaded, read-only inputs for one run.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub urls: Vec<String>,
    pub catalog: Vec<CatalogRecord>,
    pub columns: Vec<String>,
    pub filter: TypeFilter,
}

pub struct Pipeline<F: Fetcher> {
    cfg: Config,
    fetcher: F,
}

impl<F: Fetcher> Pipeline<F> {
    pub fn new(cfg: &Config, fetcher: F) -> Self {
        Self {
            cfg: cfg.clone(),
            fetcher,
        }
    }

    pub fn downloaded_dir(&self) -> PathBuf {
        PathBuf::from(&self.cfg.paths.downloaded_dir)
    }

    pub fn download(&self, inputs: &RunInputs) -> Result<DownloadOutcome> {
        let dir = self.downloaded_dir();
        ensure_dir(&dir)?;

        let plan = DownloadPlan {
            catalog: &inputs.catalog,
            columns: &inputs.columns,
            filter: &inputs.filter,
            id_column: &self.cfg.catalog.id_column,
            download_label: &self.cfg.download.download_label,
        };
        info!(
            "download stage pages={} catalog_records={} columns={:?}",
            inputs.urls.len(),
            inputs.catalog.len(),
            inputs.columns
        );
        Ok(Downloader::new(&self.fetcher, &dir).run(&inputs.urls, &plan))
    }

    /// Converts everything in the downloaded directory, including files left
    /// there by earlier runs.
    pub fn convert<E: Engine>(&self, engine: &E, out_dir: &Path) -> Vec<PathBuf> {
        let dir = self.downloaded_dir();
        info!("convert stage {} -> {}", dir.display(), out_dir.display());
        match convert_all(engine, &dir, out_dir) {
            Ok(written) => written,
            Err(err) => {
                error!("conversion stage failed: {err:#}");
                Vec::new()
            }
        }
    }
}
