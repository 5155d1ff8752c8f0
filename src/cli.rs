use crate::{
    catalog::load_catalog,
    config::Config,
    engine::CommandEngine,
    fetch::{Credentials, HttpFetcher},
    inputs::{read_base_url, read_urls_to_visit},
    matcher::TypeFilter,
    pipeline::{Pipeline, RunInputs},
    report::RunSummary,
    util::{ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_USERNAME: &str = "user";
const DEFAULT_PASSWORD: &str = "password";

#[derive(Parser, Debug)]
#[command(name = "autodocs")]
#[command(about = "Download catalog-matched PDFs from listing pages and convert them to HTML")]
pub struct Args {
    /// File holding the base URL (single line).
    pub base_link_file: PathBuf,

    /// File with URL suffixes to visit, one per line.
    pub to_visit_links_file: PathBuf,

    /// Catalog spreadsheet with the items to look for.
    pub to_look_for: PathBuf,

    /// Allowed-types file. Only the first value is read.
    #[arg(required = true, num_args = 1..)]
    pub types: Vec<String>,

    /// Separator between type and suffix in link labels, e.g. "-" in "ISIN-FX".
    #[arg(long = "type_separator", visible_alias = "type-separator")]
    pub type_separator: Option<String>,

    /// Directory for converted HTML files. Conversion is skipped when absent.
    #[arg(long = "output_dir", visible_alias = "output-dir")]
    pub output_dir: Option<PathBuf>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub password: Option<String>,

    /// Catalog columns whose values must all appear in a table row.
    #[arg(long, num_args = 1..)]
    pub columns: Vec<String>,

    /// Directory for downloaded PDFs (overrides paths.downloaded_dir).
    #[arg(long)]
    pub downloaded_dir: Option<PathBuf>,

    /// Path to config TOML. If omitted, uses ./autodocs.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn dispatch(args: Args) -> Result<()> {
    let mut cfg = match resolve_config_path(args.config.as_deref()) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    apply_overrides(&mut cfg, &args);
    cfg.validate()?;

    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;
    run(&args, &cfg)
}

fn resolve_config_path(user: Option<&Path>) -> Option<PathBuf> {
    if let Some(p) = user {
        return Some(p.to_path_buf());
    }
    let default = PathBuf::from("autodocs.toml");
    default.exists().then_some(default)
}

pub fn apply_overrides(cfg: &mut Config, args: &Args) {
    if let Some(sep) = &args.type_separator {
        cfg.download.type_separator = sep.clone();
    }
    if let Some(dir) = &args.downloaded_dir {
        cfg.paths.downloaded_dir = dir.display().to_string();
    }
}

pub fn credentials(args: &Args) -> Credentials {
    if args.username.is_none() || args.password.is_none() {
        warn!("--username/--password not given; falling back to built-in defaults");
    }
    Credentials {
        username: args
            .username
            .clone()
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
        password: args
            .password
            .clone()
            .unwrap_or_else(|| DEFAULT_PASSWORD.to_string()),
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.downloaded_dir).join("autodocs.log"))
}

fn load_inputs(args: &Args, cfg: &Config) -> Result<RunInputs> {
    let base = read_base_url(&args.base_link_file)?;
    let urls = read_urls_to_visit(&args.to_visit_links_file, &base)?;

    let sheet = Some(cfg.catalog.sheet.as_str()).filter(|s| !s.is_empty());
    let catalog = load_catalog(&args.to_look_for, sheet, cfg.catalog.skip_rows_after_header)?;

    let (types_file, extra) = args
        .types
        .split_first()
        .ok_or_else(|| anyhow!("at least one types argument is required"))?;
    if !extra.is_empty() {
        warn!("ignoring extra types arguments: {:?}", extra);
    }
    let filter = TypeFilter::load(Path::new(types_file), &cfg.download.type_separator)?;

    info!(
        "loaded pages={} catalog_records={} allowed_types={}",
        urls.len(),
        catalog.len(),
        filter.allowed.len()
    );
    Ok(RunInputs {
        urls,
        catalog,
        columns: args.columns.clone(),
        filter,
    })
}

fn run(args: &Args, cfg: &Config) -> Result<()> {
    let started = now_rfc3339();
    let inputs = load_inputs(args, cfg)?;

    let downloaded_dir = PathBuf::from(&cfg.paths.downloaded_dir);
    ensure_dir(&downloaded_dir)?;
    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(downloaded_dir.join("effective-config.toml"), raw)?;
    }

    let fetcher = HttpFetcher::new(cfg, credentials(args))?;
    let pipeline = Pipeline::new(cfg, fetcher);
    let outcome = pipeline.download(&inputs)?;

    let html_written = match &args.output_dir {
        Some(out_dir) => match CommandEngine::new(cfg) {
            Ok(engine) => Some(pipeline.convert(&engine, out_dir)),
            Err(err) => {
                error!("converter unavailable, skipping conversion: {err:#}");
                Some(Vec::new())
            }
        },
        None => None,
    };

    if cfg.output.print_summary {
        let summary = RunSummary {
            started,
            finished: now_rfc3339(),
            pages_visited: outcome.pages_visited,
            pdfs_saved: outcome.saved,
            html_written,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    Ok(())
}
