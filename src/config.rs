use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub download: Download,
    #[serde(default)]
    pub converter: Converter,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.download.type_separator.is_empty() {
            bail!("download.type_separator must not be empty");
        }
        if self.download.download_label.is_empty() {
            bail!("download.download_label must not be empty");
        }
        if self.catalog.id_column.is_empty() {
            bail!("catalog.id_column must not be empty");
        }
        if self.converter.program.trim().is_empty() {
            bail!("converter.program must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Paths {
    pub downloaded_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            downloaded_dir: "downloaded".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
    pub user_agent: String,
    /// 0 keeps the HTTP client default.
    pub timeout_seconds: u64,
}
impl Default for Http {
    fn default() -> Self {
        Self {
            user_agent: concat!("autodocs/", env!("CARGO_PKG_VERSION")).into(),
            timeout_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub id_column: String,
    pub skip_rows_after_header: usize,
    /// Worksheet name; empty selects the first sheet.
    pub sheet: String,
}
impl Default for Catalog {
    fn default() -> Self {
        Self {
            id_column: "Id".into(),
            skip_rows_after_header: 1,
            sheet: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Download {
    pub type_separator: String,
    pub download_label: String,
}
impl Default for Download {
    fn default() -> Self {
        Self {
            type_separator: "-".into(),
            download_label: "Download".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Converter {
    pub program: String,
    /// `{input}` and `{output}` are replaced per document.
    pub args: Vec<String>,
    pub timeout_seconds: u64,
    pub check_pdf_header: bool,
    pub env: std::collections::BTreeMap<String, String>,
}
impl Default for Converter {
    fn default() -> Self {
        Self {
            program: "pdftohtml".into(),
            args: vec![
                "-s".into(),
                "-noframes".into(),
                "-q".into(),
                "-dataurls".into(),
                "{input}".into(),
                "{output}".into(),
            ],
            timeout_seconds: 300,
            check_pdf_header: true,
            env: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Output {
    pub print_summary: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            print_summary: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Debug {
    pub dump_effective_config: bool,
}
