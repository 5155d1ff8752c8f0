use super::{ConvertError, Document, Engine};
use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";
// Readers accept the header anywhere in the first KiB.
const HEADER_WINDOW: usize = 1024;

/// Runs an external converter program once per document.
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    check_pdf_header: bool,
}

impl CommandEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let program = PathBuf::from(cfg.converter.program.trim());
        if program.components().count() > 1 && !program.exists() {
            return Err(anyhow!("converter program not found: {}", program.display()));
        }
        if !cfg.converter.args.iter().any(|a| a.contains("{input}")) {
            warn!("converter.args has no {{input}} placeholder");
        }
        Ok(Self {
            program,
            args: cfg.converter.args.clone(),
            env: cfg.converter.env.clone(),
            timeout: (cfg.converter.timeout_seconds > 0)
                .then(|| Duration::from_secs(cfg.converter.timeout_seconds)),
            check_pdf_header: cfg.converter.check_pdf_header,
        })
    }
}

impl Engine for CommandEngine {
    type Document = CommandDocument;

    fn load(&self, pdf: &Path) -> Result<CommandDocument, ConvertError> {
        if !pdf.is_file() {
            return Err(ConvertError::NotFound(pdf.to_path_buf()));
        }
        if self.check_pdf_header && !has_pdf_header(pdf)? {
            return Err(ConvertError::InvalidFormat(pdf.to_path_buf()));
        }
        let workspace = tempfile::Builder::new().prefix("autodocs-").tempdir()?;
        debug!("loaded {} workspace={}", pdf.display(), workspace.path().display());
        Ok(CommandDocument {
            input: pdf.to_path_buf(),
            workspace,
            program: self.program.clone(),
            args: self.args.clone(),
            env: self.env.clone(),
            timeout: self.timeout,
        })
    }
}

/// A loaded document. Its scratch directory is removed on drop.
pub struct CommandDocument {
    input: PathBuf,
    workspace: TempDir,
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl CommandDocument {
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    fn staged_output(&self) -> PathBuf {
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".into());
        self.workspace.path().join(format!("{stem}.html"))
    }

    fn fail(&self, reason: impl Into<String>) -> ConvertError {
        ConvertError::Conversion {
            path: self.input.clone(),
            reason: reason.into(),
        }
    }

    // Images and stylesheets the converter wrote beside the HTML would be
    // lost with the workspace; they go next to `out` under the same names.
    fn copy_companions(&self, staged: &Path, out: &Path) -> Result<(), ConvertError> {
        let dest_dir = out.parent().unwrap_or_else(|| Path::new("."));
        for entry in std::fs::read_dir(self.workspace.path())? {
            let path = entry?.path();
            if path == staged || !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name() {
                debug!("keeping converter output {}", path.display());
                std::fs::copy(&path, dest_dir.join(name))?;
            }
        }
        Ok(())
    }
}

impl Document for CommandDocument {
    fn save_html(&mut self, out: &Path) -> Result<(), ConvertError> {
        let staged = self.staged_output();
        let input = self.input.display().to_string();
        let output = staged.display().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(
            self.args
                .iter()
                .map(|a| a.replace("{input}", &input).replace("{output}", &output)),
        );
        cmd.current_dir(self.workspace.path());
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        debug!("running {:?}", cmd);

        let child = cmd
            .spawn()
            .map_err(|e| self.fail(format!("spawning {}: {e}", self.program.display())))?;
        let result = match self.timeout {
            Some(t) => wait_with_timeout(child, t),
            None => child.wait_with_output().with_context(|| "waiting for converter"),
        };
        let result = result.map_err(|e| self.fail(format!("{e:#}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(self.fail(format!("{}: {}", result.status, stderr.trim())));
        }
        if !staged.is_file() {
            return Err(self.fail(format!("converter produced no {}", staged.display())));
        }
        std::fs::copy(&staged, out)?;
        self.copy_companions(&staged, out)?;
        Ok(())
    }
}

fn has_pdf_header(path: &Path) -> Result<bool, ConvertError> {
    let mut buf = Vec::with_capacity(HEADER_WINDOW);
    std::fs::File::open(path)?
        .take(HEADER_WINDOW as u64)
        .read_to_end(&mut buf)?;
    Ok(buf.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC))
}

fn wait_with_timeout(mut child: Child, timeout: Duration) -> Result<Output> {
    // Drain pipes while waiting so a chatty converter can't block on a full buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf).with_context(|| "read stdout")?;
        }
        Ok(buf)
    });
    let stderr_thread = std::thread::spawn(move || -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf).with_context(|| "read stderr")?;
        }
        Ok(buf)
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait().with_context(|| "try_wait")? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            child.wait().with_context(|| "wait after kill")?;
            let _ = stdout_thread.join();
            let _ = stderr_thread.join();
            return Err(anyhow!("converter exceeded timeout ({:?})", timeout));
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let stdout = stdout_thread
        .join()
        .map_err(|_| anyhow!("stdout reader thread panicked"))??;
    let stderr = stderr_thread
        .join()
        .map_err(|_| anyhow!("stderr reader thread panicked"))??;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}
