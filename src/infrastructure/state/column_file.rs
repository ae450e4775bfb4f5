use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::models::Column;

/// Columns persisted between cycles
///
/// Reads either a JSON array of columns or one column per line, which is
/// what [`ColumnWriter`] produces. Blank lines are ignored.
pub struct ColumnFile;

impl ColumnFile {
    /// Load prior columns. A missing file is an empty state.
    pub fn load(path: &Path) -> Result<Vec<Column>> {
        if !path.exists() {
            debug!(path = %path.display(), "No prior column state");
            return Ok(Vec::new());
        }

        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read column state from {}", path.display()))?;
        let columns = Self::parse(&text)
            .with_context(|| format!("Failed to parse column state in {}", path.display()))?;

        debug!(path = %path.display(), count = columns.len(), "Loaded prior columns");
        Ok(columns)
    }

    /// Parse a JSON array or JSON lines.
    pub fn parse(text: &str) -> Result<Vec<Column>> {
        let trimmed = text.trim_start();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).context("Invalid column array");
        }

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line)
                    .with_context(|| format!("Invalid column on line {}", idx + 1))
            })
            .collect()
    }
}

/// Writes columns as JSON lines to a file or stdout
pub struct ColumnWriter {
    out: Box<dyn Write + Send>,
    path: Option<PathBuf>,
    written: usize,
}

impl ColumnWriter {
    /// Write to `path`, truncating it, or to stdout when `None`.
    pub fn create(path: Option<&Path>) -> Result<Self> {
        let out: Box<dyn Write + Send> = match path {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                Box::new(BufWriter::new(file))
            }
            None => Box::new(io::stdout()),
        };
        Ok(Self {
            out,
            path: path.map(Path::to_path_buf),
            written: 0,
        })
    }

    /// Wrap an arbitrary writer.
    pub fn from_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            path: None,
            written: 0,
        }
    }

    pub fn write(&mut self, column: &Column) -> Result<()> {
        serde_json::to_writer(&mut self.out, column).context("Failed to serialize column")?;
        self.out.write_all(b"\n").context("Failed to write column")?;
        self.written += 1;
        Ok(())
    }

    /// Whether columns go to stdout
    pub const fn is_stdout(&self) -> bool {
        self.path.is_none()
    }

    pub const fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<usize> {
        self.out.flush().context("Failed to flush column output")?;
        Ok(self.written)
    }
}
