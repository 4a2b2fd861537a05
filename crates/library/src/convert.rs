//! External comic-to-ebook conversion
//!
//! The converter is invoked as `{program} {options} -o {dir} {source}` and
//! is expected to leave `{stem}.kepub.epub` or `{stem}.epub` in `dir`.

use crate::error::{LibraryError, LibraryResult};
use log::{debug, info};
use shelfwatch_core::SourceFile;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Output suffixes in order of preference
const OUTPUT_EXTENSIONS: &[&str] = &[".kepub.epub", ".epub"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub program: String,
    pub args: Vec<String>,
    /// `None` waits for as long as the converter runs
    pub timeout: Option<Duration>,
    /// Delete the input once an output was produced
    pub remove_source: bool,
}

impl ConverterOptions {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
            remove_source: true,
        }
    }

    /// Splits a whitespace separated option string into arguments
    pub fn from_option_string(program: &str, options: &str) -> Self {
        Self::new(program, options.split_whitespace().map(str::to_string).collect())
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_remove_source(mut self, remove: bool) -> Self {
        self.remove_source = remove;
        self
    }
}

/// Runs the configured converter on comic archives
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConverterOptions,
}

impl Converter {
    pub fn new(options: ConverterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Sources that already carry metadata are moved as they are
    pub fn should_convert(source: &SourceFile) -> bool {
        !source.format().is_some_and(|f| f.carries_metadata())
    }

    /// Paths the converter may produce for `source`, most preferred first
    pub fn expected_outputs(source: &SourceFile) -> Vec<PathBuf> {
        OUTPUT_EXTENSIONS
            .iter()
            .map(|ext| source.directory().join(format!("{}{}", source.base_name, ext)))
            .collect()
    }

    /// Converts `source` and returns the produced file.
    ///
    /// The source is removed afterwards when configured to.
    pub async fn convert(&self, source: &SourceFile) -> LibraryResult<PathBuf> {
        let dir = source.directory();
        info!("Converting {}", source.path.display());

        let mut command = Command::new(&self.options.program);
        command
            .args(&self.options.args)
            .arg("-o")
            .arg(dir)
            .arg(&source.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = command.output();
        let output = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
                LibraryError::conversion(&source.path, format!("timed out after {:?}", limit))
            })?,
            None => run.await,
        }
        .map_err(|e| {
            LibraryError::conversion(&source.path, format!("failed to run {}: {}", self.options.program, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LibraryError::conversion(
                &source.path,
                format!("{} exited with {}: {}", self.options.program, output.status, stderr.trim()),
            ));
        }

        let produced = resolve_output(dir, &source.base_name).ok_or_else(|| {
            LibraryError::conversion(&source.path, "converter produced no output file")
        })?;
        debug!("Conversion produced {}", produced.display());

        if self.options.remove_source && produced != source.path {
            tokio::fs::remove_file(&source.path)
                .await
                .map_err(|e| LibraryError::filesystem(&source.path, e))?;
        }

        Ok(produced)
    }
}

/// First existing converter output for `base_name` in `dir`
pub fn resolve_output(dir: &Path, base_name: &str) -> Option<PathBuf> {
    OUTPUT_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{base_name}{ext}")))
        .find(|candidate| candidate.is_file())
}
