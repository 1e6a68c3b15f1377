//! Job files: JSON descriptions of a combine run
//!
//! A job names the input files (in precedence order), where to write the
//! result and how to treat blank addresses, so a recurring merge can be
//! re-run without retyping flags.

use crate::dedup::{deduplicate, BlankAddressPolicy, DedupResult};
use crate::error::{Error, Result};
use crate::export::{default_output_path, export, OutputFormat};
use crate::normalizer::{dataset_label, standardize};
use crate::parser::parse_table;
use crate::report::DEFAULT_PREVIEW_ROWS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One input of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInput {
    /// CSV file to read
    pub path: PathBuf,
    /// Label used in summaries and errors; defaults to "File N"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl JobInput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            label: None,
        }
    }
}

/// A combine run stored as JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFile {
    /// Inputs in concatenation order; earlier inputs win ties
    pub inputs: Vec<JobInput>,
    /// Output file; defaults to `<Mon>_Addresses.<ext>` in the working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub blank_addresses: BlankAddressPolicy,
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_preview_rows() -> usize {
    DEFAULT_PREVIEW_ROWS
}

/// Result of running a job
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub result: DedupResult,
    /// Where the output was written
    pub output: PathBuf,
}

impl JobFile {
    /// Create a job over the given inputs with default settings
    pub fn new<I, P>(inputs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            inputs: inputs.into_iter().map(JobInput::new).collect(),
            output: None,
            format: OutputFormat::default(),
            blank_addresses: BlankAddressPolicy::default(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    /// Load a job file from JSON.
    ///
    /// Relative paths inside the job are resolved against the job file's
    /// directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut job: JobFile = serde_json::from_str(&content).map_err(Error::Json)?;

        if let Some(base) = path.parent() {
            job.resolve_relative(base);
        }
        Ok(job)
    }

    /// Save the job file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn resolve_relative(&mut self, base: &Path) {
        for input in &mut self.inputs {
            if input.path.is_relative() {
                input.path = base.join(&input.path);
            }
        }
        if let Some(output) = self.output.as_mut() {
            if output.is_relative() {
                *output = base.join(&*output);
            }
        }
    }

    /// Label for the input at `position`
    pub fn label_for(&self, position: usize) -> String {
        self.inputs
            .get(position)
            .and_then(|i| i.label.clone())
            .unwrap_or_else(|| dataset_label(position))
    }

    /// Output path, falling back to the dated default name
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(self.format))
    }

    /// Read, standardize and deduplicate the inputs without writing anything
    pub fn evaluate(&self) -> Result<DedupResult> {
        if self.inputs.is_empty() {
            return Err(Error::NoInputs);
        }

        let mut datasets = Vec::with_capacity(self.inputs.len());
        for (i, input) in self.inputs.iter().enumerate() {
            let table = parse_table(&input.path)?;
            datasets.push(standardize(&table, &self.label_for(i))?);
        }

        deduplicate(&datasets, self.blank_addresses)
    }

    /// Evaluate the job and write its output
    pub fn run(&self) -> Result<JobOutcome> {
        let result = self.evaluate()?;
        let output = self.output_path();
        export(&result, &output, self.format)?;

        info!(
            inputs = self.inputs.len(),
            output = %output.display(),
            "job complete"
        );
        Ok(JobOutcome { result, output })
    }
}
