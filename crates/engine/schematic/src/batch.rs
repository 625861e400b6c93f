//! Batch orchestration
//!
//! Every input path is attempted, whatever happened to the ones before it.
//! Failures are collected as [`FileOutcome`] values and never cross the
//! per-file boundary, panics included.

use crate::config::{ConversionOptions, RunConfig, Settings};
use crate::dispatch::{Converter, FileKind};
use crate::error::{ConfigError, ConvertError, Result};
use crate::export::Exporter;
use crate::validate::validate;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Result of one input file
#[derive(Debug)]
pub enum FileOutcome {
    Converted { input: PathBuf, output: PathBuf },
    Failed { input: PathBuf, reason: ConvertError },
}

impl FileOutcome {
    pub fn input(&self) -> &Path {
        match self {
            FileOutcome::Converted { input, .. } | FileOutcome::Failed { input, .. } => input,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

/// Outcomes of a whole run, in processing order
#[derive(Debug, Default)]
pub struct BatchReport {
    outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    /// True when every file converted (and for an empty run)
    pub fn success(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }

    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    pub fn converted(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Converts input paths one after another into the output directory
#[derive(Debug)]
pub struct Batch {
    options: ConversionOptions,
    settings: Settings,
    exporter: Exporter,
}

impl Batch {
    pub fn new(
        options: ConversionOptions,
        settings: Settings,
        output_dir: &Path,
    ) -> std::result::Result<Self, ConfigError> {
        let exporter = Exporter::new(output_dir, options.palette_path.as_deref())?;
        Ok(Self {
            options,
            settings,
            exporter,
        })
    }

    pub fn from_config(config: &RunConfig) -> std::result::Result<Self, ConfigError> {
        Self::new(config.options.clone(), config.settings, &config.output_dir)
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Convert every path (files or directories) and report per-file outcomes
    pub fn run<S: AsRef<str>>(&self, paths: &[S]) -> BatchReport {
        let mut report = BatchReport::new();
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                error!("{}", ConvertError::EmptyPath);
                report.record(FileOutcome::Failed {
                    input: PathBuf::new(),
                    reason: ConvertError::EmptyPath,
                });
                continue;
            }
            self.process_path(Path::new(path), &mut report);
        }
        report
    }

    fn process_path(&self, path: &Path, report: &mut BatchReport) {
        if path.is_dir() {
            self.process_directory(path, report);
            return;
        }

        let outcome = match self.process_file(path) {
            Ok(output) => FileOutcome::Converted {
                input: path.to_path_buf(),
                output,
            },
            Err(reason) => {
                error!("{}: {}", path.display(), reason);
                FileOutcome::Failed {
                    input: path.to_path_buf(),
                    reason,
                }
            }
        };
        report.record(outcome);
    }

    fn process_directory(&self, dir: &Path, report: &mut BatchReport) {
        info!("Processing directory: {}", dir.display());
        let entries = match list_directory(dir) {
            Ok(entries) => entries,
            Err(reason) => {
                error!("{}: {}", dir.display(), reason);
                report.record(FileOutcome::Failed {
                    input: dir.to_path_buf(),
                    reason,
                });
                return;
            }
        };
        for entry in entries {
            self.process_path(&entry, report);
        }
    }

    fn process_file(&self, path: &Path) -> Result<PathBuf> {
        if !path.exists() {
            return Err(ConvertError::NotFound(path.to_path_buf()));
        }
        if FileKind::from_path(path).is_none() {
            return Err(ConvertError::UnsupportedExtension(path.to_path_buf()));
        }

        info!("Processing file: {}", path.display());
        panic::catch_unwind(AssertUnwindSafe(|| self.convert_file(path)))
            .unwrap_or_else(|payload| Err(ConvertError::Panicked(panic_message(payload))))
    }

    /// dispatch -> convert -> validate -> export
    fn convert_file(&self, path: &Path) -> Result<PathBuf> {
        let converter = Converter::new(path, &self.options)?;
        let grid = converter.convert(&self.settings)?;
        info!(
            "Grid for {}: width {}, length {}, height {} ({} voxels)",
            path.display(),
            grid.width(),
            grid.length(),
            grid.height(),
            grid.len()
        );
        validate(&grid)?;
        self.exporter.export(path, grid)
    }
}

/// Directory entries sorted by path
///
/// Symlinks to directories are not descended into, so a link back to an
/// ancestor can't make the walk endless. Symlinked files are still listed.
fn list_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_symlink() && path.is_dir() {
            warn!("Skipping symlinked directory {}", path.display());
            continue;
        }
        entries.push(path);
    }
    entries.sort();
    Ok(entries)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
