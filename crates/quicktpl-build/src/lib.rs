#![forbid(unsafe_code)]
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Batch driver for `quicktpl-compiler`.
//!
//! Finds template files, compiles each one with a fresh compiler and writes
//! the generated Go code next to the template (`page.qtpl` becomes
//! `page.qtpl.go`). A template's output is only written once it compiled
//! completely.

pub mod config;
mod error;

pub use config::{BuildConfig, DEFAULT_EXTENSION, DEFAULT_OUTPUT_SUFFIX};
pub use error::BuildError;
pub use quicktpl_compiler::{
    compile, compile_str, compile_with_options, package_name, telemetry, CompileOptions, Error,
};

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Files produced by a directory build, in walk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub written: Vec<PathBuf>,
}

/// Path of the generated file for `template`.
pub fn output_path(template: &Path, suffix: &str) -> PathBuf {
    let mut path = OsString::from(template.as_os_str());
    path.push(suffix);
    PathBuf::from(path)
}

/// Compiles one template and writes its generated file.
pub fn compile_file(path: &Path, config: &BuildConfig) -> Result<PathBuf, BuildError> {
    let file_path = path.to_str().ok_or_else(|| BuildError::NonUtf8Path {
        path: path.to_path_buf(),
    })?;
    let source = fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let generated = compile_with_options(Vec::new(), &source, file_path, &config.compile)
        .map_err(|source| BuildError::Compile {
            path: path.to_path_buf(),
            source,
        })?;

    let target = output_path(path, &config.output_suffix);
    fs::write(&target, generated).map_err(|source| BuildError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::info!(template = %path.display(), output = %target.display(), "wrote generated code");
    Ok(target)
}

/// Compiles every matching template below `dir`, stopping at the first
/// failure.
pub fn compile_dir(dir: &Path, config: &BuildConfig) -> Result<BuildReport, BuildError> {
    let mut report = BuildReport::default();
    for entry in WalkDir::new(dir).sort_by_file_name().follow_links(false) {
        let entry = entry.map_err(|source| BuildError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() || !config.matches(entry.path()) {
            continue;
        }
        tracing::debug!(template = %entry.path().display(), "compiling template");
        report.written.push(compile_file(entry.path(), config)?);
    }
    Ok(report)
}
