// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::fs;
use std::path::Path;

use quicktpl_compiler::CompileOptions;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;

pub const DEFAULT_EXTENSION: &str = "qtpl";
pub const DEFAULT_OUTPUT_SUFFIX: &str = ".go";

/// Settings for a batch build, usually read from a JSON file.
///
/// ```json
/// { "extension": "qtpl", "output_suffix": ".go", "compile": { "max_depth": 32 } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Template file extension, without the dot.
    pub extension: String,
    /// Appended to a template path to name its generated file.
    pub output_suffix: String,
    pub compile: CompileOptions,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            compile: CompileOptions::default(),
        }
    }
}

impl BuildConfig {
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let bytes = fs::read(path).map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|source| BuildError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Whether `path` carries the configured template extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension.trim_start_matches('.'))
    }
}
