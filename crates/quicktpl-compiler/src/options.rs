// SPDX-License-Identifier: Apache-2.0 OR MIT
use serde::{Deserialize, Serialize};

pub const DEFAULT_RUNTIME_PACKAGE: &str = "quicktemplate";
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for a single compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Package identifier used for writer and buffer pool calls in the
    /// generated code.
    pub runtime_package: String,
    /// Maximum number of simultaneously open blocks, the enclosing `func`
    /// included.
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompileOptions {
    pub fn with_runtime_package(mut self, package: impl Into<String>) -> Self {
        self.runtime_package = package.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
