// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a build step, tagged with the path it concerns.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot compile {path}: {source}")]
    Compile {
        path: PathBuf,
        #[source]
        source: quicktpl_compiler::Error,
    },
    #[error("invalid build config {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("{path} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
}
