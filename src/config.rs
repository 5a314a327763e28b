//! Run configuration loaded from a TOML file.
//!
//! ```toml
//! types_file = "subcircuit-types.txt"
//! encoding = "omitted"
//! seed = 42
//! max_entities = 128
//! resample = true
//! normalize = false
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::encoder::Encoding;
use crate::error::{NetgraphError, Result};
use crate::registry::TypeRegistry;

pub const DEFAULT_SEED: u64 = 0;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Side file extending the type registry with subcircuit labels.
    pub types_file: Option<PathBuf>,
    pub encoding: Option<Encoding>,
    pub seed: Option<u64>,
    /// Entity bound for batches; defaults to the corpus maximum.
    pub max_entities: Option<usize>,
    /// Downsample samples so every hidden type occurs equally often.
    #[serde(default)]
    pub resample: bool,
    /// Standardize feature columns of the encoded batch.
    #[serde(default)]
    pub normalize: bool,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| NetgraphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text).map_err(|e| match e {
            NetgraphError::Config(msg) => NetgraphError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| NetgraphError::Config(e.message().to_string()))
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding.unwrap_or(Encoding::Masked)
    }

    /// Registry from `types_file`, or the built-in one.
    pub fn registry(&self) -> Result<TypeRegistry> {
        match &self.types_file {
            Some(path) => TypeRegistry::from_side_file(path),
            None => Ok(TypeRegistry::builtin()),
        }
    }
}
