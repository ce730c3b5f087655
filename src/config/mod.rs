use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use crate::cli::OutputFormat;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub format: OutputFormat,
    /// Scan budget per indexing tick, in bytes. The per-call budget trades
    /// tick latency against total indexing time; it never affects the result.
    pub index_chunk_bytes: usize,
    /// Classification budget per tick, in lines.
    pub classify_chunk_lines: usize,
    pub markers: Vec<Marker>,
}

/// One start/end marker pair. Table position determines the type-id (1-based)
/// and the match priority.
#[derive(Debug, Clone, Deserialize)]
pub struct Marker {
    pub name: String,
    pub start: String,
    pub end: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            index_chunk_bytes: 1 << 25,
            classify_chunk_lines: 1 << 16,
            markers: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&Path>, root: &Path) -> Result<Self> {
        let path = config_path.map(Path::to_path_buf).or_else(|| {
            let default = root.join(".loglensrc.toml");
            default.exists().then_some(default)
        });

        match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content).map_err(|e| anyhow::anyhow!("Config parse error: {e}"))
            }
            None => Ok(Config::default()),
        }
    }

    pub const fn default_toml() -> &'static str {
        r#"# loglens configuration

# Scan budget per advance call while indexing, in bytes.
index_chunk_bytes = 33554432

# Classification budget per advance call, in lines.
classify_chunk_lines = 65536

# Marker pairs delimiting nested sections, tested in table order (first
# match wins; start patterns are tried before end patterns). Patterns use
# search semantics and may match anywhere in a line.
#
# [[markers]]
# name = "setup"
# start = '^START setup'
# end = '^END setup'
#
# [[markers]]
# name = "test"
# start = '^START test'
# end = '^END test'
"#
    }
}
