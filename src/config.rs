//! Project configuration.
//!
//! A project is described by a `locus.toml` at its root: a name plus one
//! `[[target]]` block per build target. Compiler arguments are per target
//! because different targets of the same tree routinely compile with
//! different defines and include paths.
//!
//! ```toml
//! name = "robot"
//!
//! [[target]]
//! name = "Motion"
//! files = ["src/RootNode1.h", "src/RootNode1.cpp"]
//! compiler_args = ["-std=c++17", "-Iinclude"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LocusError, Result};
use crate::scan::BuildTargetConfig;

pub const CONFIG_FILE: &str = "locus.toml";
const GRAPH_DIR: &str = ".locus";
const GRAPH_FILE: &str = "graph.bin";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(rename = "target", default)]
    pub targets: Vec<BuildTargetConfig>,
}

impl ProjectConfig {
    /// Load `locus.toml` from a project root.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let text = fs::read_to_string(&path).map_err(|e| {
            LocusError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: ProjectConfig = toml::from_str(&text)
            .map_err(|e| LocusError::Config(format!("{}: {e}", path.display())))?;
        if config.targets.is_empty() {
            return Err(LocusError::Config(format!(
                "{}: no [[target]] blocks",
                path.display()
            )));
        }
        debug!(name = %config.name, targets = config.targets.len(), "config loaded");
        Ok(config)
    }
}

/// Where a project's graph snapshot lives.
pub fn graph_path(root: &Path) -> PathBuf {
    root.join(GRAPH_DIR).join(GRAPH_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &Path, text: &str) {
        let mut f = fs::File::create(dir.join(CONFIG_FILE)).unwrap();
        f.write_all(text.as_bytes()).unwrap();
    }

    #[test]
    fn test_load_full_config() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            r#"
name = "robot"

[[target]]
name = "Motion"
files = ["src/RootNode1.h", "src/RootNode1.cpp"]
compiler_args = ["-std=c++17"]

[[target]]
name = "Offline_Motion"
files = ["src/RootNode1.h"]
"#,
        );
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.name, "robot");
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0].compiler_args, vec!["-std=c++17"]);
        // compiler_args is optional per target.
        assert!(config.targets[1].compiler_args.is_empty());
    }

    #[test]
    fn test_missing_and_invalid_configs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(LocusError::Config(_))
        ));
        write_config(dir.path(), "name = 3");
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(LocusError::Config(_))
        ));
        write_config(dir.path(), "name = \"empty\"");
        assert!(matches!(
            ProjectConfig::load(dir.path()),
            Err(LocusError::Config(_))
        ));
    }

    #[test]
    fn test_graph_path_layout() {
        assert_eq!(
            graph_path(Path::new("/proj")),
            PathBuf::from("/proj/.locus/graph.bin")
        );
    }
}
