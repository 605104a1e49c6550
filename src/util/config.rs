//! Configuration file support for fedtypes.
//!
//! fedtypes supports two configuration file locations:
//! - Global: `~/.fedtypes/config.toml` - User-wide defaults
//! - Project: `.fedtypes/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::discovery::{SearchPolicy, DEFAULT_EXCLUDES};
use crate::core::manifest::MANIFEST_NAME;

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "node_modules/@types/__federated_types";

/// fedtypes configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Manifest discovery settings
    pub discovery: DiscoveryConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Declaration compiler settings
    pub compiler: CompilerConfig,
}

/// Manifest discovery configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscoveryConfig {
    /// Search policy when no explicit manifest is given (first-match, unique)
    pub policy: Option<String>,

    /// Manifest file name to search for
    pub manifest_name: Option<String>,

    /// Directory names whose subtrees are never searched
    pub exclude: Option<Vec<String>>,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Shared type-declarations directory
    pub dir: Option<PathBuf>,
}

/// Declaration compiler configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CompilerConfig {
    /// Compiler program (e.g. `tsc`, `npx`)
    pub program: Option<PathBuf>,

    /// Arguments placed before the compiler flags (e.g. `["--no-install", "tsc"]`)
    pub args: Vec<String>,

    /// Treat error diagnostics as fatal
    pub strict: Option<bool>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Discovery settings
        if other.discovery.policy.is_some() {
            self.discovery.policy = other.discovery.policy;
        }
        if other.discovery.manifest_name.is_some() {
            self.discovery.manifest_name = other.discovery.manifest_name;
        }
        if other.discovery.exclude.is_some() {
            self.discovery.exclude = other.discovery.exclude;
        }

        // Output settings
        if other.output.dir.is_some() {
            self.output.dir = other.output.dir;
        }

        // Compiler settings
        if other.compiler.program.is_some() {
            self.compiler.program = other.compiler.program;
            self.compiler.args = other.compiler.args;
        } else if !other.compiler.args.is_empty() {
            self.compiler.args = other.compiler.args;
        }
        if other.compiler.strict.is_some() {
            self.compiler.strict = other.compiler.strict;
        }
    }

    /// Parse the configured search policy.
    pub fn search_policy(&self) -> Result<SearchPolicy> {
        match self.discovery.policy.as_deref() {
            Some(policy) => policy
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid discovery policy in config: {}", e)),
            None => Ok(SearchPolicy::default()),
        }
    }

    /// Manifest file name, defaulting to `federation.config.json`.
    pub fn manifest_name(&self) -> &str {
        self.discovery
            .manifest_name
            .as_deref()
            .unwrap_or(MANIFEST_NAME)
    }

    /// Excluded directory names, defaulting to the vendored-dependency directories.
    pub fn excludes(&self) -> Vec<String> {
        match &self.discovery.exclude {
            Some(exclude) => exclude.clone(),
            None => DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether compiler errors are fatal, off unless configured.
    pub fn strict(&self) -> bool {
        self.compiler.strict.unwrap_or(false)
    }

    /// Output directory, relative entries resolve against the working directory later.
    pub fn output_dir(&self) -> PathBuf {
        self.output
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.fedtypes/config.toml)
/// 2. Global config (~/.fedtypes/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global fedtypes config directory (~/.fedtypes).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".fedtypes"))
}

/// Get the global config path (~/.fedtypes/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.fedtypes/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".fedtypes").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.manifest_name(), "federation.config.json");
        assert_eq!(config.excludes(), vec!["node_modules", ".git"]);
        assert_eq!(config.output_dir(), PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.search_policy().unwrap(), SearchPolicy::FirstMatch);
        assert!(!config.strict());
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[discovery]
policy = "unique"
manifest-name = "mf.json"
exclude = ["vendor"]

[output]
dir = "types/federated"

[compiler]
program = "npx"
args = ["--no-install", "tsc"]
strict = true
"#,
        )
        .unwrap();

        assert_eq!(config.search_policy().unwrap(), SearchPolicy::Unique);
        assert_eq!(config.manifest_name(), "mf.json");
        assert_eq!(config.excludes(), vec!["vendor"]);
        assert_eq!(config.output_dir(), PathBuf::from("types/federated"));
        assert_eq!(config.compiler.program, Some(PathBuf::from("npx")));
        assert_eq!(config.compiler.args, vec!["--no-install", "tsc"]);
        assert!(config.strict());
    }

    #[test]
    fn test_invalid_policy() {
        let config: Config = toml::from_str("[discovery]\npolicy = \"sometimes\"\n").unwrap();
        assert!(config.search_policy().is_err());
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(
            &global,
            "[output]\ndir = \"global-out\"\n[compiler]\nprogram = \"tsc\"\n",
        )
        .unwrap();
        std::fs::write(&project, "[output]\ndir = \"project-out\"\n").unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.output_dir(), PathBuf::from("project-out"));
        assert_eq!(config.compiler.program, Some(PathBuf::from("tsc")));
    }

    #[test]
    fn test_project_can_turn_strict_off() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[compiler]\nstrict = true\n").unwrap();

        std::fs::write(&project, "[output]\ndir = \"out\"\n").unwrap();
        assert!(load_config(Some(&global), &project).strict());

        std::fs::write(&project, "[compiler]\nstrict = false\n").unwrap();
        assert!(!load_config(Some(&global), &project).strict());
    }

    #[test]
    fn test_broken_config_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("config.toml");
        std::fs::write(&project, "this is = = not toml").unwrap();

        let config = load_config(None, &project);
        assert_eq!(config.output_dir(), PathBuf::from(DEFAULT_OUTPUT_DIR));
    }
}
