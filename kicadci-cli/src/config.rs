//! Configuration file loading for kicadci.
//!
//! Discovers and loads `kicadci.toml` from the project directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use kicadci_core::Toolchain;
use kicadci_core::settings::ProcessEnv;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "kicadci.toml";

/// Top-level configuration from kicadci.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KicadciConfig {
    /// Exporter locations; unset keys keep their built-in defaults.
    pub tools: Toolchain,

    /// Extra environment for child processes, layered over the headless defaults.
    pub env: BTreeMap<String, String>,
}

/// Discover the kicadci.toml config file.
///
/// Searches for `kicadci.toml` in the project directory.
/// Returns `None` if no config file is found.
pub fn discover_config(project_dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a kicadci.toml config file.
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<KicadciConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<KicadciConfig> {
    let config: KicadciConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load the explicit config file if given, else discover one in `project_dir`,
/// else fall back to defaults.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    project_dir: &Utf8Path,
) -> anyhow::Result<KicadciConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match discover_config(project_dir) {
        Some(path) => load_config(&path),
        None => Ok(KicadciConfig::default()),
    }
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub toolchain: Toolchain,
    pub env: ProcessEnv,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: KicadciConfig,
}

impl ConfigMerger {
    /// Create a new merger from a loaded config.
    pub fn new(config: KicadciConfig) -> Self {
        Self { config }
    }

    /// Merge with CLI arguments.
    ///
    /// Environment precedence: headless defaults, then the config file, then `--env`.
    pub fn merge(self, cli_env: &BTreeMap<String, String>) -> MergedConfig {
        let mut env = ProcessEnv::default();
        env.extend(self.config.env);
        env.extend(cli_env.iter().map(|(k, v)| (k.clone(), v.clone())));

        MergedConfig {
            toolchain: self.config.tools,
            env,
        }
    }
}

/// Parse CLI env entries from KEY=VALUE strings.
///
/// Values may be empty (`KEY=`); keys may not.
pub fn parse_cli_env(entries: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("invalid env '{}': expected KEY=VALUE", entry))?;
        let key = key.trim();
        if key.is_empty() {
            anyhow::bail!("invalid env '{}': missing key", entry);
        }
        out.insert(key.to_string(), value.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_example_config() {
        let contents = r#"
[tools]
python = "python3"
gerber_script = "/opt/ci/export_grb.py"

[env]
DISPLAY = ":99"
KICAD_CONFIG_HOME = "/tmp/kicad"
"#;

        let config = parse_config(contents).unwrap();
        assert_eq!(config.tools.python, "python3");
        assert_eq!(config.tools.gerber_script, "/opt/ci/export_grb.py");
        // Unset tools keep defaults
        assert_eq!(config.tools.fp_lib_table, "gen_fp_lib_table.sh");
        assert_eq!(config.env.get("DISPLAY"), Some(&":99".to_string()));
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.tools, Toolchain::default());
        assert!(config.env.is_empty());
    }

    #[test]
    fn test_parse_invalid_config() {
        let err = parse_config("[tools\npython = 1").unwrap_err();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn test_merge_layers_env() {
        let config = KicadciConfig {
            env: BTreeMap::from([
                ("DISPLAY".to_string(), ":5".to_string()),
                ("A".to_string(), "file".to_string()),
            ]),
            ..Default::default()
        };
        let cli = BTreeMap::from([("A".to_string(), "cli".to_string())]);

        let merged = ConfigMerger::new(config).merge(&cli);

        assert_eq!(merged.env.get("DISPLAY"), Some(":5"));
        assert_eq!(merged.env.get("DEBIAN_FRONTEND"), Some("noninteractive"));
        assert_eq!(merged.env.get("A"), Some("cli"));
    }

    #[test]
    fn test_merge_defaults() {
        let merged = ConfigMerger::new(KicadciConfig::default()).merge(&BTreeMap::new());
        assert_eq!(merged.env, ProcessEnv::default());
        assert_eq!(merged.toolchain, Toolchain::default());
    }

    #[test]
    fn test_parse_cli_env_valid() {
        let entries = vec!["DISPLAY=:1".to_string(), "EMPTY=".to_string()];
        let parsed = parse_cli_env(&entries).expect("parse env");
        assert_eq!(parsed.get("DISPLAY"), Some(&":1".to_string()));
        assert_eq!(parsed.get("EMPTY"), Some(&String::new()));
    }

    #[test]
    fn test_parse_cli_env_missing_key() {
        let err = parse_cli_env(&["=value".to_string()]).expect_err("missing key");
        assert!(err.to_string().contains("missing key"));
    }

    #[test]
    fn test_parse_cli_env_missing_separator() {
        let err = parse_cli_env(&["DISPLAY".to_string()]).expect_err("no separator");
        assert!(err.to_string().contains("expected KEY=VALUE"));
    }

    #[test]
    fn test_discover_config_some_and_none() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        assert!(discover_config(&root).is_none());

        fs::write(root.join(CONFIG_FILE_NAME), "").expect("write config");
        assert!(discover_config(&root).is_some());
    }

    #[test]
    fn test_load_or_default_prefers_explicit_path() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        fs::write(root.join(CONFIG_FILE_NAME), "[tools]\npython = \"discovered\"\n").unwrap();
        let explicit = root.join("other.toml");
        fs::write(&explicit, "[tools]\npython = \"explicit\"\n").unwrap();

        let cfg = load_or_default(Some(&explicit), &root).expect("load");
        assert_eq!(cfg.tools.python, "explicit");

        let cfg = load_or_default(None, &root).expect("load");
        assert_eq!(cfg.tools.python, "discovered");
    }

    #[test]
    fn test_load_or_default_returns_default_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let cfg = load_or_default(None, &root).expect("load default");
        assert_eq!(cfg.tools, Toolchain::default());
    }
}
