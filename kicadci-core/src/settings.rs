//! Clap-free settings for the executor.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;

/// X display handed to exporters so GUI-capable tools run headless.
pub const DEFAULT_DISPLAY: &str = ":0";

/// Environment applied to every spawned step.
///
/// Passed explicitly to each child; the executor never mutates its own
/// process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEnv {
    vars: BTreeMap<String, String>,
}

impl Default for ProcessEnv {
    fn default() -> Self {
        Self::empty()
            .with("DISPLAY", DEFAULT_DISPLAY)
            .with("DEBIAN_FRONTEND", "noninteractive")
    }
}

impl ProcessEnv {
    pub fn empty() -> Self {
        Self {
            vars: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ProcessEnv {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct ExecSettings {
    /// Working directory of every step; board files resolve against it.
    pub project_dir: Utf8PathBuf,
    pub env: ProcessEnv,
    /// Trace every step without running any.
    pub dry_run: bool,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            project_dir: Utf8PathBuf::from("."),
            env: ProcessEnv::default(),
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_env_is_headless() {
        let env = ProcessEnv::default();
        assert_eq!(env.get("DISPLAY"), Some(":0"));
        assert_eq!(env.get("DEBIAN_FRONTEND"), Some("noninteractive"));
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn extend_overrides_defaults() {
        let mut env = ProcessEnv::default();
        env.extend([("DISPLAY", ":99"), ("KICAD_CONFIG_HOME", "/tmp/kicad")]);
        assert_eq!(env.get("DISPLAY"), Some(":99"));
        assert_eq!(env.get("KICAD_CONFIG_HOME"), Some("/tmp/kicad"));
        let keys: Vec<&str> = env.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["DEBIAN_FRONTEND", "DISPLAY", "KICAD_CONFIG_HOME"]);
    }

    #[test]
    fn default_settings_run_in_cwd() {
        let settings = ExecSettings::default();
        assert_eq!(settings.project_dir, Utf8PathBuf::from("."));
        assert!(!settings.dry_run);
    }
}
