use crate::error::{PipelineError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// QuestionsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionsConfig {
    #[serde(default = "default_max_clarifying")]
    pub max_clarifying: usize,
}

fn default_max_clarifying() -> usize {
    5
}

impl Default for QuestionsConfig {
    fn default() -> Self {
        Self {
            max_clarifying: default_max_clarifying(),
        }
    }
}

// ---------------------------------------------------------------------------
// ImplementationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationConfig {
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default = "default_source_root")]
    pub source_root: String,
}

fn default_package() -> String {
    "com.example.app".to_string()
}

fn default_source_root() -> String {
    "src/main/kotlin".to_string()
}

impl Default for ImplementationConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            source_root: default_source_root(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    #[serde(default)]
    pub questions: QuestionsConfig,
    #[serde(default)]
    pub implementation: ImplementationConfig,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
                description: None,
            },
            questions: QuestionsConfig::default(),
            implementation: ImplementationConfig::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(PipelineError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.questions.max_clarifying > 10 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "questions.max_clarifying={} (>10 is unusual for an interactive refinement)",
                    self.questions.max_clarifying
                ),
            });
        }

        if !valid_package(&self.implementation.package) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "implementation.package '{}' is not a valid dotted package name",
                    self.implementation.package
                ),
            });
        }

        if self.implementation.source_root.starts_with('/') {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "implementation.source_root '{}' must be relative to the project root",
                    self.implementation.source_root
                ),
            });
        }

        warnings
    }
}

/// Dotted package name: segments of `[a-z_][a-z0-9_]*`.
fn valid_package(pkg: &str) -> bool {
    !pkg.is_empty()
        && pkg.split('.').all(|seg| {
            let mut chars = seg.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("my-project");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.project.name, "my-project");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.questions.max_clarifying, 5);
        assert_eq!(parsed.implementation.package, "com.example.app");
    }

    #[test]
    fn minimal_yaml_backward_compat() {
        // A config.yaml with only the project key must still deserialize
        let yaml = "version: 1\nproject:\n  name: my-project\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.questions.max_clarifying, 5);
        assert_eq!(cfg.implementation.source_root, "src/main/kotlin");
    }

    #[test]
    fn load_uninitialized_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(PipelineError::NotInitialized)
        ));
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = Config::new("proj");
        cfg.questions.max_clarifying = 3;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.questions.max_clarifying, 3);
    }

    #[test]
    fn validate_default_no_warnings() {
        assert!(Config::new("proj").validate().is_empty());
    }

    #[test]
    fn validate_excessive_questions() {
        let mut cfg = Config::new("proj");
        cfg.questions.max_clarifying = 25;
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("max_clarifying=25")));
    }

    #[test]
    fn validate_bad_package() {
        let mut cfg = Config::new("proj");
        cfg.implementation.package = "Com.9bad..".to_string();
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("package")));
    }

    #[test]
    fn validate_absolute_source_root() {
        let mut cfg = Config::new("proj");
        cfg.implementation.source_root = "/abs/path".to_string();
        assert!(cfg
            .validate()
            .iter()
            .any(|w| w.message.contains("source_root")));
    }
}
