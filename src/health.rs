//! Preflight checks for wtf-sync
//!
//! Verifies that a sync would be able to start: the config file is found and
//! valid, the account tree exists, the prototype resolves and there is at least
//! one destination. Nothing is written.

use crate::config::SyncConfig;
use crate::discovery::{SyncTarget, ACCOUNT_DIR};
use crate::sync::{SyncEngine, SyncOptions};
use std::path::Path;

/// Result of preflight checks
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Config file located and parsed
    pub config: CheckResult,
    /// `<wtf>/Account` exists
    pub account_root: CheckResult,
    /// Prototype character directory found
    pub prototype: CheckResult,
    /// Destinations available; informational, not part of [`HealthCheck::all_passed`]
    pub targets: CheckResult,
}

/// Result of an individual health check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
    pub is_warning: bool,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
            is_warning: false,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
            is_warning: false,
        }
    }

    fn warning_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
            is_warning: true,
        }
    }
}

impl HealthCheck {
    /// Run all checks for the WTF directory at `wtf_dir`
    pub fn run(config_path: Option<&Path>, wtf_dir: &Path) -> Self {
        let account_root = Self::check_account_root(wtf_dir);

        let config = match SyncConfig::locate(config_path, wtf_dir)
            .and_then(|path| SyncConfig::load(&path).map(|config| (path, config)))
        {
            Ok((path, config)) => {
                let check = CheckResult::ok_with_details(
                    "Config file loaded",
                    format!("{} (prototype {})", path.display(), config.prototype),
                );
                (check, Some(config))
            }
            Err(e) => (
                CheckResult::error_with_details("Config file unusable", e.to_string()),
                None,
            ),
        };

        let (prototype, targets) = match (config.1, account_root.passed) {
            (Some(config), true) => Self::check_prototype(config, &wtf_dir.join(ACCOUNT_DIR)),
            _ => (
                CheckResult::error("Prototype not checked: config or account tree unavailable"),
                CheckResult::warning_with_details(
                    "Destinations not checked",
                    "Fix the checks above first",
                ),
            ),
        };

        Self {
            config: config.0,
            account_root,
            prototype,
            targets,
        }
    }

    /// Check if all required checks passed (excludes warnings)
    pub fn all_passed(&self) -> bool {
        self.config.passed && self.account_root.passed && self.prototype.passed
        // Destinations are informational, not included in required checks
    }

    /// Get list of failed checks (errors only, not warnings)
    pub fn errors(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, result)| result)
            .filter(|r| !r.passed && !r.is_warning)
            .collect()
    }

    /// Get list of warnings
    pub fn warnings(&self) -> Vec<&CheckResult> {
        self.all_checks()
            .into_iter()
            .map(|(_, result)| result)
            .filter(|r| r.is_warning)
            .collect()
    }

    fn check_account_root(wtf_dir: &Path) -> CheckResult {
        let root = wtf_dir.join(ACCOUNT_DIR);
        if root.is_dir() {
            CheckResult::ok_with_details("Account directory exists", root.display().to_string())
        } else {
            CheckResult::error_with_details(
                "Account directory not found",
                format!(
                    "{} does not exist; point --wtf-dir at the game's WTF folder",
                    root.display()
                ),
            )
        }
    }

    fn check_prototype(config: SyncConfig, account_root: &Path) -> (CheckResult, CheckResult) {
        let engine = SyncEngine::new(config, SyncOptions { dry_run: true });

        let (tree, prototype) = match engine.resolve(account_root) {
            Ok(resolved) => resolved,
            Err(e) => {
                return (
                    CheckResult::error_with_details("Prototype not found", e.to_string()),
                    CheckResult::warning_with_details(
                        "Destinations not checked",
                        "Fix the prototype first",
                    ),
                )
            }
        };

        let prototype_check = CheckResult::ok_with_details(
            "Prototype found",
            prototype.path.display().to_string(),
        );

        let targets_check = match engine.targets(&tree, &prototype) {
            Ok(list) if !list.unreadable.is_empty() => CheckResult::warning_with_details(
                "Some directories could not be listed",
                list.unreadable
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Ok(list) if list.targets.is_empty() => CheckResult::warning_with_details(
                "No destinations",
                "Nothing to sync: no other characters or accounts pass the filters",
            ),
            Ok(list) => {
                let characters = list
                    .targets
                    .iter()
                    .filter(|t| matches!(t, SyncTarget::Character { .. }))
                    .count();
                CheckResult::ok(format!(
                    "{} characters and {} accounts will be synced",
                    characters,
                    list.targets.len() - characters
                ))
            }
            Err(e) => {
                CheckResult::error_with_details("Failed to enumerate destinations", e.to_string())
            }
        };

        (prototype_check, targets_check)
    }

    /// Get all checks as a slice for iteration
    pub fn all_checks(&self) -> [(&'static str, &CheckResult); 4] {
        [
            ("Config File", &self.config),
            ("Account Directory", &self.account_root),
            ("Prototype", &self.prototype),
            ("Destinations", &self.targets),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use tempfile::TempDir;

    fn wtf_dir(config: Option<&str>, dirs: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for dir in dirs {
            std::fs::create_dir_all(temp_dir.path().join(ACCOUNT_DIR).join(dir)).unwrap();
        }
        if let Some(content) = config {
            std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), content).unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("Test passed");
        assert!(result.passed);
        assert!(!result.is_warning);
        assert!(result.details.is_none());
    }

    #[test]
    fn test_check_result_warning_with_details() {
        let result = CheckResult::warning_with_details("Test warning", "Warning details");
        assert!(result.passed); // Warnings still "pass"
        assert!(result.is_warning);
        assert_eq!(result.details, Some("Warning details".to_string()));
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("Test failed");
        assert!(!result.passed);
        assert!(!result.is_warning);
    }

    #[test]
    fn test_all_checks_pass() {
        let temp_dir = wtf_dir(Some("prototype=A/Org/Hero\n"), &["A/Org/Hero", "A/Org/Mage"]);
        let health = HealthCheck::run(None, temp_dir.path());

        assert!(health.all_passed());
        assert!(health.errors().is_empty());
        assert!(health.warnings().is_empty());
        assert!(health.targets.message.contains("1 characters and 0 accounts"));
    }

    #[test]
    fn test_no_destinations_is_warning() {
        let temp_dir = wtf_dir(Some("prototype=A/Hero\n"), &["A/Org/Hero"]);
        let health = HealthCheck::run(None, temp_dir.path());

        assert!(health.all_passed());
        assert_eq!(health.warnings().len(), 1);
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = wtf_dir(None, &["A/Org/Hero"]);
        let missing = temp_dir.path().join("absent.conf");
        let health = HealthCheck::run(Some(&missing), temp_dir.path());

        assert!(!health.all_passed());
        assert!(!health.config.passed);
        assert!(health.account_root.passed);
        assert!(!health.prototype.passed);
        assert!(health.targets.is_warning);
        assert_eq!(health.errors().len(), 2);
    }

    #[test]
    fn test_missing_account_root() {
        let temp_dir = wtf_dir(Some("prototype=A/Hero\n"), &[]);
        let health = HealthCheck::run(None, temp_dir.path());

        assert!(health.config.passed);
        assert!(!health.account_root.passed);
        assert!(health.account_root.details.is_some());
        assert!(!health.all_passed());
    }

    #[test]
    fn test_unresolvable_prototype() {
        let temp_dir = wtf_dir(Some("prototype=A/Org/Ghost\n"), &["A/Org/Hero"]);
        let health = HealthCheck::run(None, temp_dir.path());

        assert!(!health.prototype.passed);
        assert_eq!(health.errors().len(), 1);
        assert!(health.targets.is_warning);
        assert_eq!(health.warnings().len(), 1);
    }

    #[test]
    fn test_all_checks_returns_all_four() {
        let temp_dir = wtf_dir(None, &[]);
        let health = HealthCheck::run(None, temp_dir.path());
        assert_eq!(health.all_checks().len(), 4);
    }
}
