//! Test plan for the `ecole-config` crate.
//!
//! These tests exercise the configuration loader across default handling,
//! file discovery, and environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serial_test::serial;
use tempfile::TempDir;

use ecole_config::{load, AppConfig, MailMode, StoreBackend};

const ENV_VARS_TO_RESET: &[&str] = &[
    "ECOLE_CONFIG",
    "ECOLE__STORE__BACKEND",
    "ECOLE__STORE__DATABASE__URL",
    "ECOLE__STORE__DATABASE__MAX_CONNECTIONS",
    "ECOLE__STORE__REST__BASE_URL",
    "ECOLE__STORE__REST__API_KEY",
    "ECOLE__NOTIFICATIONS__TOAST_TTL_MS",
    "ECOLE__AUDIT__RETRY_BUFFER_CAPACITY",
    "ECOLE__ASSISTANT__API_KEY",
    "ECOLE__ASSISTANT__MODEL",
    "ECOLE__MAIL__MODE",
    "ECOLE__MAIL__ENDPOINT",
    "ECOLE__SCHOOL__DEFAULT_NAME",
];

struct TestContext {
    vars: Vec<(String, Option<String>)>,
    original_dir: Option<PathBuf>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            vars: Vec::new(),
            original_dir: None,
        }
    }

    fn reset_environment(&mut self) {
        for key in ENV_VARS_TO_RESET {
            self.remove_var(key);
        }
    }

    fn set_var(&mut self, key: &str, value: impl AsRef<str>) {
        let previous = std::env::var(key).ok();
        std::env::set_var(key, value.as_ref());
        self.vars.push((key.to_string(), previous));
    }

    fn remove_var(&mut self, key: &str) {
        let previous = std::env::var(key).ok();
        std::env::remove_var(key);
        self.vars.push((key.to_string(), previous));
    }

    fn set_current_dir(&mut self, dir: &Path) {
        if self.original_dir.is_none() {
            self.original_dir =
                Some(std::env::current_dir().expect("failed to capture current directory"));
        }
        std::env::set_current_dir(dir).expect("failed to set current directory");
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        if let Some(original) = self.original_dir.take() {
            let _ = std::env::set_current_dir(original);
        }

        while let Some((key, value)) = self.vars.pop() {
            match value {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }
    }
}

fn write_config_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config directories");
    }
    fs::write(path, contents).expect("failed to write config file");
}

#[test]
#[serial]
fn load_uses_default_values_when_no_files_found() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    let config = load().expect("configuration load should succeed without files");
    let defaults = AppConfig::default();

    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.database.url, defaults.store.database.url);
    assert_eq!(
        config.store.database.max_connections,
        defaults.store.database.max_connections
    );
    assert_eq!(config.notifications.toast_ttl_ms, 5_000);
    assert_eq!(config.audit.retry_buffer_capacity, 50);
    assert_eq!(config.mail.mode, MailMode::Mailto);
    assert_eq!(config.school.default_name, defaults.school.default_name);
    assert!(config.assistant.api_key.is_none());
}

#[test]
#[serial]
fn load_picks_first_available_file_in_search_order() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "ecole.toml",
        r#"
        [notifications]
        toast_ttl_ms = 4200
        "#,
    );
    write_config_file(
        temp_dir.path(),
        "config/ecole.toml",
        r#"
        [notifications]
        toast_ttl_ms = 9000
        "#,
    );

    let config = load().expect("configuration load should pick the first file");
    assert_eq!(config.notifications.toast_ttl_ms, 4200);
}

#[test]
#[serial]
fn load_merges_partial_file_with_defaults() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "ecole.toml",
        r#"
        [store]
        backend = "rest"

        [store.rest]
        base_url = "https://school.example.org"
        api_key = "anon-key"

        [mail]
        mode = "provider"
        endpoint = "https://mail.example.org/send"
        "#,
    );

    let config = load().expect("configuration load should succeed");
    let defaults = AppConfig::default();

    assert_eq!(config.store.backend, StoreBackend::Rest);
    assert_eq!(config.store.rest.base_url, "https://school.example.org");
    assert_eq!(config.store.rest.api_key.as_deref(), Some("anon-key"));
    assert_eq!(
        config.store.rest.request_timeout_seconds,
        defaults.store.rest.request_timeout_seconds
    );
    assert_eq!(config.mail.mode, MailMode::Provider);
    assert_eq!(
        config.mail.endpoint.as_deref(),
        Some("https://mail.example.org/send")
    );
    assert_eq!(config.mail.sender_address, defaults.mail.sender_address);
    assert_eq!(config.assistant.model, defaults.assistant.model);
}

#[test]
#[serial]
fn load_applies_environment_overrides() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "ecole.toml",
        r#"
        [audit]
        retry_buffer_capacity = 10
        "#,
    );

    ctx.set_var("ECOLE__AUDIT__RETRY_BUFFER_CAPACITY", "3");
    ctx.set_var("ECOLE__STORE__BACKEND", "memory");

    let config = load().expect("configuration load should honour env overrides");
    assert_eq!(config.audit.retry_buffer_capacity, 3);
    assert_eq!(config.store.backend, StoreBackend::Memory);
}

#[test]
#[serial]
fn load_reads_explicit_config_path() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    write_config_file(
        temp_dir.path(),
        "elsewhere/portal.toml",
        r#"
        [school]
        default_name = "Lycée Victor Hugo"
        "#,
    );
    ctx.set_var(
        "ECOLE_CONFIG",
        temp_dir.path().join("elsewhere/portal.toml").display().to_string(),
    );

    let config = load().expect("configuration load should read ECOLE_CONFIG");
    assert_eq!(config.school.default_name, "Lycée Victor Hugo");
}

#[test]
#[serial]
fn load_restores_default_toast_ttl_when_zero() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var("ECOLE__NOTIFICATIONS__TOAST_TTL_MS", "0");

    let config = load().expect("configuration load should succeed");
    assert_eq!(config.notifications.toast_ttl_ms, 5_000);
}

#[test]
#[serial]
fn load_rejects_unknown_store_backend() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let mut ctx = TestContext::new();
    ctx.reset_environment();
    ctx.set_current_dir(temp_dir.path());

    ctx.set_var("ECOLE__STORE__BACKEND", "mongodb");

    let error = load().expect_err("unknown backend should be rejected");
    assert!(format!("{error:?}").contains("invalid configuration"));
}
