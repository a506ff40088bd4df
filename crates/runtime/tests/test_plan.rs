use std::path::Path;

use anyhow::{Context, Result};
use ecole_config::{AppConfig, MailMode, StoreBackend};
use ecole_database::Table;
use ecole_runtime::PortalServices;
use serde_json::json;
use tempfile::TempDir;

fn sqlite_url(path: &Path) -> String {
    format!("sqlite://{}", path.to_string_lossy())
}

fn build_config(backend: StoreBackend) -> AppConfig {
    let mut config = AppConfig::default();
    config.store.backend = backend;
    config.assistant.api_key = None;
    config
}

async fn initialise(config: &AppConfig) -> Result<PortalServices> {
    PortalServices::initialise(config)
        .await
        .context("failed to initialise portal services")
}

fn admin_row() -> ecole_database::Row {
    json!({
        "id": "a1",
        "name": "Alice Admin",
        "role": "ADMIN",
        "email": "admin@ecole.fr"
    })
    .as_object()
    .cloned()
    .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_with_memory_store() -> Result<()> {
    let config = build_config(StoreBackend::Memory);
    let services = initialise(&config).await?;

    assert_eq!(services.portal.store_name(), "memory");
    assert!(!services.assistant_enabled);
    assert_eq!(services.portal.school_name().await, "Mon École");

    services.store.insert(Table::Users, admin_row()).await?;
    let user = services.portal.sign_in("admin@ecole.fr").await?;
    assert_eq!(user.id, "a1");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_runs_sqlite_migrations() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let mut config = build_config(StoreBackend::Sqlite);
    config.store.database.url = sqlite_url(&temp_dir.path().join("runtime/init.db"));

    let services = initialise(&config).await?;
    assert_eq!(services.portal.store_name(), "sqlite");
    assert!(temp_dir.path().join("runtime/init.db").exists());

    services.store.insert(Table::Users, admin_row()).await?;
    assert_eq!(services.store.select_all(Table::Users).await?.len(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_enables_assistant_with_key() -> Result<()> {
    let mut config = build_config(StoreBackend::Memory);
    config.assistant.api_key = Some("unit-test-key".into());

    let services = initialise(&config).await?;
    assert!(services.assistant_enabled);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn initialise_rejects_provider_mail_without_endpoint() {
    let mut config = build_config(StoreBackend::Memory);
    config.mail.mode = MailMode::Provider;
    config.mail.endpoint = None;

    assert!(PortalServices::initialise(&config).await.is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_school_name_is_the_default() -> Result<()> {
    let mut config = build_config(StoreBackend::Memory);
    config.school.default_name = "Collège Pasteur".into();

    let services = initialise(&config).await?;
    assert_eq!(services.portal.school_name().await, "Collège Pasteur");
    Ok(())
}
