use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use sprinkler_common::{ClientConfig, StatusLayout};
use tracing::warn;

const DEFAULT_CONFIG_PATH: &str = "./.sprinkler/config.json";

/// Reads the JSON config file, then applies `SPRINKLER_*` overrides.
pub async fn load() -> ClientConfig {
    let path = config_path();
    let mut config = read_config_file(&path).await.unwrap_or_else(|err| {
        warn!("failed to load config from {}: {err:#}", path.display());
        ClientConfig::default()
    });

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.sanitize();
    config
}

fn config_path() -> PathBuf {
    std::env::var("SPRINKLER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

async fn read_config_file(path: &Path) -> anyhow::Result<ClientConfig> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(serde_json::from_slice::<ClientConfig>(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(err) => Err(err.into()),
    }
}

fn apply_env_overrides(config: &mut ClientConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("SPRINKLER_HOST") {
        config.device.host = host;
    }
    if let Some(port) = var("SPRINKLER_PORT").and_then(|value| value.parse::<u16>().ok()) {
        config.device.port = port;
    }
    if let Some(ms) = var("SPRINKLER_HEARTBEAT_MS").and_then(|value| value.parse::<u64>().ok()) {
        config.heartbeat_interval_ms = ms;
    }
    if let Some(ms) = var("SPRINKLER_TIMEOUT_MS").and_then(|value| value.parse::<u64>().ok()) {
        config.request_timeout_ms = ms;
    }
    if let Some(timezone) = var("SPRINKLER_TIMEZONE") {
        config.timezone = Some(timezone);
    }
    if let Some(raw) = var("SPRINKLER_STATUS_LAYOUT") {
        match StatusLayout::parse(&raw) {
            Some(layout) => config.status_layout = layout,
            None => warn!("ignoring unknown status layout {raw:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = ClientConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("SPRINKLER_HOST", "sprinkler.local"),
                ("SPRINKLER_PORT", "8080"),
                ("SPRINKLER_HEARTBEAT_MS", "30000"),
                ("SPRINKLER_TIMEOUT_MS", "2500"),
                ("SPRINKLER_TIMEZONE", "America/Chicago"),
                ("SPRINKLER_STATUS_LAYOUT", "V1"),
            ]),
        );

        assert_eq!(config.device.base_url(), "http://sprinkler.local:8080");
        assert_eq!(config.heartbeat_interval_ms, 30_000);
        assert_eq!(config.request_timeout_ms, 2_500);
        assert_eq!(config.timezone.as_deref(), Some("America/Chicago"));
        assert_eq!(config.status_layout, StatusLayout::V1);
    }

    #[test]
    fn unparsable_overrides_are_ignored() {
        let mut config = ClientConfig::default();
        apply_env_overrides(
            &mut config,
            lookup(&[
                ("SPRINKLER_PORT", "eighty"),
                ("SPRINKLER_HEARTBEAT_MS", "-1"),
                ("SPRINKLER_STATUS_LAYOUT", "v9"),
            ]),
        );

        assert_eq!(config, ClientConfig::default());
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("sprinkler-remote-missing/config.json");
        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[tokio::test]
    async fn reads_partial_config_file() {
        let dir = std::env::temp_dir().join(format!("sprinkler-remote-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("config.json");
        tokio::fs::write(&path, br#"{"device":{"host":"10.1.1.9","port":80},"timezone":"UTC"}"#)
            .await
            .unwrap();

        let config = read_config_file(&path).await.unwrap();
        assert_eq!(config.device.host, "10.1.1.9");
        assert_eq!(config.timezone.as_deref(), Some("UTC"));
        assert_eq!(config.heartbeat_interval_ms, 15_000);

        tokio::fs::write(&path, b"{ not json").await.unwrap();
        assert!(read_config_file(&path).await.is_err());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
