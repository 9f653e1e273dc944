use serde::{Deserialize, Serialize};

use crate::status::StatusLayout;

pub const MIN_HEARTBEAT_INTERVAL_MS: u64 = 1_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.238".to_string(),
            port: 80,
        }
    }
}

impl DeviceConfig {
    pub fn base_url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// IANA zone used for clock sync; local time when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub status_layout: StatusLayout,
}

fn default_heartbeat_interval_ms() -> u64 {
    15_000
}

fn default_request_timeout_ms() -> u64 {
    60_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            timezone: None,
            status_layout: StatusLayout::default(),
        }
    }
}

impl ClientConfig {
    pub fn sanitize(&mut self) {
        self.device.host = self.device.host.trim().to_string();
        if self.device.host.is_empty() {
            self.device.host = DeviceConfig::default().host;
        }
        if self.device.port == 0 {
            self.device.port = DeviceConfig::default().port;
        }

        self.heartbeat_interval_ms = self.heartbeat_interval_ms.max(MIN_HEARTBEAT_INTERVAL_MS);
        self.request_timeout_ms = self.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS);

        self.timezone = self
            .timezone
            .take()
            .map(|tz| tz.trim().to_string())
            .filter(|tz| !tz.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"device":{"host":"10.0.0.5","port":8080}}"#).unwrap();

        assert_eq!(config.device.base_url(), "http://10.0.0.5:8080");
        assert_eq!(config.heartbeat_interval_ms, 15_000);
        assert_eq!(config.request_timeout_ms, 60_000);
        assert_eq!(config.timezone, None);
        assert_eq!(config.status_layout, StatusLayout::V2);
    }

    #[test]
    fn default_port_is_omitted_from_url() {
        assert_eq!(DeviceConfig::default().base_url(), "http://192.168.0.238");
    }

    #[test]
    fn sanitize_restores_usable_values() {
        let mut config = ClientConfig {
            device: DeviceConfig {
                host: "  ".to_string(),
                port: 0,
            },
            heartbeat_interval_ms: 10,
            request_timeout_ms: 0,
            timezone: Some(" ".to_string()),
            status_layout: StatusLayout::V1,
        };
        config.sanitize();

        assert_eq!(config.device, DeviceConfig::default());
        assert_eq!(config.heartbeat_interval_ms, MIN_HEARTBEAT_INTERVAL_MS);
        assert_eq!(config.request_timeout_ms, MIN_REQUEST_TIMEOUT_MS);
        assert_eq!(config.timezone, None);
        assert_eq!(config.status_layout, StatusLayout::V1);
    }
}
