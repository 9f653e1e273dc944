use std::time::Duration;

use reqwest::{header, StatusCode};
use sprinkler_common::{Command, DeviceConfig, HttpMethod};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to encode {command} body: {source}")]
    Encode {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{command} request to {url} failed: {source}")]
    Request {
        command: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// A device reply, handed back without interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Fire-and-forget HTTP transport to the controller. Never retries.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: String,
}

impl DeviceClient {
    pub fn new(device: &DeviceConfig, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self {
            http,
            base_url: device.base_url(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, command: &Command) -> Result<RawResponse, TransportError> {
        let url = format!("{}{}", self.base_url, command.path());
        let body = command
            .json_body()
            .map_err(|source| TransportError::Encode {
                command: command.name(),
                source,
            })?;

        let request = match command.method() {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        };
        let request = match body {
            Some(json) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(json),
            None => request,
        };

        debug!(
            command = command.name(),
            method = command.method().as_str(),
            %url,
            "sending command"
        );

        let request_error = |source| TransportError::Request {
            command: command.name(),
            url: url.clone(),
            source,
        };
        let response = request.send().await.map_err(request_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(request_error)?;

        debug!(command = command.name(), %status, bytes = body.len(), "device replied");
        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use sprinkler_common::{DayOfWeek, ScheduleEntry, ScheduleUpload, TimeOfDay};

    use super::*;
    use crate::fake_device::{status_body, FakeDevice};

    fn client_for(device: &FakeDevice) -> DeviceClient {
        DeviceClient::new(&device.config().device, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn get_commands_hit_fixed_paths() {
        let device = FakeDevice::start(status_body("2024", "133", "000")).await;
        let client = client_for(&device);

        for command in [Command::TurnOn, Command::TurnOff, Command::Disconnect, Command::Heartbeat] {
            let response = client.send(&command).await.unwrap();
            assert_eq!(response.status, StatusCode::OK);
            assert_eq!(response.body, status_body("2024", "133", "000").into_bytes());
        }

        let requests = device.requests().await;
        let seen = requests
            .iter()
            .map(|request| (request.method.as_str(), request.path.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            seen,
            vec![("GET", "/ONN"), ("GET", "/OFF"), ("GET", "/DIS"), ("GET", "/HI!")]
        );
        assert!(requests.iter().all(|request| request.body.is_empty()));
    }

    #[tokio::test]
    async fn schedule_is_posted_as_json() {
        let device = FakeDevice::start(status_body("2024", "000", "000")).await;
        let client = client_for(&device);
        let upload = ScheduleUpload::new(
            2,
            15,
            vec![ScheduleEntry::new(
                DayOfWeek::Wed,
                TimeOfDay::new(14, 30).unwrap(),
            )],
        )
        .unwrap();

        client.send(&Command::SetSchedule(upload)).await.unwrap();

        let requests = device.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/SCH");
        assert_eq!(requests[0].content_type.as_deref(), Some("application/json"));
        assert_eq!(
            requests[0].body,
            r#"{"numberOfZones":2,"duration":15,"schedule":[{"dayOfWeek":3,"time":"14:30"}]}"#
        );
    }

    #[tokio::test]
    async fn non_ok_status_is_returned_uninterpreted() {
        let device = FakeDevice::start("busy").await;
        device
            .set_response(StatusCode::SERVICE_UNAVAILABLE, "busy")
            .await;
        let client = client_for(&device);

        let response = client.send(&Command::TurnOn).await.unwrap();
        assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.body, b"busy".to_vec());
        assert_eq!(device.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn refused_connection_is_a_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let device = DeviceConfig {
            host: "127.0.0.1".to_string(),
            port,
        };
        let client = DeviceClient::new(&device, Duration::from_secs(2)).unwrap();

        let err = client.send(&Command::Heartbeat).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Request { command: "heartbeat", .. }
        ));
    }

    #[tokio::test]
    async fn silent_device_times_out() {
        // Accepts TCP connections via the backlog but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let device = DeviceConfig {
            host: "127.0.0.1".to_string(),
            port: listener.local_addr().unwrap().port(),
        };
        let client = DeviceClient::new(&device, Duration::from_millis(200)).unwrap();

        let err = client.send(&Command::TurnOff).await.unwrap_err();
        match err {
            TransportError::Request { source, .. } => assert!(source.is_timeout()),
            other => panic!("unexpected error: {other}"),
        }
        drop(listener);
    }
}
