use crate::config::Config;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::ClientError;
use crate::ip::IpClient;
use crate::logs::LogsClient;
use crate::system::SystemClient;
use crate::transport::{RestTransport, Transport};
use std::sync::Arc;

/// One device, one transport, every accessor.
pub struct RouterClient {
    pub logs: LogsClient,
    pub system: SystemClient,
    pub ip: IpClient,
}

impl RouterClient {
    pub fn new(transport: Arc<dyn Transport>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            logs: LogsClient::with_diagnostics(Arc::clone(&transport), Arc::clone(&diagnostics)),
            system: SystemClient::with_diagnostics(Arc::clone(&transport), Arc::clone(&diagnostics)),
            ip: IpClient::with_diagnostics(transport, diagnostics),
        }
    }

    pub fn connect(config: &Config) -> Result<Self, ClientError> {
        let transport = RestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), Arc::new(LogSink)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::logs::{LogOptions, LOG_PRINT_ENDPOINT};
    use crate::system::SYSTEM_RESOURCE_ENDPOINT;
    use crate::transport::fake::FakeTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_accessors_share_transport() {
        let fake = Arc::new(
            FakeTransport::new()
                .with_json(LOG_PRINT_ENDPOINT, json!([{"topics": "system,info", "message": "up"}]))
                .with_json(SYSTEM_RESOURCE_ENDPOINT, json!([{"uptime": "1h"}])),
        );
        let client = RouterClient::new(fake.clone(), Arc::new(RecordingSink::new()));

        let logs = client.logs.get_logs(&LogOptions::new(), None).await.unwrap();
        assert_eq!(logs.records().map(|r| r.len()), Some(1));
        let info = client.system.get_system_info().await.unwrap();
        assert_eq!(info["uptime"], json!("1h"));

        assert_eq!(fake.calls().len(), 2);
    }

    #[test]
    fn test_connect_builds_rest_transport() {
        assert!(RouterClient::connect(&Config::default()).is_ok());
    }
}
