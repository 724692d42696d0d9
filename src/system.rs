use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::ClientError;
use crate::normalize::Record;
use crate::request::fetch_records;
use crate::transport::{RequestBody, Transport};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

pub const SYSTEM_RESOURCE_ENDPOINT: &str = "/system/resource/print";

const CONTEXT: &str = "system";
const MIB: f64 = 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Attention,
    Warning,
    Critical,
    Unknown,
}

impl HealthStatus {
    pub fn from_usage(memory_percent: f64, disk_percent: f64) -> Self {
        let worst = memory_percent.max(disk_percent);
        if worst > 90.0 {
            HealthStatus::Critical
        } else if worst > 80.0 {
            HealthStatus::Warning
        } else if worst > 70.0 {
            HealthStatus::Attention
        } else {
            HealthStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub uptime: Option<String>,
    pub version: Option<String>,
    pub cpu_load: Option<f64>,
    pub memory_usage_percent: f64,
    pub disk_usage_percent: f64,
    pub free_memory_mb: f64,
    pub free_disk_mb: f64,
}

impl SystemHealth {
    fn unknown() -> Self {
        Self {
            status: HealthStatus::Unknown,
            uptime: None,
            version: None,
            cpu_load: None,
            memory_usage_percent: 0.0,
            disk_usage_percent: 0.0,
            free_memory_mb: 0.0,
            free_disk_mb: 0.0,
        }
    }

    pub fn from_resource(resource: &Record) -> Self {
        if resource.is_empty() {
            return Self::unknown();
        }

        let total_memory = number_field(resource, "total-memory");
        let free_memory = number_field(resource, "free-memory");
        let total_disk = number_field(resource, "total-hdd-space");
        let free_disk = number_field(resource, "free-hdd-space");

        let memory_usage_percent = usage_percent(total_memory, free_memory);
        let disk_usage_percent = usage_percent(total_disk, free_disk);

        Self {
            status: HealthStatus::from_usage(memory_usage_percent, disk_usage_percent),
            uptime: text_field(resource, "uptime"),
            version: text_field(resource, "version"),
            cpu_load: number_field(resource, "cpu-load"),
            memory_usage_percent: round2(memory_usage_percent),
            disk_usage_percent: round2(disk_usage_percent),
            free_memory_mb: round2(free_memory.unwrap_or(0.0) / MIB),
            free_disk_mb: round2(free_disk.unwrap_or(0.0) / MIB),
        }
    }
}

/// RouterOS REST reports numbers as strings; older firmware and the
/// underscore spelling are accepted as well.
fn lookup<'r>(record: &'r Record, key: &str) -> Option<&'r Value> {
    record
        .get(key)
        .or_else(|| record.get(&key.replace('-', "_")))
}

fn number_field(record: &Record, key: &str) -> Option<f64> {
    match lookup(record, key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_field(record: &Record, key: &str) -> Option<String> {
    match lookup(record, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn usage_percent(total: Option<f64>, free: Option<f64>) -> f64 {
    match (total, free) {
        (Some(total), Some(free)) if total > 0.0 => (total - free) / total * 100.0,
        _ => 0.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct SystemClient {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl SystemClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_diagnostics(transport, Arc::new(LogSink))
    }

    pub fn with_diagnostics(
        transport: Arc<dyn Transport>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            transport,
            diagnostics,
        }
    }

    pub async fn get_system_resources(&self) -> Result<Vec<Record>, ClientError> {
        fetch_records(
            self.transport.as_ref(),
            SYSTEM_RESOURCE_ENDPOINT,
            RequestBody::new(),
            "system resources",
            self.diagnostics.as_ref(),
        )
        .await
    }

    /// First resource record, or an empty record when the device sent none.
    pub async fn get_system_info(&self) -> Result<Record, ClientError> {
        let mut resources = self.get_system_resources().await?;
        if resources.is_empty() {
            self.diagnostics
                .warning(CONTEXT, "Empty system info response".to_string());
            return Ok(Record::new());
        }
        Ok(resources.swap_remove(0))
    }

    pub async fn get_system_health(&self) -> Result<SystemHealth, ClientError> {
        let info = self.get_system_info().await?;
        Ok(SystemHealth::from_resource(&info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{RecordingSink, Severity};
    use crate::transport::fake::FakeTransport;
    use serde_json::json;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn resource(total_memory: u64, free_memory: u64) -> Value {
        json!([{
            "uptime": "1w2d",
            "version": "7.14.2 (stable)",
            "cpu-load": "12",
            "total-memory": total_memory.to_string(),
            "free-memory": free_memory.to_string(),
            "total-hdd-space": (GIB).to_string(),
            "free-hdd-space": (GIB / 2).to_string(),
        }])
    }

    #[test]
    fn test_status_thresholds() {
        assert_eq!(HealthStatus::from_usage(10.0, 70.0), HealthStatus::Healthy);
        assert_eq!(HealthStatus::from_usage(70.5, 0.0), HealthStatus::Attention);
        assert_eq!(HealthStatus::from_usage(0.0, 85.0), HealthStatus::Warning);
        assert_eq!(HealthStatus::from_usage(95.0, 10.0), HealthStatus::Critical);
    }

    #[tokio::test]
    async fn test_health_from_string_numbers() {
        let fake = Arc::new(
            FakeTransport::new().with_json(SYSTEM_RESOURCE_ENDPOINT, resource(1000 * 1024 * 1024, 150 * 1024 * 1024)),
        );
        let system = SystemClient::with_diagnostics(fake, Arc::new(RecordingSink::new()));

        let health = system.get_system_health().await.unwrap();
        assert_eq!(health.status, HealthStatus::Warning);
        assert_eq!(health.memory_usage_percent, 85.0);
        assert_eq!(health.disk_usage_percent, 50.0);
        assert_eq!(health.free_memory_mb, 150.0);
        assert_eq!(health.free_disk_mb, 512.0);
        assert_eq!(health.cpu_load, Some(12.0));
        assert_eq!(health.version.as_deref(), Some("7.14.2 (stable)"));
    }

    #[tokio::test]
    async fn test_empty_resource_list_is_unknown_health() {
        let sink = Arc::new(RecordingSink::new());
        let fake = Arc::new(FakeTransport::new().with_json(SYSTEM_RESOURCE_ENDPOINT, json!([])));
        let system = SystemClient::with_diagnostics(fake, sink.clone());

        let info = system.get_system_info().await.unwrap();
        assert!(info.is_empty());
        let health = system.get_system_health().await.unwrap();
        assert_eq!(health.status, HealthStatus::Unknown);
        assert_eq!(sink.count(Severity::Warning), 2);
    }

    #[tokio::test]
    async fn test_resources_accept_wrapped_shape() {
        let fake = Arc::new(
            FakeTransport::new()
                .with_json(SYSTEM_RESOURCE_ENDPOINT, json!({"ret": [{"uptime": "5m"}]})),
        );
        let system = SystemClient::new(fake);
        let resources = system.get_system_resources().await.unwrap();
        assert_eq!(resources[0]["uptime"], json!("5m"));
    }
}
