//! Log retrieval pipeline.
//!
//! build body -> `/log/print` -> normalise -> (count-only returns here)
//! -> client-side filter -> truncate.

use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::ClientError;
use crate::filter::{conjoin, filter_records};
use crate::normalize::{normalize, Expect, Normalized, Record};
use crate::request::{build_request_body, FieldMap};
use crate::transport::{Method, Transport};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const LOG_PRINT_ENDPOINT: &str = "/log/print";

/// Default cap on returned records. Pass `None` to disable.
pub const DEFAULT_MAX_RECORDS: usize = 1000;

const CONTEXT: &str = "logs";

/// Caller option key to `/log/print` wire key. `where` is deliberately
/// absent: the device's own filter is unreliable, so it never goes on the wire.
pub const LOG_FIELDS: FieldMap = &[
    ("append", "append"),
    ("brief", "brief"),
    ("countOnly", "count-only"),
    ("detail", "detail"),
    ("file", "file"),
    ("follow", "follow"),
    ("followOnly", "follow-only"),
    ("groupBy", "group-by"),
    ("interval", "interval"),
    ("proplist", "proplist"),
    ("showIds", "show-ids"),
    ("terse", "terse"),
    ("withExtraInfo", "with-extra-info"),
    ("withoutPaging", "without-paging"),
];

/// Sparse options for a log query. `None` means "not sent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogOptions {
    pub append: Option<bool>,
    pub brief: Option<bool>,
    pub count_only: Option<bool>,
    pub detail: Option<bool>,
    pub file: Option<String>,
    pub follow: Option<bool>,
    pub follow_only: Option<bool>,
    pub group_by: Option<String>,
    pub interval: Option<u64>,
    pub proplist: Option<Vec<String>>,
    pub show_ids: Option<bool>,
    pub terse: Option<bool>,
    /// Client-side filter expression, see [`crate::filter`].
    #[serde(rename = "where")]
    pub where_clause: Option<String>,
    pub with_extra_info: Option<bool>,
    pub without_paging: Option<bool>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_where(mut self, expression: impl Into<String>) -> Self {
        self.where_clause = Some(expression.into());
        self
    }

    pub fn with_count_only(mut self) -> Self {
        self.count_only = Some(true);
        self
    }

    pub fn is_count_only(&self) -> bool {
        self.count_only == Some(true)
    }

    /// ANDs `predicate` into the current `where`, predicate first.
    fn restrict(&mut self, predicate: &str) {
        let caller = self.where_clause.take().unwrap_or_default();
        self.where_clause = Some(conjoin(predicate, &caller));
    }
}

/// Either the matching records or their count, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultSet {
    Records(Vec<Record>),
    Count(u64),
}

impl ResultSet {
    pub fn records(&self) -> Option<&[Record]> {
        match self {
            ResultSet::Records(records) => Some(records),
            ResultSet::Count(_) => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            ResultSet::Records(records) => Some(records),
            ResultSet::Count(_) => None,
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            ResultSet::Count(count) => Some(*count),
            ResultSet::Records(_) => None,
        }
    }
}

pub struct LogsClient {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl LogsClient {
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

    /// Fetches one snapshot of the device log.
    ///
    /// Transport failures are returned as-is. Odd response shapes and bad
    /// filter text only produce diagnostics.
    pub async fn get_logs(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        let sink = self.diagnostics.as_ref();
        let body = build_request_body(options, LOG_FIELDS)?;
        debug!("Log request body: {:?}", body);

        let response = match self
            .transport
            .invoke(Method::Post, LOG_PRINT_ENDPOINT, body)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Error retrieving logs: {}", e);
                return Err(e);
            }
        };

        let expect = if options.is_count_only() {
            Expect::Count
        } else {
            Expect::Records
        };
        let records = match normalize(response, expect, sink) {
            Normalized::Count(count) => return Ok(ResultSet::Count(count)),
            normalized => normalized.into_records(),
        };
        let mut records = filter_records(records, options.where_clause.as_deref(), sink);

        if let Some(max) = max_records {
            if records.len() > max {
                sink.warning(
                    CONTEXT,
                    format!(
                        "Limiting logs to {} entries (retrieved {})",
                        max,
                        records.len()
                    ),
                );
                records.truncate(max);
            }
        }

        Ok(ResultSet::Records(records))
    }

    pub async fn get_debug_logs(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        self.get_topic_logs("debug", options, max_records).await
    }

    pub async fn get_error_logs(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        self.get_topic_logs("error", options, max_records).await
    }

    pub async fn get_warning_logs(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        self.get_topic_logs("warning", options, max_records).await
    }

    pub async fn get_info_logs(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        self.get_topic_logs("info", options, max_records).await
    }

    /// Logs of a separate memory buffer. `buffer` is not a filterable field,
    /// so the predicate passes every record and is reported as unsupported.
    pub async fn get_logs_from_buffer(
        &self,
        buffer_name: &str,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        let mut options = options.clone();
        options.restrict(&format!("buffer=\"{}\"", buffer_name));
        self.get_logs(&options, max_records).await
    }

    /// Sets `withExtraInfo` unless the caller already chose a value. The
    /// device may still omit the `extra-info` field.
    pub async fn get_logs_with_extra_info(
        &self,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        let mut options = options.clone();
        options.with_extra_info.get_or_insert(true);
        self.get_logs(&options, max_records).await
    }

    pub async fn find_logs(
        &self,
        where_clause: &str,
        options: &LogOptions,
    ) -> Result<ResultSet, ClientError> {
        self.get_logs_by_condition(where_clause, options, Some(DEFAULT_MAX_RECORDS))
            .await
    }

    pub async fn get_logs_by_condition(
        &self,
        condition: &str,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        let mut options = options.clone();
        options.restrict(condition);
        self.get_logs(&options, max_records).await
    }

    async fn get_topic_logs(
        &self,
        topic: &str,
        options: &LogOptions,
        max_records: Option<usize>,
    ) -> Result<ResultSet, ClientError> {
        let mut options = options.clone();
        options.restrict(&format!("topics~\"{}\"", topic));
        options.brief = Some(true);
        self.get_logs(&options, max_records).await
    }
}
