use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::ClientError;
use crate::normalize::Record;
use crate::request::{build_request_body, fetch_records, FieldMap};
use crate::transport::{RequestBody, Transport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

pub const IP_ADDRESS_ENDPOINT: &str = "/ip/address/print";
pub const IP_ROUTE_ENDPOINT: &str = "/ip/route/print";
pub const IP_POOL_ENDPOINT: &str = "/ip/pool/print";

const CONTEXT: &str = "ip";

pub const IP_ADDRESS_FIELDS: FieldMap = &[
    ("interface", "interface"),
    ("network", "network"),
    ("comment", "comment"),
    ("disabled", "disabled"),
];

pub const IP_ROUTE_FIELDS: FieldMap = &[
    ("dstAddress", "dst-address"),
    ("gateway", "gateway"),
    ("routingMark", "routing-mark"),
    ("disabled", "disabled"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpAddressOptions {
    pub interface: Option<String>,
    pub network: Option<String>,
    pub comment: Option<String>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpRouteOptions {
    pub dst_address: Option<String>,
    pub gateway: Option<String>,
    pub routing_mark: Option<String>,
    pub disabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NetworkSummary {
    pub ip_addresses_count: usize,
    pub ip_routes_count: usize,
    pub ip_pools_count: usize,
    pub interfaces: Vec<String>,
    pub networks: Vec<String>,
    pub gateways: Vec<String>,
}

impl NetworkSummary {
    pub fn from_parts(addresses: &[Record], routes: &[Record], pools: &[Record]) -> Self {
        Self {
            ip_addresses_count: addresses.len(),
            ip_routes_count: routes.len(),
            ip_pools_count: pools.len(),
            interfaces: distinct(addresses, "interface"),
            networks: distinct(addresses, "network"),
            gateways: distinct(routes, "gateway"),
        }
    }
}

/// Sorted, de-duplicated non-empty string values of `key`.
fn distinct(records: &[Record], key: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get(key).and_then(|v| v.as_str()))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct IpClient {
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl IpClient {
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

    pub async fn get_ip_addresses(
        &self,
        options: &IpAddressOptions,
    ) -> Result<Vec<Record>, ClientError> {
        let body = build_request_body(options, IP_ADDRESS_FIELDS)?;
        self.fetch(IP_ADDRESS_ENDPOINT, body, "IP addresses").await
    }

    pub async fn get_ip_routes(&self, options: &IpRouteOptions) -> Result<Vec<Record>, ClientError> {
        let body = build_request_body(options, IP_ROUTE_FIELDS)?;
        self.fetch(IP_ROUTE_ENDPOINT, body, "IP routes").await
    }

    pub async fn get_ip_pools(&self) -> Result<Vec<Record>, ClientError> {
        self.fetch(IP_POOL_ENDPOINT, RequestBody::new(), "IP pools")
            .await
    }

    /// Fetches addresses, routes and pools concurrently. A failed part is
    /// reported and counted as empty; it never aborts the other two.
    pub async fn get_network_summary(&self) -> NetworkSummary {
        let address_options = IpAddressOptions::default();
        let route_options = IpRouteOptions::default();
        let (addresses, routes, pools) = tokio::join!(
            self.get_ip_addresses(&address_options),
            self.get_ip_routes(&route_options),
            self.get_ip_pools(),
        );

        let addresses = self.or_empty(addresses, "addresses");
        let routes = self.or_empty(routes, "routes");
        let pools = self.or_empty(pools, "pools");

        NetworkSummary::from_parts(&addresses, &routes, &pools)
    }

    fn or_empty(&self, result: Result<Vec<Record>, ClientError>, what: &str) -> Vec<Record> {
        result.unwrap_or_else(|e| {
            self.diagnostics
                .error(CONTEXT, format!("Error fetching {}: {}", what, e));
            Vec::new()
        })
    }

    async fn fetch(
        &self,
        endpoint: &str,
        body: RequestBody,
        what: &str,
    ) -> Result<Vec<Record>, ClientError> {
        fetch_records(
            self.transport.as_ref(),
            endpoint,
            body,
            what,
            self.diagnostics.as_ref(),
        )
        .await
    }
}
