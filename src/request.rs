//! Request body construction shared by every accessor.

use crate::diagnostics::DiagnosticSink;
use crate::error::ClientError;
use crate::normalize::{normalize_records, Record};
use crate::transport::{Method, RequestBody, Transport};
use log::error;
use serde::Serialize;
use serde_json::Value;

/// Fixed `(option key, wire key)` translation table.
pub type FieldMap = &'static [(&'static str, &'static str)];

/// Copies every present, non-null option named in `field_map` into a wire body.
///
/// Options are serialised first, so any `Serialize` options struct works.
/// Keys missing from `field_map` never reach the wire.
pub fn build_request_body<T: Serialize>(
    options: &T,
    field_map: FieldMap,
) -> Result<RequestBody, ClientError> {
    let value = serde_json::to_value(options).map_err(ClientError::Encode)?;
    let mut body = RequestBody::new();

    let Value::Object(options) = value else {
        return Ok(body);
    };

    for (option_key, wire_key) in field_map {
        match options.get(*option_key) {
            None | Some(Value::Null) => {}
            Some(value) => {
                body.insert((*wire_key).to_string(), value.clone());
            }
        }
    }

    Ok(body)
}

/// `POST` a print command and normalise the answer to a record list.
///
/// `what` names the resource in the error log line.
pub async fn fetch_records(
    transport: &dyn Transport,
    endpoint: &str,
    body: RequestBody,
    what: &str,
    sink: &dyn DiagnosticSink,
) -> Result<Vec<Record>, ClientError> {
    match transport.invoke(Method::Post, endpoint, body).await {
        Ok(response) => Ok(normalize_records(response, sink).into_records()),
        Err(e) => {
            error!("Error fetching {}: {}", what, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MAP: FieldMap = &[("plain", "plain"), ("camelKey", "camel-key"), ("flag", "flag")];

    #[test]
    fn translates_and_omits_absent_or_null() {
        let options = json!({
            "plain": "a",
            "camelKey": 5,
            "flag": null,
            "unmapped": true,
        });
        let body = build_request_body(&options, MAP).unwrap();
        assert_eq!(Value::Object(body), json!({"plain": "a", "camel-key": 5}));
    }

    #[test]
    fn false_is_present_not_absent() {
        let body = build_request_body(&json!({"flag": false}), MAP).unwrap();
        assert_eq!(body.get("flag"), Some(&json!(false)));
    }

    #[test]
    fn wire_order_follows_the_table() {
        let body = build_request_body(&json!({"flag": true, "plain": "x"}), MAP).unwrap();
        let keys: Vec<&String> = body.keys().collect();
        assert_eq!(keys, vec!["plain", "flag"]);
    }

    #[test]
    fn non_object_options_produce_empty_body() {
        assert!(build_request_body(&json!(null), MAP).unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_records_normalizes_and_propagates() {
        use crate::diagnostics::RecordingSink;
        use crate::transport::fake::FakeTransport;

        let sink = RecordingSink::new();
        let fake = FakeTransport::new()
            .with_json("/ip/pool/print", json!({"ret": [{"name": "dhcp"}]}))
            .with_error("/ip/route/print", || ClientError::Timeout("slow".to_string()));

        let pools = fetch_records(&fake, "/ip/pool/print", RequestBody::new(), "IP pools", &sink)
            .await
            .unwrap();
        assert_eq!(pools.len(), 1);

        let err = fetch_records(&fake, "/ip/route/print", RequestBody::new(), "IP routes", &sink)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }
}
