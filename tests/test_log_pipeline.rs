use routeros_probe::diagnostics::{RecordingSink, Severity};
use routeros_probe::filter::apply;
use routeros_probe::logs::{LogOptions, LogsClient, ResultSet, LOG_PRINT_ENDPOINT};
use routeros_probe::normalize::{normalize_records, Record};
use routeros_probe::transport::fake::FakeTransport;
use routeros_probe::ClientError;
use serde_json::{json, Value};
use std::sync::Arc;

fn scenario_records() -> Value {
    json!([
        {"topics": "system,info", "message": "System started"},
        {"topics": "dhcp,info", "message": "DHCP server started"},
        {"topics": "system,warning", "message": "High memory usage"},
    ])
}

fn as_records(value: Value) -> Vec<Record> {
    normalize_records(value, &RecordingSink::new()).into_records()
}

fn logs_client(response: Value) -> (LogsClient, Arc<RecordingSink>) {
    let fake = Arc::new(FakeTransport::new().with_json(LOG_PRINT_ENDPOINT, response));
    let sink = Arc::new(RecordingSink::new());
    (LogsClient::with_diagnostics(fake, sink.clone()), sink)
}

async fn fetch(response: Value, filter: &str) -> (Vec<Record>, Arc<RecordingSink>) {
    let (client, sink) = logs_client(response);
    let result = client
        .get_logs(&LogOptions::new().with_where(filter), None)
        .await
        .expect("fake transport never fails here");
    (result.into_records().expect("record list"), sink)
}

#[tokio::test]
async fn test_scenario_contains() {
    let all = as_records(scenario_records());
    let (out, _) = fetch(scenario_records(), r#"topics~"system""#).await;
    assert_eq!(out, vec![all[0].clone(), all[2].clone()]);
}

#[tokio::test]
async fn test_scenario_and() {
    let all = as_records(scenario_records());
    let (out, _) = fetch(scenario_records(), r#"topics~"system" and message~"started""#).await;
    assert_eq!(out, vec![all[0].clone()]);
}

#[tokio::test]
async fn test_scenario_or() {
    let (out, _) = fetch(scenario_records(), r#"topics~"system" or topics~"dhcp""#).await;
    assert_eq!(out, as_records(scenario_records()));
}

#[tokio::test]
async fn test_scenario_case_insensitive() {
    let all = as_records(scenario_records());
    let (out, _) = fetch(scenario_records(), r#"topics~i"SYSTEM""#).await;
    assert_eq!(out, vec![all[0].clone(), all[2].clone()]);
}

#[tokio::test]
async fn test_scenario_malformed_filter_is_fail_open() {
    let (out, sink) = fetch(scenario_records(), r#"topics~~"system""#).await;
    assert_eq!(out, as_records(scenario_records()));
    assert!(!sink.snapshot().is_empty(), "a diagnostic must be recorded");
}

#[tokio::test]
async fn test_sloppy_clause_text_still_filters() {
    let all = as_records(scenario_records());
    let expected = vec![all[0].clone(), all[2].clone()];

    let (out, _) = fetch(scenario_records(), r#"topics~"system"x"#).await;
    assert_eq!(out, expected);

    let (out, sink) = fetch(scenario_records(), r#"topics~"system" and "#).await;
    assert_eq!(out, expected);
    assert_eq!(sink.count(Severity::Error), 0);
}

#[tokio::test]
async fn test_scenario_wrapped_and_bare_responses_match() {
    let (bare, _) = fetch(scenario_records(), "").await;
    let (wrapped, _) = fetch(json!({ "ret": scenario_records() }), "").await;
    assert_eq!(bare, wrapped);
    assert_eq!(bare.len(), 3);
}

#[test]
fn test_filter_laws() {
    let records = as_records(json!([
        {"topics": "system,info", "message": "System started"},
        {"topics": "dhcp,info", "message": "lease assigned"},
        {"topics": "system,error", "message": "login failure"},
        {"message": "no topics"},
        {"topics": "wireless,info", "message": "Connected"},
        {"topics": "dhcp,warning", "message": "lease deassigned"},
    ]));
    let sink = RecordingSink::new();
    let a = r#"topics~"dhcp""#;
    let b = r#"message~"lease""#;
    let c = r#"topics~"system""#;

    // identity
    assert_eq!(apply(&records, None, &sink), records);
    assert_eq!(apply(&records, Some(""), &sink), records);

    for f in [a, b, c, r#"topics="dhcp,info""#] {
        let once = apply(&records, Some(f), &sink);
        // idempotence
        assert_eq!(apply(&once, Some(f), &sink), once);
        // order-preserving subsequence
        let mut cursor = records.iter();
        for kept in &once {
            assert!(cursor.any(|r| r == kept), "{} reordered records", f);
        }
    }

    // OR is the order-preserving union
    let union: Vec<Record> = records
        .iter()
        .filter(|r| {
            let one = [(*r).clone()];
            !apply(&one, Some(a), &sink).is_empty() || !apply(&one, Some(c), &sink).is_empty()
        })
        .cloned()
        .collect();
    assert_eq!(apply(&records, Some(format!("{} or {}", a, c).as_str()), &sink), union);

    // AND is the intersection
    let left = apply(&records, Some(a), &sink);
    let right = apply(&records, Some(b), &sink);
    let intersection: Vec<Record> = left.into_iter().filter(|r| right.contains(r)).collect();
    assert_eq!(apply(&records, Some(format!("{} and {}", a, b).as_str()), &sink), intersection);

    // `~i` with a lower-cased literal keeps at least what `~` keeps
    let plain = apply(&records, Some(r#"message~"lease""#), &sink);
    let folded = apply(&records, Some(r#"message~i"lease""#), &sink);
    assert!(plain.iter().all(|r| folded.contains(r)));

    assert_eq!(sink.count(Severity::Error), 0);
}

#[tokio::test]
async fn test_truncation_bound() {
    let many: Vec<Value> = (0..25)
        .map(|i| json!({"topics": if i % 2 == 0 { "system,info" } else { "dhcp,info" }, "message": format!("entry {}", i)}))
        .collect();

    for n in [0usize, 1, 5, 13, 25, 100] {
        let (client, _) = logs_client(Value::Array(many.clone()));
        let filtered = client
            .get_logs(&LogOptions::new().with_where(r#"topics~"system""#), Some(n))
            .await
            .unwrap();
        assert_eq!(filtered.records().unwrap().len(), n.min(13));

        let unfiltered = client.get_logs(&LogOptions::new(), Some(n)).await.unwrap();
        assert_eq!(unfiltered.records().unwrap().len(), n.min(25));
    }
}

#[tokio::test]
async fn test_result_kind_follows_count_only() {
    for response in [json!("3"), json!(3), scenario_records(), json!({"ret": "3"})] {
        let (client, _) = logs_client(response.clone());
        let counted = client
            .get_logs(&LogOptions::new().with_count_only(), Some(1))
            .await
            .unwrap();
        assert!(matches!(counted, ResultSet::Count(_)), "{:?}", response);

        let listed = client.get_logs(&LogOptions::new(), Some(1)).await.unwrap();
        assert!(matches!(listed, ResultSet::Records(_)), "{:?}", response);
    }
}

#[tokio::test]
async fn test_transport_failures_keep_their_kind() {
    let fake = Arc::new(
        FakeTransport::new().with_error(LOG_PRINT_ENDPOINT, || ClientError::Status {
            status: 401,
            detail: "not allowed".to_string(),
        }),
    );
    let client = LogsClient::with_diagnostics(fake, Arc::new(RecordingSink::new()));
    let err = client.get_error_logs(&LogOptions::new(), None).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}
