//! Integration tests for bill query paging and batch execution over HTTP

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::time::Duration;

use k3bridge_core::BatchExecutor;
use k3bridge_domain::constants::BILL_QUERY_PAGE_SIZE;
use k3bridge_domain::{BatchConfig, OperationRequest, OperationResult};
use k3bridge_infra::{rows_to_objects, BillQuery};
use serde_json::{json, Value};
use support::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rows(count: usize, offset: usize) -> Value {
    Value::Array((0..count).map(|i| json!([format!("M{:05}", offset + i), ""])).collect())
}

#[tokio::test]
async fn bill_query_all_pages_until_a_short_page() {
    let server = MockServer::start().await;
    let page_size = BILL_QUERY_PAGE_SIZE as usize;
    mount_login(&server, "s1", 1).await;
    Mock::given(method("POST"))
        .and(path(BILL_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows(page_size, 0)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(BILL_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows(3, page_size)))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = session_client(&server);
    let query = BillQuery::new("BD_MATERIAL", vec!["FNumber".into(), "FName".into()])
        .with_filter("FForbidStatus='A'");

    let all = client.bill_query_all(&query).await.expect("all pages");
    assert_eq!(all.len(), page_size + 3);

    let objects = rows_to_objects(&Value::Array(all), &query.field_keys);
    assert_eq!(objects[0], json!({"FNumber": "M00000", "FName": null}));
    assert_eq!(
        objects[page_size + 2],
        json!({"FNumber": format!("M{:05}", page_size + 2), "FName": null})
    );

    let requests = server.received_requests().await.expect("request recording");
    let start_rows: Vec<Value> = requests
        .iter()
        .filter(|r| r.url.path() == BILL_QUERY_PATH)
        .map(|r| request_parameters(r)[0]["StartRow"].clone())
        .collect();
    assert_eq!(start_rows, vec![json!(0), json!(page_size)]);

    let first = &request_parameters(&requests[1])[0];
    assert_eq!(first["FieldKeys"], json!("FNumber,FName"));
    assert_eq!(first["FilterString"], json!("FForbidStatus='A'"));
    assert_eq!(first["Limit"], json!(page_size));
}

#[tokio::test]
async fn empty_first_page_stops_immediately() {
    let server = MockServer::start().await;
    mount_login(&server, "s1", 1).await;
    Mock::given(method("POST"))
        .and(path(BILL_QUERY_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _store) = session_client(&server);
    let query = BillQuery::new("BD_MATERIAL", vec!["FNumber".into()]);

    assert!(client.bill_query_all(&query).await.expect("empty result").is_empty());
}

#[tokio::test]
async fn parallel_batch_over_one_session_keeps_input_order() {
    let server = MockServer::start().await;
    mount_login(&server, "s1", 1).await;
    Mock::given(method("POST"))
        .and(path(VIEW_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body(json!({"ok": true}))))
        .expect(5)
        .mount(&server)
        .await;

    let (client, _store) = session_client(&server);
    // Log in up front so the parallel items share one session.
    client.call(&OperationRequest::dynamic_form("View", vec![json!("warmup")])).await.unwrap();

    let numbers = ["M1", "M2", "M3", "M4"];
    let executor = BatchExecutor::new(BatchConfig::parallel(2, Duration::from_millis(10)));
    let groups = executor
        .run(numbers.len(), |i| {
            let client = &client;
            let number = numbers[i];
            let request = OperationRequest::dynamic_form(
                "View",
                vec![json!("BD_MATERIAL"), json!({"Number": number})],
            );
            async move {
                client
                    .call(&request)
                    .await
                    .map(|value| OperationResult::Item(json!({"number": number, "response": value})))
            }
        })
        .await
        .expect("batch");

    let order: Vec<Value> = groups[0].iter().map(|e| e.json["number"].clone()).collect();
    assert_eq!(order, vec![json!("M1"), json!("M2"), json!("M3"), json!("M4")]);
    assert!(groups[0].iter().all(|e| e.json["response"] == json!({"ok": true})));
}
