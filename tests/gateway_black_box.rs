use std::sync::Arc;

use account_ledger::gateway::{self, AppState};
use account_ledger::store::{IsolationLevel, MemoryLedgerStore};
use reqwest::StatusCode;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    store: MemoryLedgerStore,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = MemoryLedgerStore::with_accounts([
            ("1", "100.0"),
            ("2", "200.0"),
            ("3", "invalid_bigdecimal"),
        ]);
        let state = Arc::new(AppState::new(
            Arc::new(store.clone()),
            IsolationLevel::RepeatableRead,
        ));

        // Same router as prod, on an ephemeral port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, gateway::router(state)).await.unwrap();
        });

        Self {
            base_url,
            store,
            handle,
        }
    }

    async fn transfer(&self, client: &reqwest::Client, body: Value) -> reqwest::Response {
        client
            .post(format!("{}/transfers", self.base_url))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn account(&self, client: &reqwest::Client, id: &str) -> reqwest::Response {
        client
            .get(format!("{}/accounts/{}", self.base_url, id))
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn get_account_returns_exact_amount() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = srv.account(&client, "1").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await.unwrap(),
        json!({"id": "1", "amount": "100.0"})
    );
}

#[tokio::test]
async fn get_account_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = srv.account(&client, "42").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "NO_SUCH_ACCOUNT");
    assert_eq!(body["error"], "Account 42 does not exist");

    let res = srv.account(&client, "3").await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "CORRUPT_DATA");
    assert!(body["error"].as_str().unwrap().contains("invalid_bigdecimal"));
}

#[tokio::test]
async fn transfer_moves_funds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = srv
        .transfer(
            &client,
            json!({"sourceAccountId": "2", "targetAccountId": "1", "amount": "50.01"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let one: Value = srv.account(&client, "1").await.json().await.unwrap();
    let two: Value = srv.account(&client, "2").await.json().await.unwrap();
    assert_eq!(one["amount"], "150.01");
    assert_eq!(two["amount"], "149.99");
}

#[tokio::test]
async fn transfer_rejections_leave_balances_untouched() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let cases = [
        (
            json!({"sourceAccountId": "1", "targetAccountId": "2", "amount": "10000"}),
            StatusCode::FORBIDDEN,
            "INSUFFICIENT_FUNDS",
        ),
        (
            json!({"sourceAccountId": "1", "targetAccountId": "2", "amount": "0"}),
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
        ),
        (
            json!({"sourceAccountId": "1", "targetAccountId": "1", "amount": "5"}),
            StatusCode::BAD_REQUEST,
            "INVALID_REQUEST",
        ),
        (
            json!({"sourceAccountId": "1", "targetAccountId": "404", "amount": "5"}),
            StatusCode::NOT_FOUND,
            "NO_SUCH_ACCOUNT",
        ),
        (
            json!({"sourceAccountId": "1", "targetAccountId": "3", "amount": "5"}),
            StatusCode::INTERNAL_SERVER_ERROR,
            "CORRUPT_DATA",
        ),
    ];

    for (body, status, code) in cases {
        let res = srv.transfer(&client, body.clone()).await;
        assert_eq!(res.status(), status, "request {}", body);
        let err: Value = res.json().await.unwrap();
        assert_eq!(err["code"], code, "request {}", body);
    }

    assert_eq!(srv.store.amount("1").as_deref(), Some("100.0"));
    assert_eq!(srv.store.amount("2").as_deref(), Some("200.0"));
}

#[tokio::test]
async fn malformed_transfer_body_is_bad_request() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/transfers", srv.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(body["error"], "Invalid request!");
    assert!(!body["causes"].as_array().unwrap().is_empty());

    let res = srv
        .transfer(
            &client,
            json!({"sourceAccountId": "1", "targetAccountId": "2", "amount": "lots"}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_transfers_over_http_conserve_total() {
    const N: usize = 50;
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mut handles = Vec::with_capacity(2 * N);
    for i in 0..2 * N {
        let client = client.clone();
        let url = format!("{}/transfers", srv.base_url);
        let body = if i % 2 == 0 {
            json!({"sourceAccountId": "1", "targetAccountId": "2", "amount": "0.01"})
        } else {
            json!({"sourceAccountId": "2", "targetAccountId": "1", "amount": "0.02"})
        };
        handles.push(tokio::spawn(async move {
            client.post(url).json(&body).send().await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), StatusCode::NO_CONTENT);
    }

    let one: Value = srv.account(&client, "1").await.json().await.unwrap();
    let two: Value = srv.account(&client, "2").await.json().await.unwrap();
    assert_eq!(one["amount"], "100.50");
    assert_eq!(two["amount"], "199.50");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/api-docs/openapi.json", srv.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc: Value = res.json().await.unwrap();
    assert!(doc["paths"]["/transfers"].is_object());
}
