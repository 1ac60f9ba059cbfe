use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use setu_core::{
    Backend, BackendConfig, ChatRequest, RegistrationRequest, SetuClient, SetuError,
};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn read_form(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap();
        fields.insert(name, value);
    }
    fields
}

async fn chat_handler(State(seen): State<Seen>, multipart: Multipart) -> Json<serde_json::Value> {
    let form = read_form(multipart).await;
    let reply = format!("Aapne kaha: {}", form.get("message").cloned().unwrap_or_default());
    seen.lock().unwrap().push(form);
    Json(json!({ "reply": reply }))
}

async fn register_handler(State(seen): State<Seen>, multipart: Multipart) -> StatusCode {
    let form = read_form(multipart).await;
    let ok = form.get("phone").map(|p| !p.is_empty()).unwrap_or(false);
    seen.lock().unwrap().push(form);
    if ok {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    }
}

fn spawn_backend(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::Server::from_tcp(listener)
            .unwrap()
            .serve(app.into_make_service())
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

fn client_for(base_url: String) -> SetuClient {
    SetuClient::new(&BackendConfig {
        base_url,
        request_timeout_secs: 5,
    })
    .unwrap()
}

fn mock_backend() -> (String, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/", get(|| async { "Yojana-Setu backend is running" }))
        .route("/chat", post(chat_handler))
        .route("/register", post(register_handler))
        .with_state(seen.clone());
    (spawn_backend(app), seen)
}

#[tokio::test]
async fn chat_posts_multipart_fields_and_parses_reply() {
    let (base_url, seen) = mock_backend();
    let client = client_for(base_url);

    let reply = client
        .chat(&ChatRequest {
            message: "PM Kisan".to_string(),
            phone: "9000000003".to_string(),
            history: r#"[{"role":"assistant","content":"Namaste!"}]"#.to_string(),
        })
        .await
        .unwrap();

    assert_eq!(reply.reply, "Aapne kaha: PM Kisan");
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["message"], "PM Kisan");
    assert_eq!(seen[0]["phone"], "9000000003");
    assert_eq!(seen[0]["history"], r#"[{"role":"assistant","content":"Namaste!"}]"#);
}

#[tokio::test]
async fn register_accepts_2xx_and_rejects_others() {
    let (base_url, seen) = mock_backend();
    let client = client_for(base_url);

    client
        .register(&RegistrationRequest {
            username: "Sunita Devi".to_string(),
            email: "sunita@example.com".to_string(),
            phone: "9000000004".to_string(),
        })
        .await
        .unwrap();

    let rejected = client
        .register(&RegistrationRequest {
            username: "No Phone".to_string(),
            email: "none@example.com".to_string(),
            phone: String::new(),
        })
        .await;
    assert!(matches!(
        rejected,
        Err(SetuError::HttpError { status_code: 400, .. })
    ));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["username"], "Sunita Devi");
    assert_eq!(seen[0]["email"], "sunita@example.com");
}

#[tokio::test]
async fn non_success_chat_is_an_error() {
    let app = Router::new().route(
        "/chat",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "bedrock unavailable") }),
    );
    let client = client_for(spawn_backend(app));

    let result = client
        .chat(&ChatRequest {
            message: "hello".to_string(),
            phone: "1".to_string(),
            history: "[]".to_string(),
        })
        .await;

    match result {
        Err(SetuError::HttpError {
            status_code,
            message,
        }) => {
            assert_eq!(status_code, 500);
            assert!(message.contains("bedrock unavailable"));
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_request_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(format!("http://{}", addr));

    let result = client
        .chat(&ChatRequest {
            message: "hello".to_string(),
            phone: "1".to_string(),
            history: "[]".to_string(),
        })
        .await;
    assert!(matches!(result, Err(SetuError::RequestError(_))));
    assert!(!client.ping().await);
}

#[tokio::test]
async fn ping_reports_live_backend() {
    let (base_url, _seen) = mock_backend();
    assert!(client_for(base_url).ping().await);
}
