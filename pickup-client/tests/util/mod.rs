use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    Json, Router,
};
use serde_json::Value;
use url::Url;

type Handler = dyn Fn(&str, Value) -> Value + Send + Sync;

/// Starts a JSON web server in the background that answers every request
/// with `handler(path, body)`. `body` is `Value::Null` for requests without
/// a body.
pub(crate) fn start_server(
    handler: impl Fn(&str, Value) -> Value + Send + Sync + 'static,
) -> Url {
    // Bound before returning, so the client can connect immediately.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let url = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
    let handler: Arc<Handler> = Arc::new(handler);
    let app = Router::new().fallback(respond).with_state(handler);
    std::thread::spawn(move || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).unwrap();
                axum::serve(listener, app).await.unwrap();
            })
    });
    url
}

async fn respond(
    State(handler): State<Arc<Handler>>,
    uri: Uri,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?
    };
    Ok(Json(handler(uri.path().trim_start_matches('/'), body)))
}
