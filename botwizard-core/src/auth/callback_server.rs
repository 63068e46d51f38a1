// botwizard-core/src/auth/callback_server.rs
//
// Local HTTP endpoint receiving the Google OAuth redirect. The caller
// obtains a one-time `state` token before opening the browser and
// subscribes to a oneshot channel; the callback verifies the state and
// delivers the code through the channel. No cross-window messaging is
// involved, so the flow works even when the opener is gone.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
};
use axum_server::{Handle, Server};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{Mutex, oneshot};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::Error;

/// The final result from the OAuth callback.
#[derive(Debug, Clone)]
pub struct CallbackResult {
    pub code: String,
}

/// Query string Google sends back: ?code=...&state=... or ?error=...
#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Clone)]
struct CallbackServerState {
    expected_state: String,
    done_tx: Arc<Mutex<Option<oneshot::Sender<CallbackResult>>>>,
}

/// An opaque URL-safe token embedded in the consent URL and verified on
/// the callback.
pub fn generate_state_token() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..32)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

/// Starts the callback server on `port`. Returns the state token to embed
/// in the consent URL, the receiver the caller awaits for the code, and a
/// sender for graceful shutdown.
///
/// Fails up front when the port cannot be bound; the actual server binds
/// in a background task, so without this check a busy port would leave
/// the caller waiting on a receiver that can never fire.
pub async fn start_callback_server(
    port: u16,
) -> Result<(String, oneshot::Receiver<CallbackResult>, oneshot::Sender<()>), Error> {
    test_port_available(port).await?;

    let state_token = generate_state_token();

    let (done_tx, done_rx) = oneshot::channel::<CallbackResult>();
    let state = CallbackServerState {
        expected_state: state_token.clone(),
        done_tx: Arc::new(Mutex::new(Some(done_tx))),
    };

    let app = router(state);

    let (shutdown_send, shutdown_recv) = oneshot::channel::<()>();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("OAuth callback server listening on http://{}", addr);

    let handle = Handle::new();
    let handle_clone = handle.clone();

    tokio::spawn(async move {
        let _ = shutdown_recv.await;
        handle_clone.graceful_shutdown(None);
    });

    let server = Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service());

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Callback server error: {}", e);
        }
        info!("Callback server shut down.");
    });

    Ok((state_token, done_rx, shutdown_send))
}

fn router(state: CallbackServerState) -> Router {
    Router::new()
        .route("/callback", get(handle_callback))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn handle_callback(
    State(state): State<CallbackServerState>,
    Query(query): Query<AuthQuery>,
) -> (StatusCode, Html<String>) {
    if let Some(err) = query.error.as_ref() {
        let desc = query.error_description.clone().unwrap_or_default();
        let msg = format!("<h2>Google authorization failed</h2><p>{}</p><p>{}</p>", err, desc);
        return (StatusCode::OK, Html(msg));
    }

    // CSRF check: the state must match the token we issued for this flow.
    if query.state.as_deref() != Some(state.expected_state.as_str()) {
        warn!("OAuth callback with missing or mismatched state; rejecting");
        let msg = "<h2>Authorization rejected</h2>\
                   <p>The request did not originate from this application. \
                   Please restart the connection flow.</p>";
        return (StatusCode::BAD_REQUEST, Html(msg.to_string()));
    }

    if let Some(code) = query.code.clone() {
        if let Some(tx) = state.done_tx.lock().await.take() {
            let _ = tx.send(CallbackResult { code });
        }

        let success = "<h2>Google authorization successful</h2>\
                       <p>You can close this window and return to the dashboard.</p>";
        return (StatusCode::OK, Html(success.to_string()));
    }

    let msg = "<h2>Missing 'code' query param</h2><p>Check logs or try again.</p>";
    (StatusCode::OK, Html(msg.to_string()))
}

pub async fn test_port_available(port: u16) -> Result<(), Error> {
    use tokio::net::TcpListener;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            drop(listener);
            Ok(())
        }
        Err(e) => Err(Error::Auth(format!("Port {} not available: {}", port, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn state_tokens_are_unique_and_url_safe() {
        let a = generate_state_token();
        let b = generate_state_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    fn test_state(expected: &str) -> (CallbackServerState, oneshot::Receiver<CallbackResult>) {
        let (done_tx, done_rx) = oneshot::channel();
        let state = CallbackServerState {
            expected_state: expected.to_string(),
            done_tx: Arc::new(Mutex::new(Some(done_tx))),
        };
        (state, done_rx)
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn mismatched_state_is_rejected_without_delivering_a_code() {
        let (state, mut done_rx) = test_state("expected-token");
        let app = router(state);

        let (status, body) = call(app, "/callback?code=abc&state=forged-token").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Authorization rejected"));
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn missing_state_is_rejected() {
        let (state, mut done_rx) = test_state("expected-token");
        let app = router(state);

        let (status, _) = call(app, "/callback?code=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn provider_error_renders_a_readable_page() {
        let (state, mut done_rx) = test_state("expected-token");
        let app = router(state);

        let (status, body) = call(
            app,
            "/callback?error=access_denied&error_description=user%20declined",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Google authorization failed"));
        assert!(body.contains("user declined"));
        assert!(done_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn matching_state_delivers_the_code() {
        let (state, done_rx) = test_state("expected-token");
        let app = router(state);

        let (status, body) = call(app, "/callback?code=auth-code-1&state=expected-token").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("successful"));

        let result = done_rx.await.unwrap();
        assert_eq!(result.code, "auth-code-1");
    }

    #[tokio::test]
    async fn busy_port_fails_at_startup() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let err = start_callback_server(port).await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        drop(listener);
    }
}
