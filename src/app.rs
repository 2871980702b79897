use std::net::SocketAddr;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, state::AppState, users};

pub fn build_app(state: AppState) -> anyhow::Result<Router> {
    let origin: HeaderValue = state
        .config
        .cors_origin
        .parse()
        .context("CORS_ORIGIN is not a valid header value")?;

    // One allowed origin, with credentials; wildcard is not an option here.
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    Ok(Router::new()
        .nest("/api", users::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        ))
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            mongo_uri: "mongodb://localhost:27017".into(),
            mongo_db: "talentpool-test".into(),
            cors_origin: "http://localhost:3000".into(),
            host: "127.0.0.1".into(),
            port: 0,
        })
    }

    /// An app whose startup store connection never came up.
    fn unready_app() -> Router {
        build_app(AppState::from_parts(None, test_config())).expect("router builds")
    }

    async fn body_json(res: axum::response::Response) -> serde_json::Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_down_answers_503_on_every_api_route() {
        let routes = [
            ("POST", "/api/register"),
            ("POST", "/api/login"),
            ("GET", "/api/profile/0123456789abcdef01234567"),
            ("PUT", "/api/profile/0123456789abcdef01234567"),
            ("GET", "/api/profiles"),
        ];

        for (method, path) in routes {
            let req = Request::builder()
                .method(method)
                .uri(path)
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap();
            let res = unready_app().oneshot(req).await.unwrap();

            assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE, "{method} {path}");
            let body = body_json(res).await;
            assert_eq!(
                body["message"],
                "Database service unavailable. Connection failed.",
                "{method} {path}"
            );
        }
    }

    #[tokio::test]
    async fn readiness_is_checked_before_id_validation() {
        // A malformed id still answers 503 while the store is down.
        let req = Request::builder()
            .uri("/api/profile/not-an-id")
            .body(Body::empty())
            .unwrap();
        let res = unready_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_does_not_touch_the_store() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = unready_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_routes_fall_through_to_404() {
        let req = Request::builder().uri("/api/accounts").body(Body::empty()).unwrap();
        let res = unready_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_an_origin_that_is_not_a_header_value() {
        let config = Arc::new(AppConfig {
            cors_origin: "http://bad\norigin".into(),
            ..(*test_config()).clone()
        });
        assert!(build_app(AppState::from_parts(None, config)).is_err());
    }
}
