use axum::Router;
use axum::extract::Request;
use tower_http::trace::TraceLayer;
use tracing::Level;

pub(crate) fn apply_trace(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::span!(
                Level::INFO,
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
            )
        }),
    )
}
