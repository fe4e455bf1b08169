use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use faultline_core::{Dispatcher, Failure, settle};

/// Outermost middleware: every response leaves through the dispatcher
///
/// Failures rendered further in are reported and re-rendered for the run
/// mode; a panic anywhere below becomes a 500 envelope.
pub async fn boundary_middleware(State(dispatcher): State<Dispatcher>, request: Request, next: Next) -> Response {
    settle(&dispatcher, async move { Ok::<_, Failure>(next.run(request).await) }).await
}
