use axum::extract::FromRef;
use faultline_auth::Gate;
use faultline_core::Dispatcher;
use faultline_upload::UploadPipeline;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub gate: Gate,
    pub uploads: UploadPipeline,
}

impl FromRef<AppState> for Dispatcher {
    fn from_ref(state: &AppState) -> Self {
        state.dispatcher
    }
}

impl FromRef<AppState> for Gate {
    fn from_ref(state: &AppState) -> Self {
        state.gate.clone()
    }
}
