use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::routing::{delete, get, post};
use axum::{Router, middleware};
use faultline_auth::{AccessClaims, Admins, Authenticated, Authorized, Everyone, Identity, Role, authenticate};
use faultline_core::{ApiError, ApiResponse, Failure, Problem, Unclassified, UploadError};
use faultline_upload::RemoteAsset;
use http::Uri;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;
use crate::validated::ValidatedJson;

/// Routes under `/api/v1`, all behind authentication
pub fn api_router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route("/tokens", post(issue_token))
        .route("/uploads", post(upload))
        .route("/uploads/{*public_id}", delete(delete_upload))
        .route_layer(middleware::from_fn_with_state(state.gate.clone(), authenticate))
}

async fn me(Authenticated(identity): Authenticated) -> ApiResponse<Identity> {
    ApiResponse::ok(identity, "Current user retrieved successfully")
}

async fn upload(
    State(state): State<AppState>,
    caller: Authorized<Everyone>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<RemoteAsset>, Failure> {
    let multipart = multipart.map_err(|rejection| {
        UploadError::other(
            Some(state.uploads.policy().field().to_owned()),
            rejection.body_text(),
        )
    })?;

    let asset = state.uploads.upload(multipart).await?;
    tracing::info!(subject = %caller.identity.id, public_id = %asset.public_id, "image uploaded");

    Ok(ApiResponse::created(asset, "Image uploaded successfully"))
}

async fn delete_upload(
    State(state): State<AppState>,
    _admin: Authorized<Admins>,
    Path(public_id): Path<String>,
) -> Result<ApiResponse<()>, Failure> {
    state.uploads.delete(&public_id).await?;
    Ok(ApiResponse::ok((), "Image deleted successfully"))
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct IssueTokenRequest {
    user: TokenSubject,
}

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
struct TokenSubject {
    id: String,
    role: Role,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuedToken {
    access_token: String,
}

/// Sign an access token for another principal
///
/// Admins cannot mint tokens for a higher role than their own.
async fn issue_token(
    State(state): State<AppState>,
    admin: Authorized<Admins>,
    ValidatedJson(request): ValidatedJson<IssueTokenRequest>,
) -> Result<ApiResponse<IssuedToken>, Failure> {
    let subject = request.user;
    if subject.role == Role::SuperAdmin && admin.identity.role != Role::SuperAdmin {
        return Err(ApiError::forbidden("Unauthorized User").into());
    }

    let claims = AccessClaims {
        id: subject.id,
        role: subject.role,
        email: subject.email,
        name: subject.name,
    };

    let access_token = state.gate.verifier().issue(claims).map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        ApiError::internal("Failed to issue access token")
    })?;

    Ok(ApiResponse::created(IssuedToken { access_token }, "Access token issued"))
}

/// Unknown routes take the same path as every other failure
pub async fn not_found(uri: Uri) -> Failure {
    Unclassified::new()
        .with_status(404)
        .with_message("Route not found.")
        .with_problems(vec![Problem::new(uri.to_string(), "Route not found.")])
        .into()
}

/// Known path, wrong method
pub async fn method_not_allowed(uri: Uri) -> Failure {
    Unclassified::new()
        .with_status(405)
        .with_message("Method not allowed.")
        .with_problems(vec![Problem::new(uri.to_string(), "Method not allowed.")])
        .into()
}
