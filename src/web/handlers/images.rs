//! Image delivery handlers

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::web::{
    AppState,
    responses::{error_response, image_response},
};

/// `GET /{size}`: a random source image at the named size
pub async fn serve_image(State(state): State<AppState>, Path(size): Path<String>) -> Response {
    match state.dispatcher.dispatch(&size).await {
        Ok(bytes) => image_response(bytes),
        Err(e) => {
            if !e.is_client_error() {
                debug!("Answering /{} with 503: {}", size, e);
            }
            error_response(&e)
        }
    }
}

/// `GET /`: permanent redirect to the largest size
pub async fn redirect_to_largest(State(state): State<AppState>) -> impl IntoResponse {
    Redirect::permanent(&format!("/{}", state.dispatcher.largest_size().name))
}
