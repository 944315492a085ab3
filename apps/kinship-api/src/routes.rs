use axum::{
	Json, Router,
	extract::{State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use kinship_service::{Error, IdentifyRequest, IdentifyResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/identify", post(identify))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn identify(
	State(state): State<AppState>,
	payload: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError> {
	let Json(payload) = payload.map_err(|rejection| {
		json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text(), None)
	})?;
	let response = state.service.identify(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } => json_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				message,
				Some(vec!["$.email".to_string(), "$.phoneNumber".to_string()]),
			),
			err => {
				tracing::error!(error = %err, "Identify request failed.");

				json_error(
					StatusCode::INTERNAL_SERVER_ERROR,
					"internal_error",
					"Internal server error.",
					None,
				)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
