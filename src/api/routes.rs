//! Route handlers.

// crates.io
use axum::{
	Json,
	body::Bytes,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Redirect},
};
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	api::{Admitted, AppState, Failure, Operation},
	error::ValidationError,
	mail::{MessageBody, OutgoingMessage},
};

/// Query of the provider's redirect back to the relay.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackQuery {
	/// Authorization code.
	pub code: Option<String>,
	/// Provider error, e.g. `access_denied` when the operator declines.
	pub error: Option<String>,
}

/// Query of `GET /getEmail`.
#[derive(Debug, Default, Deserialize)]
pub struct GetEmailQuery {
	/// Message identifier.
	pub id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
	success: bool,
	#[serde(with = "time::serde::rfc3339")]
	expires_at: OffsetDateTime,
}

/// `GET /`.
pub async fn index() -> &'static str {
	"Gmail relay running"
}

/// `GET /healthz`.
pub async fn healthz() -> &'static str {
	"ok"
}

/// `GET /auth`: sends the operator's browser to the consent screen.
pub async fn authorize(State(state): State<AppState>) -> Redirect {
	Redirect::to(state.broker.start_authorization().as_str())
}

/// `GET /oauth2callback`: exchanges the returned code and fills the slot.
pub async fn oauth_callback(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
) -> (StatusCode, &'static str) {
	let Some(code) = query.code.filter(|code| !code.trim().is_empty()) else {
		if let Some(error) = query.error {
			tracing::warn!(%error, "Provider redirected back without a code.");
		}

		return (StatusCode::BAD_REQUEST, "Missing code parameter");
	};

	match state.broker.exchange_code(&code).await {
		Ok(_) => (StatusCode::OK, "Gmail connected. You can close this tab."),
		Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "OAuth error"),
	}
}

/// `GET /logout`: empties the slot.
pub async fn logout(State(state): State<AppState>) -> &'static str {
	state.broker.logout();

	"Gmail disconnected."
}

/// `POST /sendEmail`.
///
/// The body is read only after admission. A body that is not a JSON object is treated as
/// empty, so it fails validation like any other request missing its fields.
pub async fn send_email(
	Admitted(credentials): Admitted,
	State(state): State<AppState>,
	body: Bytes,
) -> Result<Json<Value>, Failure> {
	let message = parse_send_request(&body).map_err(|e| Failure::new(Operation::SendEmail, e))?;
	let id = state
		.gmail
		.send(&credentials, &message)
		.await
		.map_err(|e| Failure::new(Operation::SendEmail, e))?;

	Ok(Json(json!({ "success": true, "id": id })))
}

/// `GET /listUnread`.
pub async fn list_unread(
	Admitted(credentials): Admitted,
	State(state): State<AppState>,
) -> Result<impl IntoResponse, Failure> {
	let messages = state
		.gmail
		.list_unread(&credentials, state.unread_limit)
		.await
		.map_err(|e| Failure::new(Operation::ListUnread, e))?;

	Ok(Json(json!({ "messages": messages })))
}

/// `GET /getEmail?id=`.
pub async fn get_email(
	Admitted(credentials): Admitted,
	State(state): State<AppState>,
	Query(query): Query<GetEmailQuery>,
) -> Result<Json<MessageBody>, Failure> {
	let id = query.id.filter(|id| !id.is_empty()).ok_or_else(|| {
		Failure::new(Operation::GetEmail, ValidationError::MissingQueryParameter { name: "id" })
	})?;
	let message = state
		.gmail
		.get_message(&credentials, &id)
		.await
		.map_err(|e| Failure::new(Operation::GetEmail, e))?;

	Ok(Json(message))
}

/// `GET /refresh`: mints a new access token from the held refresh token.
pub async fn refresh(
	Admitted(_): Admitted,
	State(state): State<AppState>,
) -> Result<impl IntoResponse, Failure> {
	let credentials =
		state.broker.refresh().await.map_err(|e| Failure::new(Operation::Refresh, e))?;

	Ok(Json(RefreshResponse { success: true, expires_at: credentials.expires_at() }))
}

/// Extracts the send fields; `message` wins over its `body` alias unless it is empty.
fn parse_send_request(body: &[u8]) -> Result<OutgoingMessage, ValidationError> {
	let payload = serde_json::from_slice::<Value>(body).unwrap_or_default();
	let text = match string_field(&payload, "message") {
		"" => string_field(&payload, "body"),
		text => text,
	};

	OutgoingMessage::new(string_field(&payload, "to"), string_field(&payload, "subject"), text)
}

fn string_field<'a>(payload: &'a Value, name: &str) -> &'a str {
	payload.get(name).and_then(Value::as_str).unwrap_or_default()
}
