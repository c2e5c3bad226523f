//! Mapping of relay errors onto HTTP responses.

// crates.io
use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde_json::json;
// self
use crate::{_prelude::*, error::AdmissionError};

/// Gated operation a failure belongs to; selects the generic message shown for faults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
	/// `POST /sendEmail`.
	SendEmail,
	/// `GET /listUnread`.
	ListUnread,
	/// `GET /getEmail`.
	GetEmail,
	/// `GET /refresh`.
	Refresh,
}
impl Operation {
	/// Message returned in place of upstream detail.
	pub const fn fault_message(self) -> &'static str {
		match self {
			Operation::SendEmail => "Failed to send email",
			Operation::ListUnread => "Failed to list unread emails",
			Operation::GetEmail => "Failed to fetch email",
			Operation::Refresh => "Failed to refresh credentials",
		}
	}
}

/// Error response for gated routes.
///
/// Admission and validation failures echo their reason. Upstream and configuration faults are
/// logged with full detail and answered with the operation's generic message.
#[derive(Debug)]
pub struct Failure {
	operation: Option<Operation>,
	error: Error,
}
impl Failure {
	/// Wraps an error raised while serving `operation`.
	pub fn new(operation: Operation, error: impl Into<Error>) -> Self {
		Self { operation: Some(operation), error: error.into() }
	}

	/// Rejection raised before any operation started.
	pub fn admission(error: AdmissionError) -> Self {
		Self { operation: None, error: error.into() }
	}

	/// Underlying error.
	pub fn error(&self) -> &Error {
		&self.error
	}

	/// Status code this failure maps to.
	pub fn status(&self) -> StatusCode {
		if self.error.is_admission() {
			StatusCode::UNAUTHORIZED
		} else if self.error.is_validation() {
			StatusCode::BAD_REQUEST
		} else {
			StatusCode::INTERNAL_SERVER_ERROR
		}
	}

	fn is_fault(&self) -> bool {
		!self.error.is_admission() && !self.error.is_validation()
	}
}
impl IntoResponse for Failure {
	fn into_response(self) -> Response {
		let status = self.status();
		let message = if self.is_fault() {
			tracing::error!(
				operation = ?self.operation,
				error = %self.error,
				source = ?StdError::source(&self.error).map(ToString::to_string),
				"Operation failed upstream."
			);

			self.operation.map_or("Internal error", Operation::fault_message).to_owned()
		} else {
			self.error.to_string()
		};

		(status, Json(json!({ "error": message }))).into_response()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{UpstreamError, ValidationError};

	#[test]
	fn statuses_follow_the_error_class() {
		assert_eq!(
			Failure::admission(AdmissionError::AuthRequired).status(),
			StatusCode::UNAUTHORIZED
		);
		assert_eq!(
			Failure::new(Operation::GetEmail, ValidationError::MissingQueryParameter { name: "id" })
				.status(),
			StatusCode::BAD_REQUEST
		);

		let fault = Failure::new(
			Operation::SendEmail,
			UpstreamError::MailApi { operation: "send", status: 403, body_preview: "{}".into() },
		);

		assert_eq!(fault.status(), StatusCode::INTERNAL_SERVER_ERROR);
		assert!(fault.error().is_upstream());
		assert!(fault.is_fault());
		assert!(
			!Failure::new(Operation::SendEmail, ValidationError::MissingSendFields {
				missing: vec!["to"]
			})
			.is_fault()
		);
	}
}
