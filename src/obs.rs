//! Observability helpers shared by the relay flows.
//!
//! Every flow runs inside a `gmail_relay.flow` span carrying `flow` and `stage` fields. With
//! the `metrics` feature enabled, each attempt, success, and failure also increments the
//! `gmail_relay_flow_total` counter labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Operations observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Building the consent redirect.
	Authorize,
	/// Exchanging an authorization code.
	Exchange,
	/// Refreshing the held credentials.
	Refresh,
	/// Sending a message through the mail API.
	SendMessage,
	/// Listing unread messages.
	ListUnread,
	/// Fetching one message.
	GetMessage,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Exchange => "exchange",
			FlowKind::Refresh => "refresh",
			FlowKind::SendMessage => "send_message",
			FlowKind::ListUnread => "list_unread",
			FlowKind::GetMessage => "get_message",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a flow result onto its terminal outcome.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
