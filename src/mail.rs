//! Gmail REST v1 collaborator: outgoing MIME construction, message shapes, and the client.

pub mod client;
pub mod message;
pub mod mime;

pub use client::*;
pub use message::*;
pub use mime::*;
