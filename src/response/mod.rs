//! # Response Module
//!
//! The uniform response contract: every request, whatever happened to it,
//! terminates in a [`ResponseEnvelope`] - a status code plus a JSON body that
//! is either the handler's serialized output or a `{code, message}` error
//! object. [`emit`] writes an envelope through the narrow [`ResponseSink`]
//! transport interface; the engine never owns the connection, and write
//! failures are returned to the caller rather than retried.

mod core;

pub use core::{emit, status_reason, BufferedResponse, ResponseEnvelope, ResponseSink};
