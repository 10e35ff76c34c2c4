use serde::Serialize;
use serde_json::{json, Value};
use std::io;

/// The (status, body) pair written back to the caller.
///
/// Error bodies are always `{code, message}` objects; success bodies are the
/// handler's output record serialized with its declared field names as keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub body: Value,
}

impl ResponseEnvelope {
    /// Success envelope carrying an already-serialized body.
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// Error envelope with the uniform `{code, message}` body.
    #[must_use]
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "code": code, "message": message }),
        }
    }
}

/// Canonical reason phrase for the status codes the engine emits.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// The narrow interface the emitter needs from a transport response.
///
/// Status and headers are committed before the body; a sink backed by a real
/// connection may therefore have already sent the status line when
/// `write_body` fails, which is why the emitter never retries.
pub trait ResponseSink {
    fn set_status(&mut self, status: u16, reason: &'static str);
    fn set_header(&mut self, name: &str, value: &str);
    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Serialize an envelope into a sink: status line, `Content-Type:
/// application/json`, then the body bytes.
pub fn emit(sink: &mut dyn ResponseSink, envelope: &ResponseEnvelope) -> io::Result<()> {
    sink.set_status(envelope.status, status_reason(envelope.status));
    sink.set_header("Content-Type", "application/json");
    let bytes = serde_json::to_vec(&envelope.body)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    sink.write_body(&bytes)
}

/// In-memory sink for hosts that buffer the whole response, and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedResponse {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl BufferedResponse {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseSink for BufferedResponse {
    fn set_status(&mut self, status: u16, reason: &'static str) {
        self.status = status;
        self.reason = reason;
    }

    fn set_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}
