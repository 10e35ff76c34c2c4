use crate::binding::parse_field;
use crate::dispatcher::{get_param, ParamVec};
use crate::response::ResponseEnvelope;
use crate::schema::{validate_shape, ConfigError, Shape};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, error};

/// Error codes the engine itself emits, plus the code space handlers draw
/// their own [`FlowError`] codes from.
pub mod codes {
    /// Required input field missing or blank (400).
    pub const EMPTY_INPUT: &str = "EMPTY_INPUT";
    /// Input field present but unparseable or overflowing (400).
    pub const INVALID_FIELD_TYPE: &str = "INVALID_FIELD_TYPE";
    /// Handler returned an unset status (502).
    pub const BAD_STATUS: &str = "BAD_STATUS";
    /// Handler output could not be serialized as a record (502).
    pub const BAD_OUTPUT: &str = "BAD_OUTPUT";
    /// Descriptor table and field setter disagree; a bug in a hand-written
    /// shape implementation (502).
    pub const BAD_BINDING: &str = "BAD_BINDING";
    /// The flow's coroutine is gone and cannot answer (503).
    pub const FLOW_UNAVAILABLE: &str = "FLOW_UNAVAILABLE";
    /// The handler panicked mid-invocation (500).
    pub const HANDLER_PANIC: &str = "HANDLER_PANIC";
}

/// Read-only error carrier a handler reports failure with: a machine code
/// and a human message, passed through to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowError {
    code: String,
    message: String,
}

impl FlowError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for FlowError {}

/// Result of one handler invocation. Both variants carry the status the
/// handler chose; the branch on failure is exhaustive rather than a check
/// for a nullable error.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { status: u16 },
    Failure { status: u16, error: FlowError },
}

impl Outcome {
    #[must_use]
    pub fn success(status: u16) -> Self {
        Outcome::Success { status }
    }

    #[must_use]
    pub fn failure(status: u16, error: FlowError) -> Self {
        Outcome::Failure { status, error }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Success { status } | Outcome::Failure { status, .. } => *status,
        }
    }
}

/// A handler a flow can be registered for.
///
/// `In` and `Out` are the declared wire shapes; `invoke` reads the populated
/// input, does the work, and fills the output. The `Default` bound is the
/// explicit per-request factory: every request gets a fresh, zero-valued
/// working copy of the whole handler, so no two invocations ever share field
/// storage. Handlers holding read-only configuration should reach it through
/// `Arc`ed state captured in the type, not through mutable fields.
pub trait FlowHandler: Default + Send + 'static {
    type In: Shape + Default;
    type Out: Shape + Serialize;

    fn input_mut(&mut self) -> &mut Self::In;
    fn output(&self) -> &Self::Out;
    fn invoke(&mut self) -> Outcome;
}

/// The immutable registered template for one handler type.
///
/// Created once at startup by [`Flow::register`] and kept for the process
/// lifetime; it holds no mutable state, only the validated contract. The
/// per-request working copy is allocated inside [`Flow::handle`] and dropped
/// when the request's envelope has been produced.
pub struct Flow<H: FlowHandler> {
    name: &'static str,
    _marker: PhantomData<fn() -> H>,
}

impl<H: FlowHandler> Clone for Flow<H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H: FlowHandler> Copy for Flow<H> {}

impl<H: FlowHandler> fmt::Debug for Flow<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow").field("name", &self.name).finish()
    }
}

impl<H: FlowHandler> Flow<H> {
    /// Validate the handler's input and output shapes and build the template.
    ///
    /// Both shapes are checked here, once; requests never re-run the static
    /// check. On `Err` the host must not begin serving this flow.
    pub fn register() -> Result<Self, ConfigError> {
        validate_shape(std::any::type_name::<H::In>(), H::In::fields())?;
        validate_shape(std::any::type_name::<H::Out>(), H::Out::fields())?;
        Ok(Self {
            name: std::any::type_name::<H>(),
            _marker: PhantomData,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Drive one request: bind the parameter set into a fresh working copy,
    /// invoke, and interpret the outcome. Fail-fast with no retries; every
    /// path returns a well-formed envelope.
    #[must_use]
    pub fn handle(&self, params: &ParamVec) -> ResponseEnvelope {
        let mut copy = H::default();

        for field in H::In::fields() {
            let raw = match get_param(params, field.name) {
                Some(raw) if !raw.is_empty() => raw,
                _ => {
                    error!(flow = self.name, field = field.name, "input field is empty");
                    return ResponseEnvelope::error(
                        400,
                        codes::EMPTY_INPUT,
                        &format!("Missing input field: {}", field.name),
                    );
                }
            };
            let value = match parse_field(field, raw) {
                Ok(value) => value,
                Err(err) => {
                    // Field-level detail stays in the log; the caller only
                    // sees the generic message.
                    error!(
                        flow = self.name,
                        field = field.name,
                        raw,
                        error = %err,
                        "failed to parse input field"
                    );
                    return ResponseEnvelope::error(400, codes::INVALID_FIELD_TYPE, "Invalid input");
                }
            };
            if let Err(err) = copy.input_mut().set_field(field.name, value) {
                error!(
                    flow = self.name,
                    field = field.name,
                    error = %err,
                    "descriptor table and setter disagree"
                );
                return ResponseEnvelope::error(
                    502,
                    codes::BAD_BINDING,
                    "Internal server error. Bad binding.",
                );
            }
        }

        debug!(flow = self.name, "input bound, invoking handler");
        let outcome = copy.invoke();

        if outcome.status() == 0 {
            error!(flow = self.name, "invoke returned an unset status");
            return ResponseEnvelope::error(
                502,
                codes::BAD_STATUS,
                "Internal server error. Bad status.",
            );
        }

        match outcome {
            Outcome::Failure { status, error } => {
                error!(flow = self.name, status, code = error.code(), message = error.message(), "handler reported failure");
                ResponseEnvelope::error(status, error.code(), error.message())
            }
            Outcome::Success { status } => match serde_json::to_value(copy.output()) {
                Ok(body @ Value::Object(_)) => ResponseEnvelope::json(status, body),
                Ok(other) => {
                    error!(flow = self.name, body = %other, "output did not serialize to a record");
                    bad_output()
                }
                Err(err) => {
                    error!(flow = self.name, error = %err, "failed to serialize output");
                    bad_output()
                }
            },
        }
    }
}

fn bad_output() -> ResponseEnvelope {
    ResponseEnvelope::error(502, codes::BAD_OUTPUT, "Internal server error. Bad output.")
}
