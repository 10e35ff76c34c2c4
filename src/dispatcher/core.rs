use crate::flow::{codes, Flow, FlowHandler};
use crate::ids::RequestId;
use crate::response::ResponseEnvelope;
use crate::runtime_config::RuntimeConfig;
use crate::schema::ConfigError;
use may::coroutine;
use may::sync::mpsc;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Maximum inline parameters before heap allocation. Most requests carry a
/// handful of fields.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated request parameter set: field name to raw text value.
/// Names use `Arc<str>` so repeated field names clone in O(1).
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Look up a raw parameter by field name, case-sensitive.
///
/// Last write wins when a name is supplied more than once.
#[must_use]
pub fn get_param<'a>(params: &'a ParamVec, name: &str) -> Option<&'a str> {
    params
        .iter()
        .rfind(|(key, _)| key.as_ref() == name)
        .map(|(_, value)| value.as_str())
}

/// One request travelling to a flow coroutine: the raw parameter set and a
/// reply channel for the envelope.
#[derive(Debug, Clone)]
pub struct FlowRequest {
    /// Unique request ID for log correlation.
    pub request_id: RequestId,
    pub params: ParamVec,
    pub reply_tx: mpsc::Sender<ResponseEnvelope>,
}

/// Channel sender feeding one flow coroutine.
pub type FlowSender = mpsc::Sender<FlowRequest>;

/// Spawn the coroutine serving one registered flow and return its sender.
///
/// The coroutine loops over incoming requests until its channel closes,
/// producing exactly one envelope per request. A panicking handler is caught
/// and answered with a 500 envelope instead of killing the coroutine.
///
/// # Safety
///
/// `may::coroutine::Builder::spawn` is unsafe by the runtime's contract. The
/// caller must ensure the `may` runtime is initialized and that this runs
/// during startup, before requests are dispatched.
pub unsafe fn spawn_flow<H: FlowHandler>(
    flow: Flow<H>,
    stack_size: usize,
) -> Result<FlowSender, ConfigError> {
    let (tx, rx) = mpsc::channel::<FlowRequest>();
    let name = flow.name();

    let spawn_result = unsafe {
        coroutine::Builder::new()
            .stack_size(stack_size)
            .spawn(move || {
                debug!(flow = name, stack_size, "flow coroutine start");
                for req in rx.iter() {
                    let FlowRequest {
                        request_id,
                        params,
                        reply_tx,
                    } = req;
                    debug!(request_id = %request_id, flow = name, "flow execution start");
                    let envelope = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        flow.handle(&params)
                    }))
                    .unwrap_or_else(|panic| {
                        error!(
                            request_id = %request_id,
                            flow = name,
                            panic_message = %format!("{panic:?}"),
                            "handler panicked"
                        );
                        ResponseEnvelope::error(500, codes::HANDLER_PANIC, "Handler panicked")
                    });
                    info!(
                        request_id = %request_id,
                        flow = name,
                        status = envelope.status,
                        "flow execution complete"
                    );
                    let _ = reply_tx.send(envelope);
                }
            })
    };

    match spawn_result {
        Ok(_) => Ok(tx),
        Err(source) => {
            error!(flow = name, error = %source, "failed to spawn flow coroutine");
            Err(ConfigError::SpawnFailed { flow: name, source })
        }
    }
}

/// Registry of flow coroutines, dispatching requests by flow name.
#[derive(Clone, Default)]
pub struct Dispatcher {
    flows: HashMap<String, FlowSender>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register a flow under the given name.
    ///
    /// Shape validation runs here, before the coroutine is spawned; a flow
    /// whose shapes are refused is never reachable for requests. If a flow
    /// with the same name exists it is replaced and its coroutine exits when
    /// it next reads its closed channel.
    ///
    /// # Safety
    ///
    /// Calls [`spawn_flow`]; the same `may` runtime requirements apply.
    pub unsafe fn register_flow<H: FlowHandler>(&mut self, name: &str) -> Result<(), ConfigError> {
        let flow = Flow::<H>::register()?;
        let stack_size = RuntimeConfig::from_env().stack_size;
        let tx = unsafe { spawn_flow(flow, stack_size)? };
        self.register_sender(name, tx);
        info!(
            flow = name,
            total_flows = self.flows.len(),
            "flow registered"
        );
        Ok(())
    }

    /// Register an already-spawned flow sender under the given name.
    ///
    /// The lower-level pairing for [`spawn_flow`], for hosts that manage
    /// their own coroutines. `register_flow` is the validated path and runs
    /// shape validation first; this one trusts the caller.
    pub fn register_sender(&mut self, name: &str, tx: FlowSender) {
        if let Some(old_sender) = self.flows.remove(name) {
            drop(old_sender);
            warn!(flow = name, "replaced existing flow - old coroutine will exit");
        }
        self.flows.insert(name.to_string(), tx);
    }

    #[must_use]
    pub fn has_flow(&self, name: &str) -> bool {
        self.flows.contains_key(name)
    }

    /// Dispatch one request to the named flow and wait for its envelope.
    ///
    /// Returns `None` when no flow is registered under the name. A closed
    /// reply channel (the coroutine is gone) maps to a 503 envelope rather
    /// than a drop, so the caller always has something to write.
    #[must_use]
    pub fn dispatch(&self, name: &str, params: ParamVec) -> Option<ResponseEnvelope> {
        let request_id = RequestId::new();
        let tx = match self.flows.get(name) {
            Some(tx) => tx,
            None => {
                error!(flow = name, available_flows = self.flows.len(), "flow not found");
                return None;
            }
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        debug!(request_id = %request_id, flow = name, "request dispatched to flow");
        if let Err(err) = tx.send(FlowRequest {
            request_id,
            params,
            reply_tx,
        }) {
            error!(request_id = %request_id, flow = name, error = %err, "failed to send request to flow");
            return Some(ResponseEnvelope::error(
                503,
                codes::FLOW_UNAVAILABLE,
                "Flow is not accepting requests",
            ));
        }

        match reply_rx.recv() {
            Ok(envelope) => {
                info!(
                    request_id = %request_id,
                    flow = name,
                    status = envelope.status,
                    "flow response received"
                );
                Some(envelope)
            }
            Err(err) => {
                error!(
                    request_id = %request_id,
                    flow = name,
                    error = %err,
                    "flow channel closed - flow may have crashed"
                );
                Some(ResponseEnvelope::error(
                    503,
                    codes::FLOW_UNAVAILABLE,
                    "Flow is not responding",
                ))
            }
        }
    }
}
