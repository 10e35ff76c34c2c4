//! # Dispatcher Module
//!
//! Coroutine-based concurrent dispatch on top of the synchronous flow engine.
//!
//! ## Architecture
//!
//! Each registered flow runs in its own `may` coroutine, fed by an MPSC
//! channel of [`FlowRequest`]s. Dispatching sends the request's parameter set
//! plus a one-shot reply channel, then blocks the calling coroutine until the
//! flow's envelope comes back. The only shared data is the read-only flow
//! template inside the coroutine; every request's working copy is allocated
//! and dropped inside `Flow::handle`, so concurrent requests never observe
//! each other's field values. No locks, no queues beyond the channels, no
//! shared mutable caches.
//!
//! Coroutine stack size comes from [`RuntimeConfig`] (`FLOWGATE_STACK_SIZE`).
//! Registration is `unsafe` for the same reason the underlying
//! `may::coroutine::Builder::spawn` is; it reports configuration problems as
//! a `ConfigError` instead of panicking, and the host must refuse to serve
//! on `Err`.
//!
//! [`RuntimeConfig`]: crate::runtime_config::RuntimeConfig

mod core;

pub use core::{
    get_param, spawn_flow, Dispatcher, FlowRequest, FlowSender, ParamVec, MAX_INLINE_PARAMS,
};
