//! # Flow Module
//!
//! The invocation engine. A *flow* is the registered unit combining an input
//! shape, an output shape, and an invoke capability:
//!
//! - [`FlowHandler`] - the trait a handler implements; its `Default` impl is
//!   the per-request factory for a fresh, exclusively-owned working copy
//! - [`Outcome`] - the two-variant invocation result (success with a status,
//!   or failure with a status and a [`FlowError`])
//! - [`Flow`] - the immutable registered template; [`Flow::register`]
//!   validates both shapes once and fails fast, [`Flow::handle`] drives one
//!   request through bind → invoke → envelope
//!
//! ## Request pipeline
//!
//! Per request, strictly ordered and fail-fast: allocate a zero-valued
//! working copy, parse each declared input field from the raw parameter set
//! (absent/blank → `EMPTY_INPUT`, unparseable or overflowing →
//! `INVALID_FIELD_TYPE`, both 400), invoke, then branch exhaustively on the
//! outcome. A zero status or an output that will not serialize is a handler
//! contract violation and maps to a 502-class envelope (`BAD_STATUS` /
//! `BAD_OUTPUT`). A handler-reported failure passes its status and error
//! through verbatim. There are no retries; every path ends in an envelope.

mod core;

pub use core::{codes, Flow, FlowError, FlowHandler, Outcome};
