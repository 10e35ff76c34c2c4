//! # flowgate
//!
//! **flowgate** is an adapter between an untyped network request and a
//! strongly-typed handler: raw string parameters go in, shape-validated
//! handlers run in isolation, and a uniform JSON response envelope comes out.
//!
//! ## Overview
//!
//! A handler declares an *input shape* and an *output shape* - plain structs
//! whose public fields are drawn from a closed catalog of five scalar kinds
//! (signed/unsigned integers, floats, booleans, text) - plus an `invoke`
//! capability. The engine:
//!
//! 1. **Validates at registration.** `#[derive(Shape)]` builds each shape's
//!    descriptor table at compile time; [`Flow::register`] refuses any table
//!    entry outside the catalog before a single request is served.
//! 2. **Binds per request.** Each declared input field is parsed from its raw
//!    text value with bounds checks against the field's declared width,
//!    fail-fast on the first bad field.
//! 3. **Invokes in isolation.** Every request runs against a fresh,
//!    zero-valued working copy of the handler; concurrent requests share
//!    nothing mutable.
//! 4. **Answers uniformly.** Success or failure, handler bug or caller
//!    mistake - every path terminates in a `(status, body)` envelope.
//!
//! ## Architecture
//!
//! - **[`schema`]** - field kind catalog, descriptor tables, shape validation
//! - **[`binding`]** - raw-text-to-typed-value field parsing
//! - **[`flow`]** - handler trait, registration, and the invocation adapter
//! - **[`response`]** - response envelopes and the transport-facing emitter
//! - **[`dispatcher`]** - coroutine-per-flow concurrent dispatch
//!
//! ## Quick start
//!
//! ```
//! use flowgate::{Flow, FlowHandler, Outcome, ParamVec, Shape};
//! use serde::Serialize;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default, Shape)]
//! struct SumIn {
//!     pub a: i64,
//!     pub b: i64,
//! }
//!
//! #[derive(Debug, Default, Shape, Serialize)]
//! struct SumOut {
//!     pub total: i64,
//! }
//!
//! #[derive(Default)]
//! struct Sum {
//!     input: SumIn,
//!     out: SumOut,
//! }
//!
//! impl FlowHandler for Sum {
//!     type In = SumIn;
//!     type Out = SumOut;
//!
//!     fn input_mut(&mut self) -> &mut SumIn {
//!         &mut self.input
//!     }
//!
//!     fn output(&self) -> &SumOut {
//!         &self.out
//!     }
//!
//!     fn invoke(&mut self) -> Outcome {
//!         self.out.total = self.input.a + self.input.b;
//!         Outcome::success(200)
//!     }
//! }
//!
//! let flow = Flow::<Sum>::register().expect("shapes use only catalog kinds");
//! let mut params = ParamVec::new();
//! params.push((Arc::from("a"), "2".to_string()));
//! params.push((Arc::from("b"), "3".to_string()));
//! let envelope = flow.handle(&params);
//! assert_eq!(envelope.status, 200);
//! assert_eq!(envelope.body["total"], 5);
//! ```
//!
//! ## Runtime considerations
//!
//! The concurrent [`dispatcher`] runs on the `may` coroutine runtime, not
//! tokio: each registered flow gets one coroutine, requests travel over MPSC
//! channels, and stack size is configurable via `FLOWGATE_STACK_SIZE`.
//! [`Flow::handle`] itself is synchronous and non-blocking; hosts that bring
//! their own concurrency can call it directly and write the envelope through
//! [`response::emit`].

// Lets the derive macro refer to `::flowgate::...` from within this crate.
extern crate self as flowgate;

pub mod binding;
pub mod dispatcher;
pub mod flow;
pub mod ids;
pub mod response;
pub mod runtime_config;
pub mod schema;

pub use binding::{parse_field, FieldError};
pub use dispatcher::{Dispatcher, FlowRequest, ParamVec};
pub use flow::{codes, Flow, FlowError, FlowHandler, Outcome};
pub use flowgate_macros::Shape;
pub use response::{emit, BufferedResponse, ResponseEnvelope, ResponseSink};
pub use schema::{ConfigError, FieldKind, FieldSchema, FieldType, FieldValue, Shape};
