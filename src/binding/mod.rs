//! # Binding Module
//!
//! Converts one raw text parameter into one typed [`FieldValue`] for a
//! declared field, applying overflow and range checks against the field's
//! declared storage width. Parsing is pure: it never touches shared state,
//! and a failed parse carries enough detail for diagnostics without leaking
//! field internals to the caller.
//!
//! [`FieldValue`]: crate::schema::FieldValue

mod core;

pub use core::{parse_field, FieldError};
