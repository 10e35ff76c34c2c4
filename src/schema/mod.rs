//! # Schema Module
//!
//! The schema module defines the field kind catalog and the descriptor tables
//! that describe a handler's wire contract.
//!
//! ## Overview
//!
//! A handler's input and output records are *shapes*: structs whose public
//! fields are all drawn from a closed catalog of scalar kinds (signed integer,
//! unsigned integer, floating point, boolean, text). Instead of inspecting a
//! struct's layout per request, each shape carries a descriptor table built
//! once at compile time by `#[derive(Shape)]`:
//!
//! - [`FieldSchema`] - one `(name, type)` entry per accessible field
//! - [`FieldType`] - a catalog scalar with its declared storage width, or an
//!   `Unsupported` marker for anything outside the catalog
//! - [`FieldValue`] - a parsed, typed value ready to be stored into a field
//!
//! ## Validation
//!
//! [`validate_shape`] walks a descriptor table and refuses the first
//! non-catalog entry. It runs once, when a flow is registered; a shape that
//! fails validation never serves a request.

mod core;

pub use core::{
    validate_shape, BindError, ConfigError, FieldKind, FieldSchema, FieldType, FieldValue, Shape,
};
