use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The closed catalog of scalar kinds a shape field may have.
///
/// Kinds are canonically 64-bit; a field may declare narrower storage (see
/// [`FieldType`]), but it still belongs to one of these five kinds on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int64,
    UInt64,
    Float64,
    Bool,
    String,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Int64 => "int64",
            FieldKind::UInt64 => "uint64",
            FieldKind::Float64 => "float64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
        };
        f.write_str(name)
    }
}

/// The declared type of one shape field.
///
/// Numeric variants carry the storage width in bits (e.g. an `i32` field is
/// `Int { bits: 32 }`); the parser bounds-checks raw values against that
/// width, not just against the canonical 64-bit kind. `Unsupported` records a
/// field the catalog cannot express - the derive never rejects, registration
/// does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int { bits: u32 },
    Uint { bits: u32 },
    Float { bits: u32 },
    Bool,
    String,
    Unsupported { type_name: &'static str },
}

impl FieldType {
    /// The catalog kind this type belongs to, or `None` for `Unsupported`.
    #[must_use]
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldType::Int { .. } => Some(FieldKind::Int64),
            FieldType::Uint { .. } => Some(FieldKind::UInt64),
            FieldType::Float { .. } => Some(FieldKind::Float64),
            FieldType::Bool => Some(FieldKind::Bool),
            FieldType::String => Some(FieldKind::String),
            FieldType::Unsupported { .. } => None,
        }
    }
}

/// One entry of a shape's descriptor table: a field name and its declared
/// type, in declaration order.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    pub name: &'static str,
    pub ty: FieldType,
}

/// A parsed, typed field value. Numeric variants hold the canonical 64-bit
/// representation; narrowing to the declared width happens in the generated
/// setter after the parser has bounds-checked the value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Int(_) => FieldKind::Int64,
            FieldValue::Uint(_) => FieldKind::UInt64,
            FieldValue::Float(_) => FieldKind::Float64,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Str(_) => FieldKind::String,
        }
    }

    /// JSON rendering of the value, used by serialization round-trips.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Int(v) => Value::from(*v),
            FieldValue::Uint(v) => Value::from(*v),
            FieldValue::Float(v) => Value::from(*v),
            FieldValue::Bool(v) => Value::from(*v),
            FieldValue::Str(v) => Value::from(v.clone()),
        }
    }
}

/// A record whose accessible fields form a wire contract.
///
/// Implemented via `#[derive(Shape)]`: the derive emits the descriptor table
/// once at compile time and a total `set_field` mutator over the table's
/// names. Hand-written implementations must keep `fields()` and `set_field`
/// in agreement; a disagreement surfaces as a [`BindError`] at bind time and
/// is treated as a handler bug by the adapter.
pub trait Shape {
    /// The built-once descriptor table, in field declaration order.
    fn fields() -> &'static [FieldSchema]
    where
        Self: Sized;

    /// Store a parsed value into the named field.
    fn set_field(&mut self, name: &str, value: FieldValue) -> Result<(), BindError>;
}

/// Failure to store a parsed value into a shape field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("field {field} expects {expected}, got {got}")]
    KindMismatch {
        field: &'static str,
        expected: FieldKind,
        got: FieldKind,
    },
    #[error("field {field} has unsupported type {type_name}")]
    Unsupported {
        field: &'static str,
        type_name: &'static str,
    },
    #[error("unknown field {field}")]
    UnknownField { field: String },
}

/// Malformed flow configuration. Fatal at registration: the host must refuse
/// to serve a flow whose registration returned one of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[{shape}] unsupported field type. {field} => {type_name}")]
    UnsupportedField {
        shape: &'static str,
        field: &'static str,
        type_name: &'static str,
    },
    #[error("[{shape}] invalid field width. {field} => {kind} width {bits}")]
    InvalidWidth {
        shape: &'static str,
        field: &'static str,
        kind: FieldKind,
        bits: u32,
    },
    #[error("[{flow}] failed to spawn flow coroutine")]
    SpawnFailed {
        flow: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Check that every entry of a descriptor table is a catalog kind with a
/// catalog width.
///
/// Runs once per shape at registration time. The first `Unsupported` entry is
/// reported with the owning shape, the field name, and the field's Rust type.
/// Widths outside the catalog (ints not 8/16/32/64, floats not 32/64) are
/// refused here too; the parser's bounds arithmetic assumes catalog widths,
/// so a hand-written table must not reach it with anything else.
pub fn validate_shape(shape: &'static str, fields: &[FieldSchema]) -> Result<(), ConfigError> {
    for field in fields {
        match field.ty {
            FieldType::Unsupported { type_name } => {
                return Err(ConfigError::UnsupportedField {
                    shape,
                    field: field.name,
                    type_name,
                });
            }
            FieldType::Int { bits } if !matches!(bits, 8 | 16 | 32 | 64) => {
                return Err(ConfigError::InvalidWidth {
                    shape,
                    field: field.name,
                    kind: FieldKind::Int64,
                    bits,
                });
            }
            FieldType::Uint { bits } if !matches!(bits, 8 | 16 | 32 | 64) => {
                return Err(ConfigError::InvalidWidth {
                    shape,
                    field: field.name,
                    kind: FieldKind::UInt64,
                    bits,
                });
            }
            FieldType::Float { bits } if !matches!(bits, 32 | 64) => {
                return Err(ConfigError::InvalidWidth {
                    shape,
                    field: field.name,
                    kind: FieldKind::Float64,
                    bits,
                });
            }
            _ => {}
        }
    }
    Ok(())
}
