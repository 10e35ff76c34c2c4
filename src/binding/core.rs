use crate::schema::{FieldKind, FieldSchema, FieldType, FieldValue};
use thiserror::Error;

/// Failure to bind one raw parameter to one declared field.
///
/// `Empty` is distinct from `Invalid`: a missing or blank value is a
/// different caller mistake than a present-but-unparseable one, and the two
/// surface as different error codes. `Overflow` is the overflow-flavored
/// variant of an invalid value: the text parsed as a number but exceeds the
/// target field's declared width.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Missing input field: {field}")]
    Empty { field: &'static str },
    #[error("invalid value for field {field}")]
    Invalid { field: &'static str },
    #[error("{kind} overflow detected for field {field}")]
    Overflow {
        field: &'static str,
        kind: FieldKind,
    },
}

/// Parse one raw text value into a typed value for the given field.
///
/// Numeric values are parsed through the widest native representation and
/// then bounds-checked against the field's declared width, so a numeral that
/// is valid base-10 but does not fit the destination storage fails with an
/// overflow rather than being silently truncated. Booleans accept only the
/// strict literals `true` and `false`. Strings pass through unchanged.
pub fn parse_field(schema: &FieldSchema, raw: &str) -> Result<FieldValue, FieldError> {
    let field = schema.name;
    if raw.is_empty() {
        return Err(FieldError::Empty { field });
    }
    match schema.ty {
        FieldType::String => Ok(FieldValue::Str(raw.to_string())),
        FieldType::Bool => raw
            .parse::<bool>()
            .map(FieldValue::Bool)
            .map_err(|_| FieldError::Invalid { field }),
        FieldType::Int { bits } => {
            let wide: i128 = raw.parse().map_err(|_| FieldError::Invalid { field })?;
            let (min, max) = int_bounds(bits);
            if wide < min || wide > max {
                return Err(FieldError::Overflow {
                    field,
                    kind: FieldKind::Int64,
                });
            }
            Ok(FieldValue::Int(wide as i64))
        }
        FieldType::Uint { bits } => {
            let wide: u128 = raw.parse().map_err(|_| FieldError::Invalid { field })?;
            if wide > uint_max(bits) {
                return Err(FieldError::Overflow {
                    field,
                    kind: FieldKind::UInt64,
                });
            }
            Ok(FieldValue::Uint(wide as u64))
        }
        FieldType::Float { bits } => {
            let value: f64 = raw.parse().map_err(|_| FieldError::Invalid { field })?;
            if !value.is_finite() || (bits == 32 && value.abs() > f64::from(f32::MAX)) {
                return Err(FieldError::Overflow {
                    field,
                    kind: FieldKind::Float64,
                });
            }
            Ok(FieldValue::Float(value))
        }
        // Unreachable once registration has validated the shape; kept total
        // so hand-written tables cannot bypass the catalog.
        FieldType::Unsupported { .. } => Err(FieldError::Invalid { field }),
    }
}

fn int_bounds(bits: u32) -> (i128, i128) {
    let max = (1i128 << (bits - 1)) - 1;
    (-(max + 1), max)
}

fn uint_max(bits: u32) -> u128 {
    (1u128 << bits) - 1
}
