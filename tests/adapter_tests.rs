//! Tests for the invocation adapter pipeline: binding order, the 400-class
//! caller errors, the 502-class handler contract violations, handler error
//! passthrough, and the success path.

use flowgate::schema::{BindError, FieldSchema, FieldType, FieldValue, Shape as ShapeTrait};
use flowgate::{
    emit, BufferedResponse, Flow, FlowError, FlowHandler, Outcome, ParamVec, Shape,
};
use serde::Serialize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn params(pairs: &[(&str, &str)]) -> ParamVec {
    pairs
        .iter()
        .map(|(k, v)| (Arc::from(*k), v.to_string()))
        .collect()
}

#[derive(Debug, Default, Shape)]
struct EchoIn {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Default, Shape, Serialize)]
struct EchoOut {
    pub id: i64,
    pub name: String,
    pub active: bool,
}

#[derive(Default)]
struct EchoFlow {
    input: EchoIn,
    out: EchoOut,
}

impl FlowHandler for EchoFlow {
    type In = EchoIn;
    type Out = EchoOut;

    fn input_mut(&mut self) -> &mut EchoIn {
        &mut self.input
    }

    fn output(&self) -> &EchoOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        self.out.id = self.input.id;
        self.out.name = self.input.name.clone();
        self.out.active = self.input.active;
        Outcome::success(200)
    }
}

fn echo() -> Flow<EchoFlow> {
    Flow::<EchoFlow>::register().unwrap()
}

// Only the no-invocation tests drive this flow, so its counter must stay at
// zero for the whole test run.
static COUNTED_INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct CountingFlow {
    input: EchoIn,
    out: EchoOut,
}

impl FlowHandler for CountingFlow {
    type In = EchoIn;
    type Out = EchoOut;

    fn input_mut(&mut self) -> &mut EchoIn {
        &mut self.input
    }

    fn output(&self) -> &EchoOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        COUNTED_INVOCATIONS.fetch_add(1, Ordering::SeqCst);
        Outcome::success(200)
    }
}

fn counted() -> Flow<CountingFlow> {
    Flow::<CountingFlow>::register().unwrap()
}

#[test]
fn test_success_path_serializes_output_with_handler_status() {
    let envelope = echo().handle(&params(&[
        ("id", "42"),
        ("name", "fluffy"),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 200);
    assert_eq!(
        envelope.body,
        json!({ "id": 42, "name": "fluffy", "active": true })
    );
}

#[test]
fn test_missing_field_yields_empty_input_naming_it_and_no_invocation() {
    let envelope = counted().handle(&params(&[("id", "42"), ("active", "true")]));
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.body["code"], "EMPTY_INPUT");
    assert_eq!(envelope.body["message"], "Missing input field: name");
    assert_eq!(COUNTED_INVOCATIONS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_blank_field_is_empty_input() {
    let envelope = echo().handle(&params(&[
        ("id", "42"),
        ("name", ""),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.body["code"], "EMPTY_INPUT");
}

#[test]
fn test_unparseable_field_yields_generic_invalid_input() {
    let envelope = counted().handle(&params(&[
        ("id", "forty-two"),
        ("name", "fluffy"),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.body["code"], "INVALID_FIELD_TYPE");
    // Field-level detail is diagnostics-only; the caller gets the generic
    // message.
    assert_eq!(envelope.body["message"], "Invalid input");
    assert_eq!(COUNTED_INVOCATIONS.load(Ordering::SeqCst), 0);
}

#[test]
fn test_overflowing_numeral_yields_invalid_field_type() {
    let envelope = echo().handle(&params(&[
        ("id", "99999999999999999999"),
        ("name", "fluffy"),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 400);
    assert_eq!(envelope.body["code"], "INVALID_FIELD_TYPE");
}

#[test]
fn test_binding_is_fail_fast_in_declaration_order() {
    // Both id and active are bad; the first declared field is reported.
    let envelope = echo().handle(&params(&[("name", "fluffy")]));
    assert_eq!(envelope.body["message"], "Missing input field: id");
}

#[derive(Default)]
struct RejectingFlow {
    input: EchoIn,
    out: EchoOut,
}

impl FlowHandler for RejectingFlow {
    type In = EchoIn;
    type Out = EchoOut;

    fn input_mut(&mut self) -> &mut EchoIn {
        &mut self.input
    }

    fn output(&self) -> &EchoOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        // Populate the output anyway; a reported error must still win.
        self.out.id = self.input.id;
        self.out.name = "should never be seen".to_string();
        Outcome::failure(409, FlowError::new("CONFLICT", "id already taken"))
    }
}

#[test]
fn test_handler_error_passes_through_and_output_is_discarded() {
    let flow = Flow::<RejectingFlow>::register().unwrap();
    let envelope = flow.handle(&params(&[
        ("id", "42"),
        ("name", "fluffy"),
        ("active", "false"),
    ]));
    assert_eq!(envelope.status, 409);
    assert_eq!(
        envelope.body,
        json!({ "code": "CONFLICT", "message": "id already taken" })
    );
}

#[derive(Default)]
struct UnsetStatusFlow {
    input: EchoIn,
    out: EchoOut,
}

impl FlowHandler for UnsetStatusFlow {
    type In = EchoIn;
    type Out = EchoOut;

    fn input_mut(&mut self) -> &mut EchoIn {
        &mut self.input
    }

    fn output(&self) -> &EchoOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        // Forgot to set a status; the zero value must not leak to the caller.
        Outcome::success(0)
    }
}

#[test]
fn test_unset_status_yields_bad_status() {
    let flow = Flow::<UnsetStatusFlow>::register().unwrap();
    let envelope = flow.handle(&params(&[
        ("id", "1"),
        ("name", "x"),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body["code"], "BAD_STATUS");
}

// Hand-written shape whose serialized form is not a record.
#[derive(Debug, Default, Serialize)]
struct ScalarOut(i64);

impl ShapeTrait for ScalarOut {
    fn fields() -> &'static [FieldSchema] {
        &[]
    }

    fn set_field(&mut self, name: &str, _value: FieldValue) -> Result<(), BindError> {
        Err(BindError::UnknownField {
            field: name.to_string(),
        })
    }
}

#[derive(Default)]
struct ScalarOutFlow {
    input: EchoIn,
    out: ScalarOut,
}

impl FlowHandler for ScalarOutFlow {
    type In = EchoIn;
    type Out = ScalarOut;

    fn input_mut(&mut self) -> &mut EchoIn {
        &mut self.input
    }

    fn output(&self) -> &ScalarOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        self.out.0 = 7;
        Outcome::success(200)
    }
}

#[test]
fn test_non_record_output_yields_bad_output() {
    let flow = Flow::<ScalarOutFlow>::register().unwrap();
    let envelope = flow.handle(&params(&[
        ("id", "1"),
        ("name", "x"),
        ("active", "true"),
    ]));
    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body["code"], "BAD_OUTPUT");
}

// Hand-written input shape whose table and setter disagree: the table
// declares `n`, the setter does not know it.
#[derive(Debug, Default)]
struct MismatchedIn;

impl ShapeTrait for MismatchedIn {
    fn fields() -> &'static [FieldSchema] {
        &[FieldSchema {
            name: "n",
            ty: FieldType::Int { bits: 64 },
        }]
    }

    fn set_field(&mut self, name: &str, _value: FieldValue) -> Result<(), BindError> {
        Err(BindError::UnknownField {
            field: name.to_string(),
        })
    }
}

#[derive(Default)]
struct MismatchFlow {
    input: MismatchedIn,
    out: EchoOut,
}

impl FlowHandler for MismatchFlow {
    type In = MismatchedIn;
    type Out = EchoOut;

    fn input_mut(&mut self) -> &mut MismatchedIn {
        &mut self.input
    }

    fn output(&self) -> &EchoOut {
        &self.out
    }

    fn invoke(&mut self) -> Outcome {
        Outcome::success(200)
    }
}

#[test]
fn test_table_setter_disagreement_yields_bad_binding() {
    // The table is catalog-valid, so registration cannot catch the bug; the
    // adapter reports it as a 502 instead of invoking.
    let flow = Flow::<MismatchFlow>::register().unwrap();
    let envelope = flow.handle(&params(&[("n", "1")]));
    assert_eq!(envelope.status, 502);
    assert_eq!(envelope.body["code"], "BAD_BINDING");
    assert_eq!(envelope.body["message"], "Internal server error. Bad binding.");
}

#[test]
fn test_envelope_emits_through_a_sink() {
    let envelope = echo().handle(&params(&[
        ("id", "5"),
        ("name", "pip"),
        ("active", "false"),
    ]));
    let mut sink = BufferedResponse::new();
    emit(&mut sink, &envelope).unwrap();
    assert_eq!(sink.status, 200);
    assert_eq!(sink.reason, "OK");
    assert_eq!(
        sink.headers,
        vec![("Content-Type".to_string(), "application/json".to_string())]
    );
    let body: serde_json::Value = serde_json::from_slice(&sink.body).unwrap();
    assert_eq!(body["name"], "pip");
}
