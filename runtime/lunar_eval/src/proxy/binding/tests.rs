use super::*;
use crate::errors::ErrorKind;
use crate::proxy::{ClassBuilder, ProxyClass};
use pretty_assertions::assert_eq;
use smallvec::smallvec;

#[derive(Debug)]
struct Counter;

impl ProxyClass for Counter {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
    }
}

#[derive(Debug)]
struct Other;

impl ProxyClass for Other {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
    }
}

fn engine() -> Engine {
    Engine::builder().standard_libraries(false).build()
}

fn context() -> CallContext {
    CallContext::new(Cancellation::new(), 16)
}

fn bind_static(signature: &Signature, args: Values) -> EvalResult<HostCall> {
    let name: Arc<str> = Arc::from("f");
    bind::<Counter>(&name, signature, false, args, &engine(), &context()).map(|(_, call)| call)
}

#[test]
fn test_short_type_name() {
    assert_eq!(short_type_name::<Counter>(), "Counter");
    assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
}

#[test]
fn test_script_arity_skips_injected() {
    let sig = Signature::new()
        .string()
        .cancellation()
        .optional_number(1.0)
        .arguments()
        .engine();
    assert_eq!(sig.script_arity(), 2);
    assert_eq!(sig.kinds().filter(|k| k.is_injected()).count(), 3);
}

#[test]
fn test_coercions() {
    let sig = Signature::new().number().string().integer();
    let call = bind_static(
        &sig,
        smallvec![Value::from("12"), Value::from(3.0), Value::from(2.9)],
    )
    .unwrap();
    assert_eq!(call.number(0), 12.0);
    assert_eq!(&*call.string(1), "3");
    assert_eq!(call.integer(2), 2);
}

#[test]
fn test_defaults_fill_missing_and_nil() {
    let sig = Signature::new().optional_number(7.0).optional_string("x");
    let call = bind_static(&sig, smallvec![Value::Nil]).unwrap();
    assert_eq!(call.number(0), 7.0);
    assert_eq!(&*call.string(1), "x");
}

#[test]
fn test_missing_required_argument() {
    let sig = Signature::new().number().number();
    let err = bind_static(&sig, smallvec![Value::from(1.0)]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ArgumentCountMismatch);
    assert_eq!(err.message, "expected 2 arguments, got 1 instead");
}

#[test]
fn test_extra_arguments_are_ignored() {
    let sig = Signature::new().number();
    let call = bind_static(&sig, smallvec![Value::from(1.0), Value::from(2.0)]).unwrap();
    assert_eq!(call.bound().len(), 1);
}

#[test]
fn test_type_mismatch_names_position() {
    let sig = Signature::new().number().table();
    let err = bind_static(&sig, smallvec![Value::from(1.0), Value::from("t")]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadArgumentType);
    assert_eq!(err.message, "bad argument #2 to 'f' (table expected, got string)");
}

#[test]
fn test_injected_parameters_do_not_consume() {
    let sig = Signature::new().cancellation().string().arguments();
    let call = bind_static(&sig, smallvec![Value::from("a"), Value::from("b")]).unwrap();
    assert!(matches!(call.bound()[0], Bound::Cancellation(_)));
    assert_eq!(&*call.string(1), "a");
    assert_eq!(
        call.arguments(2).to_vec(),
        vec![Value::from("a"), Value::from("b")]
    );
}

#[test]
fn test_callable_table_becomes_function() {
    let callable = Table::new();
    let mt = Table::new();
    mt.set_field("__call", Function::native("call", |_| Ok(Values::new())));
    callable.set_metatable(Some(mt)).unwrap();

    let sig = Signature::new().function();
    let call = bind_static(&sig, smallvec![Value::from(callable)]).unwrap();
    assert!(call.function(0).is_some());

    let err = bind_static(&sig, smallvec![Value::from(Table::new())]).unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadArgumentType);
}

#[test]
fn test_receiver_must_match() {
    let engine = engine();
    let name: Arc<str> = Arc::from("bump");
    let sig = Signature::new();

    let counter = engine.proxy(Arc::new(Counter));
    let (receiver, _) = bind::<Counter>(
        &name,
        &sig,
        true,
        smallvec![Value::from(counter)],
        &engine,
        &context(),
    )
    .unwrap();
    assert!(receiver.is_some());

    let other = engine.proxy(Arc::new(Other));
    let err = bind::<Counter>(
        &name,
        &sig,
        true,
        smallvec![Value::from(other)],
        &engine,
        &context(),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BadSelfArgument);

    let err = bind::<Counter>(&name, &sig, true, Values::new(), &engine, &context()).unwrap_err();
    assert!(err.message.contains("got no value"));
}

#[test]
fn test_host_parameter() {
    let engine = engine();
    let sig = Signature::new().host::<Counter>();
    let counter = Value::from(engine.proxy(Arc::new(Counter)));
    let call = bind_static(&sig, smallvec![counter]).unwrap();
    assert!(call.host::<Counter>(0).is_some());

    let other = Value::from(engine.proxy(Arc::new(Other)));
    let err = bind_static(&sig, smallvec![other]).unwrap_err();
    assert_eq!(err.message, "bad argument #1 to 'f' (Counter expected, got table)");
}
