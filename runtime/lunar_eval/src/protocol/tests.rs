use super::*;
use crate::context::Cancellation;
use crate::errors::ErrorKind;
use lunar_ir::{BinaryOp, UnaryOp};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn setup() -> (Engine, CallContext) {
    let engine = Engine::builder().standard_libraries(false).build();
    (engine, CallContext::new(Cancellation::new(), 32))
}

fn with_metatable(fields: &[(&str, Value)]) -> Table {
    let mt = Table::new();
    for (name, value) in fields {
        mt.set_field(name, value.clone());
    }
    let t = Table::new();
    t.set_metatable(Some(mt)).unwrap();
    t
}

fn native(name: &str, f: impl Fn(Values) -> EvalResult<Values> + Send + Sync + 'static) -> Value {
    Value::from(crate::value::Function::native(name, f))
}

mod indexing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_present_key_skips_index() {
        let (engine, cx) = setup();
        let t = with_metatable(&[("__index", native("idx", |_| panic!("not consulted")))]);
        t.set_field("a", 1.0);
        let v = index(&engine, Value::from(t), Value::from("a"), &cx).await.unwrap();
        assert_eq!(v, Value::from(1.0));
    }

    #[tokio::test]
    async fn test_index_function_receives_table_and_key() {
        let (engine, cx) = setup();
        let t = with_metatable(&[(
            "__index",
            native("idx", |args| Ok(smallvec![args[1].clone()])),
        )]);
        let v = index(&engine, Value::from(t), Value::from("key"), &cx).await.unwrap();
        assert_eq!(v, Value::from("key"));
    }

    #[tokio::test]
    async fn test_index_chain_through_tables() {
        let (engine, cx) = setup();
        let base = Table::new();
        base.set_field("greeting", "hi");
        let middle = with_metatable(&[("__index", Value::from(base))]);
        let top = with_metatable(&[("__index", Value::from(middle))]);
        let v = index(&engine, Value::from(top), Value::from("greeting"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from("hi"));
    }

    #[tokio::test]
    async fn test_missing_key_is_nil() {
        let (engine, cx) = setup();
        let v = index(&engine, Value::from(Table::new()), Value::from("x"), &cx)
            .await
            .unwrap();
        assert!(v.is_nil());
    }

    #[tokio::test]
    async fn test_scope_falls_back_to_parent() {
        let (engine, cx) = setup();
        let outer = Table::scope(None);
        outer.set_field("x", 1.0);
        let inner = Table::scope(Some(outer));
        let v = index(&engine, Value::from(inner.clone()), Value::from("x"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(1.0));

        // a local bound to nil shadows the outer binding
        inner.declare(Value::from("x"), Value::Nil).unwrap();
        let v = index(&engine, Value::from(inner), Value::from("x"), &cx)
            .await
            .unwrap();
        assert!(v.is_nil());
    }

    #[tokio::test]
    async fn test_metatable_before_parent() {
        let (engine, cx) = setup();
        let outer = Table::scope(None);
        outer.set_field("x", "parent");
        let inner = Table::scope(Some(outer));
        let fallback = Table::new();
        fallback.set_field("x", "metatable");
        let mt = Table::new();
        mt.set_field("__index", fallback);
        inner.set_metatable(Some(mt)).unwrap();
        let v = index(&engine, Value::from(inner), Value::from("x"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from("metatable"));
    }

    #[tokio::test]
    async fn test_non_table_is_not_indexable() {
        let (engine, cx) = setup();
        let err = index(&engine, Value::from(1.0), Value::from("x"), &cx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotIndexable);
        assert_eq!(err.message, "attempt to index a number value");
    }

    #[tokio::test]
    async fn test_strings_use_string_metatable() {
        let (engine, cx) = setup();
        let lib = Table::new();
        lib.set_field("len", 3.0);
        engine.string_metatable().set_field("__index", lib);
        let v = index(&engine, Value::from("abc"), Value::from("len"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(3.0));
    }
}

mod assignment {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_newindex_function_intercepts_new_keys() {
        let (engine, cx) = setup();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let t = with_metatable(&[(
            "__newindex",
            native("ni", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Values::new())
            }),
        )]);
        t.set_field("present", 1.0);

        new_index(&engine, Value::from(t.clone()), Value::from("present"), Value::from(2.0), &cx)
            .await
            .unwrap();
        new_index(&engine, Value::from(t.clone()), Value::from("fresh"), Value::from(3.0), &cx)
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(t.raw_get(&Value::from("present")), Value::from(2.0));
        assert!(t.raw_get(&Value::from("fresh")).is_nil());
    }

    #[tokio::test]
    async fn test_newindex_table_receives_write() {
        let (engine, cx) = setup();
        let sink = Table::new();
        let t = with_metatable(&[("__newindex", Value::from(sink.clone()))]);
        new_index(&engine, Value::from(t.clone()), Value::from("k"), Value::from("v"), &cx)
            .await
            .unwrap();
        assert_eq!(sink.raw_get(&Value::from("k")), Value::from("v"));
        assert!(t.raw_get(&Value::from("k")).is_nil());
    }

    #[tokio::test]
    async fn test_scope_assignment_updates_binding_scope() {
        let (engine, cx) = setup();
        let outer = Table::scope(None);
        outer.declare(Value::from("x"), Value::from(1.0)).unwrap();
        let inner = Table::scope(Some(outer.clone()));
        new_index(&engine, Value::from(inner.clone()), Value::from("x"), Value::from(2.0), &cx)
            .await
            .unwrap();
        assert_eq!(outer.raw_get(&Value::from("x")), Value::from(2.0));
        assert!(!inner.binds(&Value::from("x")));

        // unbound names land in the outermost scope
        new_index(&engine, Value::from(inner), Value::from("y"), Value::from(3.0), &cx)
            .await
            .unwrap();
        assert_eq!(outer.raw_get(&Value::from("y")), Value::from(3.0));
    }

    #[tokio::test]
    async fn test_assigning_into_non_table() {
        let (engine, cx) = setup();
        let err = new_index(&engine, Value::from(true), Value::from("k"), Value::Nil, &cx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAssignable);
    }
}

mod calls {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_call_metamethod_prepends_self() {
        let (engine, cx) = setup();
        let t = with_metatable(&[(
            "__call",
            native("call", |args| Ok(smallvec![Value::from(args.len())])),
        )]);
        assert!(is_callable(&t));
        let out = call(&engine, &Value::from(t), smallvec![Value::from(1.0)], &cx)
            .await
            .unwrap();
        assert_eq!(first(&out), Value::from(2.0));
    }

    #[tokio::test]
    async fn test_non_callable() {
        let (engine, cx) = setup();
        let err = call(&engine, &Value::from("f"), Values::new(), &cx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotCallable);
        assert!(!is_callable(&Table::new()));
    }

    #[tokio::test]
    async fn test_tostring_metamethod() {
        let (engine, cx) = setup();
        let t = with_metatable(&[(
            "__tostring",
            native("ts", |_| Ok(smallvec![Value::from("custom")])),
        )]);
        let s = tostring(&engine, &Value::from(t), &cx).await.unwrap();
        assert_eq!(s, Value::from("custom"));
        let n = tostring(&engine, &Value::from(1.5), &cx).await.unwrap();
        assert_eq!(n, Value::from("1.5"));
    }
}

mod operators {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_add_metamethod() {
        let (engine, cx) = setup();
        let t = with_metatable(&[(
            "__add",
            native("add", |_| Ok(smallvec![Value::from(100.0)])),
        )]);
        let v = binary(&engine, BinaryOp::Add, Value::from(t.clone()), Value::from(1.0), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(100.0));
        // right operand's metatable is consulted too
        let v = binary(&engine, BinaryOp::Add, Value::from(1.0), Value::from(t), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(100.0));
    }

    #[tokio::test]
    async fn test_arithmetic_coerces_numeric_strings() {
        let (engine, cx) = setup();
        let v = binary(&engine, BinaryOp::Mul, Value::from("3"), Value::from(2.0), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(6.0));
        let err = binary(&engine, BinaryOp::Sub, Value::from("x"), Value::from(2.0), &cx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArithmeticOnNonNumber);
    }

    #[tokio::test]
    async fn test_modulo_truncates() {
        let (engine, cx) = setup();
        let v = binary(&engine, BinaryOp::Mod, Value::from(-7.0), Value::from(3.0), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(-1.0));
    }

    #[tokio::test]
    async fn test_concat_formats_numbers() {
        let (engine, cx) = setup();
        let v = binary(&engine, BinaryOp::Concat, Value::from(1.0), Value::from("x"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from("1x"));
    }

    #[tokio::test]
    async fn test_concat_stringifies_nil_and_tables() {
        let (engine, cx) = setup();
        let v = binary(&engine, BinaryOp::Concat, Value::Nil, Value::from("!"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from("nil!"));

        let table = Value::Table(engine.new_table());
        let v = binary(&engine, BinaryOp::Concat, Value::from("t="), table, &cx)
            .await
            .unwrap();
        assert!(v.as_string().starts_with("t=table: 0x"), "{v}");
    }

    #[tokio::test]
    async fn test_eq_metamethod_and_negation() {
        let (engine, cx) = setup();
        let always = native("eq", |_| Ok(smallvec![Value::from(true)]));
        let a = with_metatable(&[("__eq", always.clone())]);
        let b = with_metatable(&[("__eq", always)]);
        let eq = binary(&engine, BinaryOp::Eq, Value::from(a.clone()), Value::from(b.clone()), &cx)
            .await
            .unwrap();
        assert_eq!(eq, Value::from(true));
        let ne = binary(&engine, BinaryOp::NotEq, Value::from(a), Value::from(b), &cx)
            .await
            .unwrap();
        assert_eq!(ne, Value::from(false));
    }

    #[tokio::test]
    async fn test_raw_equal_skips_eq_metamethod() {
        let (engine, cx) = setup();
        let never = native("eq", |_| Ok(smallvec![Value::from(false)]));
        let a = Value::from(with_metatable(&[("__eq", never)]));
        assert!(equals(&engine, &a, &a.clone(), &cx).await.unwrap());
    }

    #[tokio::test]
    async fn test_greater_swaps_operands_for_lt() {
        let (engine, cx) = setup();
        let lt = native("lt", |args| {
            let a = args[0].as_table().unwrap().raw_get(&Value::from("n"));
            let b = args[1].as_table().unwrap().raw_get(&Value::from("n"));
            Ok(smallvec![Value::from(a.as_number() < b.as_number())])
        });
        let small = with_metatable(&[("__lt", lt.clone())]);
        small.set_field("n", 1.0);
        let big = with_metatable(&[("__lt", lt)]);
        big.set_field("n", 2.0);
        let v = binary(&engine, BinaryOp::Gt, Value::from(big), Value::from(small), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(true));
    }

    #[tokio::test]
    async fn test_ordering() {
        let (engine, cx) = setup();
        let v = binary(&engine, BinaryOp::Lt, Value::from("a"), Value::from("b"), &cx)
            .await
            .unwrap();
        assert_eq!(v, Value::from(true));
        let err = binary(&engine, BinaryOp::Lt, Value::from(1.0), Value::from("2"), &cx)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert_eq!(err.message, "attempt to compare number with string");
    }

    #[tokio::test]
    async fn test_nan_orders_false() {
        let (engine, cx) = setup();
        for op in [BinaryOp::Lt, BinaryOp::LtEq, BinaryOp::Gt, BinaryOp::GtEq] {
            let v = binary(&engine, op, Value::from(f64::NAN), Value::from(1.0), &cx)
                .await
                .unwrap();
            assert_eq!(v, Value::from(false));
        }
    }

    #[tokio::test]
    async fn test_length() {
        let (engine, cx) = setup();
        let v = length(&engine, &Value::from("héllo"), &cx).await.unwrap();
        assert_eq!(v, Value::from(5.0));
        let t = Table::from_values([Value::from(1.0), Value::from(2.0)]);
        assert_eq!(length(&engine, &Value::from(t), &cx).await.unwrap(), Value::from(2.0));
        let custom = with_metatable(&[("__len", native("len", |_| Ok(smallvec![Value::from(9.0)])))]);
        assert_eq!(
            length(&engine, &Value::from(custom), &cx).await.unwrap(),
            Value::from(9.0)
        );
        let err = length(&engine, &Value::from(true), &cx).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[tokio::test]
    async fn test_unary() {
        let (engine, cx) = setup();
        let v = unary(&engine, UnaryOp::Neg, Value::from("4"), &cx).await.unwrap();
        assert_eq!(v, Value::from(-4.0));
        let v = unary(&engine, UnaryOp::Not, Value::Nil, &cx).await.unwrap();
        assert_eq!(v, Value::from(true));
        let negated = with_metatable(&[("__unm", native("unm", |_| Ok(smallvec![Value::from("neg")])))]);
        let v = unary(&engine, UnaryOp::Neg, Value::from(negated), &cx).await.unwrap();
        assert_eq!(v, Value::from("neg"));
    }

    #[test]
    fn test_compare_less() {
        assert_eq!(
            compare_less(&Value::from(1.0), &Value::from(2.0)).unwrap(),
            Some(std::cmp::Ordering::Less)
        );
        assert!(compare_less(&Value::Nil, &Value::Nil).is_err());
    }
}
