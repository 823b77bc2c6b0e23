use super::*;
use crate::engine::Engine;
use crate::errors::ErrorKind;
use crate::value::Value;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

struct Account {
    owner: String,
    balance: Mutex<f64>,
}

impl ProxyClass for Account {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .property("Owner", |a: &Account| a.owner.clone())
            .property_rw(
                "Balance",
                |a: &Account| *a.balance.lock(),
                |a: &Account, v: Value| {
                    *a.balance.lock() = v.as_number();
                    Ok(())
                },
            )
            .property(
                Member::new("Secret").hidden(),
                |_: &Account| "hidden",
            )
            .method(
                "Deposit",
                Signature::new().number(),
                |a: Arc<Account>, call: HostCall| {
                    let mut balance = a.balance.lock();
                    *balance += call.number(0);
                    Ok(*balance)
                },
            )
            .method(
                Member::new("internal_id").rename("ID"),
                Signature::new(),
                |_: Arc<Account>, _| Ok(7.0),
            )
            .static_property("Currency", || "EUR")
    }
}

struct Quiet;

impl ProxyClass for Quiet {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class
            .default_method_visibility(false)
            .default_property_access(PropertyAccess::READABLE)
            .method("Skipped", Signature::new(), |_: Arc<Quiet>, _| Ok(()))
            .method(Member::new("Shown").visible(), Signature::new(), |_: Arc<Quiet>, _| {
                Ok(())
            })
            .property_rw("Level", |_: &Quiet| 1.0, |_: &Quiet, _| Ok(()))
    }
}

struct Leaf;

impl ProxyClass for Leaf {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        class.static_property("Kind", || "leaf")
    }
}

/// Describing `Branch` builds `Leaf`'s descriptor along the way.
struct Branch;

impl ProxyClass for Branch {
    fn describe(class: ClassBuilder<Self>) -> ClassBuilder<Self> {
        let child = descriptor::<Leaf>().type_name();
        class.static_property("Child", move || child)
    }
}

fn account() -> Arc<Account> {
    Arc::new(Account {
        owner: "ada".to_string(),
        balance: Mutex::new(10.0),
    })
}

mod descriptors {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_is_cached() {
        let a = descriptor::<Account>();
        let b = descriptor::<Account>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.type_name(), "Account");
    }

    #[test]
    fn test_describe_may_build_other_descriptors() {
        let branch = descriptor::<Branch>();
        assert!(branch.property("child", false).is_some());
        let leaf = descriptor::<Leaf>();
        assert_eq!(leaf.type_name(), "Leaf");
        assert!(Arc::ptr_eq(&leaf, &descriptor::<Leaf>()));
    }

    #[test]
    fn test_exposed_names_are_lowercased() {
        let class = descriptor::<Account>();
        assert!(class.method("deposit").is_some());
        assert!(class.method("Deposit").is_none());
        assert!(class.method("ID").is_some());
        assert!(class.property("owner", true).is_some());
        assert!(class.property("currency", false).is_some());
        assert!(class.property("currency", true).is_none());
    }

    #[test]
    fn test_hidden_members_are_skipped() {
        let class = descriptor::<Account>();
        assert!(class.property("secret", true).is_none());
    }

    #[test]
    fn test_class_defaults() {
        let class = descriptor::<Quiet>();
        assert!(class.method("skipped").is_none());
        assert!(class.method("shown").is_some());
        let level = class.property("level", true).unwrap();
        assert!(level.is_readable());
        assert!(!level.is_writable());
    }

    #[test]
    fn test_read_only_property_has_no_write_access() {
        let class = descriptor::<Account>();
        let owner = class.property("owner", true).unwrap();
        assert_eq!(owner.access(), PropertyAccess::READABLE);
        let balance = class.property("balance", true).unwrap();
        assert_eq!(balance.access(), PropertyAccess::default());
    }
}

mod tables {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_table_is_shared_per_engine() {
        let engine = Engine::builder().standard_libraries(false).build();
        let a = engine.class_table::<Account>();
        let b = engine.class_table::<Account>();
        assert!(a.ptr_eq(&b));
        assert!(a.raw_get(&Value::from("deposit")).as_function().is_some());

        let other = Engine::builder().standard_libraries(false).build();
        assert!(!other.class_table::<Account>().ptr_eq(&a));
    }

    #[test]
    fn test_instances_share_a_metatable() {
        let engine = Engine::builder().standard_libraries(false).build();
        let first = engine.proxy(account());
        let second = engine.proxy(account());
        assert!(first.metatable().unwrap().ptr_eq(&second.metatable().unwrap()));
        let index = first.metatable().unwrap().raw_get(&Value::from("__index"));
        assert_eq!(index, Value::from(engine.class_table::<Account>()));
    }

    #[test]
    fn test_properties_redirect_to_host() {
        let engine = Engine::builder().standard_libraries(false).build();
        let host = account();
        let proxy = engine.proxy(host.clone());
        assert_eq!(proxy.get(&Value::from("owner")).unwrap(), Value::from("ada"));

        proxy.set(Value::from("balance"), Value::from(99.0)).unwrap();
        assert_eq!(*host.balance.lock(), 99.0);

        let err = proxy.set(Value::from("owner"), Value::from("bob")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotAssignable);
    }

    #[test]
    fn test_static_properties_live_on_class_table() {
        let engine = Engine::builder().standard_libraries(false).build();
        let class = engine.class_table::<Account>();
        assert_eq!(class.get(&Value::from("currency")).unwrap(), Value::from("EUR"));
    }

    #[test]
    fn test_keys_include_readable_properties() {
        let engine = Engine::builder().standard_libraries(false).build();
        let proxy = engine.proxy(account());
        let keys = proxy.keys();
        assert!(keys.contains(&Value::from("owner")));
        assert!(keys.contains(&Value::from("balance")));
        assert!(!keys.contains(&Value::from("secret")));
    }

    #[test]
    fn test_proxy_metatable_is_fixed() {
        let engine = Engine::builder().standard_libraries(false).build();
        let proxy = engine.proxy(account());
        let err = proxy.set_metatable(None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MetatableTypeError);
    }
}

mod conversion {
    use super::*;
    use crate::proxy::binding::host_instance;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitives_convert_directly() {
        let engine = Engine::builder().standard_libraries(false).build();
        assert_eq!(from_host_object(&engine, Arc::new(3i32)).unwrap(), Value::from(3.0));
        assert_eq!(
            from_host_object(&engine, Arc::new("hi".to_string())).unwrap(),
            Value::from("hi")
        );
        assert_eq!(from_host_object(&engine, Arc::new(true)).unwrap(), Value::from(true));
    }

    #[test]
    fn test_described_types_become_proxies() {
        let engine = Engine::builder().standard_libraries(false).build();
        descriptor::<Account>();
        let value = engine.to_value(account()).unwrap();
        let table = value.as_table().unwrap();
        assert!(host_instance::<Account>(&value).is_some());
        assert_eq!(table.get(&Value::from("owner")).unwrap(), Value::from("ada"));
    }

    #[test]
    fn test_unknown_types_are_rejected() {
        struct Opaque;
        let engine = Engine::builder().standard_libraries(false).build();
        let err = from_host_object(&engine, Arc::new(Opaque)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedConversion);
        assert!(err.message.contains("Opaque"));
    }
}

#[test]
fn test_into_values() {
    assert!(().into_values().is_empty());
    assert_eq!((1.0, "a").into_values().to_vec(), vec![Value::from(1.0), Value::from("a")]);
    assert_eq!(None::<f64>.into_values().to_vec(), vec![Value::Nil]);
}
