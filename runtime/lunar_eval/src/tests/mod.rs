//! Script-level tests of the interpreter and standard libraries.

mod string_tests;

use crate::errors::{Error, RuntimeError};
use crate::{Engine, Value};

/// Run `source` on a fresh engine and return its results.
pub(crate) async fn run(source: &str) -> Vec<Value> {
    match Engine::new().execute(source).await {
        Ok(values) => values.to_vec(),
        Err(err) => panic!("script failed: {err}\n{source}"),
    }
}

/// Run `source` expecting a runtime error.
pub(crate) async fn run_err(source: &str) -> RuntimeError {
    match Engine::new().execute(source).await {
        Err(Error::Runtime(err)) => err,
        Err(Error::Parse(err)) => panic!("parse error: {err}"),
        Ok(values) => panic!("expected an error, got {values:?}"),
    }
}

pub(crate) fn n(value: f64) -> Value {
    Value::from(value)
}

pub(crate) fn s(value: &str) -> Value {
    Value::from(value)
}
