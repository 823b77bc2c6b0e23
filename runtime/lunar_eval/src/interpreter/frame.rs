//! Per-call execution state.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::value::Values;

/// How a statement finished.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Return,
}

/// State of one interpreted call: its varargs and, once a `return` runs,
/// its result list.
pub(crate) struct Frame {
    returned: AtomicBool,
    outcome: Mutex<Option<Values>>,
    varargs: Values,
}

impl Frame {
    pub(crate) fn new(varargs: Values) -> Self {
        Frame {
            returned: AtomicBool::new(false),
            outcome: Mutex::new(None),
            varargs,
        }
    }

    /// Set once, never cleared.
    #[inline]
    pub(crate) fn has_returned(&self) -> bool {
        self.returned.load(Ordering::Acquire)
    }

    /// Record the result list. Only the first return of a frame is kept.
    pub(crate) fn set_return(&self, values: Values) {
        let mut outcome = self.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(values);
            self.returned.store(true, Ordering::Release);
        }
    }

    pub(crate) fn varargs(&self) -> &Values {
        &self.varargs
    }

    /// The result list; empty when no `return` ran.
    pub(crate) fn take_outcome(&self) -> Values {
        self.outcome.lock().take().unwrap_or_default()
    }
}
