//! Opaque host payloads. Scripts can pass them around and compare them but
//! cannot index them; host types that need a script surface use proxies.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::next_id;

#[derive(Clone)]
pub struct UserData(Arc<UserDataInner>);

struct UserDataInner {
    id: u64,
    data: Arc<dyn Any + Send + Sync>,
}

impl UserData {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Self::from_arc(Arc::new(data))
    }

    pub fn from_arc(data: Arc<dyn Any + Send + Sync>) -> Self {
        UserData(Arc::new(UserDataInner { id: next_id(), data }))
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.data.downcast_ref::<T>()
    }

    pub fn data(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.0.data
    }
}

impl fmt::Debug for UserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "userdata: 0x{:08x}", self.id())
    }
}
