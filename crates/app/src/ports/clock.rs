//! Clock port: the single source of "now" for every time-driven decision.

use nightrelay_domain::time::Timestamp;

/// Wall-clock time source.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

impl<T: Clock + ?Sized> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
