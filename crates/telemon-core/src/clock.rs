//! Monotonic time source.

/// Milliseconds since boot. Only meaningful for ordering and intervals within
/// a single session of a single device.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
