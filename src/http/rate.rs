use std::sync::Mutex;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use crate::args::RequestRate;

/// Hands out evenly spaced fire slots in call order.
///
/// The cursor lock covers only the read-reserve-advance step; callers sleep
/// after releasing it, so a late caller never shifts anyone else's slot.
#[derive(Debug)]
pub struct RateScheduler {
    interval: Duration,
    next_slot: Mutex<Instant>,
}

impl RateScheduler {
    #[must_use]
    pub fn new(rate: RequestRate) -> Self {
        Self::with_interval(rate.interval())
    }

    #[must_use]
    pub fn unthrottled() -> Self {
        Self::with_interval(Duration::ZERO)
    }

    #[must_use]
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(Instant::now()),
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Reserves the next slot without waiting for it.
    pub fn reserve(&self) -> Instant {
        let mut next_slot = match self.next_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let slot = *next_slot;
        *next_slot = slot.checked_add(self.interval).unwrap_or(slot);
        slot
    }

    /// Reserves the next slot and sleeps until it is due.
    ///
    /// Returns the reserved slot. A caller whose slot already passed returns
    /// immediately.
    pub async fn wait_for_turn(&self) -> Instant {
        let slot = self.reserve();
        if slot > Instant::now() {
            sleep_until(slot).await;
        }
        slot
    }
}
