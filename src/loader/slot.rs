use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::debug;

use super::error::ServiceLoadError;

type SharedInit<T> = Shared<BoxFuture<'static, Result<Arc<T>, ServiceLoadError>>>;

enum SlotState<T> {
    Empty,
    /// An instantiation is in flight; later callers await the same future.
    Loading(SharedInit<T>),
    Ready(Arc<T>),
}

/// One lazily-initialized instance slot with single-flight semantics.
///
/// The pending future is checked-and-set under the lock before any await, so
/// a request arriving during instantiation observes `Loading` and joins the
/// existing flight instead of starting a second one. On success the slot
/// holds the instance for the rest of the process lifetime; on failure it
/// returns to `Empty` so a later request may retry.
pub(super) struct SingleFlightSlot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> Default for SingleFlightSlot<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(SlotState::Empty),
        }
    }
}

impl<T: Send + Sync + 'static> SingleFlightSlot<T> {
    pub(super) async fn get_or_init<F>(&self, init: F) -> Result<Arc<T>, ServiceLoadError>
    where
        F: FnOnce() -> BoxFuture<'static, Result<T, ServiceLoadError>>,
    {
        let flight = {
            let mut state = self.state.lock();
            match &*state {
                SlotState::Ready(instance) => return Ok(instance.clone()),
                SlotState::Loading(flight) => {
                    debug!("Joining in-flight capability instantiation");
                    flight.clone()
                }
                SlotState::Empty => {
                    let flight = init().map(|result| result.map(Arc::new)).boxed().shared();
                    *state = SlotState::Loading(flight.clone());
                    flight
                }
            }
        };

        let result = flight.clone().await;

        let mut state = self.state.lock();
        // Only settle the slot for the flight we awaited; a failed flight may
        // already have been replaced by a newer one.
        if let SlotState::Loading(current) = &*state
            && current.ptr_eq(&flight)
        {
            *state = match &result {
                Ok(instance) => SlotState::Ready(instance.clone()),
                Err(_) => SlotState::Empty,
            };
        }

        result
    }

    /// Returns the cached instance without triggering instantiation.
    pub(super) fn get(&self) -> Option<Arc<T>> {
        match &*self.state.lock() {
            SlotState::Ready(instance) => Some(instance.clone()),
            _ => None,
        }
    }
}
