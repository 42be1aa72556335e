//! Synchronous publish/subscribe delivery of world events.

use std::fmt;

use crate::Event;

/// Destination for events emitted by the world.
pub trait EventBus {
    /// Delivers the event. Every subscriber has observed it once this returns.
    fn publish(&mut self, event: Event);
}

impl EventBus for Vec<Event> {
    fn publish(&mut self, event: Event) {
        self.push(event);
    }
}

/// Token identifying a handler registered on a [`Broadcast`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event)>;

/// Bus that invokes every subscribed handler, in subscription order, before
/// `publish` returns.
///
/// Handlers only ever see a shared reference to the event, so they cannot
/// reach back into the world that is currently dispatching.
#[derive(Default)]
pub struct Broadcast {
    subscribers: Vec<(SubscriptionId, Handler)>,
    next_id: u64,
}

impl Broadcast {
    /// Creates a bus without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler invoked for every subsequently published event.
    pub fn subscribe(&mut self, handler: impl FnMut(&Event) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(existing, _)| *existing != id);
        self.subscribers.len() != before
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl EventBus for Broadcast {
    fn publish(&mut self, event: Event) {
        for (_, handler) in &mut self.subscribers {
            handler(&event);
        }
    }
}

impl fmt::Debug for Broadcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broadcast")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::*;
    use crate::GridCoord;

    #[test]
    fn handlers_run_in_subscription_order_before_publish_returns() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus = Broadcast::new();
        for label in ["inventory", "render"] {
            let seen = Rc::clone(&seen);
            let _ = bus.subscribe(move |event| seen.borrow_mut().push((label, event.clone())));
        }

        let event = Event::BreakingCancelled {
            cell: GridCoord::new(1, 2),
        };
        bus.publish(event.clone());

        assert_eq!(
            *seen.borrow(),
            vec![("inventory", event.clone()), ("render", event)]
        );
    }

    #[test]
    fn unsubscribed_handlers_stop_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut bus = Broadcast::new();
        let id = {
            let count = Rc::clone(&count);
            bus.subscribe(move |_| *count.borrow_mut() += 1)
        };

        bus.publish(Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        });
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(Event::TimeAdvanced {
            dt: Duration::from_millis(16),
        });

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
