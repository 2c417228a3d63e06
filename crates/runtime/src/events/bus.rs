//! Typed, topic-scoped event bus with three dispatch lanes.
//!
//! Handlers are keyed by `(message type, topic)`. Immediate messages are
//! delivered inside `publish`; `NextFrame` and `Queued` messages wait for the
//! owner of the bus to call [`EventBus::drain_pending`], typically once per
//! presentation tick.
//!
//! Handlers always run with no bus lock held, so they may publish, subscribe
//! or drop their own [`Subscription`] while being dispatched. A handler that
//! panics is logged and skipped; the remaining handlers still run.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::Utc;

use super::message::{BusMessage, DispatchMode, Envelope, PublishOptions, Topic};

type SubscriptionKey = (TypeId, Topic);
type ErasedHandler = dyn Fn(&dyn Any) + Send + Sync;
type Deferred = Box<dyn FnOnce(&Shared) + Send>;

struct HandlerEntry {
    id: u64,
    active: AtomicBool,
    type_name: &'static str,
    handler: Box<ErasedHandler>,
}

#[derive(Default)]
struct Registry {
    handlers: HashMap<SubscriptionKey, Vec<Arc<HandlerEntry>>>,
    next_id: u64,
}

#[derive(Default)]
struct PendingLanes {
    next_frame: VecDeque<Deferred>,
    queued: BTreeMap<i32, VecDeque<Deferred>>,
}

impl PendingLanes {
    fn pop_queued(&mut self) -> Option<Deferred> {
        let mut bucket = self.queued.first_entry()?;
        let item = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        item
    }

    fn queued_len(&self) -> usize {
        self.queued.values().map(VecDeque::len).sum()
    }
}

#[derive(Default)]
struct Shared {
    registry: Mutex<Registry>,
    lanes: Mutex<PendingLanes>,
    sequence: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Handlers never run under these locks, so a poisoned guard still holds
    // consistent data.
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// What one [`EventBus::drain_pending`] call delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub next_frame: usize,
    pub queued: usize,
}

impl DrainStats {
    pub fn total(&self) -> usize {
        self.next_frame + self.queued
    }
}

/// Typed publish/subscribe bus.
///
/// Cloning is cheap and every clone shares the same subscribers and lanes.
#[derive(Clone, Default)]
pub struct EventBus {
    shared: Arc<Shared>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `T` on its default topic.
    pub fn subscribe<T, F>(&self, handler: F) -> Subscription
    where
        T: BusMessage,
        F: Fn(&Envelope<T>) + Send + Sync + 'static,
    {
        self.subscribe_on(T::TOPIC, handler)
    }

    /// Subscribes to `T` on an explicit topic.
    pub fn subscribe_on<T, F>(&self, topic: Topic, handler: F) -> Subscription
    where
        T: BusMessage,
        F: Fn(&Envelope<T>) + Send + Sync + 'static,
    {
        let key = (TypeId::of::<T>(), topic);
        let erased: Box<ErasedHandler> = Box::new(move |message: &dyn Any| {
            if let Some(envelope) = message.downcast_ref::<Envelope<T>>() {
                handler(envelope);
            }
        });

        let entry = {
            let mut registry = lock(&self.shared.registry);
            registry.next_id += 1;
            let entry = Arc::new(HandlerEntry {
                id: registry.next_id,
                active: AtomicBool::new(true),
                type_name: std::any::type_name::<T>(),
                handler: erased,
            });
            registry
                .handlers
                .entry(key)
                .or_default()
                .push(Arc::clone(&entry));
            entry
        };

        tracing::trace!(
            target: "runtime::events",
            message = entry.type_name,
            %topic,
            handler_id = entry.id,
            "Subscribed"
        );

        Subscription {
            shared: Arc::downgrade(&self.shared),
            key,
            entry,
        }
    }

    /// Publishes with the message type's default topic, mode and priority.
    pub fn publish<T: BusMessage>(&self, payload: T) {
        self.publish_with(payload, PublishOptions::default());
    }

    pub fn publish_with<T: BusMessage>(&self, payload: T, options: PublishOptions) {
        let envelope = Envelope {
            payload: Arc::new(payload),
            topic: options.topic.unwrap_or(T::TOPIC),
            mode: options.mode.unwrap_or(T::MODE),
            priority: options.priority.unwrap_or(T::PRIORITY),
            correlation_id: options.correlation_id,
            timestamp: Utc::now(),
            sequence: self.shared.sequence.fetch_add(1, Ordering::Relaxed),
        };

        match envelope.mode {
            DispatchMode::Immediate => {
                dispatch(&self.shared, &envelope);
            }
            DispatchMode::NextFrame => {
                lock(&self.shared.lanes)
                    .next_frame
                    .push_back(Box::new(move |shared| {
                        dispatch(shared, &envelope);
                    }));
            }
            DispatchMode::Queued => {
                let priority = envelope.priority;
                lock(&self.shared.lanes)
                    .queued
                    .entry(priority)
                    .or_default()
                    .push_back(Box::new(move |shared| {
                        dispatch(shared, &envelope);
                    }));
            }
        }
    }

    /// Delivers deferred messages, at most `max_items` in total.
    ///
    /// `NextFrame` messages that were pending when the call started go first,
    /// in publish order. If budget remains afterwards, exactly one `Queued`
    /// message is delivered: the oldest one in the lowest-numbered priority
    /// bucket. Subscribers are resolved at delivery time, so a handler added
    /// after publish but before the drain still receives the message.
    pub fn drain_pending(&self, max_items: usize) -> DrainStats {
        let mut stats = DrainStats::default();
        if max_items == 0 {
            return stats;
        }

        let available = lock(&self.shared.lanes).next_frame.len();
        while stats.next_frame < available.min(max_items) {
            // Pop one at a time: handlers may publish into the lanes.
            let Some(item) = lock(&self.shared.lanes).next_frame.pop_front() else {
                break;
            };
            item(&self.shared);
            stats.next_frame += 1;
        }

        if stats.next_frame < max_items {
            let item = lock(&self.shared.lanes).pop_queued();
            if let Some(item) = item {
                item(&self.shared);
                stats.queued = 1;
            }
        }

        if stats.total() > 0 {
            tracing::trace!(
                target: "runtime::events",
                next_frame = stats.next_frame,
                queued = stats.queued,
                "Drained pending messages"
            );
        }
        stats
    }

    /// Number of deferred messages waiting in each lane: `(next_frame, queued)`.
    pub fn pending(&self) -> (usize, usize) {
        let lanes = lock(&self.shared.lanes);
        (lanes.next_frame.len(), lanes.queued_len())
    }

    /// Drops every deferred message without delivering it.
    pub fn clear_pending(&self) -> usize {
        let mut lanes = lock(&self.shared.lanes);
        let dropped = lanes.next_frame.len() + lanes.queued_len();
        lanes.next_frame.clear();
        lanes.queued.clear();
        dropped
    }

    /// Number of live handlers for `T` on `topic`.
    pub fn subscriber_count<T: BusMessage>(&self, topic: Topic) -> usize {
        lock(&self.shared.registry)
            .handlers
            .get(&(TypeId::of::<T>(), topic))
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (next_frame, queued) = self.pending();
        f.debug_struct("EventBus")
            .field("next_frame", &next_frame)
            .field("queued", &queued)
            .finish()
    }
}

/// Delivers one envelope to a snapshot of its subscribers.
fn dispatch<T: BusMessage>(shared: &Shared, envelope: &Envelope<T>) -> usize {
    let key = (TypeId::of::<T>(), envelope.topic);
    let handlers = match lock(&shared.registry).handlers.get(&key) {
        Some(handlers) => handlers.clone(),
        None => {
            tracing::trace!(
                target: "runtime::events",
                message = std::any::type_name::<T>(),
                topic = %envelope.topic,
                "No subscribers for message"
            );
            return 0;
        }
    };

    let mut delivered = 0;
    for entry in handlers {
        // Unsubscribed after the snapshot was taken.
        if !entry.active.load(Ordering::Acquire) {
            continue;
        }
        let message: &dyn Any = envelope;
        match catch_unwind(AssertUnwindSafe(|| (entry.handler)(message))) {
            Ok(()) => delivered += 1,
            Err(panic) => {
                tracing::error!(
                    target: "runtime::events",
                    message = entry.type_name,
                    topic = %envelope.topic,
                    handler_id = entry.id,
                    sequence = envelope.sequence,
                    panic = panic_message(panic.as_ref()),
                    "Event handler panicked"
                );
            }
        }
    }
    delivered
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic>")
}

/// Handle that keeps a handler registered.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) removes the
/// handler. Removal takes effect immediately, even for a dispatch that is
/// already in progress: a handler unsubscribed by an earlier handler of the
/// same publish is not invoked.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    shared: Weak<Shared>,
    key: SubscriptionKey,
    entry: Arc<HandlerEntry>,
}

impl Subscription {
    pub fn unsubscribe(self) {}

    pub fn is_active(&self) -> bool {
        self.entry.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.entry.active.store(false, Ordering::Release);
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        // Release the lock before the removed entry is dropped; its closure
        // may own other subscriptions.
        let removed = {
            let mut registry = lock(&shared.registry);
            let Some(handlers) = registry.handlers.get_mut(&self.key) else {
                return;
            };
            let removed = handlers
                .iter()
                .position(|entry| entry.id == self.entry.id)
                .map(|index| handlers.remove(index));
            if handlers.is_empty() {
                registry.handlers.remove(&self.key);
            }
            removed
        };
        drop(removed);

        tracing::trace!(
            target: "runtime::events",
            message = self.entry.type_name,
            handler_id = self.entry.id,
            "Unsubscribed"
        );
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("message", &self.entry.type_name)
            .field("topic", &self.key.1)
            .field("handler_id", &self.entry.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::events::CorrelationId;

    struct Ping(u32);
    impl BusMessage for Ping {}

    struct Frame(&'static str);
    impl BusMessage for Frame {
        const MODE: DispatchMode = DispatchMode::NextFrame;
    }

    struct Job(&'static str);
    impl BusMessage for Job {
        const MODE: DispatchMode = DispatchMode::Queued;
    }

    fn recorder<T>() -> (Arc<Mutex<Vec<T>>>, Arc<Mutex<Vec<T>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (Arc::clone(&log), log)
    }

    #[test]
    fn immediate_reaches_all_subscribers_of_type_and_topic() {
        let bus = EventBus::new();
        let (log, sink_a) = recorder();
        let sink_b = Arc::clone(&log);
        let sink_c = Arc::clone(&log);

        let _a = bus.subscribe::<Ping, _>(move |e| sink_a.lock().unwrap().push(("a", e.0)));
        let _b = bus.subscribe::<Ping, _>(move |e| sink_b.lock().unwrap().push(("b", e.0)));
        let _other_topic = bus.subscribe_on::<Ping, _>(Topic::Combat, move |e| {
            sink_c.lock().unwrap().push(("combat", e.0))
        });

        bus.publish(Ping(7));
        assert_eq!(*log.lock().unwrap(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn topic_override_routes_to_that_topic() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let _sub = bus.subscribe_on::<Ping, _>(Topic::Combat, move |e| {
            sink.lock().unwrap().push(e.0)
        });

        bus.publish(Ping(1));
        bus.publish_with(Ping(2), PublishOptions::new().topic(Topic::Combat));
        assert_eq!(*log.lock().unwrap(), vec![2]);
    }

    #[test]
    fn next_frame_waits_for_drain_and_respects_budget() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let _sub = bus.subscribe::<Frame, _>(move |e| sink.lock().unwrap().push(e.0));

        bus.publish(Frame("one"));
        bus.publish(Frame("two"));
        bus.publish(Frame("three"));
        assert!(log.lock().unwrap().is_empty());

        let stats = bus.drain_pending(2);
        assert_eq!(stats, DrainStats { next_frame: 2, queued: 0 });
        assert_eq!(*log.lock().unwrap(), vec!["one", "two"]);

        bus.drain_pending(10);
        assert_eq!(*log.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[test]
    fn queued_delivers_one_per_drain_lowest_priority_first() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let _sub = bus.subscribe::<Job, _>(move |e| sink.lock().unwrap().push(e.0));

        bus.publish_with(Job("late"), PublishOptions::new().priority(2));
        bus.publish_with(Job("first"), PublishOptions::new().priority(1));
        bus.publish_with(Job("second"), PublishOptions::new().priority(1));

        let stats = bus.drain_pending(10);
        assert_eq!(stats.queued, 1);
        bus.drain_pending(10);
        bus.drain_pending(10);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second", "late"]);
        assert_eq!(bus.pending(), (0, 0));
    }

    #[test]
    fn queued_only_runs_when_next_frame_leaves_budget() {
        let bus = EventBus::new();
        bus.publish(Frame("f"));
        bus.publish(Job("j"));

        assert_eq!(bus.drain_pending(1), DrainStats { next_frame: 1, queued: 0 });
        assert_eq!(bus.drain_pending(1), DrainStats { next_frame: 0, queued: 1 });
    }

    #[test]
    fn zero_budget_delivers_nothing() {
        let bus = EventBus::new();
        bus.publish(Frame("f"));
        assert_eq!(bus.drain_pending(0).total(), 0);
        assert_eq!(bus.pending(), (1, 0));
    }

    #[test]
    fn subscriber_added_after_publish_receives_deferred_message() {
        let bus = EventBus::new();
        bus.publish(Frame("late subscriber"));

        let (log, sink) = recorder();
        let _sub = bus.subscribe::<Frame, _>(move |e| sink.lock().unwrap().push(e.0));
        bus.drain_pending(1);
        assert_eq!(*log.lock().unwrap(), vec!["late subscriber"]);
    }

    #[test]
    fn messages_published_during_drain_wait_for_next_drain() {
        let bus = EventBus::new();
        let republisher = bus.clone();
        let (log, sink) = recorder();
        let _sub = bus.subscribe::<Frame, _>(move |e| {
            sink.lock().unwrap().push(e.0);
            if e.0 == "outer" {
                republisher.publish(Frame("inner"));
            }
        });

        bus.publish(Frame("outer"));
        assert_eq!(bus.drain_pending(10).next_frame, 1);
        assert_eq!(*log.lock().unwrap(), vec!["outer"]);
        bus.drain_pending(10);
        assert_eq!(*log.lock().unwrap(), vec!["outer", "inner"]);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let sub = bus.subscribe::<Ping, _>(move |e| sink.lock().unwrap().push(e.0));

        bus.publish(Ping(1));
        sub.unsubscribe();
        bus.publish(Ping(2));

        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(bus.subscriber_count::<Ping>(Topic::General), 0);
    }

    #[test]
    fn panicking_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let _bad = bus.subscribe::<Ping, _>(|_| panic!("boom"));
        let _good = bus.subscribe::<Ping, _>(move |e| sink.lock().unwrap().push(e.0));

        bus.publish(Ping(3));
        bus.publish(Ping(4));
        assert_eq!(*log.lock().unwrap(), vec![3, 4]);
    }

    #[test]
    fn envelope_carries_metadata() {
        let bus = EventBus::new();
        let (log, sink) = recorder();
        let _sub = bus.subscribe::<Ping, _>(move |e| {
            sink.lock().unwrap().push((e.correlation_id(), e.sequence(), e.mode()))
        });

        bus.publish(Ping(0));
        bus.publish_with(
            Ping(1),
            PublishOptions::new().correlate(CorrelationId(9)),
        );

        let log = log.lock().unwrap();
        assert_eq!(log[0].0, None);
        assert_eq!(log[1].0, Some(CorrelationId(9)));
        assert!(log[1].1 > log[0].1);
        assert_eq!(log[0].2, DispatchMode::Immediate);
    }
}
