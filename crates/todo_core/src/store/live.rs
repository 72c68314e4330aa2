//! Live query handles and subscriber bookkeeping.
//!
//! # Responsibility
//! - Describe sorted task queries (`TaskQuery`).
//! - Track subscriptions and queue refreshed snapshots for them.
//! - Release subscriptions when their `LiveTasks` handle is dropped.
//!
//! # Invariants
//! - Snapshots are queued at commit time and only observed when the holder
//!   calls `LiveTasks::refresh`, on the holder's own thread.
//! - A dropped `LiveTasks` never receives further snapshots.

use crate::model::task::Task;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Weak;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Field a task query is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortField {
    CreatedAt,
    Description,
    IsComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordering applied to a task query.
///
/// Ties are broken by insertion order in the same direction, so two tasks
/// created within the same millisecond still keep a deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for TaskSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Ascending,
        }
    }
}

/// Query over all tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskQuery {
    pub sort: TaskSort,
}

impl TaskQuery {
    pub fn sorted(field: SortField, direction: SortDirection) -> Self {
        Self {
            sort: TaskSort { field, direction },
        }
    }

    /// Display order used by the to-do screen: `created_at` descending.
    pub fn newest_first() -> Self {
        Self::sorted(SortField::CreatedAt, SortDirection::Descending)
    }
}

/// Sorted view of all tasks at one store revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    /// Number of writes committed when the snapshot was taken.
    pub revision: u64,
    pub tasks: Vec<Task>,
}

pub(crate) type SubscriptionId = u64;

struct Subscriber {
    query: TaskQuery,
    sender: Sender<TaskSnapshot>,
}

/// Registered live queries of one store.
#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: SubscriptionId,
    subscribers: BTreeMap<SubscriptionId, Subscriber>,
}

impl SubscriberRegistry {
    pub(crate) fn register(
        &mut self,
        query: TaskQuery,
    ) -> (SubscriptionId, Receiver<TaskSnapshot>) {
        let id = self.next_id;
        self.next_id += 1;
        let (sender, receiver) = channel();
        self.subscribers.insert(id, Subscriber { query, sender });
        (id, receiver)
    }

    pub(crate) fn unregister(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Distinct queries with at least one subscriber.
    pub(crate) fn active_queries(&self) -> Vec<TaskQuery> {
        let mut queries = self
            .subscribers
            .values()
            .map(|subscriber| subscriber.query)
            .collect::<Vec<_>>();
        queries.sort();
        queries.dedup();
        queries
    }

    /// Queues each subscriber's snapshot and drops subscribers whose
    /// receiving side is gone.
    pub(crate) fn deliver(&mut self, snapshots: &BTreeMap<TaskQuery, TaskSnapshot>) {
        self.subscribers.retain(|_, subscriber| {
            match snapshots.get(&subscriber.query) {
                Some(snapshot) => subscriber.sender.send(snapshot.clone()).is_ok(),
                None => true,
            }
        });
    }
}

/// Registration guard; dropping it deregisters the live query.
pub(crate) struct Subscription {
    id: SubscriptionId,
    registry: Weak<RefCell<SubscriberRegistry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: Weak<RefCell<SubscriberRegistry>>) -> Self {
        Self { id, registry }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        // A busy registry prunes this entry on its next delivery instead.
        if let Ok(mut registry) = registry.try_borrow_mut() {
            registry.unregister(self.id);
        };
    }
}

/// Continuously updated, read-only result of a task query.
///
/// Holds the latest snapshot observed by the owner. Newer snapshots are
/// queued by the store after every committed write and applied by
/// [`LiveTasks::refresh`].
pub struct LiveTasks {
    query: TaskQuery,
    snapshot: TaskSnapshot,
    receiver: Receiver<TaskSnapshot>,
    _subscription: Subscription,
}

impl LiveTasks {
    pub(crate) fn new(
        query: TaskQuery,
        snapshot: TaskSnapshot,
        receiver: Receiver<TaskSnapshot>,
        subscription: Subscription,
    ) -> Self {
        Self {
            query,
            snapshot,
            receiver,
            _subscription: subscription,
        }
    }

    pub fn query(&self) -> TaskQuery {
        self.query
    }

    /// Tasks of the latest observed snapshot, in query order.
    pub fn tasks(&self) -> &[Task] {
        &self.snapshot.tasks
    }

    pub fn revision(&self) -> u64 {
        self.snapshot.revision
    }

    pub fn len(&self) -> usize {
        self.snapshot.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.tasks.is_empty()
    }

    /// Applies every queued snapshot, keeping the newest one.
    ///
    /// Returns `true` when the observed snapshot changed.
    pub fn refresh(&mut self) -> bool {
        let mut changed = false;
        while let Ok(snapshot) = self.receiver.try_recv() {
            if snapshot.revision >= self.snapshot.revision {
                self.snapshot = snapshot;
                changed = true;
            }
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::{
        SortDirection, SortField, SubscriberRegistry, Subscription, TaskQuery, TaskSnapshot,
    };
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[test]
    fn newest_first_sorts_by_created_at_descending() {
        let query = TaskQuery::newest_first();
        assert_eq!(query.sort.field, SortField::CreatedAt);
        assert_eq!(query.sort.direction, SortDirection::Descending);
    }

    #[test]
    fn active_queries_are_deduplicated() {
        let mut registry = SubscriberRegistry::default();
        let _a = registry.register(TaskQuery::newest_first());
        let _b = registry.register(TaskQuery::newest_first());
        let _c = registry.register(TaskQuery::default());

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.active_queries().len(), 2);
    }

    #[test]
    fn deliver_prunes_disconnected_subscribers() {
        let mut registry = SubscriberRegistry::default();
        let (_kept_id, kept_rx) = registry.register(TaskQuery::default());
        let (_dropped_id, dropped_rx) = registry.register(TaskQuery::default());
        drop(dropped_rx);

        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            TaskQuery::default(),
            TaskSnapshot {
                revision: 1,
                tasks: Vec::new(),
            },
        );
        registry.deliver(&snapshots);

        assert_eq!(registry.len(), 1);
        assert_eq!(kept_rx.try_recv().unwrap().revision, 1);
    }

    #[test]
    fn unregister_reports_unknown_ids() {
        let mut registry = SubscriberRegistry::default();
        let (id, _rx) = registry.register(TaskQuery::default());
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
    }

    #[test]
    fn dropping_subscription_unregisters_from_live_registry() {
        let registry = Rc::new(RefCell::new(SubscriberRegistry::default()));
        let (id, _rx) = registry.borrow_mut().register(TaskQuery::default());
        let subscription = Subscription::new(id, Rc::downgrade(&registry));
        assert_eq!(registry.borrow().len(), 1);

        drop(subscription);
        assert_eq!(registry.borrow().len(), 0);
    }

    #[test]
    fn dropping_subscription_after_registry_is_gone_is_a_no_op() {
        let registry = Rc::new(RefCell::new(SubscriberRegistry::default()));
        let (id, _rx) = registry.borrow_mut().register(TaskQuery::default());
        let subscription = Subscription::new(id, Rc::downgrade(&registry));

        drop(registry);
        drop(subscription);
    }
}
