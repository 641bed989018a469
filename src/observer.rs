//! Change notifications
//!
//! Observers learn about structural and payload changes after the store has
//! finished the corresponding step. Delivery is synchronous, on the caller's
//! thread, in subscription order.

use crate::types::Handle;
use std::sync::mpsc::Sender;

/// Notification emitted by a tree store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    Added { parent: Handle, item: Handle },
    Changed { item: Handle },
    Deleted { parent: Handle, item: Handle },
    /// The tree was reloaded; every earlier handle is stale.
    Cleared,
}

/// Receiver of [`TreeEvent`]s.
pub trait TreeObserver {
    fn notify(&mut self, event: &TreeEvent);
}

impl<F> TreeObserver for F
where
    F: FnMut(&TreeEvent),
{
    fn notify(&mut self, event: &TreeEvent) {
        self(event)
    }
}

impl TreeObserver for Sender<TreeEvent> {
    fn notify(&mut self, event: &TreeEvent) {
        if self.send(*event).is_err() {
            tracing::trace!("Observer channel closed, dropping {:?}", event);
        }
    }
}

/// Identifier returned by [`ObserverHub::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Registry of observers for one tree.
#[derive(Default)]
pub struct ObserverHub {
    observers: Vec<(ObserverId, Box<dyn TreeObserver>)>,
    next_id: u64,
}

impl ObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl TreeObserver + 'static) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn emit(&mut self, event: TreeEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer.notify(&event);
        }
    }

    pub fn added(&mut self, parent: Handle, item: Handle) {
        self.emit(TreeEvent::Added { parent, item });
    }

    pub fn changed(&mut self, item: Handle) {
        self.emit(TreeEvent::Changed { item });
    }

    pub fn deleted(&mut self, parent: Handle, item: Handle) {
        self.emit(TreeEvent::Deleted { parent, item });
    }
}

impl std::fmt::Debug for ObserverHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHub")
            .field("observers", &self.observers.len())
            .finish()
    }
}
