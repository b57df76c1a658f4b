//! Change notifications from the core to the mobile UI.
//!
//! The store, the live subscriber and `AppState` push `StateEvent`s here;
//! the UI drains the queue on its next render and re-reads whatever changed.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tether_types::event::StateEvent;

/// Pending notifications. Clones share one queue.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<RefCell<VecDeque<StateEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Queue `event`. A pending copy of the same event moves to the back,
    /// so the poll loop cannot grow the queue and the last event drained
    /// is always the latest transition.
    pub fn emit(&self, event: StateEvent) {
        let mut queue = self.inner.borrow_mut();
        queue.retain(|pending| *pending != event);
        queue.push_back(event);
    }

    /// Everything queued since the last drain, oldest first.
    pub fn drain(&self) -> Vec<StateEvent> {
        self.inner.borrow_mut().drain(..).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.borrow().is_empty()
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
