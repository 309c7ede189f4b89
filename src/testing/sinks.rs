//! Sinks and value types for observing what a table emits and releases.

use crate::sink::Sink;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// A recording sink whose clones share one buffer.
///
/// Hand one clone to the table and keep another to inspect the output while
/// the table is still alive.
#[derive(Debug)]
pub struct SharedSink<V> {
    values: Rc<RefCell<Vec<V>>>,
}

impl<V> Clone for SharedSink<V> {
    fn clone(&self) -> Self {
        Self {
            values: Rc::clone(&self.values),
        }
    }
}

impl<V> Default for SharedSink<V> {
    fn default() -> Self {
        Self {
            values: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<V> SharedSink<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Remove and return everything received so far.
    #[must_use]
    pub fn take(&self) -> Vec<V> {
        std::mem::take(&mut *self.values.borrow_mut())
    }

    /// Copy of everything received so far.
    #[must_use]
    pub fn snapshot(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.values.borrow().clone()
    }
}

impl<V> Sink<V> for SharedSink<V> {
    fn push(&mut self, value: V) {
        self.values.borrow_mut().push(value);
    }
}

/// Records values and panics on the push after `limit` successful ones.
#[derive(Debug)]
pub struct PanicAfter<V> {
    pub limit: usize,
    pub received: Vec<V>,
}

impl<V> PanicAfter<V> {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            received: Vec::new(),
        }
    }
}

impl<V> Sink<V> for PanicAfter<V> {
    fn push(&mut self, value: V) {
        assert!(self.received.len() < self.limit, "sink failed after {} values", self.limit);
        self.received.push(value);
    }
}

/// Shared count of live [`Tracked`] values.
#[derive(Clone, Debug, Default)]
pub struct DropCounter {
    live: Rc<Cell<usize>>,
}

impl DropCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value`, counting it as live until it is dropped.
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        self.live.set(self.live.get() + 1);
        Tracked {
            value,
            live: Rc::clone(&self.live),
        }
    }

    /// Number of tracked values not yet dropped.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.get()
    }
}

/// A value registered with a [`DropCounter`].
///
/// Clones are counted too.
#[derive(Debug)]
pub struct Tracked<T> {
    pub value: T,
    live: Rc<Cell<usize>>,
}

impl<T: Clone> Clone for Tracked<T> {
    fn clone(&self) -> Self {
        self.live.set(self.live.get() + 1);
        Self {
            value: self.value.clone(),
            live: Rc::clone(&self.live),
        }
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}
