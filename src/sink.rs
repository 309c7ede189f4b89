//! Consumers of finalized values.
//!
//! A [`Sink`] receives every value the table emits, one at a time, during
//! spills and flushes. `push` runs synchronously inside `insert`/`flush`, so a
//! sink that blocks (for example a full bounded channel) stalls the table.
//! That is how downstream backpressure reaches the producer.

use std::sync::mpsc::SyncSender;

/// Receives values drained from a table.
pub trait Sink<V> {
    fn push(&mut self, value: V);
}

/// Collects everything in order.
impl<V> Sink<V> for Vec<V> {
    fn push(&mut self, value: V) {
        Vec::push(self, value);
    }
}

impl<V, S: Sink<V> + ?Sized> Sink<V> for &mut S {
    fn push(&mut self, value: V) {
        (**self).push(value);
    }
}

impl<V, S: Sink<V> + ?Sized> Sink<V> for Box<S> {
    fn push(&mut self, value: V) {
        (**self).push(value);
    }
}

/// Blocks while the channel is full.
///
/// Once the receiver has hung up, every value pushed is lost: the table has
/// already released it and nothing downstream will see it. Each lost value
/// is reported with a `warn` event.
impl<V> Sink<V> for SyncSender<V> {
    fn push(&mut self, value: V) {
        if self.send(value).is_err() {
            tracing::warn!("sink receiver disconnected, value lost");
        }
    }
}

/// Adapts a closure into a [`Sink`].
///
/// ```
/// use spillreduce::{FnSink, Sink};
///
/// let mut total = 0;
/// let mut sink = FnSink(|v: u32| total += v);
/// sink.push(2);
/// sink.push(3);
/// drop(sink);
/// assert_eq!(total, 5);
/// ```
#[derive(Clone, Debug)]
pub struct FnSink<F>(pub F);

impl<V, F: FnMut(V)> Sink<V> for FnSink<F> {
    fn push(&mut self, value: V) {
        (self.0)(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::sync_channel;

    #[test]
    fn vec_sink_keeps_order() {
        let mut v: Vec<i32> = Vec::new();
        Sink::push(&mut v, 1);
        Sink::push(&mut v, 2);
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn borrowed_and_boxed_sinks_forward() {
        let mut inner: Vec<i32> = Vec::new();
        {
            let mut borrowed = &mut inner;
            Sink::push(&mut borrowed, 7);
        }
        let mut boxed: Box<dyn Sink<i32>> = Box::new(Vec::new());
        boxed.push(1);
        assert_eq!(inner, vec![7]);
    }

    #[test]
    fn channel_sink_delivers_and_tolerates_hangup() {
        let (mut tx, rx) = sync_channel::<u8>(4);
        tx.push(1);
        tx.push(2);
        assert_eq!(rx.recv().ok(), Some(1));
        assert_eq!(rx.recv().ok(), Some(2));
        drop(rx);
        tx.push(3);
    }
}
