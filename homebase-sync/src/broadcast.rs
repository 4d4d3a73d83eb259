//! Replay-latest-then-live value broadcast.
//!
//! Each subscriber owns an unbounded channel. A new subscription is seeded
//! with the current value; every later [`Broadcaster::publish`] is delivered
//! to every subscriber still alive. Dropping a [`Subscription`] removes it at
//! the next publish without affecting the others.

use futures::Stream;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Shared<T> {
    current: T,
    subscribers: Vec<UnboundedSender<T>>,
}

/// Holds the latest value of `T` and fans updates out to subscribers.
pub struct Broadcaster<T: Clone> {
    shared: Mutex<Shared<T>>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new(initial: T) -> Self {
        Self {
            shared: Mutex::new(Shared {
                current: initial,
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The latest published value.
    pub fn current(&self) -> T {
        self.lock().current.clone()
    }

    /// Replaces the current value and delivers it to every live subscriber.
    pub fn publish(&self, value: T) {
        let mut shared = self.lock();
        shared.current = value.clone();
        shared
            .subscribers
            .retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Subscribes; the current value is the first item received.
    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut shared = self.lock();
        // Cannot fail: the receiver is still in scope.
        let _ = tx.send(shared.current.clone());
        shared.subscribers.push(tx);
        Subscription { rx }
    }

    /// Number of subscribers not yet pruned.
    pub fn subscriber_count(&self) -> usize {
        let mut shared = self.lock();
        shared.subscribers.retain(|tx| !tx.is_closed());
        shared.subscribers.len()
    }
}

/// One observer's view of a [`Broadcaster`].
pub struct Subscription<T> {
    rx: UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Waits for the next value. `None` once the broadcaster is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Takes the next value if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// Drains every queued value.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Ok(value) = self.rx.try_recv() {
            values.push(value);
        }
        values
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}
