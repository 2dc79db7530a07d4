//! One change feed per store, shared by every observed key.
//!
//! The feed owns a single backing listener. It is registered when the first
//! subscriber arrives and released when the last one goes away, so a store with
//! no live observables keeps no listener at all.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::stream::{BoxStream, Stream, StreamExt};
use tracing::{debug, trace};

#[derive(Debug)]
pub(crate) struct ChangeFeed<E> {
    state: Mutex<FeedState<E>>,
}

#[derive(Debug)]
struct FeedState<E> {
    next_id: u64,
    subscribers: BTreeMap<u64, UnboundedSender<E>>,
    listening: bool,
}

impl<E> Default for ChangeFeed<E> {
    fn default() -> Self {
        Self {
            state: Mutex::new(FeedState {
                next_id: 0,
                subscribers: BTreeMap::new(),
                listening: false,
            }),
        }
    }
}

impl<E: Clone + Send + 'static> ChangeFeed<E> {
    /// Adds a subscriber that receives every later change.
    pub(crate) fn subscribe(self: &Arc<Self>) -> (Subscription, UnboundedReceiver<E>) {
        let (sender, receiver) = mpsc::unbounded();
        let mut state = self.lock();
        if !state.listening {
            state.listening = true;
            debug!("registered change listener");
        }
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, sender);
        trace!(id, subscribers = state.subscribers.len(), "subscribed to changes");
        let feed: Arc<dyn Unsubscribe> = self.clone();
        let subscription = Subscription { feed, id };
        (subscription, receiver)
    }

    /// Forwards a change to every live subscriber.
    pub(crate) fn publish(&self, change: E) {
        let mut state = self.lock();
        if !state.listening {
            return;
        }
        trace!(subscribers = state.subscribers.len(), "publishing change");
        state
            .subscribers
            .retain(|_, sender| sender.unbounded_send(change.clone()).is_ok());
    }

    pub(crate) fn listening(&self) -> bool {
        self.lock().listening
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, FeedState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<E: Clone + Send + 'static> Unsubscribe for ChangeFeed<E> {
    fn unsubscribe(&self, id: u64) {
        let mut state = self.lock();
        state.subscribers.remove(&id);
        trace!(id, subscribers = state.subscribers.len(), "unsubscribed from changes");
        if state.subscribers.is_empty() && state.listening {
            state.listening = false;
            debug!("released change listener");
        }
    }
}

/// Keeps one subscriber registered until dropped.
pub(crate) struct Subscription {
    feed: Arc<dyn Unsubscribe>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.feed.unsubscribe(self.id);
    }
}

/// A stream that holds its [`Subscription`] for as long as it is alive.
pub(crate) struct Watched<T> {
    stream: BoxStream<'static, T>,
    _subscription: Subscription,
}

impl<T> Watched<T> {
    pub(crate) fn new(stream: BoxStream<'static, T>, subscription: Subscription) -> Self {
        Self {
            stream,
            _subscription: subscription,
        }
    }
}

impl<T> Stream for Watched<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.stream.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}
