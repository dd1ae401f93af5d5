use parking_lot::Mutex;
use tokio::sync::watch;

use crate::services::cancel::RequestToken;

/// Handle for one logical request issued into a [`Slot`]
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    token: RequestToken,
}

impl Ticket {
    pub fn token(&self) -> &RequestToken {
        &self.token
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct SlotInner {
    generation: u64,
    token: Option<RequestToken>,
}

/// A piece of UI-visible state fed by a sequence of requests where the last
/// *request* wins, not the last response
///
/// `begin` cancels whatever request is in flight and hands out a new ticket.
/// `commit` publishes a value only while its ticket is still the current one
/// and uncancelled, so a superseded request that resolves late is dropped.
/// The check and the publish happen under one lock.
pub struct Slot<S> {
    inner: Mutex<SlotInner>,
    tx: watch::Sender<S>,
}

impl<S: Clone> Slot<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            inner: Mutex::new(SlotInner {
                generation: 0,
                token: None,
            }),
            tx,
        }
    }

    /// Starts a new request, cancelling the one in flight
    pub fn begin(&self) -> Ticket {
        let mut inner = self.inner.lock();
        if let Some(previous) = inner.token.take() {
            previous.cancel();
        }
        inner.generation += 1;
        let token = RequestToken::new();
        inner.token = Some(token.clone());

        Ticket {
            generation: inner.generation,
            token,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        let inner = self.inner.lock();
        inner.generation == ticket.generation && !ticket.token.is_cancelled()
    }

    /// Publishes `value` if `ticket` is still current; returns whether it was applied
    pub fn commit(&self, ticket: &Ticket, value: S) -> bool {
        let inner = self.inner.lock();
        if inner.generation != ticket.generation || ticket.token.is_cancelled() {
            tracing::debug!(
                ticket = ticket.generation,
                current = inner.generation,
                "Discarding superseded result"
            );
            return false;
        }
        self.tx.send_replace(value);
        true
    }

    /// Cancels the in-flight request without publishing anything
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if let Some(token) = inner.token.take() {
            token.cancel();
        }
        inner.generation += 1;
    }

    /// Cancels the in-flight request and publishes `value`
    pub fn reset(&self, value: S) {
        let mut inner = self.inner.lock();
        if let Some(token) = inner.token.take() {
            token.cancel();
        }
        inner.generation += 1;
        self.tx.send_replace(value);
    }

    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }
}
