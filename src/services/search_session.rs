use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{
    error::AppError,
    models::SearchPage,
    services::{aggregator::Aggregator, cancel, slot::Slot},
};

/// Observable state of one search box
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SearchState {
    Idle,
    Typing { query: String },
    Searching { query: String },
    Results { query: String, page: SearchPage },
    Error { query: String, message: String },
}

/// Debounced search box: `Idle → Typing → Searching → Results | Error`
///
/// Every keystroke supersedes the previous request: its token is cancelled and
/// the debounce timer restarts. Results from a superseded or cancelled request
/// are never published. Closing (or dropping) the session cancels whatever is
/// still outstanding.
pub struct SearchSession {
    aggregator: Arc<Aggregator>,
    slot: Arc<Slot<SearchState>>,
    debounce: Duration,
}

impl SearchSession {
    pub fn new(aggregator: Arc<Aggregator>, debounce: Duration) -> Self {
        Self {
            aggregator,
            slot: Arc::new(Slot::new(SearchState::Idle)),
            debounce,
        }
    }

    /// Feeds the current contents of the search box
    ///
    /// Returns the handle of the debounced search task, or `None` when the
    /// input is blank and the session went back to `Idle`.
    pub fn input(&self, query: &str) -> Option<JoinHandle<()>> {
        let ticket = self.slot.begin();
        let query = query.trim().to_string();

        if query.is_empty() {
            self.slot.commit(&ticket, SearchState::Idle);
            return None;
        }

        self.slot.commit(&ticket, SearchState::Typing { query: query.clone() });

        let slot = self.slot.clone();
        let aggregator = self.aggregator.clone();
        let debounce = self.debounce;

        Some(tokio::spawn(async move {
            if !cancel::sleep(ticket.token(), debounce).await {
                return;
            }
            if !slot.commit(&ticket, SearchState::Searching { query: query.clone() }) {
                return;
            }

            let next = match aggregator.search(&query, 1, ticket.token()).await {
                Ok(page) => SearchState::Results { query, page },
                Err(AppError::Cancelled) => return,
                Err(e) => SearchState::Error {
                    query,
                    message: e.to_string(),
                },
            };
            slot.commit(&ticket, next);
        }))
    }

    /// Cancels any outstanding search and returns to `Idle`
    pub fn clear(&self) {
        self.slot.reset(SearchState::Idle);
    }

    /// Cancels any outstanding search, leaving the visible state untouched
    pub fn close(&self) {
        self.slot.cancel();
    }

    pub fn state(&self) -> SearchState {
        self.slot.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.slot.subscribe()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.slot.cancel();
    }
}
