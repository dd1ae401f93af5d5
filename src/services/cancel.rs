//! Cooperative cancellation helpers shared by every provider client and the
//! UI-facing slots.
//!
//! A [`RequestToken`] means "this logical request is still wanted". Provider
//! calls race their network future against a [`LinkedToken`] that fires as
//! soon as either the caller's token or an internal [`Deadline`] fires.

use futures::future::select_all;
use std::future::Future;
use std::ops::Deref;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};

pub type RequestToken = CancellationToken;

/// A token cancelled when any of its sources is cancelled
///
/// Dropping the `LinkedToken` cancels it, which also stops the background
/// watcher that links it to its sources.
pub struct LinkedToken {
    token: CancellationToken,
    _guard: DropGuard,
}

impl Deref for LinkedToken {
    type Target = CancellationToken;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

/// Combines N tokens, first to fire wins
pub fn any_of(sources: &[CancellationToken]) -> LinkedToken {
    let token = CancellationToken::new();
    let linked = LinkedToken {
        token: token.clone(),
        _guard: token.clone().drop_guard(),
    };

    if sources.iter().any(CancellationToken::is_cancelled) {
        token.cancel();
        return linked;
    }
    if sources.is_empty() {
        return linked;
    }

    let watchers: Vec<_> = sources
        .iter()
        .map(|source| Box::pin(source.clone().cancelled_owned()))
        .collect();

    tokio::spawn(async move {
        tokio::select! {
            _ = select_all(watchers) => token.cancel(),
            _ = token.cancelled() => {}
        }
    });

    linked
}

/// A token that fires once `after` has elapsed
pub struct Deadline {
    token: CancellationToken,
    _guard: DropGuard,
}

impl Deadline {
    pub fn after(after: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => timer.cancel(),
                _ = timer.cancelled() => {}
            }
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Runs `fut` until it completes or `token` fires, whichever comes first
///
/// Returns `None` if the token fired first. An already-cancelled token never
/// polls the future.
pub async fn guarded<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

/// Sleeps for `duration` unless `token` fires first; returns `true` if the full
/// duration elapsed
pub async fn sleep(token: &CancellationToken, duration: Duration) -> bool {
    guarded(token, tokio::time::sleep(duration)).await.is_some()
}
