use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    error::AppError,
    models::MovieSummary,
    services::{aggregator::Aggregator, cancel, slot::{Slot, Ticket}},
};

/// Most movies a single seed term contributes to its category
pub const PER_TERM: usize = 4;
/// Most movies shown in one category row
pub const PER_CATEGORY: usize = 12;

const NO_MOVIES: &str = "No movies found.";

#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    pub terms: &'static [&'static str],
}

/// Home page rows, in display (and dispatch) order
pub const CATEGORIES: &[Category] = &[
    Category {
        name: "trending",
        terms: &["marvel", "batman", "star wars", "avengers"],
    },
    Category {
        name: "action",
        terms: &["action", "fast furious", "mission impossible", "john wick"],
    },
    Category {
        name: "comedy",
        terms: &["comedy", "funny", "laugh", "humor"],
    },
    Category {
        name: "drama",
        terms: &["drama", "oscar", "award", "story"],
    },
];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryState {
    pub movies: Vec<MovieSummary>,
    pub loading: bool,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRow {
    pub name: &'static str,
    #[serde(flatten)]
    pub state: CategoryState,
}

/// Loads every category through the aggregator
///
/// Category `i` is dispatched `i × stagger` after a refresh starts, and each
/// category is its own last-request-wins slot: a newer refresh cancels the
/// older load, including loads still waiting out their stagger delay.
pub struct CategoryBoard {
    aggregator: Arc<Aggregator>,
    stagger: Duration,
    slots: Vec<(Category, Arc<Slot<CategoryState>>)>,
}

impl CategoryBoard {
    pub fn new(aggregator: Arc<Aggregator>, stagger: Duration) -> Self {
        Self::with_categories(aggregator, stagger, CATEGORIES)
    }

    pub fn with_categories(aggregator: Arc<Aggregator>, stagger: Duration, categories: &[Category]) -> Self {
        let slots = categories
            .iter()
            .map(|category| (*category, Arc::new(Slot::new(CategoryState::default()))))
            .collect();

        Self {
            aggregator,
            stagger,
            slots,
        }
    }

    /// Starts a staggered load of every category, superseding any load in flight
    ///
    /// The returned handle resolves once every category has finished or been
    /// cancelled.
    pub fn refresh(&self) -> JoinHandle<()> {
        tracing::info!(
            categories = self.slots.len(),
            stagger_ms = self.stagger.as_millis() as u64,
            "Refreshing categories"
        );

        let tasks: Vec<JoinHandle<()>> = self
            .slots
            .iter()
            .enumerate()
            .map(|(index, (category, slot))| {
                let ticket = slot.begin();

                let mut loading = slot.snapshot();
                loading.loading = true;
                loading.error = None;
                slot.commit(&ticket, loading);

                tokio::spawn(load_category(
                    self.aggregator.clone(),
                    *category,
                    slot.clone(),
                    ticket,
                    self.stagger * index as u32,
                ))
            })
            .collect();

        tokio::spawn(async move {
            futures::future::join_all(tasks).await;
        })
    }

    /// Cancels every in-flight category load
    pub fn cancel(&self) {
        for (_, slot) in &self.slots {
            slot.cancel();
        }
    }

    pub fn snapshot(&self) -> Vec<CategoryRow> {
        self.slots
            .iter()
            .map(|(category, slot)| CategoryRow {
                name: category.name,
                state: slot.snapshot(),
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<CategoryState> {
        self.slots
            .iter()
            .find(|(category, _)| category.name == name)
            .map(|(_, slot)| slot.snapshot())
    }
}

async fn load_category(
    aggregator: Arc<Aggregator>,
    category: Category,
    slot: Arc<Slot<CategoryState>>,
    ticket: Ticket,
    delay: Duration,
) {
    let token = ticket.token();
    if !delay.is_zero() && !cancel::sleep(token, delay).await {
        tracing::debug!(category = category.name, "Category load cancelled before dispatch");
        return;
    }

    let mut seen = HashSet::new();
    let mut movies = Vec::new();

    for term in category.terms {
        if movies.len() >= PER_CATEGORY {
            break;
        }

        match aggregator.search(term, 1, token).await {
            Ok(page) => {
                for movie in page.results.into_iter().take(PER_TERM) {
                    if movies.len() >= PER_CATEGORY {
                        break;
                    }
                    if seen.insert(movie.id.clone()) {
                        movies.push(movie);
                    }
                }
            }
            Err(AppError::Cancelled) => return,
            Err(e) => {
                tracing::warn!(category = category.name, term = %term, error = %e, "Category term failed");
            }
        }

        if token.is_cancelled() {
            return;
        }
    }

    tracing::debug!(category = category.name, movies = movies.len(), "Category loaded");

    let error = movies.is_empty().then(|| NO_MOVIES.to_string());
    slot.commit(
        &ticket,
        CategoryState {
            movies,
            loading: false,
            error,
            updated_at: Some(Utc::now()),
        },
    );
}
