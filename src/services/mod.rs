pub mod aggregator;
pub mod cancel;
pub mod categories;
pub mod keys;
pub mod providers;
pub mod search_session;
pub mod slot;

#[cfg(test)]
pub(crate) mod testing;
