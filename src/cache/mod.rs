pub mod store;

mod macros;

pub use store::CacheKey;
pub use store::ResponseCache;
