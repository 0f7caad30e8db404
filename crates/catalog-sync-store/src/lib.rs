mod schema;
mod store;

pub use store::{ExecutionRecord, ExecutionStore, STALE_THRESHOLD_DAYS, StoreError, SyncStatus};
