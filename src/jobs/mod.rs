//! Background jobs.
//!
//! - **Catalog Refresh**: periodically reloads the model registry once it has
//!   expired, so long-running processes never serve stale data for longer than
//!   one interval.
//!
//! Jobs follow a consistent pattern:
//! 1. Configuration section with `enabled` and `interval_secs`
//! 2. Worker function that runs in a loop with the configured interval
//! 3. Run function that performs a single pass
//! 4. Structured result type for logging
//!
//! # Example
//!
//! ```toml
//! [refresh]
//! enabled = true
//! interval_secs = 900
//! ```

mod catalog_refresh;

pub use catalog_refresh::{RefreshRunResult, run_refresh, start_catalog_refresh_worker};
