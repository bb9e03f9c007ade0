//! End-to-end tests that drive the full load path from configuration.

mod catalog_e2e;
