//! labelstat-test - Regression test helpers for labelstat
//!
//! This crate provides the regression test harness shared by the
//! `tests/*_reg.rs` files of the workspace, together with seeded synthetic
//! inputs and brute-force reference statistics.
//!
//! # Usage
//!
//! ```
//! use labelstat_test::RegParams;
//!
//! let mut rp = RegParams::new("cardinalities");
//! rp.compare_values(2.0, 2.0, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" (default) or "display"

mod error;
mod params;

pub mod generate;
pub mod reference;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};
