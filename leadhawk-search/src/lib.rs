//! Search side of the pipeline: query generation, the backend seam, and
//! noise filtering.
//!
//! - [`keywords`]: location × service cross-product plus manual phrases
//! - [`backend`]: the [`backend::SearchBackend`] trait both adapters implement
//! - [`api`]: structured web-search API adapter
//! - [`rendered`]: stealth-browser adapter for the HTML results page
//! - [`filter`]: block-word suppression
//!
//! The orchestrator is backend-agnostic: only the adapter behind
//! [`backend::SearchBackend`] differs between a fast rate-limited API and a
//! slow rendered page.

pub mod api;
pub mod backend;
pub mod filter;
pub mod keywords;
pub mod rendered;
pub mod types;

pub use backend::{SearchBackend, SearchError};
pub use types::{Candidate, Query, RawResult};
