//! WebDriver layer for the rendered-page search backend.
//!
//! Everything that makes an automated session look like a person browsing
//! lives here, so the search adapter above it stays a plain "fetch this URL,
//! give me the HTML" call.
//!
//! - [`driver::StealthDriver`]: WebDriver client wrapper
//! - [`behavioral::BehavioralEngine`]: human-like random pacing
//! - [`fingerprint`]: user agent / viewport / locale profiles
//! - [`stealth`]: Chrome argument shaping and JS evasions
pub mod behavioral;
pub mod driver;
pub mod fingerprint;
pub mod stealth;
