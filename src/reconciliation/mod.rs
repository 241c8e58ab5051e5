//! Lettrage: linking ledger lines that settle each other
//!
//! Automatic lettrage pairs a debit and a credit of the same reconcilable
//! account whose amounts cancel within the configured tolerance; manual
//! lettrage letters any user-selected set of open lines of one account.
//! Every group is written atomically under a fresh code and can be undone.

pub mod clock;
pub mod config;
pub mod engine;
pub mod manual;
pub mod matcher;

pub use clock::*;
pub use config::*;
pub use engine::*;
pub use manual::*;
pub use matcher::*;
