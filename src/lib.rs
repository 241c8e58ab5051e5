//! # Lettrage Core
//!
//! Reconciliation (lettrage) of SYSCOHADA ledger lines: automatic pairing of
//! debits and credits that settle each other, manual lettrage, and the
//! journal posting that produces the lines in the first place.
//!
//! ## Features
//!
//! - **Ledger**: accounts with SYSCOHADA numbering, fiscal years, journal
//!   entries recorded as drafts and validated (posted)
//! - **Automatic lettrage**: greedy pair matching within an absolute
//!   tolerance, per account or company-wide, with run statistics
//! - **Manual lettrage**: letter any set of open lines of one account
//! - **Délettrage**: undo a lettrage by code
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use lettrage_core::{AutomaticReconciliationRequest, Ledger, MatchingAlgorithm};
//! use lettrage_core::utils::MemoryStorage;
//!
//! // let mut ledger = Ledger::new(MemoryStorage::new());
//! // ledger.setup_standard_chart_of_accounts("acme").await?;
//! // ... post invoices and payments ...
//! // let report = ledger
//! //     .process_automatic_reconciliation(
//! //         &AutomaticReconciliationRequest::for_company("acme")
//! //             .algorithm(MatchingAlgorithm::Cascade),
//! //     )
//! //     .await?;
//! ```

pub mod ledger;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use ledger::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;

// Re-export entry patterns for convenience
pub use ledger::journal::patterns;
