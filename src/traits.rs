//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the ledger and its reconciliation state
///
/// This trait allows the reconciliation core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// `apply_reconciliation` and `remove_reconciliation` must be atomic: either
/// every line of the group is updated or none is.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save an account to storage
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Get an account by ID
    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>>;

    /// List accounts of a company ordered by number
    async fn list_accounts(
        &self,
        company_id: &str,
        reconcilable_only: bool,
    ) -> LedgerResult<Vec<Account>>;

    /// Update an existing account
    async fn update_account(&mut self, account: &Account) -> LedgerResult<()>;

    /// Save or replace a fiscal year
    async fn save_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> LedgerResult<()>;

    async fn get_fiscal_year(&self, fiscal_year_id: &str) -> LedgerResult<Option<FiscalYear>>;

    /// List fiscal years of a company ordered by start date
    async fn list_fiscal_years(&self, company_id: &str) -> LedgerResult<Vec<FiscalYear>>;

    /// Save a new journal entry with its lines
    async fn save_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()>;

    /// Get a journal entry by ID
    async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>>;

    /// Replace the header and state of an existing entry; reconciliation
    /// fields of its lines are kept as stored
    async fn update_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()>;

    /// Delete a journal entry and its lines
    async fn delete_entry(&mut self, entry_id: &str) -> LedgerResult<()>;

    /// List entries of a company ordered by date
    async fn list_entries(&self, company_id: &str) -> LedgerResult<Vec<JournalEntry>>;

    /// Lines of validated entries booked on an account that are not yet
    /// reconciled, optionally restricted to a fiscal year, ordered by date,
    /// entry and line id
    async fn fetch_unreconciled_lines(
        &self,
        account_id: &str,
        fiscal_year: Option<&FiscalYear>,
    ) -> LedgerResult<Vec<LedgerLine>>;

    /// All lines of validated entries booked on an account, same ordering
    async fn fetch_account_lines(
        &self,
        account_id: &str,
        fiscal_year: Option<&FiscalYear>,
    ) -> LedgerResult<Vec<LedgerLine>>;

    /// Lines matching the given ids; unknown ids are silently skipped
    async fn get_lines(&self, line_ids: &[String]) -> LedgerResult<Vec<LedgerLine>>;

    /// Whether the entry owning a line is validated
    async fn is_line_validated(&self, line_id: &str) -> LedgerResult<bool>;

    /// Mark every line of the group reconciled under its code and record the
    /// group. Fails without touching anything if a line is missing or
    /// already reconciled, or if the code is already in use.
    async fn apply_reconciliation(&mut self, group: &ReconciliationGroup) -> LedgerResult<()>;

    async fn get_reconciliation(&self, code: &str) -> LedgerResult<Option<ReconciliationGroup>>;

    /// Clear the reconciliation fields of every line of a group and forget
    /// the group, returning it
    async fn remove_reconciliation(&mut self, code: &str) -> LedgerResult<ReconciliationGroup>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom journal entry validation rules
pub trait EntryValidator: Send + Sync {
    /// Validate an entry before saving
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        if account.id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account ID cannot be empty".to_string(),
            ));
        }

        if account.company_id.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account must belong to a company".to_string(),
            ));
        }

        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default entry validator with basic double-entry rules
pub struct DefaultEntryValidator;

impl EntryValidator for DefaultEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        entry.validate()
    }
}
