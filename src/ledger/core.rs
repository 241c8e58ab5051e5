//! Main ledger orchestrator that coordinates accounts, journals and lettrage

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::HashMap;

use crate::ledger::{AccountManager, JournalManager};
use crate::reconciliation::*;
use crate::traits::*;
use crate::types::*;

/// Main ledger system that orchestrates all accounting operations
pub struct Ledger<S: LedgerStorage, C: ReconciliationClock = SystemClock> {
    account_manager: AccountManager<S>,
    journal_manager: JournalManager<S>,
    reconciliation: ReconciliationService<S, C>,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend
    pub fn new(storage: S) -> Self {
        Self {
            account_manager: AccountManager::new(storage.clone()),
            journal_manager: JournalManager::new(storage.clone()),
            reconciliation: ReconciliationService::new(storage),
        }
    }

    /// Create a new ledger with custom validators
    pub fn with_validators(
        storage: S,
        account_validator: Box<dyn AccountValidator>,
        entry_validator: Box<dyn EntryValidator>,
    ) -> Self {
        Self {
            account_manager: AccountManager::with_validator(storage.clone(), account_validator),
            journal_manager: JournalManager::with_validator(storage.clone(), entry_validator),
            reconciliation: ReconciliationService::new(storage),
        }
    }
}

impl<S: LedgerStorage + Clone, C: ReconciliationClock> Ledger<S, C> {
    /// Create a new ledger with an explicit lettrage clock and configuration
    pub fn with_reconciliation(
        storage: S,
        clock: C,
        config: ReconciliationConfig,
    ) -> LedgerResult<Self> {
        Ok(Self {
            account_manager: AccountManager::new(storage.clone()),
            journal_manager: JournalManager::new(storage.clone()),
            reconciliation: ReconciliationService::with_clock(storage, clock, config)?,
        })
    }

    // Account operations
    /// Create a new account
    pub async fn create_account(
        &mut self,
        id: String,
        company_id: String,
        number: String,
        name: String,
    ) -> LedgerResult<Account> {
        self.account_manager
            .create_account(id, company_id, number, name)
            .await
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.account_manager.get_account(account_id).await
    }

    /// List the accounts of a company
    pub async fn list_accounts(&self, company_id: &str) -> LedgerResult<Vec<Account>> {
        self.account_manager.list_accounts(company_id).await
    }

    /// Turn lettrage on or off for an account
    pub async fn set_reconcilable(
        &mut self,
        account_id: &str,
        is_reconcilable: bool,
    ) -> LedgerResult<Account> {
        self.account_manager
            .set_reconcilable(account_id, is_reconcilable)
            .await
    }

    /// Setup the SYSCOHADA starter chart for a company
    pub async fn setup_standard_chart_of_accounts(
        &mut self,
        company_id: &str,
    ) -> LedgerResult<HashMap<String, Account>> {
        crate::ledger::account::utils::create_standard_chart(&mut self.account_manager, company_id)
            .await
    }

    // Fiscal year operations
    pub async fn create_fiscal_year(
        &mut self,
        id: String,
        company_id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<FiscalYear> {
        self.account_manager
            .create_fiscal_year(id, company_id, name, start_date, end_date)
            .await
    }

    pub async fn close_fiscal_year(&mut self, fiscal_year_id: &str) -> LedgerResult<FiscalYear> {
        self.account_manager.close_fiscal_year(fiscal_year_id).await
    }

    // Journal operations
    /// Record a new entry as a draft
    pub async fn record_entry(&mut self, entry: JournalEntry) -> LedgerResult<JournalEntry> {
        self.journal_manager.record_entry(entry).await
    }

    /// Validate (post) a draft entry
    pub async fn validate_entry(&mut self, entry_id: &str) -> LedgerResult<JournalEntry> {
        self.journal_manager.validate_entry(entry_id).await
    }

    /// Record and validate an entry in one go
    pub async fn post_entry(&mut self, entry: JournalEntry) -> LedgerResult<JournalEntry> {
        let recorded = self.journal_manager.record_entry(entry).await?;
        self.journal_manager.validate_entry(&recorded.id).await
    }

    /// Get an entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.journal_manager.get_entry(entry_id).await
    }

    /// Delete a draft entry
    pub async fn delete_entry(&mut self, entry_id: &str) -> LedgerResult<()> {
        self.journal_manager.delete_entry(entry_id).await
    }

    // Balances
    /// Debit minus credit of the validated lines of an account
    pub async fn get_account_balance(
        &self,
        account_id: &str,
        fiscal_year_id: Option<&str>,
    ) -> LedgerResult<BigDecimal> {
        self.account_manager.get_account_required(account_id).await?;
        let fiscal_year = match fiscal_year_id {
            Some(id) => Some(self.account_manager.get_fiscal_year_required(id).await?),
            None => None,
        };

        let lines = self
            .account_manager
            .storage
            .fetch_account_lines(account_id, fiscal_year.as_ref())
            .await?;
        Ok(lines.iter().map(LedgerLine::signed_amount).sum())
    }

    /// Open (unreconciled) validated lines of an account
    pub async fn get_open_items(&self, account_id: &str) -> LedgerResult<Vec<LedgerLine>> {
        self.account_manager.get_account_required(account_id).await?;
        self.account_manager
            .storage
            .fetch_unreconciled_lines(account_id, None)
            .await
    }

    // Lettrage
    /// Run automatic lettrage over the requested scope
    pub async fn process_automatic_reconciliation(
        &mut self,
        request: &AutomaticReconciliationRequest,
    ) -> LedgerResult<AutomaticReconciliationReport> {
        self.reconciliation
            .process_automatic_reconciliation(request)
            .await
    }

    /// Letter an explicit set of lines
    pub async fn manual_reconcile(
        &mut self,
        line_ids: &[String],
        user: &str,
    ) -> LedgerResult<ManualReconciliationResult> {
        self.reconciliation.manual_reconcile(line_ids, user).await
    }

    /// Undo a lettrage
    pub async fn unreconcile(&mut self, code: &str) -> LedgerResult<ReconciliationGroup> {
        self.reconciliation.unreconcile(code).await
    }

    pub async fn get_reconciliation(&self, code: &str) -> LedgerResult<ReconciliationGroup> {
        self.reconciliation.get_reconciliation(code).await
    }

    /// Reconciled versus open lines of an account
    pub async fn reconciliation_summary(
        &self,
        account_id: &str,
    ) -> LedgerResult<AccountReconciliationSummary> {
        self.reconciliation.account_summary(account_id, None).await
    }

    pub fn reconciliation_config(&self) -> &ReconciliationConfig {
        self.reconciliation.config()
    }
}
