//! Account and fiscal year management

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::traits::*;
use crate::types::*;

/// Account manager for handling chart of accounts operations
pub struct AccountManager<S: LedgerStorage> {
    pub(crate) storage: S,
    validator: Box<dyn AccountValidator>,
}

impl<S: LedgerStorage> AccountManager<S> {
    /// Create a new account manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultAccountValidator),
        }
    }

    /// Create a new account manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn AccountValidator>) -> Self {
        Self { storage, validator }
    }

    /// Create a new account
    pub async fn create_account(
        &mut self,
        id: String,
        company_id: String,
        number: String,
        name: String,
    ) -> LedgerResult<Account> {
        let account = Account::new(id, company_id, number, name);

        self.validator.validate_account(&account)?;

        if self.storage.get_account(&account.id).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Account with ID '{}' already exists",
                account.id
            )));
        }

        let company_accounts = self.storage.list_accounts(&account.company_id, false).await?;
        if company_accounts.iter().any(|a| a.number == account.number) {
            return Err(LedgerError::Validation(format!(
                "Account number '{}' is already used in company '{}'",
                account.number, account.company_id
            )));
        }

        self.storage.save_account(&account).await?;

        Ok(account)
    }

    /// Get an account by ID
    pub async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        self.storage.get_account(account_id).await
    }

    /// Get an account by ID, returning an error if not found
    pub async fn get_account_required(&self, account_id: &str) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// List the accounts of a company
    pub async fn list_accounts(&self, company_id: &str) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(company_id, false).await
    }

    /// List the accounts of a company that take part in lettrage
    pub async fn list_reconcilable_accounts(&self, company_id: &str) -> LedgerResult<Vec<Account>> {
        self.storage.list_accounts(company_id, true).await
    }

    /// Turn lettrage on or off for an account
    pub async fn set_reconcilable(
        &mut self,
        account_id: &str,
        is_reconcilable: bool,
    ) -> LedgerResult<Account> {
        let mut account = self.get_account_required(account_id).await?;
        account.is_reconcilable = is_reconcilable;
        account.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_account(&account).await?;
        Ok(account)
    }

    /// Create a fiscal year for a company
    pub async fn create_fiscal_year(
        &mut self,
        id: String,
        company_id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> LedgerResult<FiscalYear> {
        if start_date > end_date {
            return Err(LedgerError::Validation(format!(
                "Fiscal year '{}' ends before it starts",
                name
            )));
        }

        if self.storage.get_fiscal_year(&id).await?.is_some() {
            return Err(LedgerError::Validation(format!(
                "Fiscal year with ID '{}' already exists",
                id
            )));
        }

        let overlapping = self
            .storage
            .list_fiscal_years(&company_id)
            .await?
            .into_iter()
            .find(|fy| fy.start_date <= end_date && start_date <= fy.end_date);
        if let Some(existing) = overlapping {
            return Err(LedgerError::Validation(format!(
                "Fiscal year '{}' overlaps '{}'",
                name, existing.name
            )));
        }

        let fiscal_year = FiscalYear::new(id, company_id, name, start_date, end_date);
        self.storage.save_fiscal_year(&fiscal_year).await?;
        Ok(fiscal_year)
    }

    pub async fn get_fiscal_year_required(&self, fiscal_year_id: &str) -> LedgerResult<FiscalYear> {
        self.storage
            .get_fiscal_year(fiscal_year_id)
            .await?
            .ok_or_else(|| LedgerError::FiscalYearNotFound(fiscal_year_id.to_string()))
    }

    /// Close a fiscal year; entries dated within it can no longer be validated
    pub async fn close_fiscal_year(&mut self, fiscal_year_id: &str) -> LedgerResult<FiscalYear> {
        let mut fiscal_year = self.get_fiscal_year_required(fiscal_year_id).await?;
        fiscal_year.is_closed = true;
        self.storage.save_fiscal_year(&fiscal_year).await?;
        Ok(fiscal_year)
    }
}

/// Utility functions for working with accounts
pub mod utils {
    use super::*;

    /// Create a SYSCOHADA starter chart for a company.
    ///
    /// Account ids are `<company>-<number>`; the returned map is keyed by a
    /// short name (`"customers"`, `"bank"`, ...).
    pub async fn create_standard_chart<S: LedgerStorage>(
        account_manager: &mut AccountManager<S>,
        company_id: &str,
    ) -> LedgerResult<HashMap<String, Account>> {
        let chart = [
            ("capital", "101000", "Capital social"),
            ("suppliers", "401100", "Fournisseurs"),
            ("customers", "411100", "Clients"),
            ("staff", "422000", "Personnel, rémunérations dues"),
            ("vat_collected", "443100", "TVA facturée sur ventes"),
            ("vat_deductible", "445200", "TVA récupérable sur achats"),
            ("bank", "521000", "Banques locales"),
            ("cash", "571000", "Caisse"),
            ("purchases", "601100", "Achats de marchandises"),
            ("services", "622000", "Locations et charges locatives"),
            ("sales", "701100", "Ventes de marchandises"),
            ("service_revenue", "706000", "Services vendus"),
        ];

        let mut accounts = HashMap::new();
        for (key, number, name) in chart {
            let account = account_manager
                .create_account(
                    format!("{}-{}", company_id, number),
                    company_id.to_string(),
                    number.to_string(),
                    name.to_string(),
                )
                .await?;
            accounts.insert(key.to_string(), account);
        }

        Ok(accounts)
    }
}
