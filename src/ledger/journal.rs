//! Journal entry recording and posting

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;

/// Journal manager for recording and validating entries
pub struct JournalManager<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn EntryValidator>,
}

impl<S: LedgerStorage> JournalManager<S> {
    /// Create a new journal manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultEntryValidator),
        }
    }

    /// Create a new journal manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn EntryValidator>) -> Self {
        Self { storage, validator }
    }

    /// Record an entry as a draft
    pub async fn record_entry(&mut self, mut entry: JournalEntry) -> LedgerResult<JournalEntry> {
        self.validator.validate_entry(&entry)?;

        // Verify all referenced accounts exist in the entry's company
        for line in &entry.lines {
            match self.storage.get_account(&line.account_id).await? {
                Some(account) if account.company_id == entry.company_id => {}
                _ => return Err(LedgerError::AccountNotFound(line.account_id.clone())),
            }
        }

        // Lines start open, whatever the caller put in them
        entry.state = EntryState::Draft;
        entry.validated_at = None;
        for line in &mut entry.lines {
            line.clear_reconciliation();
        }

        self.storage.save_entry(&entry).await?;
        Ok(entry)
    }

    /// Get an entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        self.storage.get_entry(entry_id).await
    }

    /// Get an entry by ID, returning an error if not found
    pub async fn get_entry_required(&self, entry_id: &str) -> LedgerResult<JournalEntry> {
        self.storage
            .get_entry(entry_id)
            .await?
            .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))
    }

    /// Entries of a company ordered by date
    pub async fn list_entries(&self, company_id: &str) -> LedgerResult<Vec<JournalEntry>> {
        self.storage.list_entries(company_id).await
    }

    /// Post a draft entry; its lines become part of the ledger and eligible
    /// for lettrage
    pub async fn validate_entry(&mut self, entry_id: &str) -> LedgerResult<JournalEntry> {
        let mut entry = self.get_entry_required(entry_id).await?;

        if entry.is_validated() {
            return Err(LedgerError::Validation(format!(
                "Journal entry '{}' is already validated",
                entry_id
            )));
        }

        let years = self.storage.list_fiscal_years(&entry.company_id).await?;
        if let Some(closed) = years
            .iter()
            .find(|fy| fy.is_closed && fy.contains(entry.date))
        {
            return Err(LedgerError::Validation(format!(
                "Journal entry '{}' falls in closed fiscal year '{}'",
                entry_id, closed.name
            )));
        }

        self.validator.validate_entry(&entry)?;

        entry.state = EntryState::Validated;
        entry.validated_at = Some(chrono::Utc::now().naive_utc());
        self.storage.update_entry(&entry).await?;
        Ok(entry)
    }

    /// Delete a draft entry; validated entries are immutable
    pub async fn delete_entry(&mut self, entry_id: &str) -> LedgerResult<()> {
        let entry = self.get_entry_required(entry_id).await?;
        if entry.is_validated() {
            return Err(LedgerError::Validation(format!(
                "Journal entry '{}' is validated and cannot be deleted",
                entry_id
            )));
        }
        self.storage.delete_entry(entry_id).await
    }
}

/// Builder for journal entries
#[derive(Debug)]
pub struct JournalEntryBuilder {
    entry: JournalEntry,
}

impl JournalEntryBuilder {
    /// Create a new entry builder
    pub fn new(
        id: String,
        company_id: String,
        journal_code: String,
        date: NaiveDate,
        description: String,
    ) -> Self {
        Self {
            entry: JournalEntry::new(id, company_id, journal_code, date, description, None),
        }
    }

    /// Set the reference for the entry
    pub fn reference(mut self, reference: String) -> Self {
        self.entry.reference = Some(reference);
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account_id: String, label: String, amount: BigDecimal) -> Self {
        self.entry.add_debit(account_id, label, amount);
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_id: String, label: String, amount: BigDecimal) -> Self {
        self.entry.add_credit(account_id, label, amount);
        self
    }

    /// Build the entry
    pub fn build(self) -> LedgerResult<JournalEntry> {
        self.entry.validate()?;
        Ok(self.entry)
    }
}

/// Parameters shared by the third-party entry patterns
pub struct ThirdPartyEntryParams {
    pub id: String,
    pub company_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub reference: Option<String>,
    /// Customer or supplier account
    pub third_party_account_id: String,
    /// Revenue, expense or treasury account on the other side
    pub counterpart_account_id: String,
    pub amount: BigDecimal,
}

/// Common entry patterns producing lines on third-party accounts
pub mod patterns {
    use super::*;

    fn builder(params: &ThirdPartyEntryParams, journal_code: &str) -> JournalEntryBuilder {
        let builder = JournalEntryBuilder::new(
            params.id.clone(),
            params.company_id.clone(),
            journal_code.to_string(),
            params.date,
            params.description.clone(),
        );
        match &params.reference {
            Some(reference) => builder.reference(reference.clone()),
            None => builder,
        }
    }

    /// Customer invoice (debit customer, credit sales) in the sales journal
    pub fn customer_invoice(params: ThirdPartyEntryParams) -> LedgerResult<JournalEntry> {
        builder(&params, "VT")
            .debit(
                params.third_party_account_id,
                params.description.clone(),
                params.amount.clone(),
            )
            .credit(params.counterpart_account_id, params.description, params.amount)
            .build()
    }

    /// Customer receipt (debit bank, credit customer) in the bank journal
    pub fn customer_receipt(params: ThirdPartyEntryParams) -> LedgerResult<JournalEntry> {
        builder(&params, "BQ")
            .debit(
                params.counterpart_account_id,
                params.description.clone(),
                params.amount.clone(),
            )
            .credit(params.third_party_account_id, params.description, params.amount)
            .build()
    }

    /// Supplier invoice (debit purchases, credit supplier) in the purchases journal
    pub fn supplier_invoice(params: ThirdPartyEntryParams) -> LedgerResult<JournalEntry> {
        builder(&params, "ACH")
            .debit(
                params.counterpart_account_id,
                params.description.clone(),
                params.amount.clone(),
            )
            .credit(params.third_party_account_id, params.description, params.amount)
            .build()
    }

    /// Supplier payment (debit supplier, credit bank) in the bank journal
    pub fn supplier_payment(params: ThirdPartyEntryParams) -> LedgerResult<JournalEntry> {
        builder(&params, "BQ")
            .debit(
                params.third_party_account_id,
                params.description.clone(),
                params.amount.clone(),
            )
            .credit(params.counterpart_account_id, params.description, params.amount)
            .build()
    }
}
