//! Core types and data structures for the ledger and its reconciliation

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// SYSCOHADA account classes, given by the first digit of the account number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountClass {
    /// Class 1 - capital and long-term resources
    Capital,
    /// Class 2 - fixed assets
    FixedAssets,
    /// Class 3 - inventories
    Inventories,
    /// Class 4 - third parties (customers, suppliers, staff, state...)
    ThirdParties,
    /// Class 5 - treasury (banks, cash)
    Treasury,
    /// Class 6 - ordinary expenses
    Expenses,
    /// Class 7 - ordinary income
    Income,
    /// Class 8 - other expenses and income (HAO)
    OtherExpensesAndIncome,
    /// Class 9 - analytical accounting
    Analytical,
}

impl AccountClass {
    /// Resolve the class from an account number
    pub fn from_number(number: &str) -> Option<Self> {
        match number.chars().next()? {
            '1' => Some(AccountClass::Capital),
            '2' => Some(AccountClass::FixedAssets),
            '3' => Some(AccountClass::Inventories),
            '4' => Some(AccountClass::ThirdParties),
            '5' => Some(AccountClass::Treasury),
            '6' => Some(AccountClass::Expenses),
            '7' => Some(AccountClass::Income),
            '8' => Some(AccountClass::OtherExpensesAndIncome),
            '9' => Some(AccountClass::Analytical),
            _ => None,
        }
    }
}

/// Whether an account number is reconcilable unless told otherwise.
///
/// Third-party accounts (40 to 47) carry open items that get settled later,
/// so they are the ones lettrage is run against.
pub fn is_reconcilable_by_default(number: &str) -> bool {
    let prefix: String = number.chars().take(2).collect();
    matches!(
        prefix.as_str(),
        "40" | "41" | "42" | "43" | "44" | "45" | "46" | "47"
    )
}

/// Ledger account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for the account
    pub id: String,
    /// Company owning the account
    pub company_id: String,
    /// SYSCOHADA account number (e.g. "411100")
    pub number: String,
    /// Human-readable account name
    pub name: String,
    /// Whether lines on this account take part in lettrage
    pub is_reconcilable: bool,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account; the reconcilable flag follows the account number
    pub fn new(id: String, company_id: String, number: String, name: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let is_reconcilable = is_reconcilable_by_default(&number);
        Self {
            id,
            company_id,
            number,
            name,
            is_reconcilable,
            created_at: now,
            updated_at: now,
        }
    }

    /// Account class derived from the number
    pub fn class(&self) -> Option<AccountClass> {
        AccountClass::from_number(&self.number)
    }
}

/// Fiscal year of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalYear {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Closed years accept no further validated entries
    pub is_closed: bool,
}

impl FiscalYear {
    pub fn new(
        id: String,
        company_id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            company_id,
            name,
            start_date,
            end_date,
            is_closed: false,
        }
    }

    /// Check whether a date falls within the fiscal year (bounds included)
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}

/// Posting state of a journal entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    /// Recorded but not posted; lines are not eligible for lettrage
    Draft,
    /// Posted; lines are part of the ledger
    Validated,
}

/// One line of a journal entry, booked against a single account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub id: String,
    /// Journal entry the line belongs to
    pub entry_id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub label: String,
    pub debit_amount: BigDecimal,
    pub credit_amount: BigDecimal,
    /// Lettrage code shared by every line of the same reconciliation group
    pub reconciliation_code: Option<String>,
    pub is_reconciled: bool,
    pub reconciliation_date: Option<NaiveDate>,
}

impl LedgerLine {
    fn new(
        id: String,
        entry_id: String,
        account_id: String,
        date: NaiveDate,
        label: String,
        debit_amount: BigDecimal,
        credit_amount: BigDecimal,
    ) -> Self {
        Self {
            id,
            entry_id,
            account_id,
            date,
            label,
            debit_amount,
            credit_amount,
            reconciliation_code: None,
            is_reconciled: false,
            reconciliation_date: None,
        }
    }

    /// Create a debit line
    pub fn debit(
        id: String,
        entry_id: String,
        account_id: String,
        date: NaiveDate,
        label: String,
        amount: BigDecimal,
    ) -> Self {
        Self::new(id, entry_id, account_id, date, label, amount, BigDecimal::from(0))
    }

    /// Create a credit line
    pub fn credit(
        id: String,
        entry_id: String,
        account_id: String,
        date: NaiveDate,
        label: String,
        amount: BigDecimal,
    ) -> Self {
        Self::new(id, entry_id, account_id, date, label, BigDecimal::from(0), amount)
    }

    /// Debit minus credit
    pub fn signed_amount(&self) -> BigDecimal {
        &self.debit_amount - &self.credit_amount
    }

    /// Check the one-sided amount invariant
    pub fn validate(&self) -> LedgerResult<()> {
        let zero = BigDecimal::from(0);
        if self.debit_amount < zero || self.credit_amount < zero {
            return Err(LedgerError::InvalidEntry(format!(
                "Line '{}' has a negative amount",
                self.id
            )));
        }

        match (self.debit_amount > zero, self.credit_amount > zero) {
            (true, false) | (false, true) => Ok(()),
            (true, true) => Err(LedgerError::InvalidEntry(format!(
                "Line '{}' cannot be both debit and credit",
                self.id
            ))),
            (false, false) => Err(LedgerError::InvalidEntry(format!(
                "Line '{}' must carry a non-zero amount",
                self.id
            ))),
        }
    }

    pub(crate) fn mark_reconciled(&mut self, code: &str, date: NaiveDate) {
        self.reconciliation_code = Some(code.to_string());
        self.is_reconciled = true;
        self.reconciliation_date = Some(date);
    }

    pub(crate) fn clear_reconciliation(&mut self) {
        self.reconciliation_code = None;
        self.is_reconciled = false;
        self.reconciliation_date = None;
    }
}

/// Journal entry made of balanced ledger lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub company_id: String,
    /// Journal the entry is booked in (e.g. "VT" for sales, "BQ" for bank)
    pub journal_code: String,
    pub date: NaiveDate,
    pub description: String,
    /// Optional reference number (invoice number, check number, etc.)
    pub reference: Option<String>,
    pub state: EntryState,
    pub lines: Vec<LedgerLine>,
    pub created_at: NaiveDateTime,
    pub validated_at: Option<NaiveDateTime>,
}

impl JournalEntry {
    /// Create a new draft entry without lines
    pub fn new(
        id: String,
        company_id: String,
        journal_code: String,
        date: NaiveDate,
        description: String,
        reference: Option<String>,
    ) -> Self {
        Self {
            id,
            company_id,
            journal_code,
            date,
            description,
            reference,
            state: EntryState::Draft,
            lines: Vec::new(),
            created_at: chrono::Utc::now().naive_utc(),
            validated_at: None,
        }
    }

    /// Id given to the n-th line of this entry
    pub fn line_id(&self, position: usize) -> String {
        format!("{}-L{}", self.id, position + 1)
    }

    /// Add a debit line dated with the entry
    pub fn add_debit(&mut self, account_id: String, label: String, amount: BigDecimal) {
        let line = LedgerLine::debit(
            self.line_id(self.lines.len()),
            self.id.clone(),
            account_id,
            self.date,
            label,
            amount,
        );
        self.lines.push(line);
    }

    /// Add a credit line dated with the entry
    pub fn add_credit(&mut self, account_id: String, label: String, amount: BigDecimal) {
        let line = LedgerLine::credit(
            self.line_id(self.lines.len()),
            self.id.clone(),
            account_id,
            self.date,
            label,
            amount,
        );
        self.lines.push(line);
    }

    /// Calculate total debits
    pub fn total_debits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit_amount).sum()
    }

    /// Calculate total credits
    pub fn total_credits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit_amount).sum()
    }

    /// Check if the entry is balanced (debits = credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    pub fn is_validated(&self) -> bool {
        self.state == EntryState::Validated
    }

    /// Validate the double-entry rules of the entry
    pub fn validate(&self) -> LedgerResult<()> {
        if self.lines.len() < 2 {
            return Err(LedgerError::InvalidEntry(
                "Journal entry must have at least two lines for double-entry bookkeeping"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for line in &self.lines {
            line.validate()?;
            if !seen.insert(line.id.as_str()) {
                return Err(LedgerError::InvalidEntry(format!(
                    "Line '{}' appears more than once in entry '{}'",
                    line.id, self.id
                )));
            }
            if line.entry_id != self.id {
                return Err(LedgerError::InvalidEntry(format!(
                    "Line '{}' belongs to entry '{}', not '{}'",
                    line.id, line.entry_id, self.id
                )));
            }
        }

        if !self.is_balanced() {
            return Err(LedgerError::InvalidEntry(format!(
                "Journal entry is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        Ok(())
    }
}

/// Pairing strategy used by automatic lettrage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum MatchingAlgorithm {
    /// Greedy scan, the first counterpart within tolerance wins
    #[default]
    FirstMatch,
    /// Greedy scan, the counterpart with the smallest residual wins
    ClosestMatch,
    /// First counterpart whose amount cancels exactly
    ExactAmount,
    /// Exact amounts first, then first-match over what is left
    Cascade,
}

impl fmt::Display for MatchingAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchingAlgorithm::FirstMatch => "first_match",
            MatchingAlgorithm::ClosestMatch => "closest_match",
            MatchingAlgorithm::ExactAmount => "exact_amount",
            MatchingAlgorithm::Cascade => "cascade",
        };
        f.write_str(name)
    }
}

/// How a reconciliation group came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationKind {
    /// Paired by the matching engine with the given algorithm
    Automatic(MatchingAlgorithm),
    /// Selected by a user
    Manual,
}

/// Set of ledger lines sharing one lettrage code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationGroup {
    pub code: String,
    pub account_id: String,
    pub line_ids: Vec<String>,
    /// Sum of the signed amounts of the lines
    pub net_amount: BigDecimal,
    pub kind: ReconciliationKind,
    pub reconciled_at: NaiveDateTime,
    pub reconciled_by: Option<String>,
}

/// Errors that can occur in the ledger and reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid journal entry: {0}")]
    InvalidEntry(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Journal entry not found: {0}")]
    EntryNotFound(String),
    #[error("Fiscal year not found: {0}")]
    FiscalYearNotFound(String),
    #[error("Ledger line not found: {0}")]
    LineNotFound(String),
    #[error("Account is not reconcilable: {0}")]
    AccountNotReconcilable(String),
    #[error("Lines already reconciled: {}", .0.join(", "))]
    AlreadyReconciled(Vec<String>),
    #[error("No lines to reconcile")]
    NothingToReconcile,
    #[error("Expected {requested} lines but found {found}")]
    LineCountMismatch { requested: usize, found: usize },
    #[error("Reconciliation is not balanced: net amount {0}")]
    UnbalancedReconciliation(BigDecimal),
    #[error("Reconciliation not found: {0}")]
    ReconciliationNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_account_class_and_default_flag() {
        let customers = Account::new(
            "acc-411".to_string(),
            "co1".to_string(),
            "411100".to_string(),
            "Clients".to_string(),
        );
        assert_eq!(customers.class(), Some(AccountClass::ThirdParties));
        assert!(customers.is_reconcilable);

        let bank = Account::new(
            "acc-521".to_string(),
            "co1".to_string(),
            "521000".to_string(),
            "Banque".to_string(),
        );
        assert_eq!(bank.class(), Some(AccountClass::Treasury));
        assert!(!bank.is_reconcilable);
    }

    #[test]
    fn test_line_signed_amount_and_invariant() {
        let debit = LedgerLine::debit(
            "l1".to_string(),
            "e1".to_string(),
            "a".to_string(),
            date(),
            "Facture".to_string(),
            BigDecimal::from(100),
        );
        assert_eq!(debit.signed_amount(), BigDecimal::from(100));
        assert!(debit.validate().is_ok());

        let mut both = debit.clone();
        both.credit_amount = BigDecimal::from(5);
        assert!(matches!(both.validate(), Err(LedgerError::InvalidEntry(_))));

        let mut empty = debit;
        empty.debit_amount = BigDecimal::from(0);
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_entry_balance_validation() {
        let mut entry = JournalEntry::new(
            "e1".to_string(),
            "co1".to_string(),
            "VT".to_string(),
            date(),
            "Vente".to_string(),
            None,
        );
        entry.add_debit("411".to_string(), "Client".to_string(), BigDecimal::from(118));
        assert!(entry.validate().is_err());

        entry.add_credit("701".to_string(), "Vente".to_string(), BigDecimal::from(100));
        assert!(entry.validate().is_err());

        entry.add_credit("443".to_string(), "TVA".to_string(), BigDecimal::from(18));
        assert!(entry.validate().is_ok());
        assert_eq!(entry.lines[2].id, "e1-L3");
    }

    #[test]
    fn test_entry_rejects_repeated_line_ids() {
        let mut entry = JournalEntry::new(
            "e1".to_string(),
            "co1".to_string(),
            "OD".to_string(),
            date(),
            "Ecriture".to_string(),
            None,
        );
        entry.add_debit("411".to_string(), "Client".to_string(), BigDecimal::from(50));
        entry.add_credit("701".to_string(), "Vente".to_string(), BigDecimal::from(50));
        entry.lines[1].id = entry.lines[0].id.clone();

        assert!(matches!(entry.validate(), Err(LedgerError::InvalidEntry(_))));
    }

    #[test]
    fn test_fiscal_year_contains_bounds() {
        let fy = FiscalYear::new(
            "fy".to_string(),
            "co1".to_string(),
            "2024".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        );
        assert!(fy.contains(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()));
        assert!(!fy.contains(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
    }
}
