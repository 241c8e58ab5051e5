//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> LedgerResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(LedgerError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a SYSCOHADA account number: 2 to 12 digits, class 1 to 9
pub fn validate_account_number(number: &str) -> LedgerResult<()> {
    if number.len() < 2 || number.len() > 12 {
        return Err(LedgerError::Validation(format!(
            "Account number '{}' must have between 2 and 12 digits",
            number
        )));
    }

    if !number.chars().all(|c| c.is_ascii_digit()) {
        return Err(LedgerError::Validation(format!(
            "Account number '{}' can only contain digits",
            number
        )));
    }

    if AccountClass::from_number(number).is_none() {
        return Err(LedgerError::Validation(format!(
            "Account number '{}' does not start with a class between 1 and 9",
            number
        )));
    }

    Ok(())
}

/// Validate that an account name is valid
pub fn validate_account_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Account name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate a journal code (e.g. "VT", "ACH", "BQ1")
pub fn validate_journal_code(code: &str) -> LedgerResult<()> {
    if code.is_empty() || code.len() > 10 {
        return Err(LedgerError::Validation(
            "Journal code must have between 1 and 10 characters".to_string(),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(LedgerError::Validation(
            "Journal code can only contain alphanumeric characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an entry description is valid
pub fn validate_entry_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Entry description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Entry description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Entry validator adding journal and line checks to the double-entry rules
pub struct EnhancedEntryValidator;

impl EntryValidator for EnhancedEntryValidator {
    fn validate_entry(&self, entry: &JournalEntry) -> LedgerResult<()> {
        entry.validate()?;

        validate_journal_code(&entry.journal_code)?;
        validate_entry_description(&entry.description)?;

        for line in &entry.lines {
            if line.date != entry.date {
                return Err(LedgerError::Validation(format!(
                    "Line '{}' is not dated like its entry",
                    line.id
                )));
            }
        }

        Ok(())
    }
}

/// Account validator enforcing the SYSCOHADA numbering
pub struct EnhancedAccountValidator;

impl AccountValidator for EnhancedAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        DefaultAccountValidator.validate_account(account)?;
        validate_account_number(&account.number)?;
        validate_account_name(&account.name)?;
        Ok(())
    }
}
