//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<String, Account>,
    fiscal_years: HashMap<String, FiscalYear>,
    entries: HashMap<String, JournalEntry>,
    /// line id -> entry id
    line_index: HashMap<String, String>,
    reconciliations: HashMap<String, ReconciliationGroup>,
}

impl State {
    fn line(&self, line_id: &str) -> Option<(&JournalEntry, &LedgerLine)> {
        let entry = self.entries.get(self.line_index.get(line_id)?)?;
        let line = entry.lines.iter().find(|l| l.id == line_id)?;
        Some((entry, line))
    }

    fn line_mut(&mut self, line_id: &str) -> Option<&mut LedgerLine> {
        let entry_id = self.line_index.get(line_id)?;
        self.entries
            .get_mut(entry_id)?
            .lines
            .iter_mut()
            .find(|l| l.id == line_id)
    }

    fn validated_lines(&self, account_id: &str, fiscal_year: Option<&FiscalYear>) -> Vec<LedgerLine> {
        let mut lines: Vec<LedgerLine> = self
            .entries
            .values()
            .filter(|entry| entry.is_validated())
            .flat_map(|entry| entry.lines.iter())
            .filter(|line| line.account_id == account_id)
            .filter(|line| fiscal_year.is_none_or(|fy| fy.contains(line.date)))
            .cloned()
            .collect();
        lines.sort_by(|a, b| {
            (a.date, &a.entry_id, &a.id).cmp(&(b.date, &b.entry_id, &b.id))
        });
        lines
    }
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    state: Arc<RwLock<State>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        *self.write()? = State::default();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Storage("memory storage lock poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_account(&mut self, account: &Account) -> LedgerResult<()> {
        self.write()?
            .accounts
            .insert(account.id.clone(), account.clone());
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(account_id).cloned())
    }

    async fn list_accounts(
        &self,
        company_id: &str,
        reconcilable_only: bool,
    ) -> LedgerResult<Vec<Account>> {
        let state = self.read()?;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|account| account.company_id == company_id)
            .filter(|account| !reconcilable_only || account.is_reconcilable)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn update_account(&mut self, account: &Account) -> LedgerResult<()> {
        let mut state = self.write()?;
        match state.accounts.get_mut(&account.id) {
            Some(existing) => {
                *existing = account.clone();
                Ok(())
            }
            None => Err(LedgerError::AccountNotFound(account.id.clone())),
        }
    }

    async fn save_fiscal_year(&mut self, fiscal_year: &FiscalYear) -> LedgerResult<()> {
        self.write()?
            .fiscal_years
            .insert(fiscal_year.id.clone(), fiscal_year.clone());
        Ok(())
    }

    async fn get_fiscal_year(&self, fiscal_year_id: &str) -> LedgerResult<Option<FiscalYear>> {
        Ok(self.read()?.fiscal_years.get(fiscal_year_id).cloned())
    }

    async fn list_fiscal_years(&self, company_id: &str) -> LedgerResult<Vec<FiscalYear>> {
        let state = self.read()?;
        let mut years: Vec<FiscalYear> = state
            .fiscal_years
            .values()
            .filter(|fy| fy.company_id == company_id)
            .cloned()
            .collect();
        years.sort_by_key(|fy| fy.start_date);
        Ok(years)
    }

    async fn save_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        let mut state = self.write()?;
        if state.entries.contains_key(&entry.id) {
            return Err(LedgerError::Storage(format!(
                "Journal entry '{}' already exists",
                entry.id
            )));
        }
        let mut incoming = HashSet::new();
        if let Some(line) = entry
            .lines
            .iter()
            .find(|line| state.line_index.contains_key(&line.id) || !incoming.insert(&line.id))
        {
            return Err(LedgerError::Storage(format!(
                "Ledger line '{}' already exists",
                line.id
            )));
        }

        for line in &entry.lines {
            state.line_index.insert(line.id.clone(), entry.id.clone());
        }
        state.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn get_entry(&self, entry_id: &str) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.read()?.entries.get(entry_id).cloned())
    }

    async fn update_entry(&mut self, entry: &JournalEntry) -> LedgerResult<()> {
        let mut state = self.write()?;
        let existing = state
            .entries
            .get_mut(&entry.id)
            .ok_or_else(|| LedgerError::EntryNotFound(entry.id.clone()))?;

        let lines = std::mem::take(&mut existing.lines);
        *existing = JournalEntry {
            lines,
            ..entry.clone()
        };
        Ok(())
    }

    async fn delete_entry(&mut self, entry_id: &str) -> LedgerResult<()> {
        let mut state = self.write()?;
        let entry = state
            .entries
            .remove(entry_id)
            .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))?;
        for line in &entry.lines {
            state.line_index.remove(&line.id);
        }
        Ok(())
    }

    async fn list_entries(&self, company_id: &str) -> LedgerResult<Vec<JournalEntry>> {
        let state = self.read()?;
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .filter(|entry| entry.company_id == company_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        Ok(entries)
    }

    async fn fetch_unreconciled_lines(
        &self,
        account_id: &str,
        fiscal_year: Option<&FiscalYear>,
    ) -> LedgerResult<Vec<LedgerLine>> {
        let state = self.read()?;
        let mut lines = state.validated_lines(account_id, fiscal_year);
        lines.retain(|line| !line.is_reconciled);
        Ok(lines)
    }

    async fn fetch_account_lines(
        &self,
        account_id: &str,
        fiscal_year: Option<&FiscalYear>,
    ) -> LedgerResult<Vec<LedgerLine>> {
        Ok(self.read()?.validated_lines(account_id, fiscal_year))
    }

    async fn get_lines(&self, line_ids: &[String]) -> LedgerResult<Vec<LedgerLine>> {
        let state = self.read()?;
        Ok(line_ids
            .iter()
            .filter_map(|id| state.line(id).map(|(_, line)| line.clone()))
            .collect())
    }

    async fn is_line_validated(&self, line_id: &str) -> LedgerResult<bool> {
        let state = self.read()?;
        state
            .line(line_id)
            .map(|(entry, _)| entry.is_validated())
            .ok_or_else(|| LedgerError::LineNotFound(line_id.to_string()))
    }

    async fn apply_reconciliation(&mut self, group: &ReconciliationGroup) -> LedgerResult<()> {
        let mut state = self.write()?;

        if state.reconciliations.contains_key(&group.code) {
            return Err(LedgerError::Storage(format!(
                "Reconciliation code '{}' is already in use",
                group.code
            )));
        }

        // Check every line before touching any of them
        let mut already_reconciled = Vec::new();
        let mut seen = HashSet::new();
        for line_id in &group.line_ids {
            if !seen.insert(line_id) {
                return Err(LedgerError::Validation(format!(
                    "Line '{}' appears twice in reconciliation '{}'",
                    line_id, group.code
                )));
            }
            let (_, line) = state
                .line(line_id)
                .ok_or_else(|| LedgerError::LineNotFound(line_id.clone()))?;
            if line.is_reconciled {
                already_reconciled.push(line_id.clone());
            }
        }
        if !already_reconciled.is_empty() {
            return Err(LedgerError::AlreadyReconciled(already_reconciled));
        }

        let date = group.reconciled_at.date();
        for line_id in &group.line_ids {
            if let Some(line) = state.line_mut(line_id) {
                line.mark_reconciled(&group.code, date);
            }
        }
        state
            .reconciliations
            .insert(group.code.clone(), group.clone());
        Ok(())
    }

    async fn get_reconciliation(&self, code: &str) -> LedgerResult<Option<ReconciliationGroup>> {
        Ok(self.read()?.reconciliations.get(code).cloned())
    }

    async fn remove_reconciliation(&mut self, code: &str) -> LedgerResult<ReconciliationGroup> {
        let mut state = self.write()?;
        let group = state
            .reconciliations
            .remove(code)
            .ok_or_else(|| LedgerError::ReconciliationNotFound(code.to_string()))?;

        for line_id in &group.line_ids {
            if let Some(line) = state.line_mut(line_id) {
                if line.reconciliation_code.as_deref() == Some(code) {
                    line.clear_reconciliation();
                }
            }
        }
        Ok(group)
    }
}
