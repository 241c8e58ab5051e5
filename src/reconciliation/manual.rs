//! Manual lettrage of user-selected lines

use bigdecimal::BigDecimal;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::reconciliation::clock::ReconciliationClock;
use crate::reconciliation::engine::ReconciliationService;
use crate::traits::*;
use crate::types::*;

/// Result of `manual_reconcile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualReconciliationResult {
    pub reconciliation_code: String,
    pub account_id: String,
    pub lines_count: usize,
    /// Net of the signed amounts; may be non-zero unless the configuration
    /// requires balanced manual lettrage
    pub balance: BigDecimal,
}

impl<S: LedgerStorage, C: ReconciliationClock> ReconciliationService<S, C> {
    /// Letter an explicit set of lines on behalf of `user`
    pub async fn manual_reconcile(
        &mut self,
        line_ids: &[String],
        user: &str,
    ) -> LedgerResult<ManualReconciliationResult> {
        if line_ids.is_empty() {
            return Err(LedgerError::NothingToReconcile);
        }

        let unique: HashSet<&String> = line_ids.iter().collect();
        if unique.len() != line_ids.len() {
            return Err(LedgerError::Validation(
                "The same line was selected more than once".to_string(),
            ));
        }

        let lines = self.storage.get_lines(line_ids).await?;
        if lines.len() != line_ids.len() {
            return Err(LedgerError::LineCountMismatch {
                requested: line_ids.len(),
                found: lines.len(),
            });
        }

        let already: Vec<String> = lines
            .iter()
            .filter(|line| line.is_reconciled)
            .map(|line| line.id.clone())
            .collect();
        if !already.is_empty() {
            return Err(LedgerError::AlreadyReconciled(already));
        }

        for line in &lines {
            if !self.storage.is_line_validated(&line.id).await? {
                return Err(LedgerError::Validation(format!(
                    "Line '{}' belongs to an entry that is not validated",
                    line.id
                )));
            }
        }

        let account_id = lines[0].account_id.clone();
        if lines.iter().any(|line| line.account_id != account_id) {
            return Err(LedgerError::Validation(
                "Lines to reconcile must all be booked on the same account".to_string(),
            ));
        }

        let account = self
            .storage
            .get_account(&account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.clone()))?;
        if !account.is_reconcilable {
            return Err(LedgerError::AccountNotReconcilable(account.id));
        }

        let balance: BigDecimal = lines.iter().map(LedgerLine::signed_amount).sum();
        if self.config.require_balanced_manual && balance.abs() > self.config.tolerance {
            return Err(LedgerError::UnbalancedReconciliation(balance));
        }

        let group = ReconciliationGroup {
            code: self.clock.next_code(),
            account_id: account_id.clone(),
            line_ids: line_ids.to_vec(),
            net_amount: balance.clone(),
            kind: ReconciliationKind::Manual,
            reconciled_at: self.clock.now(),
            reconciled_by: Some(user.to_string()),
        };
        self.storage.apply_reconciliation(&group).await?;

        info!(
            "manual lettrage {} by {}: {} lines on {} (balance {})",
            group.code,
            user,
            group.line_ids.len(),
            account.number,
            balance
        );

        Ok(ManualReconciliationResult {
            reconciliation_code: group.code,
            account_id,
            lines_count: line_ids.len(),
            balance,
        })
    }
}
