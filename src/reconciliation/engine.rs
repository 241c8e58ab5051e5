//! Automatic lettrage orchestration

use bigdecimal::BigDecimal;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::reconciliation::clock::{ReconciliationClock, SystemClock};
use crate::reconciliation::config::ReconciliationConfig;
use crate::reconciliation::matcher::{find_pairs, ProposedPair};
use crate::traits::*;
use crate::types::*;

/// Scope of an automatic lettrage run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomaticReconciliationRequest {
    pub company_id: String,
    /// Restrict the run to one account; all reconcilable accounts otherwise
    pub account_id: Option<String>,
    /// Restrict the run to lines dated within a fiscal year
    pub fiscal_year_id: Option<String>,
    /// Override the configured default algorithm
    pub algorithm: Option<MatchingAlgorithm>,
}

impl AutomaticReconciliationRequest {
    pub fn for_company(company_id: impl Into<String>) -> Self {
        Self {
            company_id: company_id.into(),
            account_id: None,
            fiscal_year_id: None,
            algorithm: None,
        }
    }

    pub fn account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn fiscal_year(mut self, fiscal_year_id: impl Into<String>) -> Self {
        self.fiscal_year_id = Some(fiscal_year_id.into());
        self
    }

    pub fn algorithm(mut self, algorithm: MatchingAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// Matches produced by one algorithm (or cascade stage)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub matches: usize,
    pub lines: usize,
    pub amount: BigDecimal,
}

impl Default for AlgorithmStatistics {
    fn default() -> Self {
        Self {
            matches: 0,
            lines: 0,
            amount: BigDecimal::from(0),
        }
    }
}

/// Outcome of a run for a single account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatistics {
    pub account_id: String,
    pub account_number: String,
    pub lines_processed: usize,
    pub lines_skipped: usize,
    pub matches: usize,
    pub amount_reconciled: BigDecimal,
}

/// A proposed pair that could not be written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFailure {
    pub account_id: String,
    pub line_ids: Vec<String>,
    pub reason: String,
}

/// Totals of an automatic lettrage run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationStatistics {
    pub accounts_processed: usize,
    /// Lines fed to the matcher
    pub lines_processed: usize,
    /// Lines left out by the batch limit
    pub lines_skipped: usize,
    /// Pairs written
    pub automatic_matches: usize,
    pub lines_reconciled: usize,
    /// Sum of the debit side of every pair written
    pub amount_reconciled: BigDecimal,
    pub failed_matches: Vec<MatchFailure>,
    pub per_algorithm: HashMap<MatchingAlgorithm, AlgorithmStatistics>,
    pub per_account: Vec<AccountStatistics>,
}

impl Default for ReconciliationStatistics {
    fn default() -> Self {
        Self {
            accounts_processed: 0,
            lines_processed: 0,
            lines_skipped: 0,
            automatic_matches: 0,
            lines_reconciled: 0,
            amount_reconciled: BigDecimal::from(0),
            failed_matches: Vec::new(),
            per_algorithm: HashMap::new(),
            per_account: Vec::new(),
        }
    }
}

impl ReconciliationStatistics {
    /// Share of processed lines that ended up reconciled, in percent
    pub fn automation_rate(&self) -> f64 {
        if self.lines_processed == 0 {
            return 0.0;
        }
        self.lines_reconciled as f64 / self.lines_processed as f64 * 100.0
    }
}

/// Result of `process_automatic_reconciliation`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomaticReconciliationReport {
    pub algorithm: MatchingAlgorithm,
    pub automation_rate: f64,
    pub processing_time: Duration,
    pub statistics: ReconciliationStatistics,
    /// Groups created by the run, in creation order
    pub groups: Vec<ReconciliationGroup>,
}

/// Reconciled versus open lines of one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountReconciliationSummary {
    pub account_id: String,
    pub reconciled_lines: usize,
    pub unreconciled_lines: usize,
    /// Signed total of the open lines
    pub unreconciled_balance: BigDecimal,
}

/// Runs automatic, manual and reverse lettrage against a storage backend
pub struct ReconciliationService<S: LedgerStorage, C: ReconciliationClock = SystemClock> {
    pub(crate) storage: S,
    pub(crate) clock: C,
    pub(crate) config: ReconciliationConfig,
}

impl<S: LedgerStorage> ReconciliationService<S> {
    /// Create a service with the default configuration and the system clock
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: SystemClock,
            config: ReconciliationConfig::default(),
        }
    }
}

impl<S: LedgerStorage, C: ReconciliationClock> ReconciliationService<S, C> {
    /// Create a service with an explicit clock and configuration
    pub fn with_clock(storage: S, clock: C, config: ReconciliationConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self {
            storage,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    /// Pair the open lines of the requested accounts and letter each pair
    pub async fn process_automatic_reconciliation(
        &mut self,
        request: &AutomaticReconciliationRequest,
    ) -> LedgerResult<AutomaticReconciliationReport> {
        let started = Instant::now();
        let algorithm = request.algorithm.unwrap_or(self.config.default_algorithm);

        let fiscal_year = match &request.fiscal_year_id {
            Some(id) => Some(self.company_fiscal_year(&request.company_id, id).await?),
            None => None,
        };
        let accounts = self.resolve_accounts(request).await?;

        info!(
            "starting automatic lettrage: company={} accounts={} algorithm={} tolerance={}",
            request.company_id,
            accounts.len(),
            algorithm,
            self.config.tolerance
        );

        let mut statistics = ReconciliationStatistics::default();
        let mut groups = Vec::new();
        for account in &accounts {
            match self
                .reconcile_account(account, fiscal_year.as_ref(), algorithm, &mut statistics)
                .await
            {
                Ok(account_groups) => groups.extend(account_groups),
                Err(e) => {
                    warn!(
                        "automatic lettrage aborted on account {}: {}; undoing {} groups",
                        account.number,
                        e,
                        groups.len()
                    );
                    self.undo_groups(&groups).await;
                    return Err(e);
                }
            }
        }

        let automation_rate = statistics.automation_rate();
        let processing_time = started.elapsed();
        info!(
            "automatic lettrage done: company={} lines={} matches={} failures={} rate={:.2}% in {:?}",
            request.company_id,
            statistics.lines_processed,
            statistics.automatic_matches,
            statistics.failed_matches.len(),
            automation_rate,
            processing_time
        );

        Ok(AutomaticReconciliationReport {
            algorithm,
            automation_rate,
            processing_time,
            statistics,
            groups,
        })
    }

    async fn resolve_accounts(
        &self,
        request: &AutomaticReconciliationRequest,
    ) -> LedgerResult<Vec<Account>> {
        match &request.account_id {
            Some(account_id) => {
                let account = self.company_account(&request.company_id, account_id).await?;
                if !account.is_reconcilable {
                    return Err(LedgerError::AccountNotReconcilable(account.id));
                }
                Ok(vec![account])
            }
            None => self.storage.list_accounts(&request.company_id, true).await,
        }
    }

    pub(crate) async fn company_account(
        &self,
        company_id: &str,
        account_id: &str,
    ) -> LedgerResult<Account> {
        self.storage
            .get_account(account_id)
            .await?
            .filter(|account| account.company_id == company_id)
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    async fn company_fiscal_year(
        &self,
        company_id: &str,
        fiscal_year_id: &str,
    ) -> LedgerResult<FiscalYear> {
        self.storage
            .get_fiscal_year(fiscal_year_id)
            .await?
            .filter(|fy| fy.company_id == company_id)
            .ok_or_else(|| LedgerError::FiscalYearNotFound(fiscal_year_id.to_string()))
    }

    async fn reconcile_account(
        &mut self,
        account: &Account,
        fiscal_year: Option<&FiscalYear>,
        algorithm: MatchingAlgorithm,
        statistics: &mut ReconciliationStatistics,
    ) -> LedgerResult<Vec<ReconciliationGroup>> {
        let mut lines = self
            .storage
            .fetch_unreconciled_lines(&account.id, fiscal_year)
            .await?;

        let mut skipped = 0;
        if let Some(limit) = self.config.batch_limit {
            if lines.len() > limit {
                skipped = lines.len() - limit;
                warn!(
                    "account {} has {} open lines, only the first {} are matched this run",
                    account.number,
                    lines.len(),
                    limit
                );
                lines.truncate(limit);
            }
        }

        let pairs = find_pairs(&lines, algorithm, &self.config);
        let mut account_stats = AccountStatistics {
            account_id: account.id.clone(),
            account_number: account.number.clone(),
            lines_processed: lines.len(),
            lines_skipped: skipped,
            matches: 0,
            amount_reconciled: BigDecimal::from(0),
        };

        let mut groups = Vec::new();
        for pair in &pairs {
            let group = self.pair_group(account, &lines, pair);
            match self.storage.apply_reconciliation(&group).await {
                Ok(()) => {
                    let amount = &lines[pair.first].debit_amount + &lines[pair.second].debit_amount;
                    debug!(
                        "lettered {} and {} on {} as {} (residual {})",
                        lines[pair.first].id,
                        lines[pair.second].id,
                        account.number,
                        group.code,
                        pair.residual
                    );

                    let by_algorithm = statistics.per_algorithm.entry(pair.algorithm).or_default();
                    by_algorithm.matches += 1;
                    by_algorithm.lines += 2;
                    by_algorithm.amount += &amount;

                    account_stats.matches += 1;
                    account_stats.amount_reconciled += &amount;
                    statistics.automatic_matches += 1;
                    statistics.lines_reconciled += 2;
                    statistics.amount_reconciled += amount;
                    groups.push(group);
                }
                Err(e) => {
                    warn!(
                        "could not letter {:?} on {}: {}",
                        group.line_ids, account.number, e
                    );
                    statistics.failed_matches.push(MatchFailure {
                        account_id: account.id.clone(),
                        line_ids: group.line_ids,
                        reason: e.to_string(),
                    });
                }
            }
        }

        statistics.accounts_processed += 1;
        statistics.lines_processed += account_stats.lines_processed;
        statistics.lines_skipped += skipped;
        statistics.per_account.push(account_stats);
        Ok(groups)
    }

    /// Remove the groups written earlier in an aborted run, newest first
    async fn undo_groups(&mut self, groups: &[ReconciliationGroup]) {
        for group in groups.iter().rev() {
            if let Err(e) = self.storage.remove_reconciliation(&group.code).await {
                error!("could not undo lettrage {}: {}", group.code, e);
            }
        }
    }

    fn pair_group(
        &self,
        account: &Account,
        lines: &[LedgerLine],
        pair: &ProposedPair,
    ) -> ReconciliationGroup {
        ReconciliationGroup {
            code: self.clock.next_code(),
            account_id: account.id.clone(),
            line_ids: vec![lines[pair.first].id.clone(), lines[pair.second].id.clone()],
            net_amount: pair.residual.clone(),
            kind: ReconciliationKind::Automatic(pair.algorithm),
            reconciled_at: self.clock.now(),
            reconciled_by: None,
        }
    }

    /// Undo a lettrage (délettrage), reopening all of its lines
    pub async fn unreconcile(&mut self, code: &str) -> LedgerResult<ReconciliationGroup> {
        let group = self.storage.remove_reconciliation(code).await?;
        info!(
            "removed lettrage {} ({} lines on account {})",
            code,
            group.line_ids.len(),
            group.account_id
        );
        Ok(group)
    }

    /// Look up a lettrage group by code
    pub async fn get_reconciliation(&self, code: &str) -> LedgerResult<ReconciliationGroup> {
        self.storage
            .get_reconciliation(code)
            .await?
            .ok_or_else(|| LedgerError::ReconciliationNotFound(code.to_string()))
    }

    /// Count reconciled and open lines of an account
    pub async fn account_summary(
        &self,
        account_id: &str,
        fiscal_year: Option<&FiscalYear>,
    ) -> LedgerResult<AccountReconciliationSummary> {
        if self.storage.get_account(account_id).await?.is_none() {
            return Err(LedgerError::AccountNotFound(account_id.to_string()));
        }

        let lines = self
            .storage
            .fetch_account_lines(account_id, fiscal_year)
            .await?;
        let (reconciled, open): (Vec<&LedgerLine>, Vec<&LedgerLine>) =
            lines.iter().partition(|line| line.is_reconciled);

        Ok(AccountReconciliationSummary {
            account_id: account_id.to_string(),
            reconciled_lines: reconciled.len(),
            unreconciled_lines: open.len(),
            unreconciled_balance: open.iter().map(|line| line.signed_amount()).sum(),
        })
    }
}
