//! Pairwise matching of ledger lines
//!
//! Given the ordered unreconciled lines of one account, proposes pairs of
//! lines whose signed amounts cancel within an absolute tolerance. With
//! `require_opposite_sides` only a debit and a credit may pair.
//! Every strategy is a greedy scan: lines are visited in order and each one
//! is paired at most once. Groups that only net to zero across three or more
//! lines (e.g. `+100, -40, -60`) are never found. The scan is O(n²) per
//! account, which is why callers cap batches with `batch_limit`.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::config::ReconciliationConfig;
use crate::types::*;

/// Two lines proposed for lettrage, as indices into the scanned slice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedPair {
    /// Index of the earlier line
    pub first: usize,
    /// Index of the later line
    pub second: usize,
    /// `first + second` in signed amounts
    pub residual: BigDecimal,
    /// Strategy that produced the pair; for a cascade, the stage
    pub algorithm: MatchingAlgorithm,
}

#[derive(Clone, Copy)]
enum Pick {
    First,
    Closest,
}

struct Pass<'a> {
    tolerance: &'a BigDecimal,
    opposite_sides: bool,
    pick: Pick,
    label: MatchingAlgorithm,
}

impl<'a> Pass<'a> {
    fn new(
        tolerance: &'a BigDecimal,
        opposite_sides: bool,
        pick: Pick,
        label: MatchingAlgorithm,
    ) -> Self {
        Self {
            tolerance,
            opposite_sides,
            pick,
            label,
        }
    }
}

/// Propose pairs for the given lines
pub fn find_pairs(
    lines: &[LedgerLine],
    algorithm: MatchingAlgorithm,
    config: &ReconciliationConfig,
) -> Vec<ProposedPair> {
    let amounts: Vec<BigDecimal> = lines.iter().map(LedgerLine::signed_amount).collect();
    let mut processed = vec![false; lines.len()];
    let zero = BigDecimal::from(0);
    let sides = config.require_opposite_sides;
    let tolerance = &config.tolerance;

    let mut pairs = match algorithm {
        MatchingAlgorithm::FirstMatch => greedy_pass(
            &amounts,
            &mut processed,
            Pass::new(tolerance, sides, Pick::First, MatchingAlgorithm::FirstMatch),
        ),
        MatchingAlgorithm::ClosestMatch => greedy_pass(
            &amounts,
            &mut processed,
            Pass::new(tolerance, sides, Pick::Closest, MatchingAlgorithm::ClosestMatch),
        ),
        MatchingAlgorithm::ExactAmount => greedy_pass(
            &amounts,
            &mut processed,
            Pass::new(&zero, sides, Pick::First, MatchingAlgorithm::ExactAmount),
        ),
        MatchingAlgorithm::Cascade => {
            let mut pairs = greedy_pass(
                &amounts,
                &mut processed,
                Pass::new(&zero, sides, Pick::First, MatchingAlgorithm::ExactAmount),
            );
            pairs.extend(greedy_pass(
                &amounts,
                &mut processed,
                Pass::new(tolerance, sides, Pick::First, MatchingAlgorithm::FirstMatch),
            ));
            pairs
        }
    };

    pairs.sort_by_key(|pair| pair.first);
    pairs
}

fn greedy_pass(
    amounts: &[BigDecimal],
    processed: &mut [bool],
    pass: Pass<'_>,
) -> Vec<ProposedPair> {
    let zero = BigDecimal::from(0);
    let mut pairs = Vec::new();

    for i in 0..amounts.len() {
        if processed[i] || amounts[i] == zero {
            continue;
        }

        let mut chosen: Option<(usize, BigDecimal)> = None;
        for j in (i + 1)..amounts.len() {
            if processed[j] || amounts[j] == zero {
                continue;
            }
            if pass.opposite_sides && !opposite_signs(&amounts[i], &amounts[j], &zero) {
                continue;
            }

            let residual = &amounts[i] + &amounts[j];
            if residual.abs() > *pass.tolerance {
                continue;
            }

            match pass.pick {
                Pick::First => {
                    chosen = Some((j, residual));
                    break;
                }
                Pick::Closest => {
                    let better = chosen
                        .as_ref()
                        .is_none_or(|(_, best)| residual.abs() < best.abs());
                    if better {
                        chosen = Some((j, residual));
                    }
                }
            }
        }

        if let Some((j, residual)) = chosen {
            processed[i] = true;
            processed[j] = true;
            pairs.push(ProposedPair {
                first: i,
                second: j,
                residual,
                algorithm: pass.label,
            });
        }
    }

    pairs
}

fn opposite_signs(a: &BigDecimal, b: &BigDecimal, zero: &BigDecimal) -> bool {
    (a > zero && b < zero) || (a < zero && b > zero)
}
