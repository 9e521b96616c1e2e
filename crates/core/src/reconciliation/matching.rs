//! Automatic matching of bank lines to ledger transactions.
//!
//! A candidate must be in the line's direction (money out matches payments,
//! money in matches receipts), within `window_days` of the line date and
//! within the amount tolerance. Among candidates the closest date wins; a
//! tie on closest date is left for the operator.

use rust_decimal::Decimal;
use strata_shared::types::{TransactionId, amounts_match};

use super::types::{BankStatementLine, MatchCandidate, MatchOutcome, MatchProposal};

/// Matching parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchingEngine {
    window_days: i64,
    tolerance: Decimal,
}

impl MatchingEngine {
    /// Creates an engine searching `window_days` either side of a line.
    #[must_use]
    pub fn new(window_days: u32, tolerance: Decimal) -> Self {
        Self {
            window_days: i64::from(window_days),
            tolerance,
        }
    }

    /// Proposes matches for every unresolved line.
    ///
    /// Lines are considered in date then line-number order. A transaction
    /// proposed for one line, or already matched to any line in `lines`,
    /// is not offered to later lines. Already resolved lines produce no
    /// proposal. The result is deterministic for the same inputs.
    #[must_use]
    pub fn propose(
        &self,
        lines: &[BankStatementLine],
        candidates: &[MatchCandidate],
    ) -> Vec<MatchProposal> {
        let mut claimed: Vec<TransactionId> = lines
            .iter()
            .filter_map(|l| l.matched_transaction_id)
            .collect();

        let mut pending: Vec<&BankStatementLine> =
            lines.iter().filter(|l| !l.is_resolved()).collect();
        pending.sort_by_key(|l| (l.line_date, l.line_number));

        let mut proposals = Vec::with_capacity(pending.len());
        for line in pending {
            let outcome = self.best_match(line, candidates, &claimed);
            if let MatchOutcome::Proposed { transaction_id, .. } = outcome {
                claimed.push(transaction_id);
            }
            proposals.push(MatchProposal {
                line_id: line.id,
                outcome,
            });
        }
        proposals
    }

    /// Finds the best candidate for a single line.
    #[must_use]
    pub fn best_match(
        &self,
        line: &BankStatementLine,
        candidates: &[MatchCandidate],
        claimed: &[TransactionId],
    ) -> MatchOutcome {
        let Some(amount) = line.amount() else {
            return MatchOutcome::NoCandidate;
        };
        let wanted = amount.expected_transaction_type();

        let mut eligible: Vec<(i64, TransactionId)> = candidates
            .iter()
            .filter(|c| c.transaction_type == wanted)
            .filter(|c| !claimed.contains(&c.transaction_id))
            .filter(|c| amounts_match(c.amount, amount.value(), self.tolerance))
            .filter_map(|c| {
                let distance = (c.transaction_date - line.line_date).num_days().abs();
                (distance <= self.window_days).then_some((distance, c.transaction_id))
            })
            .collect();

        let Some(closest) = eligible.iter().map(|(d, _)| *d).min() else {
            return MatchOutcome::NoCandidate;
        };
        eligible.retain(|(d, _)| *d == closest);
        eligible.sort_by_key(|(_, id)| *id);

        match eligible.as_slice() {
            [(day_distance, transaction_id)] => MatchOutcome::Proposed {
                transaction_id: *transaction_id,
                day_distance: *day_distance,
            },
            tied => MatchOutcome::Ambiguous {
                transaction_ids: tied.iter().map(|(_, id)| *id).collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionType;
    use crate::reconciliation::types::NonLedgerCategory;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use strata_shared::types::{BankStatementId, BankStatementLineId, CENT};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn engine() -> MatchingEngine {
        MatchingEngine::new(3, CENT)
    }

    fn debit_line(number: u32, on: NaiveDate, amount: Decimal) -> BankStatementLine {
        BankStatementLine {
            id: BankStatementLineId::new(),
            statement_id: BankStatementId::new(),
            line_number: number,
            line_date: on,
            description: format!("Line {number}"),
            debit_amount: Some(amount),
            credit_amount: None,
            running_balance: None,
            matched_transaction_id: None,
            non_ledger_category: None,
        }
    }

    fn payment(on: NaiveDate, amount: Decimal) -> MatchCandidate {
        MatchCandidate {
            transaction_id: TransactionId::new(),
            transaction_type: TransactionType::Payment,
            transaction_date: on,
            amount,
        }
    }

    #[test]
    fn test_closer_payment_wins() {
        let early = payment(date(2026, 3, 1), dec!(250.00));
        let late = payment(date(2026, 3, 4), dec!(250.00));
        let line = debit_line(1, date(2026, 3, 2), dec!(250.00));

        let outcome = engine().best_match(&line, &[early, late], &[]);
        assert_eq!(
            outcome,
            MatchOutcome::Proposed {
                transaction_id: early.transaction_id,
                day_distance: 1
            }
        );
    }

    #[test]
    fn test_equidistant_tie_requires_manual_selection() {
        let early = payment(date(2026, 3, 1), dec!(250.00));
        let late = payment(date(2026, 3, 4), dec!(250.00));
        let twin = payment(date(2026, 3, 1), dec!(250.00));
        let line = debit_line(1, date(2026, 3, 2), dec!(250.00));

        let outcome = engine().best_match(&line, &[early, late, twin], &[]);
        match outcome {
            MatchOutcome::Ambiguous { transaction_ids } => {
                assert_eq!(transaction_ids.len(), 2);
                assert!(transaction_ids.contains(&early.transaction_id));
                assert!(transaction_ids.contains(&twin.transaction_id));
            }
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_window_is_inclusive() {
        let line = debit_line(1, date(2026, 3, 10), dec!(99.00));
        let at_edge = payment(date(2026, 3, 13), dec!(99.00));
        let beyond = payment(date(2026, 3, 14), dec!(99.00));

        assert!(matches!(
            engine().best_match(&line, &[at_edge], &[]),
            MatchOutcome::Proposed { day_distance: 3, .. }
        ));
        assert_eq!(
            engine().best_match(&line, &[beyond], &[]),
            MatchOutcome::NoCandidate
        );
    }

    #[test]
    fn test_direction_and_tolerance() {
        let line = debit_line(1, date(2026, 3, 10), dec!(99.00));
        let receipt = MatchCandidate {
            transaction_type: TransactionType::Receipt,
            ..payment(date(2026, 3, 10), dec!(99.00))
        };
        let off_by_cent = payment(date(2026, 3, 10), dec!(99.01));

        assert_eq!(
            engine().best_match(&line, &[receipt, off_by_cent], &[]),
            MatchOutcome::NoCandidate
        );
    }

    #[test]
    fn test_claimed_transactions_not_reused() {
        let only = payment(date(2026, 3, 10), dec!(40.00));
        let first = debit_line(1, date(2026, 3, 10), dec!(40.00));
        let second = debit_line(2, date(2026, 3, 11), dec!(40.00));

        let proposals = engine().propose(&[second.clone(), first.clone()], &[only]);
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].line_id, first.id);
        assert_eq!(proposals[0].proposed_transaction(), Some(only.transaction_id));
        assert_eq!(proposals[1].line_id, second.id);
        assert_eq!(proposals[1].outcome, MatchOutcome::NoCandidate);
    }

    #[test]
    fn test_resolved_lines_are_skipped() {
        let matched_tx = payment(date(2026, 3, 10), dec!(40.00));
        let mut matched = debit_line(1, date(2026, 3, 10), dec!(40.00));
        matched.matched_transaction_id = Some(matched_tx.transaction_id);
        let mut fee = debit_line(2, date(2026, 3, 10), dec!(2.50));
        fee.non_ledger_category = Some(NonLedgerCategory::BankFee);
        let open = debit_line(3, date(2026, 3, 10), dec!(40.00));

        let proposals = engine().propose(&[matched, fee, open.clone()], &[matched_tx]);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].line_id, open.id);
        assert_eq!(proposals[0].outcome, MatchOutcome::NoCandidate);
    }

    #[test]
    fn test_propose_is_idempotent() {
        let candidates = vec![
            payment(date(2026, 3, 1), dec!(250.00)),
            payment(date(2026, 3, 4), dec!(250.00)),
        ];
        let lines = vec![
            debit_line(1, date(2026, 3, 2), dec!(250.00)),
            debit_line(2, date(2026, 3, 5), dec!(250.00)),
        ];
        let first = engine().propose(&lines, &candidates);
        let second = engine().propose(&lines, &candidates);
        assert_eq!(first, second);
        assert_eq!(first[0].proposed_transaction(), Some(candidates[0].transaction_id));
        assert_eq!(first[1].proposed_transaction(), Some(candidates[1].transaction_id));
    }
}
