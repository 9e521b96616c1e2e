//! Report generation service.
//!
//! Reports are pure aggregations over lines the repository has already
//! filtered to non-voided transactions of one scheme.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use strata_shared::types::{AccountId, TransactionId};

use super::error::ReportError;
use super::types::{
    CategoryTotal, FundBalance, FundBalanceSummary, FundIncomeStatement, FundMovement,
    IncomeStatementReport, IncomeStatementTotals, PostedLine, TrialBalanceReport, TrialBalanceRow,
    TrialBalanceSection, TrialBalanceTotals, UnbalancedTransaction,
};
use crate::accounts::{Account, AccountType, FundType};
use crate::fiscal::FinancialYear;
use crate::ledger::{LineSide, TransactionLine, TransactionType, calculate_totals};

/// Service for generating financial reports.
pub struct ReportService;

impl ReportService {
    /// Generates a trial balance from posted lines.
    ///
    /// Lines dated after `as_of` are ignored. Only accounts with at least
    /// one remaining line appear.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if a line references an account not in
    /// `accounts`.
    pub fn trial_balance(
        as_of: Option<NaiveDate>,
        lines: &[PostedLine],
        accounts: &[Account],
    ) -> Result<TrialBalanceReport, ReportError> {
        let by_id = index_accounts(accounts);
        let mut sums: HashMap<AccountId, (Decimal, Decimal)> = HashMap::new();

        for line in lines
            .iter()
            .filter(|l| as_of.is_none_or(|cutoff| l.transaction_date <= cutoff))
        {
            let entry = sums.entry(line.account_id).or_default();
            match line.side {
                LineSide::Debit => entry.0 += line.amount,
                LineSide::Credit => entry.1 += line.amount,
            }
        }

        let mut rows = Vec::with_capacity(sums.len());
        for (account_id, (total_debit, total_credit)) in sums {
            let account = by_id
                .get(&account_id)
                .ok_or(ReportError::AccountNotFound(account_id))?;
            rows.push(TrialBalanceRow {
                account_id,
                code: account.code.clone(),
                name: account.name.clone(),
                account_type: account.account_type,
                total_debit,
                total_credit,
                balance: total_debit - total_credit,
            });
        }
        rows.sort_by(|a, b| a.code.cmp(&b.code).then(a.account_id.cmp(&b.account_id)));

        let sections: Vec<TrialBalanceSection> = AccountType::ALL
            .into_iter()
            .filter_map(|account_type| {
                let section_rows: Vec<TrialBalanceRow> = rows
                    .iter()
                    .filter(|r| r.account_type == account_type)
                    .cloned()
                    .collect();
                if section_rows.is_empty() {
                    return None;
                }
                Some(TrialBalanceSection {
                    account_type,
                    total_debit: section_rows.iter().map(|r| r.total_debit).sum(),
                    total_credit: section_rows.iter().map(|r| r.total_credit).sum(),
                    rows: section_rows,
                })
            })
            .collect();

        let total_debit: Decimal = sections.iter().map(|s| s.total_debit).sum();
        let total_credit: Decimal = sections.iter().map(|s| s.total_credit).sum();

        Ok(TrialBalanceReport {
            as_of,
            sections,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        })
    }

    /// Rejects a trial balance whose debits and credits disagree.
    ///
    /// # Errors
    ///
    /// Returns `TrialBalanceImbalance` with both totals.
    pub fn ensure_balanced(report: &TrialBalanceReport) -> Result<(), ReportError> {
        if report.totals.is_balanced {
            Ok(())
        } else {
            Err(ReportError::TrialBalanceImbalance {
                debit: report.totals.total_debit,
                credit: report.totals.total_credit,
            })
        }
    }

    /// Computes opening, receipts, payments and closing for both funds.
    ///
    /// Journals move no cash and are excluded. Movements outside the year
    /// are ignored.
    #[must_use]
    pub fn fund_balance_summary(
        year: &FinancialYear,
        movements: &[FundMovement],
    ) -> FundBalanceSummary {
        let funds = FundType::ALL
            .into_iter()
            .map(|fund| {
                let in_fund = movements
                    .iter()
                    .filter(|m| m.fund_type == fund && year.contains(m.transaction_date));
                let (total_receipts, total_payments) = in_fund.fold(
                    (Decimal::ZERO, Decimal::ZERO),
                    |(receipts, payments), m| match m.transaction_type {
                        TransactionType::Receipt => (receipts + m.amount, payments),
                        TransactionType::Payment => (receipts, payments + m.amount),
                        TransactionType::Journal => (receipts, payments),
                    },
                );
                let opening_balance = year.opening_balance(fund);
                FundBalance {
                    fund_type: fund,
                    opening_balance,
                    total_receipts,
                    total_payments,
                    closing_balance: opening_balance + total_receipts - total_payments,
                }
            })
            .collect();

        FundBalanceSummary {
            financial_year_id: year.id,
            year_label: year.year_label.clone(),
            start_date: year.start_date,
            end_date: year.end_date,
            funds,
        }
    }

    /// Generates an income statement per fund for `[start, end]`.
    ///
    /// Income is measured as credits minus debits, expenses as debits minus
    /// credits. Funds without income or expense lines are left out, so a
    /// quiet period yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDateRange` if `start > end` and `AccountNotFound` if
    /// a line references an unknown account.
    pub fn income_statement(
        start: NaiveDate,
        end: NaiveDate,
        lines: &[PostedLine],
        accounts: &[Account],
    ) -> Result<IncomeStatementReport, ReportError> {
        if start > end {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        let by_id = index_accounts(accounts);

        // (fund, account) -> net in the account's normal direction
        let mut totals: BTreeMap<(FundType, &str, AccountId), (&Account, Decimal)> =
            BTreeMap::new();

        for line in lines
            .iter()
            .filter(|l| start <= l.transaction_date && l.transaction_date <= end)
        {
            let account: &Account = by_id
                .get(&line.account_id)
                .copied()
                .ok_or(ReportError::AccountNotFound(line.account_id))?;
            let signed = match (account.account_type, line.side) {
                (AccountType::Income, LineSide::Credit)
                | (AccountType::Expense, LineSide::Debit) => line.amount,
                (AccountType::Income, LineSide::Debit)
                | (AccountType::Expense, LineSide::Credit) => -line.amount,
                _ => continue,
            };
            totals
                .entry((line.fund_type, account.code.as_str(), account.id))
                .or_insert((account, Decimal::ZERO))
                .1 += signed;
        }

        let mut funds = Vec::new();
        for fund in FundType::ALL {
            let mut income = Vec::new();
            let mut expenses = Vec::new();
            for (_, (account, amount)) in totals.iter().filter(|((f, _, _), _)| *f == fund) {
                let total = CategoryTotal {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    amount: *amount,
                };
                if account.account_type == AccountType::Income {
                    income.push(total);
                } else {
                    expenses.push(total);
                }
            }
            if income.is_empty() && expenses.is_empty() {
                continue;
            }
            let total_income: Decimal = income.iter().map(|c| c.amount).sum();
            let total_expenses: Decimal = expenses.iter().map(|c| c.amount).sum();
            funds.push(FundIncomeStatement {
                fund_type: fund,
                income,
                expenses,
                total_income,
                total_expenses,
                net: total_income - total_expenses,
            });
        }

        let combined = funds.iter().fold(IncomeStatementTotals::default(), |acc, f| {
            IncomeStatementTotals {
                total_income: acc.total_income + f.total_income,
                total_expenses: acc.total_expenses + f.total_expenses,
                net: acc.net + f.net,
            }
        });

        Ok(IncomeStatementReport {
            start_date: start,
            end_date: end,
            funds,
            combined,
        })
    }

    /// Finds transactions whose stored lines do not balance.
    #[must_use]
    pub fn find_unbalanced(lines: &[TransactionLine]) -> Vec<UnbalancedTransaction> {
        let mut grouped: BTreeMap<TransactionId, Vec<&TransactionLine>> = BTreeMap::new();
        for line in lines {
            grouped.entry(line.transaction_id).or_default().push(line);
        }

        grouped
            .into_iter()
            .filter_map(|(transaction_id, tx_lines)| {
                let totals = calculate_totals(tx_lines.iter().map(|l| (l.side, &l.amount)));
                (!totals.is_balanced).then_some(UnbalancedTransaction {
                    transaction_id,
                    total_debit: totals.total_debit,
                    total_credit: totals.total_credit,
                })
            })
            .collect()
    }
}

fn index_accounts(accounts: &[Account]) -> HashMap<AccountId, &Account> {
    accounts.iter().map(|a| (a.id, a)).collect()
}
