//! Effective chart resolution and account maintenance rules.

use std::collections::BTreeMap;

use strata_shared::types::{AccountId, SchemeId};

use super::error::ChartError;
use super::types::{Account, AccountChanges, AccountReference, FundType, NewAccount};

const MAX_CODE_LEN: usize = 10;

/// The chart of accounts as one scheme sees it: organisation defaults
/// overlaid by the scheme's own accounts, keyed and ordered by code.
#[derive(Debug, Clone, Default)]
pub struct EffectiveChart {
    accounts: Vec<Account>,
}

impl EffectiveChart {
    /// Merges defaults with scheme-specific accounts.
    ///
    /// A scheme account wins over a default with the same code, including
    /// when the scheme account is inactive. Accounts belonging to other
    /// schemes are ignored.
    #[must_use]
    pub fn merge(scheme_id: SchemeId, defaults: Vec<Account>, scheme_accounts: Vec<Account>) -> Self {
        let mut by_code: BTreeMap<String, Account> = BTreeMap::new();
        for account in defaults.into_iter().filter(Account::is_default) {
            by_code.insert(account.code.clone(), account);
        }
        for account in scheme_accounts
            .into_iter()
            .filter(|a| a.scheme_id == Some(scheme_id))
        {
            by_code.insert(account.code.clone(), account);
        }
        Self {
            accounts: by_code.into_values().collect(),
        }
    }

    /// Every account in the chart, ordered by code.
    #[must_use]
    pub fn all(&self) -> &[Account] {
        &self.accounts
    }

    /// Active accounts, ordered by code.
    pub fn active(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|a| a.is_active)
    }

    /// Consumes the chart, returning only active accounts.
    #[must_use]
    pub fn into_active(self) -> Vec<Account> {
        self.accounts.into_iter().filter(|a| a.is_active).collect()
    }

    /// Looks an account up by ID.
    #[must_use]
    pub fn find(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Looks an account up by code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.code == code)
    }

    /// The cash-at-bank account holding `fund`'s money.
    #[must_use]
    pub fn trust_account(&self, fund: FundType) -> Option<&Account> {
        self.find_by_code(fund.trust_account_code())
            .filter(|a| a.is_active)
    }
}

/// Stateless rules for maintaining the chart of accounts.
pub struct ChartService;

impl ChartService {
    /// Checks that a code is 1 to 10 ASCII digits.
    ///
    /// # Errors
    ///
    /// Returns `ChartError::InvalidCode` otherwise.
    pub fn validate_code(code: &str) -> Result<(), ChartError> {
        if code.is_empty() || code.len() > MAX_CODE_LEN || !code.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ChartError::InvalidCode(code.to_string()));
        }
        Ok(())
    }

    /// Validates a new scheme account against the scheme's effective chart.
    ///
    /// Defaults may be overridden by code, except system accounts.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed code or name,
    /// `SystemAccountImmutable` when the code belongs to a system account,
    /// `DuplicateCode` when the scheme already owns the code, and
    /// `ParentNotFound` when the parent is not visible to the scheme.
    pub fn validate_new(
        scheme_id: SchemeId,
        input: &NewAccount,
        chart: &EffectiveChart,
    ) -> Result<(), ChartError> {
        let code = input.code.trim();
        Self::validate_code(code)?;
        if input.name.trim().is_empty() {
            return Err(ChartError::EmptyName);
        }

        if let Some(existing) = chart.find_by_code(code) {
            if existing.is_system {
                return Err(ChartError::SystemAccountImmutable(existing.code.clone()));
            }
            if existing.scheme_id == Some(scheme_id) {
                return Err(ChartError::DuplicateCode(existing.code.clone()));
            }
        }

        if let Some(parent_id) = input.parent_id
            && chart.find(parent_id).is_none()
        {
            return Err(ChartError::ParentNotFound(parent_id));
        }

        Ok(())
    }

    /// Checks that the scheme owns the account it is about to change.
    ///
    /// # Errors
    ///
    /// Returns `SystemAccountImmutable` for system accounts,
    /// `DefaultAccountReadOnly` for other organisation defaults and
    /// `AccountNotFound` for another scheme's account.
    pub fn ensure_owned(scheme_id: SchemeId, account: &Account) -> Result<(), ChartError> {
        if account.is_system {
            return Err(ChartError::SystemAccountImmutable(account.code.clone()));
        }
        match account.scheme_id {
            None => Err(ChartError::DefaultAccountReadOnly(account.code.clone())),
            Some(owner) if owner == scheme_id => Ok(()),
            Some(_) => Err(ChartError::AccountNotFound(account.id)),
        }
    }

    /// Validates an update and returns the updated account.
    ///
    /// `siblings` are the accounts whose codes the updated code must not
    /// reuse: the owning scheme's accounts plus the system accounts.
    /// `line_count` is the number of ledger lines already posted to the
    /// account.
    ///
    /// # Errors
    ///
    /// Returns `SystemAccountImmutable` for system accounts,
    /// `AccountTypeLocked` when changing the type of an account with lines,
    /// and the same validation errors as [`Self::validate_new`].
    pub fn validate_update(
        account: &Account,
        changes: &AccountChanges,
        siblings: &[Account],
        line_count: u64,
    ) -> Result<Account, ChartError> {
        if account.is_system {
            return Err(ChartError::SystemAccountImmutable(account.code.clone()));
        }

        let mut updated = changes.apply_to(account);
        updated.code = updated.code.trim().to_string();
        Self::validate_code(&updated.code)?;
        if updated.name.trim().is_empty() {
            return Err(ChartError::EmptyName);
        }

        if updated.account_type != account.account_type && line_count > 0 {
            return Err(ChartError::AccountTypeLocked {
                account_id: account.id,
                line_count,
            });
        }

        if updated.code != account.code
            && let Some(clash) = siblings
                .iter()
                .find(|s| s.id != account.id && s.code == updated.code)
        {
            return Err(if clash.is_system {
                ChartError::SystemAccountImmutable(clash.code.clone())
            } else {
                ChartError::DuplicateCode(updated.code)
            });
        }

        if updated.parent_id == Some(account.id) {
            return Err(ChartError::SelfParent(account.id));
        }

        Ok(updated)
    }

    /// Validates a soft delete given the reference counts.
    ///
    /// Transactions using the account as category are checked before
    /// ledger lines, and the first non-zero count is reported.
    ///
    /// # Errors
    ///
    /// Returns `SystemAccountImmutable` for system accounts and
    /// `AccountInUse` while anything references the account.
    pub fn validate_soft_delete(
        account: &Account,
        transaction_refs: u64,
        line_refs: u64,
    ) -> Result<(), ChartError> {
        if account.is_system {
            return Err(ChartError::SystemAccountImmutable(account.code.clone()));
        }

        let blocking = [
            (AccountReference::Transactions, transaction_refs),
            (AccountReference::TransactionLines, line_refs),
        ]
        .into_iter()
        .find(|(_, count)| *count > 0);

        match blocking {
            Some((referenced_by, count)) => Err(ChartError::AccountInUse {
                account_id: account.id,
                referenced_by,
                count,
            }),
            None => Ok(()),
        }
    }
}
