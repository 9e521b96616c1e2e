//! Chart of accounts domain types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strata_shared::types::{AccountId, SchemeId};

/// Account classification in the chart of accounts.
///
/// Asset and expense accounts carry debit balances; the rest carry credit
/// balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Cash at bank, receivables.
    Asset,
    /// Levies paid in advance, creditors.
    Liability,
    /// Owners' funds.
    Equity,
    /// Levy and interest income.
    Income,
    /// Operating and capital expenditure.
    Expense,
}

impl AccountType {
    /// Presentation order used by the trial balance.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Income,
        Self::Expense,
    ];

    /// Returns the lowercase storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// One of the two legally segregated trust funds held for a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundType {
    /// Day-to-day running costs.
    Admin,
    /// Long-term capital works (sinking fund).
    CapitalWorks,
}

impl FundType {
    /// Both funds, in reporting order.
    pub const ALL: [Self; 2] = [Self::Admin, Self::CapitalWorks];

    /// Returns the snake_case storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::CapitalWorks => "capital_works",
        }
    }

    /// Code of the system cash-at-bank account that holds this fund's money.
    #[must_use]
    pub const fn trust_account_code(self) -> &'static str {
        match self {
            Self::Admin => "1000",
            Self::CapitalWorks => "1100",
        }
    }
}

impl fmt::Display for FundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "capital_works" => Ok(Self::CapitalWorks),
            other => Err(format!("unknown fund type: {other}")),
        }
    }
}

/// An account in the chart of accounts.
///
/// `scheme_id == None` marks an organisation-wide default shared by every
/// scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning scheme, `None` for defaults.
    pub scheme_id: Option<SchemeId>,
    /// Numeric account code, e.g. `"4000"`.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Fund restriction, `None` when usable by both funds.
    pub fund_type: Option<FundType>,
    /// Parent account for grouping.
    pub parent_id: Option<AccountId>,
    /// System accounts are seeded and immutable.
    pub is_system: bool,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl Account {
    /// Returns true for organisation-wide default accounts.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.scheme_id.is_none()
    }

    /// Returns true if the scheme may see and post to this account.
    #[must_use]
    pub fn is_visible_to(&self, scheme_id: SchemeId) -> bool {
        self.scheme_id.is_none_or(|owner| owner == scheme_id)
    }

    /// Returns true if a transaction in `fund` may post to this account.
    #[must_use]
    pub fn accepts_fund(&self, fund: FundType) -> bool {
        self.fund_type.is_none_or(|restricted| restricted == fund)
    }
}

/// Input for creating a scheme-specific account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Numeric account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Classification.
    pub account_type: AccountType,
    /// Optional fund restriction.
    pub fund_type: Option<FundType>,
    /// Optional parent.
    pub parent_id: Option<AccountId>,
}

/// Partial update of an account. `None` leaves the field unchanged.
///
/// The nested options distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountChanges {
    /// New code.
    pub code: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New classification, refused once the account has postings.
    pub account_type: Option<AccountType>,
    /// New fund restriction.
    pub fund_type: Option<Option<FundType>>,
    /// New parent.
    pub parent_id: Option<Option<AccountId>>,
}

impl AccountChanges {
    /// Applies the changes to a copy of `account`.
    #[must_use]
    pub fn apply_to(&self, account: &Account) -> Account {
        let mut updated = account.clone();
        if let Some(code) = &self.code {
            updated.code.clone_from(code);
        }
        if let Some(name) = &self.name {
            updated.name.clone_from(name);
        }
        if let Some(account_type) = self.account_type {
            updated.account_type = account_type;
        }
        if let Some(fund_type) = self.fund_type {
            updated.fund_type = fund_type;
        }
        if let Some(parent_id) = self.parent_id {
            updated.parent_id = parent_id;
        }
        updated
    }
}

/// What still points at an account that someone tried to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountReference {
    /// Transactions using the account as their category.
    Transactions,
    /// Derived ledger lines posting to the account.
    TransactionLines,
}

impl fmt::Display for AccountReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transactions => f.write_str("transactions"),
            Self::TransactionLines => f.write_str("transaction lines"),
        }
    }
}
