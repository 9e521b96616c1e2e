//! The seeded organisation-wide chart.

use super::types::{AccountType, FundType};

/// A default account installed when the database is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultAccount {
    /// Account code.
    pub code: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Classification.
    pub account_type: AccountType,
    /// Fund restriction.
    pub fund_type: Option<FundType>,
    /// Whether the account is frozen.
    pub is_system: bool,
}

const fn system(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    fund_type: Option<FundType>,
) -> DefaultAccount {
    DefaultAccount {
        code,
        name,
        account_type,
        fund_type,
        is_system: true,
    }
}

const fn standard(
    code: &'static str,
    name: &'static str,
    account_type: AccountType,
    fund_type: Option<FundType>,
) -> DefaultAccount {
    DefaultAccount {
        code,
        name,
        account_type,
        fund_type,
        is_system: false,
    }
}

/// Default chart shared by every scheme.
pub const DEFAULT_CHART: &[DefaultAccount] = &[
    system("1000", "Cash at Bank - Administrative Fund", AccountType::Asset, Some(FundType::Admin)),
    system("1100", "Cash at Bank - Capital Works Fund", AccountType::Asset, Some(FundType::CapitalWorks)),
    system("1200", "Levies Receivable", AccountType::Asset, None),
    system("2000", "Levies in Advance", AccountType::Liability, None),
    system("3000", "Owners' Funds - Administrative", AccountType::Equity, Some(FundType::Admin)),
    system("3100", "Owners' Funds - Capital Works", AccountType::Equity, Some(FundType::CapitalWorks)),
    system("4000", "Levy Income - Administrative", AccountType::Income, Some(FundType::Admin)),
    system("4100", "Levy Income - Capital Works", AccountType::Income, Some(FundType::CapitalWorks)),
    standard("4200", "Interest Income", AccountType::Income, None),
    standard("4300", "Other Income", AccountType::Income, None),
    standard("6000", "Insurance", AccountType::Expense, Some(FundType::Admin)),
    standard("6100", "Repairs & Maintenance", AccountType::Expense, Some(FundType::Admin)),
    standard("6200", "Management Fees", AccountType::Expense, Some(FundType::Admin)),
    standard("6300", "Utilities", AccountType::Expense, Some(FundType::Admin)),
    standard("6400", "Bank Charges", AccountType::Expense, None),
    standard("7000", "Capital Works - Building", AccountType::Expense, Some(FundType::CapitalWorks)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::chart::ChartService;
    use std::collections::HashSet;

    #[test]
    fn test_default_chart_codes_are_unique_and_valid() {
        let mut seen = HashSet::new();
        for account in DEFAULT_CHART {
            assert!(ChartService::validate_code(account.code).is_ok());
            assert!(seen.insert(account.code), "duplicate code {}", account.code);
        }
    }

    #[test]
    fn test_trust_accounts_are_seeded_as_system_assets() {
        for fund in FundType::ALL {
            let trust = DEFAULT_CHART
                .iter()
                .find(|a| a.code == fund.trust_account_code())
                .unwrap();
            assert!(trust.is_system);
            assert_eq!(trust.account_type, AccountType::Asset);
            assert_eq!(trust.fund_type, Some(fund));
        }
    }
}
