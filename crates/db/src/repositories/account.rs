//! Account repository for chart of accounts database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use strata_core::accounts::{
    Account, AccountChanges, ChartError, ChartService, EffectiveChart, NewAccount,
};
use strata_shared::types::{AccountId, SchemeId};
use tracing::info;

use crate::entities::{accounts, transaction_lines, transactions};
use crate::error::{RepositoryError, violates};

/// Loads the chart of accounts as `scheme_id` sees it.
pub(crate) async fn load_effective_chart<C: ConnectionTrait>(
    db: &C,
    scheme_id: SchemeId,
) -> Result<EffectiveChart, RepositoryError> {
    let defaults = accounts::Entity::find()
        .filter(accounts::Column::SchemeId.is_null())
        .all(db)
        .await?;
    let own = accounts::Entity::find()
        .filter(accounts::Column::SchemeId.eq(scheme_id.into_inner()))
        .all(db)
        .await?;

    Ok(EffectiveChart::merge(
        scheme_id,
        defaults.into_iter().map(Account::from).collect(),
        own.into_iter().map(Account::from).collect(),
    ))
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists the scheme's active accounts: its own plus organisation
    /// defaults, scheme codes taking precedence, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_effective_accounts(
        &self,
        scheme_id: SchemeId,
    ) -> Result<Vec<Account>, RepositoryError> {
        Ok(load_effective_chart(&self.db, scheme_id).await?.into_active())
    }

    /// Finds an account visible to the scheme.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account does not exist or belongs
    /// to another scheme.
    pub async fn find_account(
        &self,
        scheme_id: SchemeId,
        account_id: AccountId,
    ) -> Result<Account, RepositoryError> {
        find_visible(&self.db, scheme_id, account_id).await
    }

    /// Creates a scheme-specific account.
    ///
    /// # Errors
    ///
    /// Returns a chart error if validation fails, or a database error.
    pub async fn create_account(
        &self,
        scheme_id: SchemeId,
        input: NewAccount,
    ) -> Result<Account, RepositoryError> {
        let chart = load_effective_chart(&self.db, scheme_id).await?;
        ChartService::validate_new(scheme_id, &input, &chart)?;

        let now = Utc::now().fixed_offset();
        let code = input.code.trim().to_string();
        let model = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            scheme_id: Set(Some(scheme_id.into_inner())),
            code: Set(code.clone()),
            name: Set(input.name.trim().to_string()),
            account_type: Set(input.account_type.into()),
            fund_type: Set(input.fund_type.map(Into::into)),
            parent_id: Set(input.parent_id.map(AccountId::into_inner)),
            is_system: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = model.insert(&self.db).await.map_err(|err| {
            if violates(&err, "uq_accounts_scheme_code") {
                RepositoryError::from(ChartError::DuplicateCode(code.clone()))
            } else {
                err.into()
            }
        })?;
        let account = Account::from(inserted);

        info!(
            scheme_id = %scheme_id,
            account_id = %account.id,
            code = %account.code,
            "Account created"
        );
        Ok(account)
    }

    /// Updates an account the scheme owns.
    ///
    /// Organisation defaults are read-only here. The code must stay unique among the accounts sharing the account's
    /// scope and must not reuse a system code. The type is frozen once
    /// lines are posted.
    ///
    /// # Errors
    ///
    /// Returns a chart error if validation fails, or a database error.
    pub async fn update_account(
        &self,
        scheme_id: SchemeId,
        account_id: AccountId,
        changes: AccountChanges,
    ) -> Result<Account, RepositoryError> {
        let account = find_visible(&self.db, scheme_id, account_id).await?;
        ChartService::ensure_owned(scheme_id, &account)?;

        let siblings: Vec<Account> = accounts::Entity::find()
            .filter(
                Condition::any()
                    .add(accounts::Column::SchemeId.eq(scheme_id.into_inner()))
                    .add(accounts::Column::IsSystem.eq(true)),
            )
            .all(&self.db)
            .await?
            .into_iter()
            .map(Account::from)
            .collect();

        let line_count = transaction_lines::Entity::find()
            .filter(transaction_lines::Column::AccountId.eq(account_id.into_inner()))
            .count(&self.db)
            .await?;

        let updated = ChartService::validate_update(&account, &changes, &siblings, line_count)?;

        if let Some(parent_id) = updated.parent_id
            && updated.parent_id != account.parent_id
        {
            let chart = load_effective_chart(&self.db, scheme_id).await?;
            if chart.find(parent_id).is_none() {
                return Err(ChartError::ParentNotFound(parent_id).into());
            }
        }

        let active = accounts::ActiveModel {
            id: Set(account.id.into_inner()),
            code: Set(updated.code.clone()),
            name: Set(updated.name.trim().to_string()),
            account_type: Set(updated.account_type.into()),
            fund_type: Set(updated.fund_type.map(Into::into)),
            parent_id: Set(updated.parent_id.map(AccountId::into_inner)),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };

        let code = updated.code.clone();
        let saved = active.update(&self.db).await.map_err(|err| {
            if violates(&err, "uq_accounts_scheme_code") {
                RepositoryError::from(ChartError::DuplicateCode(code))
            } else {
                err.into()
            }
        })?;

        info!(
            scheme_id = %scheme_id,
            account_id = %account_id,
            "Account updated"
        );
        Ok(Account::from(saved))
    }

    /// Soft-deletes an account the scheme owns and nothing references.
    ///
    /// # Errors
    ///
    /// Returns `SystemAccountImmutable`, `DefaultAccountReadOnly`,
    /// `AccountInUse` with the first non-zero reference count, or a
    /// database error.
    pub async fn soft_delete_account(
        &self,
        scheme_id: SchemeId,
        account_id: AccountId,
    ) -> Result<(), RepositoryError> {
        let account = find_visible(&self.db, scheme_id, account_id).await?;
        ChartService::ensure_owned(scheme_id, &account)?;

        let transaction_refs = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(account_id.into_inner()))
            .count(&self.db)
            .await?;
        let line_refs = transaction_lines::Entity::find()
            .filter(transaction_lines::Column::AccountId.eq(account_id.into_inner()))
            .count(&self.db)
            .await?;

        ChartService::validate_soft_delete(&account, transaction_refs, line_refs)?;

        let active = accounts::ActiveModel {
            id: Set(account_id.into_inner()),
            is_active: Set(false),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        };
        active.update(&self.db).await?;

        info!(
            scheme_id = %scheme_id,
            account_id = %account_id,
            code = %account.code,
            "Account deactivated"
        );
        Ok(())
    }
}

async fn find_visible<C: ConnectionTrait>(
    db: &C,
    scheme_id: SchemeId,
    account_id: AccountId,
) -> Result<Account, RepositoryError> {
    accounts::Entity::find_by_id(account_id.into_inner())
        .one(db)
        .await?
        .map(Account::from)
        .filter(|a| a.is_visible_to(scheme_id))
        .ok_or_else(|| ChartError::AccountNotFound(account_id).into())
}
