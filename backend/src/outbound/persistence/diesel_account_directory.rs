//! PostgreSQL-backed `AccountDirectory` over host users and organisations.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AccountDirectory, AccountDirectoryError};
use crate::domain::{EmailAddress, Organisation, OrganisationId, User, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{OrganisationRow, SubscriptionRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{organisation_subscriptions, organisations, users};

/// Diesel-backed implementation of the account directory port.
#[derive(Clone)]
pub struct DieselAccountDirectory {
    pool: DbPool,
}

impl DieselAccountDirectory {
    /// Create a new directory with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AccountDirectoryError {
    map_basic_pool_error(error, AccountDirectoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AccountDirectoryError {
    map_basic_diesel_error(
        error,
        AccountDirectoryError::query,
        AccountDirectoryError::connection,
    )
}

fn row_to_user(row: UserRow) -> Result<User, AccountDirectoryError> {
    let email = EmailAddress::new(row.email).map_err(|error| {
        AccountDirectoryError::query(format!("user {} has an invalid email: {error}", row.id))
    })?;
    Ok(User::new(
        UserId::new(row.id),
        email,
        row.first_name,
        row.last_name,
    ))
}

fn rows_to_organisation(
    organisation: OrganisationRow,
    subscription: Option<SubscriptionRow>,
) -> Organisation {
    let base = Organisation::new(OrganisationId::new(organisation.id), organisation.name);
    match subscription.and_then(|row| row.plan) {
        Some(plan) => base.with_plan(plan),
        None => base,
    }
}

#[async_trait]
impl AccountDirectory for DieselAccountDirectory {
    async fn find_user(&self, user_id: &UserId) -> Result<Option<User>, AccountDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(user_id.get()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_user).transpose()
    }

    async fn find_organisation(
        &self,
        organisation_id: &OrganisationId,
    ) -> Result<Option<Organisation>, AccountDirectoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let Some(organisation) = organisations::table
            .filter(organisations::id.eq(organisation_id.get()))
            .select(OrganisationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let subscription: Option<SubscriptionRow> = organisation_subscriptions::table
            .filter(organisation_subscriptions::organisation_id.eq(organisation_id.get()))
            .select(SubscriptionRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(Some(rows_to_organisation(organisation, subscription)))
    }
}
