//! PostgreSQL-backed `TrackerRepository` reading host acquisition trackers.

use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::Value;

use crate::domain::ports::{TrackerRepository, TrackerRepositoryError};
use crate::domain::{Tracker, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::TrackerRow;
use super::pool::{DbPool, PoolError};
use super::schema::lead_trackers;

/// Diesel-backed implementation of the tracker repository port.
#[derive(Clone)]
pub struct DieselTrackerRepository {
    pool: DbPool,
}

impl DieselTrackerRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TrackerRepositoryError {
    map_basic_pool_error(error, TrackerRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TrackerRepositoryError {
    map_basic_diesel_error(
        error,
        TrackerRepositoryError::query,
        TrackerRepositoryError::connection,
    )
}

/// Flatten campaign fields into strings. Nulls are dropped; other scalars
/// keep their JSON rendering.
fn decode_campaign_fields(value: Value) -> Result<BTreeMap<String, String>, TrackerRepositoryError> {
    let Value::Object(fields) = value else {
        return Err(TrackerRepositoryError::query(
            "campaign_fields must be a JSON object",
        ));
    };

    fields
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::Null => None,
            Value::String(text) => Some(Ok((name, text))),
            Value::Bool(_) | Value::Number(_) => Some(Ok((name, value.to_string()))),
            Value::Array(_) | Value::Object(_) => Some(Err(TrackerRepositoryError::query(
                format!("campaign field {name} must be a scalar"),
            ))),
        })
        .collect()
}

fn row_to_tracker(row: TrackerRow) -> Result<Tracker, TrackerRepositoryError> {
    Ok(Tracker {
        acquisition_token: row.hutk.filter(|token| !token.trim().is_empty()),
        campaign_fields: decode_campaign_fields(row.campaign_fields)?,
    })
}

#[async_trait]
impl TrackerRepository for DieselTrackerRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Tracker>, TrackerRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<TrackerRow> = lead_trackers::table
            .filter(lead_trackers::user_id.eq(user_id.get()))
            .select(TrackerRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_tracker).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn flattens_scalar_campaign_fields() {
        let tracker = row_to_tracker(TrackerRow {
            hutk: Some("hutk-9".to_owned()),
            campaign_fields: json!({
                "utm_source": "newsletter",
                "utm_id": 42,
                "utm_term": null
            }),
        })
        .expect("tracker decodes");

        assert_eq!(tracker.acquisition_token.as_deref(), Some("hutk-9"));
        assert_eq!(
            tracker.campaign_fields,
            BTreeMap::from([
                ("utm_id".to_owned(), "42".to_owned()),
                ("utm_source".to_owned(), "newsletter".to_owned()),
            ])
        );
    }

    #[rstest]
    fn blank_token_is_absent() {
        let tracker = row_to_tracker(TrackerRow {
            hutk: Some(" ".to_owned()),
            campaign_fields: json!({}),
        })
        .expect("tracker decodes");
        assert!(tracker.acquisition_token.is_none());
    }

    #[rstest]
    #[case::array(json!(["utm_source"]))]
    #[case::nested(json!({ "utm": { "source": "ads" } }))]
    fn rejects_non_flat_campaign_fields(#[case] campaign_fields: Value) {
        let error = row_to_tracker(TrackerRow {
            hutk: None,
            campaign_fields,
        })
        .expect_err("malformed fields");
        assert!(matches!(error, TrackerRepositoryError::Query { .. }));
    }
}
