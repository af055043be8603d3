//! Repository pattern for database operations
//!
//! Every write is an insert that ignores uniqueness conflicts, so replaying
//! the same input never changes existing rows.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Schema, Set,
};
use std::collections::HashMap;
use tracing::debug;

/// Review row ready for insertion, bank already resolved to its key
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub review_id: String,
    pub bank_id: i32,
    pub review_text: Option<String>,
    pub rating: Option<i32>,
    pub review_date: Option<NaiveDate>,
    pub source: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// Create `banks` and `reviews` if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        let backend = self.conn().get_database_backend();
        let schema = Schema::new(backend);

        let mut banks = schema.create_table_from_entity(BankEntity);
        banks.if_not_exists();
        self.conn().execute(backend.build(&banks)).await?;

        let mut reviews = schema.create_table_from_entity(ReviewEntity);
        reviews.if_not_exists();
        self.conn().execute(backend.build(&reviews)).await?;

        debug!(?backend, "Schema ensured");
        Ok(())
    }

    // ========================================================================
    // Bank Operations
    // ========================================================================

    /// Insert a bank unless one with the same name exists; true if inserted
    pub async fn insert_bank(&self, bank_name: &str, app_name: &str) -> Result<bool> {
        let bank = BankActiveModel {
            bank_name: Set(bank_name.to_string()),
            app_name: Set(app_name.to_string()),
            ..Default::default()
        };

        let inserted = BankEntity::insert(bank)
            .on_conflict(
                OnConflict::column(BankColumn::BankName)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(inserted > 0)
    }

    /// Map of bank name to generated bank id
    pub async fn bank_ids(&self) -> Result<HashMap<String, i32>> {
        let banks = BankEntity::find().all(self.conn()).await?;

        Ok(banks
            .into_iter()
            .map(|bank| (bank.bank_name, bank.bank_id))
            .collect())
    }

    pub async fn count_banks(&self) -> Result<u64> {
        BankEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Review Operations
    // ========================================================================

    /// Insert a review unless its id is already stored; true if inserted
    pub async fn insert_review(&self, review: NewReview) -> Result<bool> {
        let row = ReviewActiveModel {
            review_id: Set(review.review_id),
            bank_id: Set(Some(review.bank_id)),
            review_text: Set(review.review_text),
            rating: Set(review.rating),
            review_date: Set(review.review_date),
            source: Set(review.source),
        };

        let inserted = ReviewEntity::insert(row)
            .on_conflict(
                OnConflict::column(ReviewColumn::ReviewId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;

        Ok(inserted > 0)
    }

    /// Find review by its natural id
    pub async fn find_review(&self, review_id: &str) -> Result<Option<Review>> {
        ReviewEntity::find_by_id(review_id.to_string())
            .one(self.conn())
            .await
            .map_err(Into::into)
    }

    pub async fn count_reviews(&self) -> Result<u64> {
        ReviewEntity::find()
            .count(self.conn())
            .await
            .map_err(Into::into)
    }
}
