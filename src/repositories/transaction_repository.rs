use async_trait::async_trait;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        notification::NotificationEvent,
        transaction::{BookingKey, NewTransaction, PaymentStatus, Transaction, TransactionDetails},
    },
    repositories::{StatusUpdate, TransactionRepository},
};

/// Transaction columns plus the aliased house and user columns read into
/// [`TransactionDetails`].
const DETAILS_SELECT: &str = r#"
    SELECT t.*,
           h.name AS house_name,
           h.price AS house_price,
           u.fullname AS user_fullname,
           u.email AS user_email
    FROM transactions t
    JOIN houses h ON h.id = t.house_id
    JOIN users u ON u.id = t.user_id
"#;

/// [`TransactionRepository`] backed by the `transactions` and
/// `notification_events` tables.
#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    pool: DbPool,
}

impl PgTransactionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<TransactionDetails>, AppError> {
        let transactions =
            sqlx::query_as::<_, TransactionDetails>(&format!("{DETAILS_SELECT} ORDER BY t.created_at DESC"))
                .fetch_all(&self.pool)
                .await?;

        Ok(transactions)
    }

    async fn get(&self, id: i64) -> Result<Option<TransactionDetails>, AppError> {
        let transaction =
            sqlx::query_as::<_, TransactionDetails>(&format!("{DETAILS_SELECT} WHERE t.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM transactions WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_pending(&self, key: &BookingKey) -> Result<Option<TransactionDetails>, AppError> {
        let transaction = sqlx::query_as::<_, TransactionDetails>(&format!(
            r#"{DETAILS_SELECT}
            WHERE t.house_id = $1
              AND t.user_id = $2
              AND t.check_in = $3
              AND t.check_out = $4
              AND t.total = $5
              AND t.status_payment = $6
            ORDER BY t.created_at DESC
            LIMIT 1"#
        ))
        .bind(key.house_id)
        .bind(key.user_id)
        .bind(key.check_in)
        .bind(key.check_out)
        .bind(key.total)
        .bind(PaymentStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    async fn create(&self, transaction: NewTransaction) -> Result<Transaction, AppError> {
        let id = transaction.id;

        let result = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                id,
                check_in,
                check_out,
                house_id,
                user_id,
                total,
                status_payment,
                attachment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(transaction.id)
        .bind(transaction.check_in)
        .bind(transaction.check_out)
        .bind(transaction.house_id)
        .bind(transaction.user_id)
        .bind(transaction.total)
        .bind(transaction.status_payment)
        .bind(transaction.attachment)
        .fetch_one(&self.pool)
        .await;

        // Two requests that picked the same timestamp collide here.
        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::DuplicateTransaction(id))
            }
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(
                AppError::Validation("house_id or user_id does not exist".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_status(&self, id: i64, status: PaymentStatus) -> Result<StatusUpdate, AppError> {
        // A concurrent writer holding the row lock makes this re-check the
        // predicate against the committed row, so only one caller matches.
        let updated = sqlx::query(
            r#"
            UPDATE transactions
            SET status_payment = $1, updated_at = NOW()
            WHERE id = $2 AND status_payment IS DISTINCT FROM $1
            "#,
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            Ok(StatusUpdate::Changed)
        } else if self.exists(id).await? {
            Ok(StatusUpdate::Unchanged)
        } else {
            Ok(StatusUpdate::Missing)
        }
    }

    async fn delete(&self, id: i64) -> Result<Option<Transaction>, AppError> {
        let transaction =
            sqlx::query_as::<_, Transaction>("DELETE FROM transactions WHERE id = $1 RETURNING *")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(transaction)
    }

    async fn record_notification(&self, event: NotificationEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notification_events (
                id,
                transaction_id,
                recipient,
                status,
                attempts,
                delivered,
                error
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.id)
        .bind(event.transaction_id)
        .bind(event.recipient)
        .bind(event.status)
        .bind(event.attempts)
        .bind(event.delivered)
        .bind(event.error)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
