// MySQL ledger.
//
// Tables (see migrations/):
// - enrollment_ledger_heads: one row per enrollment holding entry_count, the
//   optimistic-concurrency token, locked with SELECT ... FOR UPDATE on append
// - ledger_payments: one row per payment, UNIQUE(enrollment_id, reference)
// - ledger_allocations: tranche lines of each payment
// - ledger_receipts: issued receipts, one per payment

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySql, MySqlPool, Transaction};

use super::{AppendOutcome, TransactionLedger};
use crate::core::{AppError, Currency, Result};
use crate::modules::ledger::models::{
    AllocationTarget, Payment, PaymentResolution, Receipt, TrancheAllocation,
};

const PAYMENT_COLUMNS: &str = r#"
    id, reference, enrollment_id, amount, currency, method,
    target_index, status, failure_reason, submitted_at, resolved_at
"#;

/// Ledger persisted in MySQL
pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn fetch_reference_in_tx(
        tx: &mut Transaction<'_, MySql>,
        enrollment_id: &str,
        reference: &str,
    ) -> Result<Option<Payment>> {
        let sql = format!(
            "SELECT {} FROM ledger_payments WHERE enrollment_id = ? AND reference = ?",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(enrollment_id)
            .bind(reference)
            .fetch_optional(&mut **tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let allocations = sqlx::query_as::<_, AllocationRow>(
            r#"
            SELECT payment_id, tranche_index, amount_applied
            FROM ledger_allocations
            WHERE payment_id = ?
            ORDER BY tranche_index ASC
            "#,
        )
        .bind(&row.id)
        .fetch_all(&mut **tx)
        .await?;

        row.into_payment(allocations).map(Some)
    }

    async fn allocations_for(&self, payment_ids: &[String]) -> Result<HashMap<String, Vec<AllocationRow>>> {
        let mut grouped: HashMap<String, Vec<AllocationRow>> = HashMap::new();
        if payment_ids.is_empty() {
            return Ok(grouped);
        }

        let placeholders = vec!["?"; payment_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT payment_id, tranche_index, amount_applied
            FROM ledger_allocations
            WHERE payment_id IN ({})
            ORDER BY payment_id ASC, tranche_index ASC
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, AllocationRow>(&sql);
        for id in payment_ids {
            query = query.bind(id);
        }

        for row in query.fetch_all(&self.pool).await? {
            grouped.entry(row.payment_id.clone()).or_default().push(row);
        }

        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<PaymentRow>) -> Result<Vec<Payment>> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut allocations = self.allocations_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let lines = allocations.remove(&row.id).unwrap_or_default();
                row.into_payment(lines)
            })
            .collect()
    }
}

#[async_trait]
impl TransactionLedger for MySqlLedger {
    async fn append(&self, payment: &Payment, expected_entries: usize) -> Result<AppendOutcome> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO enrollment_ledger_heads (enrollment_id, entry_count)
            VALUES (?, 0)
            ON DUPLICATE KEY UPDATE enrollment_id = enrollment_id
            "#,
        )
        .bind(&payment.enrollment_id)
        .execute(&mut *tx)
        .await?;

        let entry_count: i64 = sqlx::query_scalar(
            "SELECT entry_count FROM enrollment_ledger_heads WHERE enrollment_id = ? FOR UPDATE",
        )
        .bind(&payment.enrollment_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(existing) =
            Self::fetch_reference_in_tx(&mut tx, &payment.enrollment_id, &payment.reference).await?
        {
            tx.rollback().await?;
            return Ok(AppendOutcome::Existing(existing));
        }

        let expected = i64::try_from(expected_entries)
            .map_err(|_| AppError::internal("Entry count out of range"))?;
        if entry_count != expected {
            tx.rollback().await?;
            return Err(AppError::conflict(format!(
                "Ledger for enrollment '{}' changed: expected {} entries, found {}",
                payment.enrollment_id, expected_entries, entry_count
            )));
        }

        let target_index = payment
            .target
            .tranche_index()
            .map(i32::try_from)
            .transpose()
            .map_err(|_| AppError::internal("Tranche index out of range"))?;

        sqlx::query(
            r#"
            INSERT INTO ledger_payments (
                id, reference, enrollment_id, entry_seq, amount, currency, method,
                target_index, status, failure_reason, submitted_at, resolved_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.reference)
        .bind(&payment.enrollment_id)
        .bind(entry_count + 1)
        .bind(payment.amount)
        .bind(payment.currency.code())
        .bind(payment.method.as_str())
        .bind(target_index)
        .bind(payment.status.as_str())
        .bind(&payment.failure_reason)
        .bind(payment.submitted_at)
        .bind(payment.resolved_at)
        .execute(&mut *tx)
        .await?;

        for line in &payment.allocation {
            let tranche_index = i32::try_from(line.tranche_index)
                .map_err(|_| AppError::internal("Tranche index out of range"))?;
            sqlx::query(
                r#"
                INSERT INTO ledger_allocations (payment_id, tranche_index, amount_applied)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(&payment.id)
            .bind(tranche_index)
            .bind(line.amount_applied)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE enrollment_ledger_heads SET entry_count = entry_count + 1 WHERE enrollment_id = ?",
        )
        .bind(&payment.enrollment_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            payment_id = payment.id.as_str(),
            enrollment_id = payment.enrollment_id.as_str(),
            entry_seq = entry_count + 1,
            "Ledger entry appended"
        );

        Ok(AppendOutcome::Appended(payment.clone()))
    }

    async fn find_by_id(&self, payment_id: &str) -> Result<Option<Payment>> {
        let sql = format!("SELECT {} FROM ledger_payments WHERE id = ?", PAYMENT_COLUMNS);
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_by_reference(
        &self,
        enrollment_id: &str,
        reference: &str,
    ) -> Result<Option<Payment>> {
        let sql = format!(
            "SELECT {} FROM ledger_payments WHERE enrollment_id = ? AND reference = ?",
            PAYMENT_COLUMNS
        );
        let row = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(enrollment_id)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn history(&self, enrollment_id: &str) -> Result<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM ledger_payments WHERE enrollment_id = ? ORDER BY entry_seq ASC",
            PAYMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, PaymentRow>(&sql)
            .bind(enrollment_id)
            .fetch_all(&self.pool)
            .await?;

        self.hydrate(rows).await
    }

    async fn resolve(&self, payment_id: &str, resolution: PaymentResolution) -> Result<Payment> {
        let mut payment = self
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        payment.resolve(resolution, Utc::now())?;

        // Guarded on status so a concurrent resolution cannot land twice
        let result = sqlx::query(
            r#"
            UPDATE ledger_payments
            SET status = ?, failure_reason = ?, resolved_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(payment.status.as_str())
        .bind(&payment.failure_reason)
        .bind(payment.resolved_at)
        .bind(payment_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::conflict(format!(
                "Payment '{}' was resolved concurrently",
                payment_id
            )));
        }

        Ok(payment)
    }

    async fn save_receipt(&self, receipt: &Receipt) -> Result<Receipt> {
        let body = serde_json::to_string(receipt)?;

        sqlx::query(
            r#"
            INSERT INTO ledger_receipts (payment_id, receipt_number, digest, body, issued_at)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE payment_id = payment_id
            "#,
        )
        .bind(&receipt.payment_id)
        .bind(&receipt.receipt_number)
        .bind(&receipt.digest)
        .bind(body)
        .bind(receipt.issued_at)
        .execute(&self.pool)
        .await?;

        self.receipt_for(&receipt.payment_id)
            .await?
            .ok_or_else(|| AppError::internal("Receipt was stored but not found"))
    }

    async fn receipt_for(&self, payment_id: &str) -> Result<Option<Receipt>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM ledger_receipts WHERE payment_id = ?")
                .bind(payment_id)
                .fetch_optional(&self.pool)
                .await?;

        body.map(|raw| serde_json::from_str::<Receipt>(&raw).map_err(AppError::from))
            .transpose()
    }
}

/// Database row for a ledger payment (for SQLx mapping)
#[derive(Debug, FromRow)]
struct PaymentRow {
    id: String,
    reference: String,
    enrollment_id: String,
    amount: i64,
    currency: String,
    method: String,
    target_index: Option<i32>,
    status: String,
    failure_reason: Option<String>,
    submitted_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct AllocationRow {
    payment_id: String,
    tranche_index: i32,
    amount_applied: i64,
}

impl PaymentRow {
    fn into_payment(self, allocations: Vec<AllocationRow>) -> Result<Payment> {
        let target = match self.target_index {
            None => AllocationTarget::Global,
            Some(index) => AllocationTarget::Tranche {
                index: usize::try_from(index)
                    .map_err(|_| AppError::internal(format!("Negative tranche index {}", index)))?,
            },
        };

        let allocation = allocations
            .into_iter()
            .map(|row| {
                Ok(TrancheAllocation {
                    tranche_index: usize::try_from(row.tranche_index).map_err(|_| {
                        AppError::internal(format!("Negative tranche index {}", row.tranche_index))
                    })?,
                    amount_applied: row.amount_applied,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Payment {
            id: self.id,
            reference: self.reference,
            enrollment_id: self.enrollment_id,
            amount: self.amount,
            currency: Currency::try_from(self.currency).map_err(AppError::Internal)?,
            method: self.method.parse().map_err(AppError::Internal)?,
            target,
            allocation,
            status: self.status.parse().map_err(AppError::Internal)?,
            failure_reason: self.failure_reason,
            submitted_at: self.submitted_at,
            resolved_at: self.resolved_at,
        })
    }
}
