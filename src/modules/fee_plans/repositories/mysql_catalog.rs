// MySQL-backed view of the registration service's tables.
//
// Reads only:
// - enrollments(id, student_id, school_year_id, status)
// - fee_plan_tranches(school_year_id, tranche_index, name, amount, currency,
//   due_date, is_mandatory, allows_partial)

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, MySqlPool};

use super::EnrollmentCatalog;
use crate::core::{AppError, Currency, Result};
use crate::modules::fee_plans::models::{Enrollment, FeePlan, Tranche};

/// Catalog reading enrollments and fee plans from MySQL
pub struct MySqlCatalog {
    pool: MySqlPool,
}

impl MySqlCatalog {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentCatalog for MySqlCatalog {
    async fn find_enrollment(&self, enrollment_id: &str) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, school_year_id, status
            FROM enrollments
            WHERE id = ?
            "#,
        )
        .bind(enrollment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(enrollment)
    }

    async fn find_student_enrollments(
        &self,
        student_id: &str,
        school_year_id: &str,
    ) -> Result<Vec<Enrollment>> {
        let enrollments = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, student_id, school_year_id, status
            FROM enrollments
            WHERE student_id = ? AND school_year_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(student_id)
        .bind(school_year_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(enrollments)
    }

    async fn find_fee_plan(&self, school_year_id: &str) -> Result<Option<FeePlan>> {
        let rows = sqlx::query_as::<_, TrancheRow>(
            r#"
            SELECT
                tranche_index, name, amount, currency, due_date,
                is_mandatory, allows_partial
            FROM fee_plan_tranches
            WHERE school_year_id = ?
            ORDER BY tranche_index ASC
            "#,
        )
        .bind(school_year_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(None);
        }

        let tranches = rows
            .into_iter()
            .map(Tranche::try_from)
            .collect::<Result<Vec<_>>>()?;

        FeePlan::new(school_year_id, tranches).map(Some).map_err(|e| {
            tracing::error!(
                school_year_id = school_year_id,
                error = %e,
                "Published fee plan violates plan invariants"
            );
            AppError::internal(format!(
                "Fee plan for school year '{}' is malformed",
                school_year_id
            ))
        })
    }
}

/// Database row for a tranche (for SQLx mapping)
#[derive(Debug, FromRow)]
struct TrancheRow {
    tranche_index: i32,
    name: String,
    amount: i64,
    currency: String,
    due_date: NaiveDate,
    is_mandatory: bool,
    allows_partial: bool,
}

impl TryFrom<TrancheRow> for Tranche {
    type Error = AppError;

    fn try_from(row: TrancheRow) -> Result<Self> {
        let index = usize::try_from(row.tranche_index)
            .map_err(|_| AppError::internal(format!("Negative tranche index {}", row.tranche_index)))?;
        let currency = Currency::try_from(row.currency).map_err(AppError::Internal)?;

        Ok(Tranche {
            index,
            name: row.name,
            amount: row.amount,
            currency,
            due_date: row.due_date,
            is_mandatory: row.is_mandatory,
            allows_partial: row.allows_partial,
        })
    }
}
