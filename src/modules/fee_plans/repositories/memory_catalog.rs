use std::collections::HashMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::Deserialize;

use super::EnrollmentCatalog;
use crate::core::{AppError, Result};
use crate::modules::fee_plans::models::{Enrollment, EnrollmentStatus, FeePlan, Tranche};

/// JSON seed for the in-memory catalog (`CATALOG_SEED_FILE`)
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub school_years: Vec<SchoolYearSeed>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Deserialize)]
pub struct SchoolYearSeed {
    pub id: String,
    pub tranches: Vec<Tranche>,
}

#[derive(Default)]
struct CatalogState {
    enrollments: HashMap<String, Enrollment>,
    fee_plans: HashMap<String, FeePlan>,
}

/// Process-local catalog for development and tests
#[derive(Default)]
pub struct InMemoryCatalog {
    state: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a parsed seed; every plan is validated
    pub fn from_seed(seed: CatalogSeed) -> Result<Self> {
        let catalog = Self::new();
        for year in seed.school_years {
            catalog.insert_fee_plan(FeePlan::new(year.id, year.tranches)?);
        }
        for enrollment in seed.enrollments {
            catalog.insert_enrollment(enrollment);
        }
        Ok(catalog)
    }

    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Configuration(format!(
                "Cannot read catalog seed '{}': {}",
                path.display(),
                e
            ))
        })?;
        let seed: CatalogSeed = serde_json::from_str(&raw)?;
        Self::from_seed(seed)
    }

    pub fn insert_enrollment(&self, enrollment: Enrollment) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.enrollments.insert(enrollment.id.clone(), enrollment);
    }

    pub fn insert_fee_plan(&self, plan: FeePlan) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state
            .fee_plans
            .insert(plan.school_year_id().to_string(), plan);
    }

    /// Mirror a status change published by the registration service
    pub fn set_enrollment_status(&self, enrollment_id: &str, status: EnrollmentStatus) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let enrollment = state
            .enrollments
            .get_mut(enrollment_id)
            .ok_or_else(|| AppError::not_found(format!("Enrollment '{}' not found", enrollment_id)))?;
        enrollment.status = status;
        Ok(())
    }
}

#[async_trait]
impl EnrollmentCatalog for InMemoryCatalog {
    async fn find_enrollment(&self, enrollment_id: &str) -> Result<Option<Enrollment>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.enrollments.get(enrollment_id).cloned())
    }

    async fn find_student_enrollments(
        &self,
        student_id: &str,
        school_year_id: &str,
    ) -> Result<Vec<Enrollment>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut enrollments: Vec<Enrollment> = state
            .enrollments
            .values()
            .filter(|e| e.student_id == student_id && e.school_year_id == school_year_id)
            .cloned()
            .collect();
        enrollments.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(enrollments)
    }

    async fn find_fee_plan(&self, school_year_id: &str) -> Result<Option<FeePlan>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.fee_plans.get(school_year_id).cloned())
    }
}
