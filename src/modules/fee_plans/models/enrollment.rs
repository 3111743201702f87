use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Enrollment lifecycle as published by the academic registration service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Registration started but not validated by the school
    Draft,
    /// Student is enrolled; payments are accepted
    Active,
    /// Student left the school for the year
    Withdrawn,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for EnrollmentStatus {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "withdrawn" => Ok(Self::Withdrawn),
            _ => Err(format!("Invalid enrollment status: {}", value)),
        }
    }
}

/// A student's registration for one school year (read-only here)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub school_year_id: String,
    #[sqlx(try_from = "String")]
    pub status: EnrollmentStatus,
}

impl Enrollment {
    pub fn new(
        id: impl Into<String>,
        student_id: impl Into<String>,
        school_year_id: impl Into<String>,
        status: EnrollmentStatus,
    ) -> Self {
        Self {
            id: id.into(),
            student_id: student_id.into(),
            school_year_id: school_year_id.into(),
            status,
        }
    }

    /// Only active enrollments may receive payments
    pub fn is_active(&self) -> bool {
        self.status == EnrollmentStatus::Active
    }
}
