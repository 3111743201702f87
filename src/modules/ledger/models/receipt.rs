use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{Payment, PaymentStatus};
use crate::core::{AppError, Currency, MinorUnits, Result};
use crate::modules::fee_plans::models::{Enrollment, FeePlan};

/// One line of a receipt: a tranche and what the payment applied to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub tranche_index: usize,
    pub tranche_name: String,
    pub amount_applied: MinorUnits,
    pub display_amount: String,
}

/// Proof of a settled payment.
///
/// Issued once per `complete` or `partial` payment. `digest` is the SHA-256 of
/// the receipt's canonical fields so a stored copy can be checked for tampering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub receipt_number: String,
    pub payment_id: String,
    pub reference: String,
    pub enrollment_id: String,
    pub student_id: String,
    pub school_year_id: String,
    pub status: PaymentStatus,
    pub method: String,
    pub currency: Currency,
    pub amount_paid: MinorUnits,
    pub amount_applied: MinorUnits,
    pub display_amount_applied: String,
    pub lines: Vec<ReceiptLine>,
    pub issued_at: DateTime<Utc>,
    pub digest: String,
}

impl Receipt {
    /// Issue a receipt for a settled payment
    ///
    /// # Errors
    /// * `Validation` - payment is pending or failed
    /// * `Internal` - allocation names a tranche missing from the plan
    pub fn issue(
        payment: &Payment,
        enrollment: &Enrollment,
        plan: &FeePlan,
        issued_at: DateTime<Utc>,
    ) -> Result<Self> {
        if !payment.status.counts_as_paid() {
            return Err(AppError::validation(format!(
                "No receipt for payment '{}' in status {}",
                payment.reference, payment.status
            )));
        }

        let lines = payment
            .allocation
            .iter()
            .map(|line| {
                let tranche = plan.tranche(line.tranche_index).ok_or_else(|| {
                    AppError::internal(format!(
                        "Payment '{}' applies to unknown tranche {}",
                        payment.id, line.tranche_index
                    ))
                })?;
                Ok(ReceiptLine {
                    tranche_index: line.tranche_index,
                    tranche_name: tranche.name.clone(),
                    amount_applied: line.amount_applied,
                    display_amount: payment.currency.format_amount(line.amount_applied),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let amount_applied = payment.applied_amount();
        let short_id: String = payment.id.chars().filter(|c| *c != '-').take(8).collect();

        let mut receipt = Self {
            receipt_number: format!(
                "RCT-{}-{}",
                issued_at.format("%Y%m%d"),
                short_id.to_uppercase()
            ),
            payment_id: payment.id.clone(),
            reference: payment.reference.clone(),
            enrollment_id: enrollment.id.clone(),
            student_id: enrollment.student_id.clone(),
            school_year_id: plan.school_year_id().to_string(),
            status: payment.status,
            method: payment.method.to_string(),
            currency: payment.currency,
            amount_paid: payment.amount,
            amount_applied,
            display_amount_applied: payment.currency.format_amount(amount_applied),
            lines,
            issued_at,
            digest: String::new(),
        };
        receipt.digest = receipt.compute_digest();

        Ok(receipt)
    }

    fn compute_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            self.receipt_number.as_str(),
            self.payment_id.as_str(),
            self.reference.as_str(),
            self.enrollment_id.as_str(),
            self.student_id.as_str(),
            self.school_year_id.as_str(),
            self.status.as_str(),
            self.method.as_str(),
            self.currency.code(),
        ] {
            hasher.update(field.as_bytes());
            hasher.update(b"|");
        }
        hasher.update(self.amount_paid.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.amount_applied.to_string().as_bytes());
        for line in &self.lines {
            hasher.update(format!("|{}:{}", line.tranche_index, line.amount_applied).as_bytes());
        }
        hasher.update(b"|");
        hasher.update(self.issued_at.timestamp_millis().to_string().as_bytes());

        hex::encode(hasher.finalize())
    }

    /// Check the stored digest against the receipt's fields
    pub fn verify_digest(&self) -> bool {
        self.compute_digest() == self.digest
    }

    /// Plain-text rendering for printing or email bodies
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Receipt {}\n", self.receipt_number));
        out.push_str(&format!("Issued: {}\n", self.issued_at.format("%Y-%m-%d %H:%M UTC")));
        out.push_str(&format!("Student: {}\n", self.student_id));
        out.push_str(&format!("School year: {}\n", self.school_year_id));
        out.push_str(&format!("Reference: {}\n", self.reference));
        out.push_str(&format!("Method: {}\n", self.method));
        for line in &self.lines {
            out.push_str(&format!("  {:<24} {}\n", line.tranche_name, line.display_amount));
        }
        out.push_str(&format!("Total applied: {}\n", self.display_amount_applied));
        if self.amount_paid > self.amount_applied {
            out.push_str(&format!(
                "Not applied: {}\n",
                self.currency.format_amount(self.amount_paid - self.amount_applied)
            ));
        }
        out.push_str(&format!("Digest: {}\n", self.digest));
        out
    }
}
