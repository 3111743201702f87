use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::{ChargeOutcome, ChargeRequest, PaymentAllocator, PaymentProvider};
use crate::core::{AllocationError, AppError, EnrollmentLocks, Result};
use crate::modules::fee_plans::{models::ResolvedFeePlan, services::FeePlanResolver};
use crate::modules::ledger::{
    models::{Payment, PaymentResolution, PaymentStatus, Receipt},
    repositories::{AppendOutcome, TransactionLedger},
};
use crate::modules::payments::models::{
    AllocationResult, CallbackOutcome, CallbackStatus, ProviderCallback, SubmissionOutcome,
    SubmitPaymentRequest,
};

/// Payment submission and settlement.
///
/// Every operation that reads the ledger and then writes it runs under the
/// enrollment's lock, so allocation always sees the latest history.
#[derive(Clone)]
pub struct PaymentService {
    resolver: FeePlanResolver,
    ledger: Arc<dyn TransactionLedger>,
    provider: Arc<dyn PaymentProvider>,
    locks: EnrollmentLocks,
}

impl PaymentService {
    pub fn new(
        resolver: FeePlanResolver,
        ledger: Arc<dyn TransactionLedger>,
        provider: Arc<dyn PaymentProvider>,
        locks: EnrollmentLocks,
    ) -> Self {
        Self {
            resolver,
            ledger,
            provider,
            locks,
        }
    }

    /// Submit a payment for an enrollment
    ///
    /// Retrying with the same reference and arguments returns the recorded
    /// entry without allocating again.
    ///
    /// # Errors
    /// * `Validation` - malformed request or currency mismatch
    /// * `EnrollmentRequired` - enrollment is not active
    /// * `Allocation` - the allocator rejected the amount or target
    /// * `Conflict` - reference reused with different arguments
    pub async fn submit_payment(
        &self,
        enrollment_id: &str,
        request: SubmitPaymentRequest,
    ) -> Result<SubmissionOutcome> {
        request.validate()?;

        let _guard = self.locks.acquire(enrollment_id).await;

        if let Some(existing) = self
            .ledger
            .find_by_reference(enrollment_id, &request.reference)
            .await?
        {
            return Self::replay(&request, existing);
        }

        let resolved = self.resolver.resolve_for_enrollment(enrollment_id).await?;
        let currency = resolved.plan.currency();
        if let Some(requested_currency) = request.currency {
            if requested_currency != currency {
                return Err(AppError::validation(format!(
                    "Payment currency {} does not match fee plan currency {}",
                    requested_currency, currency
                )));
            }
        }

        let history = self.ledger.history(enrollment_id).await?;
        let outstanding = PaymentAllocator::outstanding(&resolved.plan, &history);

        let allocation =
            match PaymentAllocator::allocate(&outstanding, request.amount, request.target) {
                Ok(allocation) => allocation,
                Err(AllocationError::AlreadySettled) => {
                    info!(
                        enrollment_id = enrollment_id,
                        reference = request.reference.as_str(),
                        "Nothing outstanding for payment target; no entry written"
                    );
                    return Ok(SubmissionOutcome::AlreadySettled);
                }
                Err(e) => {
                    warn!(
                        enrollment_id = enrollment_id,
                        reference = request.reference.as_str(),
                        amount = request.amount,
                        reason = e.kind(),
                        "Payment rejected by allocator"
                    );
                    return Err(e.into());
                }
            };

        let payment = Payment::pending(
            request.reference.clone(),
            enrollment_id.to_string(),
            request.amount,
            currency,
            request.method,
            request.target,
            allocation.lines,
        )?;

        let payment = match self.ledger.append(&payment, history.len()).await? {
            AppendOutcome::Appended(payment) => payment,
            AppendOutcome::Existing(existing) => return Self::replay(&request, existing),
        };

        info!(
            payment_id = payment.id.as_str(),
            enrollment_id = enrollment_id,
            reference = payment.reference.as_str(),
            applied = payment.applied_amount(),
            unapplied = payment.unapplied_amount(),
            "Payment recorded as pending"
        );

        let payment = self.charge(payment, &resolved).await?;

        Ok(SubmissionOutcome::Accepted(AllocationResult::from(&payment)))
    }

    /// Apply a provider callback to the pending entry it names
    ///
    /// # Errors
    /// * `NotFound` - no payment with this reference for the enrollment
    /// * `Conflict` - the payment already carries a different verdict
    pub async fn handle_provider_callback(
        &self,
        callback: ProviderCallback,
    ) -> Result<CallbackOutcome> {
        let _guard = self.locks.acquire(&callback.enrollment_id).await;

        let payment = self
            .ledger
            .find_by_reference(&callback.enrollment_id, &callback.reference)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Payment '{}' not found for enrollment '{}'",
                    callback.reference, callback.enrollment_id
                ))
            })?;

        if !payment.status.is_pending() {
            let same_verdict = match callback.status {
                CallbackStatus::Complete => payment.status.counts_as_paid(),
                CallbackStatus::Failed => payment.status == PaymentStatus::Failed,
            };
            if same_verdict {
                info!(
                    payment_id = payment.id.as_str(),
                    status = %payment.status,
                    "Duplicate provider callback ignored"
                );
                return Ok(CallbackOutcome::Duplicate(AllocationResult::from(&payment)));
            }
            warn!(
                payment_id = payment.id.as_str(),
                status = %payment.status,
                callback_status = ?callback.status,
                "Provider callback contradicts recorded verdict"
            );
            return Err(AppError::conflict(format!(
                "Payment '{}' is already {}",
                payment.reference, payment.status
            )));
        }

        let payment = match callback.status {
            CallbackStatus::Complete => {
                let resolved = self
                    .resolver
                    .lookup_for_enrollment(&callback.enrollment_id)
                    .await?;
                self.settle(&payment, &resolved).await?
            }
            CallbackStatus::Failed => {
                let reason = callback
                    .reason
                    .unwrap_or_else(|| "declined by provider".to_string());
                self.fail(&payment, reason).await?
            }
        };

        Ok(CallbackOutcome::Applied(AllocationResult::from(&payment)))
    }

    /// Ledger history for an enrollment, in submission order
    pub async fn history(&self, enrollment_id: &str) -> Result<Vec<Payment>> {
        self.resolver.lookup_for_enrollment(enrollment_id).await?;
        self.ledger.history(enrollment_id).await
    }

    /// Receipt of a settled payment; issued on first request if missing
    ///
    /// # Errors
    /// * `NotFound` - unknown payment, or payment is pending or failed
    pub async fn receipt(&self, payment_id: &str) -> Result<Receipt> {
        let payment = self
            .ledger
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment '{}' not found", payment_id)))?;

        if !payment.status.counts_as_paid() {
            return Err(AppError::not_found(format!(
                "No receipt for payment '{}' in status {}",
                payment_id, payment.status
            )));
        }

        if let Some(receipt) = self.ledger.receipt_for(payment_id).await? {
            return Ok(receipt);
        }

        let resolved = self
            .resolver
            .lookup_for_enrollment(&payment.enrollment_id)
            .await?;
        self.issue_receipt(&payment, &resolved).await
    }

    fn replay(request: &SubmitPaymentRequest, existing: Payment) -> Result<SubmissionOutcome> {
        if !request.matches(&existing) {
            warn!(
                payment_id = existing.id.as_str(),
                reference = existing.reference.as_str(),
                "Reference reused with different payment details"
            );
            return Err(AppError::conflict(format!(
                "Reference '{}' was already used for a different payment",
                existing.reference
            )));
        }

        info!(
            payment_id = existing.id.as_str(),
            reference = existing.reference.as_str(),
            status = %existing.status,
            "Replaying recorded payment"
        );
        Ok(SubmissionOutcome::Accepted(AllocationResult::from(&existing)))
    }

    async fn charge(&self, payment: Payment, resolved: &ResolvedFeePlan) -> Result<Payment> {
        let request = ChargeRequest {
            payment_id: payment.id.clone(),
            enrollment_id: payment.enrollment_id.clone(),
            reference: payment.reference.clone(),
            amount: payment.applied_amount(),
            currency: payment.currency,
            method: payment.method,
        };

        match self.provider.charge(&request).await {
            Ok(ChargeOutcome::Authorized) => self.settle(&payment, resolved).await,
            Ok(ChargeOutcome::Declined { reason }) => self.fail(&payment, reason).await,
            Ok(ChargeOutcome::Deferred) => {
                info!(
                    payment_id = payment.id.as_str(),
                    provider = self.provider.name(),
                    "Awaiting provider confirmation"
                );
                Ok(payment)
            }
            Err(e) => {
                // Terminal: the reservation is released and the family
                // resubmits under a new reference
                warn!(
                    payment_id = payment.id.as_str(),
                    provider = self.provider.name(),
                    error = %e,
                    "Provider call failed"
                );
                self.fail(&payment, e.to_string()).await
            }
        }
    }

    async fn settle(&self, payment: &Payment, resolved: &ResolvedFeePlan) -> Result<Payment> {
        let settled = self
            .ledger
            .resolve(&payment.id, PaymentResolution::Settled)
            .await?;

        info!(
            payment_id = settled.id.as_str(),
            enrollment_id = settled.enrollment_id.as_str(),
            status = %settled.status,
            "Payment settled"
        );

        // The settlement is committed; a missing receipt is issued on first read
        if let Err(e) = self.issue_receipt(&settled, resolved).await {
            warn!(
                payment_id = settled.id.as_str(),
                error = %e,
                "Receipt not stored; it will be issued on request"
            );
        }
        Ok(settled)
    }

    async fn fail(&self, payment: &Payment, reason: String) -> Result<Payment> {
        warn!(
            payment_id = payment.id.as_str(),
            enrollment_id = payment.enrollment_id.as_str(),
            reason = reason.as_str(),
            "Payment declined by provider"
        );
        self.ledger
            .resolve(&payment.id, PaymentResolution::Failed { reason })
            .await
    }

    async fn issue_receipt(&self, payment: &Payment, resolved: &ResolvedFeePlan) -> Result<Receipt> {
        let receipt = Receipt::issue(payment, &resolved.enrollment, &resolved.plan, Utc::now())?;
        let stored = self.ledger.save_receipt(&receipt).await?;

        info!(
            payment_id = payment.id.as_str(),
            receipt_number = stored.receipt_number.as_str(),
            "Receipt issued"
        );
        Ok(stored)
    }
}
