// Payment provider with scripted answers
//
// Answers are consumed in order; once the script is empty every charge gets
// the fallback answer.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tuition_ledger::core::{AppError, Result};
use tuition_ledger::payments::{ChargeOutcome, ChargeRequest, PaymentProvider};

#[derive(Debug, Clone)]
pub enum ScriptedAnswer {
    Outcome(ChargeOutcome),
    Error(String),
}

pub struct ScriptedProvider {
    script: Mutex<VecDeque<ScriptedAnswer>>,
    fallback: ScriptedAnswer,
    charges: Mutex<Vec<ChargeRequest>>,
}

impl ScriptedProvider {
    /// Every charge gets the same outcome
    pub fn always(outcome: ChargeOutcome) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: ScriptedAnswer::Outcome(outcome),
            charges: Mutex::new(Vec::new()),
        }
    }

    pub fn authorizing() -> Self {
        Self::always(ChargeOutcome::Authorized)
    }

    pub fn deferring() -> Self {
        Self::always(ChargeOutcome::Deferred)
    }

    /// Queue an answer for the next unscripted charge
    pub fn then(self, answer: ScriptedAnswer) -> Self {
        self.script.lock().unwrap().push_back(answer);
        self
    }

    pub fn then_decline(self, reason: &str) -> Self {
        self.then(ScriptedAnswer::Outcome(ChargeOutcome::Declined {
            reason: reason.to_string(),
        }))
    }

    pub fn then_error(self, message: &str) -> Self {
        self.then(ScriptedAnswer::Error(message.to_string()))
    }

    /// Charges received so far
    pub fn charges(&self) -> Vec<ChargeRequest> {
        self.charges.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        self.charges.lock().unwrap().push(request.clone());

        let answer = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match answer {
            ScriptedAnswer::Outcome(outcome) => Ok(outcome),
            ScriptedAnswer::Error(message) => Err(AppError::PaymentProvider(message)),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
