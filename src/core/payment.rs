//! Simulated QR payment verification.
//!
//! There is no payment gateway behind the QR code. Verification waits a fixed
//! delay and then succeeds or fails at random; from the third attempt on it
//! always succeeds. A failure starts a cooldown during which verification
//! cannot be retried.

use crate::errors::{Error, Result};
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// How long a verification takes
pub const VERIFICATION_DELAY: Duration = Duration::from_secs(3);
/// How long re-verification is blocked after a failure
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(30);

const FAILURE_THRESHOLD: f64 = 0.3;
const GUARANTEED_AFTER_ATTEMPTS: u32 = 2;

/// Where a payment verification stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Not yet verified
    #[default]
    Pending,
    /// Verification running
    Verifying,
    /// Payment confirmed
    Success,
    /// Verification failed
    Failed,
}

/// Runs simulated verifications for one payment
#[derive(Debug)]
pub struct PaymentVerifier<R: Rng> {
    rng: R,
    status: PaymentStatus,
    attempts: u32,
    cooldown_until: Option<Instant>,
    delay: Duration,
    cooldown: Duration,
}

impl<R: Rng> PaymentVerifier<R> {
    /// A verifier with the standard delay and cooldown
    pub fn new(rng: R) -> Self {
        Self::with_timing(rng, VERIFICATION_DELAY, FAILURE_COOLDOWN)
    }

    /// A verifier with custom delay and cooldown
    pub const fn with_timing(rng: R, delay: Duration, cooldown: Duration) -> Self {
        Self {
            rng,
            status: PaymentStatus::Pending,
            attempts: 0,
            cooldown_until: None,
            delay,
            cooldown,
        }
    }

    /// Current status
    pub const fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Verifications started so far
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time left before another verification may start
    pub fn cooldown_remaining(&self) -> Option<Duration> {
        self.cooldown_until
            .map(|until| until.saturating_duration_since(Instant::now()))
            .filter(|left| !left.is_zero())
    }

    /// Back to pending with no attempts and no cooldown, as when the customer
    /// chooses to retry the payment.
    pub fn reset(&mut self) {
        self.status = PaymentStatus::Pending;
        self.attempts = 0;
        self.cooldown_until = None;
    }

    /// Runs one verification. Once started it always completes after the delay.
    ///
    /// # Errors
    /// Returns [`Error::VerificationCoolingDown`] if a previous failure's
    /// cooldown has not elapsed.
    pub async fn verify(&mut self) -> Result<PaymentStatus> {
        if let Some(left) = self.cooldown_remaining() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let remaining_secs = left.as_secs_f64().ceil() as u64;
            return Err(Error::VerificationCoolingDown { remaining_secs });
        }

        let previous_attempts = self.attempts;
        self.attempts += 1;
        self.status = PaymentStatus::Verifying;
        tracing::debug!(attempt = self.attempts, "verifying payment");

        tokio::time::sleep(self.delay).await;

        let success = self.rng.gen_range(0.0..1.0) > FAILURE_THRESHOLD
            || previous_attempts >= GUARANTEED_AFTER_ATTEMPTS;
        if success {
            self.status = PaymentStatus::Success;
            self.cooldown_until = None;
            tracing::info!(attempts = self.attempts, "payment verified");
        } else {
            self.status = PaymentStatus::Failed;
            self.cooldown_until = Some(Instant::now() + self.cooldown);
            tracing::warn!(attempts = self.attempts, "payment verification failed");
        }
        Ok(self.status)
    }
}
