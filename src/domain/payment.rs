//! Order and payment status values and the payment status machine.
//!
//! ```text
//! pending ──customer──▶ pending_verification ──admin──▶ paid
//!    └──────────────────────admin─────────────────────────▲
//! ```
//!
//! Verification is manual: the customer asserts payment through the public
//! confirm endpoint, an admin checks the bank statement and marks it paid.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    PendingVerification,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PendingVerification => "pending_verification",
            Self::Paid => "paid",
        }
    }

    /// Customer-facing details (notes) are frozen once the payment is confirmed.
    pub fn allows_detail_edits(self) -> bool {
        self != Self::Paid
    }

    /// Decides whether `actor` may move a payment from `self` to `target`, and
    /// which notification the move triggers.
    pub fn transition(
        self,
        actor: Actor,
        target: PaymentStatus,
    ) -> Result<Transition, TransitionError> {
        match actor {
            Actor::Customer => {
                if target != Self::PendingVerification {
                    return Err(TransitionError::NotPermitted(target));
                }
                match self {
                    Self::Paid => Err(TransitionError::AlreadyPaid),
                    Self::PendingVerification => Ok(Transition::unchanged(self)),
                    Self::Pending => Ok(Transition {
                        next: target,
                        effect: Some(PaymentEffect::VerificationRequested),
                    }),
                }
            }
            Actor::Admin => {
                if target == self {
                    return Ok(Transition::unchanged(self));
                }
                let effect = (target == Self::Paid).then_some(PaymentEffect::PaymentConfirmed);
                Ok(Transition {
                    next: target,
                    effect,
                })
            }
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "pending_verification" => Ok(Self::PendingVerification),
            "paid" => Ok(Self::Paid),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is asking for a payment status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Admin,
}

/// Side effect a transition asks the notification dispatcher to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEffect {
    VerificationRequested,
    PaymentConfirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: PaymentStatus,
    pub effect: Option<PaymentEffect>,
}

impl Transition {
    fn unchanged(status: PaymentStatus) -> Self {
        Self {
            next: status,
            effect: None,
        }
    }

    pub fn is_change_from(&self, current: PaymentStatus) -> bool {
        self.next != current
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Order has already been paid")]
    AlreadyPaid,
    #[error("Customers cannot set payment status to {0}")]
    NotPermitted(PaymentStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_requests_verification_from_pending() {
        let transition = PaymentStatus::Pending
            .transition(Actor::Customer, PaymentStatus::PendingVerification)
            .expect("allowed");
        assert_eq!(transition.next, PaymentStatus::PendingVerification);
        assert_eq!(transition.effect, Some(PaymentEffect::VerificationRequested));
        assert!(transition.is_change_from(PaymentStatus::Pending));
    }

    #[test]
    fn test_customer_repeat_confirmation_is_silent() {
        let transition = PaymentStatus::PendingVerification
            .transition(Actor::Customer, PaymentStatus::PendingVerification)
            .expect("allowed");
        assert_eq!(transition.effect, None);
        assert!(!transition.is_change_from(PaymentStatus::PendingVerification));
    }

    #[test]
    fn test_customer_cannot_touch_paid_order() {
        assert_eq!(
            PaymentStatus::Paid.transition(Actor::Customer, PaymentStatus::PendingVerification),
            Err(TransitionError::AlreadyPaid)
        );
    }

    #[test]
    fn test_customer_cannot_mark_paid() {
        assert_eq!(
            PaymentStatus::PendingVerification.transition(Actor::Customer, PaymentStatus::Paid),
            Err(TransitionError::NotPermitted(PaymentStatus::Paid))
        );
        assert_eq!(
            PaymentStatus::Pending.transition(Actor::Customer, PaymentStatus::Pending),
            Err(TransitionError::NotPermitted(PaymentStatus::Pending))
        );
    }

    #[test]
    fn test_admin_confirms_payment() {
        for from in [PaymentStatus::Pending, PaymentStatus::PendingVerification] {
            let transition = from
                .transition(Actor::Admin, PaymentStatus::Paid)
                .expect("allowed");
            assert_eq!(transition.next, PaymentStatus::Paid);
            assert_eq!(transition.effect, Some(PaymentEffect::PaymentConfirmed));
        }
    }

    #[test]
    fn test_admin_repeat_paid_is_silent() {
        let transition = PaymentStatus::Paid
            .transition(Actor::Admin, PaymentStatus::Paid)
            .expect("allowed");
        assert_eq!(transition.effect, None);
    }

    #[test]
    fn test_admin_override_has_no_effect() {
        let transition = PaymentStatus::Paid
            .transition(Actor::Admin, PaymentStatus::Pending)
            .expect("allowed");
        assert_eq!(transition.next, PaymentStatus::Pending);
        assert_eq!(transition.effect, None);
    }

    #[test]
    fn test_statuses_parse_their_wire_names() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::PendingVerification,
            PaymentStatus::Paid,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).expect("serializable"),
                serde_json::Value::String(status.as_str().into())
            );
        }
        assert_eq!("completed".parse::<OrderStatus>(), Ok(OrderStatus::Completed));
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_paid_orders_freeze_details() {
        assert!(PaymentStatus::Pending.allows_detail_edits());
        assert!(!PaymentStatus::Paid.allows_detail_edits());
    }
}
