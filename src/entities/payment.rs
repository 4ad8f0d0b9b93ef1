use chrono::{DateTime, Utc};
use oso::PolarClass;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Platform commission, fixed at 20% of the amount paid.
const COMMISSION_RATE: Decimal = dec!(0.20);

/// Alphabet and length of the order reference collaborators use to
/// reconcile payouts.
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const REFERENCE_LEN: usize = 8;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
            Self::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub driver_id: Uuid,
    pub amount_paid: Decimal,
    pub compensation_amount: Decimal,
    pub net_amount: Decimal,
    pub status: PaymentStatus,
    pub order_reference: String,
    pub payment_date: DateTime<Utc>,
}

/// Splits an amount into (platform compensation, driver net). Pure and
/// idempotent; all arithmetic stays in fixed-point.
pub fn settle(amount_paid: Decimal) -> (Decimal, Decimal) {
    let compensation = (amount_paid * COMMISSION_RATE)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    (compensation, amount_paid - compensation)
}

/// Draws a fresh candidate order reference. Uniqueness is enforced by the
/// caller against the payment store, retrying on collision.
pub fn order_reference<R: Rng>(rng: &mut R) -> String {
    (0..REFERENCE_LEN)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect()
}

impl Payment {
    pub fn new(trip_id: Uuid, driver_id: Uuid, amount_paid: Decimal, order_reference: String) -> Self {
        let (compensation_amount, net_amount) = settle(amount_paid);

        Self {
            id: Uuid::new_v4(),
            trip_id,
            driver_id,
            amount_paid,
            compensation_amount,
            net_amount,
            status: PaymentStatus::Pending,
            order_reference,
            payment_date: Utc::now(),
        }
    }

    /// PENDING -> PAID | CANCELLED; both targets are terminal.
    #[tracing::instrument]
    pub fn transition(&mut self, to: PaymentStatus) -> Result<(), Error> {
        match (self.status, to) {
            (PaymentStatus::Pending, PaymentStatus::Paid)
            | (PaymentStatus::Pending, PaymentStatus::Cancelled) => {
                self.status = to;
                Ok(())
            }
            _ => Err(Error::InvalidTransition {
                from: self.status.name(),
                requested: to.name(),
            }),
        }
    }
}

impl PolarClass for Payment {
    fn get_polar_class_builder() -> oso::ClassBuilder<Payment> {
        oso::Class::builder()
            .name("Payment")
            .add_attribute_getter("driver_id", |recv: &Payment| recv.driver_id)
    }

    fn get_polar_class() -> oso::Class {
        let builder = Payment::get_polar_class_builder();
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_splits_twenty_percent() {
        let (compensation, net) = settle(dec!(100.00));

        assert_eq!(compensation, dec!(20.00));
        assert_eq!(net, dec!(80.00));
    }

    #[test]
    fn settle_rounds_to_two_decimals() {
        let (compensation, net) = settle(dec!(10.13));

        assert_eq!(compensation, dec!(2.03));
        assert_eq!(net, dec!(8.10));
    }

    #[test]
    fn settle_rounds_midpoints_away_from_zero() {
        let (compensation, _) = settle(dec!(1.125));

        assert_eq!(compensation, dec!(0.23));
    }

    #[test]
    fn settle_preserves_the_total() {
        for amount in [dec!(0.00), dec!(0.01), dec!(19.99), dec!(250.37), dec!(1000.00)] {
            let (compensation, net) = settle(amount);
            assert_eq!(compensation + net, amount);
        }
    }

    #[test]
    fn settle_is_idempotent() {
        assert_eq!(settle(dec!(123.45)), settle(dec!(123.45)));
    }

    #[test]
    fn order_references_are_eight_chars_from_the_charset() {
        let mut rng = rand::thread_rng();

        for _ in 0..100 {
            let reference = order_reference(&mut rng);
            assert_eq!(reference.len(), REFERENCE_LEN);
            assert!(reference
                .bytes()
                .all(|b| REFERENCE_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn new_payment_starts_pending_with_derived_amounts() {
        let payment = Payment::new(Uuid::new_v4(), Uuid::new_v4(), dec!(100.00), "AB12CD34".into());

        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.amount_paid, dec!(100.00));
        assert_eq!(payment.compensation_amount, dec!(20.00));
        assert_eq!(payment.net_amount, dec!(80.00));
    }

    #[test]
    fn paid_and_cancelled_are_terminal() {
        let mut payment =
            Payment::new(Uuid::new_v4(), Uuid::new_v4(), dec!(50.00), "AB12CD34".into());

        payment.transition(PaymentStatus::Paid).unwrap();
        assert_eq!(payment.status, PaymentStatus::Paid);

        let err = payment.transition(PaymentStatus::Cancelled).unwrap_err();
        assert_eq!(err.kind(), "invalid_transition");
        assert_eq!(payment.status, PaymentStatus::Paid);

        let mut payment =
            Payment::new(Uuid::new_v4(), Uuid::new_v4(), dec!(50.00), "CD34AB12".into());
        payment.transition(PaymentStatus::Cancelled).unwrap();
        assert!(payment.transition(PaymentStatus::Paid).is_err());
    }

    #[test]
    fn pending_is_not_a_transition_target() {
        let mut payment =
            Payment::new(Uuid::new_v4(), Uuid::new_v4(), dec!(50.00), "AB12CD34".into());

        assert!(payment.transition(PaymentStatus::Pending).is_err());
    }
}
