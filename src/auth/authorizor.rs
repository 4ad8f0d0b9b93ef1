use oso::{Oso, PolarClass};

use crate::auth::{Platform, Principal};
use crate::entities::{Payment, Trip};

pub fn new() -> Oso {
    let mut o = Oso::new();

    o.register_class(Platform::get_polar_class()).unwrap();
    o.register_class(Principal::get_polar_class()).unwrap();
    o.register_class(Trip::get_polar_class()).unwrap();
    o.register_class(Payment::get_polar_class()).unwrap();

    o.load_str(include_str!("rules.polar")).unwrap();

    o
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ContactPoint, PaymentStatus, TripRequest, VehicleClass};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn trip_for(user_id: Uuid) -> Trip {
        Trip::new(
            user_id,
            TripRequest {
                pickup: ContactPoint {
                    address: "1 Dock Rd".into(),
                    phone: "+27215550111".into(),
                },
                dropoff: ContactPoint {
                    address: "9 Kloof St".into(),
                    phone: "+27215550112".into(),
                },
                pickup_time: Utc::now(),
                cargo_description: "pallet of tiles".into(),
                vehicle_type: VehicleClass::TwoTon,
                bid: dec!(75.00),
                floor_count: 0,
            },
        )
    }

    #[test]
    fn users_create_trips_and_operators_create_payments() {
        let authorizor = new();

        let user = Principal::user(Uuid::new_v4());
        let operator = Principal::operator(Uuid::new_v4());
        let driver = Principal::driver(Uuid::new_v4(), true, VehicleClass::TwoTon);

        let result = authorizor.is_allowed(user.clone(), "create_trip", Platform::default());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(driver.clone(), "create_trip", Platform::default());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(user.clone(), "create_payment", Platform::default());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(operator.clone(), "create_payment", Platform::default());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(operator.clone(), "sync_profile", Platform::default());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(user.clone(), "sync_profile", Platform::default());
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn requester_reads_cancels_and_rates_but_never_accepts() {
        let authorizor = new();

        let requester = Principal::user(Uuid::new_v4());
        let trip = trip_for(requester.id);

        let result = authorizor.is_allowed(requester.clone(), "read", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(requester.clone(), "cancel", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(requester.clone(), "rate", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(requester.clone(), "dispatch", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(requester.clone(), "accept", trip.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(requester.clone(), "start", trip.clone());
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn strangers_see_nothing() {
        let authorizor = new();

        let stranger = Principal::user(Uuid::new_v4());
        let trip = trip_for(Uuid::new_v4());

        let result = authorizor.is_allowed(stranger.clone(), "read", trip.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(stranger.clone(), "cancel", trip.clone());
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn candidate_requires_verification_and_a_matching_vehicle() {
        let authorizor = new();

        let trip = trip_for(Uuid::new_v4());

        let eligible = Principal::driver(Uuid::new_v4(), true, VehicleClass::TwoTon);
        let unverified = Principal::driver(Uuid::new_v4(), false, VehicleClass::TwoTon);
        let wrong_vehicle = Principal::driver(Uuid::new_v4(), true, VehicleClass::Bakkie);

        let result = authorizor.is_allowed(eligible.clone(), "accept", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(eligible.clone(), "read", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(unverified.clone(), "accept", trip.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(wrong_vehicle.clone(), "accept", trip.clone());
        assert_eq!(result.unwrap(), false);

        // eligibility is not assignment
        let result = authorizor.is_allowed(eligible.clone(), "start", trip.clone());
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn assigned_driver_progresses_and_cancels_the_trip() {
        let authorizor = new();

        let driver = Principal::driver(Uuid::new_v4(), true, VehicleClass::TwoTon);
        let mut trip = trip_for(Uuid::new_v4());
        trip.accept(driver.id).unwrap();

        let result = authorizor.is_allowed(driver.clone(), "start", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(driver.clone(), "complete", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(driver.clone(), "cancel", trip.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(driver.clone(), "rate", trip.clone());
        assert_eq!(result.unwrap(), false);

        let other = Principal::driver(Uuid::new_v4(), true, VehicleClass::TwoTon);

        let result = authorizor.is_allowed(other.clone(), "start", trip.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(other.clone(), "complete", trip.clone());
        assert_eq!(result.unwrap(), false);
    }

    #[test]
    fn payments_are_visible_to_the_payee_and_managed_by_operators() {
        let authorizor = new();

        let driver = Principal::driver(Uuid::new_v4(), true, VehicleClass::Bakkie);
        let operator = Principal::operator(Uuid::new_v4());
        let stranger = Principal::driver(Uuid::new_v4(), true, VehicleClass::Bakkie);

        let mut payment = Payment::new(Uuid::new_v4(), driver.id, dec!(60.00), "QX4P7R2M".into());
        payment.transition(PaymentStatus::Paid).unwrap();

        let result = authorizor.is_allowed(driver.clone(), "read", payment.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(stranger.clone(), "read", payment.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(operator.clone(), "read", payment.clone());
        assert_eq!(result.unwrap(), true);

        let result = authorizor.is_allowed(driver.clone(), "update", payment.clone());
        assert_eq!(result.unwrap(), false);

        let result = authorizor.is_allowed(operator.clone(), "update", payment.clone());
        assert_eq!(result.unwrap(), true);
    }
}
