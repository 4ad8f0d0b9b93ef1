use crate::entities::{Profile, Role, Trip};

/// The stock eligibility predicate: verified drivers operating the trip's
/// vehicle class. Callers may substitute their own predicate; no ranking is
/// applied here or anywhere else.
pub fn vehicle_match(trip: &Trip) -> impl Fn(&Profile) -> bool + '_ {
    move |profile| {
        profile.role == Role::Driver
            && profile.verified
            && profile.vehicle_type == Some(trip.vehicle_type)
    }
}

/// Filters the driver directory down to the candidates eligible to see and
/// accept a trip. Anything but a REQUESTED trip has no candidates.
pub fn eligible<I, P>(trip: &Trip, profiles: I, predicate: P) -> Vec<Profile>
where
    I: IntoIterator<Item = Profile>,
    P: Fn(&Profile) -> bool,
{
    if !trip.is_requested() {
        return Vec::new();
    }

    profiles.into_iter().filter(|p| predicate(p)).collect()
}
