//! Proximity grouping of reviews into locations

use crate::models::{Location, Review};

/// Max difference on each axis, in degrees (roughly 100 m)
pub const LOCATION_THRESHOLD: f64 = 0.001;

pub fn is_nearby(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> bool {
    (lat1 - lat2).abs() < LOCATION_THRESHOLD && (lng1 - lng2).abs() < LOCATION_THRESHOLD
}

/// Group reviews into locations.
///
/// Each review joins the first existing location whose seed is within
/// [`LOCATION_THRESHOLD`] on both axes, otherwise it seeds a new one.
/// Locations come out in seed order and keep reviews in input order, so the
/// grouping depends on the order of `reviews`.
pub fn group_reviews_by_location<I>(reviews: I) -> Vec<Location>
where
    I: IntoIterator<Item = Review>,
{
    let mut locations: Vec<Location> = Vec::new();

    for review in reviews {
        let existing = locations.iter_mut().find(|location| {
            let seed = location.seed();
            is_nearby(review.latitude, review.longitude, seed.latitude, seed.longitude)
        });

        match existing {
            Some(location) => location.reviews.push(review),
            None => locations.push(Location::seeded_by(review)),
        }
    }

    tracing::debug!("Grouped reviews into {} locations", locations.len());
    locations
}
