//! Planar nearest-neighbour selection among point features.
//!
//! Distances are Euclidean in the query's coordinate units (degrees for
//! WGS 84), not geodesic. The remote search is scoped by the envelope built in
//! [`super::query::search_envelope`]; this module only ranks what came back.

use super::model::{Feature, NearestFacility};

pub fn planar_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Index of the candidate closest to `origin`.
///
/// Candidates without a point geometry are skipped. On ties the earliest
/// candidate wins.
pub fn nearest_index(candidates: &[Feature], origin: (f64, f64)) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, feature) in candidates.iter().enumerate() {
        let Some(point) = feature.point() else {
            continue;
        };
        let distance = planar_distance(point, origin);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}

/// The closest candidate's attributes and geometry, or `None` when no
/// candidate has a usable point.
pub fn select_nearest(candidates: Vec<Feature>, origin: (f64, f64)) -> Option<NearestFacility> {
    let index = nearest_index(&candidates, origin)?;
    let winner = candidates.into_iter().nth(index)?;
    Some(NearestFacility {
        attributes: winner.attributes,
        geometry: winner.geometry.unwrap_or_default(),
    })
}
