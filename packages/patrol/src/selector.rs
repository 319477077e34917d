//! Hotspot selection for a patrol origin.
//!
//! Filters hotspots to those within the search radius and orders them
//! with the configured [`SelectionPolicy`]. Sorting is stable, so hotspots
//! that tie on the policy key keep their input order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crime_dashboard_crime_models::{Coordinate, Hotspot};
use crime_dashboard_patrol_models::{Candidate, SelectionPolicy, SelectorConfig};

use crate::distance::haversine_km;

/// Ordering of two candidates under `policy`.
#[must_use]
pub fn compare(policy: SelectionPolicy, a: &Candidate, b: &Candidate) -> Ordering {
    match policy {
        SelectionPolicy::SeverityFirst => b.hotspot.severity.cmp(&a.hotspot.severity),
        SelectionPolicy::ProximityFirst => a.distance_km.total_cmp(&b.distance_km),
    }
}

/// Chooses the hotspots a patrol starting at `origin` should visit.
///
/// Keeps every hotspot whose distance to `origin` is at most
/// `config.radius_km` (a radius of zero still keeps hotspots sitting
/// exactly on the origin), drops repeated hotspot IDs, orders the rest by
/// `config.policy`, then applies `config.max_stops`.
///
/// An empty result is not an error here; the planner turns it into
/// [`PatrolError::NoCandidates`](crate::PatrolError::NoCandidates).
#[must_use]
pub fn select_candidates(
    origin: Coordinate,
    hotspots: &[Hotspot],
    config: &SelectorConfig,
) -> Vec<Candidate> {
    if config.radius_km.is_nan() || config.radius_km < 0.0 {
        return Vec::new();
    }

    let mut seen = BTreeSet::new();
    let mut candidates: Vec<Candidate> = hotspots
        .iter()
        .filter_map(|hotspot| {
            let distance_km = haversine_km(origin, hotspot.coordinate);
            (distance_km <= config.radius_km).then(|| Candidate {
                hotspot: hotspot.clone(),
                distance_km,
            })
        })
        .filter(|c| seen.insert(c.hotspot.id))
        .collect();

    candidates.sort_by(|a, b| compare(config.policy, a, b));

    if let Some(max) = config.max_stops {
        candidates.truncate(max);
    }

    log::debug!(
        "Selected {} of {} hotspots within {} km ({})",
        candidates.len(),
        hotspots.len(),
        config.radius_km,
        config.policy
    );

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hotspot;

    const ORIGIN: Coordinate = Coordinate::new(11.0168, 76.9558);

    fn config(radius_km: f64, policy: SelectionPolicy) -> SelectorConfig {
        SelectorConfig {
            radius_km,
            policy,
            max_stops: None,
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<i64> {
        candidates.iter().map(|c| c.hotspot.id).collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let out = select_candidates(ORIGIN, &[], &SelectorConfig::default());
        assert!(out.is_empty());
    }

    #[test]
    fn negative_radius_gives_empty_output() {
        let hotspots = vec![hotspot(1, 5, ORIGIN.latitude, ORIGIN.longitude)];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &config(-1.0, SelectionPolicy::SeverityFirst),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn zero_radius_keeps_hotspot_on_origin() {
        let hotspots = vec![
            hotspot(1, 5, ORIGIN.latitude, ORIGIN.longitude),
            hotspot(2, 9, 11.03, 76.98),
        ];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &config(0.0, SelectionPolicy::SeverityFirst),
        );
        assert_eq!(ids(&out), vec![1]);
        assert!(out[0].distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn every_candidate_is_within_radius() {
        let hotspots = vec![
            hotspot(1, 3, 11.03, 76.98),
            hotspot(2, 7, 11.2, 77.1),
            hotspot(3, 2, 11.05, 76.90),
            hotspot(4, 8, 12.0, 78.0),
        ];
        for policy in [SelectionPolicy::SeverityFirst, SelectionPolicy::ProximityFirst] {
            let out = select_candidates(ORIGIN, &hotspots, &config(20.0, policy));
            assert!(!out.is_empty());
            for c in &out {
                assert!(haversine_km(ORIGIN, c.hotspot.coordinate) <= 20.0);
            }
            assert!(!ids(&out).contains(&2));
            assert!(!ids(&out).contains(&4));
        }
    }

    #[test]
    fn severity_first_orders_descending_and_keeps_ties_stable() {
        let hotspots = vec![
            hotspot(1, 3, 11.02, 76.96),
            hotspot(2, 7, 11.03, 76.97),
            hotspot(3, 3, 11.01, 76.95),
            hotspot(4, 7, 11.04, 76.94),
        ];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &config(20.0, SelectionPolicy::SeverityFirst),
        );
        assert_eq!(ids(&out), vec![2, 4, 1, 3]);
    }

    #[test]
    fn proximity_first_orders_by_distance() {
        let hotspots = vec![
            hotspot(1, 9, 11.10, 76.95),
            hotspot(2, 1, 11.02, 76.95),
            hotspot(3, 5, 11.05, 76.95),
        ];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &config(20.0, SelectionPolicy::ProximityFirst),
        );
        assert_eq!(ids(&out), vec![2, 3, 1]);
        assert!(out.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn proximity_ties_keep_input_order() {
        let hotspots = vec![
            hotspot(7, 1, 11.03, 76.97),
            hotspot(3, 9, 11.03, 76.97),
        ];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &config(20.0, SelectionPolicy::ProximityFirst),
        );
        assert_eq!(ids(&out), vec![7, 3]);
    }

    #[test]
    fn repeated_hotspots_appear_once() {
        let h = hotspot(1, 5, 11.02, 76.96);
        let hotspots = vec![h.clone(), h];
        let out = select_candidates(ORIGIN, &hotspots, &SelectorConfig::default());
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn max_stops_caps_after_ordering() {
        let hotspots = vec![
            hotspot(1, 2, 11.02, 76.96),
            hotspot(2, 9, 11.03, 76.97),
            hotspot(3, 6, 11.01, 76.95),
        ];
        let out = select_candidates(
            ORIGIN,
            &hotspots,
            &SelectorConfig {
                radius_km: 20.0,
                policy: SelectionPolicy::SeverityFirst,
                max_stops: Some(2),
            },
        );
        assert_eq!(ids(&out), vec![2, 3]);
    }
}
