use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::locate::locate;
use crate::session::{InputKind, ObjectKind, SessionRecord, Snapshot};

/// Per-axis neighborhood used by arrival detection.
pub const DEFAULT_ARRIVAL_TOLERANCE: f64 = 10.0;

/// How arrival at a target neighborhood is detected.
///
/// The two variants come from different generations of the recorder's
/// analysis scripts and produce different timestamps when the controlled
/// object wanders in and out of the neighborhood. Both are kept; which one a
/// metric uses is configuration, not a property of the finder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ArrivalPolicy {
    /// First snapshot inside the neighborhood whose predecessor was outside
    /// it. Requires an observed transition: a session already inside the
    /// neighborhood at its first snapshot only qualifies after leaving and
    /// re-entering.
    EdgeTriggered,
    /// First snapshot inside the neighborhood, regardless of history.
    FirstWithin,
}

/// One first-match retrieval strategy over a session's event streams.
///
/// Every variant resolves to the `time_ms` of the first qualifying entry in
/// ascending record order, or `None` when nothing qualifies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventQuery {
    /// First input event with an exact position and kind match.
    InputAt { x: f64, y: f64, kind: InputKind },
    /// First snapshot whose authoritative list contains the kind at all.
    FirstAppearance { kind: ObjectKind },
    /// First snapshot where the controlled object sits within `tolerance` of
    /// the target on both axes, subject to the arrival policy.
    ArrivalAt {
        x: f64,
        y: f64,
        tolerance: f64,
        policy: ArrivalPolicy,
    },
    /// First snapshot after which the controlled object's authoritative
    /// position changes. Resolves to the last stationary sample's time, not
    /// the sample where the movement shows up.
    FirstMovement,
}

/// Runs one query against a session record.
pub fn find_event_time(record: &SessionRecord, query: &EventQuery) -> Option<i64> {
    match *query {
        EventQuery::InputAt { x, y, kind } => record
            .inputs
            .iter()
            .find(|e| e.x == x && e.y == y && e.kind == kind)
            .map(|e| e.time_ms),
        EventQuery::FirstAppearance { kind } => record
            .snapshots
            .iter()
            .find(|s| locate(&s.authoritative, kind).is_some())
            .map(|s| s.time_ms),
        EventQuery::ArrivalAt {
            x,
            y,
            tolerance,
            policy,
        } => find_arrival(&record.snapshots, x, y, tolerance, policy),
        EventQuery::FirstMovement => record
            .snapshots
            .iter()
            .tuple_windows()
            .find(|(a, b)| {
                match (
                    locate(&a.authoritative, ObjectKind::Player),
                    locate(&b.authoritative, ObjectKind::Player),
                ) {
                    (Some(p), Some(q)) => p.x != q.x || p.y != q.y,
                    _ => false,
                }
            })
            .map(|(a, _)| a.time_ms),
    }
}

fn within(snapshot: &Snapshot, x: f64, y: f64, tolerance: f64) -> bool {
    locate(&snapshot.authoritative, ObjectKind::Player)
        .map(|p| (p.x - x).abs() <= tolerance && (p.y - y).abs() <= tolerance)
        .unwrap_or(false)
}

fn find_arrival(
    snapshots: &[Snapshot],
    x: f64,
    y: f64,
    tolerance: f64,
    policy: ArrivalPolicy,
) -> Option<i64> {
    snapshots
        .iter()
        .enumerate()
        .find(|(i, s)| {
            if !within(s, x, y, tolerance) {
                return false;
            }
            match policy {
                ArrivalPolicy::FirstWithin => true,
                ArrivalPolicy::EdgeTriggered => {
                    *i > 0 && !within(&snapshots[i - 1], x, y, tolerance)
                }
            }
        })
        .map(|(_, s)| s.time_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{InputEvent, WorldObject, CONTROLLED_ID};

    fn player_at(x: f64, y: f64) -> WorldObject {
        WorldObject {
            x,
            y,
            kind: ObjectKind::Player,
            id: CONTROLLED_ID,
        }
    }

    fn snap(time_ms: i64, authoritative: Vec<WorldObject>) -> Snapshot {
        Snapshot {
            tick: 0,
            server_tick: 0,
            time_ms,
            predicted: vec![],
            authoritative,
        }
    }

    fn input(time_ms: i64, x: f64, y: f64, kind: InputKind) -> InputEvent {
        InputEvent {
            tick: 0,
            server_tick: 0,
            time_ms,
            x,
            y,
            kind,
        }
    }

    fn record(snapshots: Vec<Snapshot>, inputs: Vec<InputEvent>) -> SessionRecord {
        SessionRecord {
            snapshots,
            inputs,
            acked: vec![],
        }
    }

    #[test]
    fn input_query_needs_exact_position_and_kind() {
        let r = record(
            vec![],
            vec![
                input(100, 500.0, 400.0, InputKind::Move),
                input(200, 500.0, 401.0, InputKind::FireBullet),
                input(300, 500.0, 400.0, InputKind::FireBullet),
                input(400, 500.0, 400.0, InputKind::FireBullet),
            ],
        );

        let q = EventQuery::InputAt {
            x: 500.0,
            y: 400.0,
            kind: InputKind::FireBullet,
        };
        assert_eq!(find_event_time(&r, &q), Some(300));
    }

    #[test]
    fn input_query_misses_cleanly() {
        let r = record(vec![], vec![input(100, 1.0, 2.0, InputKind::Move)]);
        let q = EventQuery::InputAt {
            x: 1.0,
            y: 2.0,
            kind: InputKind::FireRocket,
        };
        assert_eq!(find_event_time(&r, &q), None);
    }

    #[test]
    fn first_appearance_scans_authoritative_objects() {
        let rocket = WorldObject {
            x: 0.0,
            y: 0.0,
            kind: ObjectKind::Rocket,
            id: 9,
        };
        let r = record(
            vec![
                snap(100, vec![player_at(0.0, 0.0)]),
                snap(200, vec![player_at(0.0, 0.0), rocket]),
                snap(300, vec![player_at(0.0, 0.0), rocket]),
            ],
            vec![],
        );

        let q = EventQuery::FirstAppearance {
            kind: ObjectKind::Rocket,
        };
        assert_eq!(find_event_time(&r, &q), Some(200));
        let q = EventQuery::FirstAppearance {
            kind: ObjectKind::Bullet,
        };
        assert_eq!(find_event_time(&r, &q), None);
    }

    fn arrival_track() -> SessionRecord {
        // Outside until index 3, inside from index 3 on.
        record(
            vec![
                snap(100, vec![player_at(0.0, 0.0)]),
                snap(200, vec![player_at(300.0, 50.0)]),
                snap(300, vec![player_at(700.0, 90.0)]),
                snap(400, vec![player_at(895.0, 102.0)]),
                snap(500, vec![player_at(899.0, 100.0)]),
                snap(600, vec![player_at(900.0, 100.0)]),
            ],
            vec![],
        )
    }

    #[test]
    fn arrival_variants_agree_on_single_contiguous_arrival() {
        let r = arrival_track();
        for policy in [ArrivalPolicy::EdgeTriggered, ArrivalPolicy::FirstWithin] {
            let q = EventQuery::ArrivalAt {
                x: 900.0,
                y: 100.0,
                tolerance: DEFAULT_ARRIVAL_TOLERANCE,
                policy,
            };
            assert_eq!(find_event_time(&r, &q), Some(400), "policy {:?}", policy);
        }
    }

    #[test]
    fn arrival_variants_diverge_when_track_reenters() {
        // Inside at index 0, leaves, comes back at index 2.
        let r = record(
            vec![
                snap(100, vec![player_at(900.0, 100.0)]),
                snap(200, vec![player_at(500.0, 100.0)]),
                snap(300, vec![player_at(905.0, 95.0)]),
            ],
            vec![],
        );

        let first = EventQuery::ArrivalAt {
            x: 900.0,
            y: 100.0,
            tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            policy: ArrivalPolicy::FirstWithin,
        };
        assert_eq!(find_event_time(&r, &first), Some(100));

        // The edge variant only fires on an observed transition in, so the
        // initial inside snapshot is passed over.
        let edge = EventQuery::ArrivalAt {
            x: 900.0,
            y: 100.0,
            tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            policy: ArrivalPolicy::EdgeTriggered,
        };
        assert_eq!(find_event_time(&r, &edge), Some(300));
    }

    #[test]
    fn edge_triggered_skips_snapshots_already_inside() {
        // Index 2 is inside but its predecessor already was; index 1 is the edge.
        let r = record(
            vec![
                snap(100, vec![player_at(0.0, 0.0)]),
                snap(200, vec![player_at(901.0, 99.0)]),
                snap(300, vec![player_at(902.0, 99.0)]),
            ],
            vec![],
        );

        let q = EventQuery::ArrivalAt {
            x: 900.0,
            y: 100.0,
            tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            policy: ArrivalPolicy::EdgeTriggered,
        };
        assert_eq!(find_event_time(&r, &q), Some(200));
    }

    #[test]
    fn arrival_tolerance_is_per_axis_inclusive() {
        let r = record(vec![snap(100, vec![player_at(910.0, 90.0)])], vec![]);
        let q = EventQuery::ArrivalAt {
            x: 900.0,
            y: 100.0,
            tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            policy: ArrivalPolicy::FirstWithin,
        };
        assert_eq!(find_event_time(&r, &q), Some(100));

        let r = record(vec![snap(100, vec![player_at(910.1, 90.0)])], vec![]);
        assert_eq!(find_event_time(&r, &q), None);
    }

    #[test]
    fn arrival_requires_controlled_object() {
        let r = record(vec![snap(100, vec![])], vec![]);
        let q = EventQuery::ArrivalAt {
            x: 0.0,
            y: 0.0,
            tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            policy: ArrivalPolicy::FirstWithin,
        };
        assert_eq!(find_event_time(&r, &q), None);
    }

    #[test]
    fn first_movement_returns_last_stationary_sample() {
        let r = record(
            vec![
                snap(100, vec![player_at(0.0, 0.0)]),
                snap(200, vec![player_at(0.0, 0.0)]),
                snap(300, vec![player_at(5.0, 0.0)]),
            ],
            vec![],
        );

        assert_eq!(find_event_time(&r, &EventQuery::FirstMovement), Some(200));
    }

    #[test]
    fn first_movement_ignores_gaps_without_controlled_object() {
        let r = record(
            vec![
                snap(100, vec![player_at(0.0, 0.0)]),
                snap(200, vec![]),
                snap(300, vec![player_at(0.0, 0.0)]),
                snap(400, vec![player_at(1.0, 0.0)]),
            ],
            vec![],
        );

        assert_eq!(find_event_time(&r, &EventQuery::FirstMovement), Some(300));
    }

    #[test]
    fn first_movement_none_when_never_moving() {
        let r = record(
            vec![
                snap(100, vec![player_at(2.0, 2.0)]),
                snap(200, vec![player_at(2.0, 2.0)]),
            ],
            vec![],
        );

        assert_eq!(find_event_time(&r, &EventQuery::FirstMovement), None);
    }
}
