use crate::config::Config;
use crate::deviation::{score, ScoreError};
use crate::finder::{find_event_time, EventQuery};
use crate::session::{InputKind, ObjectKind, SessionRecord};
use crate::util::delay;

/// One named desync metric: a triggering query, a resolving query, and the
/// object whose predicted/authoritative positions are compared while the
/// effect is in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub name: String,
    pub trigger: EventQuery,
    pub resolve: EventQuery,
    pub target: ObjectKind,
}

/// A successfully evaluated metric. `delay_ms` and `deviation_sq` are jointly
/// absent when either bounding timestamp could not be resolved; the counters
/// describe the scored window's data quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricReading {
    pub delay_ms: Option<i64>,
    pub deviation_sq: Option<i64>,
    pub compared: usize,
    pub skipped: usize,
}

impl MetricReading {
    fn unresolved() -> Self {
        Self {
            delay_ms: None,
            deviation_sq: None,
            compared: 0,
            skipped: 0,
        }
    }
}

/// Evaluation result for one metric; failures stay with the metric that
/// produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutcome {
    pub name: String,
    pub result: Result<MetricReading, ScoreError>,
}

/// Evaluates one metric against one session record.
///
/// An unresolvable trigger or effect is a normal outcome (both fields
/// absent); a scoring contract violation is an error for this metric only.
pub fn evaluate(record: &SessionRecord, spec: &MetricSpec) -> Result<MetricReading, ScoreError> {
    let trigger = find_event_time(record, &spec.trigger);
    let resolve = find_event_time(record, &spec.resolve);

    match (delay(trigger, resolve), trigger, resolve) {
        (Some(delay_ms), Some(from), Some(to)) => {
            let window = record.snapshots_between(from, to);
            let deviation = score(&window, spec.target)?;
            Ok(MetricReading {
                delay_ms: Some(delay_ms),
                deviation_sq: Some(deviation.score),
                compared: deviation.compared,
                skipped: deviation.skipped,
            })
        }
        _ => Ok(MetricReading::unresolved()),
    }
}

/// Runs every metric independently; one failing metric never blocks the
/// rest of the session's metrics.
pub fn analyze(record: &SessionRecord, specs: &[MetricSpec]) -> Vec<MetricOutcome> {
    specs
        .iter()
        .map(|spec| MetricOutcome {
            name: spec.name.clone(),
            result: evaluate(record, spec),
        })
        .collect()
}

/// The standard metric set, parameterized by configuration.
pub fn standard_metrics(cfg: &Config) -> Vec<MetricSpec> {
    vec![
        MetricSpec {
            name: "bullet".to_string(),
            trigger: EventQuery::InputAt {
                x: cfg.bullet_target_x,
                y: cfg.bullet_target_y,
                kind: InputKind::FireBullet,
            },
            resolve: EventQuery::FirstAppearance {
                kind: ObjectKind::Bullet,
            },
            target: ObjectKind::Player,
        },
        MetricSpec {
            name: "rocket".to_string(),
            trigger: EventQuery::InputAt {
                x: cfg.rocket_target_x,
                y: cfg.rocket_target_y,
                kind: InputKind::FireRocket,
            },
            resolve: EventQuery::FirstAppearance {
                kind: ObjectKind::Rocket,
            },
            target: ObjectKind::Rocket,
        },
        MetricSpec {
            name: "move".to_string(),
            trigger: EventQuery::FirstMovement,
            resolve: EventQuery::ArrivalAt {
                x: cfg.move_target_x,
                y: cfg.move_target_y,
                tolerance: cfg.arrival_tolerance,
                policy: cfg.move_arrival,
            },
            target: ObjectKind::Player,
        },
    ]
}
