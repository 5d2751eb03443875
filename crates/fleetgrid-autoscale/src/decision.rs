//! The scaling decision function.
//!
//! Total, deterministic, and side-effect-free: it never touches the
//! store. Rules are evaluated in priority order and the first match
//! wins; scale-down moves a single step per evaluation so the fleet
//! cannot oscillate between sizes.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Events/sec-per-worker below which a fleet above its minimum sheds a
/// worker.
pub const SCALE_DOWN_RATE_FLOOR: u64 = 1000;

/// Scaling bounds and the assumed sustainable per-worker rate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScalingConfig {
    pub min_workers: u32,
    pub max_workers: u32,
    /// Sustainable events/sec per worker.
    pub per_worker_capacity: u64,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            min_workers: 1,
            max_workers: 10,
            per_worker_capacity: 1500,
        }
    }
}

/// The recommended scale action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleAction {
    ScaleUp,
    ScaleDown,
    Hold,
}

/// Why the engine decided what it decided. A closed set; the wire and
/// log form is the `Display` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleReason {
    BelowMinimum,
    OverCapacity,
    UnderLowerThreshold,
    WithinRange,
}

impl fmt::Display for ScaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ScaleReason::BelowMinimum => "active workers below minimum threshold",
            ScaleReason::OverCapacity => "throughput exceeds per-worker capacity",
            ScaleReason::UnderLowerThreshold => "throughput below 1000 events/s per worker",
            ScaleReason::WithinRange => "throughput is within the acceptable range",
        };
        f.write_str(text)
    }
}

impl Serialize for ScaleReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The engine's output. Recomputed fresh on every request, never
/// persisted, never mutated after construction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScalingRecommendation {
    /// Events/sec at decision time.
    pub current_throughput: u64,
    /// Worker count at decision time.
    pub active_workers: u32,
    #[serde(rename = "recommended_action")]
    pub action: ScaleAction,
    /// Clamped to `[min_workers, max_workers]`.
    pub recommended_workers: u32,
    pub reason: ScaleReason,
}

/// Decide a scale action for the observed throughput and worker count.
///
/// Rules, first match wins:
/// 1. below the minimum: scale up to it;
/// 2. over aggregate capacity with headroom: add enough workers to
///    absorb the excess, capped at the maximum;
/// 3. under the lower threshold with room to shrink: shed one worker;
/// 4. otherwise hold.
pub fn evaluate(
    current_throughput: u64,
    active_workers: u32,
    config: &ScalingConfig,
) -> ScalingRecommendation {
    let capacity = u64::from(active_workers) * config.per_worker_capacity;
    let lower_threshold = u64::from(active_workers) * SCALE_DOWN_RATE_FLOOR;

    let (mut action, recommended_workers, reason) = if active_workers < config.min_workers {
        (ScaleAction::ScaleUp, config.min_workers, ScaleReason::BelowMinimum)
    } else if current_throughput > capacity && active_workers < config.max_workers {
        let additional = (current_throughput - capacity).div_ceil(config.per_worker_capacity);
        let desired = (u64::from(active_workers) + additional).min(u64::from(config.max_workers));
        (ScaleAction::ScaleUp, desired as u32, ScaleReason::OverCapacity)
    } else if current_throughput < lower_threshold && active_workers > config.min_workers {
        // Single-step decrement only.
        let desired = (active_workers - 1).max(config.min_workers);
        (ScaleAction::ScaleDown, desired, ScaleReason::UnderLowerThreshold)
    } else {
        (ScaleAction::Hold, active_workers, ScaleReason::WithinRange)
    };

    // A non-scale-up branch that lands on the current count is a hold.
    if recommended_workers == active_workers && action != ScaleAction::ScaleUp {
        action = ScaleAction::Hold;
    }

    ScalingRecommendation {
        current_throughput,
        active_workers,
        action,
        recommended_workers,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ScalingConfig {
        ScalingConfig::default()
    }

    #[test]
    fn no_workers_scales_up_to_minimum() {
        let rec = evaluate(0, 0, &config());
        assert_eq!(rec.action, ScaleAction::ScaleUp);
        assert_eq!(rec.recommended_workers, 1);
        assert_eq!(rec.reason, ScaleReason::BelowMinimum);
    }

    #[test]
    fn over_capacity_adds_enough_workers() {
        // 3 workers cover 4500 events/s; 5000 needs one more.
        let rec = evaluate(5000, 3, &config());
        assert_eq!(rec.action, ScaleAction::ScaleUp);
        assert_eq!(rec.recommended_workers, 4);
        assert_eq!(rec.reason, ScaleReason::OverCapacity);
    }

    #[test]
    fn over_capacity_adds_multiple_workers_at_once() {
        // 7500 excess over 1 worker's 1500 capacity: 6000 / 1500 = 4 more.
        let rec = evaluate(7500, 1, &config());
        assert_eq!(rec.action, ScaleAction::ScaleUp);
        assert_eq!(rec.recommended_workers, 5);
    }

    #[test]
    fn scale_up_is_capped_at_maximum() {
        let rec = evaluate(1_000_000, 5, &config());
        assert_eq!(rec.action, ScaleAction::ScaleUp);
        assert_eq!(rec.recommended_workers, 10);
    }

    #[test]
    fn under_threshold_sheds_one_worker() {
        // Lower threshold for 3 workers is 3000.
        let rec = evaluate(2000, 3, &config());
        assert_eq!(rec.action, ScaleAction::ScaleDown);
        assert_eq!(rec.recommended_workers, 2);
        assert_eq!(rec.reason, ScaleReason::UnderLowerThreshold);
    }

    #[test]
    fn scale_down_never_skips_steps() {
        // Zero traffic on a large fleet still sheds only one worker.
        let rec = evaluate(0, 10, &config());
        assert_eq!(rec.action, ScaleAction::ScaleDown);
        assert_eq!(rec.recommended_workers, 9);
    }

    #[test]
    fn between_thresholds_holds() {
        // 3 workers: threshold 3000, capacity 4500.
        let rec = evaluate(4000, 3, &config());
        assert_eq!(rec.action, ScaleAction::Hold);
        assert_eq!(rec.recommended_workers, 3);
        assert_eq!(rec.reason, ScaleReason::WithinRange);
    }

    #[test]
    fn at_maximum_holds_even_under_load() {
        let rec = evaluate(999_999, 10, &config());
        assert_eq!(rec.action, ScaleAction::Hold);
        assert_eq!(rec.recommended_workers, 10);
    }

    #[test]
    fn at_minimum_holds_with_no_traffic() {
        // At the minimum there is no room to shrink.
        let rec = evaluate(0, 1, &config());
        assert_eq!(rec.action, ScaleAction::Hold);
        assert_eq!(rec.recommended_workers, 1);
    }

    #[test]
    fn exact_capacity_is_not_over_capacity() {
        let rec = evaluate(4500, 3, &config());
        assert_eq!(rec.action, ScaleAction::Hold);
    }

    #[test]
    fn exact_lower_threshold_is_not_under() {
        let rec = evaluate(3000, 3, &config());
        assert_eq!(rec.action, ScaleAction::Hold);
    }

    #[test]
    fn custom_bounds_are_respected() {
        let config = ScalingConfig {
            min_workers: 3,
            max_workers: 5,
            per_worker_capacity: 100,
        };

        let rec = evaluate(0, 2, &config);
        assert_eq!(rec.action, ScaleAction::ScaleUp);
        assert_eq!(rec.recommended_workers, 3);

        let rec = evaluate(10_000, 4, &config);
        assert_eq!(rec.recommended_workers, 5);
    }

    #[test]
    fn action_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&ScaleAction::ScaleUp).unwrap();
        assert_eq!(json, "\"SCALE_UP\"");
    }

    #[test]
    fn reason_serializes_as_display_text() {
        let json = serde_json::to_string(&ScaleReason::BelowMinimum).unwrap();
        assert_eq!(json, "\"active workers below minimum threshold\"");
    }
}
