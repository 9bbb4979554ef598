use super::model::{AlarmSet, AlertEvent, MetricSample};

/// Returns the alarms in `alarms` that `sample` breaches.
///
/// Kinds are checked in the fixed order CPU, Memory, Disk, so the result has
/// at most three events in that order. A kind fires only when its threshold
/// is set and the observed value is strictly above it. Nothing is remembered
/// between calls: an alarm fires again on every sample that breaches it.
pub fn evaluate(alarms: &AlarmSet, sample: &MetricSample) -> Vec<AlertEvent> {
    alarms
        .configured()
        .into_iter()
        .filter_map(|(kind, threshold)| {
            let observed = sample.value(kind);
            threshold.is_exceeded_by(observed).then_some(AlertEvent {
                kind,
                threshold,
                observed,
            })
        })
        .collect()
}
