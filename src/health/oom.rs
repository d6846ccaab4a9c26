use crate::constants::OOM_LOOKBACK;
use chrono::{DateTime, Utc};
use kube::api::DynamicObject;
use serde_json::Value;

/// A container in this pod was OOM killed strictly less than [`OOM_LOOKBACK`] ago
pub fn oom_killed_recently(pod: &DynamicObject, now: DateTime<Utc>) -> bool {
    let Some(status) = pod.data.get("status") else {
        return false;
    };
    ["containerStatuses", "initContainerStatuses"]
        .iter()
        .filter_map(|field| status.get(field).and_then(Value::as_array))
        .flatten()
        .filter_map(|container| container.pointer("/lastState/terminated"))
        .any(|terminated| {
            terminated.get("reason").and_then(Value::as_str) == Some("OOMKilled")
                && terminated
                    .get("finishedAt")
                    .and_then(Value::as_str)
                    .and_then(|finished| DateTime::parse_from_rfc3339(finished).ok())
                    .is_some_and(|finished| within_lookback(finished.with_timezone(&Utc), now))
        })
}

fn within_lookback(finished: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match (now - finished).to_std() {
        Ok(elapsed) => elapsed < OOM_LOOKBACK,
        // finished in the future relative to our clock
        Err(_) => true,
    }
}
