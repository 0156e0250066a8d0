use std::time::Duration;

use chrono::Utc;

use crate::api::Time;

pub async fn sleep_for(d: Duration) {
    if let Err(err) = wasm_timer::Delay::new(d).await {
        tracing::warn!(?err, "timer failed, not sleeping");
    }
}

pub async fn sleep_until(t: Time) {
    sleep_for((t - Utc::now()).to_std().unwrap_or(Duration::from_secs(0))).await
}
