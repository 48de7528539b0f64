use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::StorefrontApi;
use crate::carousel::{TrackEvent, TrackKind};

/// Background task recording banner impressions and clicks.
/// Failures are logged and dropped; nothing is retried or surfaced.
pub async fn run_telemetry(
    api: Arc<dyn StorefrontApi>,
    mut track_rx: UnboundedReceiver<TrackEvent>,
) -> Result<()> {
    while let Some(ev) = track_rx.recv().await {
        let res = match ev.kind {
            TrackKind::Impression => api.record_impression(ev.banner_id).await,
            TrackKind::Click => api.record_click(ev.banner_id).await,
        };
        match res {
            Ok(()) => log::debug!("[telemetry] {:?} banner #{}", ev.kind, ev.banner_id),
            Err(e) => log::warn!(
                "[telemetry] failed to record {:?} for banner #{}: {e}",
                ev.kind,
                ev.banner_id
            ),
        }
    }
    Ok(())
}
