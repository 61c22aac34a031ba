//! Replay newline-delimited JSON beacons onto a host bus.

use crate::bus::HostBus;
use beacon_protocol::defaults::BEACON_EVENT;
use beacon_protocol::BeaconPayload;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

/// Counts from one replay run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Lines fired as `beacon` events.
    pub fired: usize,
    /// Non-blank lines that were not JSON objects.
    pub skipped: usize,
}

/// Fire every JSON-object line of `reader` as a beacon event.
///
/// Blank lines are ignored. Malformed lines are logged and skipped.
pub async fn replay_lines<R>(reader: R, bus: &HostBus) -> std::io::Result<ReplaySummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReplaySummary::default();
    let mut lines = reader.lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match BeaconPayload::from_json_str(line) {
            Ok(payload) => {
                bus.fire(BEACON_EVENT, &payload);
                summary.fired += 1;
            }
            Err(err) => {
                warn!("Skipping line {}: not a beacon object: {}", line_no, err);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}
