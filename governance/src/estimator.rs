//! Block time estimation and block → wall-clock projection

use chrono::{DateTime, Utc};

use crate::provider::{BlockHeader, WalletProvider};

/// Number of blocks averaged over
pub const BLOCK_SPAN: u64 = 500;

#[derive(Debug, Clone, Copy)]
pub struct BlockTimeEstimator {
    span: u64,
}

impl Default for BlockTimeEstimator {
    fn default() -> Self {
        Self { span: BLOCK_SPAN }
    }
}

impl BlockTimeEstimator {
    pub fn new(span: u64) -> Self {
        Self { span: span.max(1) }
    }

    pub fn span(&self) -> u64 {
        self.span
    }

    /// Average seconds per block over the last `span` blocks
    ///
    /// `None` when the chain is shorter than the span or either block
    /// lookup fails.
    pub async fn estimate(&self, provider: &dyn WalletProvider) -> Option<f64> {
        let height = match provider.block_number().await {
            Ok(height) => height,
            Err(e) => {
                log::warn!("⚠️ Block time unknown: {}", e);
                return None;
            }
        };
        if height < self.span {
            log::debug!("Chain height {} below span {}, block time unknown", height, self.span);
            return None;
        }

        let current = self.header(provider, height).await?;
        let prior = self.header(provider, height - self.span).await?;
        let avg = self.average(&current, &prior);
        if let Some(avg) = avg {
            log::debug!("→ average block time {:.2}s", avg);
        }
        avg
    }

    async fn header(&self, provider: &dyn WalletProvider, number: u64) -> Option<BlockHeader> {
        match provider.block(number).await {
            Ok(Some(header)) => Some(header),
            Ok(None) => {
                log::warn!("⚠️ Block {} not found", number);
                None
            }
            Err(e) => {
                log::warn!("⚠️ Could not read block {}: {}", number, e);
                None
            }
        }
    }

    /// `(current.timestamp - prior.timestamp) / span`
    pub fn average(&self, current: &BlockHeader, prior: &BlockHeader) -> Option<f64> {
        if current.timestamp < prior.timestamp {
            return None;
        }
        Some((current.timestamp - prior.timestamp) as f64 / self.span as f64)
    }
}

/// Expected unix timestamp of `block_number`, `None` if the block time is unknown
pub fn project_timestamp(block_number: u64, current: &BlockHeader, avg_block_time: Option<f64>) -> Option<f64> {
    let avg = avg_block_time.filter(|avg| avg.is_finite() && *avg >= 0.0)?;
    let blocks = block_number as f64 - current.number as f64;
    Some(current.timestamp as f64 + blocks * avg)
}

/// Relative phrase for when `block_number` is (or was) reached
pub fn time_remaining(
    block_number: u64,
    current: &BlockHeader,
    avg_block_time: Option<f64>,
    now: DateTime<Utc>,
) -> String {
    match project_timestamp(block_number, current, avg_block_time) {
        Some(at) => humanize(at - now.timestamp() as f64),
        None => "unknown".to_string(),
    }
}

/// "in 3 hours" / "2 days ago" for a signed offset in seconds
pub fn humanize(delta_secs: f64) -> String {
    let span = duration_phrase(delta_secs.abs());
    if delta_secs >= 0.0 {
        format!("in {}", span)
    } else {
        format!("{} ago", span)
    }
}

fn duration_phrase(secs: f64) -> String {
    let minutes = (secs / 60.0).round();
    let hours = (secs / 3600.0).round();
    let days = (secs / 86_400.0).round();
    let months = (secs / 86_400.0 / 30.4).round();
    let years = (secs / 86_400.0 / 365.0).round();

    if secs < 45.0 {
        "a few seconds".to_string()
    } else if secs < 90.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes", minutes)
    } else if minutes < 90.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{} hours", hours)
    } else if hours < 36.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{} days", days)
    } else if days < 45.0 {
        "a month".to_string()
    } else if days < 320.0 {
        format!("{} months", months)
    } else if days < 548.0 {
        "a year".to_string()
    } else {
        format!("{} years", years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn header(number: u64, timestamp: u64) -> BlockHeader {
        BlockHeader { number, timestamp }
    }

    #[test]
    fn test_average() {
        let estimator = BlockTimeEstimator::default();
        let avg = estimator.average(&header(1000, 16_000), &header(500, 10_000));
        assert_eq!(avg, Some(12.0));

        // clock went backwards
        assert_eq!(estimator.average(&header(1000, 5), &header(500, 10)), None);
    }

    #[test]
    fn test_projection_monotonic() {
        let current = header(1000, 1_700_000_000);
        let mut last = f64::MIN;
        for block in [0, 500, 999, 1000, 1001, 5000, 100_000] {
            let at = project_timestamp(block, &current, Some(12.0)).unwrap();
            assert!(at >= last);
            last = at;
        }
        assert_eq!(project_timestamp(1010, &current, Some(12.0)), Some(1_700_000_120.0));
        assert_eq!(project_timestamp(1010, &current, None), None);
        assert_eq!(project_timestamp(1010, &current, Some(f64::NAN)), None);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize(10.0), "in a few seconds");
        assert_eq!(humanize(3.0 * 3600.0), "in 3 hours");
        assert_eq!(humanize(-2.0 * 86_400.0), "2 days ago");
        assert_eq!(humanize(20.0 * 60.0), "in 20 minutes");
        assert_eq!(humanize(-30.0 * 3600.0), "a day ago");
        assert_eq!(humanize(3.0 * 365.0 * 86_400.0), "in 3 years");
    }

    #[test]
    fn test_time_remaining() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let current = header(1000, 1_700_000_000);
        // 900 blocks * 12s = 3 hours
        assert_eq!(time_remaining(1900, &current, Some(12.0), now), "in 3 hours");
        assert_eq!(time_remaining(1900, &current, None, now), "unknown");
    }
}
