use std::time::Duration;

/// A member (or batch of members) skipped under the isolate policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberFailure {
    pub member_ids: Vec<String>,
    pub error: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub members: usize,
    pub payloads_sent: usize,
    pub tokens: usize,
    pub timestamp_fallbacks: usize,
    pub failures: Vec<MemberFailure>,
    pub total_latency: Duration,
}

impl RunSummary {
    pub fn mean_latency(&self) -> Option<Duration> {
        let sent = u32::try_from(self.payloads_sent).ok()?;
        (sent > 0).then(|| self.total_latency / sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_latency() {
        let summary = RunSummary {
            payloads_sent: 4,
            total_latency: Duration::from_millis(100),
            ..Default::default()
        };
        assert_eq!(summary.mean_latency(), Some(Duration::from_millis(25)));
        assert_eq!(RunSummary::default().mean_latency(), None);
    }
}
