use std::sync::Mutex;

use serde::Serialize;

use crate::types::TokenUsage;

/// Usage reported by one successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    /// Model the call was made against
    pub model: String,
    /// Provider response identifier
    pub response_id: String,
    /// Token counters
    pub usage: TokenUsage,
}

/// Append-only usage log shared by every call on one client
///
/// Safe for concurrent calls; readers get a snapshot.
#[derive(Debug, Default)]
pub struct UsageAccumulator {
    records: Mutex<Vec<UsageRecord>>,
}

impl UsageAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn record(&self, record: UsageRecord) {
        tracing::debug!(
            model = %record.model,
            response_id = %record.response_id,
            prompt_tokens = record.usage.prompt_tokens,
            completion_tokens = record.usage.completion_tokens,
            "recorded token usage"
        );
        self.records.lock().unwrap_or_else(|e| e.into_inner()).push(record);
    }

    /// Snapshot of every record in call order
    pub fn records(&self) -> Vec<UsageRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sum of all recorded usage
    pub fn totals(&self) -> TokenUsage {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.iter().fold(TokenUsage::default(), |mut acc, record| {
            acc += record.usage;
            acc
        })
    }

    /// Number of recorded calls
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn record(id: &str, prompt: u64, completion: u64) -> UsageRecord {
        UsageRecord {
            model: "gpt-5-mini".to_owned(),
            response_id: id.to_owned(),
            usage: TokenUsage {
                prompt_tokens: prompt,
                completion_tokens: completion,
                ..TokenUsage::default()
            },
        }
    }

    #[test]
    fn totals_sum_every_record() {
        let acc = UsageAccumulator::new();
        acc.record(record("a", 10, 5));
        acc.record(record("b", 7, 3));

        let totals = acc.totals();

        assert_eq!(totals.prompt_tokens, 17);
        assert_eq!(totals.completion_tokens, 8);
        assert_eq!(totals.total(), 25);
        assert_eq!(acc.records()[1].response_id, "b");
    }

    #[test]
    fn concurrent_appends_are_kept() {
        let acc = Arc::new(UsageAccumulator::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let acc = Arc::clone(&acc);
                thread::spawn(move || acc.record(record(&format!("r{i}"), 1, 1)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.len(), 8);
        assert_eq!(acc.totals().prompt_tokens, 8);
    }
}
