//! Per-file ledger of named stage intervals
//!
//! A ledger belongs to exactly one in-flight pipeline invocation, so it is a
//! plain owned value with no interior locking. Elapsed times are kept as
//! integer nanoseconds taken from a monotonic clock and rendered in µs.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::{Error, Result, TimerMisuseKind};

/// Stage name of the outer window around a whole invocation
pub const TOTAL: &str = "total";
/// Stage name of the window around match detection and the clone commit
pub const MATCH: &str = "match";

#[derive(Debug, Clone)]
struct Interval {
    stage: String,
    started: Option<Instant>,
    elapsed_nanos: Option<u64>,
}

/// Ledger of stage timers for one file
#[derive(Debug, Clone, Default)]
pub struct TimerLedger {
    intervals: Vec<Interval>,
}

impl TimerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_mut(&mut self, stage: &str) -> Option<&mut Interval> {
        self.intervals.iter_mut().find(|i| i.stage == stage)
    }

    /// Open a stage. Fails if the stage is already open.
    ///
    /// A stage that was already closed may be opened again; its previous
    /// elapsed time is replaced when it closes.
    pub fn start(&mut self, stage: &str) -> Result<()> {
        let now = Instant::now();
        match self.find_mut(stage) {
            Some(interval) if interval.started.is_some() => {
                Err(Error::timer_misuse(stage, TimerMisuseKind::AlreadyStarted))
            }
            Some(interval) => {
                interval.started = Some(now);
                Ok(())
            }
            None => {
                self.intervals.push(Interval {
                    stage: stage.to_string(),
                    started: Some(now),
                    elapsed_nanos: None,
                });
                Ok(())
            }
        }
    }

    /// Close an open stage and return its elapsed time
    pub fn end(&mut self, stage: &str) -> Result<Duration> {
        let now = Instant::now();
        let interval = self
            .find_mut(stage)
            .ok_or_else(|| Error::timer_misuse(stage, TimerMisuseKind::NotStarted))?;
        let started = interval
            .started
            .take()
            .ok_or_else(|| Error::timer_misuse(stage, TimerMisuseKind::NotStarted))?;

        let elapsed = now.saturating_duration_since(started);
        interval.elapsed_nanos = Some(u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX));
        Ok(elapsed)
    }

    /// Whether a stage is currently open
    pub fn is_open(&self, stage: &str) -> bool {
        self.intervals
            .iter()
            .any(|i| i.stage == stage && i.started.is_some())
    }

    /// Read-only snapshot of every closed stage, in the order stages were first opened
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            stages: self
                .intervals
                .iter()
                .filter_map(|i| {
                    i.elapsed_nanos.map(|elapsed_nanos| StageTiming {
                        stage: i.stage.clone(),
                        elapsed_nanos,
                    })
                })
                .collect(),
        }
    }
}

/// Elapsed time of one closed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_nanos: u64,
}

impl StageTiming {
    pub fn micros(&self) -> u64 {
        self.elapsed_nanos / 1_000
    }
}

/// Immutable view of a ledger's closed stages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub stages: Vec<StageTiming>,
}

impl TimerSnapshot {
    pub fn nanos(&self, stage: &str) -> Option<u64> {
        self.stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.elapsed_nanos)
    }

    pub fn get(&self, stage: &str) -> Option<Duration> {
        self.nanos(stage).map(Duration::from_nanos)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageTiming> {
        self.stages.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// `"total: 1234 µs match: 56 µs"`
    pub fn render_micros(&self) -> String {
        self.stages
            .iter()
            .map(|s| format!("{}: {} µs", s.stage, s.micros()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_end_records_elapsed() {
        let mut ledger = TimerLedger::new();
        ledger.start(TOTAL).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        let elapsed = ledger.end(TOTAL).unwrap();

        assert!(elapsed >= Duration::from_millis(2));
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.get(TOTAL), Some(elapsed));
        assert!(snapshot.stages[0].micros() >= 2_000);
    }

    #[test]
    fn test_double_start_is_misuse() {
        let mut ledger = TimerLedger::new();
        ledger.start(MATCH).unwrap();
        let err = ledger.start(MATCH).unwrap_err();
        assert!(matches!(
            err,
            Error::TimerMisuse { kind: TimerMisuseKind::AlreadyStarted, .. }
        ));
    }

    #[test]
    fn test_end_without_start_is_misuse() {
        let mut ledger = TimerLedger::new();
        let err = ledger.end(MATCH).unwrap_err();
        assert!(matches!(
            err,
            Error::TimerMisuse { kind: TimerMisuseKind::NotStarted, .. }
        ));

        // Closing twice is also a misuse
        ledger.start(MATCH).unwrap();
        ledger.end(MATCH).unwrap();
        assert!(ledger.end(MATCH).is_err());
    }

    #[test]
    fn test_nested_windows() {
        let mut ledger = TimerLedger::new();
        ledger.start(TOTAL).unwrap();
        ledger.start(MATCH).unwrap();
        assert!(ledger.is_open(TOTAL));
        ledger.end(MATCH).unwrap();
        ledger.end(TOTAL).unwrap();

        let snapshot = ledger.snapshot();
        assert!(snapshot.nanos(TOTAL).unwrap() >= snapshot.nanos(MATCH).unwrap());
        let order: Vec<_> = snapshot.iter().map(|s| s.stage.as_str()).collect();
        assert_eq!(order, vec![TOTAL, MATCH]);
    }

    #[test]
    fn test_snapshot_skips_open_stages() {
        let mut ledger = TimerLedger::new();
        ledger.start(TOTAL).unwrap();
        assert!(ledger.snapshot().is_empty());
    }
}
