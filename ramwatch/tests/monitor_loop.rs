//! Monitor loop tests against in-memory stats and actions

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use ramwatch::config::{FileConfig, Overrides};
use ramwatch::types::MIB;
use ramwatch::{
    ActionSink, Decision, MemorySnapshot, Mode, MonitorError, MonitorLoop, PlainStyling, Settings,
    StatSource, ThresholdConfig,
};

const GIB: u64 = 1024 * MIB;

// ============================================================================
// Fakes
// ============================================================================

/// Replays queued readings, repeating the last one when the queue runs dry
#[derive(Clone)]
struct ScriptedSource {
    readings: Arc<Mutex<VecDeque<Result<MemorySnapshot, MonitorError>>>>,
    last: Arc<Mutex<Option<MemorySnapshot>>>,
}

impl ScriptedSource {
    fn new(readings: Vec<Result<MemorySnapshot, MonitorError>>) -> Self {
        Self {
            readings: Arc::new(Mutex::new(readings.into())),
            last: Arc::new(Mutex::new(None)),
        }
    }
}

impl StatSource for ScriptedSource {
    fn get(&mut self) -> Result<MemorySnapshot, MonitorError> {
        let next = self.readings.lock().unwrap().pop_front();
        match next {
            Some(Ok(snap)) => {
                *self.last.lock().unwrap() = Some(snap);
                Ok(snap)
            }
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .ok_or_else(|| MonitorError::StatsUnavailable("no readings".into())),
        }
    }
}

#[derive(Default)]
struct SinkState {
    swap_on: bool,
    calls: Vec<&'static str>,
    failures_left: usize,
}

/// Models OS swap state; enable/disable are idempotent like swapon/swapoff -a
#[derive(Clone, Default)]
struct FakeSink {
    state: Arc<Mutex<SinkState>>,
}

impl FakeSink {
    fn failing(times: usize) -> Self {
        let sink = Self::default();
        sink.state.lock().unwrap().failures_left = times;
        sink
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn swap_on(&self) -> bool {
        self.state.lock().unwrap().swap_on
    }

    fn record(&self, call: &'static str) -> Result<(), MonitorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(MonitorError::ActionFailed(format!("{} denied", call)));
        }
        match call {
            "enable_swap" => state.swap_on = true,
            "disable_swap" => state.swap_on = false,
            _ => {}
        }
        Ok(())
    }
}

#[async_trait]
impl ActionSink for FakeSink {
    async fn enable_swap(&self) -> Result<(), MonitorError> {
        self.record("enable_swap")
    }

    async fn disable_swap(&self) -> Result<(), MonitorError> {
        self.record("disable_swap")
    }

    async fn warn_operator(&self) -> Result<(), MonitorError> {
        self.record("warn_operator")
    }
}

fn settings() -> Settings {
    Settings {
        interval: Duration::from_millis(10),
        thresholds: ThresholdConfig::new(350 * MIB, 400 * MIB, 600 * MIB).unwrap(),
        color: false,
        ..Settings::default()
    }
}

fn low_memory() -> MemorySnapshot {
    MemorySnapshot::new(100 * MIB, 100 * MIB, GIB, 0).unwrap()
}

fn recovered() -> MemorySnapshot {
    MemorySnapshot::new(500 * MIB, 200 * MIB, GIB, 50 * MIB).unwrap()
}

fn monitor(
    readings: Vec<Result<MemorySnapshot, MonitorError>>,
    sink: FakeSink,
) -> MonitorLoop<ScriptedSource, FakeSink, PlainStyling> {
    MonitorLoop::new(&settings(), ScriptedSource::new(readings), sink, PlainStyling)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_low_memory_enables_swap_and_warns() {
    let sink = FakeSink::default();
    let mut monitor = monitor(vec![Ok(low_memory())], sink.clone());

    let report = monitor.tick().await.unwrap();

    assert_eq!(report.decisions, vec![Decision::EnableSwap, Decision::Warn]);
    assert!(report.failures.is_empty());
    assert_eq!(sink.calls(), vec!["enable_swap", "warn_operator"]);
    assert!(sink.swap_on());

    let line = report.line.unwrap();
    assert!(line.contains(" 200.00 / 1024.00 mb ram"), "{}", line);
}

#[tokio::test]
async fn test_recovery_disables_swap() {
    let sink = FakeSink::default();
    let mut monitor = monitor(vec![Ok(low_memory()), Ok(recovered())], sink.clone());

    monitor.tick().await.unwrap();
    assert!(sink.swap_on());

    let report = monitor.tick().await.unwrap();
    assert_eq!(report.decisions, vec![Decision::DisableSwap]);
    assert!(!sink.swap_on());
}

#[tokio::test]
async fn test_repeated_enable_is_idempotent() {
    let sink = FakeSink::default();
    let mut monitor = monitor(vec![Ok(low_memory()), Ok(low_memory())], sink.clone());

    monitor.tick().await.unwrap();
    let once = sink.swap_on();
    monitor.tick().await.unwrap();

    assert_eq!(sink.swap_on(), once);
    assert_eq!(
        sink.calls(),
        vec!["enable_swap", "warn_operator", "enable_swap", "warn_operator"]
    );
}

#[tokio::test]
async fn test_unavailable_stats_skip_the_tick() {
    let sink = FakeSink::default();
    let mut monitor = monitor(
        vec![
            Err(MonitorError::StatsUnavailable("meminfo vanished".into())),
            Ok(low_memory()),
        ],
        sink.clone(),
    );

    let err = monitor.tick().await.unwrap_err();
    assert!(matches!(err, MonitorError::StatsUnavailable(_)));
    assert!(err.is_recoverable());
    assert!(sink.calls().is_empty());

    let report = monitor.tick().await.unwrap();
    assert_eq!(report.decisions.len(), 2);
}

#[tokio::test]
async fn test_failed_action_is_reported_and_retried() {
    let sink = FakeSink::failing(1);
    let mut monitor = monitor(vec![Ok(low_memory())], sink.clone());

    let report = monitor.tick().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, Decision::EnableSwap);
    assert!(!sink.swap_on());

    // same reading next tick: the decision is recomputed and succeeds
    let report = monitor.tick().await.unwrap();
    assert!(report.failures.is_empty());
    assert!(sink.swap_on());
}

#[tokio::test]
async fn test_render_only_mode_never_dispatches() {
    let sink = FakeSink::default();
    let mut monitor = monitor(vec![Ok(low_memory())], sink.clone()).with_mode(Mode::RenderOnly);
    assert_eq!(monitor.mode(), Mode::RenderOnly);

    let report = monitor.tick().await.unwrap();
    assert_eq!(report.decisions, vec![Decision::EnableSwap, Decision::Warn]);
    assert!(report.line.is_some());
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn test_logging_disabled_renders_nothing() {
    let settings = Settings {
        log: false,
        ..settings()
    };
    let sink = FakeSink::default();
    let mut monitor = MonitorLoop::new(
        &settings,
        ScriptedSource::new(vec![Ok(recovered())]),
        sink,
        PlainStyling,
    );

    let report = monitor.tick().await.unwrap();
    assert!(report.line.is_none());
    assert_eq!(report.decisions, vec![Decision::DisableSwap]);
}

#[tokio::test]
async fn test_preflight_surfaces_broken_source() {
    let mut monitor = monitor(Vec::new(), FakeSink::default());
    assert!(matches!(
        monitor.preflight(),
        Err(MonitorError::StatsUnavailable(_))
    ));
}

#[tokio::test]
async fn test_run_until_stops_at_shutdown() {
    let sink = FakeSink::default();
    let mut monitor = monitor(vec![Ok(recovered())], sink.clone());

    let ticks = monitor.run_until(std::future::ready(())).await;
    assert_eq!(ticks, 1);
    assert_eq!(sink.calls(), vec!["disable_swap"]);
}

#[tokio::test]
async fn test_run_until_keeps_ticking_through_errors() {
    let sink = FakeSink::default();
    let mut monitor = monitor(
        vec![
            Err(MonitorError::StatsUnavailable("transient".into())),
            Ok(low_memory()),
        ],
        sink.clone(),
    );

    let ticks = monitor
        .run_until(tokio::time::sleep(Duration::from_millis(100)))
        .await;

    assert!(ticks >= 2, "ticks = {}", ticks);
    assert!(sink.calls().contains(&"enable_swap"));
}

#[test]
fn test_misordered_thresholds_fail_before_any_tick() {
    let mut file = FileConfig::default();
    file.apply(&Overrides {
        enable_swap_below: Some(500 * MIB),
        warn_below: Some(400 * MIB),
        disable_swap_above: Some(600 * MIB),
        ..Default::default()
    });

    let err = Settings::try_from(file).unwrap_err();
    assert!(matches!(err, MonitorError::ConfigInvalid(_)));
    assert!(!err.is_recoverable());
}
