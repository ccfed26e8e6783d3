//! Service bootstrap finite state machine.
//!
//! Phases:
//! - Fetching (artifact download or cache hit)
//! - Loading (deserialize into the in-memory model)
//! - Serving
//!
//! Tracks how long each phase took; readiness is only reported once `Serving` is reached.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BootstrapPhase { Fetching, Loading, Serving }

impl BootstrapPhase {
    pub fn as_str(&self) -> &'static str {
        match self { BootstrapPhase::Fetching => "fetching", BootstrapPhase::Loading => "loading", BootstrapPhase::Serving => "serving" }
    }
}

#[derive(Debug)]
pub struct BootstrapState {
    phase: BootstrapPhase,
    phase_started_at: Instant,
    phase_durations: Vec<(BootstrapPhase, Duration)>,
}

impl Default for BootstrapState {
    fn default() -> Self { Self::new() }
}

impl BootstrapState {
    pub fn new() -> Self { Self { phase: BootstrapPhase::Fetching, phase_started_at: Instant::now(), phase_durations: Vec::new() } }
    pub fn phase(&self) -> BootstrapPhase { self.phase }
    /// Closes the current phase and moves to the next one. Returns the closed phase and its duration.
    /// `Serving` is terminal; advancing from it is a no-op that reports a zero duration.
    pub fn advance(&mut self) -> (BootstrapPhase, Duration) {
        if self.phase == BootstrapPhase::Serving { return (BootstrapPhase::Serving, Duration::ZERO); }
        let now = Instant::now();
        let closed = self.phase;
        let dur = now - self.phase_started_at;
        self.phase_durations.push((closed, dur));
        self.phase = match self.phase { BootstrapPhase::Fetching => BootstrapPhase::Loading, BootstrapPhase::Loading | BootstrapPhase::Serving => BootstrapPhase::Serving };
        self.phase_started_at = now;
        (closed, dur)
    }
    pub fn is_ready(&self) -> bool { self.phase == BootstrapPhase::Serving }
    pub fn durations(&self) -> &[(BootstrapPhase, Duration)] { &self.phase_durations }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseTiming { pub phase: BootstrapPhase, pub ms: u64 }

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleStatus {
    pub live: bool,
    pub ready: bool,
    pub phase: BootstrapPhase,
    pub phase_durations_ms: Vec<PhaseTiming>,
}

/// Shared view of the bootstrap state for the orchestrator and the health server.
#[derive(Debug)]
pub struct Lifecycle {
    state: RwLock<BootstrapState>,
    live: AtomicBool,
}

impl Default for Lifecycle {
    fn default() -> Self { Self::new() }
}

impl Lifecycle {
    pub fn new() -> Self { Self { state: RwLock::new(BootstrapState::new()), live: AtomicBool::new(true) } }
    pub fn phase(&self) -> BootstrapPhase { self.state.read().phase() }
    pub fn advance(&self) -> (BootstrapPhase, Duration) { self.state.write().advance() }
    pub fn is_ready(&self) -> bool { self.live.load(Ordering::SeqCst) && self.state.read().is_ready() }
    pub fn is_live(&self) -> bool { self.live.load(Ordering::SeqCst) }
    pub fn mark_not_live(&self) { self.live.store(false, Ordering::SeqCst); }

    pub fn status(&self) -> LifecycleStatus {
        let st = self.state.read();
        LifecycleStatus {
            live: self.is_live(),
            ready: st.is_ready() && self.is_live(),
            phase: st.phase(),
            phase_durations_ms: st.durations().iter().map(|(phase, d)| PhaseTiming { phase: *phase, ms: d.as_millis() as u64 }).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsm_progresses() {
        let mut st = BootstrapState::new();
        assert_eq!(st.phase(), BootstrapPhase::Fetching);
        assert_eq!(st.advance().0, BootstrapPhase::Fetching);
        assert_eq!(st.phase(), BootstrapPhase::Loading);
        assert!(!st.is_ready());
        assert_eq!(st.advance().0, BootstrapPhase::Loading);
        assert!(st.is_ready());
        assert_eq!(st.durations().len(), 2);
    }

    #[test]
    fn serving_is_terminal() {
        let mut st = BootstrapState::new();
        st.advance();
        st.advance();
        let (phase, dur) = st.advance();
        assert_eq!(phase, BootstrapPhase::Serving);
        assert_eq!(dur, Duration::ZERO);
        assert_eq!(st.durations().len(), 2);
    }

    #[test]
    fn not_live_is_never_ready() {
        let lc = Lifecycle::new();
        lc.advance();
        lc.advance();
        assert!(lc.is_ready());
        lc.mark_not_live();
        assert!(!lc.is_ready());
        let status = lc.status();
        assert!(!status.ready);
        assert_eq!(status.phase, BootstrapPhase::Serving);
    }
}
