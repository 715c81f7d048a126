//! Dev-only capture of the call stack behind a mutation, so the
//! debug bridge can show "where did this `set` come from" the way the
//! browser extension shows a component stack.
//!
//! Capturing and symbolizing a backtrace on every mutation is expensive,
//! so this is opt-in and, unlike the rest of the bridge, not wired up by
//! default even when the `devtools` feature is enabled. It's also
//! subject to the same runtime development/production check as the rest
//! of the bridge, so enabling it explicitly still does nothing outside
//! a development environment.

use std::backtrace::Backtrace;

/// A captured, filtered stack trace: frames belonging to this crate's
/// own plumbing (`nexus_state::store`, `nexus_state::devtools`) are
/// dropped so the trace starts at the caller's first frame.
#[derive(Debug, Clone)]
pub struct CapturedStack {
    pub frames: Vec<String>,
}

impl CapturedStack {
    pub fn capture() -> CapturedStack {
        let backtrace = Backtrace::force_capture();
        let raw = format!("{backtrace:?}");
        let frames = filter_internal_frames(raw.lines().map(str::to_string).collect());
        CapturedStack { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

fn filter_internal_frames(frames: Vec<String>) -> Vec<String> {
    frames
        .into_iter()
        .filter(|line| !line.contains("nexus_state::store") && !line.contains("nexus_state::devtools"))
        .collect()
}

/// Toggle for whether `StackTracer` actually captures anything. Off by
/// default: capturing a backtrace on every write is too expensive to
/// enable unconditionally even in a development build.
pub struct StackTracer {
    enabled: std::sync::atomic::AtomicBool,
}

impl StackTracer {
    pub fn new(enabled: bool) -> StackTracer {
        StackTracer { enabled: std::sync::atomic::AtomicBool::new(enabled) }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(std::sync::atomic::Ordering::Relaxed)
    }

    pub fn capture_if_enabled(&self) -> Option<CapturedStack> {
        (self.is_enabled() && crate::devtools::env_guard::is_development()).then(CapturedStack::capture)
    }
}

impl Default for StackTracer {
    fn default() -> Self {
        StackTracer::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_tracer_captures_nothing() {
        let tracer = StackTracer::new(false);
        assert!(tracer.capture_if_enabled().is_none());
    }

    #[test]
    fn test_enabled_tracer_captures_something() {
        let tracer = StackTracer::new(true);
        let captured = tracer.capture_if_enabled();
        assert!(captured.is_some());
    }
}
