//! Runtime development/production signal, independent of the
//! compile-time `devtools` Cargo feature.
//!
//! The feature flag controls whether the bridge exists at all; this
//! controls whether an existing bridge actually forwards state once a
//! process is running, so a build profile that ships with `devtools`
//! enabled doesn't unconditionally mirror state off a production
//! deployment.

use std::env;

const ENV_VAR: &str = "NEXUS_STATE_ENV";

/// `true` unless `NEXUS_STATE_ENV` is explicitly set to `production`
/// (case-insensitive). Falls back to `cfg!(debug_assertions)` when the
/// variable is unset, so debug builds behave as development by default
/// and release builds don't silently start forwarding state.
///
/// Checked at the call site rather than cached, so flipping the
/// variable in a test harness takes effect on the next mutation.
pub fn is_development() -> bool {
    match env::var(ENV_VAR) {
        Ok(value) => !value.eq_ignore_ascii_case("production"),
        Err(_) => cfg!(debug_assertions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; serialize tests that
    // touch NEXUS_STATE_ENV so they don't race each other.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_defaults_to_debug_assertions_when_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var(ENV_VAR);
        assert_eq!(is_development(), cfg!(debug_assertions));
    }

    #[test]
    fn test_production_value_disables_development() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(ENV_VAR, "production");
        assert!(!is_development());
        env::set_var(ENV_VAR, "Production");
        assert!(!is_development());
        env::remove_var(ENV_VAR);
    }

    #[test]
    fn test_other_values_are_treated_as_development() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(ENV_VAR, "staging");
        assert!(is_development());
        env::remove_var(ENV_VAR);
    }
}
