//! Strategies for turning a mutation event into a devtools action name.
//!
//! `CompositeNamer` holds an ordered list of strategies rather than a
//! single fallback: the first one that produces a non-empty name wins,
//! and if none do, `name_for` fails so the caller (the debug bridge) can
//! fall back to a timestamp-based name instead of silently guessing.

use crate::plugin::MutationEvent;

fn atom_display_name(event: &MutationEvent) -> String {
    event.atom_name.clone().unwrap_or_else(|| format!("atom-{}", event.atom_id))
}

fn format_timestamp(millis: u64) -> String {
    chrono::DateTime::from_timestamp_millis(millis as i64)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
        .unwrap_or_else(|| millis.to_string())
}

pub trait ActionNamer: Send + Sync {
    /// `Err` means this strategy declines to name the event; the caller
    /// decides what happens next (try another strategy, fall back to a
    /// timestamp-based name).
    fn name_for(&self, event: &MutationEvent) -> Result<String, String>;
}

/// `"{atomName}/{operation}"`, falling back to `"atom-{id}/{operation}"`
/// for unlabelled atoms. The default when nothing else is configured.
pub struct AutoNamer;

impl ActionNamer for AutoNamer {
    fn name_for(&self, event: &MutationEvent) -> Result<String, String> {
        Ok(format!("{}/{}", atom_display_name(event), event.operation))
    }
}

/// Just the operation name, regardless of which atom changed.
pub struct SimpleNamer;

impl ActionNamer for SimpleNamer {
    fn name_for(&self, event: &MutationEvent) -> Result<String, String> {
        Ok(event.operation.clone())
    }
}

/// A template supporting the built-in `{atomName}`, `{operation}`, and
/// `{timestamp}` placeholders, plus any number of caller-supplied named
/// placeholders resolved by a function of the event.
pub struct PatternNamer {
    template: String,
    placeholders: Vec<(String, Box<dyn Fn(&MutationEvent) -> String + Send + Sync>)>,
}

impl PatternNamer {
    pub fn new(template: impl Into<String>) -> Self {
        PatternNamer { template: template.into(), placeholders: Vec::new() }
    }

    /// Register a custom `{key}` placeholder resolved by `f` at name time.
    pub fn with_placeholder(
        mut self,
        key: impl Into<String>,
        f: impl Fn(&MutationEvent) -> String + Send + Sync + 'static,
    ) -> Self {
        self.placeholders.push((key.into(), Box::new(f)));
        self
    }
}

impl ActionNamer for PatternNamer {
    fn name_for(&self, event: &MutationEvent) -> Result<String, String> {
        let mut out = self
            .template
            .replace("{atomName}", &atom_display_name(event))
            .replace("{operation}", &event.operation)
            .replace("{timestamp}", &format_timestamp(event.timestamp_millis));
        for (key, f) in &self.placeholders {
            out = out.replace(&format!("{{{key}}}"), &f(event));
        }
        Ok(out)
    }
}

/// A caller-supplied closure, for naming schemes the other strategies
/// can't express. Always succeeds.
pub struct CustomNamer<F: Fn(&MutationEvent) -> String + Send + Sync>(pub F);

impl<F: Fn(&MutationEvent) -> String + Send + Sync> ActionNamer for CustomNamer<F> {
    fn name_for(&self, event: &MutationEvent) -> Result<String, String> {
        Ok((self.0)(event))
    }
}

/// Tries each strategy in order and uses the first one that produces a
/// non-empty name. Fails only if every strategy does.
pub struct CompositeNamer {
    strategies: Vec<Box<dyn ActionNamer>>,
}

impl CompositeNamer {
    pub fn new(strategies: Vec<Box<dyn ActionNamer>>) -> Self {
        CompositeNamer { strategies }
    }
}

impl ActionNamer for CompositeNamer {
    fn name_for(&self, event: &MutationEvent) -> Result<String, String> {
        for strategy in &self.strategies {
            if let Ok(name) = strategy.name_for(event) {
                if !name.is_empty() {
                    return Ok(name);
                }
            }
        }
        Err("no configured naming strategy produced a name".to_string())
    }
}

impl Default for CompositeNamer {
    fn default() -> Self {
        CompositeNamer::new(vec![Box::new(AutoNamer)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(operation: &str) -> MutationEvent {
        MutationEvent {
            atom_id: 3,
            atom_name: Some("counter".into()),
            operation: operation.to_string(),
            previous: serde_json::json!(0),
            next: serde_json::json!(1),
            action_label: None,
            timestamp_millis: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_auto_namer_uses_atom_and_operation() {
        assert_eq!(AutoNamer.name_for(&event("SET")).unwrap(), "counter/SET");
    }

    #[test]
    fn test_auto_namer_falls_back_to_atom_id_when_unlabelled() {
        let mut e = event("SET");
        e.atom_name = None;
        assert_eq!(AutoNamer.name_for(&e).unwrap(), "atom-3/SET");
    }

    #[test]
    fn test_simple_namer_is_just_the_operation() {
        assert_eq!(SimpleNamer.name_for(&event("SET")).unwrap(), "SET");
    }

    #[test]
    fn test_pattern_namer_fills_standard_placeholders() {
        let namer = PatternNamer::new("{atomName}:{operation}@{timestamp}");
        let name = namer.name_for(&event("SET")).unwrap();
        assert!(name.starts_with("counter:SET@"));
    }

    #[test]
    fn test_pattern_namer_custom_placeholder() {
        let namer = PatternNamer::new("[{tag}] {operation}")
            .with_placeholder("tag", |e| format!("atom-{}", e.atom_id));
        assert_eq!(namer.name_for(&event("SET")).unwrap(), "[atom-3] SET");
    }

    #[test]
    fn test_composite_tries_strategies_in_order() {
        let namer = CompositeNamer::new(vec![Box::new(SimpleNamer), Box::new(AutoNamer)]);
        assert_eq!(namer.name_for(&event("SET")).unwrap(), "SET");
    }

    #[test]
    fn test_composite_default_falls_back_to_auto_namer() {
        let namer = CompositeNamer::default();
        assert_eq!(namer.name_for(&event("SET")).unwrap(), "counter/SET");
    }

    #[test]
    fn test_composite_fails_when_no_strategy_configured() {
        let namer = CompositeNamer::new(Vec::new());
        assert!(namer.name_for(&event("SET")).is_err());
    }
}
