//! Feature registry: static descriptors, ordered selection, lazy handlers.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use anyhow::{Result, bail};
use tracing::debug;

use crate::core::event::EventType;
use crate::core::types::{Category, ErrorPolicy};
use crate::features::{Handler, catalog};
use crate::io::config::Config;

/// Static metadata for one feature.
#[derive(Clone, Copy)]
pub struct Descriptor {
    /// Stable identifier used in configuration and on the CLI.
    pub name: &'static str,
    /// Event types the feature participates in (non-empty).
    pub events: &'static [EventType],
    /// Lower runs earlier; ties break on `name`.
    pub priority: i32,
    pub category: Category,
    /// Dotted configuration path, empty for always-on features.
    pub config_path: &'static str,
    /// Typed read of the `enabled` flag at `config_path`.
    pub enabled: Option<fn(&Config) -> bool>,
    /// What a failed evaluation means for authoritative features.
    pub on_error: ErrorPolicy,
    /// Factory for the executable handler.
    pub load: fn() -> Handler,
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.name)
            .field("events", &self.events)
            .field("priority", &self.priority)
            .field("category", &self.category)
            .field("config_path", &self.config_path)
            .field("on_error", &self.on_error)
            .finish()
    }
}

impl Descriptor {
    pub fn handles(&self, event: EventType) -> bool {
        self.events.contains(&event)
    }

    /// Always-on when there is no config path, otherwise the typed flag.
    pub fn is_enabled(&self, config: &Config) -> bool {
        match self.enabled {
            None => true,
            Some(read) => read(config),
        }
    }
}

/// Catalog of descriptors plus the handlers loaded so far in this process.
pub struct Registry {
    descriptors: Vec<Descriptor>,
    loaded: RefCell<HashMap<&'static str, Rc<Handler>>>,
}

impl Registry {
    /// Build a registry, checking catalog invariants:
    /// - names are unique
    /// - every descriptor names at least one event
    /// - an empty config path goes with no enable accessor and vice versa
    pub fn new(descriptors: Vec<Descriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if !seen.insert(descriptor.name) {
                bail!("duplicate feature name '{}'", descriptor.name);
            }
            if descriptor.events.is_empty() {
                bail!("feature '{}' declares no event types", descriptor.name);
            }
            if descriptor.config_path.is_empty() != descriptor.enabled.is_none() {
                bail!(
                    "feature '{}' must have both a config path and an enable accessor, or neither",
                    descriptor.name
                );
            }
        }
        Ok(Self {
            descriptors,
            loaded: RefCell::new(HashMap::new()),
        })
    }

    /// Registry over the built-in feature catalog.
    pub fn builtin() -> Result<Self> {
        Self::new(catalog())
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    /// Descriptors participating in `event`, sorted by `(priority, name)`.
    pub fn descriptors_for(&self, event: EventType) -> Vec<&Descriptor> {
        let mut selected: Vec<&Descriptor> =
            self.descriptors.iter().filter(|d| d.handles(event)).collect();
        selected.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));
        selected
    }

    /// Enabled descriptors for `event` in execution order.
    pub fn enabled_for(&self, event: EventType, config: &Config) -> Vec<&Descriptor> {
        self.descriptors_for(event)
            .into_iter()
            .filter(|d| d.is_enabled(config))
            .collect()
    }

    /// Return the handler for `descriptor`, constructing it on first use.
    pub fn load(&self, descriptor: &Descriptor) -> Rc<Handler> {
        if let Some(handler) = self.loaded.borrow().get(descriptor.name) {
            return Rc::clone(handler);
        }
        debug!(feature = descriptor.name, "loading feature");
        let handler = Rc::new((descriptor.load)());
        self.loaded
            .borrow_mut()
            .insert(descriptor.name, Rc::clone(&handler));
        handler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::FeatureResult;
    use crate::features::{FeatureContext, Tracker};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Noop;

    impl Tracker for Noop {
        fn run(&self, _ctx: &FeatureContext<'_>) -> Option<FeatureResult> {
            None
        }
    }

    fn noop() -> Handler {
        Handler::Tracker(Box::new(Noop))
    }

    fn descriptor(name: &'static str, priority: i32) -> Descriptor {
        Descriptor {
            name,
            events: &[EventType::PreToolUse],
            priority,
            category: Category::Tracker,
            config_path: "",
            enabled: None,
            on_error: ErrorPolicy::Proceed,
            load: noop,
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let registry = Registry::builtin().expect("builtin");
        assert!(registry.get("rateLimiter").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn orders_by_priority_then_name() {
        let registry = Registry::new(vec![
            descriptor("zeta", 10),
            descriptor("beta", 5),
            descriptor("alpha", 10),
        ])
        .expect("registry");

        let names: Vec<&str> = registry
            .descriptors_for(EventType::PreToolUse)
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["beta", "alpha", "zeta"]);
    }

    #[test]
    fn ordering_is_stable_and_sorted_for_every_event() {
        let registry = Registry::builtin().expect("builtin");
        for event in EventType::ALL {
            let first: Vec<&str> = registry.descriptors_for(*event).iter().map(|d| d.name).collect();
            let second: Vec<&str> = registry.descriptors_for(*event).iter().map(|d| d.name).collect();
            assert_eq!(first, second);
            let keys: Vec<(i32, &str)> = registry
                .descriptors_for(*event)
                .iter()
                .map(|d| (d.priority, d.name))
                .collect();
            assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]));
        }
    }

    #[test]
    fn filters_by_event_type() {
        let mut stop_only = descriptor("stopper", 1);
        stop_only.events = &[EventType::Stop];
        let registry = Registry::new(vec![descriptor("pre", 1), stop_only]).expect("registry");
        let names: Vec<&str> = registry
            .descriptors_for(EventType::Stop)
            .iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["stopper"]);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Registry::new(vec![descriptor("a", 1), descriptor("a", 2)])
            .err()
            .expect("duplicate rejected");
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn rejects_empty_event_set_and_mismatched_toggle() {
        let mut no_events = descriptor("a", 1);
        no_events.events = &[];
        assert!(Registry::new(vec![no_events]).is_err());

        let mut path_without_toggle = descriptor("b", 1);
        path_without_toggle.config_path = "guards.b";
        assert!(Registry::new(vec![path_without_toggle]).is_err());
    }

    #[test]
    fn enabled_follows_typed_flag() {
        let registry = Registry::builtin().expect("builtin");
        let mut config = Config::default();
        let limiter = registry.get("rateLimiter").expect("rateLimiter");
        assert!(!limiter.is_enabled(&config));
        config.rate_limiter.enabled = true;
        assert!(limiter.is_enabled(&config));

        let always_on = descriptor("always", 1);
        assert!(always_on.is_enabled(&config));
    }

    static LOADS: AtomicUsize = AtomicUsize::new(0);

    fn counting() -> Handler {
        LOADS.fetch_add(1, Ordering::SeqCst);
        Handler::Tracker(Box::new(Noop))
    }

    #[test]
    fn load_constructs_handler_once() {
        let mut d = descriptor("counted", 1);
        d.load = counting;
        let registry = Registry::new(vec![d]).expect("registry");
        let d = registry.get("counted").expect("descriptor");
        let first = registry.load(d);
        let second = registry.load(d);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(LOADS.load(Ordering::SeqCst), 1);
    }
}
