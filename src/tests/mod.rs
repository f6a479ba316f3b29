//! Built-in test specifications
//!
//! Every specification is registered explicitly here. A worker process
//! rebuilds its module from this registry by `module/name` key, so a
//! specification must be listed to be runnable.
//!
//! ## Modules
//!
//! ### intro
//! - hello: greeting program
//! - fizzbuzz: the classic loop exercise
//!
//! ### selfcheck
//! Engine demonstrations: dependency order, timeouts, failing hooks,
//! cycles and crashing tests.

mod intro;

use crate::models::{SpecEntry, SpecRegistry};

/// All registered test specifications
pub fn registry() -> SpecRegistry {
    SpecRegistry::new()
        .register(SpecEntry::new("intro", "hello", intro::hello))
        .register(SpecEntry::new("intro", "fizzbuzz", intro::fizzbuzz))
        .register(SpecEntry::new("selfcheck", "passing", selfcheck::passing))
        .register(SpecEntry::new("selfcheck", "overrun", selfcheck::overrun))
        .register(SpecEntry::new("selfcheck", "reset", selfcheck::reset))
        .register(SpecEntry::new("selfcheck", "diamond", selfcheck::diamond))
        .register(SpecEntry::new("selfcheck", "broken_setup", selfcheck::broken_setup))
        .register(SpecEntry::new("selfcheck", "broken_teardown", selfcheck::broken_teardown))
        .register(SpecEntry::new("selfcheck", "cycle", selfcheck::cycle))
        .register(SpecEntry::new("selfcheck", "raising", selfcheck::raising))
        .register(SpecEntry::new("selfcheck", "panicking", selfcheck::panicking))
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_keys_are_unique() {
        let registry = registry();
        let keys: HashSet<_> = registry.entries().iter().map(|e| e.key()).collect();
        assert_eq!(keys.len(), registry.entries().len());
    }

    #[test]
    fn test_every_spec_builds() {
        for entry in registry().entries() {
            let module = (entry.build)();
            assert!(!module.factories().is_empty(), "{} has no tests", entry.key());
        }
    }

    #[test]
    fn test_modules() {
        assert_eq!(registry().modules(), vec!["intro", "selfcheck"]);
    }
}
