//! Agent registry
//!
//! Holds the static set of agent profiles and their executor bindings.
//! Registration is idempotent per name; re-registering replaces the binding
//! but keeps the original registration position so tie-breaking stays
//! deterministic. The registry itself is not synchronized; share it as
//! `Arc<tokio::sync::Mutex<AgentRegistry>>`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use super::types::{AgentExecutor, AgentName, AgentProfile, RegisteredAgent};

/// Registry mapping agent names to profiles and executors
#[derive(Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentName, RegisteredAgent>,
    /// Registration order, used as the last-resort routing tiebreak
    order: Vec<AgentName>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent, replacing any previous binding for the same name
    pub fn register(&mut self, profile: AgentProfile, executor: Arc<dyn AgentExecutor>) {
        let name = profile.name;
        info!(agent = %name, "registering agent");

        if !self.agents.contains_key(&name) {
            self.order.push(name);
        }
        self.agents.insert(name, RegisteredAgent { profile, executor });
    }

    /// Remove an agent binding
    pub fn unregister(&mut self, name: AgentName) -> Option<RegisteredAgent> {
        let removed = self.agents.remove(&name);
        if removed.is_some() {
            self.order.retain(|n| *n != name);
        }
        removed
    }

    pub fn get(&self, name: AgentName) -> Option<&RegisteredAgent> {
        self.agents.get(&name)
    }

    /// Executor bound to an agent, if registered
    pub fn executor(&self, name: AgentName) -> Option<Arc<dyn AgentExecutor>> {
        self.agents.get(&name).map(|a| a.executor.clone())
    }

    /// All registered profiles, in registration order
    pub fn list(&self) -> Vec<AgentProfile> {
        self.order
            .iter()
            .filter_map(|n| self.agents.get(n).map(|a| a.profile.clone()))
            .collect()
    }

    pub fn contains(&self, name: AgentName) -> bool {
        self.agents.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// The standard four-agent profile set
///
/// Executors are supplied by the host; these profiles only carry the
/// routing hints. The `execute` agent is the general-purpose fallback:
/// no skill restrictions, highest preference on ties.
pub fn default_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(AgentName::Explore, "Searches code and files for relevant context")
            .with_skills(vec!["search".to_string(), "analysis".to_string()])
            .with_keywords(
                ["find", "search", "locate", "where", "look for", "explore", "todo"]
                    .map(String::from)
                    .to_vec(),
            )
            .with_priority(2)
            .with_complexity_range(1, 4),
        AgentProfile::new(AgentName::Plan, "Breaks large changes into ordered steps")
            .with_skills(vec!["planning".to_string()])
            .with_keywords(
                ["plan", "design", "architecture", "refactor", "strategy", "organize", "migrate"]
                    .map(String::from)
                    .to_vec(),
            )
            .with_priority(1)
            .with_complexity_range(5, 10),
        AgentProfile::new(AgentName::Execute, "General-purpose worker that applies changes")
            .with_keywords(
                ["run", "execute", "implement", "write", "create", "fix", "update"]
                    .map(String::from)
                    .to_vec(),
            )
            .with_priority(0)
            .with_complexity_range(1, 7),
        AgentProfile::new(AgentName::Review, "Checks completed work for defects")
            .with_skills(vec!["review".to_string()])
            .with_keywords(
                ["review", "check", "verify", "audit", "analyze", "inspect"]
                    .map(String::from)
                    .to_vec(),
            )
            .with_priority(2)
            .with_complexity_range(3, 8),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::FnExecutor;

    fn executor() -> Arc<dyn AgentExecutor> {
        Arc::new(FnExecutor::fixed("ok"))
    }

    fn register_defaults(registry: &mut AgentRegistry) {
        for profile in default_profiles() {
            registry.register(profile, executor());
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = AgentRegistry::new();
        register_defaults(&mut registry);

        assert_eq!(registry.len(), 4);
        assert!(registry.contains(AgentName::Plan));
        assert!(registry.get(AgentName::Explore).is_some());
        assert!(registry.executor(AgentName::Review).is_some());
    }

    #[test]
    fn test_list_preserves_registration_order() {
        let mut registry = AgentRegistry::new();
        register_defaults(&mut registry);

        let names: Vec<AgentName> = registry.list().iter().map(|p| p.name).collect();
        assert_eq!(names, AgentName::ALL.to_vec());
    }

    #[test]
    fn test_reregister_replaces_but_keeps_order() {
        let mut registry = AgentRegistry::new();
        register_defaults(&mut registry);

        let replacement =
            AgentProfile::new(AgentName::Plan, "replacement").with_priority(3);
        registry.register(replacement, executor());

        assert_eq!(registry.len(), 4);
        let names: Vec<AgentName> = registry.list().iter().map(|p| p.name).collect();
        assert_eq!(names, AgentName::ALL.to_vec());
        assert_eq!(registry.get(AgentName::Plan).unwrap().profile.priority, 3);
    }

    #[test]
    fn test_unregister() {
        let mut registry = AgentRegistry::new();
        register_defaults(&mut registry);

        assert!(registry.unregister(AgentName::Review).is_some());
        assert!(!registry.contains(AgentName::Review));
        assert_eq!(registry.len(), 3);
        assert!(registry.unregister(AgentName::Review).is_none());
    }

    #[test]
    fn test_default_profiles_shape() {
        let profiles = default_profiles();
        assert_eq!(profiles.len(), 4);
        for profile in &profiles {
            let (min, max) = profile.complexity_range;
            assert!(min >= 1 && max <= 10 && min <= max);
            assert!(!profile.keywords.is_empty());
        }
        // execute is the general-purpose fallback
        let execute = profiles
            .iter()
            .find(|p| p.name == AgentName::Execute)
            .unwrap();
        assert!(execute.skills.is_empty());
        assert_eq!(execute.priority, 0);
    }
}
