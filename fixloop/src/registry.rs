//! Agent configuration registry.
//!
//! Parses one or more TOML sources mapping agent names to definitions,
//! merges them with duplicate detection, validates every definition against
//! its variant's key schema, and builds the agent runtimes. All validation
//! is eager: a failed load constructs no agents at all.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow, bail};
use tracing::debug;

use crate::agents::{Agent, AgentVariant, variants};
use crate::cancel::CancelFlag;
use crate::coder::Coder;

/// Validated, runnable agents keyed by name.
pub struct AgentRegistry {
    agents: BTreeMap<String, Box<dyn Agent>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AgentRegistry {
    /// Load agents from configuration sources, merged left to right.
    ///
    /// `None` and blank sources are skipped. A name defined by more than one
    /// source fails the load, as does any schema violation: missing or
    /// non-string `type`, unknown `type`, missing required key, unrecognized
    /// key, or a wrong value type for a recognized key.
    pub fn load(sources: &[Option<String>]) -> Result<Self> {
        let mut merged: BTreeMap<String, toml::Table> = BTreeMap::new();
        for source in sources.iter().flatten() {
            if source.trim().is_empty() {
                continue;
            }
            let parsed: toml::Table = source.parse().context("parse agent configuration")?;
            for (name, value) in parsed {
                let toml::Value::Table(config) = value else {
                    bail!("agent '{name}' must be a table of configuration keys");
                };
                if merged.contains_key(&name) {
                    bail!("duplicate agent '{name}' found across configuration sources");
                }
                merged.insert(name, config);
            }
        }

        let mut agents: BTreeMap<String, Box<dyn Agent>> = BTreeMap::new();
        for (name, mut config) in merged {
            let type_value = config
                .remove("type")
                .ok_or_else(|| anyhow!("agent '{name}' is missing required 'type' key"))?;
            let toml::Value::String(type_tag) = type_value else {
                bail!("agent '{name}' has an invalid 'type' value, it must be a string");
            };
            let variant = variants()
                .iter()
                .find(|variant| variant.type_tag == type_tag)
                .ok_or_else(|| anyhow!("unknown agent type '{type_tag}' for agent '{name}'"))?;

            validate_keys(&name, variant, &config)?;
            let agent = (variant.build)(&name, &config)?;
            debug!(agent = %name, agent_type = %type_tag, "validated agent");
            agents.insert(name, agent);
        }

        Ok(Self { agents })
    }

    /// Whether `name` was configured. Callers must check this before
    /// [`AgentRegistry::run_agent`].
    pub fn is_agent(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Configured agent names and type tags, in sorted name order.
    pub fn agents(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.agents
            .iter()
            .map(|(name, agent)| (name.as_str(), agent.type_tag()))
    }

    /// Run a configured agent against the collaborator.
    ///
    /// # Panics
    ///
    /// Panics when `name` was never configured; that is a caller bug, not a
    /// user input error. Gate calls with [`AgentRegistry::is_agent`].
    pub fn run_agent(&self, name: &str, coder: &mut dyn Coder, cancel: &CancelFlag) -> Result<()> {
        let agent = self
            .agents
            .get(name)
            .unwrap_or_else(|| panic!("run_agent('{name}') without is_agent() check"));
        agent.run(coder, cancel)
    }
}

fn validate_keys(name: &str, variant: &AgentVariant, config: &toml::Table) -> Result<()> {
    let missing: Vec<&str> = variant
        .required_keys
        .iter()
        .copied()
        .filter(|key| !config.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        bail!(
            "agent '{name}' is missing required keys: {}",
            missing.join(", ")
        );
    }

    let unknown: Vec<&str> = config
        .keys()
        .map(String::as_str)
        .filter(|key| {
            !variant.required_keys.contains(key) && !variant.optional_keys.contains(key)
        })
        .collect();
    if !unknown.is_empty() {
        bail!("agent '{name}' has unknown keys: {}", unknown.join(", "));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    const AGENT_A: &str = r#"
        [a]
        type = "fix"
        command = "make lint"
    "#;

    const AGENT_B: &str = r#"
        [b]
        type = "fix"
        command = "make test"
    "#;

    #[test]
    fn loads_agents_from_multiple_sources() {
        let registry =
            AgentRegistry::load(&[source(AGENT_A), None, source(AGENT_B)]).expect("load");

        assert!(registry.is_agent("a"));
        assert!(registry.is_agent("b"));
        assert!(!registry.is_agent("c"));
        let listed: Vec<(&str, &str)> = registry.agents().collect();
        assert_eq!(listed, vec![("a", "fix"), ("b", "fix")]);
    }

    /// Duplicate detection spans all sources, regardless of order.
    #[test]
    fn duplicate_agent_across_sources_fails_either_order() {
        let err = AgentRegistry::load(&[source(AGENT_A), source(AGENT_A)]).unwrap_err();
        assert!(err.to_string().contains("duplicate agent 'a'"));

        let other_a = r#"
            [a]
            type = "fix"
            command = "make check"
        "#;
        let err = AgentRegistry::load(&[source(other_a), source(AGENT_A)]).unwrap_err();
        assert!(err.to_string().contains("duplicate agent 'a'"));
    }

    #[test]
    fn blank_and_absent_sources_are_skipped() {
        let registry =
            AgentRegistry::load(&[None, source(""), source("  \n"), source(AGENT_A)])
                .expect("load");
        assert!(registry.is_agent("a"));
    }

    #[test]
    fn missing_type_key_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            command = "make lint"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("missing required 'type' key"));
    }

    #[test]
    fn non_string_type_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            type = 3
            command = "make lint"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("invalid 'type' value"));
    }

    #[test]
    fn unknown_type_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            type = "reviewer"
            command = "make lint"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("unknown agent type 'reviewer'"));
    }

    #[test]
    fn missing_required_key_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            type = "fix"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("missing required keys: command"));
    }

    #[test]
    fn unknown_key_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            type = "fix"
            command = "make lint"
            foo = "bar"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("unknown keys: foo"));
    }

    #[test]
    fn wrong_value_type_for_recognized_key_fails() {
        let err = AgentRegistry::load(&[source(
            r#"
            [a]
            type = "fix"
            command = "make lint"
            max_output_lines = "many"
            "#,
        )])
        .unwrap_err();
        assert!(err.to_string().contains("must be an integer"));
    }

    #[test]
    fn malformed_toml_fails() {
        let err = AgentRegistry::load(&[source("not toml at all [")]).unwrap_err();
        assert!(err.to_string().contains("parse agent configuration"));
    }

    #[test]
    #[should_panic(expected = "without is_agent() check")]
    fn run_agent_panics_on_unknown_name() {
        use crate::test_support::ScriptedCoder;

        let registry = AgentRegistry::load(&[]).expect("load");
        let mut coder = ScriptedCoder::new();
        let _ = registry.run_agent("ghost", &mut coder, &CancelFlag::new());
    }
}
