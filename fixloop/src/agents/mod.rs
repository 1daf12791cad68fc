//! Agent abstraction and the variant table used by the registry.
//!
//! An agent is a named, configured automation unit that drives an iterative
//! interaction with the collaborator. Each variant declares its type tag and
//! key schema here; adding a variant means adding an implementation plus an
//! entry in [`variants`], not touching registry dispatch.

pub mod fix;

use anyhow::{Result, bail};

use crate::cancel::CancelFlag;
use crate::coder::Coder;

/// A configured, runnable agent.
pub trait Agent {
    /// Configured agent name.
    fn name(&self) -> &str;

    /// Type tag of the variant that built this agent.
    fn type_tag(&self) -> &'static str;

    /// Drive the agent against the collaborator until it finishes or aborts.
    fn run(&self, coder: &mut dyn Coder, cancel: &CancelFlag) -> Result<()>;
}

/// Static description of an agent variant: its type tag, key schema, and
/// constructor.
pub struct AgentVariant {
    pub type_tag: &'static str,
    pub required_keys: &'static [&'static str],
    pub optional_keys: &'static [&'static str],
    pub build: fn(name: &str, config: &toml::Table) -> Result<Box<dyn Agent>>,
}

static VARIANTS: &[AgentVariant] = &[fix::VARIANT];

/// All known agent variants.
pub fn variants() -> &'static [AgentVariant] {
    VARIANTS
}

/// Read a required string value from an agent's config table.
pub(crate) fn required_str(agent: &str, config: &toml::Table, key: &str) -> Result<String> {
    match config.get(key) {
        Some(toml::Value::String(value)) => Ok(value.clone()),
        Some(_) => bail!("agent '{agent}': key '{key}' must be a string"),
        None => bail!("agent '{agent}': missing required key '{key}'"),
    }
}

/// Read an optional string value from an agent's config table.
pub(crate) fn optional_str(agent: &str, config: &toml::Table, key: &str) -> Result<Option<String>> {
    match config.get(key) {
        Some(toml::Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => bail!("agent '{agent}': key '{key}' must be a string"),
        None => Ok(None),
    }
}

/// Read an optional non-negative integer value from an agent's config table.
pub(crate) fn optional_uint(agent: &str, config: &toml::Table, key: &str) -> Result<Option<usize>> {
    match config.get(key) {
        Some(toml::Value::Integer(value)) if *value >= 0 => Ok(Some(*value as usize)),
        Some(toml::Value::Integer(_)) => {
            bail!("agent '{agent}': key '{key}' must be a non-negative integer")
        }
        Some(_) => bail!("agent '{agent}': key '{key}' must be an integer"),
        None => Ok(None),
    }
}

/// Read an optional boolean value from an agent's config table.
pub(crate) fn optional_bool(agent: &str, config: &toml::Table, key: &str) -> Result<Option<bool>> {
    match config.get(key) {
        Some(toml::Value::Boolean(value)) => Ok(Some(*value)),
        Some(_) => bail!("agent '{agent}': key '{key}' must be a boolean"),
        None => Ok(None),
    }
}
