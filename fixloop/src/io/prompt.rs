//! Message templates for collaborator-bound text.

use anyhow::Result;
use minijinja::{Environment, context};

const INITIAL_RUN_TEMPLATE: &str = include_str!("prompts/initial_run.md");
const RUN_OUTPUT_TEMPLATE: &str = include_str!("prompts/run_output.md");

/// Template engine wrapper around minijinja.
pub struct MessageTemplates {
    env: Environment<'static>,
}

impl MessageTemplates {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("initial_run", INITIAL_RUN_TEMPLATE)
            .expect("initial_run template should be valid");
        env.add_template("run_output", RUN_OUTPUT_TEMPLATE)
            .expect("run_output template should be valid");
        Self { env }
    }

    /// First-iteration message: command, optional free-form context hint,
    /// and truncated output.
    pub fn render_initial_run(
        &self,
        command: &str,
        context_hint: Option<&str>,
        output: &str,
    ) -> Result<String> {
        let template = self.env.get_template("initial_run")?;
        let rendered = template.render(context! {
            command => command,
            context => context_hint.map(str::trim).filter(|s| !s.is_empty()),
            output => output,
        })?;
        Ok(rendered)
    }

    /// Subsequent-iteration message: just the command and truncated output.
    pub fn render_run_output(&self, command: &str, output: &str) -> Result<String> {
        let template = self.env.get_template("run_output")?;
        let rendered = template.render(context! {
            command => command,
            output => output,
        })?;
        Ok(rendered)
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::new()
    }
}
