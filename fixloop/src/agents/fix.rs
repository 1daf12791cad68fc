//! Fix agent: run a command repeatedly and drive the collaborator to repair
//! whatever makes it fail.
//!
//! Each iteration executes the configured command through the host shell. A
//! zero exit status finishes the agent; otherwise the captured output is
//! truncated to the configured line budget, context files not mentioned in
//! the truncated output are dropped, a message is composed and delivered,
//! and the collaborator's follow-ups are drained before the next run.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::agents::{
    Agent, AgentVariant, optional_bool, optional_str, optional_uint, required_str,
};
use crate::cancel::CancelFlag;
use crate::chunk::{ChunkStrategy, truncate_output};
use crate::coder::{Coder, Reply};
use crate::io::process::run_shell_command;
use crate::io::prompt::MessageTemplates;

pub const DEFAULT_MAX_OUTPUT_LINES: usize = 50;

const INTERRUPT_NOTICE: &str = "\n\n^C Exiting due to keyboard interrupt.";

pub const VARIANT: AgentVariant = AgentVariant {
    type_tag: "fix",
    required_keys: &["command"],
    optional_keys: &[
        "context",
        "max_output_lines",
        "chunk_output_strategy",
        "add_files_mentioned_in_command_output",
    ],
    build,
};

fn build(name: &str, config: &toml::Table) -> Result<Box<dyn Agent>> {
    Ok(Box::new(FixAgent::from_config(name, config)?))
}

/// Fix-loop agent configuration plus its runtime.
#[derive(Debug, Clone)]
pub struct FixAgent {
    name: String,
    command: String,
    context: Option<String>,
    max_output_lines: usize,
    chunk_strategy: ChunkStrategy,
    add_files_mentioned_in_output: bool,
}

impl FixAgent {
    /// Build from a validated config table. Key presence is checked by the
    /// registry against [`VARIANT`]; value types are checked here.
    pub fn from_config(name: &str, config: &toml::Table) -> Result<Self> {
        let chunk_strategy = match optional_str(name, config, "chunk_output_strategy")? {
            Some(value) => ChunkStrategy::from_config(&value)?,
            None => ChunkStrategy::default(),
        };
        Ok(Self {
            name: name.to_string(),
            command: required_str(name, config, "command")?,
            context: optional_str(name, config, "context")?,
            max_output_lines: optional_uint(name, config, "max_output_lines")?
                .unwrap_or(DEFAULT_MAX_OUTPUT_LINES),
            chunk_strategy,
            add_files_mentioned_in_output: optional_bool(
                name,
                config,
                "add_files_mentioned_in_command_output",
            )?
            .unwrap_or(true),
        })
    }
}

impl Agent for FixAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_tag(&self) -> &'static str {
        VARIANT.type_tag
    }

    #[instrument(skip_all, fields(agent = %self.name))]
    fn run(&self, coder: &mut dyn Coder, cancel: &CancelFlag) -> Result<()> {
        let templates = MessageTemplates::new();
        let mut first_run = true;

        loop {
            if aborted(coder, cancel) {
                return Ok(());
            }

            let result = match run_shell_command(&self.command) {
                Ok(result) => result,
                Err(err) => {
                    coder.report_error(&format!("Error running command: {err:#}"));
                    return Ok(());
                }
            };
            if aborted(coder, cancel) {
                return Ok(());
            }

            if result.status.success() {
                info!(command = %self.command, "command succeeded");
                coder.report_info(&format!(
                    "Command '{}' executed successfully, {} is finished.",
                    self.command, self.name
                ));
                return Ok(());
            }
            debug!(exit_code = ?result.status.code(), "command failed, composing message");

            let output = truncate_output(&result.output, self.max_output_lines, self.chunk_strategy);

            // Retention is recomputed from the truncated output alone, every
            // iteration. Stale files accumulate fast on scattered tasks like
            // lint fixing and degrade repair accuracy.
            let dropped = if coder.context().has_files() {
                coder.context().retain_mentioned(&output)
            } else {
                Vec::new()
            };

            let mut message = if first_run {
                templates.render_initial_run(&self.command, self.context.as_deref(), &output)?
            } else {
                templates.render_run_output(&self.command, &output)?
            };
            first_run = false;

            if !dropped.is_empty() {
                message.push_str(&format!(
                    "\nI dropped these *read-write* files from the context: {}, \
                     please re-request *read-write* access for these files if you need them.",
                    dropped.join(", ")
                ));
            }

            // Mention-scan additions run after retention pruning, so a file
            // added this iteration is not pruned before the collaborator has
            // seen it once.
            if self.add_files_mentioned_in_output
                && let Some(added) = coder.scan_for_file_mentions(&output)
            {
                message.push('\n');
                message.push_str(&added);
            }

            // Drain follow-ups: the collaborator may answer with another
            // message of its own (clarifying sub-questions); keep the
            // exchange going until it replies with nothing.
            let mut pending = message;
            loop {
                let reply = coder.send_message(&pending)?;
                if aborted(coder, cancel) {
                    return Ok(());
                }
                match reply {
                    Reply::FollowUp(next) => pending = next,
                    Reply::Empty => break,
                    Reply::Eof => return Ok(()),
                }
            }
        }
    }
}

/// Check the interrupt flag, reporting the abort diagnostic on first sight.
fn aborted(coder: &mut dyn Coder, cancel: &CancelFlag) -> bool {
    if cancel.is_cancelled() {
        coder.report_error(INTERRUPT_NOTICE);
        return true;
    }
    false
}
