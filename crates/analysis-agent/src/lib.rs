//! Tool-dispatch reasoning loop.
//!
//! A single-threaded, cooperative state machine: each cycle asks the model
//! what to do next (given the objective and the transcript so far), then
//! either executes the chosen tool or finishes with the model's final
//! answer. Tool failures and unparseable directives are fed back into the
//! transcript as error observations instead of aborting; a hard step bound
//! guarantees termination.

pub mod toolsets;

pub use toolsets::{
    NewsToolset, RelationshipToolset, ToolError, ToolSpec, Toolset,
    NEWS_AGENT_SYSTEM, RELATIONSHIP_AGENT_SYSTEM,
};

use std::sync::Arc;

use model_client::structured::extract_json_payload;
use model_client::{ModelError, ModelService};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// States of one loop instance. The loop owns exactly one transcript and
/// advances strictly sequentially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Reasoning,
    ToolSelected,
    ToolExecuting,
    Observing,
    Finished,
    Aborted,
}

/// One Reasoning -> Observing cycle: what the model thought, which tool it
/// picked (none for a parse-recovery cycle) and what came back.
#[derive(Debug, Clone)]
pub struct AgentStep {
    pub thought: Option<String>,
    pub tool: Option<String>,
    pub observation: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Hard bound on Reasoning -> Observing cycles, parse recoveries
    /// included. Matches the original executor default of 15.
    pub max_steps: usize,
    /// Keep the transcript in the outcome
    pub verbose: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self { max_steps: 15, verbose: false }
    }
}

#[derive(Debug)]
pub struct AgentOutcome {
    pub answer: String,
    /// Empty unless `AgentOptions::verbose` was set
    pub transcript: Vec<AgentStep>,
    pub state: LoopState,
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Reasoning loop exhausted after {steps} steps without a final answer")]
    LoopExhausted { steps: usize, transcript: Vec<AgentStep> },

    #[error("Model call failed: {0}")]
    Model(#[from] ModelError),
}

/// What the model is asked to emit each cycle.
#[derive(Debug, Deserialize)]
struct Directive {
    thought: Option<String>,
    tool: Option<String>,
    final_answer: Option<String>,
}

pub struct Agent<T: Toolset> {
    model: Arc<dyn ModelService>,
    toolset: T,
    system_prompt: String,
    options: AgentOptions,
}

impl<T: Toolset> Agent<T> {
    pub fn new(
        model: Arc<dyn ModelService>,
        toolset: T,
        system_prompt: impl Into<String>,
        options: AgentOptions,
    ) -> Self {
        Self {
            model,
            toolset,
            system_prompt: system_prompt.into(),
            options,
        }
    }

    fn directive_prompt(&self, objective: &str, transcript: &[AgentStep]) -> String {
        let mut prompt = format!("Objective: {objective}\n\nAvailable tools:\n");
        for spec in self.toolset.specs() {
            prompt.push_str(&format!("- {}: {}\n", spec.name, spec.description));
        }

        if !transcript.is_empty() {
            prompt.push_str("\nSteps taken so far:\n");
            for (i, step) in transcript.iter().enumerate() {
                prompt.push_str(&format!("{}. ", i + 1));
                if let Some(thought) = &step.thought {
                    prompt.push_str(&format!("thought: {thought} | "));
                }
                match &step.tool {
                    Some(tool) => prompt.push_str(&format!("tool: {tool} | ")),
                    None => prompt.push_str("(directive was not parseable) | "),
                }
                prompt.push_str(&format!("observation: {}\n", step.observation));
            }
        }

        prompt.push_str(
            "\nRespond with a single JSON object and nothing else. Either call a tool:\n\
             {\"thought\": \"...\", \"tool\": \"<tool name>\"}\n\
             or, once you have enough observations, finish:\n\
             {\"thought\": \"...\", \"final_answer\": \"<your complete analysis>\"}\n",
        );
        prompt
    }

    fn transition(state: &mut LoopState, next: LoopState) {
        tracing::trace!(from = ?state, to = ?next, "loop transition");
        *state = next;
    }

    fn parse_directive(raw: &str) -> Result<Directive, String> {
        let payload = extract_json_payload(raw).map_err(|e| e.to_string())?;
        let directive: Directive =
            serde_json::from_str(payload).map_err(|e| format!("invalid directive JSON: {e}"))?;
        if directive.tool.is_none() && directive.final_answer.is_none() {
            return Err("directive names neither a tool nor a final answer".to_string());
        }
        Ok(directive)
    }

    /// Drive the loop until the model finishes, a model call fails, or the
    /// step bound is hit.
    pub async fn run(&self, objective: &str) -> Result<AgentOutcome, AgentError> {
        let mut transcript: Vec<AgentStep> = Vec::new();
        let mut state = LoopState::Reasoning;

        for step_no in 1..=self.options.max_steps {
            Self::transition(&mut state, LoopState::Reasoning);
            let prompt = self.directive_prompt(objective, &transcript);
            let raw = self.model.complete(&self.system_prompt, &prompt).await?;

            let directive = match Self::parse_directive(&raw) {
                Ok(directive) => directive,
                Err(message) => {
                    // One recovery turn: the parse error becomes an
                    // observation and the loop re-enters Reasoning. Counts
                    // toward the step bound.
                    tracing::warn!(step = step_no, "unparseable directive: {message}");
                    transcript.push(AgentStep {
                        thought: None,
                        tool: None,
                        observation: json!({ "error": message }),
                    });
                    continue;
                }
            };

            if let Some(tool) = directive.tool {
                Self::transition(&mut state, LoopState::ToolSelected);
                tracing::debug!(step = step_no, tool = %tool, "dispatching tool");

                Self::transition(&mut state, LoopState::ToolExecuting);
                let observation = match self.toolset.dispatch(self.model.as_ref(), &tool).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(tool = %tool, "tool failed: {e}");
                        json!({ "error": e.to_string() })
                    }
                };

                Self::transition(&mut state, LoopState::Observing);
                transcript.push(AgentStep {
                    thought: directive.thought,
                    tool: Some(tool),
                    observation,
                });
                continue;
            }

            // parse_directive guarantees final_answer is present here
            if let Some(answer) = directive.final_answer {
                Self::transition(&mut state, LoopState::Finished);
                tracing::info!(steps = transcript.len(), "reasoning loop finished");
                return Ok(AgentOutcome {
                    answer,
                    transcript: if self.options.verbose { transcript } else { Vec::new() },
                    state,
                });
            }
        }

        Self::transition(&mut state, LoopState::Aborted);
        tracing::error!(
            max_steps = self.options.max_steps,
            "reasoning loop exhausted its step bound"
        );
        Err(AgentError::LoopExhausted {
            steps: self.options.max_steps,
            transcript,
        })
    }
}
