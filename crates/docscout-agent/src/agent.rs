//! The tool-calling loop behind [`Agent::generate`].

use std::collections::HashMap;

use docscout_core::DocscoutError;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::llm::{ChatBackend, ChatMessage, ChatRequest, OutputSchema};
use crate::prompt::strip_code_fences;
use crate::tools::Toolset;

const RETRY_HINT: &str = "Fix the errors and try again.";

/// A structured-output agent with a fixed instruction text.
///
/// One call to [`generate`](Self::generate) is one exchange: the model may
/// call tools any number of times, then must return JSON matching `T`.
/// Failed tool calls and rejected answers are reported back to the model.
/// Each tool, and the final answer, gets `max_retries` such reports before
/// the exchange is abandoned. A tool's count resets whenever it succeeds, so
/// only consecutive failures of the same tool use up its budget.
pub struct Agent<'a> {
    backend: &'a dyn ChatBackend,
    instructions: String,
    max_retries: u32,
    max_turns: u32,
}

impl<'a> Agent<'a> {
    pub fn new(backend: &'a dyn ChatBackend, instructions: impl Into<String>) -> Self {
        Self {
            backend,
            instructions: instructions.into(),
            max_retries: 3,
            max_turns: 16,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Run one exchange and return the model's validated answer.
    ///
    /// `validate` checks what the schema cannot; its error is shown to the
    /// model like a parse error.
    ///
    /// # Errors
    ///
    /// - [`DocscoutError::Exhausted`] when a tool or the answer runs out of
    ///   retries, or the model uses up `max_turns` round-trips.
    /// - Whatever the backend returns when the model cannot be reached.
    pub async fn generate<T, F>(
        &self,
        prompt: &str,
        tools: &dyn Toolset,
        validate: F,
    ) -> Result<T, DocscoutError>
    where
        T: DeserializeOwned + JsonSchema,
        F: Fn(&T) -> Result<(), DocscoutError>,
    {
        let output = output_schema::<T>();
        let definitions = tools.definitions();
        let mut messages = vec![
            ChatMessage::system(self.instructions.as_str()),
            ChatMessage::user(prompt),
        ];
        let mut tool_failures: HashMap<String, u32> = HashMap::new();
        let mut output_failures = 0u32;

        for turn in 1..=self.max_turns {
            tracing::debug!(turn, messages = messages.len(), "requesting completion");
            let reply = self
                .backend
                .complete(ChatRequest {
                    messages: &messages,
                    tools: &definitions,
                    output: Some(&output),
                })
                .await?;

            let calls = reply.tool_calls.clone().unwrap_or_default();
            if !calls.is_empty() {
                messages.push(reply);
                for call in calls {
                    let name = call.function.name;
                    match tools.call(&name, &call.function.arguments).await {
                        Ok(result) => {
                            tool_failures.remove(&name);
                            messages.push(ChatMessage::tool(call.id, result));
                        }
                        Err(retry) => {
                            let failures = tool_failures.entry(name.clone()).or_insert(0);
                            *failures += 1;
                            tracing::warn!(tool = %name, attempt = *failures, cause = %retry, "tool call failed");
                            if *failures > self.max_retries {
                                return Err(DocscoutError::Exhausted(format!(
                                    "tool '{name}' exceeded max retries count of {}: {retry}",
                                    self.max_retries
                                )));
                            }
                            messages.push(ChatMessage::tool(
                                call.id,
                                format!("{retry}\n\n{RETRY_HINT}"),
                            ));
                        }
                    }
                }
                continue;
            }

            let text = reply.content.clone().unwrap_or_default();
            match parse_output::<T>(&text).and_then(|value| validate(&value).map(|()| value)) {
                Ok(value) => {
                    tracing::debug!(turn, "accepted structured output");
                    return Ok(value);
                }
                Err(e) => {
                    output_failures += 1;
                    tracing::warn!(attempt = output_failures, cause = %e, "output rejected");
                    if output_failures > self.max_retries {
                        return Err(DocscoutError::Exhausted(format!(
                            "output exceeded max retries count of {}: {e}",
                            self.max_retries
                        )));
                    }
                    messages.push(reply);
                    messages.push(ChatMessage::user(format!(
                        "Your answer was rejected: {e}\n\n{RETRY_HINT} \
                         Reply with a single JSON object matching the required schema."
                    )));
                }
            }
        }

        Err(DocscoutError::Exhausted(format!(
            "no final answer after {} model turns",
            self.max_turns
        )))
    }
}

fn output_schema<T: JsonSchema>() -> OutputSchema {
    let schema = crate::tools::schema_value::<T>();
    let name = schema
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or("final_result")
        .to_string();
    OutputSchema { name, schema }
}

fn parse_output<T: DeserializeOwned>(text: &str) -> Result<T, DocscoutError> {
    let cleaned = strip_code_fences(text);
    if cleaned.is_empty() {
        return Err(DocscoutError::Schema(
            "expected a JSON object, got an empty reply".into(),
        ));
    }
    serde_json::from_str(cleaned).map_err(|e| DocscoutError::Schema(e.to_string()))
}
