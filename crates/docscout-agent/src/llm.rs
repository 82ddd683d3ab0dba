use async_trait::async_trait;
use docscout_core::{DocscoutError, LlmConfig};
use serde::{Deserialize, Serialize};

/// A message in a chat conversation with the LLM.
///
/// Assistant messages may carry tool calls instead of text; tool messages
/// answer one call each, identified by `tool_call_id`.
///
/// # Examples
///
/// ```
/// use docscout_agent::llm::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Which pages mention the export API?");
/// assert!(matches!(msg.role, Role::User));
/// assert!(msg.tool_calls.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content; `None` on assistant messages that only call tools.
    #[serde(default)]
    pub content: Option<String>,
    /// Tools the assistant wants to run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// The call a tool message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A system instruction.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// A user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content)
    }

    /// A plain assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::text(Role::Assistant, content)
    }

    /// The result of running the tool call `call_id`.
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::text(Role::Tool, content)
        }
    }
}

/// Role in the chat conversation.
///
/// # Examples
///
/// ```
/// use docscout_agent::llm::Role;
///
/// assert_eq!(serde_json::to_string(&Role::Tool).unwrap(), "\"tool\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
    /// Output of a tool the assistant called.
    Tool,
}

/// A function call requested by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

/// Name and JSON-encoded arguments of a requested call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// A tool offered to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// The JSON Schema the final answer must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub schema: serde_json::Value,
}

/// One round-trip to the model.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolDefinition],
    pub output: Option<&'a OutputSchema>,
}

/// Something that can answer a [`ChatRequest`] with an assistant message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the conversation and return the assistant's reply.
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatMessage, DocscoutError>;
}

/// OpenAI-compatible chat completions client.
///
/// Works with any provider that exposes the `/v1/chat/completions` endpoint
/// with function calling: OpenAI, Azure-style gateways, LiteLLM, vLLM, etc.
///
/// # Examples
///
/// ```
/// use docscout_core::LlmConfig;
/// use docscout_agent::llm::LlmClient;
///
/// let client = LlmClient::new(reqwest::Client::new(), "sk-test", &LlmConfig::default());
/// assert_eq!(client.model(), "gpt-4.1");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    config: LlmConfig,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

impl LlmClient {
    /// Create a client sharing the run's HTTP connection pool.
    pub fn new(client: reqwest::Client, api_key: &str, config: &LlmConfig) -> Self {
        Self {
            client,
            api_key: api_key.to_string(),
            config: config.clone(),
        }
    }

    /// Return the model name from the configuration.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn request_body(&self, request: ChatRequest<'_>) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
            "temperature": self.config.temperature,
        });

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tools"] = serde_json::Value::Array(tools);
        }

        if let Some(output) = request.output {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": {
                    "name": output.name,
                    "schema": output.schema,
                    "strict": false,
                }
            });
        }

        body
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatMessage, DocscoutError> {
        let base_url = self
            .config
            .base_url
            .as_deref()
            .unwrap_or("https://api.openai.com")
            .trim_end_matches('/');
        let url = format!("{base_url}/v1/chat/completions");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| DocscoutError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(DocscoutError::Llm(format!(
                "LLM API error {status}: {body_text}"
            )));
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| DocscoutError::Llm(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| DocscoutError::Llm("response contained no choices".into()))
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use super::*;

    fn config_for(url: &str) -> LlmConfig {
        LlmConfig {
            base_url: Some(url.to_string()),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn tool_message_serializes_call_id() {
        let msg = ChatMessage::tool("call_1", "[]");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "tool");
        assert_eq!(json["tool_call_id"], "call_1");
        assert!(json.get("tool_calls").is_none());
    }

    #[test]
    fn request_body_declares_tools_and_schema() {
        let client = LlmClient::new(reqwest::Client::new(), "k", &LlmConfig::default());
        let messages = [ChatMessage::user("hi")];
        let tools = [ToolDefinition {
            name: "get_confluence_spaces".into(),
            description: "List spaces".into(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }];
        let output = OutputSchema {
            name: "analysis_result".into(),
            schema: serde_json::json!({"type": "object"}),
        };
        let body = client.request_body(ChatRequest {
            messages: &messages,
            tools: &tools,
            output: Some(&output),
        });
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["tools"][0]["function"]["name"], "get_confluence_spaces");
        assert_eq!(body["response_format"]["json_schema"]["name"], "analysis_result");
    }

    #[tokio::test]
    async fn parses_tool_call_reply() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({"model": "gpt-4.1"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"index":0,"finish_reason":"tool_calls","message":{
                    "role":"assistant","content":null,"refusal":null,
                    "tool_calls":[{"id":"call_9","type":"function",
                        "function":{"name":"search_confluence_using_cql","arguments":"{\"cql\":\"title ~ \\\"API\\\"\"}"}}]
                }}]}"#,
            )
            .create_async()
            .await;

        let client = LlmClient::new(reqwest::Client::new(), "sk-test", &config_for(&server.url()));
        let messages = [ChatMessage::user("go")];
        let reply = client
            .complete(ChatRequest {
                messages: &messages,
                tools: &[],
                output: None,
            })
            .await
            .unwrap();
        let calls = reply.tool_calls.unwrap();
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].function.name, "search_confluence_using_cql");
        assert!(reply.content.is_none());
    }

    #[tokio::test]
    async fn api_error_is_llm_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error":{"message":"bad key"}}"#)
            .create_async()
            .await;

        let client = LlmClient::new(reqwest::Client::new(), "nope", &config_for(&server.url()));
        let messages = [ChatMessage::user("go")];
        let err = client
            .complete(ChatRequest {
                messages: &messages,
                tools: &[],
                output: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DocscoutError::Llm(msg) if msg.contains("401")));
    }
}
