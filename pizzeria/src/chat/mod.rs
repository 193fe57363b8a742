//! The assistant behind the chat widget on the public page.

use axum::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ChatConfig;
use crate::error::MissingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	System,
	User,
	Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
	pub role: Role,
	pub content: String,
}

impl Message {
	pub fn new(role: Role, content: impl Into<String>) -> Self {
		Self {
			role,
			content: content.into(),
		}
	}

	/// Reads one turn of the history sent by the widget. Only user and assistant turns with some text survive.
	fn from_turn(turn: &Value) -> Option<Self> {
		let role = match turn.get("role")?.as_str()? {
			"user" => Role::User,
			"assistant" => Role::Assistant,
			_ => return None,
		};
		let content = turn.get("content")?.as_str()?.trim();
		(!content.is_empty()).then(|| Self::new(role, content))
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Config(#[from] MissingConfig),
	#[error("request failed: {0}")]
	Transport(#[from] reqwest::Error),
	#[error("provider answered {status}: {body}")]
	Status { status: http::StatusCode, body: String },
	#[error("unreadable provider response: {0}")]
	Decode(#[from] serde_json::Error),
	#[error("empty reply from the model")]
	EmptyReply,
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
	/// Returns the text of the next assistant turn.
	async fn complete(&self, messages: &[Message]) -> Result<String, Error>;
}

/// The widget sends the whole conversation, usually ending with the message being asked about, which is dropped here
/// since it is appended again as the final turn.
pub fn prepare_history(history: &[Value], message: &str, max_history: usize) -> Vec<Message> {
	let mut turns: Vec<Message> = history.iter().filter_map(Message::from_turn).collect();
	if turns
		.last()
		.map_or(false, |last| last.role == Role::User && last.content == message)
	{
		turns.pop();
	}
	let skip = turns.len().saturating_sub(max_history);
	turns.split_off(skip)
}

pub async fn answer(
	provider: &dyn ChatProvider,
	system_prompt: String,
	history: &[Value],
	message: &str,
	max_history: usize,
) -> Result<String, Error> {
	let history = prepare_history(history, message, max_history);
	let mut messages = Vec::with_capacity(history.len() + 2);
	messages.push(Message::new(Role::System, system_prompt));
	messages.extend(history);
	messages.push(Message::new(Role::User, message));

	let reply = provider.complete(&messages).await?;
	let reply = reply.trim();
	if reply.is_empty() {
		return Err(Error::EmptyReply);
	}
	tracing::debug!(turns = messages.len(), "assistant replied");
	Ok(reply.to_owned())
}

/// An OpenAI-compatible `chat/completions` endpoint.
pub struct OpenAi {
	http: reqwest::Client,
	config: ChatConfig,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
	model: &'a str,
	messages: &'a [Message],
}

#[derive(Deserialize)]
struct CompletionResponse {
	#[serde(default)]
	choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
	message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
	#[serde(default)]
	content: Option<String>,
}

impl OpenAi {
	pub fn new(http: reqwest::Client, config: ChatConfig) -> Self {
		Self { http, config }
	}
}

#[async_trait]
impl ChatProvider for OpenAi {
	async fn complete(&self, messages: &[Message]) -> Result<String, Error> {
		let api_key = self.config.api_key()?;
		let url = format!(
			"{}/chat/completions",
			self.config.base_url.trim_end_matches('/')
		);

		let response = self
			.http
			.post(url)
			.bearer_auth(api_key)
			.timeout(self.config.timeout())
			.json(&CompletionRequest {
				model: &self.config.model,
				messages,
			})
			.send()
			.await?;
		let status = response.status();
		let body = response.text().await?;
		if !status.is_success() {
			return Err(Error::Status { status, body });
		}

		let response: CompletionResponse = serde_json::from_str(&body)?;
		Ok(response
			.choices
			.into_iter()
			.next()
			.and_then(|choice| choice.message.content)
			.unwrap_or_default())
	}
}
