use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use tracing::level_filters::LevelFilter;

use crate::error::MissingConfig;
use crate::token;

#[derive(Deserialize, Debug)]
pub struct Config {
	#[serde(default = "default_address")]
	pub address: SocketAddr,
	#[serde(default)]
	pub log_level: LogLevel,
	/// Shown in page titles and used in the assistant's prompt.
	#[serde(default = "default_restaurant_name")]
	pub restaurant_name: String,
	#[serde(default)]
	pub admin: AdminConfig,
	#[serde(default)]
	pub store: StoreConfig,
	#[serde(default)]
	pub chat: ChatConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			address: default_address(),
			log_level: LogLevel::default(),
			restaurant_name: default_restaurant_name(),
			admin: AdminConfig::default(),
			store: StoreConfig::default(),
			chat: ChatConfig::default(),
		}
	}
}

fn default_address() -> SocketAddr {
	SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_restaurant_name() -> String {
	"Pala Pizza".to_owned()
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct AdminConfig {
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub password: Option<String>,
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub session_secret: Option<String>,
	pub cookie_name: String,
	/// Adds `Secure` to the session cookie. Turn on when served over TLS.
	pub secure_cookies: bool,
	/// The login page is only served as `/pannello/login?key=<link_key>`, and not at all while this is unset.
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub link_key: Option<String>,
}

impl Default for AdminConfig {
	fn default() -> Self {
		Self {
			password: None,
			session_secret: None,
			cookie_name: token::DEFAULT_COOKIE_NAME.to_owned(),
			secure_cookies: false,
			link_key: None,
		}
	}
}

impl AdminConfig {
	pub fn password(&self) -> Result<&str, MissingConfig> {
		non_empty(&self.password).ok_or(MissingConfig("admin.password"))
	}

	pub fn authority(&self) -> Result<token::Authority, MissingConfig> {
		let secret = non_empty(&self.session_secret).ok_or(MissingConfig("admin.session_secret"))?;
		token::Key::new(secret.as_bytes())
			.map(token::Authority::new)
			.ok_or(MissingConfig("admin.session_secret"))
	}

	pub fn link_key(&self) -> Result<&str, MissingConfig> {
		non_empty(&self.link_key).ok_or(MissingConfig("admin.link_key"))
	}
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
	/// The spreadsheet web app serving `list` and `updateStatus`.
	pub url: Option<String>,
	/// Where new orders are appended. Defaults to `url`.
	pub orders_url: Option<String>,
	/// Shared secret sent along with every request to the web app.
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub secret: Option<String>,
	pub sheet: String,
	pub timeout_secs: u64,
	/// Offset applied to full timestamps coming out of the sheet before their date is shown.
	pub utc_offset_minutes: i16,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			url: None,
			orders_url: None,
			secret: None,
			sheet: "Ordini".to_owned(),
			timeout_secs: 15,
			utc_offset_minutes: 60,
		}
	}
}

impl StoreConfig {
	pub fn url(&self) -> Result<&str, MissingConfig> {
		non_empty(&self.url).ok_or(MissingConfig("store.url"))
	}

	pub fn orders_url(&self) -> Result<&str, MissingConfig> {
		non_empty(&self.orders_url)
			.or_else(|| non_empty(&self.url))
			.ok_or(MissingConfig("store.orders_url"))
	}

	pub fn secret(&self) -> Option<&str> {
		non_empty(&self.secret)
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn utc_offset(&self) -> time::UtcOffset {
		time::UtcOffset::from_whole_seconds(i32::from(self.utc_offset_minutes) * 60)
			.unwrap_or(time::UtcOffset::UTC)
	}
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChatConfig {
	#[serde(deserialize_with = "crate::helpers::lenient::string")]
	pub api_key: Option<String>,
	pub base_url: String,
	pub model: String,
	/// Replaces the built-in instructions when set.
	pub system_prompt: Option<String>,
	pub max_history: usize,
	pub timeout_secs: u64,
}

impl Default for ChatConfig {
	fn default() -> Self {
		Self {
			api_key: None,
			base_url: "https://api.openai.com/v1".to_owned(),
			model: "gpt-4.1-mini".to_owned(),
			system_prompt: None,
			max_history: 12,
			timeout_secs: 30,
		}
	}
}

impl ChatConfig {
	pub fn api_key(&self) -> Result<&str, MissingConfig> {
		non_empty(&self.api_key).ok_or(MissingConfig("chat.api_key"))
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn system_prompt(&self, restaurant_name: &str) -> String {
		match non_empty(&self.system_prompt) {
			Some(prompt) => prompt.to_owned(),
			None => format!(
				"You are the assistant of {restaurant_name}, a pizzeria. Always answer in Italian, with a friendly but concrete tone, clearly and briefly (at most six or seven sentences). \
				You help with opening hours, takeaway and delivery, waiting times, allergens and how to write an order. \
				Orders are placed with the form on the same page, so point customers there instead of taking orders in the chat. \
				Never say that you are an artificial intelligence model."
			),
		}
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn deserialize_level_filter<'de, D: Deserializer<'de>>(d: D) -> Result<LevelFilter, D::Error> {
	String::deserialize(d)?
		.parse()
		.map_err(serde::de::Error::custom)
}

#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(from = "LogLevelSerdeHelper")]
pub struct LogLevel {
	pub internal: LevelFilter,
	pub external: LevelFilter,
}

impl Default for LogLevel {
	fn default() -> Self {
		Self {
			internal: default_log_level_internal(),
			external: default_log_level_external(),
		}
	}
}

const fn default_log_level_internal() -> LevelFilter {
	LevelFilter::INFO
}

const fn default_log_level_external() -> LevelFilter {
	LevelFilter::WARN
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LogLevelSerdeHelper {
	#[serde(deserialize_with = "deserialize_level_filter")]
	Together(LevelFilter),
	Separate {
		#[serde(
			deserialize_with = "deserialize_level_filter",
			default = "default_log_level_internal"
		)]
		internal: LevelFilter,
		#[serde(
			deserialize_with = "deserialize_level_filter",
			default = "default_log_level_external"
		)]
		external: LevelFilter,
	},
}

impl From<LogLevelSerdeHelper> for LogLevel {
	fn from(helper: LogLevelSerdeHelper) -> Self {
		match helper {
			LogLevelSerdeHelper::Together(level) => Self {
				internal: level,
				external: level,
			},
			LogLevelSerdeHelper::Separate { internal, external } => Self { internal, external },
		}
	}
}

/// Flat variable names used by earlier deployments, mapped onto the nested keys.
static LEGACY_ENV: &[(&str, &str)] = &[
	("ADMIN_PASSWORD", "admin.password"),
	("ADMIN_SESSION_SECRET", "admin.session_secret"),
	("STAFF_LINK_KEY", "admin.link_key"),
	("GOOGLE_SCRIPT_URL", "store.url"),
	("GOOGLE_SCRIPT_SECRET", "store.secret"),
	("ORDERS_WEBAPP_URL", "store.orders_url"),
	("OPENAI_API_KEY", "chat.api_key"),
];

fn figment() -> figment::Figment {
	use figment::providers::{Env, Format as _, Toml};

	figment::Figment::new()
		.merge(Toml::file("pizzeria.toml"))
		.merge(Env::raw().filter_map(|key| {
			LEGACY_ENV
				.iter()
				.find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
				.map(|(_, path)| (*path).into())
		}))
		.merge(Env::prefixed("PIZZERIA_").split("__"))
}

pub fn config() -> Result<Config, figment::Error> {
	figment().extract()
}
