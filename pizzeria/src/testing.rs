//! In-memory collaborators and a small driver for exercising the router.

use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::body::Body;
use axum::Router;
use hyper::body::Bytes;
use http::{header, HeaderMap, Request, StatusCode};
use serde_json::{json, Value};
use time::UtcOffset;
use tower::ServiceExt as _;

use crate::chat::{self, ChatProvider, Message};
use crate::config::{AdminConfig, ChatConfig, Config, StoreConfig};
use crate::order::{row, NewOrder, OrderStatus};
use crate::store::{self, Listing, OrderStore};

pub const PASSWORD: &str = "margherita";
pub const LINK_KEY: &str = "forno";

pub fn config() -> Config {
	Config {
		admin: AdminConfig {
			password: Some(PASSWORD.to_owned()),
			session_secret: Some("forno-a-legna".to_owned()),
			link_key: Some(LINK_KEY.to_owned()),
			..AdminConfig::default()
		},
		store: StoreConfig {
			url: Some("http://store.invalid/exec".to_owned()),
			..StoreConfig::default()
		},
		chat: ChatConfig {
			api_key: Some("sk-test".to_owned()),
			..ChatConfig::default()
		},
		..Config::default()
	}
}

#[derive(Default)]
pub struct FakeStore {
	rows: Mutex<Vec<Value>>,
	failure: Mutex<Option<fn() -> store::Error>>,
	limits: Mutex<Vec<u32>>,
	updates: Mutex<Vec<(String, OrderStatus)>>,
	appended: Mutex<Vec<NewOrder>>,
}

impl FakeStore {
	pub fn set_rows(&self, rows: Vec<Value>) {
		*self.rows.lock().unwrap() = rows;
	}

	/// Every later call fails with what `failure` builds.
	pub fn fail_with(&self, failure: fn() -> store::Error) {
		*self.failure.lock().unwrap() = Some(failure);
	}

	pub fn limits(&self) -> Vec<u32> {
		self.limits.lock().unwrap().clone()
	}

	pub fn updates(&self) -> Vec<(String, OrderStatus)> {
		self.updates.lock().unwrap().clone()
	}

	pub fn appended(&self) -> Vec<NewOrder> {
		self.appended.lock().unwrap().clone()
	}

	fn check(&self) -> Result<(), store::Error> {
		match *self.failure.lock().unwrap() {
			Some(failure) => Err(failure()),
			None => Ok(()),
		}
	}
}

#[async_trait]
impl OrderStore for FakeStore {
	async fn list(&self, limit: u32) -> Result<Listing, store::Error> {
		self.check()?;
		self.limits.lock().unwrap().push(limit);
		let rows = self.rows.lock().unwrap().clone();
		Ok(Listing {
			count: rows.len() as u64,
			orders: row::decode_all(&rows, UtcOffset::UTC),
		})
	}

	async fn update_status(&self, id: &str, status: OrderStatus) -> Result<Value, store::Error> {
		self.check()?;
		self.updates.lock().unwrap().push((id.to_owned(), status));
		Ok(json!({ "ok": true }))
	}

	async fn append(&self, order: &NewOrder) -> Result<Value, store::Error> {
		self.check()?;
		self.appended.lock().unwrap().push(order.clone());
		Ok(json!({ "ok": true }))
	}
}

pub struct FakeChat {
	reply: Mutex<String>,
	seen: Mutex<Vec<Message>>,
}

impl Default for FakeChat {
	fn default() -> Self {
		Self {
			reply: Mutex::new("Certo!".to_owned()),
			seen: Mutex::new(Vec::new()),
		}
	}
}

impl FakeChat {
	pub fn reply_with(&self, reply: &str) {
		*self.reply.lock().unwrap() = reply.to_owned();
	}

	/// The messages of the last completion.
	pub fn seen(&self) -> Vec<Message> {
		self.seen.lock().unwrap().clone()
	}
}

#[async_trait]
impl ChatProvider for FakeChat {
	async fn complete(&self, messages: &[Message]) -> Result<String, chat::Error> {
		*self.seen.lock().unwrap() = messages.to_vec();
		Ok(self.reply.lock().unwrap().clone())
	}
}

pub struct TestResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl TestResponse {
	pub fn json(&self) -> Value {
		serde_json::from_slice(&self.body).unwrap()
	}

	pub fn text(&self) -> String {
		String::from_utf8(self.body.to_vec()).unwrap()
	}

	pub fn set_cookie(&self) -> Option<String> {
		self.headers
			.get(header::SET_COOKIE)
			.map(|value| value.to_str().unwrap().to_owned())
	}

	pub fn location(&self) -> Option<String> {
		self.headers
			.get(header::LOCATION)
			.map(|value| value.to_str().unwrap().to_owned())
	}
}

pub struct Harness {
	pub config: Arc<Config>,
	pub store: Arc<FakeStore>,
	pub chat: Arc<FakeChat>,
	app: Router,
}

impl Harness {
	pub fn new() -> Self {
		Self::with_config(config())
	}

	pub fn with_config(config: Config) -> Self {
		let config = Arc::new(config);
		let store = Arc::new(FakeStore::default());
		let chat = Arc::new(FakeChat::default());
		let app = crate::routes::app(
			Arc::clone(&config),
			Arc::clone(&store) as Arc<dyn OrderStore>,
			Arc::clone(&chat) as Arc<dyn ChatProvider>,
		);
		Self {
			config,
			store,
			chat,
			app,
		}
	}

	/// `name=token` for a session issued just now.
	pub fn session_cookie(&self) -> String {
		let authority = self.config.admin.authority().unwrap();
		format!("{}={}", self.config.admin.cookie_name, authority.issue())
	}

	async fn send(&self, request: Request<Body>) -> TestResponse {
		let response = self.app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let headers = response.headers().clone();
		let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
		TestResponse {
			status,
			headers,
			body,
		}
	}

	fn request(method: &str, path: &str, cookie: Option<&str>) -> http::request::Builder {
		let builder = Request::builder().method(method).uri(path);
		match cookie {
			Some(cookie) => builder.header(header::COOKIE, cookie),
			None => builder,
		}
	}

	pub async fn get(&self, path: &str, cookie: Option<&str>) -> TestResponse {
		self.send(Self::request("GET", path, cookie).body(Body::empty()).unwrap())
			.await
	}

	pub async fn post_json(&self, path: &str, body: Value, cookie: Option<&str>) -> TestResponse {
		let request = Self::request("POST", path, cookie)
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_string()))
			.unwrap();
		self.send(request).await
	}

	/// A body without a content type, the way a careless client sends it.
	pub async fn post_raw(&self, path: &str, body: &str, cookie: Option<&str>) -> TestResponse {
		let request = Self::request("POST", path, cookie)
			.body(Body::from(body.to_owned()))
			.unwrap();
		self.send(request).await
	}

	pub async fn post_form(
		&self,
		path: &str,
		body: &str,
		cookie: Option<&str>,
		user_agent: Option<&str>,
	) -> TestResponse {
		let mut builder = Self::request("POST", path, cookie)
			.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
		if let Some(user_agent) = user_agent {
			builder = builder.header(header::USER_AGENT, user_agent);
		}
		self.send(builder.body(Body::from(body.to_owned())).unwrap())
			.await
	}
}
