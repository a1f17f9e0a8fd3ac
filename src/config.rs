//! Runtime configuration embedded in the host page.
//!
//! `index.html` carries a `<script id="app-config" type="application/json">`
//! block; every field is optional and falls back to [`AppConfig::default`].

use log::Level;
use serde::Deserialize;
use thiserror::Error;

use crate::components::force_graph::LayoutParameters;
use crate::database::Credentials;

/// Id of the element holding the configuration JSON.
pub const CONFIG_ELEMENT_ID: &str = "app-config";

/// Why the embedded configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// No configuration element in the page.
	#[error("no #app-config element in the document")]
	Missing,

	/// The element did not hold valid configuration JSON.
	#[error("malformed configuration: {0}")]
	Malformed(#[from] serde_json::Error),
}

/// Which database collaborator to talk to.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
	/// JSON-over-HTTP query service.
	Http {
		/// Prefix of the `connect` and `query` endpoints.
		base_url: String,
	},
	/// Built-in sample graph, no network.
	Sample,
}

impl Default for BackendConfig {
	fn default() -> Self {
		BackendConfig::Http {
			base_url: "/api/neo4j".to_string(),
		}
	}
}

/// Pan/zoom behaviour.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
	/// Scale multiplier of one zoom-in step.
	pub zoom_step: f64,
	/// Duration of zoom and fit transitions.
	pub zoom_duration_ms: f64,
}

impl Default for ViewConfig {
	fn default() -> Self {
		Self {
			zoom_step: 1.3,
			zoom_duration_ms: 300.0,
		}
	}
}

/// Pace of the typed-out assistant replies.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
	/// Pause before the first chunk.
	pub reply_delay_ms: u64,
	/// Pause between chunks.
	pub chunk_interval_ms: u64,
}

impl Default for AssistantConfig {
	fn default() -> Self {
		Self {
			reply_delay_ms: 500,
			chunk_interval_ms: 30,
		}
	}
}

/// Top-level application configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
	/// Database collaborator.
	pub backend: BackendConfig,
	/// Pre-filled connection form.
	pub connection: Credentials,
	/// Initial query editor text.
	pub default_query: String,
	/// Force simulation tuning.
	pub layout: LayoutParameters,
	/// Pan/zoom tuning.
	pub view: ViewConfig,
	/// Assistant reply pacing.
	pub assistant: AssistantConfig,
	/// `error`, `warn`, `info`, `debug` or `trace`.
	pub log_level: String,
}

impl Default for AppConfig {
	fn default() -> Self {
		Self {
			backend: BackendConfig::default(),
			connection: Credentials {
				uri: "neo4j://localhost:7687".to_string(),
				username: "neo4j".to_string(),
				password: String::new(),
			},
			default_query: "MATCH path=(c:Customer)-[r]-(a:Account)\nRETURN path\nLIMIT 50"
				.to_string(),
			layout: LayoutParameters::default(),
			view: ViewConfig::default(),
			assistant: AssistantConfig::default(),
			log_level: "debug".to_string(),
		}
	}
}

impl AppConfig {
	/// Parses configuration JSON; absent fields keep their defaults.
	pub fn from_json(text: &str) -> Result<Self, ConfigError> {
		Ok(serde_json::from_str(text)?)
	}

	/// Reads the configuration embedded in the current document.
	pub fn from_document() -> Result<Self, ConfigError> {
		let text = web_sys::window()
			.and_then(|w| w.document())
			.and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|e| e.text_content())
			.ok_or(ConfigError::Missing)?;
		let mut config = Self::from_json(&text)?;
		if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
			config.resolve_against(&origin);
		}
		Ok(config)
	}

	/// Makes a relative HTTP base URL absolute.
	pub fn resolve_against(&mut self, origin: &str) {
		if let BackendConfig::Http { base_url } = &mut self.backend {
			if base_url.starts_with('/') {
				*base_url = format!("{}{}", origin.trim_end_matches('/'), base_url);
			}
		}
	}

	/// Parsed log level, `Debug` when unrecognised.
	pub fn log_level(&self) -> Level {
		self.log_level.parse().unwrap_or(Level::Debug)
	}
}
