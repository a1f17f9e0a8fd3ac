use cypher_graph_explorer::config::AppConfig;
use cypher_graph_explorer::{App, init_logging};
use leptos::prelude::*;
use log::warn;

fn main() {
	let (config, problem) = match AppConfig::from_document() {
		Ok(config) => (config, None),
		Err(err) => (AppConfig::default(), Some(err)),
	};
	init_logging(config.log_level());
	if let Some(err) = problem {
		warn!("using default configuration: {err}");
	}

	mount_to_body(move || {
		view! { <App config=config /> }
	})
}
