//! Cypher graph explorer: a read-only investigation workbench that runs
//! Cypher against a graph database and lays the result out on a canvas.
//!
//! The browser shell lives in [`App`]; the domain layers ([`graph`],
//! [`database`], [`session`], [`selection`], [`assistant`]) carry no DOM
//! dependencies and are tested natively.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod assistant;
pub mod components;
pub mod config;
pub mod database;
pub mod graph;
mod pages;
pub mod selection;
pub mod session;

use crate::config::AppConfig;
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging(level: Level) {
	let _ = console_log::init_with_level(level);
	console_error_panic_hook::set_once();
	info!("Logging initialized at {level}");
}

/// Root component. `config` is provided as context for the pages.
#[component]
pub fn App(config: AppConfig) -> impl IntoView {
	provide_meta_context();
	provide_context(config);

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		<Title text="Cypher Graph Explorer" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
