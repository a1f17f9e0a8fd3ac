use leptos::ev;
use leptos::prelude::*;

use super::force_graph::ZoomAction;
use crate::session::QuerySession;

/// Query editor with its run control and status line.
#[component]
pub fn QueryBar(
	session: RwSignal<QuerySession>,
	query: RwSignal<String>,
	on_run: Callback<()>,
) -> impl IntoView {
	let running = move || session.with(|s| s.is_running());
	let handle_run = move |_: ev::MouseEvent| on_run.run(());
	let handle_keydown = move |ev: ev::KeyboardEvent| {
		if ev.key() == "Enter" && (ev.ctrl_key() || ev.meta_key()) {
			ev.prevent_default();
			on_run.run(());
		}
	};

	view! {
		<div class="query-bar">
			<div class="query-row">
				<textarea
					class="query-editor"
					rows="3"
					placeholder="Enter Cypher query..."
					spellcheck="false"
					prop:value=move || query.get()
					on:input=move |ev| query.set(event_target_value(&ev))
					on:keydown=handle_keydown
				></textarea>
				<button
					class="button primary run"
					disabled=move || running() || !session.with(|s| s.is_connected())
					on:click=handle_run
				>
					{move || if running() { "Running..." } else { "Run" }}
				</button>
			</div>
			{move || {
				session
					.with(|s| {
						s.query_error()
							.map(|e| ("error", e.to_string()))
							.or_else(|| s.notice().map(|n| ("notice", n.to_string())))
					})
					.map(|(class, text)| view! { <p class=class>{text}</p> })
			}}
		</div>
	}
}

/// Zoom and fullscreen controls over the canvas.
#[component]
pub fn ZoomToolbar(
	zoom: RwSignal<Option<ZoomAction>>,
	fullscreen: RwSignal<bool>,
) -> impl IntoView {
	let button = move |action: ZoomAction, title: &'static str, glyph: &'static str| {
		view! {
			<button class="icon-button" title=title on:click=move |_| zoom.set(Some(action))>
				{glyph}
			</button>
		}
	};

	view! {
		<div class="zoom-toolbar">
			{button(ZoomAction::In, "Zoom in", "+")}
			{button(ZoomAction::Out, "Zoom out", "−")}
			{button(ZoomAction::Fit, "Fit", "⤢")}
			<button
				class="icon-button"
				title=move || if fullscreen.get() { "Exit fullscreen" } else { "Fullscreen" }
				on:click=move |_| fullscreen.update(|on| *on = !*on)
			>
				{move || if fullscreen.get() { "⤡" } else { "⛶" }}
			</button>
		</div>
	}
}
