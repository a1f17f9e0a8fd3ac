use std::sync::Arc;

use leptos::ev;
use leptos::prelude::*;

use super::force_graph::label_color;
use crate::database::Credentials;
use crate::graph::Graph;
use crate::session::{ConnectionState, QuerySession};

#[component]
fn CredentialField(
	label: &'static str,
	#[prop(default = "text")] kind: &'static str,
	value: Signal<String>,
	on_input: Callback<String>,
	disabled: Signal<bool>,
) -> impl IntoView {
	view! {
		<label class="field">
			<span>{label}</span>
			<input
				type=kind
				prop:value=move || value.get()
				disabled=move || disabled.get()
				on:input=move |ev| on_input.run(event_target_value(&ev))
			/>
		</label>
	}
}

/// Connection form, graph summary and label legend.
#[component]
pub fn Sidebar(
	session: RwSignal<QuerySession>,
	credentials: RwSignal<Credentials>,
	#[prop(into)] graph: Signal<Arc<Graph>>,
	on_connect: Callback<()>,
) -> impl IntoView {
	let state = move || session.with(|s| s.state());
	let locked = Signal::derive(move || state() != ConnectionState::Disconnected);

	let field = move |read: fn(&Credentials) -> String, write: fn(&mut Credentials, String)| {
		(
			Signal::derive(move || credentials.with(read)),
			Callback::new(move |text: String| credentials.update(|c| write(c, text))),
		)
	};
	let (uri, set_uri) = field(|c| c.uri.clone(), |c, v| c.uri = v);
	let (username, set_username) = field(|c| c.username.clone(), |c, v| c.username = v);
	let (password, set_password) = field(|c| c.password.clone(), |c, v| c.password = v);

	let handle_connect = move |_: ev::MouseEvent| on_connect.run(());

	let legend = move || {
		graph
			.get()
			.label_counts()
			.into_iter()
			.map(|(label, count)| {
				let swatch = format!("background-color: {}", label_color(&label));
				view! {
					<li class="legend-row">
						<span class="legend-swatch" style=swatch></span>
						<span class="legend-label">{label}</span>
						<span class="legend-count">{count}</span>
					</li>
				}
			})
			.collect_view()
	};

	view! {
		<aside class="sidebar">
			<section class="panel">
				<div class="panel-title">
					<h3>"Database Connection"</h3>
					<span class=move || {
						if state() == ConnectionState::Connected {
							"status-dot online"
						} else {
							"status-dot"
						}
					}></span>
				</div>
				<CredentialField label="URI" value=uri on_input=set_uri disabled=locked />
				<CredentialField
					label="Username"
					value=username
					on_input=set_username
					disabled=locked
				/>
				<CredentialField
					label="Password"
					kind="password"
					value=password
					on_input=set_password
					disabled=locked
				/>
				{move || {
					session
						.with(|s| s.connect_error().map(str::to_string))
						.map(|e| view! { <p class="error">{e}</p> })
				}}
				<button
					class=move || {
						if state() == ConnectionState::Connected {
							"button danger"
						} else {
							"button primary"
						}
					}
					disabled=move || state() == ConnectionState::Connecting
					on:click=handle_connect
				>
					{move || match state() {
						ConnectionState::Disconnected => "Connect",
						ConnectionState::Connecting => "Connecting...",
						ConnectionState::Connected => "Disconnect",
					}}
				</button>
			</section>

			<section class="panel stats">
				<div class="stat">
					<span class="stat-value">{move || graph.with(|g| g.summary().node_count)}</span>
					<span class="stat-label">"Nodes"</span>
				</div>
				<div class="stat">
					<span class="stat-value">{move || graph.with(|g| g.summary().edge_count)}</span>
					<span class="stat-label">"Relationships"</span>
				</div>
			</section>

			<section class="panel">
				<h3>"Node Labels"</h3>
				<ul class="legend">{legend}</ul>
			</section>
		</aside>
	}
}
