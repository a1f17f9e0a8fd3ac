use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use leptos::ev;
use leptos::prelude::*;
use log::warn;
use serde_json::Value;

use crate::assistant::{Assistant, Prompt, QuickAction, Role, Typewriter};
use crate::config::AssistantConfig;
use crate::selection::SelectionPanel;

fn property_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Types `reply` into the exchange tagged `epoch`, one chunk per interval.
/// Stops as soon as the exchange is discarded.
fn type_out(panel: RwSignal<SelectionPanel>, epoch: u64, reply: String, pacing: &AssistantConfig) {
	let chunk_interval = Duration::from_millis(pacing.chunk_interval_ms);
	set_timeout(
		move || {
			let typewriter = Rc::new(RefCell::new(Typewriter::new(&reply)));
			let handle: Rc<Cell<Option<IntervalHandle>>> = Rc::new(Cell::new(None));
			let handle_tick = handle.clone();
			let started = set_interval_with_handle(
				move || {
					let chunk = typewriter.borrow_mut().next();
					let live = panel
						.try_update(|p| match &chunk {
							Some(chunk) => p.conversation_mut().stream(epoch, chunk),
							None => {
								p.conversation_mut().finish(epoch);
								false
							}
						})
						.unwrap_or(false);
					if !live {
						if let Some(h) = handle_tick.take() {
							h.clear();
						}
					}
				},
				chunk_interval,
			);
			match started {
				Ok(h) => handle.set(Some(h)),
				Err(err) => {
					warn!("typing interval unavailable: {err:?}");
					panel.update(|p| {
						let conversation = p.conversation_mut();
						conversation.stream(epoch, &reply);
						conversation.finish(epoch);
					});
				}
			}
		},
		Duration::from_millis(pacing.reply_delay_ms),
	);
}

/// Side panel for the selected node or edge.
#[component]
pub fn EntityPanel(
	panel: RwSignal<SelectionPanel>,
	assistant: Arc<dyn Assistant>,
	#[prop(optional)] pacing: AssistantConfig,
) -> impl IntoView {
	let draft = RwSignal::new(String::new());

	let ask = move |prompt: Prompt| {
		let Some(Some((entity, epoch))) = panel.try_update(|p| p.begin_exchange(&prompt)) else {
			return;
		};
		let reply = assistant.respond(&entity, &prompt);
		type_out(panel, epoch, reply, &pacing);
	};
	let ask = StoredValue::new(Arc::new(ask) as Arc<dyn Fn(Prompt) + Send + Sync>);

	let busy = move || panel.with(|p| p.conversation().is_busy());
	let handle_close = move |_: ev::MouseEvent| panel.update(|p| p.close());
	let handle_toggle = move |_: ev::MouseEvent| panel.update(|p| p.toggle_properties());
	let handle_send = move |ev: ev::SubmitEvent| {
		ev.prevent_default();
		let text = draft.get_untracked().trim().to_string();
		if text.is_empty() || busy() {
			return;
		}
		draft.set(String::new());
		ask.with_value(|ask| ask(Prompt::Text(text)));
	};

	let quick_actions = move || {
		QuickAction::ALL
			.into_iter()
			.map(|action| {
				view! {
					<button
						class="quick-action"
						disabled=busy
						on:click=move |_| ask.with_value(|ask| ask(Prompt::Quick(action)))
					>
						{action.label()}
					</button>
				}
			})
			.collect_view()
	};

	let properties = move || {
		panel.with(|p| {
			if !p.properties_expanded() {
				return None;
			}
			let rows = p
				.describe()
				.map(|entity| entity.properties)
				.unwrap_or_default()
				.into_iter()
				.map(|(key, value)| {
					view! {
						<tr>
							<td class="property-key">{key}</td>
							<td class="property-value">{property_text(&value)}</td>
						</tr>
					}
				})
				.collect_view();
			Some(view! {
				<table class="property-table">
					<thead>
						<tr>
							<th>"Name"</th>
							<th>"Value"</th>
						</tr>
					</thead>
					<tbody>{rows}</tbody>
				</table>
			})
		})
	};

	let messages = move || {
		panel.with(|p| {
			p.conversation()
				.messages()
				.iter()
				.map(|message| {
					let class = match message.role {
						Role::User => "message message-user",
						Role::Assistant if message.streaming => {
							"message message-assistant streaming"
						}
						Role::Assistant => "message message-assistant",
					};
					view! { <div class=class>{message.content.clone()}</div> }
				})
				.collect_view()
		})
	};

	view! {
		<Show when=move || panel.with(|p| p.is_open())>
			<aside class="entity-panel">
				<header class="entity-header">
					<div>
						<h3>{move || panel.with(|p| p.describe().map(|d| d.title))}</h3>
						<span class="entity-type">
							{move || panel.with(|p| p.describe().map(|d| d.entity_type))}
						</span>
					</div>
					<button class="icon-button" title="Close" on:click=handle_close>
						"×"
					</button>
				</header>

				<button class="properties-toggle" on:click=handle_toggle>
					{move || {
						if panel.with(|p| p.properties_expanded()) {
							"▾ Properties"
						} else {
							"▸ Properties"
						}
					}}
				</button>
				{properties}

				<div class="assistant">
					<p class="assistant-hint">"Ask me about this entity:"</p>
					<div class="quick-actions">{quick_actions}</div>
					<div class="messages">{messages}</div>
					<form class="assistant-input" on:submit=handle_send>
						<input
							type="text"
							placeholder="Ask a question..."
							prop:value=move || draft.get()
							on:input=move |ev| draft.set(event_target_value(&ev))
						/>
						<button type="submit" disabled=busy>
							"Send"
						</button>
					</form>
				</div>
			</aside>
		</Show>
	}
}
