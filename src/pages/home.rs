use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use crate::assistant::{Assistant, ScriptedAssistant};
use crate::components::entity_panel::EntityPanel;
use crate::components::force_graph::{CanvasHit, ForceGraphCanvas, ZoomAction};
use crate::components::query_bar::{QueryBar, ZoomToolbar};
use crate::components::sidebar::Sidebar;
use crate::config::AppConfig;
use crate::database::{GraphDatabase, connect_backend};
use crate::graph::Graph;
use crate::selection::SelectionPanel;
use crate::session::QuerySession;

/// Investigation workbench: connection sidebar, query bar, canvas and
/// entity panel.
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let database: StoredValue<Rc<dyn GraphDatabase>, LocalStorage> =
		StoredValue::new_local(connect_backend(&config.backend));
	let assistant: Arc<dyn Assistant> = Arc::new(ScriptedAssistant);

	let session = RwSignal::new(QuerySession::default());
	let credentials = RwSignal::new(config.connection.clone());
	let query = RwSignal::new(config.default_query.clone());
	let graph = RwSignal::new(Arc::new(Graph::default()));
	let panel = RwSignal::new(SelectionPanel::default());
	let zoom = RwSignal::new(None::<ZoomAction>);
	let fullscreen = RwSignal::new(false);

	let replace_graph = move |next: Graph| {
		panel.update(|p| p.graph_replaced());
		graph.set(Arc::new(next));
	};

	let on_connect = Callback::new(move |_: ()| {
		if session.with_untracked(|s| s.is_connected()) {
			session.update(|s| s.disconnect());
			replace_graph(Graph::default());
			return;
		}
		let Some(Ok((ticket, creds))) =
			session.try_update(|s| s.begin_connect(credentials.get_untracked()))
		else {
			return;
		};
		let db = database.get_value();
		spawn_local(async move {
			let result = db.verify_connectivity(&creds).await;
			session.update(|s| s.finish_connect(ticket, result));
		});
	});

	let on_run = Callback::new(move |_: ()| {
		let text = query.get_untracked();
		let Some(Ok((ticket, request))) = session.try_update(|s| s.begin_query(&text)) else {
			return;
		};
		info!("running query");
		let db = database.get_value();
		spawn_local(async move {
			let result = db.run(&request).await;
			if let Some(Some(next)) = session.try_update(|s| s.finish_query(ticket, result)) {
				replace_graph(next);
			}
		});
	});

	let on_hit = Callback::new(move |hit: CanvasHit| {
		let current = graph.get_untracked();
		match hit {
			CanvasHit::Node(idx) => {
				if let Some(node) = current.nodes().get(idx) {
					panel.update(|p| p.select_node(node.clone()));
				}
			}
			CanvasHit::Edge(idx) => {
				if let Some(edge) = current.edges().get(idx) {
					panel.update(|p| p.select_edge(edge.clone()));
				}
			}
		}
	});

	let selected = Memo::new(move |_| {
		panel.with(|p| p.selected_node_id().map(str::to_string))
	});
	let empty = move || graph.with(|g| g.is_empty());

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="workbench">
				<Sidebar
					session=session
					credentials=credentials
					graph=graph
					on_connect=on_connect
				/>
				<main class="main">
					<QueryBar session=session query=query on_run=on_run />
					<div class="graph-area" class:fullscreen=move || fullscreen.get()>
						<ForceGraphCanvas
							graph=graph
							selected=selected
							zoom=zoom
							on_hit=on_hit
							layout=config.layout.clone()
							view_config=config.view.clone()
							fullscreen=fullscreen
						/>
						<Show when=empty>
							<div class="graph-placeholder">
								<p>"Connect to database and run a query"</p>
							</div>
						</Show>
						<ZoomToolbar zoom=zoom fullscreen=fullscreen />
					</div>
				</main>
				<EntityPanel panel=panel assistant=assistant pacing=config.assistant.clone() />
			</div>
		</ErrorBoundary>
	}
}
