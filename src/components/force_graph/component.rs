use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, MouseEvent, ResizeObserver,
	WheelEvent,
};

use super::render::{self, CanvasMeasure};
use super::simulation::LayoutParameters;
use super::state::ForceGraphState;
use super::types::{CanvasHit, ZoomAction};
use crate::config::ViewConfig;
use crate::graph::Graph;

type Shared<T> = Rc<RefCell<Option<T>>>;

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok().flatten()?.dyn_into().ok()
}

const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

fn parent_size(canvas: &HtmlCanvasElement) -> Option<(f64, f64)> {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
}

fn window_size() -> Option<(f64, f64)> {
	let window = web_sys::window()?;
	let w = window.inner_width().ok()?.as_f64()?;
	let h = window.inner_height().ok()?.as_f64()?;
	Some((w, h))
}

/// Picks the surface size: the viewport in fullscreen mode, otherwise the
/// container. Collapsed (zero-area) candidates are skipped.
fn pick_size(
	fullscreen: bool,
	viewport: Option<(f64, f64)>,
	container: Option<(f64, f64)>,
) -> (f64, f64) {
	let usable = |size: &(f64, f64)| size.0 > 0.0 && size.1 > 0.0;
	let viewport = viewport.filter(usable);
	let container = container.filter(usable);
	let preferred = if fullscreen {
		viewport.or(container)
	} else {
		container
	};
	preferred.unwrap_or(FALLBACK_SIZE)
}

fn surface_size(canvas: &HtmlCanvasElement, fullscreen: bool) -> (f64, f64) {
	let viewport = if fullscreen { window_size() } else { None };
	pick_size(fullscreen, viewport, parent_size(canvas))
}

/// Matches the canvas backing store and the render state to the surface.
fn fit_surface(
	canvas: &HtmlCanvasElement,
	state: &RefCell<Option<ForceGraphState>>,
	fullscreen: bool,
) {
	let (w, h) = surface_size(canvas, fullscreen);
	if canvas.width() == w as u32 && canvas.height() == h as u32 {
		return;
	}
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);
	if let Some(ref mut s) = *state.borrow_mut() {
		debug!("surface resized to {w}x{h}");
		s.resize(w, h);
	}
}

fn pointer_position(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

fn set_cursor(canvas: &HtmlCanvasElement, cursor: &str) {
	let _ = HtmlElement::style(canvas).set_property("cursor", cursor);
}

/// Browser hooks that keep the surface alive. Detached when the canvas unmounts.
struct Surface {
	running: Rc<Cell<bool>>,
	observer: Option<ResizeObserver>,
	_on_observe: Closure<dyn FnMut()>,
	on_window_resize: Closure<dyn FnMut()>,
}

impl Surface {
	fn detach(self) {
		self.running.set(false);
		if let Some(ref observer) = self.observer {
			observer.disconnect();
		}
		if let Some(window) = web_sys::window() {
			let _ = window.remove_event_listener_with_callback(
				"resize",
				self.on_window_resize.as_ref().unchecked_ref(),
			);
		}
		debug!("graph surface detached");
	}
}

/// Canvas view of the active graph.
///
/// Replacing `graph` discards the running layout and starts a fresh one.
/// Clicks on nodes and edges are reported through `on_hit`; `selected`
/// drives the selection ring and `zoom` carries toolbar commands, which
/// are consumed (reset to `None`) once applied. With `fullscreen` set the
/// surface takes the viewport size instead of its container's.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] graph: Signal<Arc<Graph>>,
	#[prop(into)] selected: Signal<Option<String>>,
	zoom: RwSignal<Option<ZoomAction>>,
	#[prop(into)] on_hit: Callback<CanvasHit>,
	#[prop(optional)] layout: LayoutParameters,
	#[prop(optional)] view_config: ViewConfig,
	#[prop(optional, into)] fullscreen: Signal<bool>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Shared<ForceGraphState> = Rc::new(RefCell::new(None));
	let animate: Shared<Closure<dyn FnMut(f64)>> = Rc::new(RefCell::new(None));
	let surface = StoredValue::new_local(None::<Surface>);
	let (state_init, animate_init) = (state.clone(), animate.clone());

	Effect::new(move |_| {
		let graph = graph.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(ctx) = context_2d(&canvas) else {
			warn!("canvas has no 2d context");
			return;
		};

		if let Some(ref mut s) = *state_init.borrow_mut() {
			debug!("loading graph with {} nodes", graph.nodes().len());
			s.load_graph(graph, &CanvasMeasure(&ctx));
			return;
		}

		let (w, h) = surface_size(&canvas, fullscreen.get_untracked());
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		*state_init.borrow_mut() = Some(ForceGraphState::new(
			graph,
			w,
			h,
			layout.clone(),
			view_config.clone(),
			&CanvasMeasure(&ctx),
		));

		let Some(window) = web_sys::window() else {
			return;
		};

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let on_window_resize: Closure<dyn FnMut()> = Closure::new(move || {
			fit_surface(&canvas_resize, &state_resize, fullscreen.get_untracked());
		});
		let _ = window
			.add_event_listener_with_callback("resize", on_window_resize.as_ref().unchecked_ref());

		// the container also changes size without a window resize (side panel)
		let (state_observe, canvas_observe) = (state_init.clone(), canvas.clone());
		let on_observe: Closure<dyn FnMut()> = Closure::new(move || {
			fit_surface(&canvas_observe, &state_observe, fullscreen.get_untracked());
		});
		let observer = ResizeObserver::new(on_observe.as_ref().unchecked_ref());
		match (&observer, canvas.parent_element()) {
			(Ok(observer), Some(parent)) => observer.observe(&parent),
			_ => warn!("container resize observation unavailable"),
		}

		// one loop for the component's lifetime; graph swaps replace the
		// simulation it ticks
		let running = Rc::new(Cell::new(true));
		let (state_anim, animate_inner, running_anim) =
			(state_init.clone(), animate_init.clone(), running.clone());
		let mut last_frame: Option<f64> = None;
		*animate_init.borrow_mut() = Some(Closure::new(move |now: f64| {
			if !running_anim.get() {
				// drop the loop's handle on itself
				let _ = animate_inner.borrow_mut().take();
				return;
			}
			let dt = last_frame.map_or(0.016, |last| ((now - last) / 1000.0).clamp(0.0, 0.1));
			last_frame = Some(now);
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(dt);
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(window)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}

		surface.set_value(Some(Surface {
			running,
			observer: observer.ok(),
			_on_observe: on_observe,
			on_window_resize,
		}));
	});

	on_cleanup(move || {
		surface.update_value(|s| {
			if let Some(s) = s.take() {
				s.detach();
			}
		});
	});

	let state_fs = state.clone();
	Effect::new(move |_| {
		let fullscreen = fullscreen.get();
		if let Some(canvas) = canvas_ref.get() {
			let canvas: HtmlCanvasElement = canvas.into();
			fit_surface(&canvas, &state_fs, fullscreen);
		}
	});

	let state_sel = state.clone();
	Effect::new(move |_| {
		let id = selected.get();
		if let Some(ref mut s) = *state_sel.borrow_mut() {
			s.set_selected(id.as_deref());
		}
	});

	let state_zoom = state.clone();
	Effect::new(move |_| {
		let Some(action) = zoom.get() else {
			return;
		};
		if let Some(ref mut s) = *state_zoom.borrow_mut() {
			s.apply_zoom(action);
		}
		zoom.set(None);
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = pointer_position(&canvas, &ev);
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y);
			if s.pan.active {
				set_cursor(&canvas, "grabbing");
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = pointer_position(&canvas, &ev);
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(x, y);
			if !s.pan.active {
				let over_edge = s.hover.is_none() && s.edge_at_position(x, y).is_some();
				set_cursor(
					&canvas,
					if s.hover.is_some() || over_edge { "pointer" } else { "grab" },
				);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let hit = state_mu.borrow_mut().as_mut().and_then(|s| s.pointer_up());
		if let Some(canvas) = canvas_ref.get() {
			let canvas: HtmlCanvasElement = canvas.into();
			set_cursor(&canvas, "grab");
		}
		if let Some(hit) = hit {
			on_hit.run(hit);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (x, y) = pointer_position(&canvas, &ev);
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn container_sizes_the_surface() {
		let size = pick_size(false, Some((1920.0, 1080.0)), Some((1200.0, 700.0)));
		assert_eq!(size, (1200.0, 700.0));
	}

	#[test]
	fn fullscreen_takes_the_viewport() {
		let size = pick_size(true, Some((1920.0, 1080.0)), Some((840.0, 700.0)));
		assert_eq!(size, (1920.0, 1080.0));
		assert_eq!(pick_size(true, None, Some((840.0, 700.0))), (840.0, 700.0));
	}

	#[test]
	fn collapsed_container_falls_back() {
		assert_eq!(pick_size(false, None, Some((0.0, 700.0))), FALLBACK_SIZE);
		assert_eq!(pick_size(false, None, None), FALLBACK_SIZE);
	}
}
