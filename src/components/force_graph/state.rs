use std::sync::Arc;

use super::label::{FittedLabel, TextMeasure, edge_label_angle, fit_label};
use super::scale::{ViewTransform, Viewport, label_opacity};
use super::simulation::{LayoutParameters, Simulation};
use super::types::{CanvasHit, ZoomAction};
use crate::config::ViewConfig;
use crate::graph::Graph;

pub const NODE_RADIUS: f64 = 30.0;
pub const SELECTION_RING_RADIUS: f64 = 35.0;
pub const RISK_RING_RADIUS: f64 = 36.0;

/// Screen pixels an edge accepts clicks within.
const EDGE_HIT_WIDTH: f64 = 6.0;
/// Screen pixels a press may travel and still count as a click.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f64,
	pub node_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
	pub pressed_edge: Option<usize>,
}

/// Everything the canvas needs between frames: the graph, its particles,
/// fitted labels, the view transform and pointer interaction state.
pub struct ForceGraphState {
	graph: Arc<Graph>,
	simulation: Simulation,
	labels: Vec<FittedLabel>,
	viewport: Viewport,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: Option<usize>,
	selected: Option<usize>,
	layout: LayoutParameters,
	view: ViewConfig,
	pub width: f64,
	pub height: f64,
}

fn point_segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (apx, apy) = (p.0 - a.0, p.1 - a.1);
	let (abx, aby) = (b.0 - a.0, b.1 - a.1);
	let ab_len2 = abx * abx + aby * aby;
	if ab_len2 <= f64::EPSILON {
		return (apx * apx + apy * apy).sqrt();
	}
	let t = ((apx * abx + apy * aby) / ab_len2).clamp(0.0, 1.0);
	let (qx, qy) = (a.0 + abx * t, a.1 + aby * t);
	((p.0 - qx).powi(2) + (p.1 - qy).powi(2)).sqrt()
}

impl ForceGraphState {
	pub fn new(
		graph: Arc<Graph>,
		width: f64,
		height: f64,
		layout: LayoutParameters,
		view: ViewConfig,
		measure: &dyn TextMeasure,
	) -> Self {
		let simulation = Simulation::new(&graph, (width / 2.0, height / 2.0), layout.clone());
		let labels = fit_labels(&graph, measure);
		Self {
			graph,
			simulation,
			labels,
			viewport: Viewport::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			hover: None,
			selected: None,
			layout,
			view,
			width,
			height,
		}
	}

	/// Swaps in a new graph. The old particles are discarded and the
	/// simulation restarts around the current surface midpoint.
	pub fn load_graph(&mut self, graph: Arc<Graph>, measure: &dyn TextMeasure) {
		self.simulation = Simulation::new(
			&graph,
			(self.width / 2.0, self.height / 2.0),
			self.layout.clone(),
		);
		self.labels = fit_labels(&graph, measure);
		self.graph = graph;
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = None;
		self.selected = None;
	}

	pub fn graph(&self) -> &Graph {
		&self.graph
	}

	pub fn simulation(&self) -> &Simulation {
		&self.simulation
	}

	pub fn labels(&self) -> &[FittedLabel] {
		&self.labels
	}

	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	pub fn label_opacity(&self) -> f64 {
		label_opacity(self.transform().k)
	}

	pub fn position(&self, idx: usize) -> Option<(f64, f64)> {
		self.simulation.particle(idx).map(|p| (p.x, p.y))
	}

	/// Endpoint positions of edge `idx`, or `None` for a dangling edge.
	pub fn edge_endpoints(&self, idx: usize) -> Option<((f64, f64), (f64, f64))> {
		let edge = self.graph.edges().get(idx)?;
		let source = self.position(self.graph.node_index(&edge.source)?)?;
		let target = self.position(self.graph.node_index(&edge.target)?)?;
		Some((source, target))
	}

	pub fn edge_label_angle(&self, idx: usize) -> Option<f64> {
		self.edge_endpoints(idx)
			.map(|(source, target)| edge_label_angle(source, target))
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform().invert(sx, sy)
	}

	/// Topmost node under the screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.simulation
			.particles()
			.iter()
			.enumerate()
			.rev()
			.find(|(_, p)| (p.x - gx).hypot(p.y - gy) < NODE_RADIUS)
			.map(|(idx, _)| idx)
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let point = self.screen_to_graph(sx, sy);
		let tolerance = EDGE_HIT_WIDTH / self.transform().k;
		(0..self.graph.edges().len()).rev().find(|&idx| {
			self.edge_endpoints(idx)
				.is_some_and(|(a, b)| point_segment_distance(point, a, b) <= tolerance)
		})
	}

	pub fn selected(&self) -> Option<usize> {
		self.selected
	}

	pub fn is_selected(&self, idx: usize) -> bool {
		self.selected == Some(idx)
	}

	/// Highlights the node with `id`; at most one node carries the ring.
	pub fn set_selected(&mut self, id: Option<&str>) {
		self.selected = id.and_then(|id| self.graph.node_index(id));
	}

	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if let Some(idx) = self.node_at_position(x, y) {
			let Some((nx, ny)) = self.position(idx) else {
				return;
			};
			self.drag = DragState {
				active: true,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				node_start_x: nx,
				node_start_y: ny,
				moved: false,
			};
			self.simulation.start_drag(idx);
		} else {
			let transform = self.transform();
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				transform_start_x: transform.x,
				transform_start_y: transform.y,
				moved: false,
				pressed_edge: self.edge_at_position(x, y),
			};
		}
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			self.hover = self.node_at_position(x, y);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				self.drag.moved = true;
			}
			let k = self.transform().k;
			self.simulation.drag_to(
				idx,
				self.drag.node_start_x + dx / k,
				self.drag.node_start_y + dy / k,
			);
		} else if self.pan.active {
			let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				self.pan.moved = true;
			}
			let transform = self.transform();
			self.viewport.set(ViewTransform {
				x: self.pan.transform_start_x + dx,
				y: self.pan.transform_start_y + dy,
				..transform
			});
		}
	}

	/// Ends any drag or pan. A press that never moved reports what it clicked.
	pub fn pointer_up(&mut self) -> Option<CanvasHit> {
		let mut hit = None;
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				self.simulation.end_drag(idx);
				if !self.drag.moved {
					hit = Some(CanvasHit::Node(idx));
				}
			}
		} else if self.pan.active && !self.pan.moved {
			hit = self.pan.pressed_edge.map(CanvasHit::Edge);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		hit
	}

	pub fn pointer_leave(&mut self) {
		if let Some(idx) = self.drag.node_idx {
			self.simulation.end_drag(idx);
		}
		self.drag = DragState::default();
		self.pan = PanState::default();
		self.hover = None;
	}

	/// Wheel zoom about the pointer.
	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let transform = self.transform();
		self.viewport
			.set(transform.scaled_about(transform.k * factor, x, y));
	}

	/// Toolbar zoom about the surface midpoint, animated.
	pub fn apply_zoom(&mut self, action: ZoomAction) {
		let (cx, cy, duration) = (self.width / 2.0, self.height / 2.0, self.view.zoom_duration_ms);
		match action {
			ZoomAction::In => self.viewport.zoom_by(self.view.zoom_step, cx, cy, duration),
			ZoomAction::Out => self
				.viewport
				.zoom_by(1.0 / self.view.zoom_step, cx, cy, duration),
			ZoomAction::Fit => self.viewport.fit(duration),
		}
	}

	pub fn tick(&mut self, dt: f64) {
		self.simulation.tick();
		self.viewport.advance(dt * 1000.0);
	}

	/// Tracks the surface size. The transform and the simulation's
	/// centering target stay as they are.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn fit_labels(graph: &Graph, measure: &dyn TextMeasure) -> Vec<FittedLabel> {
	graph
		.nodes()
		.iter()
		.map(|node| fit_label(&node.display_name(), measure))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{RawNode, RawRelationship, ResultValue, normalize};

	struct Monospace;

	impl TextMeasure for Monospace {
		fn width(&self, text: &str, font_size: f64) -> f64 {
			text.chars().count() as f64 * font_size * 0.6
		}
	}

	fn graph() -> Arc<Graph> {
		Arc::new(normalize([
			ResultValue::Node(RawNode::new("a", ["Customer"]).with_property("name", "Ada")),
			ResultValue::Node(RawNode::new("b", ["Account"])),
			ResultValue::Relationship(RawRelationship::new("OWNS", "a", "b")),
			ResultValue::Relationship(RawRelationship::new("OWNS", "a", "ghost")),
		]))
	}

	fn state() -> ForceGraphState {
		let mut state = ForceGraphState::new(
			graph(),
			800.0,
			600.0,
			LayoutParameters::default(),
			ViewConfig::default(),
			&Monospace,
		);
		for _ in 0..400 {
			state.tick(0.016);
		}
		state
	}

	fn screen(state: &ForceGraphState, idx: usize) -> (f64, f64) {
		let (x, y) = state.position(idx).unwrap();
		state.transform().apply(x, y)
	}

	fn edge_midpoint(state: &ForceGraphState, idx: usize) -> (f64, f64) {
		let ((x1, y1), (x2, y2)) = state.edge_endpoints(idx).unwrap();
		state.transform().apply((x1 + x2) / 2.0, (y1 + y2) / 2.0)
	}

	#[test]
	fn press_and_release_on_node_is_a_click() {
		let mut state = state();
		let (x, y) = screen(&state, 1);
		state.pointer_down(x, y);
		assert_eq!(state.pointer_up(), Some(CanvasHit::Node(1)));
		assert!(!state.simulation().particles()[1].is_pinned());
	}

	#[test]
	fn dragging_pins_the_node_to_the_pointer() {
		let mut state = state();
		let (x, y) = screen(&state, 0);
		state.pointer_down(x, y);
		state.pointer_move(x + 40.0, y - 25.0);
		state.tick(0.016);
		let (nx, ny) = state.position(0).unwrap();
		let (sx, sy) = state.transform().apply(nx, ny);
		assert!((sx - (x + 40.0)).abs() < 1e-6);
		assert!((sy - (y - 25.0)).abs() < 1e-6);
		assert!(!state.simulation().is_settled());
		assert_eq!(state.pointer_up(), None);
		assert!(!state.simulation().particles()[0].is_pinned());
	}

	#[test]
	fn clicking_an_edge_reports_it() {
		let mut state = state();
		let (x, y) = edge_midpoint(&state, 0);
		assert_eq!(state.node_at_position(x, y), None);
		state.pointer_down(x, y);
		assert_eq!(state.pointer_up(), Some(CanvasHit::Edge(0)));
	}

	#[test]
	fn dangling_edges_have_no_geometry() {
		let state = state();
		assert!(state.edge_endpoints(1).is_none());
		assert!(state.edge_label_angle(1).is_none());
		let angle = state.edge_label_angle(0).unwrap();
		assert!((-90.0..=90.0).contains(&angle));
	}

	#[test]
	fn background_drag_pans_without_clicking() {
		let mut state = state();
		state.pointer_down(5.0, 5.0);
		state.pointer_move(55.0, 25.0);
		assert_eq!(state.pointer_up(), None);
		let t = state.transform();
		assert_eq!((t.x, t.y, t.k), (50.0, 20.0, 1.0));
	}

	#[test]
	fn wheel_zoom_is_clamped() {
		let mut state = state();
		for _ in 0..100 {
			state.wheel(400.0, 300.0, -1.0);
		}
		assert_eq!(state.transform().k, 4.0);
		for _ in 0..200 {
			state.wheel(400.0, 300.0, 1.0);
		}
		assert_eq!(state.transform().k, 0.1);
		assert_eq!(state.label_opacity(), 0.0);
	}

	#[test]
	fn toolbar_zoom_animates_then_fit_restores_identity() {
		let mut state = state();
		state.apply_zoom(ZoomAction::In);
		state.tick(0.016);
		assert!(state.transform().k > 1.0 && state.transform().k < 1.3);
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert!((state.transform().k - 1.3).abs() < 1e-9);
		assert_eq!(state.label_opacity(), 1.0);

		state.apply_zoom(ZoomAction::Fit);
		for _ in 0..30 {
			state.tick(0.016);
		}
		assert_eq!(state.transform(), ViewTransform::IDENTITY);
	}

	#[test]
	fn selection_ring_follows_the_selected_id() {
		let mut state = state();
		state.set_selected(Some("b"));
		assert!(state.is_selected(1) && !state.is_selected(0));
		state.set_selected(Some("a"));
		assert_eq!(state.selected(), Some(0));
		state.set_selected(Some("ghost"));
		assert_eq!(state.selected(), None);
	}

	#[test]
	fn loading_a_graph_discards_particles_and_selection() {
		let mut state = state();
		state.set_selected(Some("a"));
		state.resize(1000.0, 400.0);
		let country = ResultValue::Node(RawNode::new("z", ["Country"]));
		let next = Arc::new(normalize([country]));
		state.load_graph(next, &Monospace);
		assert_eq!(state.simulation().particles().len(), 1);
		assert_eq!(state.simulation().center(), (500.0, 200.0));
		assert_eq!(state.selected(), None);
		assert_eq!(state.labels()[0].text, "z");
	}

	#[test]
	fn resize_keeps_the_simulation_center() {
		let mut state = state();
		state.resize(1200.0, 900.0);
		assert_eq!(state.simulation().center(), (400.0, 300.0));
	}

	#[test]
	fn toolbar_zoom_pivots_on_the_resized_surface() {
		let mut state = state();
		// side panel opens: the container narrows without a window resize
		state.resize(440.0, 600.0);
		let pivot = state.transform().invert(220.0, 300.0);
		state.apply_zoom(ZoomAction::In);
		for _ in 0..30 {
			state.tick(0.016);
		}
		let after = state.transform().invert(220.0, 300.0);
		assert!((pivot.0 - after.0).abs() < 1e-9);
		assert!((pivot.1 - after.1).abs() < 1e-9);
	}
}
