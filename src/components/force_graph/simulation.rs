//! Force-directed layout with an alpha-cooled velocity integrator.
//!
//! Four forces are applied each tick, in order: link springs, pairwise
//! charge, centering and collision. Alpha decays geometrically toward its
//! target; once it drops below `alpha_min` the layout is settled and ticking
//! stops until something reheats it.

use std::f64::consts::PI;

use log::{debug, warn};
use serde::Deserialize;

use crate::graph::Graph;

/// Simulation tuning.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutParameters {
	/// Pairwise charge; negative repels.
	pub charge_strength: f64,
	/// Rest length of edge springs.
	pub link_distance: f64,
	/// Per-node collision radius.
	pub collision_radius: f64,
	/// Fraction of the centroid offset removed per tick.
	pub center_strength: f64,
	/// Fraction of the gap to the alpha target closed per tick.
	pub alpha_decay: f64,
	/// Fraction of velocity lost per tick.
	pub velocity_decay: f64,
	/// Alpha below which the layout counts as settled.
	pub alpha_min: f64,
	/// Alpha target held while a node is dragged.
	pub reheat_target: f64,
}

impl Default for LayoutParameters {
	fn default() -> Self {
		Self {
			charge_strength: -300.0,
			link_distance: 120.0,
			collision_radius: 50.0,
			center_strength: 1.0,
			alpha_decay: 0.02,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			reheat_target: 0.3,
		}
	}
}

/// Per-node runtime state, indexed like [`Graph::nodes`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Particle {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// Pinned x while dragged.
	pub fx: Option<f64>,
	/// Pinned y while dragged.
	pub fy: Option<f64>,
}

impl Particle {
	/// True while a drag holds this particle in place.
	pub fn is_pinned(&self) -> bool {
		self.fx.is_some() || self.fy.is_some()
	}
}

#[derive(Clone, Debug)]
struct Link {
	source: usize,
	target: usize,
	strength: f64,
	bias: f64,
}

const INITIAL_RADIUS: f64 = 10.0;
const DISTANCE_MIN2: f64 = 1.0;

/// Particle set for one graph; replaced wholesale when the graph changes.
pub struct Simulation {
	params: LayoutParameters,
	particles: Vec<Particle>,
	links: Vec<Link>,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	seed: u32,
}

impl Simulation {
	/// Builds particles for every node of `graph`, laid out on a phyllotaxis
	/// spiral around `center`. Edges with a missing endpoint are not simulated.
	pub fn new(graph: &Graph, center: (f64, f64), params: LayoutParameters) -> Self {
		let initial_angle = PI * (3.0 - 5f64.sqrt());
		let particles: Vec<Particle> = (0..graph.nodes().len())
			.map(|i| {
				let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
				let angle = i as f64 * initial_angle;
				Particle {
					x: center.0 + radius * angle.cos(),
					y: center.1 + radius * angle.sin(),
					..Particle::default()
				}
			})
			.collect();

		let mut pairs = Vec::with_capacity(graph.edges().len());
		for edge in graph.edges() {
			match (graph.node_index(&edge.source), graph.node_index(&edge.target)) {
				(Some(s), Some(t)) => pairs.push((s, t)),
				_ => warn!(
					"edge {} -> {} has no endpoint node, not simulated",
					edge.source, edge.target
				),
			}
		}

		let mut degree = vec![0usize; particles.len()];
		for &(s, t) in &pairs {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = pairs
			.into_iter()
			.map(|(source, target)| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				Link {
					source,
					target,
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		debug!("simulation started with {} particles", particles.len());
		Self {
			params,
			particles,
			links,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			seed: 1,
		}
	}

	pub fn particles(&self) -> &[Particle] {
		&self.particles
	}

	pub fn particle(&self, idx: usize) -> Option<&Particle> {
		self.particles.get(idx)
	}

	/// Endpoint indices of every simulated link.
	pub fn links(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
		self.links.iter().map(|l| (l.source, l.target))
	}

	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	/// Nothing left to animate: alpha is cold and no drag is holding it up.
	pub fn is_settled(&self) -> bool {
		self.alpha < self.params.alpha_min && self.alpha_target < self.params.alpha_min
	}

	/// Advances one tick unless settled. Returns whether anything moved.
	pub fn tick(&mut self) -> bool {
		if self.is_settled() {
			return false;
		}
		self.step();
		true
	}

	/// One integration step regardless of alpha.
	pub fn step(&mut self) {
		self.alpha += (self.alpha_target - self.alpha) * self.params.alpha_decay;
		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collision();

		let keep = 1.0 - self.params.velocity_decay;
		let center = self.center;
		for p in &mut self.particles {
			match p.fx {
				Some(fx) => (p.x, p.vx) = (fx, 0.0),
				None => {
					p.vx *= keep;
					p.x += p.vx;
				}
			}
			match p.fy {
				Some(fy) => (p.y, p.vy) = (fy, 0.0),
				None => {
					p.vy *= keep;
					p.y += p.vy;
				}
			}
			if !(p.x.is_finite() && p.y.is_finite() && p.vx.is_finite() && p.vy.is_finite()) {
				(p.x, p.y, p.vx, p.vy) = (center.0, center.1, 0.0, 0.0);
			}
		}
	}

	/// Holds particle `idx` at its current position and reheats the layout.
	pub fn start_drag(&mut self, idx: usize) {
		let Some(p) = self.particles.get_mut(idx) else {
			return;
		};
		(p.fx, p.fy) = (Some(p.x), Some(p.y));
		self.alpha_target = self.params.reheat_target;
		if self.alpha < self.params.alpha_min {
			self.alpha = self.params.alpha_min;
		}
	}

	/// Moves the held particle to `(x, y)`.
	pub fn drag_to(&mut self, idx: usize, x: f64, y: f64) {
		if !(x.is_finite() && y.is_finite()) {
			return;
		}
		if let Some(p) = self.particles.get_mut(idx) {
			(p.fx, p.fy) = (Some(x), Some(y));
		}
	}

	/// Releases particle `idx` and lets alpha decay again.
	pub fn end_drag(&mut self, idx: usize) {
		if let Some(p) = self.particles.get_mut(idx) {
			(p.fx, p.fy) = (None, None);
		}
		self.alpha_target = 0.0;
	}

	/// Deterministic tiny offset used to separate coincident particles.
	fn jiggle(&mut self) -> f64 {
		self.seed = self
			.seed
			.wrapping_mul(1_664_525)
			.wrapping_add(1_013_904_223);
		(self.seed as f64 / 4_294_967_296.0 - 0.5) * 1e-6
	}

	fn apply_links(&mut self) {
		let (alpha, distance) = (self.alpha, self.params.link_distance);
		for i in 0..self.links.len() {
			let Link {
				source,
				target,
				strength,
				bias,
			} = self.links[i].clone();
			let (s, t) = (&self.particles[source], &self.particles[target]);
			let mut x = t.x + t.vx - s.x - s.vx;
			let mut y = t.y + t.vy - s.y - s.vy;
			if x == 0.0 {
				x = self.jiggle();
			}
			if y == 0.0 {
				y = self.jiggle();
			}
			let mut l = (x * x + y * y).sqrt();
			l = (l - distance) / l * alpha * strength;
			(x, y) = (x * l, y * l);

			let t = &mut self.particles[target];
			t.vx -= x * bias;
			t.vy -= y * bias;
			let s = &mut self.particles[source];
			s.vx += x * (1.0 - bias);
			s.vy += y * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self) {
		let weight = self.params.charge_strength * self.alpha;
		let n = self.particles.len();
		for i in 0..n {
			let (mut dvx, mut dvy) = (0.0, 0.0);
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut x = self.particles[j].x - self.particles[i].x;
				let mut y = self.particles[j].y - self.particles[i].y;
				let mut l = x * x + y * y;
				if x == 0.0 {
					x = self.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle();
					l += y * y;
				}
				if l < DISTANCE_MIN2 {
					l = (DISTANCE_MIN2 * l).sqrt();
				}
				dvx += x * weight / l;
				dvy += y * weight / l;
			}
			self.particles[i].vx += dvx;
			self.particles[i].vy += dvy;
		}
	}

	fn apply_center(&mut self) {
		let n = self.particles.len();
		if n == 0 {
			return;
		}
		let (sx, sy) = self
			.particles
			.iter()
			.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
		let strength = self.params.center_strength;
		let (dx, dy) = (
			(sx / n as f64 - self.center.0) * strength,
			(sy / n as f64 - self.center.1) * strength,
		);
		for p in &mut self.particles {
			p.x -= dx;
			p.y -= dy;
		}
	}

	fn apply_collision(&mut self) {
		let r = self.params.collision_radius;
		let min_dist = r + r;
		let n = self.particles.len();
		for i in 0..n {
			let (xi, yi) = {
				let p = &self.particles[i];
				(p.x + p.vx, p.y + p.vy)
			};
			for j in (i + 1)..n {
				let (mut x, mut y) = {
					let q = &self.particles[j];
					(xi - q.x - q.vx, yi - q.y - q.vy)
				};
				let mut l = x * x + y * y;
				if l >= min_dist * min_dist {
					continue;
				}
				if x == 0.0 {
					x = self.jiggle();
					l += x * x;
				}
				if y == 0.0 {
					y = self.jiggle();
					l += y * y;
				}
				let d = l.sqrt();
				let k = (min_dist - d) / d;
				(x, y) = (x * k, y * k);
				// equal radii split the correction evenly
				let p = &mut self.particles[i];
				p.vx += x * 0.5;
				p.vy += y * 0.5;
				let q = &mut self.particles[j];
				q.vx -= x * 0.5;
				q.vy -= y * 0.5;
			}
		}
	}
}
