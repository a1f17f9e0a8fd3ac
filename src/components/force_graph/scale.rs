//! Pan/zoom transform, its animated transitions, and zoom-dependent label fading.

/// Smallest allowed zoom scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed zoom scale.
pub const MAX_SCALE: f64 = 4.0;

const LABEL_FADE_START: f64 = 0.8;
const LABEL_FADE_END: f64 = 1.2;

/// Clamps `k` into `[MIN_SCALE, MAX_SCALE]`.
pub fn clamp_scale(k: f64) -> f64 {
	if k.is_nan() {
		return 1.0;
	}
	k.clamp(MIN_SCALE, MAX_SCALE)
}

/// Node label opacity at scale `k`: hidden below 0.8, opaque from 1.2, linear between.
pub fn label_opacity(k: f64) -> f64 {
	if k < LABEL_FADE_START {
		0.0
	} else if k < LABEL_FADE_END {
		(k - LABEL_FADE_START) / (LABEL_FADE_END - LABEL_FADE_START)
	} else {
		1.0
	}
}

fn ease_in_out_cubic(t: f64) -> f64 {
	let t = t * 2.0;
	if t <= 1.0 {
		t * t * t / 2.0
	} else {
		let t = t - 2.0;
		(t * t * t + 2.0) / 2.0
	}
}

/// Translate + uniform scale, screen = graph * k + (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	/// No translation, scale 1.
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	/// Rescales to `k` (clamped) keeping the screen point `(px, py)` fixed.
	pub fn scaled_about(&self, k: f64, px: f64, py: f64) -> Self {
		let k = clamp_scale(k);
		let ratio = k / self.k;
		Self {
			x: px - (px - self.x) * ratio,
			y: py - (py - self.y) * ratio,
			k,
		}
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: clamp_scale(self.k + (to.k - self.k) * t),
		}
	}
}

#[derive(Clone, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	elapsed_ms: f64,
	duration_ms: f64,
}

/// Owns the current transform and any transition in progress.
#[derive(Clone, Debug, Default)]
pub struct Viewport {
	current: ViewTransform,
	transition: Option<Transition>,
}

impl Viewport {
	pub fn transform(&self) -> ViewTransform {
		self.current
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Jumps to `transform` immediately, cancelling any transition.
	pub fn set(&mut self, transform: ViewTransform) {
		self.transition = None;
		self.current = ViewTransform {
			k: clamp_scale(transform.k),
			..transform
		};
	}

	/// Starts a transition from the current transform to `target`.
	pub fn animate_to(&mut self, target: ViewTransform, duration_ms: f64) {
		let target = ViewTransform {
			k: clamp_scale(target.k),
			..target
		};
		if duration_ms <= 0.0 {
			self.set(target);
			return;
		}
		self.transition = Some(Transition {
			from: self.current,
			to: target,
			elapsed_ms: 0.0,
			duration_ms,
		});
	}

	/// Where the viewport is headed: the running transition's end, or the current transform.
	pub fn target(&self) -> ViewTransform {
		self.transition.as_ref().map_or(self.current, |t| t.to)
	}

	/// Multiplies the scale by `factor` about the screen point `(px, py)`, animated.
	///
	/// Steps compound from the pending target, so interrupting a running
	/// zoom does not lose any of it.
	pub fn zoom_by(&mut self, factor: f64, px: f64, py: f64, duration_ms: f64) {
		let from = self.target();
		let target = from.scaled_about(from.k * factor, px, py);
		self.animate_to(target, duration_ms);
	}

	/// Returns to the identity transform, animated.
	pub fn fit(&mut self, duration_ms: f64) {
		self.animate_to(ViewTransform::IDENTITY, duration_ms);
	}

	/// Advances the running transition by `dt_ms`. Returns whether the transform changed.
	pub fn advance(&mut self, dt_ms: f64) -> bool {
		let Some(transition) = self.transition.as_mut() else {
			return false;
		};
		transition.elapsed_ms += dt_ms;
		let t = (transition.elapsed_ms / transition.duration_ms).min(1.0);
		self.current = transition.from.lerp(&transition.to, ease_in_out_cubic(t));
		if t >= 1.0 {
			self.current = transition.to;
			self.transition = None;
		}
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn settle(viewport: &mut Viewport) {
		while viewport.advance(16.0) {}
	}

	#[test]
	fn label_opacity_ramps_between_thresholds() {
		assert_eq!(label_opacity(0.5), 0.0);
		assert_eq!(label_opacity(0.8), 0.0);
		assert!((label_opacity(1.0) - 0.5).abs() < 1e-12);
		assert_eq!(label_opacity(1.2), 1.0);
		assert_eq!(label_opacity(3.0), 1.0);
	}

	#[test]
	fn repeated_zoom_in_stops_at_max_scale() {
		let mut viewport = Viewport::default();
		for _ in 0..20 {
			viewport.zoom_by(1.3, 400.0, 300.0, 300.0);
			settle(&mut viewport);
			assert!(viewport.transform().k <= MAX_SCALE);
		}
		assert_eq!(viewport.transform().k, MAX_SCALE);
	}

	#[test]
	fn repeated_zoom_out_stops_at_min_scale() {
		let mut viewport = Viewport::default();
		for _ in 0..30 {
			viewport.zoom_by(1.0 / 1.3, 400.0, 300.0, 300.0);
			for _ in 0..5 {
				viewport.advance(16.0);
				assert!(viewport.transform().k >= MIN_SCALE);
			}
		}
		settle(&mut viewport);
		assert_eq!(viewport.transform().k, MIN_SCALE);
	}

	#[test]
	fn interrupted_zoom_steps_compound() {
		let mut viewport = Viewport::default();
		viewport.zoom_by(1.3, 400.0, 300.0, 300.0);
		viewport.advance(16.0);
		viewport.zoom_by(1.3, 400.0, 300.0, 300.0);
		assert!((viewport.target().k - 1.69).abs() < 1e-12);
		settle(&mut viewport);
		assert!((viewport.transform().k - 1.69).abs() < 1e-12);
	}

	#[test]
	fn zoom_keeps_the_focus_point_fixed() {
		let mut viewport = Viewport::default();
		viewport.set(ViewTransform {
			x: 40.0,
			y: -10.0,
			k: 1.0,
		});
		let before = viewport.transform().invert(400.0, 300.0);
		viewport.zoom_by(1.3, 400.0, 300.0, 300.0);
		settle(&mut viewport);
		let after = viewport.transform().invert(400.0, 300.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn transition_takes_its_duration() {
		let mut viewport = Viewport::default();
		viewport.zoom_by(1.3, 0.0, 0.0, 300.0);
		for _ in 0..18 {
			assert!(viewport.advance(16.0));
		}
		assert!(viewport.is_animating());
		assert!(viewport.advance(16.0));
		assert!(!viewport.is_animating());
		assert!((viewport.transform().k - 1.3).abs() < 1e-12);
	}

	#[test]
	fn fit_returns_to_identity() {
		let mut viewport = Viewport::default();
		viewport.set(ViewTransform {
			x: 120.0,
			y: 80.0,
			k: 2.5,
		});
		viewport.fit(300.0);
		settle(&mut viewport);
		assert_eq!(viewport.transform(), ViewTransform::IDENTITY);
	}

	#[test]
	fn set_clamps_scale() {
		let mut viewport = Viewport::default();
		viewport.set(ViewTransform {
			x: 0.0,
			y: 0.0,
			k: 25.0,
		});
		assert_eq!(viewport.transform().k, MAX_SCALE);
		assert_eq!(clamp_scale(f64::NAN), 1.0);
	}

	#[test]
	fn invert_undoes_apply() {
		let t = ViewTransform {
			x: 13.0,
			y: -7.0,
			k: 1.7,
		};
		let (sx, sy) = t.apply(21.0, 34.0);
		let (gx, gy) = t.invert(sx, sy);
		assert!((gx - 21.0).abs() < 1e-9 && (gy - 34.0).abs() < 1e-9);
	}
}
