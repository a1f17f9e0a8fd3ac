//! Node label fitting and edge label orientation.

/// Font size every node label starts at.
pub const LABEL_FONT_SIZE: f64 = 10.0;
/// Smallest font size before truncation kicks in.
pub const LABEL_MIN_FONT_SIZE: f64 = 7.0;
/// Widest a node label may render.
pub const LABEL_MAX_WIDTH: f64 = 54.0;

const FONT_STEP: f64 = 0.5;
const ELLIPSIS: char = '…';
const MIN_TRUNCATED_CHARS: usize = 3;

/// Measures rendered text width.
pub trait TextMeasure {
	/// Width of `text` at `font_size`.
	fn width(&self, text: &str, font_size: f64) -> f64;
}

/// A label that fits its node.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedLabel {
	pub text: String,
	pub font_size: f64,
}

/// Shrinks `full` toward the minimum font size, then middle-truncates it
/// until it fits `LABEL_MAX_WIDTH` or is down to three characters.
pub fn fit_label(full: &str, measure: &dyn TextMeasure) -> FittedLabel {
	let mut font_size = LABEL_FONT_SIZE;
	let mut width = measure.width(full, font_size);
	while width > LABEL_MAX_WIDTH && font_size > LABEL_MIN_FONT_SIZE {
		font_size -= FONT_STEP;
		width = measure.width(full, font_size);
	}

	let mut chars: Vec<char> = full.chars().collect();
	while width > LABEL_MAX_WIDTH && chars.len() > MIN_TRUNCATED_CHARS {
		let (len, half) = (chars.len(), chars.len() / 2);
		let mut next: Vec<char> = chars[..half - 1].to_vec();
		next.push(ELLIPSIS);
		next.extend_from_slice(&chars[len - half + 1..]);
		chars = next;
		width = measure.width(&chars.iter().collect::<String>(), font_size);
	}

	FittedLabel {
		text: chars.into_iter().collect(),
		font_size,
	}
}

/// Angle in degrees of the source→target line, folded into [-90, 90] so
/// text along it is never upside down.
pub fn edge_label_angle(source: (f64, f64), target: (f64, f64)) -> f64 {
	let (dx, dy) = (target.0 - source.0, target.1 - source.1);
	let angle = dy.atan2(dx).to_degrees();
	if angle > 90.0 {
		angle - 180.0
	} else if angle < -90.0 {
		angle + 180.0
	} else {
		angle
	}
}
