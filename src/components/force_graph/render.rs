use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::label::TextMeasure;
use super::state::{ForceGraphState, NODE_RADIUS, RISK_RING_RADIUS, SELECTION_RING_RADIUS};

const BACKGROUND: &str = "#FFFFFF";
const EDGE_COLOR: &str = "#A5ABB6";
const EDGE_LABEL_COLOR: &str = "#6b7280";
const RISK_RING_COLOR: &str = "#F36924";
const SELECTION_COLOR: &str = "#018BFF";
const FALLBACK_COLOR: &str = "#A5ABB6";
const ARROW_LENGTH: f64 = 6.0;
const NODE_FONT: &str = "\"Helvetica Neue\", Helvetica, Arial, sans-serif";
const EDGE_FONT: &str = "500 8px \"Helvetica Neue\", Arial, sans-serif";

/// Fill color for a node's primary label.
pub fn label_color(label: &str) -> &'static str {
	match label {
		"Customer" => "#DA7194",
		"Account" => "#6DCE9E",
		"Transaction" => "#F79767",
		"Country" => "#8DCC93",
		"Counterparty" | "Intermediary" => "#C990C0",
		"Email" | "Entity" => "#4C8EDA",
		"Phone" => "#57C7E3",
		"IP" => "#FCC940",
		"Device" => "#F16667",
		"Case" => "#D9C8AE",
		"Alert" => "#ECB5C9",
		_ => FALLBACK_COLOR,
	}
}

/// Darkens a `#RRGGBB` color by `0.7^amount` per channel.
fn darker(hex: &str, amount: f64) -> String {
	let factor = 0.7f64.powf(amount);
	let channel = |i: usize| {
		hex.get(i..i + 2)
			.and_then(|c| u8::from_str_radix(c, 16).ok())
			.map_or(0.0, |c| (c as f64 * factor).round())
	};
	format!("rgb({}, {}, {})", channel(1), channel(3), channel(5))
}

fn node_font(size: f64) -> String {
	format!("500 {size}px {NODE_FONT}")
}

/// Measures text with the canvas's own font metrics.
pub struct CanvasMeasure<'a>(pub &'a CanvasRenderingContext2d);

impl TextMeasure for CanvasMeasure<'_> {
	fn width(&self, text: &str, font_size: f64) -> f64 {
		self.0.set_font(&node_font(font_size));
		self.0.measure_text(text).map_or(0.0, |m| m.width())
	}
}

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let transform = state.transform();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	draw_edges(state, ctx);
	draw_edge_labels(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_stroke_style_str(EDGE_COLOR);
	ctx.set_fill_style_str(EDGE_COLOR);
	ctx.set_line_width(1.0);

	for idx in 0..state.graph().edges().len() {
		let Some(((x1, y1), (x2, y2))) = state.edge_endpoints(idx) else {
			continue;
		};
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();

		// arrowhead sits on the target's rim
		let (ux, uy) = (dx / dist, dy / dist);
		let (tip_x, tip_y) = (x2 - ux * NODE_RADIUS, y2 - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * ARROW_LENGTH, tip_y - uy * ARROW_LENGTH);
		let (px, py) = (-uy * ARROW_LENGTH * 0.5, ux * ARROW_LENGTH * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
}

fn draw_edge_labels(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_font(EDGE_FONT);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_line_width(3.0);
	ctx.set_line_join("round");
	ctx.set_line_cap("round");
	ctx.set_stroke_style_str(BACKGROUND);
	ctx.set_fill_style_str(EDGE_LABEL_COLOR);

	for (idx, edge) in state.graph().edges().iter().enumerate() {
		let (Some(((x1, y1), (x2, y2))), Some(angle)) =
			(state.edge_endpoints(idx), state.edge_label_angle(idx))
		else {
			continue;
		};
		ctx.save();
		let _ = ctx.translate((x1 + x2) / 2.0, (y1 + y2) / 2.0);
		let _ = ctx.rotate(angle.to_radians());
		let _ = ctx.stroke_text(&edge.rel_type, 0.0, 0.0);
		let _ = ctx.fill_text(&edge.rel_type, 0.0, 0.0);
		ctx.restore();
	}
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let opacity = state.label_opacity();
	let labels = state.labels();

	for (idx, node) in state.graph().nodes().iter().enumerate() {
		let Some((x, y)) = state.position(idx) else {
			continue;
		};
		let color = label_color(&node.primary_label);

		if state.is_selected(idx) {
			draw_selection_glow(ctx, x, y);
		}

		ctx.begin_path();
		let _ = ctx.arc(x, y, NODE_RADIUS, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(color);
		ctx.fill();
		ctx.set_stroke_style_str(&darker(color, 0.8));
		ctx.set_line_width(if state.hover == Some(idx) { 3.0 } else { 2.0 });
		ctx.stroke();

		if node.is_risky() {
			ctx.begin_path();
			let _ = ctx.arc(x, y, RISK_RING_RADIUS, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(RISK_RING_COLOR);
			ctx.set_line_width(3.0);
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(5.0),
				&JsValue::from_f64(3.0),
			));
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if state.is_selected(idx) {
			ctx.begin_path();
			let _ = ctx.arc(x, y, SELECTION_RING_RADIUS, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(SELECTION_COLOR);
			ctx.set_line_width(3.0);
			ctx.stroke();
		}

		if opacity > 0.0 {
			if let Some(label) = labels.get(idx) {
				ctx.set_global_alpha(opacity);
				ctx.set_font(&node_font(label.font_size));
				ctx.set_text_align("center");
				ctx.set_text_baseline("alphabetic");
				ctx.set_fill_style_str("#FFFFFF");
				let _ = ctx.fill_text(&label.text, x, y + 4.0);
				ctx.set_global_alpha(1.0);
			}
		}
	}
}

fn draw_selection_glow(ctx: &CanvasRenderingContext2d, x: f64, y: f64) {
	let glow_radius = SELECTION_RING_RADIUS * 1.6;
	let Ok(gradient) = ctx.create_radial_gradient(x, y, NODE_RADIUS, x, y, glow_radius) else {
		return;
	};
	if gradient
		.add_color_stop(0.0, "rgba(1, 139, 255, 0.25)")
		.and_then(|_| gradient.add_color_stop(1.0, "rgba(1, 139, 255, 0)"))
		.is_err()
	{
		return;
	}
	ctx.begin_path();
	let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn known_labels_have_colors() {
		assert_eq!(label_color("Customer"), "#DA7194");
		assert_eq!(label_color("Intermediary"), label_color("Counterparty"));
		assert_eq!(label_color("Unknown"), FALLBACK_COLOR);
	}

	#[test]
	fn darker_scales_each_channel() {
		assert_eq!(darker("#FFFFFF", 0.0), "rgb(255, 255, 255)");
		// 0.7^0.8 ≈ 0.7517
		assert_eq!(darker("#6DCE9E", 0.8), "rgb(82, 155, 119)");
	}
}
