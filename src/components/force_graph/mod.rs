//! Canvas rendering of a [`Graph`](crate::graph::Graph) with a force-directed
//! layout, pan/zoom and click selection.

mod component;
mod label;
mod render;
pub mod scale;
mod simulation;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use label::{FittedLabel, TextMeasure, edge_label_angle, fit_label};
pub use render::label_color;
pub use simulation::{LayoutParameters, Particle, Simulation};
pub use state::ForceGraphState;
pub use types::{CanvasHit, ZoomAction};
