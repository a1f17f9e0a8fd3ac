/// Toolbar zoom commands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoomAction {
	In,
	Out,
	Fit,
}

/// What a click landed on, by index into the graph's nodes or edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasHit {
	Node(usize),
	Edge(usize),
}
