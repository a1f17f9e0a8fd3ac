pub mod entity_panel;
pub mod force_graph;
pub mod query_bar;
pub mod sidebar;
