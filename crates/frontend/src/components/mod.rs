pub mod debug_panel;
pub mod map_view;
