pub mod bridge;
pub mod config;
pub mod console;
pub mod geo;
pub mod map;
pub mod marker;
pub mod protocol;
pub mod view;
