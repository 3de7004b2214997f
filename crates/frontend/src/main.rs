mod bridge;
mod components;
mod config;
mod leaflet;

use dioxus::prelude::*;

const CSS: Asset = asset!("/assets/main.css");

#[allow(non_snake_case)]
fn App() -> Element {
    let config = use_hook(config::load);
    rsx! {
        document::Stylesheet { href: CSS }
        components::map_view::MapView { config }
    }
}

fn main() {
    dioxus::logger::initialize_default();
    launch(App);
}
