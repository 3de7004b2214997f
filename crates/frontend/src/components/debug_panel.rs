use dioxus::prelude::*;

/// Scrollable on-screen log, one `<pre>` per entry.
#[component]
pub fn DebugPanel(entries: Vec<String>) -> Element {
    rsx! {
        div { id: "messages", class: "messages",
            for (i, entry) in entries.iter().enumerate() {
                pre { key: "{i}", "{entry}" }
            }
        }
    }
}
