use leptos::prelude::*;
use sticky_canvas_ui::app::App;
use sticky_canvas_ui::config::CanvasConfig;
use sticky_canvas_ui::logging;
use sticky_canvas_ui::persist::BrowserStorage;

fn main() {
    let config = CanvasConfig::load(&BrowserStorage);
    logging::init(config.level_filter());
    log::info!("starting canvas, api at {}", config.api_base_url);
    leptos::mount::mount_to_body(move || view! { <App config/> })
}
