use crate::canvas::{get_canvas_context, render_nodes, CanvasMeasure};
use crate::components::{AiAssistant, CanvasMenu, NodeEditor, NodeList, Toolbar};
use crate::config::CanvasConfig;
use crate::controller::{
    Controller, KeyInput, PointerButton, PointerInput, PointerKind, ShellCommand, LONG_PRESS_MS,
};
use crate::export;
use crate::gateway::GatewayClient;
use crate::listeners::GestureListeners;
use crate::measure::{MonospaceMeasure, TextMeasure};
use crate::persist::{BrowserStorage, Persistence};
use crate::store::NodeStore;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::HtmlCanvasElement;

/// Shared handle to the controller and the panel toggles around it.
///
/// The controller is not reactive itself; every mutation through
/// [`CanvasCtx::update`] bumps `revision`, which is what views track.
#[derive(Clone, Copy)]
pub struct CanvasCtx {
    controller: StoredValue<Controller, LocalStorage>,
    gateway: StoredValue<GatewayClient, LocalStorage>,
    revision: RwSignal<u64>,
    pub show_ai: RwSignal<bool>,
    pub ai_target: RwSignal<Option<String>>,
    pub show_list: RwSignal<bool>,
    pub generating: RwSignal<usize>,
}

impl CanvasCtx {
    /// Reads the controller and subscribes the caller to changes.
    pub fn with<R: Default>(&self, f: impl FnOnce(&Controller) -> R) -> R {
        self.revision.track();
        self.controller.try_with_value(f).unwrap_or_default()
    }

    pub fn with_untracked<R: Default>(&self, f: impl FnOnce(&Controller) -> R) -> R {
        self.controller.try_with_value(f).unwrap_or_default()
    }

    /// Mutates the controller and schedules a redraw.
    pub fn update<R: Default>(&self, f: impl FnOnce(&mut Controller) -> R) -> R {
        let result = self.controller.try_update_value(f).unwrap_or_default();
        self.revision.update(|r| *r += 1);
        result
    }

    /// Mutates the controller without a redraw, for state no view shows.
    pub fn update_quiet<R: Default>(&self, f: impl FnOnce(&mut Controller) -> R) -> R {
        self.controller.try_update_value(f).unwrap_or_default()
    }

    pub fn gateway(&self) -> Option<GatewayClient> {
        self.gateway.try_get_value()
    }

    pub fn run(&self, command: Option<ShellCommand>) {
        match command {
            Some(ShellCommand::ToggleAi { target }) => {
                self.ai_target.set(target);
                self.show_ai.update(|open| *open = !*open);
            }
            Some(ShellCommand::ToggleNodeList) => self.show_list.update(|open| *open = !*open),
            Some(ShellCommand::DownloadJson(json)) => {
                if let Err(e) = export::download_json(&json) {
                    log::error!("json download failed: {}", e);
                }
            }
            Some(ShellCommand::ExportImage) => {
                let result = self.with_untracked(|c| {
                    let viewport = c.viewport();
                    Some(export::export_image(
                        c.nodes(),
                        viewport.width,
                        viewport.height,
                        c.font(),
                    ))
                });
                if let Some(Err(e)) = result {
                    log::error!("image export failed: {}", e);
                }
            }
            None => {}
        }
    }

    /// Sends `prompt` to the gateway and feeds the answer back in. With a
    /// `target` the node is rewritten, otherwise a new node is created.
    pub fn generate(&self, prompt: &str, target: Option<String>) -> Result<(), String> {
        let ticket = self
            .update_quiet(|c| Some(c.start_generation(prompt, target.as_deref())))
            .ok_or_else(|| "canvas unavailable".to_string())?
            .map_err(|e| e.to_string())?;
        let Some(client) = self.gateway() else {
            return Err("canvas unavailable".to_string());
        };

        let ctx = *self;
        ctx.generating.update(|n| *n += 1);
        ctx.revision.update(|r| *r += 1);
        spawn_local(async move {
            let result = client.generate(&ticket.prompt).await;
            ctx.update(|c| c.finish_generation(&ticket, result));
            ctx.generating.update(|n| *n = n.saturating_sub(1));
        });
        Ok(())
    }

    /// Centres node `id` and highlights it for a couple of seconds.
    pub fn focus(&self, id: &str) {
        if let Some(serial) = self.update(|c| c.focus_node(id)) {
            let ctx = *self;
            spawn_local(async move {
                TimeoutFuture::new(crate::controller::HIGHLIGHT_MS).await;
                ctx.update(|c| c.clear_highlight(serial));
            });
        }
    }
}

fn build_controller(config: CanvasConfig) -> Controller {
    let persistence = Persistence::new(Box::new(BrowserStorage), config.storage_key.clone());
    let store = NodeStore::open(persistence);
    let measure: Box<dyn TextMeasure> = match CanvasMeasure::detached() {
        Ok(measure) => Box::new(measure),
        Err(e) => {
            log::warn!("canvas text metrics unavailable, using estimates: {:?}", e);
            Box::new(MonospaceMeasure::default())
        }
    };
    let mut controller = Controller::new(store, config, measure);
    let has_touch = web_sys::window()
        .map(|w| w.navigator().max_touch_points() > 0)
        .unwrap_or(false);
    controller.set_touch_mode(has_touch);
    controller
}

fn local_point(canvas: &HtmlCanvasElement, ev: &web_sys::MouseEvent) -> (f64, f64) {
    let rect = canvas.get_bounding_client_rect();
    (
        ev.client_x() as f64 - rect.left(),
        ev.client_y() as f64 - rect.top(),
    )
}

fn pointer_input(canvas: &HtmlCanvasElement, ev: &web_sys::PointerEvent) -> PointerInput {
    let (x, y) = local_point(canvas, ev);
    let kind = match ev.pointer_type().as_str() {
        "touch" => PointerKind::Touch,
        "pen" => PointerKind::Pen,
        _ => PointerKind::Mouse,
    };
    let button = match ev.button() {
        0 => PointerButton::Primary,
        2 => PointerButton::Secondary,
        _ => PointerButton::Other,
    };
    PointerInput { x, y, button, kind }
}

fn focus_in_text_field() -> bool {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .map(|el| matches!(el.tag_name().as_str(), "TEXTAREA" | "INPUT"))
        .unwrap_or(false)
}

#[component]
pub fn App(config: CanvasConfig) -> impl IntoView {
    let api_base_url = config.api_base_url.clone();
    let ctx = CanvasCtx {
        controller: StoredValue::new_local(build_controller(config)),
        gateway: StoredValue::new_local(GatewayClient::new(api_base_url)),
        revision: RwSignal::new(0),
        show_ai: RwSignal::new(false),
        ai_target: RwSignal::new(None),
        show_list: RwSignal::new(false),
        generating: RwSignal::new(0),
    };
    provide_context(ctx);

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let gesture: StoredValue<Option<GestureListeners>, LocalStorage> = StoredValue::new_local(None);

    Effect::new(move || {
        ctx.revision.track();
        if let Some(canvas) = canvas_ref.get() {
            let canvas_el: &HtmlCanvasElement = &canvas;

            let rect = canvas_el.get_bounding_client_rect();
            let display_width = rect.width() as u32;
            let display_height = rect.height() as u32;

            if canvas_el.width() != display_width {
                canvas_el.set_width(display_width);
            }
            if canvas_el.height() != display_height {
                canvas_el.set_height(display_height);
            }
            let (width, height) = (display_width as f64, display_height as f64);
            ctx.update_quiet(|c| c.set_viewport_size(width, height));

            if let Ok(context) = get_canvas_context(canvas_el) {
                ctx.with_untracked(|c| {
                    render_nodes(
                        &context,
                        width,
                        height,
                        c.nodes(),
                        &c.viewport(),
                        &c.render_state(),
                        c.font(),
                    )
                });
            }
        }
    });

    let _resize = window_event_listener(leptos::ev::resize, move |_| {
        ctx.revision.update(|r| *r += 1);
    });
    let _keys = window_event_listener(leptos::ev::keydown, move |ev| {
        let input = KeyInput {
            key: ev.key(),
            ctrl: ev.ctrl_key(),
            meta: ev.meta_key(),
            shift: ev.shift_key(),
            in_text_input: focus_in_text_field(),
        };
        if ctx.update(|c| c.key_down(&input)) {
            ev.prevent_default();
        }
    });
    let end_gesture = move || {
        // Runs inside one of the guard's own handlers, so drop it later.
        spawn_local(async move {
            gesture.set_value(None);
        });
    };

    let on_pointer_down = move |ev: web_sys::PointerEvent| {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let input = pointer_input(&canvas, &ev);
        let result = ctx.update(|c| c.pointer_down(input));

        if let Some(serial) = result.long_press {
            spawn_local(async move {
                TimeoutFuture::new(LONG_PRESS_MS).await;
                ctx.update(|c| c.long_press_elapsed(serial));
            });
        }
        if !result.capture && result.long_press.is_none() {
            return;
        }
        if result.capture {
            ev.prevent_default();
        }

        let canvas_for_move = canvas.clone();
        let canvas_for_up = canvas.clone();
        let listeners = GestureListeners::on_window()
            .and_then(|l| {
                l.listen("pointermove", move |ev| {
                    let input = pointer_input(&canvas_for_move, &ev);
                    if ctx.update_quiet(|c| c.pointer_move(input)) {
                        ctx.revision.update(|r| *r += 1);
                    }
                })
            })
            .and_then(|l| {
                l.listen("pointerup", move |ev| {
                    let input = pointer_input(&canvas_for_up, &ev);
                    ctx.update(|c| c.pointer_up(input));
                    end_gesture();
                })
            })
            .and_then(|l| {
                l.listen("pointercancel", move |_| {
                    ctx.update(|c| c.pointer_cancel());
                    end_gesture();
                })
            });
        match listeners {
            Ok(listeners) => gesture.set_value(Some(listeners)),
            Err(e) => {
                log::warn!("could not track gesture: {:?}", e);
                ctx.update(|c| c.pointer_cancel());
            }
        }
    };

    let on_context_menu = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        if let Some(canvas) = canvas_ref.get() {
            let (x, y) = local_point(&canvas, &ev);
            ctx.update(|c| c.open_context_menu(x, y));
        }
    };

    let on_double_click = move |ev: web_sys::MouseEvent| {
        if let Some(canvas) = canvas_ref.get() {
            let (x, y) = local_point(&canvas, &ev);
            ctx.update(|c| c.double_click(x, y));
        }
    };

    let on_wheel = move |ev: web_sys::WheelEvent| {
        ev.prevent_default();
        let (dx, dy) = (ev.delta_x(), ev.delta_y());
        ctx.update(|c| c.scroll_by(dx, dy));
    };

    view! {
        <div style="position: fixed; inset: 0; overflow: hidden; background: #F9FAFB;">
            <canvas
                node_ref=canvas_ref
                tabindex="0"
                style="width: 100%; height: 100%; display: block; outline: none; touch-action: none;"
                on:pointerdown=on_pointer_down
                on:contextmenu=on_context_menu
                on:dblclick=on_double_click
                on:wheel=on_wheel
            />
            <NodeEditor/>
            <CanvasMenu/>
            <Toolbar/>
            <NodeList/>
            <AiAssistant/>
        </div>
    }
}
