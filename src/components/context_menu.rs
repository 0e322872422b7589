use crate::app::CanvasCtx;
use crate::controller::MenuAction;
use leptos::prelude::*;

#[component]
pub fn CanvasMenu() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    move || {
        let (left, top) = ctx.with(|c| c.context_menu().map(|m| (m.screen_x, m.screen_y)))?;
        let (can_undo, can_redo) = ctx.with(|c| (c.can_undo(), c.can_redo()));

        let items = MenuAction::ALL
            .into_iter()
            .map(|action| {
                let disabled = match action {
                    MenuAction::Undo => !can_undo,
                    MenuAction::Redo => !can_redo,
                    _ => false,
                };
                view! {
                    <button
                        disabled=disabled
                        style="display: block; width: 100%; padding: 6px 14px; text-align: left; \
                               background: none; border: none; font: 13px sans-serif; cursor: pointer;"
                        on:pointerdown=|ev| ev.stop_propagation()
                        on:click=move |_| ctx.run(ctx.update(|c| c.menu_action(action)))
                    >
                        {action.label()}
                    </button>
                }
            })
            .collect_view();

        Some(view! {
            <div
                style=format!(
                    "position: absolute; left: {}px; top: {}px; min-width: 160px; padding: 4px 0; \
                     background: #FFFFFF; border: 1px solid #E5E7EB; border-radius: 6px; \
                     box-shadow: 0 4px 12px rgba(0,0,0,0.15); z-index: 100;",
                    left, top
                )
                on:contextmenu=|ev| ev.prevent_default()
            >
                {items}
            </div>
        })
    }
}
