use crate::app::CanvasCtx;
use crate::controller::MenuAction;
use leptos::prelude::*;

const TOOLBAR_ACTIONS: [MenuAction; 7] = [
    MenuAction::AddNodeHere,
    MenuAction::ToggleAi,
    MenuAction::Undo,
    MenuAction::Redo,
    MenuAction::ExportJson,
    MenuAction::ExportImage,
    MenuAction::ToggleNodeList,
];

fn toolbar_label(action: MenuAction) -> &'static str {
    match action {
        MenuAction::AddNodeHere => "+ Node",
        MenuAction::ToggleAi => "AI",
        other => other.label(),
    }
}

#[component]
pub fn Toolbar() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    let buttons = TOOLBAR_ACTIONS
        .into_iter()
        .map(|action| {
            let disabled = move || match action {
                MenuAction::Undo => !ctx.with(|c| c.can_undo()),
                MenuAction::Redo => !ctx.with(|c| c.can_redo()),
                _ => false,
            };
            view! {
                <button
                    disabled=disabled
                    style="padding: 6px 10px; background: #FFFFFF; border: 1px solid #D1D5DB; \
                           border-radius: 6px; font: 13px sans-serif; cursor: pointer;"
                    on:click=move |_| {
                        // Toolbar actions never use a menu position.
                        ctx.update(|c| c.close_context_menu());
                        ctx.run(ctx.update(|c| c.menu_action(action)));
                    }
                >
                    {toolbar_label(action)}
                </button>
            }
        })
        .collect_view();

    view! {
        <nav style="position: absolute; top: 12px; left: 12px; display: flex; gap: 6px; \
                    align-items: center; z-index: 40;">
            {buttons}
            <span style="color: #6B7280; font: 12px sans-serif;">
                {move || (ctx.generating.get() > 0).then_some("Generating…")}
            </span>
        </nav>
    }
}
