use crate::app::CanvasCtx;
use leptos::prelude::*;

/// Screen-space frame of the node being edited.
#[derive(Clone, Debug, PartialEq)]
struct EditorFrame {
    id: String,
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    color: String,
}

#[component]
pub fn NodeEditor() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    // Only re-mount the textarea when the edited node or its frame changes,
    // never on keystrokes.
    let frame = Memo::new(move |_| {
        ctx.with(|c| {
            let session = c.edit_session()?;
            let node = c.store().get(&session.id)?;
            let (left, top) = c.viewport().world_to_screen(node.x, node.y);
            Some(EditorFrame {
                id: node.id.clone(),
                left,
                top,
                width: node.width,
                height: node.height,
                color: node.color.clone(),
            })
        })
    });

    move || {
        let frame = frame.get()?;
        let textarea_ref = NodeRef::<leptos::html::Textarea>::new();
        let initial_text = ctx
            .with_untracked(|c| c.edit_session().map(|s| s.draft.clone()))
            .unwrap_or_default();
        let font = ctx.with_untracked(|c| c.font().clone());

        Effect::new(move || {
            if let Some(textarea) = textarea_ref.get() {
                let _ = textarea.focus();
                textarea.select();
            }
        });

        let on_input = move |ev: web_sys::Event| {
            let text = event_target_value(&ev);
            ctx.update_quiet(|c| c.edit_input(&text));
        };

        let on_keydown = move |ev: web_sys::KeyboardEvent| match ev.key().as_str() {
            "Enter" if !ev.shift_key() => {
                ev.prevent_default();
                ctx.update(|c| c.commit_edit());
            }
            "Escape" => {
                ev.prevent_default();
                ev.stop_propagation();
                ctx.update(|c| c.cancel_edit());
            }
            _ => {}
        };

        let on_blur = move |_: web_sys::FocusEvent| {
            ctx.update(|c| c.commit_edit());
        };

        Some(view! {
            <textarea
                node_ref=textarea_ref
                data-node-id=frame.id.clone()
                style=format!(
                    "position: absolute; left: {}px; top: {}px; width: {}px; min-height: {}px; \
                     font: {}; line-height: {}px; padding: 10px 12px; box-sizing: border-box; \
                     background: {}; color: #FFFFFF; border: 2px solid #111827; \
                     border-radius: 8px; outline: none; resize: none;",
                    frame.left, frame.top, frame.width, frame.height,
                    font.css(), font.line_height, frame.color
                )
                on:input=on_input
                on:keydown=on_keydown
                on:blur=on_blur
            >{initial_text}</textarea>
        })
    }
}
