use crate::app::CanvasCtx;
use crate::components::node_label;
use leptos::prelude::*;

const NODE_SUGGESTIONS: [&str; 4] = [
    "Make this more detailed",
    "Summarize this content",
    "Make it more professional",
    "Add creative elements",
];

const CANVAS_SUGGESTIONS: [&str; 4] = [
    "Create a project plan",
    "Generate a brainstorm list",
    "Write a meeting agenda",
    "Create a task breakdown",
];

/// Quick prompts offered in the panel, depending on whether a node is
/// being rewritten.
pub fn suggestions(has_target: bool) -> &'static [&'static str] {
    if has_target {
        &NODE_SUGGESTIONS
    } else {
        &CANVAS_SUGGESTIONS
    }
}

#[component]
pub fn AiAssistant() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();
    let (prompt, set_prompt) = signal(String::new());
    let (error, set_error) = signal(Option::<String>::None);

    let submit = move || {
        let text = prompt.get_untracked();
        match ctx.generate(&text, ctx.ai_target.get_untracked()) {
            Ok(()) => {
                set_prompt.set(String::new());
                set_error.set(None);
                ctx.show_ai.set(false);
            }
            Err(e) => set_error.set(Some(e)),
        }
    };

    move || {
        if !ctx.show_ai.get() {
            return None;
        }
        let target = ctx.ai_target.get();
        let heading = match &target {
            Some(id) => ctx
                .with(|c| c.store().get(id).map(node_label))
                .map(|label| format!("Rewrite “{}”", label))
                .unwrap_or_else(|| "Generate a new node".to_string()),
            None => "Generate a new node".to_string(),
        };

        let chips = suggestions(target.is_some())
            .iter()
            .map(|&text| {
                view! {
                    <button
                        style="padding: 4px 10px; border: 1px solid #D1D5DB; border-radius: 12px; \
                               background: #F9FAFB; font: 12px sans-serif; cursor: pointer;"
                        on:click=move |_| set_prompt.set(text.to_string())
                    >
                        {text}
                    </button>
                }
            })
            .collect_view();

        Some(view! {
            <div style="position: absolute; bottom: 16px; left: 50%; transform: translateX(-50%); \
                        width: min(480px, 92vw); padding: 12px; background: #FFFFFF; \
                        border: 1px solid #E5E7EB; border-radius: 10px; \
                        box-shadow: 0 8px 24px rgba(0,0,0,0.15); z-index: 60; font: 13px sans-serif;">
                <div style="display: flex; justify-content: space-between; margin-bottom: 8px; font-weight: bold;">
                    {heading}
                    <button
                        style="background: none; border: none; cursor: pointer;"
                        on:click=move |_| ctx.show_ai.set(false)
                    >
                        "×"
                    </button>
                </div>
                <textarea
                    rows="3"
                    placeholder="Ask the AI to write something…"
                    style="width: 100%; box-sizing: border-box; resize: vertical; padding: 6px; \
                           border: 1px solid #D1D5DB; border-radius: 6px; font: inherit;"
                    prop:value=move || prompt.get()
                    on:input=move |ev| set_prompt.set(event_target_value(&ev))
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Enter" && (ev.ctrl_key() || ev.meta_key()) {
                            ev.prevent_default();
                            submit();
                        }
                    }
                />
                <div style="display: flex; flex-wrap: wrap; gap: 6px; margin: 8px 0;">{chips}</div>
                {move || error.get().map(|e| view! {
                    <p style="color: #DC2626; margin: 4px 0;">{e}</p>
                })}
                <div style="display: flex; justify-content: space-between; align-items: center;">
                    <span style="color: #6B7280;">
                        {move || {
                            let n = ctx.generating.get();
                            (n > 0).then(|| format!("Generating {}…", n))
                        }}
                    </span>
                    <button
                        style="padding: 6px 14px; background: #3B82F6; color: #FFFFFF; border: none; \
                               border-radius: 6px; cursor: pointer;"
                        on:click=move |_| submit()
                    >
                        "Generate"
                    </button>
                </div>
            </div>
        })
    }
}
