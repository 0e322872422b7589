use crate::app::CanvasCtx;
use crate::state::Node;
use leptos::prelude::*;

const LABEL_CHARS: usize = 20;

/// Sidebar label for a node: the start of its text, or a placeholder.
pub fn node_label(node: &Node) -> String {
    let text = node.text.trim();
    if text.is_empty() {
        return "Untitled Node".to_string();
    }
    let label: String = text.chars().take(LABEL_CHARS).collect();
    if text.chars().count() > LABEL_CHARS {
        format!("{}…", label)
    } else {
        label
    }
}

#[component]
pub fn NodeList() -> impl IntoView {
    let ctx = expect_context::<CanvasCtx>();

    move || {
        if !ctx.show_list.get() {
            return None;
        }
        let entries = ctx.with(|c| {
            c.nodes()
                .iter()
                .map(|n| (n.id.clone(), node_label(n), n.color.clone()))
                .collect::<Vec<_>>()
        });
        let empty = entries.is_empty();

        let rows = entries
            .into_iter()
            .map(|(id, label, color)| {
                view! {
                    <li
                        style="display: flex; align-items: center; gap: 8px; padding: 6px 12px; \
                               cursor: pointer; font: 13px sans-serif;"
                        on:click=move |_| ctx.focus(&id)
                    >
                        <span style=format!(
                            "width: 10px; height: 10px; border-radius: 50%; background: {};",
                            color
                        )/>
                        {label}
                    </li>
                }
            })
            .collect_view();

        Some(view! {
            <aside style="position: absolute; top: 56px; right: 12px; width: 240px; max-height: 70vh; \
                          overflow-y: auto; background: #FFFFFF; border: 1px solid #E5E7EB; \
                          border-radius: 8px; box-shadow: 0 4px 12px rgba(0,0,0,0.1); z-index: 50;">
                <div style="display: flex; justify-content: space-between; padding: 8px 12px; \
                            border-bottom: 1px solid #E5E7EB; font: bold 13px sans-serif;">
                    "Nodes"
                    <button
                        style="background: none; border: none; cursor: pointer;"
                        on:click=move |_| ctx.show_list.set(false)
                    >
                        "×"
                    </button>
                </div>
                {empty.then(|| view! {
                    <p style="padding: 8px 12px; color: #6B7280; font: 13px sans-serif;">
                        "No nodes yet"
                    </p>
                })}
                <ul style="list-style: none; margin: 0; padding: 4px 0;">{rows}</ul>
            </aside>
        })
    }
}
