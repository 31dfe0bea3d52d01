//! Placeholder row shown while data loads.

use yew::prelude::*;

/// Skeleton row component.
#[function_component(Skeleton)]
pub fn skeleton() -> Html {
    html! {
        <div class="skeleton skeleton-row"></div>
    }
}
