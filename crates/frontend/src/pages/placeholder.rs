//! Stand-in page for routes whose content lives elsewhere.

use yew::prelude::*;

/// Properties for PlaceholderPage.
#[derive(Properties, PartialEq)]
pub struct PlaceholderPageProps {
    pub title: AttrValue,
    #[prop_or_default]
    pub description: Option<AttrValue>,
}

/// Titled card shown in the main content area.
#[function_component(PlaceholderPage)]
pub fn placeholder_page(props: &PlaceholderPageProps) -> Html {
    html! {
        <div class="card">
            <h1>{ props.title.to_string() }</h1>
            if let Some(description) = &props.description {
                <p class="text-secondary">{ description.to_string() }</p>
            }
        </div>
    }
}
