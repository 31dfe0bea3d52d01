//! Study set list item component.

#[cfg(target_arch = "wasm32")]
use chrono::FixedOffset;
use study_types::StudySet;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;

/// Properties for StudySetItem component.
#[derive(Properties, PartialEq)]
pub struct StudySetItemProps {
    pub study_set: StudySet,
    /// Whether the current page is this set's detail page
    #[prop_or_default]
    pub active: bool,
}

/// Sidebar link to one study set.
#[function_component(StudySetItem)]
pub fn study_set_item(props: &StudySetItemProps) -> Html {
    let study_set = &props.study_set;

    html! {
        <Link<Route>
            to={Route::StudySet { id: study_set.id }}
            classes={classes!("study-set-link", props.active.then_some("active"))}
        >
            <div class="study-set-name">{ study_set.display_name() }</div>
            <div class="study-set-date">{ local_date_label(study_set) }</div>
        </Link<Route>>
    }
}

/// Creation date in the viewer's time zone.
///
/// Outside the browser there is no viewer, so the store's offset is used.
fn local_date_label(study_set: &StudySet) -> String {
    #[cfg(target_arch = "wasm32")]
    {
        let date = js_sys::Date::new(&study_set.created_at.as_str().into());
        // Minutes behind UTC; NaN for unparseable input.
        let minutes = date.get_timezone_offset();
        if minutes.is_finite() {
            if let Some(offset) = FixedOffset::west_opt((minutes * 60.0) as i32) {
                return study_set.created_label_at(offset);
            }
        }
    }

    study_set.created_label()
}
