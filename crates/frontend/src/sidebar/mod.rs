//! Sidebar navigation with a live list of study sets.
//!
//! The list is fetched on mount and re-fetched whenever the realtime feed
//! reports a change to the study sets table or another part of the app
//! fires one of the study set signals.

mod state;
mod view;

use state::{MountGuard, RefreshTrigger, Refresher, SidebarAction, SidebarState, run_fetch};
use view::SidebarView;

use gloo_events::EventListener;
use study_db::{ChangeFilter, Order, Subscription};
use study_types::{CREATED_AT, PUBLIC_SCHEMA, STUDY_SETS_TABLE, StudySet};
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;
use crate::diagnostics;
use crate::signals::{self, AppSignal};

/// Realtime channel the sidebar listens on.
const CHANNEL_NAME: &str = "study_sets_changes";

/// Read every study set, newest first.
async fn fetch_study_sets() -> study_db::Result<Vec<StudySet>> {
    study_db::shared()?
        .from(STUDY_SETS_TABLE)
        .select("*")
        .order(CREATED_AT, Order::Descending)
        .fetch()
        .await
}

/// Everything feeding the refresher for one mount.
///
/// Dropping it leaves the realtime channel and removes the signal listeners.
struct RefreshSources {
    _channel: Option<Subscription>,
    _listeners: Vec<EventListener>,
}

impl RefreshSources {
    fn attach(refresher: &Refresher) -> Self {
        let channel = study_db::shared().and_then(|client| {
            let refresher = refresher.clone();
            client
                .channel(CHANNEL_NAME)
                .on_postgres_changes(ChangeFilter::all(PUBLIC_SCHEMA, STUDY_SETS_TABLE))
                .subscribe(move |change| {
                    refresher.trigger(RefreshTrigger::DatabaseChange(change.change));
                })
        });
        let channel = match channel {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                diagnostics::error(&format!("Error subscribing to study set changes: {}", e));
                None
            }
        };

        let listeners = AppSignal::ALL
            .into_iter()
            .filter_map(|signal| {
                let refresher = refresher.clone();
                match signals::listen(signal, move || {
                    refresher.trigger(RefreshTrigger::Signal(signal));
                }) {
                    Ok(listener) => Some(listener),
                    Err(e) => {
                        diagnostics::error(&format!(
                            "Error listening for {}: {}",
                            signal.event_name(),
                            e
                        ));
                        None
                    }
                }
            })
            .collect();

        Self {
            _channel: channel,
            _listeners: listeners,
        }
    }
}

/// Sidebar navigation component.
#[function_component(Sidebar)]
pub fn sidebar() -> Html {
    let state = use_reducer(SidebarState::default);
    let navigator = use_navigator();
    let current_path = use_location()
        .map(|location| location.path().to_string())
        .unwrap_or_default();

    {
        let dispatcher = state.dispatcher();

        use_effect_with((), move |_| {
            let guard = MountGuard::new();

            let refresher = {
                let guard = guard.clone();
                Refresher::new(guard.clone(), move |trigger| {
                    dispatcher.dispatch(SidebarAction::FetchStarted(trigger));

                    let guard = guard.clone();
                    let dispatcher = dispatcher.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        run_fetch(
                            &guard,
                            |action| dispatcher.dispatch(action),
                            fetch_study_sets,
                        )
                        .await;
                    });
                })
            };

            refresher.trigger(RefreshTrigger::Mount);
            let sources = RefreshSources::attach(&refresher);

            move || {
                guard.release();
                drop(sources);
            }
        });
    }

    let on_create = Callback::from(move |_: ()| {
        if let Some(navigator) = &navigator {
            navigator.push(&Route::CreateStudySet);
        }
    });

    html! {
        <SidebarView
            study_sets={state.study_sets.clone()}
            loading={state.is_loading()}
            {current_path}
            {on_create}
        />
    }
}
