//! Application signals.
//!
//! Parts of the app that change study sets announce it with a DOM
//! `CustomEvent` on `window`, independent of the database's own change
//! feed. Listeners get the event name only; the `detail` payload is
//! informational.

use gloo_events::EventListener;
use study_types::StudySet;
use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::{CustomEvent, CustomEventInit};

/// Errors from dispatching or listening for signals.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("No browser window available")]
    NoWindow,

    #[error("JavaScript error: {0}")]
    Js(String),

    #[error("Payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A study set change announced by the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppSignal {
    Created,
    Updated,
    Deleted,
}

impl AppSignal {
    /// Every signal, in a fixed order.
    pub const ALL: [AppSignal; 3] = [AppSignal::Created, AppSignal::Updated, AppSignal::Deleted];

    /// DOM event name carrying the signal.
    pub fn event_name(self) -> &'static str {
        match self {
            AppSignal::Created => "studySetCreated",
            AppSignal::Updated => "studySetUpdated",
            AppSignal::Deleted => "studySetDeleted",
        }
    }
}

/// Call `callback` whenever `signal` fires.
///
/// The listener is removed when the returned handle is dropped.
pub fn listen<F>(signal: AppSignal, callback: F) -> Result<EventListener, SignalError>
where
    F: Fn() + 'static,
{
    let window = web_sys::window().ok_or(SignalError::NoWindow)?;
    Ok(EventListener::new(&window, signal.event_name(), move |_| {
        callback()
    }))
}

/// Fire `signal` on `window`, attaching the study set as JSON when given.
pub fn dispatch(signal: AppSignal, study_set: Option<&StudySet>) -> Result<(), SignalError> {
    let window = web_sys::window().ok_or(SignalError::NoWindow)?;

    let init = CustomEventInit::new();
    if let Some(study_set) = study_set {
        init.set_detail(&JsValue::from_str(&detail_json(study_set)?));
    }

    let event =
        CustomEvent::new_with_event_init_dict(signal.event_name(), &init).map_err(js_error)?;
    window.dispatch_event(&event).map_err(js_error)?;
    Ok(())
}

/// Payload attached to a signal's `detail`.
pub fn detail_json(study_set: &StudySet) -> Result<String, SignalError> {
    Ok(serde_json::to_string(study_set)?)
}

fn js_error(value: JsValue) -> SignalError {
    SignalError::Js(format!("{:?}", value))
}
