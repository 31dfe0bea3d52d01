//! Sidebar rendering.

use std::rc::Rc;

use study_types::StudySet;
use yew::prelude::*;
use yew_router::prelude::*;

use crate::app::Route;
use crate::components::{Skeleton, StudySetItem};

/// Skeleton rows shown while loading.
const SKELETON_ROWS: usize = 3;

/// Properties for SidebarView.
#[derive(Properties, PartialEq)]
pub struct SidebarViewProps {
    /// Study sets in display order
    pub study_sets: Rc<Vec<StudySet>>,
    pub loading: bool,
    /// Path of the current page, for active-link highlighting
    pub current_path: AttrValue,
    /// "Create New Set" was clicked
    pub on_create: Callback<()>,
}

/// Stateless sidebar markup.
#[function_component(SidebarView)]
pub fn sidebar_view(props: &SidebarViewProps) -> Html {
    let is_active = |route: &Route| props.current_path.as_str() == route.to_path();

    let categories_class = classes!(
        "nav-link",
        is_active(&Route::Categories).then_some("active")
    );

    let on_create = props.on_create.reform(|_: MouseEvent| ());

    html! {
        <aside class="sidebar">
            <div class="sidebar-section">
                <Link<Route> to={Route::Home} classes="nav-brand">
                    <img
                        src="/study-sets-logo.png"
                        alt="Study Sets Logo"
                        width="32"
                        height="32"
                        class="brand-logo"
                    />
                    <h2>{"Study Sets"}</h2>
                </Link<Route>>
            </div>

            <div class="sidebar-section">
                <Link<Route> to={Route::Categories} classes={categories_class}>
                    {"Browse Categories"}
                </Link<Route>>
            </div>

            <nav class="study-set-list">
                if props.loading {
                    <div class="skeleton-list">
                        { for (0..SKELETON_ROWS).map(|_| html! { <Skeleton /> }) }
                    </div>
                } else if props.study_sets.is_empty() {
                    <div class="empty-state">
                        <p>{"No study sets yet"}</p>
                        <p class="text-secondary">{"Create your first one!"}</p>
                    </div>
                } else {
                    { for props.study_sets.iter().map(|study_set| {
                        let active = is_active(&Route::StudySet { id: study_set.id });
                        html! {
                            <StudySetItem
                                key={study_set.id}
                                study_set={study_set.clone()}
                                {active}
                            />
                        }
                    })}
                }
            </nav>

            <div class="sidebar-footer">
                <Link<Route> to={Route::Stats} classes="btn btn-secondary">
                    {"View Stats"}
                </Link<Route>>
                <button class="btn btn-outline" onclick={on_create}>
                    {"Create New Set"}
                </button>
            </div>
        </aside>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yew::ServerRenderer;
    use yew_router::Router;
    use yew_router::history::{AnyHistory, MemoryHistory};

    #[derive(Properties, PartialEq, Clone)]
    struct HarnessProps {
        study_sets: Vec<StudySet>,
        loading: bool,
        path: String,
    }

    #[function_component(Harness)]
    fn harness(props: &HarnessProps) -> Html {
        let history = AnyHistory::from(MemoryHistory::new());

        html! {
            <Router {history}>
                <SidebarView
                    study_sets={Rc::new(props.study_sets.clone())}
                    loading={props.loading}
                    current_path={props.path.clone()}
                    on_create={Callback::noop()}
                />
            </Router>
        }
    }

    async fn render(study_sets: Vec<StudySet>, loading: bool, path: &str) -> String {
        let path = path.to_string();
        ServerRenderer::<Harness>::with_props(move || HarnessProps {
            study_sets,
            loading,
            path,
        })
        .hydratable(false)
        .render()
        .await
    }

    /// Opening tags of every rendered link.
    fn anchors(html: &str) -> Vec<&str> {
        html.split("<a ")
            .skip(1)
            .map(|rest| rest.split('>').next().unwrap_or_default())
            .collect()
    }

    fn study_set_anchors(html: &str) -> Vec<&str> {
        anchors(html)
            .into_iter()
            .filter(|tag| tag.contains("href=\"/study-set/"))
            .collect()
    }

    fn sample_sets() -> Vec<StudySet> {
        vec![
            StudySet::new(3, "2024-03-07T09:00:00+00:00", Some("Zoology".to_string())),
            StudySet::new(2, "2024-03-06T09:00:00+00:00", None),
            StudySet::new(1, "2024-03-05T09:00:00+00:00", Some(String::new())),
        ]
    }

    #[tokio::test]
    async fn test_loading_renders_skeleton_rows() {
        let html = render(sample_sets(), true, "/").await;

        assert_eq!(html.matches("skeleton skeleton-row").count(), SKELETON_ROWS);
        assert!(study_set_anchors(&html).is_empty());
        assert!(!html.contains("No study sets yet"));
    }

    #[tokio::test]
    async fn test_empty_list_renders_empty_state() {
        let html = render(Vec::new(), false, "/").await;

        assert!(html.contains("No study sets yet"));
        assert!(html.contains("Create your first one!"));
        assert!(!html.contains("skeleton-row"));
        assert!(study_set_anchors(&html).is_empty());
    }

    #[tokio::test]
    async fn test_renders_one_link_per_study_set() {
        let html = render(sample_sets(), false, "/").await;
        let links = study_set_anchors(&html);

        assert_eq!(links.len(), 3);
        assert!(html.contains("Zoology"));
        assert!(html.contains("Study Set #2"));
        assert!(html.contains("Study Set #1"));
        assert!(html.contains("3/7/2024"));
        assert!(!html.contains("No study sets yet"));
    }

    #[tokio::test]
    async fn test_preserves_received_order() {
        let html = render(sample_sets(), false, "/").await;
        let links = study_set_anchors(&html);

        assert!(links[0].contains("href=\"/study-set/3\""));
        assert!(links[1].contains("href=\"/study-set/2\""));
        assert!(links[2].contains("href=\"/study-set/1\""));

        let zoology = html.find("Zoology").unwrap();
        let second = html.find("Study Set #2").unwrap();
        assert!(zoology < second);
    }

    #[tokio::test]
    async fn test_only_current_study_set_is_active() {
        let html = render(sample_sets(), false, "/study-set/2").await;
        let active: Vec<&str> = anchors(&html)
            .into_iter()
            .filter(|tag| tag.contains("active"))
            .collect();

        assert_eq!(active.len(), 1);
        assert!(active[0].contains("href=\"/study-set/2\""));
    }

    #[tokio::test]
    async fn test_categories_link_active_on_categories_page() {
        let html = render(sample_sets(), false, "/categories").await;
        let active: Vec<&str> = anchors(&html)
            .into_iter()
            .filter(|tag| tag.contains("active"))
            .collect();

        assert_eq!(active.len(), 1);
        assert!(active[0].contains("href=\"/categories\""));
    }

    #[tokio::test]
    async fn test_navigation_links_present() {
        let html = render(Vec::new(), false, "/").await;
        let links = anchors(&html);

        assert!(links.iter().any(|tag| tag.contains("href=\"/\"")));
        assert!(links.iter().any(|tag| tag.contains("href=\"/categories\"")));
        assert!(links.iter().any(|tag| tag.contains("href=\"/stats\"")));
        assert!(html.contains("Create New Set"));
        assert!(html.contains("alt=\"Study Sets Logo\""));
    }
}
