//! Main application component with routing.

use yew::prelude::*;
use yew_router::prelude::*;

use crate::pages::PlaceholderPage;
use crate::sidebar::Sidebar;

/// Application routes.
#[derive(Debug, Clone, Routable, PartialEq)]
pub enum Route {
    #[at("/")]
    Home,
    #[at("/categories")]
    Categories,
    #[at("/study-set/:id")]
    StudySet { id: i64 },
    #[at("/stats")]
    Stats,
    #[at("/create-study-set")]
    CreateStudySet,
    #[not_found]
    #[at("/404")]
    NotFound,
}

/// Route switch function.
fn switch(routes: Route) -> Html {
    match routes {
        Route::Home => html! {
            <PlaceholderPage
                title="Study Sets"
                description="Pick a study set from the sidebar, or create a new one."
            />
        },
        Route::Categories => html! { <PlaceholderPage title="Browse Categories" /> },
        Route::StudySet { id } => html! {
            <PlaceholderPage title={format!("Study Set #{}", id)} />
        },
        Route::Stats => html! { <PlaceholderPage title="Stats" /> },
        Route::CreateStudySet => html! { <PlaceholderPage title="Create New Set" /> },
        Route::NotFound => html! {
            <div class="card">
                <h1>{"404 - Page Not Found"}</h1>
                <p>{"The page you're looking for doesn't exist."}</p>
            </div>
        },
    }
}

/// Main application component.
#[function_component(App)]
pub fn app() -> Html {
    html! {
        <BrowserRouter>
            <div class="app-container">
                <Sidebar />
                <main class="main-content">
                    <Switch<Route> render={switch} />
                </main>
            </div>
        </BrowserRouter>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Home.to_path(), "/");
        assert_eq!(Route::Categories.to_path(), "/categories");
        assert_eq!(Route::StudySet { id: 42 }.to_path(), "/study-set/42");
        assert_eq!(Route::Stats.to_path(), "/stats");
        assert_eq!(Route::CreateStudySet.to_path(), "/create-study-set");
    }

    #[test]
    fn test_study_set_route_parses_id() {
        assert_eq!(
            Route::recognize("/study-set/17"),
            Some(Route::StudySet { id: 17 })
        );
        assert_eq!(Route::recognize("/nowhere"), Some(Route::NotFound));
    }
}
