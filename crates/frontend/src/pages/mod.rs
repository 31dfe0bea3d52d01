//! Page components.

mod placeholder;

pub use placeholder::PlaceholderPage;
