//! Reusable UI components.

mod skeleton;
mod study_set_item;

pub use skeleton::Skeleton;
pub use study_set_item::StudySetItem;
