pub mod chat_view;
pub mod project_sidebar;

// Re-export commonly used items
pub use chat_view::ChatView;
pub use project_sidebar::ProjectSidebar;
