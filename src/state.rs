//! Chat page state.
//!
//! One [`ChatState`] exists per chat page, owned by its
//! [`ChatController`](crate::controller::ChatController).  It is plain data
//! so the reducer in `update.rs` can be exercised without a browser.

use crate::markdown::RenderMode;
use crate::models::Project;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One rendered bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: u32,
    pub role: Role,
    pub text: String,
    pub mode: RenderMode,
    /// `HH:MM`, client-local.
    pub time: String,
    pub is_error: bool,
    /// The greeting appended when a project becomes active.
    pub is_greeting: bool,
}

impl ChatEntry {
    pub fn html(&self) -> String {
        crate::markdown::render(&self.text, self.mode)
    }
}

/// A file picked in the SBOM upload control.  `handle` is `None` only in
/// tests, where no real `File` exists.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub size: u64,
    pub handle: Option<web_sys::File>,
}

impl PartialEq for SelectedFile {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.size == other.size
    }
}

#[derive(Debug, Default)]
pub struct ChatState {
    pub active_project: Option<Project>,
    pub entries: Vec<ChatEntry>,
    /// Bumped whenever the view is reset; responses tagged with an older
    /// generation are dropped.
    pub generation: u32,
    /// Chat requests of the current generation still waiting for a reply.
    pub pending_replies: u32,
    pub upload_in_flight: bool,
    pub welcome_visible: bool,
    next_entry_id: u32,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            welcome_visible: true,
            ..Self::default()
        }
    }

    pub fn active_project_id(&self) -> Option<&str> {
        self.active_project.as_ref().map(|p| p.id.as_str())
    }

    pub fn typing_visible(&self) -> bool {
        self.pending_replies > 0
    }

    /// Drop every bubble and invalidate in-flight responses.
    pub fn reset_view(&mut self, welcome_visible: bool) {
        self.entries.clear();
        self.generation = self.generation.wrapping_add(1);
        self.pending_replies = 0;
        self.upload_in_flight = false;
        self.welcome_visible = welcome_visible;
    }

    pub fn push_entry(&mut self, role: Role, text: impl Into<String>, mode: RenderMode) -> ChatEntry {
        self.next_entry_id += 1;
        let entry = ChatEntry {
            id: self.next_entry_id,
            role,
            text: text.into(),
            mode,
            time: crate::utils::now_clock_label(),
            is_error: false,
            is_greeting: false,
        };
        self.entries.push(entry.clone());
        entry
    }

    pub fn push_error(&mut self, text: impl Into<String>) -> ChatEntry {
        let mut entry = self.push_entry(Role::Bot, text, RenderMode::PlainEscaped);
        entry.is_error = true;
        if let Some(last) = self.entries.last_mut() {
            last.is_error = true;
        }
        entry
    }

    pub fn push_greeting(&mut self, text: impl Into<String>) -> ChatEntry {
        let mut entry = self.push_entry(Role::Bot, text, RenderMode::TrustedMarkdown);
        entry.is_greeting = true;
        if let Some(last) = self.entries.last_mut() {
            last.is_greeting = true;
        }
        entry
    }

    pub fn greeting_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_greeting).count()
    }
}
