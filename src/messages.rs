// frontend/src/messages.rs
//
// Events the chat page reacts to, and the side effects the reducer asks for.
//
use crate::error::ClientError;
use crate::markdown::RenderMode;
use crate::models::{ChatReply, ChatRequest, Project, SbomUploadReply};
use crate::state::{ChatEntry, SelectedFile};
use crate::toast::AlertKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    // Project slot
    SelectProject(Project),              // Sidebar row clicked
    ProjectDeleted(String),              // Sidebar delete succeeded (project id)

    // Conversation
    SubmitMessage(String),               // Raw input text (not yet trimmed)
    ChatReplyReceived {
        generation: u32,
        result: Result<ChatReply, ClientError>,
    },
    RevealBotText {                      // Fired after the cosmetic reply delay
        generation: u32,
        text: String,
        mode: RenderMode,
        is_error: bool,
    },

    // SBOM upload
    SbomFileChosen(SelectedFile),
    SbomUploadFinished {
        generation: u32,
        result: Result<SbomUploadReply, ClientError>,
    },
}

/// Commands represent side effects that should be executed after state updates.
/// This separates pure state changes from effects like DOM writes and API calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Chain another message after `delay_ms`
    SendMessageAfter { delay_ms: u32, message: Box<Message> },

    // ----- view -----
    /// Remove every bubble; show or hide the welcome banner
    ResetView { welcome_visible: bool },
    /// Enable / disable the composer and toggle the upload control
    ApplyInputState { enabled: bool, placeholder: &'static str },
    /// Header line naming the active project (`None` = nothing selected)
    ShowProjectInfo(Option<String>),
    /// Move the sidebar `active` class
    HighlightProject(Option<String>),
    AppendEntry(ChatEntry),
    ClearInput,
    SetTyping(bool),
    ShowUploadProgress { generation: u32 },
    HideUploadProgress,
    ResetFileInput,
    ShowToast { message: String, kind: AlertKind },

    // ----- network -----
    PostChatMessage { generation: u32, request: ChatRequest },
    UploadSbom {
        generation: u32,
        file: SelectedFile,
        fields: Vec<(&'static str, String)>,
    },

    // ----- navigation -----
    /// Clear session storage and navigate to the login page after the delay
    RedirectToLogin { delay_ms: u32 },
}

impl Command {
    /// Helper to create a toast command
    pub fn toast(message: impl Into<String>, kind: AlertKind) -> Self {
        Command::ShowToast {
            message: message.into(),
            kind,
        }
    }

    /// Helper to schedule a follow-up message
    pub fn after(delay_ms: u32, message: Message) -> Self {
        Command::SendMessageAfter {
            delay_ms,
            message: Box::new(message),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Command::PostChatMessage { .. } | Command::UploadSbom { .. })
    }
}
