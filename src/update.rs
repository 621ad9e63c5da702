// frontend/src/update.rs
//
// Pure reducer for the chat page.  No DOM access here: every visible effect
// is pushed as a `Command` and carried out by `command_executors`.
//
use crate::constants::{
    CHAT_PLACEHOLDER_ACTIVE, CHAT_PLACEHOLDER_NO_PROJECT, NO_PROJECT_WARNING,
    REPLY_REVEAL_DELAY_MS, SESSION_EXPIRED_MESSAGE, SESSION_EXPIRED_REDIRECT_MS,
};
use crate::debug_log;
use crate::error::ClientError;
use crate::markdown::RenderMode;
use crate::messages::{Command, Message};
use crate::models::ChatRequest;
use crate::sbom::{format_sbom_summary, upload_fields, validate_sbom_file};
use crate::state::{ChatState, Role};
use crate::toast::AlertKind;

pub fn greeting_for(project_name: &str) -> String {
    format!(
        "¡Hola! Ahora estás trabajando en el proyecto **{}**. ¿En qué puedo ayudarte?",
        project_name
    )
}

pub fn update(state: &mut ChatState, msg: Message, cmds: &mut Vec<Command>) {
    match msg {
        Message::SelectProject(project) => {
            debug_log!("selecting project {} ({})", project.name, project.id);
            state.reset_view(false);
            cmds.push(Command::ResetView { welcome_visible: false });
            cmds.push(Command::SetTyping(false));
            cmds.push(Command::HideUploadProgress);
            cmds.push(Command::HighlightProject(Some(project.id.clone())));
            cmds.push(Command::ShowProjectInfo(Some(project.name.clone())));
            cmds.push(Command::ApplyInputState {
                enabled: true,
                placeholder: CHAT_PLACEHOLDER_ACTIVE,
            });

            let greeting = state.push_greeting(greeting_for(&project.name));
            state.active_project = Some(project);
            cmds.push(Command::AppendEntry(greeting));
        }

        Message::ProjectDeleted(project_id) => {
            if state.active_project_id() != Some(project_id.as_str()) {
                return;
            }
            debug_log!("active project {} deleted, resetting chat", project_id);
            state.active_project = None;
            state.reset_view(true);
            cmds.push(Command::ResetView { welcome_visible: true });
            cmds.push(Command::SetTyping(false));
            cmds.push(Command::HideUploadProgress);
            cmds.push(Command::HighlightProject(None));
            cmds.push(Command::ShowProjectInfo(None));
            cmds.push(Command::ApplyInputState {
                enabled: false,
                placeholder: CHAT_PLACEHOLDER_NO_PROJECT,
            });
        }

        Message::SubmitMessage(raw) => {
            let text = raw.trim();
            if text.is_empty() {
                return;
            }
            let Some(project) = state.active_project.as_ref() else {
                cmds.push(Command::toast(NO_PROJECT_WARNING, AlertKind::Warning));
                return;
            };
            let request = ChatRequest {
                message: text.to_string(),
                project_id: Some(project.id.clone()),
                project_name: Some(project.name.clone()),
            };

            let entry = state.push_entry(Role::User, text, RenderMode::PlainEscaped);
            state.pending_replies += 1;
            cmds.push(Command::AppendEntry(entry));
            cmds.push(Command::ClearInput);
            cmds.push(Command::SetTyping(true));
            cmds.push(Command::PostChatMessage {
                generation: state.generation,
                request,
            });
        }

        Message::ChatReplyReceived { generation, result } => {
            if generation != state.generation {
                debug_log!("dropping reply for stale generation {}", generation);
                return;
            }
            state.pending_replies = state.pending_replies.saturating_sub(1);
            cmds.push(Command::SetTyping(state.typing_visible()));

            match result {
                Ok(reply) => cmds.push(Command::after(
                    REPLY_REVEAL_DELAY_MS,
                    Message::RevealBotText {
                        generation,
                        text: reply.message,
                        mode: RenderMode::TrustedMarkdown,
                        is_error: false,
                    },
                )),
                Err(ClientError::Unauthorized) => session_expired(cmds),
                Err(e) => cmds.push(Command::after(
                    REPLY_REVEAL_DELAY_MS,
                    Message::RevealBotText {
                        generation,
                        text: format!("Lo siento, ocurrió un error: {}", e),
                        mode: RenderMode::PlainEscaped,
                        is_error: true,
                    },
                )),
            }
        }

        Message::RevealBotText {
            generation,
            text,
            mode,
            is_error,
        } => {
            if generation != state.generation {
                return;
            }
            let entry = if is_error {
                state.push_error(text)
            } else {
                state.push_entry(Role::Bot, text, mode)
            };
            cmds.push(Command::AppendEntry(entry));
        }

        Message::SbomFileChosen(file) => {
            let Some(project) = state.active_project.as_ref() else {
                cmds.push(Command::toast(NO_PROJECT_WARNING, AlertKind::Warning));
                cmds.push(Command::ResetFileInput);
                return;
            };
            if let Err(e) = validate_sbom_file(&file.name, file.size) {
                cmds.push(Command::toast(e.to_string(), AlertKind::Danger));
                cmds.push(Command::ResetFileInput);
                return;
            }
            if state.upload_in_flight {
                cmds.push(Command::toast(
                    "Ya hay un SBOM en proceso, espera a que termine",
                    AlertKind::Warning,
                ));
                cmds.push(Command::ResetFileInput);
                return;
            }

            let fields = upload_fields(project);
            state.upload_in_flight = true;
            let entry = state.push_entry(
                Role::User,
                format!("Archivo SBOM adjunto: {}", file.name),
                RenderMode::PlainEscaped,
            );
            cmds.push(Command::AppendEntry(entry));
            cmds.push(Command::ShowUploadProgress {
                generation: state.generation,
            });
            cmds.push(Command::UploadSbom {
                generation: state.generation,
                file,
                fields,
            });
        }

        Message::SbomUploadFinished { generation, result } => {
            // The control is reset even for stale uploads so the same file
            // can be picked again.
            cmds.push(Command::ResetFileInput);
            if generation != state.generation {
                debug_log!("dropping SBOM result for stale generation {}", generation);
                return;
            }
            state.upload_in_flight = false;
            cmds.push(Command::HideUploadProgress);

            match result {
                Ok(reply) => {
                    let threshold = state
                        .active_project
                        .as_ref()
                        .map(|p| p.vulnerability_threshold)
                        .unwrap_or_default();
                    if let Some(info) = &reply.sbom_info {
                        let summary = format_sbom_summary(info, threshold);
                        let entry = state.push_entry(Role::Bot, summary, RenderMode::TrustedMarkdown);
                        cmds.push(Command::AppendEntry(entry));
                    }
                    if !reply.message.trim().is_empty() {
                        let entry =
                            state.push_entry(Role::Bot, reply.message, RenderMode::TrustedMarkdown);
                        cmds.push(Command::AppendEntry(entry));
                    }
                    cmds.push(Command::toast("SBOM analizado correctamente", AlertKind::Success));
                }
                Err(ClientError::Unauthorized) => session_expired(cmds),
                Err(e) => {
                    let entry = state.push_error(format!("Error al procesar el SBOM: {}", e));
                    cmds.push(Command::AppendEntry(entry));
                }
            }
        }
    }
}

fn session_expired(cmds: &mut Vec<Command>) {
    cmds.push(Command::toast(SESSION_EXPIRED_MESSAGE, AlertKind::Danger));
    cmds.push(Command::RedirectToLogin {
        delay_ms: SESSION_EXPIRED_REDIRECT_MS,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatReply, Project, SbomInfo, SbomUploadReply};
    use crate::state::SelectedFile;

    fn project(id: &str, name: &str) -> Project {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "nombre": name,
            "umbral_vulnerabilidades": 5,
            "severidad_maxima": "HIGH"
        }))
        .unwrap()
    }

    fn run(state: &mut ChatState, msg: Message) -> Vec<Command> {
        let mut cmds = Vec::new();
        update(state, msg, &mut cmds);
        cmds
    }

    fn selected(state: &mut ChatState) {
        run(state, Message::SelectProject(project("p-1", "api")));
    }

    #[test]
    fn selecting_a_project_resets_and_greets() {
        let mut state = ChatState::new();
        let cmds = run(&mut state, Message::SelectProject(project("p-1", "api")));

        assert_eq!(state.active_project_id(), Some("p-1"));
        assert_eq!(state.entries.len(), 1);
        assert_eq!(state.greeting_count(), 1);
        assert!(!state.welcome_visible);
        assert_eq!(cmds[0], Command::ResetView { welcome_visible: false });
        assert!(cmds.contains(&Command::ApplyInputState {
            enabled: true,
            placeholder: CHAT_PLACEHOLDER_ACTIVE
        }));
        assert!(matches!(cmds.last(), Some(Command::AppendEntry(e)) if e.text.contains("**api**")));
    }

    #[test]
    fn submit_without_project_only_warns() {
        let mut state = ChatState::new();
        let cmds = run(&mut state, Message::SubmitMessage("hola".into()));
        assert_eq!(cmds, vec![Command::toast(NO_PROJECT_WARNING, AlertKind::Warning)]);
        assert!(state.entries.is_empty());
    }

    #[test]
    fn submit_appends_user_bubble_and_posts() {
        let mut state = ChatState::new();
        selected(&mut state);
        let cmds = run(&mut state, Message::SubmitMessage("  ¿Qué es XSS?  ".into()));

        let user = state.entries.last().unwrap();
        assert_eq!(user.role, Role::User);
        assert_eq!(user.text, "¿Qué es XSS?");
        assert_eq!(user.mode, RenderMode::PlainEscaped);
        assert!(state.typing_visible());
        assert!(cmds.contains(&Command::SetTyping(true)));
        assert!(cmds.iter().any(|c| matches!(c,
            Command::PostChatMessage { request, .. }
                if request.project_id.as_deref() == Some("p-1") && request.message == "¿Qué es XSS?")));
    }

    #[test]
    fn reply_is_revealed_after_delay() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SubmitMessage("hola".into()));
        let generation = state.generation;

        let cmds = run(
            &mut state,
            Message::ChatReplyReceived {
                generation,
                result: Ok(ChatReply { message: "**Hola**".into() }),
            },
        );
        assert_eq!(cmds[0], Command::SetTyping(false));
        let Command::SendMessageAfter { delay_ms, message } = &cmds[1] else {
            panic!("expected delayed reveal, got {:?}", cmds);
        };
        assert_eq!(*delay_ms, REPLY_REVEAL_DELAY_MS);

        let cmds = run(&mut state, (**message).clone());
        assert!(matches!(&cmds[0], Command::AppendEntry(e)
            if e.role == Role::Bot && e.mode == RenderMode::TrustedMarkdown));
    }

    #[test]
    fn typing_stays_while_other_requests_are_pending() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SubmitMessage("uno".into()));
        run(&mut state, Message::SubmitMessage("dos".into()));
        let generation = state.generation;
        let cmds = run(
            &mut state,
            Message::ChatReplyReceived {
                generation,
                result: Ok(ChatReply { message: "1".into() }),
            },
        );
        assert_eq!(cmds[0], Command::SetTyping(true));
    }

    #[test]
    fn unauthorized_reply_redirects_to_login() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SubmitMessage("hola".into()));
        let generation = state.generation;
        let cmds = run(
            &mut state,
            Message::ChatReplyReceived {
                generation,
                result: Err(ClientError::Unauthorized),
            },
        );
        assert!(cmds.contains(&Command::toast(SESSION_EXPIRED_MESSAGE, AlertKind::Danger)));
        assert!(cmds.contains(&Command::RedirectToLogin {
            delay_ms: SESSION_EXPIRED_REDIRECT_MS
        }));
    }

    #[test]
    fn network_error_becomes_escaped_error_bubble() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SubmitMessage("hola".into()));
        let generation = state.generation;
        let cmds = run(
            &mut state,
            Message::ChatReplyReceived {
                generation,
                result: Err(ClientError::Network("<b>caído</b>".into())),
            },
        );
        let Command::SendMessageAfter { message, .. } = &cmds[1] else { panic!() };
        let cmds = run(&mut state, (**message).clone());
        let Command::AppendEntry(entry) = &cmds[0] else { panic!() };
        assert!(entry.is_error);
        assert!(entry.html().contains("&lt;b&gt;caído"));
    }

    #[test]
    fn stale_reply_is_discarded_after_project_switch() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SubmitMessage("hola".into()));
        let old_generation = state.generation;

        run(&mut state, Message::SelectProject(project("p-2", "web")));
        let cmds = run(
            &mut state,
            Message::ChatReplyReceived {
                generation: old_generation,
                result: Ok(ChatReply { message: "tarde".into() }),
            },
        );
        assert!(cmds.is_empty());
        assert_eq!(state.entries.len(), 1);
        assert!(!state.typing_visible());
    }

    #[test]
    fn deleting_active_project_resets_everything() {
        let mut state = ChatState::new();
        selected(&mut state);
        let ignored = run(&mut state, Message::ProjectDeleted("otro".into()));
        assert!(ignored.is_empty());

        let cmds = run(&mut state, Message::ProjectDeleted("p-1".into()));
        assert!(state.active_project.is_none());
        assert!(state.entries.is_empty());
        assert!(state.welcome_visible);
        assert!(cmds.contains(&Command::ApplyInputState {
            enabled: false,
            placeholder: CHAT_PLACEHOLDER_NO_PROJECT
        }));
    }

    fn file(name: &str, size: u64) -> SelectedFile {
        SelectedFile {
            name: name.into(),
            size,
            handle: None,
        }
    }

    #[test]
    fn sbom_rejections_never_upload() {
        let mut state = ChatState::new();
        let cmds = run(&mut state, Message::SbomFileChosen(file("sbom.json", 1024)));
        assert!(!cmds.iter().any(Command::is_network));

        selected(&mut state);
        for bad in [file("report.exe", 1024), file("sbom.json", 20 * 1024 * 1024)] {
            let cmds = run(&mut state, Message::SbomFileChosen(bad));
            assert!(!cmds.iter().any(Command::is_network));
            assert!(cmds.contains(&Command::ResetFileInput));
        }
    }

    #[test]
    fn accepted_sbom_uploads_once_with_project_settings() {
        let mut state = ChatState::new();
        selected(&mut state);
        let cmds = run(&mut state, Message::SbomFileChosen(file("sbom.json", 1024 * 1024)));
        let uploads: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                Command::UploadSbom { fields, .. } => Some(fields),
                _ => None,
            })
            .collect();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].contains(&("umbral_vulnerabilidades", "5".to_string())));
        assert!(uploads[0].contains(&("severidad_maxima", "HIGH".to_string())));

        // A second file while the first is in flight is refused.
        let cmds = run(&mut state, Message::SbomFileChosen(file("otro.json", 10)));
        assert!(!cmds.iter().any(Command::is_network));
    }

    #[test]
    fn sbom_success_renders_summary_then_reply() {
        let mut state = ChatState::new();
        selected(&mut state);
        run(&mut state, Message::SbomFileChosen(file("sbom.json", 1024)));
        let generation = state.generation;
        let cmds = run(
            &mut state,
            Message::SbomUploadFinished {
                generation,
                result: Ok(SbomUploadReply {
                    message: "Revisa lodash".into(),
                    sbom_info: Some(SbomInfo {
                        filename: "sbom.json".into(),
                        format: "CycloneDX".into(),
                        components_count: 3,
                        vulnerability_analysis: None,
                    }),
                }),
            },
        );
        let appended: Vec<&str> = cmds
            .iter()
            .filter_map(|c| match c {
                Command::AppendEntry(e) => Some(e.text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(appended.len(), 2);
        assert!(appended[0].contains("Análisis del SBOM"));
        assert_eq!(appended[1], "Revisa lodash");
        assert!(cmds.contains(&Command::ResetFileInput));
        assert!(cmds.contains(&Command::HideUploadProgress));
        assert!(!state.upload_in_flight);
    }
}
