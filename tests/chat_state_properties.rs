//! Property tests for the chat reducer and the toast timer.  Everything here
//! is pure, so these run natively with `cargo test`.

use proptest::prelude::*;

use devsec_assistant_frontend::error::ClientError;
use devsec_assistant_frontend::messages::{Command, Message};
use devsec_assistant_frontend::models::Project;
use devsec_assistant_frontend::state::{ChatState, SelectedFile};
use devsec_assistant_frontend::toast::{AlertKind, TimerOutcome, ToastLifecycle};
use devsec_assistant_frontend::update::update;

fn project(id: u8) -> Project {
    serde_json::from_value(serde_json::json!({
        "id": format!("p-{}", id),
        "nombre": format!("proyecto {}", id),
        "umbral_vulnerabilidades": 3,
    }))
    .unwrap()
}

fn run(state: &mut ChatState, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();
    update(state, msg, &mut cmds);
    cmds
}

fn file(name: &str, size: u64) -> SelectedFile {
    SelectedFile {
        name: name.into(),
        size,
        handle: None,
    }
}

fn uploads(cmds: &[Command]) -> usize {
    cmds.iter()
        .filter(|c| matches!(c, Command::UploadSbom { .. }))
        .count()
}

proptest! {
    #[test]
    fn every_selection_leaves_one_project_and_one_greeting(ids in prop::collection::vec(0u8..5, 1..12)) {
        let mut state = ChatState::new();
        for id in ids {
            run(&mut state, Message::SelectProject(project(id)));
            let expected = format!("p-{}", id);
            prop_assert_eq!(state.active_project_id(), Some(expected.as_str()));
            prop_assert_eq!(state.greeting_count(), 1);
            prop_assert_eq!(state.entries.len(), 1);
            prop_assert!(!state.welcome_visible);
        }
    }

    #[test]
    fn blank_input_is_ignored(blank in "[ \t\n\r]{0,16}", with_project in any::<bool>()) {
        let mut state = ChatState::new();
        if with_project {
            run(&mut state, Message::SelectProject(project(1)));
        }
        let before = state.entries.len();
        let cmds = run(&mut state, Message::SubmitMessage(blank));
        prop_assert!(cmds.is_empty());
        prop_assert_eq!(state.entries.len(), before);
    }

    #[test]
    fn no_project_means_no_request(text in "[a-zA-Z0-9 ¿?]{0,40}[a-zA-Z]") {
        let mut state = ChatState::new();
        let cmds = run(&mut state, Message::SubmitMessage(text));
        prop_assert!(cmds.iter().all(|c| !c.is_network()));
        let warned = cmds
            .iter()
            .any(|c| matches!(c, Command::ShowToast { kind: AlertKind::Warning, .. }));
        prop_assert!(warned);
        prop_assert!(state.entries.is_empty());
    }

    #[test]
    fn stale_replies_never_render(replies in prop::collection::vec("[a-z ]{1,20}", 1..5)) {
        let mut state = ChatState::new();
        run(&mut state, Message::SelectProject(project(1)));
        run(&mut state, Message::SubmitMessage("hola".into()));
        let stale = state.generation;
        run(&mut state, Message::SelectProject(project(2)));
        let before = state.entries.clone();
        for reply in replies {
            let cmds = run(&mut state, Message::ChatReplyReceived {
                generation: stale,
                result: Ok(devsec_assistant_frontend::models::ChatReply { message: reply }),
            });
            prop_assert!(cmds.is_empty());
        }
        prop_assert_eq!(&state.entries, &before);
    }

    #[test]
    fn toast_is_not_removed_while_hovered(
        duration in 500u32..10_000,
        probes in prop::collection::vec(0u32..60_000, 1..20),
    ) {
        let (mut toast, ticket) = ToastLifecycle::start(0.0, duration);
        toast.pointer_enter();
        for probe in probes {
            let outcome = toast.timer_fired(ticket.id, probe as f64);
            prop_assert_ne!(outcome, TimerOutcome::Remove);
        }
        prop_assert!(toast.is_paused());
    }

    #[test]
    fn unhovered_toast_is_removed_no_earlier_than_its_duration(duration in 100u32..10_000, early in 1u32..100) {
        let (mut toast, ticket) = ToastLifecycle::start(1_000.0, duration);
        let too_early = 1_000.0 + (duration - early) as f64;
        prop_assert_ne!(toast.timer_fired(ticket.id, too_early), TimerOutcome::Remove);
        let (mut toast, ticket) = ToastLifecycle::start(1_000.0, duration);
        prop_assert_eq!(toast.timer_fired(ticket.id, 1_000.0 + duration as f64), TimerOutcome::Remove);
    }
}

#[test]
fn rejected_sbom_files_produce_no_upload() {
    let mut state = ChatState::new();
    run(&mut state, Message::SelectProject(project(1)));

    let cmds = run(&mut state, Message::SbomFileChosen(file("report.exe", 1024)));
    assert_eq!(uploads(&cmds), 0);
    assert!(cmds.contains(&Command::ResetFileInput));

    let cmds = run(&mut state, Message::SbomFileChosen(file("sbom.json", 20 * 1024 * 1024)));
    assert_eq!(uploads(&cmds), 0);
    assert!(!state.upload_in_flight);
}

#[test]
fn valid_sbom_produces_exactly_one_upload() {
    let mut state = ChatState::new();
    run(&mut state, Message::SelectProject(project(1)));

    let cmds = run(&mut state, Message::SbomFileChosen(file("sbom.json", 1024 * 1024)));
    assert_eq!(uploads(&cmds), 1);
    assert!(state.upload_in_flight);

    // a second pick while the first is running is refused
    let cmds = run(&mut state, Message::SbomFileChosen(file("otro.json", 10)));
    assert_eq!(uploads(&cmds), 0);
}

#[test]
fn expired_session_toasts_and_redirects() {
    let mut state = ChatState::new();
    run(&mut state, Message::SelectProject(project(1)));
    run(&mut state, Message::SubmitMessage("hola".into()));
    let generation = state.generation;

    let cmds = run(
        &mut state,
        Message::ChatReplyReceived {
            generation,
            result: Err(ClientError::Unauthorized),
        },
    );
    assert!(cmds
        .iter()
        .any(|c| matches!(c, Command::ShowToast { kind: AlertKind::Danger, .. })));
    assert!(cmds
        .iter()
        .any(|c| matches!(c, Command::RedirectToLogin { delay_ms } if *delay_ms > 0)));
}
