//! Full-screen terminal interface: the feed renderer and the event loop that
//! drives the session controller.

mod render;

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::style::Style;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tui_textarea::{CursorMove, TextArea};

use crate::core::config::Config;
use crate::core::message::{FeedbackKind, Message, MessageId};
use crate::core::responder::{HttpResponder, ResponderEvent, ResponderService};
use crate::core::session::{CaptureControl, ChatSession, SessionInit};
use crate::speech::{
    resolve_synthesizer, CaptureEvent, CaptureService, CommandSpec, PlaybackEvent, PlaybackService,
};
use crate::utils::logging::TranscriptLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Typing into the input line.
    Compose,
    /// Navigating the feed to act on a single message.
    Select,
}

/// View state wrapped around the session controller.
struct ChatUi {
    session: ChatSession,
    textarea: TextArea<'static>,
    mode: Mode,
    selected: Option<usize>,
    scroll_offset: u16,
    auto_scroll: bool,
    status: Option<String>,
    exit_requested: bool,
}

fn new_textarea(initial: &str) -> TextArea<'static> {
    let mut textarea = if initial.is_empty() {
        TextArea::default()
    } else {
        TextArea::from(initial.lines().map(str::to_string).collect::<Vec<_>>())
    };
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("Ask about space tours...");
    textarea.move_cursor(CursorMove::End);
    textarea
}

impl ChatUi {
    fn new(session: ChatSession) -> Self {
        Self {
            session,
            textarea: new_textarea(""),
            mode: Mode::Compose,
            selected: None,
            scroll_offset: 0,
            auto_scroll: true,
            status: None,
            exit_requested: false,
        }
    }

    fn compose_text(&self) -> String {
        self.textarea.lines().join(" ")
    }

    fn clear_compose(&mut self) {
        self.textarea = new_textarea("");
    }

    fn sync_compose_from_input(&mut self) {
        self.textarea = new_textarea(&self.session.input().to_string());
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    fn enter_select_mode(&mut self) {
        if self.session.feed().is_empty() {
            return;
        }
        self.mode = Mode::Select;
        self.selected = Some(self.session.feed().len() - 1);
    }

    fn leave_select_mode(&mut self) {
        self.mode = Mode::Compose;
        self.selected = None;
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.session.feed().len();
        let Some(current) = self.selected else {
            return;
        };
        if len == 0 {
            self.leave_select_mode();
            return;
        }
        let moved = current.saturating_add_signed(delta).min(len - 1);
        self.selected = Some(moved);
    }

    /// Keep the selection on a valid message after a deletion.
    fn clamp_selection(&mut self) {
        let len = self.session.feed().len();
        if len == 0 {
            self.leave_select_mode();
        } else if let Some(current) = self.selected {
            self.selected = Some(current.min(len - 1));
        }
    }

    fn selected_message(&self) -> Option<&Message> {
        self.session.feed().messages().get(self.selected?)
    }

    fn selected_id(&self) -> Option<MessageId> {
        self.selected_message().map(|message| message.id)
    }

    fn selected_bot_text(&self) -> Option<String> {
        self.selected_message()
            .filter(|message| message.is_bot())
            .map(|message| message.text.clone())
    }
}

struct VoiceServices {
    capture: CaptureService,
    playback: PlaybackService,
}

/// Run the interactive chat interface until the user quits.
pub async fn run_chat(
    config: Config,
    transcript: TranscriptLog,
    no_voice: bool,
) -> Result<(), Box<dyn Error>> {
    let (responder_service, mut responder_rx) =
        ResponderService::new(Arc::new(HttpResponder::new(config.endpoint.as_str())));

    let transcriber = if no_voice {
        None
    } else {
        config.transcriber.as_deref().and_then(CommandSpec::parse)
    };
    let synthesizer = if no_voice {
        None
    } else {
        resolve_synthesizer(config.synthesizer.as_deref())
    };
    let (capture, mut capture_rx) = CaptureService::new(transcriber, config.locale.clone());
    let (playback, mut playback_rx) = PlaybackService::new(synthesizer);

    let session = ChatSession::new(SessionInit {
        quick_replies: config.quick_replies(),
        capture_available: capture.is_available(),
        playback_available: playback.is_available(),
        transcript,
    });
    let mut ui = ChatUi::new(session);
    let mut voice = VoiceServices { capture, playback };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = loop {
        if let Err(err) = terminal.draw(|f| render::draw(f, &mut ui)) {
            break Err(err.into());
        }
        if ui.exit_requested {
            break Ok(());
        }

        match event::poll(Duration::from_millis(50)) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut ui, key, &responder_service, &mut voice);
                }
                Ok(_) => {}
                Err(err) => break Err(err.into()),
            },
            Ok(false) => {}
            Err(err) => break Err(err.into()),
        }

        drain_service_events(
            &mut ui,
            &mut responder_rx,
            &mut capture_rx,
            &mut playback_rx,
        );
    };

    voice.playback.cancel_current();
    voice.capture.stop();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn handle_key(
    ui: &mut ChatUi,
    key: KeyEvent,
    responder: &ResponderService,
    voice: &mut VoiceServices,
) {
    ui.status = None;

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        ui.exit_requested = true;
        return;
    }

    match ui.mode {
        Mode::Compose => handle_compose_key(ui, key, responder, voice),
        Mode::Select => handle_select_key(ui, key, responder, voice),
    }
}

fn handle_compose_key(
    ui: &mut ChatUi,
    key: KeyEvent,
    responder: &ResponderService,
    voice: &mut VoiceServices,
) {
    match key.code {
        KeyCode::Enter => {
            let draft = ui.compose_text();
            ui.session.set_input(draft);
            if let Some(request) = ui.session.send(None) {
                responder.spawn_request(request);
                ui.clear_compose();
                ui.auto_scroll = true;
            }
        }
        KeyCode::F(2) => match ui.session.toggle_capture() {
            Some(CaptureControl::Start(capture_id)) => voice.capture.start(capture_id),
            Some(CaptureControl::Stop) => voice.capture.stop(),
            None => ui.set_status("Voice capture unavailable"),
        },
        KeyCode::Esc => ui.enter_select_mode(),
        KeyCode::Up => {
            ui.auto_scroll = false;
            ui.scroll_offset = ui.scroll_offset.saturating_sub(1);
        }
        KeyCode::Down => {
            // Clamped against the bottom at draw time.
            ui.scroll_offset = ui.scroll_offset.saturating_add(1);
        }
        KeyCode::Char(c)
            if key.modifiers.contains(KeyModifiers::ALT) && c.is_ascii_digit() && c != '0' =>
        {
            let index = (c as usize) - ('1' as usize);
            if let Some(chip) = ui.session.quick_replies().get(index).cloned() {
                if let Some(request) = ui.session.send(Some(&chip)) {
                    responder.spawn_request(request);
                    ui.auto_scroll = true;
                }
            }
        }
        _ => {
            ui.textarea.input(key);
        }
    }
}

fn handle_select_key(
    ui: &mut ChatUi,
    key: KeyEvent,
    responder: &ResponderService,
    voice: &mut VoiceServices,
) {
    match key.code {
        KeyCode::Esc => ui.leave_select_mode(),
        KeyCode::Up => ui.move_selection(-1),
        KeyCode::Down => ui.move_selection(1),
        KeyCode::Char('c') => {
            let text = ui.selected_message().map(|message| message.text.clone());
            if let Some(text) = text {
                ui.session.copy(&text);
                ui.set_status("Copied");
            }
        }
        KeyCode::Char('x') => {
            if let Some(id) = ui.selected_id() {
                ui.session.delete(id);
                ui.clamp_selection();
            }
        }
        KeyCode::Char('r') => {
            if ui.selected_bot_text().is_some() {
                if let Some(request) = ui.session.regenerate() {
                    responder.spawn_request(request);
                    ui.auto_scroll = true;
                }
            }
        }
        KeyCode::Char('s') => {
            if let Some(text) = ui.selected_bot_text() {
                if let Some(request) = ui.session.speak(&text) {
                    voice.playback.speak(request);
                } else {
                    ui.set_status("Voice playback unavailable");
                }
            }
        }
        KeyCode::Char('l') => {
            if let Some(id) = ui.selected_id().filter(|_| ui.selected_bot_text().is_some()) {
                ui.session.toggle_feedback(id, FeedbackKind::Like);
            }
        }
        KeyCode::Char('d') => {
            if let Some(id) = ui.selected_id().filter(|_| ui.selected_bot_text().is_some()) {
                ui.session.toggle_feedback(id, FeedbackKind::Dislike);
            }
        }
        _ => {}
    }
}

fn drain_service_events(
    ui: &mut ChatUi,
    responder_rx: &mut mpsc::UnboundedReceiver<ResponderEvent>,
    capture_rx: &mut mpsc::UnboundedReceiver<(CaptureEvent, u64)>,
    playback_rx: &mut mpsc::UnboundedReceiver<(PlaybackEvent, u64)>,
) {
    while let Ok(event) = responder_rx.try_recv() {
        if ui.session.handle_responder_event(event).is_some() {
            ui.auto_scroll = true;
        }
    }
    while let Ok((event, capture_id)) = capture_rx.try_recv() {
        let is_transcript = matches!(event, CaptureEvent::Transcript(_));
        ui.session.handle_capture_event(capture_id, event);
        if is_transcript {
            ui.sync_compose_from_input();
        }
    }
    while let Ok((event, playback_id)) = playback_rx.try_recv() {
        ui.session.handle_playback_event(playback_id, event);
    }
}
