use std::io;

use anyhow::Result;
use crossterm::cursor;
use crossterm::event::DisableBracketedPaste;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableBracketedPaste;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::TextArea;
use crate::domain::models::ThemeName;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;

fn status_line(app_state: &AppState) -> Paragraph<'static> {
    let count = app_state.conversation.token_count();
    let text = format!(
        " {} · {} · Focus: {} · Tokens: {} prompt + {} completion = {}",
        Config::get(ConfigKey::Model),
        Config::get(ConfigKey::WritingType),
        Config::get(ConfigKey::FeedbackFocus).replace(',', ", "),
        count.prompt,
        count.completion,
        count.total(),
    );

    return Paragraph::new(text).style(Style {
        fg: Some(Color::DarkGray),
        ..Style::default()
    });
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    events: &mut EventsService,
) -> Result<()> {
    let mut textarea = TextArea::default();
    let loading = Loading::default();

    loop {
        terminal.draw(|frame| {
            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![
                    Constraint::Min(1),
                    Constraint::Max(1),
                    Constraint::Max(4),
                ])
                .split(frame.size());

            if layout[0].width != app_state.last_known_width
                || layout[0].height != app_state.last_known_height
            {
                app_state.set_rect(layout[0]);
            }

            app_state
                .bubble_list
                .render(frame, layout[0], app_state.scroll.position);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                layout[0].inner(&Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut app_state.scroll.scrollbar_state,
            );

            frame.render_widget(status_line(app_state), layout[1]);

            if app_state.waiting_for_backend {
                loading.render(frame, layout[2]);
            } else {
                frame.render_widget(textarea.widget(), layout[2]);
            }
        })?;

        match events.next().await? {
            Event::BackendPromptResponse(res) => {
                app_state.handle_backend_response(res);
            }
            Event::CoachMessage(message) => {
                app_state.handle_coach_message(message);
            }
            Event::SessionLoaded(session) => {
                app_state.handle_session_loaded(session);
            }
            Event::KeyboardCTRLC() => {
                if app_state.waiting_for_backend {
                    tx.send(Action::BackendAbort())?;
                    app_state.abort_backend_request();
                    continue;
                }
                break;
            }
            Event::KeyboardCTRLR() => {
                if !app_state.waiting_for_backend {
                    app_state.resubmit(&tx)?;
                }
            }
            Event::KeyboardEnter() => {
                if app_state.waiting_for_backend {
                    continue;
                }

                let input_str = textarea.lines().join("\n");
                if input_str.trim().is_empty() {
                    continue;
                }
                textarea = TextArea::default();

                let (should_break, was_handled) =
                    app_state.handle_slash_commands(&input_str, &tx)?;
                if should_break {
                    break;
                }
                if was_handled {
                    continue;
                }

                let username = Config::get(ConfigKey::Username);
                app_state.add_message(Message::new(
                    Role::User,
                    &format!("{username}: {input_str}"),
                ));
                app_state.submit_feedback_request(&tx)?;
            }
            Event::KeyboardCharInput(input) => {
                if !app_state.waiting_for_backend {
                    textarea.input(input);
                }
            }
            Event::KeyboardPaste(text) => {
                if !app_state.waiting_for_backend {
                    textarea.insert_str(&text.replace('\r', "\n"));
                }
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UITick() => {
                continue;
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    disable_raw_mode().unwrap();
    crossterm::execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )
    .unwrap();
    crossterm::execute!(io::stdout(), cursor::Show).unwrap();
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    let mut app_state = AppState::new(
        &Config::get(ConfigKey::Model),
        ThemeName::parse(&Config::get(ConfigKey::Theme)),
    )
    .await?;
    let mut events = EventsService::new(rx);

    start_loop(&mut terminal, &mut app_state, tx, &mut events).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
