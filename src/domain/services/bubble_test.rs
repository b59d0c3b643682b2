use super::Bubble;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::ThemeName;

fn rendered(message: &Message, width: usize) -> Vec<String> {
    return Bubble::new(message, ThemeName::Dark, width)
        .as_lines()
        .iter()
        .map(|line| {
            return line
                .spans
                .iter()
                .map(|span| return span.content.to_string())
                .collect::<Vec<String>>()
                .join("");
        })
        .collect();
}

#[test]
fn it_frames_messages_with_borders() {
    let msg = Message::new_with_type(Role::System, MessageType::Notice, "Saved your session.");
    let lines = rendered(&msg, 60);

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("╭─ Redpen "));
    assert!(lines[0].trim_end().ends_with('╮'));
    assert!(lines[1].starts_with("│ Saved your session."));
    assert!(lines[2].trim_end().ends_with('╯'));
}

#[test]
fn it_right_aligns_user_messages() {
    let msg = Message::new(Role::User, "Fix my grammar.");
    let lines = rendered(&msg, 60);

    assert!(lines[1].starts_with(' '));
    assert!(lines[1].trim_end().ends_with('│'));
}

#[test]
fn it_left_aligns_feedback_messages() {
    let msg = Message::new(Role::Assistant, "Your grammar is mostly sound.");
    let lines = rendered(&msg, 60);

    assert!(lines[1].starts_with('│'));
}

#[test]
fn it_pads_every_line_to_the_window_width() {
    let msg = Message::new_with_type(Role::System, MessageType::Notice, "Short.");
    for line in rendered(&msg, 48) {
        assert_eq!(line.chars().count(), 48);
    }
}

#[test]
fn it_wraps_long_messages_inside_the_bubble() {
    let msg = Message::new_with_type(
        Role::System,
        MessageType::Notice,
        "This notice is far too long to fit on a single rendered line at such a narrow width.",
    );
    let lines = rendered(&msg, 40);

    assert!(lines.len() > 3);
}
