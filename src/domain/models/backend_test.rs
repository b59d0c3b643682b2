use super::BackendPrompt;
use crate::domain::models::CoachSettings;
use crate::domain::models::Message;
use crate::domain::models::Role;

fn settings(focus: Vec<&str>) -> CoachSettings {
    return CoachSettings {
        instructions: "You are an advanced Writing Coach AI. ".to_string(),
        writing_type: "Essay".to_string(),
        focus: focus
            .iter()
            .map(|category| return category.to_string())
            .collect(),
    };
}

#[test]
fn it_composes_feedback_requests() {
    let transcript = vec![Message::new(Role::User, "Ann: Fix my grammar.")];
    let prompt = BackendPrompt::compose(&settings(vec!["Grammar"]), &transcript);

    assert_eq!(prompt.messages.len(), 3);

    assert_eq!(prompt.messages[0].role, Role::System);
    assert!(prompt.messages[0]
        .content
        .contains("You are an advanced Writing Coach AI."));
    assert!(prompt.messages[0]
        .content
        .contains("Provide feedback for Essay."));
    assert!(prompt.messages[0]
        .content
        .contains("Focus on the following aspects: Grammar."));

    assert_eq!(prompt.messages[1].role, Role::System);
    insta::assert_snapshot!(prompt.messages[1].content, @"Provide constructive feedback, explain your suggestions, and offer specific examples for improvement.");

    assert_eq!(prompt.messages[2].role, Role::User);
    assert_eq!(prompt.messages[2].content, "Ann: Fix my grammar.");
}

#[test]
fn it_joins_focus_categories_with_commas() {
    let prompt = BackendPrompt::compose(&settings(vec!["Grammar", "Style", "Tone"]), &[]);

    assert!(prompt.messages[0]
        .content
        .contains("Focus on the following aspects: Grammar, Style, Tone."));
}

#[test]
fn it_includes_the_full_transcript_in_order() {
    let transcript = vec![
        Message::new(Role::User, "Ann: Draft one."),
        Message::new(Role::Assistant, "Feedback one."),
        Message::new(Role::User, "Ann: Draft two."),
    ];
    let prompt = BackendPrompt::compose(&settings(vec!["Structure"]), &transcript);

    assert_eq!(prompt.messages.len(), 5);
    assert_eq!(prompt.messages[2].content, "Ann: Draft one.");
    assert_eq!(prompt.messages[3].content, "Feedback one.");
    assert_eq!(prompt.messages[4].content, "Ann: Draft two.");
}
