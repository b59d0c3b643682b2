use super::SlashCommand;

#[test]
fn it_parses_commands_with_args() {
    let cmd = SlashCommand::parse("/save notes.json").unwrap();
    assert!(cmd.is_save());
    assert_eq!(cmd.args, vec!["notes.json".to_string()]);
}

#[test]
fn it_parses_load_with_an_index() {
    let cmd = SlashCommand::parse("/load sessions.json 2").unwrap();
    assert!(cmd.is_load());
    assert_eq!(cmd.args, vec!["sessions.json".to_string(), "2".to_string()]);
}

#[test]
fn it_parses_multi_word_args() {
    let cmd = SlashCommand::parse("/type Creative Writing").unwrap();
    assert!(cmd.is_writing_type());
    assert_eq!(
        cmd.args,
        vec!["Creative".to_string(), "Writing".to_string()]
    );
}

#[test]
fn it_parses_aliases() {
    assert!(SlashCommand::parse("/q").unwrap().is_quit());
    assert!(SlashCommand::parse("/n").unwrap().is_new_session());
    assert!(SlashCommand::parse("/ml").unwrap().is_model_list());
    assert!(SlashCommand::parse("/tk").unwrap().is_tokens());
}

#[test]
fn it_parses_name_changes() {
    let cmd = SlashCommand::parse("/name Ann Marie").unwrap();
    assert!(cmd.is_name());
    assert_eq!(cmd.args.join(" "), "Ann Marie".to_string());
}

#[test]
fn it_ignores_plain_text() {
    assert!(SlashCommand::parse("Please review my essay.").is_none());
}

#[test]
fn it_ignores_unknown_commands() {
    assert!(SlashCommand::parse("/wibble").is_none());
}
