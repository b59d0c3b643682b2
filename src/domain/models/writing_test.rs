use anyhow::Result;

use super::default_session_filename;
use super::CoachSettings;

#[test]
fn it_parses_focus_lists_case_insensitively() -> Result<()> {
    let focus = CoachSettings::parse_focus("grammar, Style,TONE")?;
    assert_eq!(
        focus,
        vec![
            "Grammar".to_string(),
            "Style".to_string(),
            "Tone".to_string()
        ]
    );
    return Ok(());
}

#[test]
fn it_rejects_unknown_focus_categories() {
    let res = CoachSettings::parse_focus("Grammar,Penmanship");
    assert!(res.is_err());
}

#[test]
fn it_rejects_empty_focus_lists() {
    let res = CoachSettings::parse_focus(" , ,");
    assert!(res.is_err());
}

#[test]
fn it_parses_writing_types() -> Result<()> {
    assert_eq!(
        CoachSettings::parse_writing_type("creative writing")?,
        "Creative Writing".to_string()
    );
    assert!(CoachSettings::parse_writing_type("Limerick").is_err());
    return Ok(());
}

#[test]
fn it_derives_session_filenames_from_the_writing_type() {
    assert_eq!(
        default_session_filename("Essay"),
        "essay_writing_session.json".to_string()
    );
    assert_eq!(
        default_session_filename("Creative Writing"),
        "creative_writing_writing_session.json".to_string()
    );
}
