use anyhow::Result;
use chrono::DateTime;
use tokio::fs;
use uuid::Uuid;

use super::Sessions;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::StoredSession;

fn scratch_store() -> Sessions {
    let dir = std::env::temp_dir().join(format!("redpen-sessions-{}", Uuid::new_v4()));
    return Sessions::new(dir);
}

fn transcript() -> Vec<Message> {
    return vec![
        Message::new(Role::User, "Ann: Fix my grammar."),
        Message::new(Role::Assistant, "Your grammar is mostly sound."),
    ];
}

#[tokio::test]
async fn it_appends_a_snapshot_per_save() -> Result<()> {
    let store = scratch_store();
    let first = transcript();
    let mut second = transcript();
    second.push(Message::new(Role::User, "Ann: And my tone?"));

    store.save(&first, "essay_writing_session.json").await?;
    let file_path = store.save(&second, "essay_writing_session.json").await?;

    let payload = fs::read_to_string(&file_path).await?;
    let sessions: Vec<StoredSession> = serde_json::from_str(&payload)?;

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].messages, first);
    assert_eq!(sessions[1].messages, second);

    let first_ts = DateTime::parse_from_rfc3339(&sessions[0].timestamp)?;
    let second_ts = DateTime::parse_from_rfc3339(&sessions[1].timestamp)?;
    assert!(first_ts < second_ts);

    fs::remove_dir_all(&store.session_dir).await?;
    return Ok(());
}

#[tokio::test]
async fn it_discards_corrupt_files_on_save() -> Result<()> {
    let store = scratch_store();
    fs::create_dir_all(&store.session_dir).await?;
    let file_path = store.session_dir.join("essay_writing_session.json");

    // Corrupt content is discarded rather than merged: every save onto an
    // unreadable file starts over with exactly one snapshot.
    for _ in 0..2 {
        fs::write(&file_path, "{ not json at all").await?;
        store.save(&transcript(), "essay_writing_session.json").await?;

        let payload = fs::read_to_string(&file_path).await?;
        let sessions: Vec<StoredSession> = serde_json::from_str(&payload)?;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].messages, transcript());
    }

    fs::remove_dir_all(&store.session_dir).await?;
    return Ok(());
}

#[tokio::test]
async fn it_round_trips_saved_sessions() -> Result<()> {
    let store = scratch_store();
    let file_path = store.save(&transcript(), "roundtrip.json").await?;

    let bytes = fs::read(&file_path).await?;
    let sessions = Sessions::load_bytes(&bytes)?;

    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].messages, transcript());

    fs::remove_dir_all(&store.session_dir).await?;
    return Ok(());
}

#[test]
fn it_loads_uploaded_transcripts() -> Result<()> {
    let sessions = Sessions::load_bytes(test_utils::transcript_fixture().as_bytes())?;

    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].timestamp, "2024-09-14T10:12:01.000000-04:00");
    assert_eq!(sessions[0].messages.len(), 2);
    assert_eq!(sessions[0].messages[0].role, Role::User);

    return Ok(());
}

#[test]
fn it_rejects_corrupt_uploads() {
    assert!(Sessions::load_bytes(b"{ \"timestamp\": ").is_err());
    assert!(Sessions::load_bytes(&[0xff, 0xfe, 0x00]).is_err());
}
