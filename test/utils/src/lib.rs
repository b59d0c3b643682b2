/// A session file as the store writes it: a JSON array of timestamped
/// transcript snapshots.
pub fn transcript_fixture() -> &'static str {
    return r#"
[
  {
    "timestamp": "2024-09-14T10:12:01.000000-04:00",
    "messages": [
      {
        "role": "user",
        "content": "Ann: The quick brown fox jumps over the lazy dog, and then some."
      },
      {
        "role": "assistant",
        "content": "A classic pangram! The comma splice at the end weakens an otherwise crisp sentence."
      }
    ]
  },
  {
    "timestamp": "2024-09-14T10:18:45.000000-04:00",
    "messages": [
      {
        "role": "user",
        "content": "Ann: Here is the revised draft of my opening paragraph."
      },
      {
        "role": "assistant",
        "content": "Much tighter. Consider moving your thesis to the first sentence so the reader knows where the essay is headed."
      },
      {
        "role": "user",
        "content": "Ann: Done. Anything else?"
      },
      {
        "role": "assistant",
        "content": "Watch for passive voice in the second sentence, and vary your sentence openings."
      }
    ]
  }
]
"#
    .trim();
}
