#[cfg(test)]
#[path = "writing_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

pub const WRITING_TYPES: [&str; 8] = [
    "Essay",
    "Creative Writing",
    "Technical Writing",
    "Journalism",
    "Academic Paper",
    "Business Writing",
    "Blog Post",
    "Script",
];

pub const FEEDBACK_CATEGORIES: [&str; 8] = [
    "Grammar",
    "Style",
    "Structure",
    "Clarity",
    "Coherence",
    "Vocabulary",
    "Tone",
    "Argumentation",
];

pub const DEFAULT_INSTRUCTIONS: &str = "You are an advanced Writing Coach AI. Your role is to provide real-time feedback on writing style, grammar, and structure. You should offer constructive criticism, suggestions for improvement, and explanations of writing principles to help users enhance their writing skills.

Your capabilities include:
1. Analyzing grammar and syntax
2. Evaluating writing style and tone
3. Assessing document structure and flow
4. Providing feedback on clarity and coherence
5. Suggesting improvements in vocabulary and word choice
6. Offering insights on argumentation and persuasion techniques

When providing feedback:
- Be constructive and encouraging
- Explain the reasoning behind your suggestions
- Provide specific examples and alternatives
- Tailor your feedback to the chosen writing type
- Prioritize the most impactful improvements
- Acknowledge strengths as well as areas for improvement

Remember, your goal is to help users improve their writing skills across various types of writing, from creative to academic and professional contexts.";

/// What the coach is asked to do this turn: the standing instructions, the
/// writing type being reviewed, and the feedback categories to concentrate
/// on. Passed explicitly so request composition is testable without any
/// ambient configuration.
pub struct CoachSettings {
    pub instructions: String,
    pub writing_type: String,
    pub focus: Vec<String>,
}

impl CoachSettings {
    pub fn from_config() -> CoachSettings {
        return CoachSettings {
            instructions: Config::get(ConfigKey::Instructions),
            writing_type: Config::get(ConfigKey::WritingType),
            focus: Config::get(ConfigKey::FeedbackFocus)
                .split(',')
                .map(|category| return category.trim().to_string())
                .filter(|category| return !category.is_empty())
                .collect(),
        };
    }

    /// Resolves a comma-separated focus list against the category
    /// allow-list, case-insensitively, returning the canonical spellings.
    pub fn parse_focus(value: &str) -> Result<Vec<String>> {
        let mut focus: Vec<String> = vec![];

        for raw in value.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }

            match FEEDBACK_CATEGORIES
                .iter()
                .find(|category| return category.eq_ignore_ascii_case(entry))
            {
                Some(category) => focus.push(category.to_string()),
                None => bail!(format!(
                    "{entry} is not a feedback category. Options are: {}",
                    FEEDBACK_CATEGORIES.join(", ")
                )),
            }
        }

        if focus.is_empty() {
            bail!("At least one feedback category is required.");
        }

        return Ok(focus);
    }

    /// Resolves a writing type against the allow-list, case-insensitively.
    pub fn parse_writing_type(value: &str) -> Result<String> {
        let entry = value.trim();
        match WRITING_TYPES
            .iter()
            .find(|writing_type| return writing_type.eq_ignore_ascii_case(entry))
        {
            Some(writing_type) => return Ok(writing_type.to_string()),
            None => bail!(format!(
                "{entry} is not a writing type. Options are: {}",
                WRITING_TYPES.join(", ")
            )),
        }
    }
}

pub fn default_session_filename(writing_type: &str) -> String {
    return format!(
        "{}_writing_session.json",
        writing_type.to_lowercase().replace(' ', "_")
    );
}
