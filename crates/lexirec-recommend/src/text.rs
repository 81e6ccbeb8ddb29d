//! Textual representation of exercises and the fixed topic/skill taxonomy.

use lexirec_store::{ExerciseContext, ExerciseInfo};
use serde::{Deserialize, Serialize};

/// At most this many option texts contribute to the indexable text.
const MAX_OPTION_TEXTS: usize = 16;

/// Lesson content is truncated to this many characters before indexing.
const LESSON_CONTENT_SNIPPET: usize = 500;

/// Build the deterministic indexable text for an exercise.
///
/// Layout: a bracketed metadata header, the lesson title and a content
/// snippet, an exercise-type tag, then the localized question, instructions
/// and option texts, newline-joined. Returns an empty string when the
/// exercise carries no localized text at all; metadata tags alone are not
/// worth indexing.
pub fn exercise_text(ctx: &ExerciseContext) -> String {
    let mut header = vec![
        format!("LEVEL:{}", ctx.info.lesson_level),
        format!("TYPE:{}", ctx.info.lesson_type),
    ];
    if let Some(tl) = &ctx.target_language {
        header.push(format!("TL:{}", tl));
    }
    if let Some(nl) = &ctx.native_language {
        header.push(format!("NL:{}", nl));
    }

    let mut parts = vec![format!("[{}]", header.join("] ["))];
    let metadata_only = parts.len() + 1; // header + EX_TYPE tag below

    if let Some(title) = ctx.lesson_title.as_deref().filter(|t| !t.is_empty()) {
        parts.push(title.to_string());
    }
    if let Some(content) = ctx.lesson_content.as_deref().filter(|c| !c.is_empty()) {
        parts.push(truncate_chars(content, LESSON_CONTENT_SNIPPET));
    }

    parts.push(format!("[EX_TYPE:{}]", ctx.info.exercise_type));

    if let Some(question) = ctx.question.as_deref().filter(|q| !q.is_empty()) {
        parts.push(question.to_string());
    }
    if let Some(instructions) = ctx.instructions.as_deref().filter(|i| !i.is_empty()) {
        parts.push(instructions.to_string());
    }
    if !ctx.options.is_empty() {
        let opts: Vec<&str> = ctx
            .options
            .iter()
            .take(MAX_OPTION_TEXTS)
            .map(String::as_str)
            .collect();
        parts.push(format!("OPTIONS: {}", opts.join(" | ")));
    }

    if parts.len() <= metadata_only {
        return String::new();
    }

    parts.join("\n").trim().to_string()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Coarse pedagogical category of an exercise: its lesson's type, or
/// "general" when blank.
pub fn topic_of(info: &ExerciseInfo) -> String {
    if info.lesson_type.is_empty() {
        "general".to_string()
    } else {
        info.lesson_type.clone()
    }
}

/// Fixed skill taxonomy derived from exercise type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Speaking,
    Writing,
    Listening,
    Reading,
    General,
}

impl Skill {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::Speaking => "speaking",
            Skill::Writing => "writing",
            Skill::Listening => "listening",
            Skill::Reading => "reading",
            Skill::General => "general",
        }
    }
}

pub fn skill_for(exercise_type: &str) -> Skill {
    match exercise_type {
        "pronunciation" | "shadowing" | "speaking" => Skill::Speaking,
        "translation" | "fill_blank" | "word_formation" => Skill::Writing,
        "audio_listening" => Skill::Listening,
        "multiple_choice" | "true_false" | "matching" | "ordering" | "drag_drop" => Skill::Reading,
        _ => Skill::General,
    }
}

/// Human-readable queue reason for a topic.
pub fn human_reason(topic: &str) -> &'static str {
    match topic {
        "vocabulary" => "Vocabulary for this topic",
        "grammar" => "Grammar for this topic",
        "conversation" => "Basic conversation practice",
        "pronunciation" => "Pronunciation and intonation",
        "shadowing" => "Dialogue shadowing",
        _ => "Similar concepts",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(question: Option<&str>, options: Vec<&str>) -> ExerciseContext {
        ExerciseContext {
            info: ExerciseInfo {
                id: 1,
                lesson_id: 1,
                exercise_type: "multiple_choice".to_string(),
                sequence: 10,
                lesson_level: "A1".to_string(),
                lesson_type: "vocabulary".to_string(),
                lesson_sequence: 10,
            },
            lesson_title: Some("Greetings".to_string()),
            lesson_content: Some("Hello and goodbye basics".to_string()),
            native_language: Some("es".to_string()),
            target_language: Some("en".to_string()),
            question: question.map(str::to_string),
            instructions: None,
            options: options.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn test_exercise_text_layout() {
        let text = exercise_text(&context(Some("How do you greet?"), vec!["hello", "bye"]));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "[LEVEL:A1] [TYPE:vocabulary] [TL:en] [NL:es]");
        assert_eq!(lines[1], "Greetings");
        assert_eq!(lines[2], "Hello and goodbye basics");
        assert_eq!(lines[3], "[EX_TYPE:multiple_choice]");
        assert_eq!(lines[4], "How do you greet?");
        assert_eq!(lines[5], "OPTIONS: hello | bye");
    }

    #[test]
    fn test_exercise_text_deterministic() {
        let ctx = context(Some("q"), vec!["a"]);
        assert_eq!(exercise_text(&ctx), exercise_text(&ctx));
    }

    #[test]
    fn test_metadata_only_is_empty() {
        let mut ctx = context(None, vec![]);
        ctx.lesson_title = None;
        ctx.lesson_content = None;
        assert_eq!(exercise_text(&ctx), "");
    }

    #[test]
    fn test_options_capped_at_sixteen() {
        let options: Vec<String> = (0..40).map(|i| format!("opt{}", i)).collect();
        let mut ctx = context(Some("q"), vec![]);
        ctx.options = options;

        let text = exercise_text(&ctx);
        let options_line = text.lines().last().unwrap();
        assert_eq!(options_line.matches('|').count(), 15);
        assert!(!options_line.contains("opt16"));
    }

    #[test]
    fn test_lesson_content_truncated() {
        let mut ctx = context(Some("q"), vec![]);
        ctx.lesson_content = Some("x".repeat(2000));
        let text = exercise_text(&ctx);
        assert!(text.lines().any(|l| l.chars().count() == 500));
    }

    #[test]
    fn test_skill_mapping() {
        assert_eq!(skill_for("pronunciation"), Skill::Speaking);
        assert_eq!(skill_for("shadowing"), Skill::Speaking);
        assert_eq!(skill_for("speaking"), Skill::Speaking);
        assert_eq!(skill_for("translation"), Skill::Writing);
        assert_eq!(skill_for("fill_blank"), Skill::Writing);
        assert_eq!(skill_for("word_formation"), Skill::Writing);
        assert_eq!(skill_for("audio_listening"), Skill::Listening);
        assert_eq!(skill_for("multiple_choice"), Skill::Reading);
        assert_eq!(skill_for("true_false"), Skill::Reading);
        assert_eq!(skill_for("matching"), Skill::Reading);
        assert_eq!(skill_for("ordering"), Skill::Reading);
        assert_eq!(skill_for("drag_drop"), Skill::Reading);
        assert_eq!(skill_for("anything_else"), Skill::General);
    }

    #[test]
    fn test_topic_defaults_to_general() {
        let mut ctx = context(None, vec![]);
        ctx.info.lesson_type = String::new();
        assert_eq!(topic_of(&ctx.info), "general");
        ctx.info.lesson_type = "grammar".to_string();
        assert_eq!(topic_of(&ctx.info), "grammar");
    }

    #[test]
    fn test_human_reason_default() {
        assert_eq!(human_reason("grammar"), "Grammar for this topic");
        assert_eq!(human_reason("numbers"), "Similar concepts");
        assert_eq!(human_reason(""), "Similar concepts");
    }
}
