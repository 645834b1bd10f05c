//! Coercion of extracted JSON into a validated [`CourseDocument`].
//!
//! Every rule is idempotent: normalizing the serialized output of a previous
//! normalization yields the same document.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::course::{CourseDocument, Difficulty, Lesson, Module, QuizItem};
use crate::error::NormalizationError;

/// Coerce a raw JSON value into a course document.
///
/// Repairs what can be repaired (duration phrasing, positional indices,
/// inconsistent quiz items) and rejects what cannot (missing title, empty
/// modules, unrecognized difficulty), naming the offending field.
pub fn normalize(value: &Value) -> Result<CourseDocument, NormalizationError> {
    let obj = value.as_object().ok_or(NormalizationError::NotAnObject)?;

    let title = obj
        .get("title")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizationError::MissingField("title"))?
        .to_string();

    let modules_raw = obj
        .get("modules")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or(NormalizationError::MissingField("modules"))?;

    let mut modules = Vec::with_capacity(modules_raw.len());
    for (position, module_value) in modules_raw.iter().enumerate() {
        let module_obj = module_value
            .as_object()
            .ok_or(NormalizationError::MissingField("modules"))?;
        modules.push(normalize_module(module_obj, position as u32 + 1)?);
    }

    Ok(CourseDocument {
        title,
        description: coerce_string(obj.get("description")),
        difficulty: normalize_difficulty(obj.get("difficulty"))?,
        estimated_duration: normalize_duration(obj.get("estimated_duration"))?,
        learning_objectives: coerce_string_list(obj.get("learning_objectives")),
        skills: coerce_string_list(obj.get("skills")),
        modules,
        source_from: coerce_string_list(obj.get("source_from")),
        source_tracking: obj
            .get("source_tracking")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
    })
}

fn normalize_module(
    obj: &Map<String, Value>,
    index: u32,
) -> Result<Module, NormalizationError> {
    let lessons_raw = obj
        .get("lessons")
        .and_then(Value::as_array)
        .filter(|a| !a.is_empty())
        .ok_or(NormalizationError::MissingField("lessons"))?;

    let lessons = lessons_raw
        .iter()
        .enumerate()
        .map(|(position, lesson_value)| normalize_lesson(lesson_value, position as u32 + 1))
        .collect();

    let title = coerce_string(obj.get("title"));
    let quiz = normalize_quiz(obj.get("quiz"), &title);

    Ok(Module {
        title,
        index,
        lessons,
        quiz,
    })
}

/// Position is authoritative for indices; whatever the input carried is
/// discarded. A bare string is accepted as a title-only lesson.
fn normalize_lesson(value: &Value, index: u32) -> Lesson {
    match value {
        Value::String(title) => Lesson {
            title: title.clone(),
            index,
            content: String::new(),
        },
        Value::Object(obj) => Lesson {
            title: coerce_string(obj.get("title")),
            index,
            content: coerce_string(obj.get("content")),
        },
        _ => Lesson {
            title: String::new(),
            index,
            content: String::new(),
        },
    }
}

fn normalize_quiz(value: Option<&Value>, module_title: &str) -> Vec<QuizItem> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut quiz = Vec::with_capacity(items.len());
    for item in items {
        let Some(obj) = item.as_object() else {
            warn!("Dropping malformed quiz item in module {module_title:?}");
            continue;
        };

        let question = coerce_string(obj.get("question"));
        let answer = coerce_string(obj.get("answer"));
        let choices: BTreeMap<String, String> = obj
            .get("choices")
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(label, text)| {
                        text.as_str().map(|t| (label.clone(), t.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        if !choices.contains_key(&answer) {
            warn!(
                "Dropping quiz item in module {module_title:?}: answer {answer:?} is not among its choices"
            );
            continue;
        }

        quiz.push(QuizItem {
            question,
            choices,
            answer,
        });
    }
    quiz
}

fn normalize_difficulty(value: Option<&Value>) -> Result<Difficulty, NormalizationError> {
    match value {
        None | Some(Value::Null) => Ok(Difficulty::default()),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| NormalizationError::InvalidDifficulty { value: s.clone() }),
        Some(other) => Err(NormalizationError::InvalidDifficulty {
            value: other.to_string(),
        }),
    }
}

fn normalize_duration(value: Option<&Value>) -> Result<u32, NormalizationError> {
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => {
            if let Some(v) = n.as_u64() {
                Ok(v.min(u64::from(u32::MAX)) as u32)
            } else {
                first_integer(&n.to_string()).ok_or_else(|| {
                    NormalizationError::UnparsableDuration {
                        value: n.to_string(),
                    }
                })
            }
        }
        Some(Value::String(s)) => {
            first_integer(s).ok_or_else(|| NormalizationError::UnparsableDuration {
                value: s.clone(),
            })
        }
        Some(other) => Err(NormalizationError::UnparsableDuration {
            value: other.to_string(),
        }),
    }
}

/// First run of ASCII digits in `text`, saturating at `u32::MAX`.
fn first_integer(text: &str) -> Option<u32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if !digits.is_empty() {
            break;
        }
    }

    if digits.is_empty() {
        None
    } else {
        Some(
            digits
                .parse::<u64>()
                .map_or(u32::MAX, |v| v.min(u64::from(u32::MAX)) as u32),
        )
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn coerce_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_course() -> Value {
        json!({
            "title": "Rust Fundamentals",
            "modules": [
                {
                    "title": "Getting Started",
                    "lessons": [
                        {"title": "Installing", "content": "Use rustup."},
                        {"title": "Hello World", "content": "cargo new hello"}
                    ]
                }
            ]
        })
    }

    #[test]
    fn test_minimal_course_normalizes() {
        let doc = normalize(&minimal_course()).unwrap();
        assert_eq!(doc.title, "Rust Fundamentals");
        assert_eq!(doc.difficulty, Difficulty::Intermediate);
        assert_eq!(doc.estimated_duration, 0);
        assert!(doc.skills.is_empty());
        assert!(doc.source_from.is_empty());
        assert_eq!(doc.modules.len(), 1);
        assert_eq!(doc.modules[0].lessons.len(), 2);
    }

    #[test]
    fn test_prose_wrapped_reply_yields_course() {
        let reply = "Here is the course: {\"title\":\"T\",\"modules\":[{\"title\":\"M1\",\
                     \"lessons\":[{\"title\":\"L1\",\"content\":\"x\"}]}]} Hope that helps!";

        let value = crate::course::extract_json(reply).unwrap();
        let doc = normalize(&value).unwrap();

        assert_eq!(doc.title, "T");
        assert_eq!(doc.modules[0].index, 1);
        assert_eq!(doc.modules[0].lessons[0].index, 1);
        assert!(doc.skills.is_empty());
        assert!(doc.source_from.is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut raw = minimal_course();
        raw["estimated_duration"] = json!("about 10 hours");
        raw["difficulty"] = json!("beginner");
        raw["modules"][0]["quiz"] = json!([
            {"question": "q", "choices": {"A": "yes", "B": "no"}, "answer": "A"}
        ]);

        let first = normalize(&raw).unwrap();
        let serialized = serde_json::to_value(&first).unwrap();
        let second = normalize(&serialized).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_duration_takes_first_integer() {
        let mut raw = minimal_course();

        raw["estimated_duration"] = json!("approximately 10 hours");
        assert_eq!(normalize(&raw).unwrap().estimated_duration, 10);

        raw["estimated_duration"] = json!("8-12 hours");
        assert_eq!(normalize(&raw).unwrap().estimated_duration, 8);

        raw["estimated_duration"] = json!(12);
        assert_eq!(normalize(&raw).unwrap().estimated_duration, 12);
    }

    #[test]
    fn test_duration_without_digits_fails() {
        let mut raw = minimal_course();
        raw["estimated_duration"] = json!("a few evenings");
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, NormalizationError::UnparsableDuration { .. }));
        assert_eq!(err.field(), "estimated_duration");
    }

    #[test]
    fn test_indices_follow_position() {
        let raw = json!({
            "title": "T",
            "modules": [
                {"title": "M1", "index": 7, "lessons": [
                    {"title": "L1", "index": 9},
                    {"title": "L2", "index": 9}
                ]},
                {"title": "M2", "lessons": ["L1"]}
            ]
        });
        let doc = normalize(&raw).unwrap();
        assert_eq!(doc.modules[0].index, 1);
        assert_eq!(doc.modules[1].index, 2);
        assert_eq!(doc.modules[0].lessons[0].index, 1);
        assert_eq!(doc.modules[0].lessons[1].index, 2);
        assert_eq!(doc.modules[1].lessons[0].title, "L1");
        assert_eq!(doc.modules[1].lessons[0].index, 1);
    }

    #[test]
    fn test_quiz_item_with_unknown_answer_is_dropped() {
        let mut raw = minimal_course();
        raw["modules"][0]["quiz"] = json!([
            {"question": "keep", "choices": {"A": "a", "B": "b"}, "answer": "B"},
            {"question": "drop", "choices": {"A": "a", "B": "b"}, "answer": "E"},
            "not even an object"
        ]);
        let doc = normalize(&raw).unwrap();
        let quiz = &doc.modules[0].quiz;
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].question, "keep");
        assert_eq!(quiz[0].answer, "B");
    }

    #[test]
    fn test_quiz_may_become_empty() {
        let mut raw = minimal_course();
        raw["modules"][0]["quiz"] = json!([
            {"question": "q", "choices": {"A": "a"}, "answer": "Z"}
        ]);
        let doc = normalize(&raw).unwrap();
        assert!(doc.modules[0].quiz.is_empty());
    }

    #[test]
    fn test_difficulty_rules() {
        let mut raw = minimal_course();

        raw["difficulty"] = json!("advanced");
        assert_eq!(normalize(&raw).unwrap().difficulty, Difficulty::Advanced);

        raw["difficulty"] = json!(null);
        assert_eq!(
            normalize(&raw).unwrap().difficulty,
            Difficulty::Intermediate
        );

        raw["difficulty"] = json!("Expert");
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, NormalizationError::InvalidDifficulty { .. }));
        assert_eq!(err.field(), "difficulty");
    }

    #[test]
    fn test_missing_title_fails() {
        let raw = json!({"modules": [{"lessons": ["L"]}]});
        let err = normalize(&raw).unwrap_err();
        assert_eq!(err.field(), "title");

        let raw = json!({"title": "   ", "modules": [{"lessons": ["L"]}]});
        assert_eq!(normalize(&raw).unwrap_err().field(), "title");
    }

    #[test]
    fn test_empty_modules_fail() {
        let raw = json!({"title": "T", "modules": []});
        assert_eq!(normalize(&raw).unwrap_err().field(), "modules");

        let raw = json!({"title": "T"});
        assert_eq!(normalize(&raw).unwrap_err().field(), "modules");
    }

    #[test]
    fn test_module_without_lessons_fails() {
        let raw = json!({
            "title": "T",
            "modules": [{"title": "M", "lessons": []}]
        });
        assert_eq!(normalize(&raw).unwrap_err().field(), "lessons");
    }

    #[test]
    fn test_non_object_root_fails() {
        let err = normalize(&json!(["not", "a", "course"])).unwrap_err();
        assert!(matches!(err, NormalizationError::NotAnObject));
    }
}
