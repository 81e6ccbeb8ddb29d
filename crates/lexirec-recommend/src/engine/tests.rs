//! Tests for RecommendationEngine.

use super::*;
use crate::ranking::cosine_similarity;
use crate::results::RelaxationTier;
use lexirec_embeddings::{HashEmbeddingModel, vector_from_bytes};
use lexirec_store::ContentStore;
use std::sync::Arc;

fn engine() -> RecommendationEngine {
    let store = Arc::new(ContentStore::open_in_memory().unwrap());
    store.upsert_language("es", "Spanish").unwrap();
    store.upsert_language("en", "English").unwrap();
    RecommendationEngine::new(store, Arc::new(HashEmbeddingModel::new()))
}

fn add_lesson(
    engine: &RecommendationEngine,
    title_key: &str,
    level: &str,
    lesson_type: &str,
    sequence: i64,
    title: &str,
    content: &str,
) -> i64 {
    let store = engine.store();
    let lesson_id = store
        .insert_lesson(title_key, level, lesson_type, sequence, 1)
        .unwrap();
    store
        .insert_lesson_localization(lesson_id, "es", "en", title, content, false)
        .unwrap();
    lesson_id
}

fn add_exercise(
    engine: &RecommendationEngine,
    lesson_id: i64,
    exercise_type: &str,
    question: &str,
    options: &[&str],
) -> i64 {
    let store = engine.store();
    let exercise_id = store.insert_exercise(lesson_id, exercise_type, 10).unwrap();
    let loc_id = store
        .insert_exercise_localization(exercise_id, "es", "en", question, None)
        .unwrap();
    for (i, text) in options.iter().enumerate() {
        store.insert_exercise_option(loc_id, text, i == 0).unwrap();
    }
    exercise_id
}

/// A small A1 greetings catalog: one multiple-choice base exercise plus
/// same-lesson companions sharing most of their text.
fn greetings_catalog(engine: &RecommendationEngine) -> (i64, i64, i64) {
    let lesson = add_lesson(
        engine,
        "greetings_basics",
        "A1",
        "vocabulary",
        10,
        "Greetings basics",
        "Common greetings and farewells",
    );
    let base = add_exercise(
        engine,
        lesson,
        "multiple_choice",
        "How do you say hola in English?",
        &["hello", "goodbye"],
    );
    let same_type = add_exercise(
        engine,
        lesson,
        "multiple_choice",
        "How do you say adios in English?",
        &["goodbye", "hello"],
    );
    let other_type = add_exercise(
        engine,
        lesson,
        "translation",
        "How do you say buenos dias in English?",
        &[],
    );
    (base, same_type, other_type)
}

fn stored_vector(engine: &RecommendationEngine, exercise_id: i64) -> Vec<f32> {
    let record = engine.store().get_embedding(exercise_id).unwrap().unwrap();
    vector_from_bytes(&record.vector, record.dim as usize).unwrap()
}

fn attempt(user_id: i64, exercise_id: i64, is_correct: bool) -> AttemptInput {
    AttemptInput {
        user_id,
        exercise_id,
        is_correct,
        score: None,
        topic: None,
        skill: None,
        answer: None,
    }
}

// ============================================
// Indexing
// ============================================

#[test]
fn test_index_exercise_stores_vector() {
    let engine = engine();
    let (base, _, _) = greetings_catalog(&engine);

    assert!(engine.index_exercise(base).unwrap());

    let record = engine.store().get_embedding(base).unwrap().unwrap();
    assert_eq!(record.dim as usize, engine.model.dimension());
    assert_eq!(record.vector.len(), record.dim as usize * 4);
}

#[test]
fn test_index_exercise_skips_unlocalized() {
    let engine = engine();
    let lesson = engine
        .store()
        .insert_lesson("bare", "A1", "vocabulary", 10, 1)
        .unwrap();
    let exercise = engine
        .store()
        .insert_exercise(lesson, "multiple_choice", 10)
        .unwrap();

    assert!(!engine.index_exercise(exercise).unwrap());
    assert!(engine.store().get_embedding(exercise).unwrap().is_none());
}

#[test]
fn test_index_exercise_missing_id() {
    let engine = engine();
    assert!(!engine.index_exercise(4242).unwrap());
}

#[test]
fn test_index_all_is_idempotent() {
    let engine = engine();
    greetings_catalog(&engine);

    let first = engine.index_all().unwrap();
    assert_eq!(first, 3);
    let second = engine.index_all().unwrap();
    assert_eq!(second, first);

    assert_eq!(engine.store().get_stats().unwrap().embedding_count, 3);
}

#[test]
fn test_index_all_skips_empty_text() {
    let engine = engine();
    greetings_catalog(&engine);
    let bare_lesson = engine
        .store()
        .insert_lesson("bare", "A1", "vocabulary", 99, 1)
        .unwrap();
    engine
        .store()
        .insert_exercise(bare_lesson, "multiple_choice", 10)
        .unwrap();

    assert_eq!(engine.index_all().unwrap(), 3);
}

// ============================================
// Similarity retrieval
// ============================================

#[test]
fn test_similar_strictest_tier_wins() {
    let engine = engine();
    let (base, same_type, _other_type) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();

    assert_eq!(result.tier, Some(RelaxationTier::TopicAndType));
    let ids: Vec<i64> = result.items.iter().map(|r| r.exercise.id).collect();
    assert_eq!(ids, vec![same_type]);
    assert!(
        result
            .items
            .iter()
            .all(|r| r.exercise.exercise_type == "multiple_choice")
    );
}

#[test]
fn test_similar_relaxes_type_when_needed() {
    let engine = engine();
    let lesson = add_lesson(
        &engine,
        "greetings_basics",
        "A1",
        "vocabulary",
        10,
        "Greetings basics",
        "Common greetings and farewells",
    );
    let base = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "How do you say hola in English?",
        &["hello", "goodbye"],
    );
    let other_type = add_exercise(
        &engine,
        lesson,
        "translation",
        "How do you say buenos dias in English?",
        &[],
    );
    engine.index_all().unwrap();

    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();

    assert_eq!(result.tier, Some(RelaxationTier::TopicOnly));
    assert_eq!(result.items[0].exercise.id, other_type);
}

#[test]
fn test_similar_tier_skipped_when_below_floor() {
    let engine = engine();
    // Base and a same-lesson translation exercise sharing most of their
    // text, plus a same-topic same-type exercise with unrelated text. The
    // colors exercise matches tier 1 structurally but cannot clear a high
    // similarity floor.
    let lesson = add_lesson(
        &engine,
        "greetings_basics",
        "A1",
        "vocabulary",
        10,
        "Greetings basics",
        "Common greetings and farewells",
    );
    let base = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "How do you say hola in English?",
        &["hello", "goodbye"],
    );
    let near_duplicate = add_exercise(
        &engine,
        lesson,
        "translation",
        "How do you say buenos dias in English?",
        &[],
    );
    let colors = add_lesson(
        &engine,
        "colors_basics",
        "A1",
        "vocabulary",
        200,
        "Colors and shapes",
        "Learn the basic colors",
    );
    let colors_exercise = add_exercise(
        &engine,
        colors,
        "multiple_choice",
        "Which color is the sky?",
        &["blue", "red"],
    );
    engine.index_all().unwrap();

    // Permissive floor: the strictest tier matches with the colors exercise.
    let permissive = engine
        .similar_detailed(base, 10, 0.10, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert_eq!(permissive.tier, Some(RelaxationTier::TopicAndType));
    assert_eq!(permissive.items[0].exercise.id, colors_exercise);

    // Strict floor: tier 1 comes back empty, tier 2 still has the
    // near-duplicate translation exercise.
    let strict = engine
        .similar_detailed(base, 10, 0.75, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert_eq!(strict.tier, Some(RelaxationTier::TopicOnly));
    assert_eq!(strict.items[0].exercise.id, near_duplicate);
}

#[test]
fn test_similar_returns_empty_when_nothing_clears_floor() {
    let engine = engine();
    let (base, _, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let result = engine
        .similar_detailed(base, 10, 0.999, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert!(result.is_empty());
    assert_eq!(result.tier, None);
}

#[test]
fn test_similar_excludes_unindexed_candidates() {
    let engine = engine();
    let (base, same_type, other_type) = greetings_catalog(&engine);
    // Index only the base; candidates lack embeddings and are excluded.
    engine.index_exercise(base).unwrap();

    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert!(result.is_empty());

    engine.index_exercise(same_type).unwrap();
    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    let ids: Vec<i64> = result.items.iter().map(|r| r.exercise.id).collect();
    assert_eq!(ids, vec![same_type]);
    assert!(!ids.contains(&other_type));
}

#[test]
fn test_similar_lazily_indexes_base() {
    let engine = engine();
    let (base, same_type, other_type) = greetings_catalog(&engine);
    engine.index_exercise(same_type).unwrap();
    engine.index_exercise(other_type).unwrap();
    assert!(engine.store().get_embedding(base).unwrap().is_none());

    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();

    assert!(!result.is_empty());
    assert!(engine.store().get_embedding(base).unwrap().is_some());
}

#[test]
fn test_similar_respects_level_boundary() {
    let engine = engine();
    let (base, _, _) = greetings_catalog(&engine);
    let b2_lesson = add_lesson(
        &engine,
        "greetings_advanced",
        "B2",
        "vocabulary",
        20,
        "Greetings basics",
        "Common greetings and farewells",
    );
    let b2_exercise = add_exercise(
        &engine,
        b2_lesson,
        "multiple_choice",
        "How do you say hola in English?",
        &["hello", "goodbye"],
    );
    engine.index_all().unwrap();

    let result = engine
        .similar_detailed(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert!(
        result.items.iter().all(|r| r.exercise.id != b2_exercise),
        "a B2 exercise must never be suggested for an A1 base"
    );
}

#[test]
fn test_query_text_drives_retrieval() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let query = "Greetings basics common greetings and farewells \
                 how do you say adios in English goodbye hello";
    let results = engine
        .similar_exercises(base, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, Some(query))
        .unwrap();

    assert!(!results.is_empty());
    assert_eq!(results[0].exercise.id, same_type);
}

#[test]
fn test_similar_unknown_base_is_empty() {
    let engine = engine();
    let result = engine
        .similar_detailed(777, 10, DEFAULT_MIN_SIM, DEFAULT_MMR_LAMBDA, None)
        .unwrap();
    assert!(result.is_empty());
}

// ============================================
// Attempts and weakness tracking
// ============================================

#[test]
fn test_record_attempt_unknown_exercise_fails() {
    let engine = engine();
    assert!(engine.record_attempt(attempt(1, 999, false)).is_err());
}

#[test]
fn test_correct_attempt_updates_weakness_without_queueing() {
    let engine = engine();
    let (base, _, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let outcome = engine.record_attempt(attempt(1, base, true)).unwrap();
    assert_eq!(outcome.queued, 0);
    assert_eq!(outcome.weakness.attempts, 1);
    assert_eq!(outcome.weakness.errors, 0);
    assert_eq!(outcome.weakness.error_rate, 0.0);
    assert_eq!(outcome.weakness.priority, 0.0);
    assert_eq!(outcome.weakness.topic, "vocabulary");
    assert_eq!(outcome.weakness.skill, "reading");

    assert!(engine.store().unserved_for(1, 10).unwrap().is_empty());
}

#[test]
fn test_failed_attempt_queues_similar_exercise() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let outcome = engine.record_attempt(attempt(1, base, false)).unwrap();
    assert!(outcome.queued >= 1);
    assert_eq!(outcome.weakness.priority, 0.5);

    let queued = engine.store().unserved_for(1, 10).unwrap();
    let entry = queued
        .iter()
        .find(|r| r.exercise_id == same_type)
        .expect("similar exercise should be queued");
    assert!(!entry.served);
    assert_eq!(entry.reason, "Vocabulary for this topic");

    // Score follows the published formula; both exercises share a lesson,
    // so the sequence-proximity bonus applies.
    let sim = cosine_similarity(
        &stored_vector(&engine, base),
        &stored_vector(&engine, same_type),
    );
    let expected = 0.72 * sim as f64 + 0.25 * 0.5 + 0.1;
    assert!((entry.score - expected).abs() < 1e-6);
}

#[test]
fn test_queue_skips_attempted_and_duplicate_questions() {
    let engine = engine();
    let lesson = add_lesson(
        &engine,
        "greetings_basics",
        "A1",
        "vocabulary",
        10,
        "Greetings basics",
        "Common greetings and farewells",
    );
    let base = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "How do you say hola in English?",
        &["hello", "goodbye"],
    );
    let already_attempted = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "How do you say adios in English?",
        &["goodbye", "hello"],
    );
    let duplicate_question = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "HOW DO YOU SAY HOLA IN ENGLISH?",
        &["hello", "goodbye"],
    );
    let fresh = add_exercise(
        &engine,
        lesson,
        "multiple_choice",
        "How do you say gracias in English?",
        &["thanks", "please"],
    );
    engine.index_all().unwrap();

    engine
        .record_attempt(attempt(1, already_attempted, true))
        .unwrap();
    engine.record_attempt(attempt(1, base, false)).unwrap();

    let queued: Vec<i64> = engine
        .store()
        .unserved_for(1, 20)
        .unwrap()
        .iter()
        .map(|r| r.exercise_id)
        .collect();

    assert!(queued.contains(&fresh));
    assert!(!queued.contains(&already_attempted));
    assert!(!queued.contains(&duplicate_question));
    assert!(!queued.contains(&base));
}

#[test]
fn test_repeat_failure_does_not_duplicate_queue_rows() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    engine.record_attempt(attempt(1, base, false)).unwrap();
    engine.record_attempt(attempt(1, base, false)).unwrap();

    let rows = engine.store().unserved_for(1, 50).unwrap();
    let for_same_type = rows.iter().filter(|r| r.exercise_id == same_type).count();
    assert_eq!(for_same_type, 1);
}

#[test]
fn test_priority_stays_clamped() {
    let engine = engine();
    let lesson = add_lesson(&engine, "solo", "A1", "vocabulary", 10, "Solo", "only one");
    let exercise = add_exercise(&engine, lesson, "multiple_choice", "only question", &["a"]);

    for _ in 0..5 {
        let outcome = engine.record_attempt(attempt(1, exercise, false)).unwrap();
        assert!((0.0..=1.0).contains(&outcome.weakness.priority));
    }
    let weakness = engine
        .store()
        .get_weakness(1, "vocabulary", "reading")
        .unwrap()
        .unwrap();
    assert_eq!(weakness.priority, 1.0);

    for _ in 0..20 {
        let outcome = engine.record_attempt(attempt(1, exercise, true)).unwrap();
        assert!((0.0..=1.0).contains(&outcome.weakness.priority));
    }
    let weakness = engine
        .store()
        .get_weakness(1, "vocabulary", "reading")
        .unwrap()
        .unwrap();
    assert_eq!(weakness.priority, 0.0);
}

#[test]
fn test_error_rate_is_exact() {
    let engine = engine();
    let lesson = add_lesson(&engine, "solo", "A1", "vocabulary", 10, "Solo", "only one");
    let exercise = add_exercise(&engine, lesson, "multiple_choice", "only question", &["a"]);

    let outcomes = [false, true, false, true, true, false];
    for &is_correct in &outcomes {
        engine
            .record_attempt(attempt(1, exercise, is_correct))
            .unwrap();
    }

    let weakness = engine
        .store()
        .get_weakness(1, "vocabulary", "reading")
        .unwrap()
        .unwrap();
    assert_eq!(weakness.attempts, 6);
    assert_eq!(weakness.errors, 3);
    assert_eq!(weakness.error_rate, 3.0 / 6.0);
}

#[test]
fn test_blank_answer_falls_back_to_base_embedding() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();

    let mut input = attempt(1, base, false);
    input.answer = Some("   ".to_string());
    let outcome = engine.record_attempt(input).unwrap();

    assert!(outcome.queued >= 1);
    let queued: Vec<i64> = engine
        .store()
        .unserved_for(1, 10)
        .unwrap()
        .iter()
        .map(|r| r.exercise_id)
        .collect();
    assert!(queued.contains(&same_type));

    let logged = engine.store().last_failed_attempt(1).unwrap().unwrap();
    assert_eq!(logged.user_answer.as_deref(), Some("   "));
}

// ============================================
// Due-list fallbacks
// ============================================

#[test]
fn test_due_for_serves_queue_first() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();
    engine.record_attempt(attempt(1, base, false)).unwrap();

    let due = engine.due_for(1, 5).unwrap();
    assert!(due.iter().any(|e| e.id == same_type));
}

#[test]
fn test_due_for_falls_back_to_last_failure_similars() {
    let engine = engine();
    let (base, same_type, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();
    engine.record_attempt(attempt(1, base, false)).unwrap();

    // Drain the queue so the first tier is empty; the failed attempt stays
    // in the log.
    let rows = engine.store().unserved_for(1, 50).unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    engine.store().mark_served(&ids).unwrap();

    let due = engine.due_for(1, 5).unwrap();
    assert!(!due.is_empty());
    assert!(due.iter().any(|e| e.id == same_type));
}

#[test]
fn test_due_for_weak_topic_fallback() {
    let engine = engine();
    // A catalog with a dedicated "numbers" topic; the user has a weakness
    // row but no attempts and no queue entries.
    let numbers = add_lesson(
        &engine,
        "numbers_basics",
        "A1",
        "numbers",
        10,
        "Numbers",
        "Counting from one to ten",
    );
    add_exercise(
        &engine,
        numbers,
        "multiple_choice",
        "What comes after one?",
        &["two", "five"],
    );
    add_exercise(
        &engine,
        numbers,
        "multiple_choice",
        "What comes after two?",
        &["three", "nine"],
    );
    let grammar = add_lesson(&engine, "grammar_1", "A1", "grammar", 20, "Grammar", "Verbs");
    add_exercise(&engine, grammar, "fill_blank", "Conjugate ser", &[]);

    let store = engine.store();
    let mut weak = store.get_or_create_weakness(9, "numbers", "reading").unwrap();
    weak.attempts = 4;
    weak.errors = 3;
    weak.error_rate = 0.75;
    weak.priority = 0.9;
    store.update_weakness(&weak).unwrap();
    let mut mild = store.get_or_create_weakness(9, "grammar", "writing").unwrap();
    mild.attempts = 2;
    mild.errors = 0;
    mild.priority = 0.1;
    store.update_weakness(&mild).unwrap();

    let due = engine.due_for(9, 5).unwrap();
    assert!(!due.is_empty());
    assert!(due.len() <= 5);
    assert!(due.iter().all(|e| e.lesson_type == "numbers"));
}

#[test]
fn test_due_for_global_fallback_for_new_user() {
    let engine = engine();
    let (base, same_type, other_type) = greetings_catalog(&engine);

    let due = engine.due_for(42, 5).unwrap();
    let ids: Vec<i64> = due.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![base, same_type, other_type]);

    let due_limited = engine.due_for(42, 2).unwrap();
    assert_eq!(due_limited.len(), 2);
}

#[test]
fn test_due_for_empty_catalog() {
    let engine = engine();
    assert!(engine.due_for(1, 10).unwrap().is_empty());
}

// ============================================
// Serving recommendations
// ============================================

#[test]
fn test_take_recommendations_marks_served() {
    let engine = engine();
    let (base, _, _) = greetings_catalog(&engine);
    engine.index_all().unwrap();
    engine.record_attempt(attempt(1, base, false)).unwrap();

    let first = engine.take_recommendations(1, 20).unwrap();
    assert!(!first.is_empty());
    for pair in first.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let second = engine.take_recommendations(1, 20).unwrap();
    assert!(second.is_empty());
}
