//! Content generation tests: caching, access, prompt limits, parsing failures
//! and concurrency, using in-memory decks and a canned model.

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use deckstudy::errors::AppError;
use deckstudy::generation::{ArtifactKind, Requester};
use deckstudy::storage::ArtifactStore;
use common::*;

const FLASHCARDS_REPLY: &str = r#"{"flashcards":[{"q":"What produces ATP?","a":"Mitochondria","refs":[2],"difficulty":"easy"}]}"#;

fn owner() -> Requester {
    Requester { user_id: Some(1), share_code: None }
}

#[tokio::test]
async fn test_summary_is_generated_and_tagged_with_model() {
    let model = FakeModel::replying("# Overview\nCells make energy (Slide 2)");
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let artifact = generator
        .generate(DECK_ID, ArtifactKind::Summary, &owner())
        .await
        .expect("summary generation failed");

    assert_eq!(artifact["deckId"], DECK_ID);
    assert_eq!(artifact["type"], "summary");
    assert_eq!(artifact["model"], MODEL_NAME);
    assert_eq!(artifact["summary"], "# Overview\nCells make energy (Slide 2)");
    assert!(artifact["createdAt"].is_string());

    let request = model.last_request().expect("model was not called");
    assert!(!request.json_mode);
    assert!(request.user.starts_with("Slide content:\nSlide 1\nTitle: Intro\nBullets:\n- a\n- b"));
    assert!(request.user.contains("Mitochondria produce ATP"));
}

#[tokio::test]
async fn test_second_request_is_served_from_cache() {
    let model = FakeModel::replying(FLASHCARDS_REPLY);
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let first = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();
    let second = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();

    assert_eq!(model.calls(), 1);
    assert_eq!(first, second);
    assert!(store.path_for(DECK_ID, ArtifactKind::Flashcards).unwrap().exists());

    let stored = store.get(DECK_ID, ArtifactKind::Flashcards).await.unwrap().unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn test_cached_file_is_served_even_when_incomplete() {
    let model = FakeModel::replying("# Regenerated");
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, store, generator) = setup_generator(FakeAccess::allow_all(), slides.clone(), Some(model.clone()));

    // Written by an older version: no `model` field.
    let path = store.path_for(DECK_ID, ArtifactKind::Summary).unwrap();
    let on_disk = r#"{"deckId":"deck-1","type":"summary","summary":"My own notes","createdAt":"2024-05-01T10:00:00.000Z"}"#;
    std::fs::write(&path, on_disk).unwrap();

    let artifact = generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await.unwrap();

    assert_eq!(artifact["summary"], "My own notes");
    assert_eq!(model.calls(), 0);
    assert_eq!(slides.loads(), 0);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk);
}

#[tokio::test]
async fn test_cache_hit_is_returned_verbatim() {
    let model = FakeModel::replying(FLASHCARDS_REPLY);
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let on_disk = json!({
        "deckId": DECK_ID,
        "type": "flashcards",
        "flashcards": [
            { "q": "Q1", "a": "A1", "refs": [1], "difficulty": "medium", "starred": true }
        ],
        "createdAt": "2024-05-01T10:00:00.000Z",
        "model": "gpt-4",
    });
    let path = store.path_for(DECK_ID, ArtifactKind::Flashcards).unwrap();
    std::fs::write(&path, serde_json::to_vec_pretty(&on_disk).unwrap()).unwrap();

    let artifact = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();

    assert_eq!(artifact, on_disk);
    assert_eq!(artifact["flashcards"][0]["starred"], true);
    assert_eq!(artifact["createdAt"], "2024-05-01T10:00:00.000Z");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_kinds_are_cached_independently() {
    let model = FakeModel::replying(FLASHCARDS_REPLY);
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();
    generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await.unwrap();

    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_access_denied_before_reading_slides() {
    let model = FakeModel::replying("unused");
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, store, generator) =
        setup_generator(FakeAccess::deny_all(), slides.clone(), Some(model.clone()));

    let result = generator
        .generate(DECK_ID, ArtifactKind::Summary, &Requester::default())
        .await;

    assert!(matches!(result, Err(AppError::AccessDenied)));
    assert_eq!(slides.loads(), 0);
    assert_eq!(model.calls(), 0);
    assert!(!store.path_for(DECK_ID, ArtifactKind::Summary).unwrap().exists());
}

#[tokio::test]
async fn test_missing_api_key_fails_before_access_check() {
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides.clone(), None);

    let result = generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await;

    assert!(matches!(result, Err(AppError::MissingApiKey)));
    assert!(matches!(generator.ensure_model(), Err(AppError::MissingApiKey)));
    assert_eq!(slides.loads(), 0);
}

#[tokio::test]
async fn test_missing_deck_source_is_not_found() {
    let model = FakeModel::replying("unused");
    let slides = CountingSlides::with_deck("other-deck", sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let result = generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await;

    match result {
        Err(AppError::NotFound(msg)) => assert_eq!(msg, "Deck not found"),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_empty_deck_yields_empty_flashcards() {
    let model = FakeModel::replying(r#"{"flashcards": []}"#);
    let slides = CountingSlides::with_deck(DECK_ID, vec![]);
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let artifact = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();

    assert_eq!(artifact["flashcards"], json!([]));
    let request = model.last_request().unwrap();
    assert!(request.json_mode);
    assert!(request.user.starts_with("Slide content:\n\n\n"));
}

#[tokio::test]
async fn test_prompt_holds_at_most_sixty_slides() {
    let model = FakeModel::replying("ok");
    let many: Vec<_> = (1..=100).map(|i| slide(i, &format!("Topic {i}"), &[])).collect();
    let slides = CountingSlides::with_deck(DECK_ID, many);
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await.unwrap();

    let request = model.last_request().unwrap();
    assert_eq!(request.user.matches("\nTitle: ").count(), 60);
    assert!(request.user.contains("Slide 60\nTitle: Topic 60"));
    assert!(!request.user.contains("Slide 61\n"));
}

#[tokio::test]
async fn test_malformed_model_output_is_not_cached() {
    let model = FakeModel::replying("Sure! Here are your flashcards: none");
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));

    let result = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await;

    assert!(matches!(result, Err(AppError::MalformedModelOutput(_))));
    assert!(!store.path_for(DECK_ID, ArtifactKind::Flashcards).unwrap().exists());

    // A later request tries the model again.
    let _ = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await;
    assert_eq!(model.calls(), 2);
}

#[tokio::test]
async fn test_json_wrapped_in_prose_is_recovered() {
    let reply = format!("Here you go:\n```json\n{FLASHCARDS_REPLY}\n```");
    let model = FakeModel::replying(&reply);
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model));

    let artifact = generator.generate(DECK_ID, ArtifactKind::Flashcards, &owner()).await.unwrap();

    let flashcards = artifact["flashcards"].as_array().expect("expected flashcards");
    assert_eq!(flashcards.len(), 1);
    assert_eq!(flashcards[0]["a"], "Mitochondria");
    assert_eq!(flashcards[0]["refs"], json!([2]));
}

#[tokio::test]
async fn test_exam_without_exam_key_is_null() {
    let model = FakeModel::replying(r#"{"questions": []}"#);
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model));

    let artifact = generator.generate(DECK_ID, ArtifactKind::Exam, &owner()).await.unwrap();

    assert_eq!(artifact["type"], "exam");
    assert!(artifact.get("exam").is_some_and(Value::is_null));
}

#[tokio::test]
async fn test_concurrent_first_requests_call_model_once() {
    let model = FakeModel::slow("# Summary", Duration::from_millis(50));
    let slides = CountingSlides::with_deck(DECK_ID, sample_slides());
    let (_dir, _store, generator) = setup_generator(FakeAccess::allow_all(), slides, Some(model.clone()));
    let generator = Arc::new(generator);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = generator.clone();
            tokio::spawn(async move { generator.generate(DECK_ID, ArtifactKind::Summary, &owner()).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(model.calls(), 1);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}
