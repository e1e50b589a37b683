//! End-to-end pipeline tests: knowledge base answers, escalation and the
//! knowledge base file round trip.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use assist_connectors::{MockExternalSearch, MockGenerator};
use assist_index::KnowledgeIndex;
use assist_orchestrator::{ResponseSource, ESCALATION_CONFIDENCE};
use assist_retrieval::QueryIntent;
use assist_types::KnowledgeBase;
use e2e_tests::TestHarness;

/// A single "frais de transaction" entry answers "Quels sont vos frais ?".
#[tokio::test]
async fn test_fees_question_answered_from_single_entry() {
    let harness = TestHarness::with_document(json!([
        {"id": "frais", "question": "frais de transaction", "answer": "1% minimum 500"}
    ]));
    let orchestrator = harness.orchestrator();

    let result = orchestrator.respond("Quels sont vos frais ?", "alice").await;

    assert_eq!(result.source, ResponseSource::KnowledgeBase);
    assert!(result.text.contains("1% minimum 500"));
    assert!(result.confidence >= 0.5);
    assert!((result.confidence - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-4);
    assert_eq!(result.intent, Some(QueryIntent::SimpleFact));
    assert_eq!(result.topic.as_deref(), Some("frais"));
}

/// Exact questions from the sample answer with their own entry, plus
/// related questions resolved by id.
#[tokio::test]
async fn test_exact_question_with_related_suggestions() {
    let harness = TestHarness::new();
    let generator = Arc::new(MockGenerator::with_response("généré"));
    let orchestrator = harness.orchestrator_with(None, Some(generator.clone()));

    let result = orchestrator
        .respond("Quels sont vos frais de transaction ?", "bob")
        .await;

    assert_eq!(result.source, ResponseSource::KnowledgeBase);
    assert!(result.confidence >= 0.9);
    assert!(result.text.starts_with("**Quels sont vos frais de transaction ?**"));
    assert!(result.text.contains("- Quel est le délai de traitement d'un transfert ?"));
    assert!(result.text.contains("- Comment annuler un transfert ?"));
    assert_eq!(generator.call_count(), 0);
}

/// A variation reaches its entry.
#[tokio::test]
async fn test_variation_match() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator();

    let result = orchestrator.respond("Combien coûte un transfert ?", "carol").await;

    assert_eq!(result.source, ResponseSource::KnowledgeBase);
    assert!(result.text.contains("1% du montant"));
}

/// Escalation runs no other stage.
#[tokio::test]
async fn test_escalation_short_circuits_every_stage() {
    let harness = TestHarness::new();
    let external = Arc::new(MockExternalSearch::new());
    let generator = Arc::new(MockGenerator::with_response("généré"));
    let orchestrator = harness.orchestrator_with(Some(external.clone()), Some(generator.clone()));

    for (i, query) in [
        "Je veux parler à un humain",
        "C'est urgent, mes frais sont faux",
        "C'est inacceptable, une vraie arnaque",
        "I want to talk to a human please",
    ]
    .iter()
    .enumerate()
    {
        let result = orchestrator.respond(query, &format!("user-{i}")).await;
        assert_eq!(result.source, ResponseSource::Escalation, "{query}");
        assert_eq!(result.confidence, ESCALATION_CONFIDENCE);
    }

    assert_eq!(harness.knowledge.search_count(), 0);
    assert_eq!(external.call_count(), 0);
    assert_eq!(generator.call_count(), 0);
}

/// A single frustration word is not enough.
#[tokio::test]
async fn test_single_frustration_word_does_not_escalate() {
    let harness = TestHarness::new();
    let orchestrator = harness.orchestrator();

    let result = orchestrator
        .respond("Ce délai est ridicule", "dave")
        .await;

    assert!(result.source != ResponseSource::Escalation);
    assert_eq!(harness.knowledge.search_count(), 1);
}

/// Analysis questions go to generation even when the knowledge base matches.
#[tokio::test]
async fn test_generation_receives_context() {
    let harness = TestHarness::new();
    let generator = Arc::new(MockGenerator::with_response("Explication détaillée."));
    let orchestrator = harness.orchestrator_with(None, Some(generator.clone()));

    let result = orchestrator
        .respond("Pourquoi mon transfert échoue parfois ?", "erin")
        .await;

    assert_eq!(result.source, ResponseSource::Generation);
    assert_eq!(result.text, "Explication détaillée.");
    assert_eq!(result.confidence, harness.settings.thresholds.generation_confidence);
    assert_eq!(result.intent, Some(QueryIntent::ComplexAnalysis));

    let prompt = generator.last_prompt().unwrap();
    assert!(prompt.contains("QUESTION : Pourquoi mon transfert échoue parfois ?"));
    assert!(prompt.contains(&harness.settings.support.phone));
}

/// load -> build -> save -> load keeps every indexed entry unchanged.
#[test]
fn test_knowledge_base_round_trip() {
    let harness = TestHarness::new();
    let index = KnowledgeIndex::build(harness.knowledge_base.entries().iter().cloned());

    let indexed: Vec<_> = index.entries().iter().map(|e| (**e).clone()).collect();
    let saved_path = harness.kb_path.with_file_name("saved.json");
    KnowledgeBase::new(indexed.clone()).save(&saved_path).unwrap();

    let reloaded = KnowledgeBase::load(&saved_path).unwrap();
    assert!(reloaded.skipped().is_empty());
    assert_eq!(reloaded.entries(), indexed.as_slice());

    let rebuilt = KnowledgeIndex::build(reloaded.into_entries());
    assert_eq!(rebuilt.len(), index.len());
    assert_eq!(rebuilt.vector_count(), index.vector_count());
}
