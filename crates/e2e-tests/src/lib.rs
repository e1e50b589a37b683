//! End-to-end test infrastructure for support-assist.
//!
//! Provides a shared TestHarness that writes a sample knowledge base to a
//! temp directory, loads and indexes it, and wires an orchestrator with
//! scripted collaborators.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};

use assist_connectors::{MockExternalSearch, MockGenerator};
use assist_index::{KnowledgeIndex, KnowledgeSearch, SearchResult};
use assist_orchestrator::Orchestrator;
use assist_types::{KnowledgeBase, QaEntry, QaId, Settings};

/// Knowledge index that counts searches.
pub struct CountingKnowledge {
    index: KnowledgeIndex,
    searches: AtomicUsize,
}

impl CountingKnowledge {
    pub fn new(index: KnowledgeIndex) -> Self {
        Self {
            index,
            searches: AtomicUsize::new(0),
        }
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

impl KnowledgeSearch for CountingKnowledge {
    fn search(&self, query: &str, top_k: usize, min_score: f32) -> Vec<SearchResult> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.index.search(query, top_k, min_score)
    }

    fn get(&self, id: &QaId) -> Option<Arc<QaEntry>> {
        self.index.get(id)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}

/// Sample knowledge base document.
///
/// Mixes canonical and legacy French field names, integer and string ids,
/// one entry with a blank question and one entry with no question at all.
pub fn sample_kb_document() -> Value {
    json!({
        "qa_pairs": [
            {
                "id": 1,
                "question": "Quels sont vos frais de transaction ?",
                "variations": ["Combien coûte un transfert ?", "Quel est le tarif d'un envoi ?"],
                "answer": "Les frais sont de 1% du montant, avec un minimum de 500 F CFA.",
                "category": "frais",
                "related_ids": [2, "6"]
            },
            {
                "id": "2",
                "question_principale": "Quel est le délai de traitement d'un transfert ?",
                "reponse": "La plupart des transferts sont traités en moins de 2 heures.",
                "categorie": "delais",
                "questions_connexes": ["1"]
            },
            {
                "id": "3",
                "question": "Comment sécuriser mon compte ?",
                "answer": "Activez la double authentification et ne partagez jamais votre code.",
                "category": "securite"
            },
            {
                "id": "4",
                "question": "Comment créer un compte ?",
                "answer": "Téléchargez l'application et suivez les étapes d'inscription.",
                "category": "compte"
            },
            {
                "id": "5",
                "question": "Quels pays sont couverts ?",
                "answer": "Burkina Faso, Mali, Côte d'Ivoire et Sénégal.",
                "category": "general"
            },
            {
                "id": "6",
                "question": "Comment annuler un transfert ?",
                "answer": "Un transfert non retiré peut être annulé depuis l'historique.",
                "category": "transfert"
            },
            {
                "id": "7",
                "question": "Quels moyens de paiement acceptez-vous ?",
                "answer": "Orange Money, Moov Money et carte bancaire.",
                "category": "transfert"
            },
            {
                "id": "8",
                "question": "Puis-je recevoir de l'argent sur mon portefeuille mobile ?",
                "answer": "Oui, les fonds arrivent instantanément sur votre portefeuille mobile money.",
                "category": "transfert"
            },
            {
                "id": "9",
                "question": "  ?  ",
                "answer": "Entrée sans question exploitable."
            },
            {
                "id": "10",
                "answer": "Entrée sans question."
            }
        ]
    })
}

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Knowledge base file written by the harness
    pub kb_path: PathBuf,
    pub knowledge_base: KnowledgeBase,
    pub knowledge: Arc<CountingKnowledge>,
    pub settings: Settings,
}

impl TestHarness {
    /// Harness over the sample knowledge base.
    pub fn new() -> Self {
        Self::with_document(sample_kb_document())
    }

    /// Harness over an arbitrary knowledge base document.
    pub fn with_document(document: Value) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let kb_path = temp_dir.path().join("knowledge_base.json");
        std::fs::write(
            &kb_path,
            serde_json::to_string_pretty(&document).expect("Failed to serialize document"),
        )
        .expect("Failed to write knowledge base");

        let knowledge_base = KnowledgeBase::load(&kb_path).expect("Failed to load knowledge base");
        let index = KnowledgeIndex::build(knowledge_base.entries().iter().cloned());

        let mut settings = Settings::default();
        settings.knowledge_base_path = kb_path.to_string_lossy().to_string();

        Self {
            _temp_dir: temp_dir,
            kb_path,
            knowledge_base,
            knowledge: Arc::new(CountingKnowledge::new(index)),
            settings,
        }
    }

    /// Orchestrator with no external search and no generator.
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.knowledge.clone(), self.settings.clone())
    }

    /// Orchestrator wired to the given scripted collaborators.
    pub fn orchestrator_with(
        &self,
        external: Option<Arc<MockExternalSearch>>,
        generator: Option<Arc<MockGenerator>>,
    ) -> Orchestrator {
        let mut orchestrator = self.orchestrator();
        if let Some(external) = external {
            orchestrator = orchestrator.with_external_search(external);
        }
        if let Some(generator) = generator {
            orchestrator = orchestrator.with_generator(generator);
        }
        orchestrator
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Queries that match nothing in the sample knowledge base.
pub const OFF_TOPIC_QUERIES: &[&str] = &[
    "Météo à Ouagadougou demain",
    "Recette du riz gras",
    "Résultat du match hier soir",
];
