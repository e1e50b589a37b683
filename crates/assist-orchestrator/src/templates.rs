//! Static response templates.
//!
//! Used when neither the knowledge base, external search nor generation
//! produced an answer, and for the fixed escalation and error responses.
//! Every template quotes the configured support contact.

use std::collections::HashMap;

use assist_index::{contains_keyword, normalize};
use assist_retrieval::QueryIntent;
use assist_types::SupportContact;

const GREETING_WORDS: &[&str] = &["bonjour", "bonsoir", "salut", "slt", "coucou", "hello"];

const PRESENTATION_WORDS: &[&str] = &["c est quoi", "qu est ce", "presentation", "qui etes vous"];

/// Template texts keyed by topic and intent.
#[derive(Debug, Clone)]
pub struct TemplateBook {
    contact: SupportContact,
    topics: HashMap<String, String>,
}

impl TemplateBook {
    pub fn new(contact: SupportContact) -> Self {
        let mut book = Self {
            contact,
            topics: HashMap::new(),
        };
        book.topics = book.default_topic_templates();
        book
    }

    /// Replace or add the template for a topic.
    pub fn with_topic_template(mut self, topic: impl Into<String>, text: impl Into<String>) -> Self {
        self.topics.insert(topic.into(), text.into());
        self
    }

    pub fn contact(&self) -> &SupportContact {
        &self.contact
    }

    fn contact_block(&self) -> String {
        format!(
            "**Contacter notre support :**\n- Téléphone : {}\n- Email : {}\n- Horaires : {}",
            self.contact.phone, self.contact.email, self.contact.hours
        )
    }

    fn default_topic_templates(&self) -> HashMap<String, String> {
        let c = &self.contact;
        let mut topics = HashMap::new();
        topics.insert(
            "frais".to_string(),
            format!(
                "**Frais {brand}**\n\n\
                 Les frais dépendent du type de transfert et sont toujours affichés avant \
                 validation, sans frais cachés. Montants exprimés en {currency}.\n\n\
                 Pour un devis précis, appelez le {phone}.",
                brand = c.brand,
                currency = c.currency,
                phone = c.phone
            ),
        );
        topics.insert(
            "delais".to_string(),
            format!(
                "**Délais de traitement**\n\n\
                 La plupart des transferts sont traités en quelques heures, et les envois \
                 vers le mobile money sont instantanés. Le suivi est disponible en temps \
                 réel dans l'application.\n\n\
                 Un transfert en retard ? Appelez le {}.",
                c.phone
            ),
        );
        topics.insert(
            "securite".to_string(),
            format!(
                "**Sécurité de vos transactions**\n\n\
                 Vos données sont chiffrées et chaque opération sensible est confirmée. \
                 Ne communiquez jamais votre code ou mot de passe, même à un conseiller.\n\n\
                 Activité suspecte ? Contactez immédiatement le {}.",
                c.phone
            ),
        );
        topics.insert(
            "compte".to_string(),
            format!(
                "**Votre compte {}**\n\n\
                 Inscription, connexion et mot de passe se gèrent depuis l'application, \
                 rubrique Paramètres.\n\n\
                 Accès bloqué ? Écrivez à {}.",
                c.brand, c.email
            ),
        );
        topics.insert(
            "transfert".to_string(),
            format!(
                "**Envoyer et recevoir de l'argent**\n\n\
                 Choisissez le bénéficiaire, saisissez le montant en {}, vérifiez les frais \
                 affichés puis confirmez. Le bénéficiaire est notifié dès réception.\n\n\
                 Une question sur un transfert en cours ? Appelez le {}.",
                c.currency, c.phone
            ),
        );
        topics
    }

    pub fn greeting(&self) -> String {
        format!(
            "Bonjour ! Je suis l'assistant {}. Je peux vous aider avec :\n\
             - Transferts d'argent\n\
             - Frais et tarifs\n\
             - Délais de traitement\n\
             - Sécurité des transactions\n\n\
             Comment puis-je vous aider aujourd'hui ?",
            self.contact.brand
        )
    }

    pub fn presentation(&self) -> String {
        format!(
            "**{brand}, votre partenaire de transfert d'argent**\n\n\
             {brand} permet d'envoyer et de recevoir de l'argent en {currency}, \
             vers un compte ou un portefeuille mobile money, avec des frais affichés \
             avant chaque opération.\n\n{contact}",
            brand = self.contact.brand,
            currency = self.contact.currency,
            contact = self.contact_block()
        )
    }

    pub fn default_response(&self, query: &str) -> String {
        format!(
            "**Assistant {}**\n\n\
             Je n'ai pas de réponse précise à « {} ».\n\n\
             {}\n\n\
             Je peux vous renseigner sur les transferts, les frais, les délais, \
             la sécurité et votre compte.",
            self.contact.brand,
            query.trim(),
            self.contact_block()
        )
    }

    /// Template for intents that normally need a generated answer.
    pub fn for_intent(&self, intent: QueryIntent) -> Option<String> {
        let phone = &self.contact.phone;
        let email = &self.contact.email;
        match intent {
            QueryIntent::ComplexAnalysis => Some(format!(
                "**Analyse**\n\n\
                 Votre question demande une analyse approfondie. Notre équipe peut vous \
                 fournir une réponse adaptée à votre situation.\n\n\
                 - Téléphone : {phone}\n- Email : {email}"
            )),
            QueryIntent::Comparison => Some(format!(
                "**Comparaison**\n\n\
                 Pour comparer nos services (frais, délais, sécurité, fonctionnalités) \
                 avec d'autres solutions, notre équipe peut vous préparer une étude \
                 personnalisée.\n\n\
                 - Téléphone : {phone}\n- Email : {email}"
            )),
            QueryIntent::ProblemSolving => Some(format!(
                "**Support technique**\n\n\
                 1. Vérifiez votre connexion internet\n\
                 2. Mettez l'application à jour\n\
                 3. Fermez puis rouvrez l'application\n\n\
                 Si le problème persiste, décrivez-le précisément à notre équipe :\n\
                 - Téléphone : {phone}\n- Email : {email}"
            )),
            QueryIntent::SimpleFact | QueryIntent::General => None,
        }
    }

    pub fn for_topic(&self, topic: &str) -> Option<String> {
        self.topics.get(topic).cloned()
    }

    /// Pick the best template for a query.
    ///
    /// Order: intent template, topic template, greeting, presentation,
    /// then the generic default.
    pub fn select(&self, query: &str, intent: QueryIntent, topic: &str) -> String {
        if let Some(text) = self.for_intent(intent) {
            return text;
        }
        if let Some(text) = self.for_topic(topic) {
            return text;
        }

        let normalized = normalize(query);
        if GREETING_WORDS.iter().any(|w| contains_keyword(&normalized, w)) {
            return self.greeting();
        }
        let brand = normalize(&self.contact.brand);
        if PRESENTATION_WORDS.iter().any(|w| contains_keyword(&normalized, w))
            || contains_keyword(&normalized, &brand)
        {
            return self.presentation();
        }

        self.default_response(query)
    }

    /// Fixed response for escalated queries.
    pub fn escalation(&self) -> String {
        format!(
            "Je comprends, je vous mets en relation avec un conseiller.\n\n\
             {}\n\n\
             Un membre de notre équipe reviendra vers vous dans les plus brefs délais.",
            self.contact_block()
        )
    }

    /// Fixed response for internal faults.
    pub fn error(&self) -> String {
        format!(
            "Désolé, une erreur est survenue lors du traitement de votre question. \
             Veuillez réessayer ou contacter le support au {}.",
            self.contact.phone
        )
    }
}

impl Default for TemplateBook {
    fn default() -> Self {
        Self::new(SupportContact::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_quotes_the_contact() {
        let book = TemplateBook::default();
        let phone = &book.contact().phone;
        for text in [
            book.presentation(),
            book.default_response("x"),
            book.escalation(),
            book.error(),
            book.for_intent(QueryIntent::ComplexAnalysis).unwrap(),
            book.for_intent(QueryIntent::Comparison).unwrap(),
            book.for_intent(QueryIntent::ProblemSolving).unwrap(),
            book.for_topic("frais").unwrap(),
        ] {
            assert!(text.contains(phone.as_str()), "missing phone in {text}");
        }
    }

    #[test]
    fn test_select_order() {
        let book = TemplateBook::default();
        assert!(book
            .select("Bonjour, j'ai un bug", QueryIntent::ProblemSolving, "general")
            .starts_with("**Support technique**"));
        assert!(book
            .select("Quels sont vos frais ?", QueryIntent::SimpleFact, "frais")
            .starts_with("**Frais"));
        assert!(book
            .select("Bonjour", QueryIntent::General, "general")
            .starts_with("Bonjour !"));
        assert!(book
            .select("C'est quoi ZamaPay ?", QueryIntent::General, "general")
            .starts_with("**ZamaPay"));
        assert!(book
            .select("Météo à Ouagadougou", QueryIntent::General, "general")
            .contains("« Météo à Ouagadougou »"));
    }

    #[test]
    fn test_no_template_for_simple_intents() {
        let book = TemplateBook::default();
        assert!(book.for_intent(QueryIntent::SimpleFact).is_none());
        assert!(book.for_intent(QueryIntent::General).is_none());
        assert!(book.for_topic("general").is_none());
    }

    #[test]
    fn test_custom_contact_and_topic() {
        let contact = SupportContact {
            brand: "PayCo".to_string(),
            phone: "+226 00 00 00".to_string(),
            ..Default::default()
        };
        let book = TemplateBook::new(contact).with_topic_template("frais", "Gratuit.");
        assert_eq!(book.for_topic("frais").as_deref(), Some("Gratuit."));
        assert!(book.greeting().contains("PayCo"));
        assert!(book.error().contains("+226 00 00 00"));
    }
}
