use std::sync::Arc;

use crate::chat::ChatService;
use crate::email::{EmailComposer, Mailer};
use crate::generator::OfferGenerator;
use crate::llm::LlmProvider;
use crate::store::Store;

/// Shared handles passed to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub generator: OfferGenerator,
    pub chat: Arc<ChatService>,
    pub composer: EmailComposer,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        store: Store,
        provider: Arc<dyn LlmProvider>,
        mailer: Arc<dyn Mailer>,
        max_tokens: u32,
    ) -> Self {
        let generator = OfferGenerator::new(provider.clone(), store.inventory.clone(), max_tokens);
        Self {
            chat: Arc::new(ChatService::new(generator.clone())),
            composer: EmailComposer::new(provider, max_tokens),
            generator,
            store,
            mailer,
        }
    }
}
