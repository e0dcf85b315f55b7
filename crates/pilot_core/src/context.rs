use std::sync::Arc;

use tracing::{info_span, Span};

use crate::{config::PilotSettings, events::EventBus};

/// Everything a component needs from its surroundings, built once and handed
/// to each constructor.
#[derive(Clone)]
pub struct PilotContext {
    pub settings: Arc<PilotSettings>,
    pub events: Arc<EventBus>,
    pub span: Span,
}

impl PilotContext {
    pub fn new(settings: PilotSettings) -> Self {
        Self::with_events(settings, Arc::new(EventBus::default()))
    }

    pub fn with_events(settings: PilotSettings, events: Arc<EventBus>) -> Self {
        Self {
            settings: Arc::new(settings),
            events,
            span: info_span!("pilot"),
        }
    }
}
