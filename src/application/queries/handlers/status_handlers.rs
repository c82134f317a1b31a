//! AI Status Query Handler

use std::sync::Arc;

use crate::application::availability::AvailabilityGate;
use crate::application::ports::CompletionPort;
use crate::application::queries::{AiStatus, CheckAiStatus};

/// CheckAiStatus Handler
pub struct CheckAiStatusHandler {
    completion: Arc<dyn CompletionPort>,
    gate: AvailabilityGate,
}

impl CheckAiStatusHandler {
    pub fn new(completion: Arc<dyn CompletionPort>, gate: AvailabilityGate) -> Self {
        Self { completion, gate }
    }

    /// 凭证缺失是受支持的配置，不是错误
    pub fn handle(&self, _query: CheckAiStatus) -> AiStatus {
        let provider = self.completion.provider_name();
        let ai_available = self.gate.is_available();
        let message = if ai_available {
            format!("{} AI features are available via official provider", provider)
        } else {
            format!(
                "Add {} environment variable to enable AI features",
                self.gate.env_var()
            )
        };

        AiStatus {
            ai_available,
            message,
            provider: provider.to_string(),
            model: self.completion.model().to_string(),
        }
    }
}
