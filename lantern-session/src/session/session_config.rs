use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// A link stuck in OfferSent/AnswerSent longer than this is failed and
    /// closed, so silently dropped envelopes cannot leak half-open links.
    pub negotiation_timeout: Duration,
    /// How often stalled links are checked for.
    pub sweep_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            negotiation_timeout: Duration::from_secs(10),
            sweep_interval: Duration::from_millis(500),
        }
    }
}
