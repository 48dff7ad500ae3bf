use lantern_core::PeerId;

/// Results of spawned negotiation tasks, fed back into the owning manager's
/// event loop so description exchange never blocks unrelated envelopes.
#[derive(Debug)]
pub(crate) enum NegotiationEvent {
    OfferReady { peer: PeerId, sdp: String },
    AnswerReady { peer: PeerId, sdp: String },
    AnswerApplied { peer: PeerId },
    NegotiationFailed { peer: PeerId },
}
