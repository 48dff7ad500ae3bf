use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of a peer link this endpoint plays during negotiation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum LinkRole {
    Initiator,
    Responder,
}

/// Negotiation progress of a single peer link.
///
/// Transitions only move forward; once a link leaves `New` it never returns,
/// and `Closed` is final.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum NegotiationState {
    New,
    OfferSent,
    OfferReceived,
    AnswerSent,
    AnswerReceived,
    Connected,
    Failed,
    Closed,
}

impl NegotiationState {
    /// The legal transition table. Everything can be closed; everything short
    /// of `Closed` can fail.
    pub fn can_advance_to(self, next: NegotiationState) -> bool {
        use NegotiationState::*;

        match (self, next) {
            (Closed, _) => false,
            (_, Closed) => true,
            (Failed, _) => false,
            (_, Failed) => true,
            (New, OfferSent) | (New, OfferReceived) => true,
            (OfferSent, AnswerReceived) => true,
            (OfferReceived, AnswerSent) => true,
            (AnswerSent, Connected) | (AnswerReceived, Connected) => true,
            _ => false,
        }
    }

    /// States in which the link has sent its half of the description exchange
    /// and is waiting on the remote side. Links stuck here are subject to the
    /// negotiation timeout.
    pub fn awaiting_remote(self) -> bool {
        matches!(self, NegotiationState::OfferSent | NegotiationState::AnswerSent)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, NegotiationState::Failed | NegotiationState::Closed)
    }
}

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[error("illegal negotiation transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: NegotiationState,
    pub to: NegotiationState,
}
