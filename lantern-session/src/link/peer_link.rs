use crate::transport::PeerTransport;
use lantern_core::{InvalidTransition, LinkRole, NegotiationState, PeerId};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One negotiated connection to a single remote peer. Owned exclusively by
/// the session manager that created it; every mutation goes through the
/// owner's event loop.
pub struct PeerLink {
    peer: PeerId,
    role: LinkRole,
    state: NegotiationState,
    transport: Arc<dyn PeerTransport>,
    /// Candidates that arrived before the remote description. Flushed in
    /// arrival order once it lands; never dropped.
    pending_candidates: Vec<String>,
    remote_applied: bool,
    last_transition: Instant,
}

impl PeerLink {
    pub fn new(peer: PeerId, role: LinkRole, transport: Arc<dyn PeerTransport>) -> Self {
        Self {
            peer,
            role,
            state: NegotiationState::New,
            transport,
            pending_candidates: Vec::new(),
            remote_applied: false,
            last_transition: Instant::now(),
        }
    }

    pub fn peer(&self) -> &PeerId {
        &self.peer
    }

    pub fn role(&self) -> LinkRole {
        self.role
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn transport(&self) -> Arc<dyn PeerTransport> {
        self.transport.clone()
    }

    /// Moves the link forward along the legal transition graph.
    pub fn advance(&mut self, next: NegotiationState) -> Result<(), InvalidTransition> {
        if !self.state.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.last_transition = Instant::now();
        Ok(())
    }

    /// Records that the remote description has been applied and hands back
    /// every buffered candidate, in arrival order.
    pub fn mark_remote_applied(&mut self) -> Vec<String> {
        self.remote_applied = true;
        std::mem::take(&mut self.pending_candidates)
    }

    pub fn remote_applied(&self) -> bool {
        self.remote_applied
    }

    /// Returns the candidate back if it can be applied right away, or buffers
    /// it until the remote description lands.
    pub fn accept_candidate(&mut self, candidate: String) -> Option<String> {
        if self.remote_applied {
            return Some(candidate);
        }
        self.pending_candidates.push(candidate);
        None
    }

    /// A link that sent its half of the exchange and heard nothing back
    /// within the bound is considered leaked half-open state.
    pub fn stalled(&self, timeout: Duration) -> bool {
        self.state.awaiting_remote() && self.last_transition.elapsed() >= timeout
    }
}
