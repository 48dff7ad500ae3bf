use lantern_core::PeerId;

/// Events a transport reports back to its owning session manager.
#[derive(Debug)]
pub enum TransportEvent {
    /// The underlying connection reached established connectivity.
    Established(PeerId),
    /// The transport failed or was torn down remotely.
    Failed(PeerId),
    /// Trickle ICE: a local candidate to forward to the remote peer.
    CandidateGenerated(PeerId, String),
}
