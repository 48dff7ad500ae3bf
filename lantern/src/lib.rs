pub use lantern_core::PeerId;

pub mod model {
    pub use lantern_core::model::*;
}

#[cfg(feature = "relay")]
pub mod relay {
    pub use lantern_relay::*;
}

#[cfg(feature = "session")]
pub mod session {
    pub use lantern_session::*;
}
