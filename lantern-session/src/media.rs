use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Error)]
pub enum MediaError {
    /// The user refused the capture permission prompt. The session never
    /// starts; no signaling is announced.
    #[error("local media permission denied")]
    PermissionDenied,
    #[error("media source unavailable: {0}")]
    Unavailable(String),
}

/// Acquisition of the local capture source, performed once before a session
/// announces itself. Implementations wrap whatever device layer the host
/// application uses.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;
}

/// Shared handle to one local media source. Clones share the underlying
/// track, so a broadcaster can attach the same source to every watcher link;
/// dropping one link's clone leaves the source alive for the rest.
#[derive(Clone)]
pub struct LocalMedia {
    track: Arc<TrackLocalStaticSample>,
}

impl LocalMedia {
    pub fn audio(id: &str) -> Self {
        Self::with_mime_type(id, MIME_TYPE_OPUS)
    }

    pub fn video(id: &str) -> Self {
        Self::with_mime_type(id, MIME_TYPE_VP8)
    }

    fn with_mime_type(id: &str, mime_type: &str) -> Self {
        Self {
            track: Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: mime_type.to_owned(),
                    ..Default::default()
                },
                id.to_owned(),
                format!("lantern-{id}"),
            )),
        }
    }

    pub(crate) fn track(&self) -> Arc<dyn TrackLocal + Send + Sync> {
        self.track.clone() as Arc<dyn TrackLocal + Send + Sync>
    }

    /// Feeds one captured frame to every attached link.
    pub async fn write_frame(&self, data: Bytes, duration: Duration) -> Result<()> {
        self.track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}
