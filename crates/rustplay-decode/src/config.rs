/*!
    Decoder configuration.
*/

/// Configuration for an [`crate::AudioDecoder`]. Reserved for future tuning knobs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AudioDecoderConfig {}

/// Configuration for a [`crate::VideoDecoder`].
#[derive(Clone, Copy, Debug, Default)]
pub struct VideoDecoderConfig {
    /// Number of threads FFmpeg's decoder may use internally.
    pub thread_count: Option<usize>,
}
