/*!
    Codec identifiers.
*/

/**
    Identifies the codec used by a stream.

    This is a thin vocabulary enum; the actual codec context lives behind
    `rustplay-decode` and `ffmpeg-next`.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    H264,
    H265,
    Vp8,
    Vp9,
    Av1,
    Mpeg4,
    Mpeg2Video,
    Aac,
    Opus,
    Mp3,
    Vorbis,
    Flac,
    PcmS16Le,
    PcmS16Be,
    PcmF32Le,
    Ac3,
}
