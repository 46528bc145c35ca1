/*!
    Media frame transformation for the rustplay pipeline.

    Converts decoded frames between formats: audio resampling and
    channel-layout conversion, and video scaling and pixel-format
    conversion to the presenter's target format (see spec §4.6's RGB24
    rendering target and §4.5's S16 stereo playback target).
*/

mod audio;
mod video;

pub use audio::{AudioTransform, AudioTransformConfig};
pub use video::{ScalingAlgorithm, VideoTransform, VideoTransformConfig};
