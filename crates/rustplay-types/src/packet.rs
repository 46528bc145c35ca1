/*!
    Encoded packet type and stream classification.
*/

use std::time::Duration;

use crate::Rational;

/// A presentation timestamp in a stream's own time base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

/// A duration expressed in a stream's own time base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MediaDuration(pub i64);

/// Which elementary stream a packet or frame belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamType {
    Video,
    Audio,
}

/**
    An encoded packet read from a container, tagged with the stream it came
    from and its presentation timing.

    Allocated by the demuxer (`rustplay-source::Source::next_packet`) and
    consumed by a decoder (`rustplay-decode`). Opaque to the core pipeline
    per spec §1 — the core only inspects `stream_type`, `pts`/`dts`, and
    moves the payload between queues.
*/
#[derive(Clone, Debug)]
pub struct Packet {
    pub data: Vec<u8>,
    pub pts: Option<Pts>,
    pub dts: Option<Pts>,
    pub duration: MediaDuration,
    pub time_base: Rational,
    pub is_keyframe: bool,
    pub stream_type: StreamType,
}

impl Packet {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data: Vec<u8>,
        pts: Option<Pts>,
        dts: Option<Pts>,
        duration: MediaDuration,
        time_base: Rational,
        is_keyframe: bool,
        stream_type: StreamType,
    ) -> Self {
        Self {
            data,
            pts,
            dts,
            duration,
            time_base,
            is_keyframe,
            stream_type,
        }
    }

    /// The packet's presentation time converted to wall-clock `Duration`, if known.
    pub fn presentation_time(&self) -> Option<Duration> {
        self.pts.map(|Pts(pts)| {
            let us = self.time_base.pts_to_us(pts).max(0);
            Duration::from_micros(us as u64)
        })
    }
}
