pub mod decode;
pub mod segment;
pub mod source;

pub use decode::{decode_window, probe_duration, DecodedSegment};
pub use segment::SegmentFile;
pub use source::AudioSource;
