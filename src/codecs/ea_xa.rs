//! EA-XA, Electronic Arts' ADPCM family. Framing varies enough between EA's
//! own container revisions (stereo/mono split, compressed-vs-raw headers,
//! "EA-XAS" variable shift) that this crate only carries the `CodingType`
//! tag and size math; see `DESIGN.md` for the scope note.

use super::{ChannelState, CodecError, CodecErrorKind, Decoder};

const SAMPLES_PER_FRAME: u32 = 28;
const FRAME_SIZE: u64 = 15;

/// EA-XA decoder stub. Carries enough to report size math; [`decode`] always
/// fails with [`CodecErrorKind::Unsupported`].
#[derive(Debug, Default)]
pub struct EaXa;

impl Decoder for EaXa {
    fn decode(
        &mut self,
        _ch: &mut ChannelState,
        _out: &mut [i32],
        _first_sample: u32,
        _samples_to_do: u32,
        _channels: u8,
        _channel_index: u8,
    ) {
        // Framing differs per EA container revision; not implemented in the
        // representative codec set. Callers should check decoder
        // availability against `CodingType` before calling decode.
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        let channels = u64::from(channels.max(1));
        (bytes / channels / FRAME_SIZE) * u64::from(SAMPLES_PER_FRAME)
    }
}

/// Returns the unsupported-codec error this family reports instead of
/// decoding, for callers that want to fail fast rather than silently
/// receive zeroed output.
#[must_use]
pub fn unsupported() -> CodecError {
    CodecError::new(CodecErrorKind::Unsupported)
}
