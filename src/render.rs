//! Render loop (§4.9): drives [`Layout::decode`](crate::layout::Layout::decode)
//! in internal-buffer-sized chunks, handling the loop-restart and fade-tail
//! bookkeeping, then applies the [mixing chain](crate::mixing) and encodes
//! the result into [`Stream::buf`].
//!
//! [`render`] decodes into the stream's own buffer (a borrowed view, valid
//! until the next call on the stream); [`fill`] is a thin wrapper that
//! copies bytes from repeated `render` calls into a caller-owned buffer.

use crate::mixing;
use crate::stream::Stream;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Samples decoded per internal buffer, per channel (§4.9: "512-2048
/// frames").
pub const BUFFER_SAMPLES: u32 = 2048;

/// Error returned by [`render`] when a stream cannot produce any more
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderError {
    kind: RenderErrorKind,
}

/// The kind of failure a [`RenderError`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RenderErrorKind {
    /// `stream.done` is already set (the configured play length has been
    /// reached and `play_forever` is not set).
    Done,
}

impl RenderError {
    fn new(kind: RenderErrorKind) -> Self {
        Self { kind }
    }

    /// Returns the kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> RenderErrorKind {
        self.kind
    }
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self.kind {
            RenderErrorKind::Done => "stream has already reached its configured play length",
        })
    }
}

impl Error for RenderError {}

/// Decodes the next internal buffer of samples into `stream.buf`, applying
/// loop/fade/mixing. Sets `stream.done` once the configured play length has
/// been reached (never, if `play_forever`).
pub fn render(stream: &mut Stream) -> Result<(), RenderError> {
    if stream.done {
        return Err(RenderError::new(RenderErrorKind::Done));
    }

    let channels = usize::from(stream.channels.max(1));
    let mut scratch = vec![0i32; BUFFER_SAMPLES as usize * channels];
    let produced = decode_chunk(stream, &mut scratch, BUFFER_SAMPLES);

    let start_total = stream.total_rendered;
    let out_channels = mixing::apply(stream, &mut scratch, produced, start_total);
    stream.total_rendered += produced;

    if let Some((fade_start, fade_end)) = mixing::fade_window(stream) {
        let done_end = stream.total_rendered.min(fade_end);
        stream.fade_samples_done = done_end.saturating_sub(fade_start);
    }

    let format = stream.config.force_sfmt.unwrap_or_default();
    let sample_size = usize::from(mixing::sample_size(format));
    let sample_count = (produced as usize) * usize::from(out_channels);

    stream.buf.clear();
    stream.buf.resize(sample_count * sample_size, 0);
    mixing::encode(format, &scratch[..sample_count], &mut stream.buf);
    stream.buf_samples = produced;
    stream.buf_channels = out_channels;

    Ok(())
}

/// Decodes `samples` samples into `out` (a caller-owned byte buffer, sized
/// for the stream's current output channel count and sample format),
/// calling [`render`] internally as many times as needed. Returns the
/// number of samples (per channel) actually written, which is less than
/// `samples` only once the stream is done.
pub fn fill(stream: &mut Stream, out: &mut [u8], samples: u32) -> usize {
    let mut written = 0usize;

    while (written as u32) < samples {
        if render(stream).is_err() {
            break;
        }

        let sample_size = usize::from(mixing::sample_size(stream.config.force_sfmt.unwrap_or_default()));
        let frame_bytes = sample_size * usize::from(stream.buf_channels.max(1));
        let available = stream.buf_samples as usize;
        let remaining = (samples as usize) - written;
        let take = available.min(remaining);

        let dst_start = written * frame_bytes;
        let dst_end = dst_start + take * frame_bytes;
        let Some(dst) = out.get_mut(dst_start..dst_end) else {
            break;
        };
        dst.copy_from_slice(&stream.buf[..take * frame_bytes]);

        written += take;

        if take < available {
            break;
        }
    }

    written
}

/// Current playback position, in samples, in the same coordinate space
/// [`seek`] accepts (`0..=play_samples`, monotonic across loops).
#[must_use]
pub fn get_play_position(stream: &Stream) -> u32 {
    stream.total_rendered
}

/// Clamps `sample` to `[0, play_samples]` and repositions the stream there.
/// Within the first play-through (`sample <= loop_end_sample`, or the
/// stream doesn't loop), this decodes-and-discards from the start so codec
/// history (ADPCM predictors, etc.) is bit-exact; past `loop_end_sample` it
/// maps the target into the equivalent position inside the loop body and
/// seeks each channel's codec there directly.
pub fn seek(stream: &mut Stream, sample: u32) {
    let target = sample.min(stream.play_samples);

    if !stream.loop_flag || target <= stream.loop_end_sample {
        stream.reset();
        discard_decode(stream, target);
        stream.current_sample = target;
        stream.total_rendered = target;
        return;
    }

    let body = stream.loop_end_sample.saturating_sub(stream.loop_start_sample).max(1);
    let past_loop_start = target - stream.loop_start_sample;
    let track_position = stream.loop_start_sample + past_loop_start % body;
    let loop_hits = past_loop_start / body;

    stream.reset();
    for ch in &mut stream.channels_state {
        stream.decoder.seek(ch, track_position);
    }
    stream.current_sample = track_position;
    stream.total_rendered = target;
    stream.loop_hits = loop_hits;
}

/// Rewinds the stream to the very start (sample 0), discarding any fade/loop
/// progress made this session.
pub fn reset(stream: &mut Stream) {
    stream.reset();
}

fn discard_decode(stream: &mut Stream, target: u32) {
    let channels = usize::from(stream.channels.max(1));
    let mut scratch = vec![0i32; BUFFER_SAMPLES as usize * channels];
    let mut remaining = target;

    while remaining > 0 {
        let chunk = remaining.min(BUFFER_SAMPLES);
        let out_len = (chunk as usize) * channels;
        stream.layout_type.decode(
            stream.decoder.as_mut(),
            &mut stream.channels_state,
            stream.current_sample,
            &mut scratch[..out_len],
            chunk,
        );
        stream.current_sample += chunk;
        remaining -= chunk;
    }
}

/// Decodes up to `max_samples` samples, truncating at `loop_end_sample` and
/// at `play_samples` (unless `play_forever`), looping in place via
/// [`Stream::apply_loop`](crate::stream::Stream) when the loop point is
/// reached. Returns the number of samples actually produced, setting
/// `stream.done` if the configured play length was reached.
fn decode_chunk(stream: &mut Stream, buf: &mut [i32], max_samples: u32) -> u32 {
    let channels = usize::from(stream.channels.max(1));
    let mut produced = 0u32;

    while produced < max_samples {
        let absolute = stream.total_rendered + produced;
        if !stream.config.play_forever && absolute >= stream.play_samples {
            stream.done = true;
            break;
        }

        let mut chunk = max_samples - produced;
        if !stream.config.play_forever {
            chunk = chunk.min(stream.play_samples - absolute);
        }
        if stream.loop_flag && stream.current_sample + chunk > stream.loop_end_sample {
            chunk = stream.loop_end_sample.saturating_sub(stream.current_sample).max(1);
        }
        if chunk == 0 {
            break;
        }

        let out_offset = (produced as usize) * channels;
        stream.layout_type.decode(
            stream.decoder.as_mut(),
            &mut stream.channels_state,
            stream.current_sample,
            &mut buf[out_offset..],
            chunk,
        );

        stream.current_sample += chunk;
        produced += chunk;

        if stream.loop_flag && stream.current_sample >= stream.loop_end_sample {
            stream.apply_loop();
        }
    }

    produced
}
