//! Post-decode channel and format operations (§4.10), applied in a fixed
//! order after layout+codec have produced one render chunk of interleaved
//! i32 PCM: `stereo_track` select, `auto_downmix_channels`, `force_sfmt`
//! encoding, then the fade envelope.
//!
//! Fade is applied to the i32 intermediate (native 16-bit-range) values
//! rather than after `force_sfmt` widening, since linear scaling commutes
//! with the width conversion up to rounding — `force_sfmt` is purely an
//! output encoding step, implemented in [`encode`].

use crate::config::SampleFormat;
use crate::stream::Stream;

/// Applies `stereo_track`/`auto_downmix_channels`/fade to `produced` samples
/// of `stream.channels`-wide interleaved PCM in `buf`, in place. `start_total`
/// is [`Stream::total_rendered`] as of the start of this chunk (used to
/// compute each sample's absolute position for the fade envelope). Returns
/// the resulting channel count; the mixed samples occupy
/// `buf[..produced as usize * result as usize]`.
pub fn apply(stream: &Stream, buf: &mut [i32], produced: u32, start_total: u32) -> u8 {
    let mut channels = stream.channels;

    if stream.config.stereo_track > 0 {
        channels = select_stereo_track(buf, produced, channels, stream.config.stereo_track);
    }

    if stream.config.auto_downmix_channels > 0 && stream.config.auto_downmix_channels < channels {
        channels = downmix(buf, produced, channels, stream.config.auto_downmix_channels);
    }

    apply_fade(stream, buf, produced, channels, start_total);

    channels
}

/// Bytes per output sample for `format`, used to size [`Stream::buf`].
#[must_use]
pub fn sample_size(format: SampleFormat) -> u8 {
    match format {
        SampleFormat::Pcm16 => 2,
        SampleFormat::Pcm24 => 3,
        SampleFormat::Pcm32 | SampleFormat::Float32 => 4,
    }
}

/// Encodes `samples` (i32, native 16-bit-range PCM) into `out` as `format`,
/// little-endian. `out` must be exactly `samples.len() * sample_size(format)`
/// bytes.
pub fn encode(format: SampleFormat, samples: &[i32], out: &mut [u8]) {
    match format {
        SampleFormat::Pcm16 => {
            for (s, chunk) in samples.iter().zip(out.chunks_exact_mut(2)) {
                let v = (*s).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
                chunk.copy_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::Pcm24 => {
            for (s, chunk) in samples.iter().zip(out.chunks_exact_mut(3)) {
                let v = s.saturating_mul(1 << 8);
                chunk.copy_from_slice(&v.to_le_bytes()[..3]);
            }
        }
        SampleFormat::Pcm32 => {
            for (s, chunk) in samples.iter().zip(out.chunks_exact_mut(4)) {
                let v = s.saturating_mul(1 << 16);
                chunk.copy_from_slice(&v.to_le_bytes());
            }
        }
        SampleFormat::Float32 => {
            for (s, chunk) in samples.iter().zip(out.chunks_exact_mut(4)) {
                let v = (*s as f32 / 32768.0).clamp(-1.0, 1.0);
                chunk.copy_from_slice(&v.to_le_bytes());
            }
        }
    }
}

/// The `[fade_start, fade_end)` sample range (in [`Stream::total_rendered`]
/// space) a stream's fade envelope covers, or `None` if no fade applies
/// (`play_forever`, `ignore_fade`, or `fade_time <= 0`).
#[must_use]
pub fn fade_window(stream: &Stream) -> Option<(u32, u32)> {
    if stream.config.play_forever || stream.config.ignore_fade {
        return None;
    }
    let fade_samples = (stream.config.fade_time.max(0.0) * f64::from(stream.sample_rate)).round() as u32;
    if fade_samples == 0 {
        return None;
    }
    let delay_samples = (stream.config.fade_delay.max(0.0) * f64::from(stream.sample_rate)).round() as u32;
    let fade_end = stream.play_samples.saturating_sub(delay_samples);
    let fade_start = fade_end.saturating_sub(fade_samples);
    Some((fade_start, fade_end))
}

fn apply_fade(stream: &Stream, buf: &mut [i32], produced: u32, channels: u8, start_total: u32) {
    let Some((fade_start, fade_end)) = fade_window(stream) else {
        return;
    };
    let fade_samples = fade_end.saturating_sub(fade_start).max(1);
    let channels = usize::from(channels);

    for frame in 0..produced as usize {
        let absolute = start_total + frame as u32;
        let envelope = if absolute < fade_start {
            1.0
        } else if absolute < fade_end {
            1.0 - f64::from(absolute - fade_start) / f64::from(fade_samples)
        } else {
            0.0
        };

        if (envelope - 1.0).abs() < f64::EPSILON {
            continue;
        }

        let base = frame * channels;
        for s in &mut buf[base..base + channels] {
            *s = (f64::from(*s) * envelope).round() as i32;
        }
    }
}

/// `stereo_track` (1-based): keeps channels `[2*(track-1), 2*(track-1)+1]`,
/// dropping the rest. A request past the end of the source channel count is
/// a no-op (returns `channels` unchanged), matching the parser failure
/// policy of never erroring on an out-of-range config value.
fn select_stereo_track(buf: &mut [i32], produced: u32, channels: u8, track: u8) -> u8 {
    let start = usize::from(track - 1) * 2;
    if start + 1 >= usize::from(channels) {
        return channels;
    }
    compact_channels(buf, produced, channels, &[start, start + 1]);
    2
}

/// Rewrites each frame in place to keep only the source channels listed in
/// `keep` (ascending order), tightly packed at the front. Safe to do without
/// a scratch buffer: since `keep.len() <= channels` and `keep` is sorted,
/// the i-th kept channel's source index is always `>= i`, so writing the
/// compacted value never clobbers a not-yet-read source cell later in the
/// same frame.
fn compact_channels(buf: &mut [i32], produced: u32, channels: u8, keep: &[usize]) {
    let channels = usize::from(channels);
    for frame in 0..produced as usize {
        let src_base = frame * channels;
        let dst_base = frame * keep.len();
        for (i, &k) in keep.iter().enumerate() {
            buf[dst_base + i] = buf[src_base + k];
        }
    }
}

/// ITU-style downmix taps for common surround layouts, expressed as
/// `(source_channel_index, gain)` pairs. Channel order follows the standard
/// WAVE layout (FL, FR, FC, LFE, BL, BR, ...). A simple, documented matrix;
/// fidelity is not the goal (§4.10).
fn downmix_matrix(src_channels: u8) -> Option<(&'static [(usize, f32)], &'static [(usize, f32)])> {
    match src_channels {
        6 => Some((&[(0, 1.0), (2, 0.707), (4, 0.707)], &[(1, 1.0), (2, 0.707), (5, 0.707)])),
        8 => Some((
            &[(0, 1.0), (2, 0.707), (4, 0.707), (6, 0.707)],
            &[(1, 1.0), (2, 0.707), (5, 0.707), (7, 0.707)],
        )),
        _ => None,
    }
}

fn downmix(buf: &mut [i32], produced: u32, channels: u8, target: u8) -> u8 {
    if target == 2 {
        if let Some((l_taps, r_taps)) = downmix_matrix(channels) {
            for frame in 0..produced as usize {
                let base = frame * usize::from(channels);
                let l = mix_taps(buf, base, l_taps);
                let r = mix_taps(buf, base, r_taps);
                buf[frame * 2] = l;
                buf[frame * 2 + 1] = r;
            }
            return 2;
        }
    }

    average_downmix(buf, produced, channels, target)
}

fn mix_taps(buf: &[i32], base: usize, taps: &[(usize, f32)]) -> i32 {
    let sum: f32 = taps.iter().map(|&(ch, gain)| buf[base + ch] as f32 * gain).sum();
    sum.round().clamp(i32::MIN as f32, i32::MAX as f32) as i32
}

/// Fallback for `(source, target)` channel-count pairs with no tabulated
/// matrix: averages the channels that round-robin onto each kept slot.
fn average_downmix(buf: &mut [i32], produced: u32, channels: u8, target: u8) -> u8 {
    let channels = usize::from(channels);
    let target = usize::from(target.max(1));

    for frame in 0..produced as usize {
        let src_base = frame * channels;
        let dst_base = frame * target;
        for t in 0..target {
            let mut sum = 0i64;
            let mut count = 0i64;
            let mut c = t;
            while c < channels {
                sum += i64::from(buf[src_base + c]);
                count += 1;
                c += target;
            }
            buf[dst_base + t] = (sum / count.max(1)) as i32;
        }
    }

    target as u8
}

#[cfg(test)]
mod test {
    use super::{compact_channels, select_stereo_track};

    #[test]
    fn stereo_track_keeps_requested_pair() {
        // 4ch: [1,2,3,4] -> track 2 keeps channels [2,3]
        let mut buf = vec![1, 2, 3, 4, 10, 20, 30, 40];
        let channels = select_stereo_track(&mut buf, 2, 4, 2);
        assert_eq!(channels, 2);
        assert_eq!(&buf[..4], &[3, 4, 30, 40]);
    }

    #[test]
    fn stereo_track_out_of_range_is_noop() {
        let mut buf = vec![1, 2, 3, 4];
        let channels = select_stereo_track(&mut buf, 1, 2, 5);
        assert_eq!(channels, 2);
        assert_eq!(&buf[..2], &[1, 2]);
    }

    #[test]
    fn compact_channels_preserves_order() {
        let mut buf = vec![1, 2, 3, 4, 5, 6];
        compact_channels(&mut buf, 2, 3, &[0, 2]);
        assert_eq!(&buf[..4], &[1, 3, 4, 6]);
    }
}
