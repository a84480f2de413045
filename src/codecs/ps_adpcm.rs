//! PlayStation 4-bit ADPCM (the VAG family).
//!
//! 16-byte frames: a 2-byte header (`shift` in the low nibble, `predictor`
//! index in the high nibble of byte 0; a loop-marker flag byte) followed by
//! 14 bytes of packed 4-bit deltas (28 samples). Frames interleave per
//! channel at whatever block size the layout engine is driving.

use super::{ChannelState, CodecState, Decoder};

const FRAME_SIZE: u64 = 16;
const SAMPLES_PER_FRAME: u32 = 28;

// fixed predictor coefficient pairs, scaled by 64 (standard VAG table).
const COEF_POS: [i32; 5] = [0, 60, 115, 98, 122];
const COEF_NEG: [i32; 5] = [0, 0, -52, -55, -60];

/// PlayStation ADPCM decoder (VAG family).
#[derive(Debug, Default)]
pub struct PsAdpcm;

impl Decoder for PsAdpcm {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let (mut hist1, mut hist2) = match ch.codec {
            CodecState::Adpcm { hist1, hist2 } => (hist1, hist2),
            _ => (0, 0),
        };

        // `ch.offset` anchors the current (possibly partially-consumed)
        // frame; `ch.frame_offset` is how many samples of it are already
        // produced. `first_sample` seeks forward from there by pure
        // arithmetic (no I/O) before decoding starts.
        let mut frame_base = ch.offset;
        let mut pos_in_frame = ch.frame_offset as u32;
        let mut seek = first_sample;
        while seek > 0 {
            let avail = SAMPLES_PER_FRAME - pos_in_frame;
            if seek < avail {
                pos_in_frame += seek;
                seek = 0;
            } else {
                seek -= avail;
                frame_base += FRAME_SIZE;
                pos_in_frame = 0;
            }
        }

        let mut samples_done = 0u32;

        while samples_done < samples_to_do {
            let mut header = [0u8; 2];
            ch.streamfile.read(&mut header, frame_base);

            let predictor = usize::from((header[0] >> 4) & 0x0F).min(4);
            // garbage frames can carry shift > 12; clamp instead of panicking on underflow.
            let shift = u32::from(header[0] & 0x0F).min(12);

            let mut data = [0u8; 14];
            ch.streamfile.read(&mut data, frame_base + 2);

            while pos_in_frame < SAMPLES_PER_FRAME && samples_done < samples_to_do {
                let byte = data[(pos_in_frame / 2) as usize];
                let nibble = if pos_in_frame % 2 == 0 {
                    byte & 0x0F
                } else {
                    byte >> 4
                };

                let raw = i32::from((nibble << 4) as i8) >> 4; // sign-extend 4-bit nibble
                let sample = (raw << (12 - shift))
                    + ((hist1 * COEF_POS[predictor] + hist2 * COEF_NEG[predictor]) >> 6);
                let sample = sample.clamp(i32::from(i16::MIN), i32::from(i16::MAX));

                hist2 = hist1;
                hist1 = sample;

                out[(channel_index as usize) + (channels as usize) * (samples_done as usize)] = sample;

                samples_done += 1;
                pos_in_frame += 1;
            }

            if pos_in_frame >= SAMPLES_PER_FRAME && samples_done < samples_to_do {
                pos_in_frame = 0;
                frame_base += FRAME_SIZE;
            }
        }

        ch.offset = frame_base;
        ch.frame_offset = u64::from(pos_in_frame);
        ch.codec = CodecState::Adpcm { hist1, hist2 };
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        ch.codec = CodecState::Adpcm { hist1: 0, hist2: 0 };
        ch.offset = ch.start_offset;
        ch.frame_offset = 0;
    }

    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        self.reset(ch);
        let mut discard = vec![0i32; sample as usize];
        if !discard.is_empty() {
            self.decode(ch, &mut discard, 0, sample, 1, 0);
        }
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        let channels = u64::from(channels.max(1));
        (bytes / channels / FRAME_SIZE) * u64::from(SAMPLES_PER_FRAME)
    }
}

/// Scans PS-ADPCM frame flag bytes over `[start, start + size)` for loop
/// markers, returning `(loop_start_sample, loop_end_sample)` if both a
/// loop-start (flag `0x06`) and loop-end (flag `0x03`) marker are found.
///
/// Mirrors `ps_find_loop_offsets` from the original implementation: flag
/// byte `0x03` marks the frame containing `loop_end`, `0x06` marks
/// `loop_start`.
#[must_use]
pub fn find_loop_offsets(
    sf: &mut dyn crate::streamfile::Streamfile,
    start: u64,
    size: u64,
    channels: u8,
    interleave: u64,
) -> Option<(u32, u32)> {
    let channels = u64::from(channels.max(1));
    let frames_per_channel = if interleave > 0 {
        interleave / FRAME_SIZE
    } else {
        size / channels / FRAME_SIZE
    };

    let mut loop_start = None;
    let mut loop_end = None;

    for frame in 0..frames_per_channel {
        let frame_offset = start + frame * FRAME_SIZE;
        if frame_offset + 1 >= start + size {
            break;
        }
        let mut flag = [0u8; 1];
        sf.read(&mut flag, frame_offset + 1);

        if flag[0] == 0x06 && loop_start.is_none() {
            loop_start = Some(frame as u32 * SAMPLES_PER_FRAME);
        }
        if flag[0] == 0x03 {
            loop_end = Some((frame as u32 + 1) * SAMPLES_PER_FRAME);
            break;
        }
    }

    loop_start.zip(loop_end)
}

#[cfg(test)]
mod test {
    use super::{Decoder, PsAdpcm};
    use crate::codecs::ChannelState;
    use crate::streamfile::SliceFile;

    #[test]
    fn decodes_silent_frame_to_zero() {
        let mut frame = vec![0u8; 16];
        frame[0] = 0x00; // predictor 0, shift 0
        let sf = SliceFile::new(frame, "t.vag");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = PsAdpcm;
        let mut out = [0i32; 28];

        decoder.decode(&mut ch, &mut out, 0, 28, 1, 0);

        assert!(out.iter().all(|&s| s == 0));
        assert_eq!(ch.offset, 16);
    }

    #[test]
    fn bytes_to_samples_one_frame_per_channel() {
        let decoder = PsAdpcm;
        assert_eq!(decoder.bytes_to_samples(32, 2), 28);
    }
}
