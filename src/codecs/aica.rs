//! Yamaha AICA ADPCM, the 4-bit codec used by the Dreamcast's AICA sound
//! chip. Same delta/sign nibble shape as the other ADPCM codecs in this
//! module, but with its own 8-entry step-scaling table and a 127..=24576
//! step range.

use super::{ChannelState, CodecState, Decoder};

const SCALE_STEP: [i32; 8] = [230, 230, 230, 230, 307, 409, 512, 614];

/// Yamaha AICA ADPCM decoder.
#[derive(Debug, Default)]
pub struct Aica;

impl Decoder for Aica {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let (mut hist, mut step) = match ch.codec {
            CodecState::Adpcm { hist1, hist2 } => (hist1, if hist2 == 0 { 127 } else { hist2 }),
            _ => (0, 127),
        };

        let nibble_base = ch.frame_offset + u64::from(first_sample);

        for k in 0..samples_to_do {
            let nibble_pos = nibble_base + u64::from(k);
            let byte_offset = ch.start_offset + nibble_pos / 2;
            let mut byte = [0u8; 1];
            ch.streamfile.read(&mut byte, byte_offset);
            let nibble = if nibble_pos % 2 == 0 { byte[0] & 0x0F } else { byte[0] >> 4 };

            let sign = nibble & 0x08;
            let magnitude = i32::from(nibble & 0x07);
            let mut delta = (step * ((magnitude << 1) + 1)) >> 3;
            if sign != 0 {
                delta = -delta;
            }

            let sample = (hist + delta).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
            hist = sample;
            step = (step * SCALE_STEP[magnitude as usize] >> 8).clamp(127, 24576);

            out[(channel_index as usize) + (channels as usize) * (k as usize)] = sample;
        }

        ch.frame_offset = nibble_base + u64::from(samples_to_do);
        ch.offset = ch.start_offset + ch.frame_offset / 2;
        ch.codec = CodecState::Adpcm { hist1: hist, hist2: step };
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        ch.codec = CodecState::Adpcm { hist1: 0, hist2: 127 };
    }

    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        self.reset(ch);
        if sample > 0 {
            let mut discard = vec![0i32; sample as usize];
            self.decode(ch, &mut discard, 0, sample, 1, 0);
        }
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes * 2 / u64::from(channels.max(1))
    }
}

#[cfg(test)]
mod test {
    use super::{Aica, Decoder};
    use crate::codecs::ChannelState;
    use crate::streamfile::SliceFile;

    #[test]
    fn decodes_silent_nibbles_to_zero() {
        let sf = SliceFile::new(vec![0u8; 4], "t.adx");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = Aica;
        let mut out = [0i32; 8];

        decoder.decode(&mut ch, &mut out, 0, 8, 1, 0);

        assert!(out.iter().all(|&s| s == 0));
    }
}
