//! OKI/Dialogic ADPCM ("VOX"), ported from `oki_decoder.c`'s standard
//! (non-PC-FX, non-OKI16) hardware path: a 12-bit history clamped to
//! `[-2048, 2047]`, doubled on output to fill 16-bit PCM range, using the
//! first 49 entries of the IMA step table.

use super::{ChannelState, CodecState, Decoder};

const STEP_SIZES: [i32; 49] = [
    16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66, 73, 80, 88, 97, 107, 118, 130,
    143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552,
];
const STEP_INDEX_TABLE: [i32; 16] = [
    -1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8,
];

/// OKI/Dialogic ADPCM decoder.
#[derive(Debug, Default)]
pub struct Oki;

impl Decoder for Oki {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let (mut hist, mut step_index) = match ch.codec {
            CodecState::Oki { hist, step_index } => (hist, step_index),
            _ => (0, 0),
        };

        let nibble_base = ch.frame_offset + u64::from(first_sample);

        for k in 0..samples_to_do {
            let nibble_pos = nibble_base + u64::from(k);
            let byte_offset = ch.start_offset + nibble_pos / 2;
            let mut byte = [0u8; 1];
            ch.streamfile.read(&mut byte, byte_offset);
            let code = if nibble_pos % 2 == 0 { byte[0] & 0x0F } else { byte[0] >> 4 };

            let step = STEP_SIZES[step_index.clamp(0, 48) as usize];
            let magnitude = i32::from(code & 0x07);
            let mut delta = (((magnitude * 2) + 1) * step) >> 3;
            if code & 0x08 != 0 {
                delta = -delta;
            }

            hist = (hist + delta).clamp(-2048, 2047);
            step_index = (step_index + STEP_INDEX_TABLE[code as usize]).clamp(0, 48);

            out[(channel_index as usize) + (channels as usize) * (k as usize)] = hist << 4;
        }

        ch.frame_offset = nibble_base + u64::from(samples_to_do);
        ch.offset = ch.start_offset + ch.frame_offset / 2;
        ch.codec = CodecState::Oki { hist, step_index };
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        ch.codec = CodecState::Oki { hist: 0, step_index: 0 };
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
    use super::{Decoder, Oki};
    use crate::codecs::ChannelState;
    use crate::streamfile::SliceFile;

    #[test]
    fn decodes_silent_nibbles_to_zero() {
        let sf = SliceFile::new(vec![0u8; 4], "t.vox");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = Oki;
        let mut out = [0i32; 8];

        decoder.decode(&mut ch, &mut out, 0, 8, 1, 0);

        assert!(out.iter().all(|&s| s == 0));
    }
}
