//! Platinum "PtADPCM": a custom ADPCM used by some Wwise titles, ported from
//! `ptadpcm_decoder.c`. Frames are externally interleaved (the frame size is
//! a container-supplied parameter, not a constant), mono per channel.

use super::{ChannelState, CodecState, Decoder};

/// `[index][nibble] -> (step, next_index)`, precomputed. Rows 11 and 12 are
/// all-zero in the original table; `index` is clamped to 12 before lookup.
const TABLE: [[(i32, u8); 16]; 13] = [
    [
        (-14, 2), (-10, 2), (-7, 1), (-5, 1), (-3, 0), (-2, 0), (-1, 0), (0, 0),
        (0, 0), (1, 0), (2, 0), (3, 0), (5, 1), (7, 1), (10, 2), (14, 2),
    ],
    [
        (-28, 3), (-20, 3), (-14, 2), (-10, 2), (-7, 1), (-5, 1), (-3, 1), (-1, 0),
        (1, 0), (3, 1), (5, 1), (7, 1), (10, 2), (14, 2), (20, 3), (28, 3),
    ],
    [
        (-56, 4), (-40, 4), (-28, 3), (-20, 3), (-14, 2), (-10, 2), (-6, 2), (-2, 1),
        (2, 1), (6, 2), (10, 2), (14, 2), (20, 3), (28, 3), (40, 4), (56, 4),
    ],
    [
        (-112, 5), (-80, 5), (-56, 4), (-40, 4), (-28, 3), (-20, 3), (-12, 3), (-4, 2),
        (4, 2), (12, 3), (20, 3), (28, 3), (40, 4), (56, 4), (80, 5), (112, 5),
    ],
    [
        (-224, 6), (-160, 6), (-112, 5), (-80, 5), (-56, 4), (-40, 4), (-24, 4), (-8, 3),
        (8, 3), (24, 4), (40, 4), (56, 4), (80, 5), (112, 5), (160, 6), (224, 6),
    ],
    [
        (-448, 7), (-320, 7), (-224, 6), (-160, 6), (-112, 5), (-80, 5), (-48, 5), (-16, 4),
        (16, 4), (48, 5), (80, 5), (112, 5), (160, 6), (224, 6), (320, 7), (448, 7),
    ],
    [
        (-896, 8), (-640, 8), (-448, 7), (-320, 7), (-224, 6), (-160, 6), (-96, 6), (-32, 5),
        (32, 5), (96, 6), (160, 6), (224, 6), (320, 7), (448, 7), (640, 8), (896, 8),
    ],
    [
        (-1792, 9), (-1280, 9), (-896, 8), (-640, 8), (-448, 7), (-320, 7), (-192, 7), (-64, 6),
        (64, 6), (192, 7), (320, 7), (448, 7), (640, 8), (896, 8), (1280, 9), (1792, 9),
    ],
    [
        (-3584, 10), (-2560, 10), (-1792, 9), (-1280, 9), (-896, 8), (-640, 8), (-384, 8), (-128, 7),
        (128, 7), (384, 8), (640, 8), (896, 8), (1280, 9), (1792, 9), (2560, 10), (3584, 10),
    ],
    [
        (-7168, 11), (-5120, 11), (-3584, 10), (-2560, 10), (-1792, 9), (-1280, 9), (-768, 9), (-256, 8),
        (256, 8), (768, 9), (1280, 9), (1792, 9), (2560, 10), (3584, 10), (5120, 11), (7168, 11),
    ],
    [
        (-14336, 11), (-10240, 11), (-7168, 11), (-5120, 11), (-3584, 10), (-2560, 10), (-1536, 10), (-512, 9),
        (512, 9), (1536, 10), (2560, 10), (3584, 10), (5120, 11), (7168, 11), (10240, 11), (14336, 11),
    ],
    [(0, 0); 16],
    [(0, 0); 16],
];

/// Platinum PtADPCM decoder. `frame_size` is the container-supplied frame
/// byte count and must be at least 6.
#[derive(Debug, Clone, Copy)]
pub struct PtAdpcm {
    pub frame_size: u64,
}

impl Decoder for PtAdpcm {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let samples_per_frame = (2 + (self.frame_size - 5) * 2) as u32;

        // `hist1`/`hist2`/`index` only come from the frame header at the
        // start of a fresh frame (`pos_in_frame == 0`); each frame is
        // self-contained for seeking, but mid-frame they're running
        // adaptive state carried in `ch.codec`, not re-derived from bytes.
        let (mut hist1, mut hist2, mut index) = match ch.codec {
            CodecState::PtAdpcm { hist1, hist2, index } => (hist1, hist2, usize::from(index)),
            _ => (0, 0, 0),
        };

        // `ch.offset` anchors the current frame; `ch.frame_offset` is how
        // many samples of it are already produced. `first_sample` seeks
        // forward from there by pure arithmetic (no I/O) before decoding
        // starts, matching the other per-channel frame codecs.
        let mut frame_base = ch.offset;
        let mut pos_in_frame = ch.frame_offset as u32;
        let mut seek = first_sample;
        while seek > 0 {
            let avail = samples_per_frame - pos_in_frame;
            if seek < avail {
                pos_in_frame += seek;
                seek = 0;
            } else {
                seek -= avail;
                frame_base += self.frame_size;
                pos_in_frame = 0;
            }
        }

        let mut samples_done = 0u32;

        while samples_done < samples_to_do {
            let mut frame = vec![0u8; self.frame_size as usize];
            ch.streamfile.read(&mut frame, frame_base);

            if pos_in_frame == 0 {
                hist2 = i16::from_le_bytes([frame[0], frame[1]]);
                hist1 = i16::from_le_bytes([frame[2], frame[3]]);
                index = usize::from(frame[4]).min(12);
            }

            if pos_in_frame == 0 && samples_done < samples_to_do {
                out[(channel_index as usize) + (channels as usize) * (samples_done as usize)] =
                    i32::from(hist2);
                samples_done += 1;
                pos_in_frame += 1;
            }
            if pos_in_frame == 1 && samples_done < samples_to_do {
                out[(channel_index as usize) + (channels as usize) * (samples_done as usize)] =
                    i32::from(hist1);
                samples_done += 1;
                pos_in_frame += 1;
            }

            while pos_in_frame < samples_per_frame && samples_done < samples_to_do {
                let i = pos_in_frame - 2;
                let byte = frame[5 + (i / 2) as usize];
                let nibble = if i % 2 == 0 { byte & 0x0F } else { byte >> 4 };

                let (step, next_index) = TABLE[index][nibble as usize];
                index = usize::from(next_index);

                let sample = (step + 2 * i32::from(hist1) - i32::from(hist2))
                    .clamp(i32::from(i16::MIN), i32::from(i16::MAX));

                hist2 = hist1;
                hist1 = sample as i16;

                out[(channel_index as usize) + (channels as usize) * (samples_done as usize)] =
                    sample;
                samples_done += 1;
                pos_in_frame += 1;
            }

            if pos_in_frame >= samples_per_frame {
                pos_in_frame = 0;
                frame_base += self.frame_size;
            }
        }

        ch.offset = frame_base;
        ch.frame_offset = u64::from(pos_in_frame);
        ch.codec = CodecState::PtAdpcm {
            hist1,
            hist2,
            index: index as u8,
        };
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        ch.codec = CodecState::PtAdpcm {
            hist1: 0,
            hist2: 0,
            index: 0,
        };
        ch.offset = ch.start_offset;
        ch.frame_offset = 0;
    }

    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        self.reset(ch);
        if sample > 0 {
            let mut discard = vec![0i32; sample as usize];
            self.decode(ch, &mut discard, 0, sample, 1, 0);
        }
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        if self.frame_size < 6 {
            return 0;
        }
        let channels = u64::from(channels.max(1));
        (bytes / (channels * self.frame_size)) * (2 + (self.frame_size - 5) * 2)
    }
}

#[cfg(test)]
mod test {
    use super::{Decoder, PtAdpcm};
    use crate::codecs::ChannelState;
    use crate::streamfile::SliceFile;

    #[test]
    fn decodes_header_samples_as_history() {
        let mut frame = vec![0u8; 16];
        frame[0..2].copy_from_slice(&5i16.to_le_bytes());
        frame[2..4].copy_from_slice(&7i16.to_le_bytes());
        frame[4] = 0; // index
        let sf = SliceFile::new(frame, "t.pta");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = PtAdpcm { frame_size: 16 };
        let mut out = [0i32; 2];

        decoder.decode(&mut ch, &mut out, 0, 2, 1, 0);

        assert_eq!(out, [5, 7]);
    }

    #[test]
    fn repeated_calls_with_first_sample_zero_advance_via_channel_state() {
        // Mirrors `Layout::None`'s `decode_none`, which always passes
        // `first_sample = 0` and relies on `ch.offset`/`ch.frame_offset`
        // persisting position across calls, not on `first_sample`.
        let mut frame = vec![0u8; 16];
        frame[0..2].copy_from_slice(&5i16.to_le_bytes());
        frame[2..4].copy_from_slice(&7i16.to_le_bytes());
        frame[4] = 0; // index
        let sf = SliceFile::new(frame, "t.pta");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = PtAdpcm { frame_size: 16 };

        let mut first = [0i32; 2];
        decoder.decode(&mut ch, &mut first, 0, 2, 1, 0);
        assert_eq!(first, [5, 7]);

        let mut second = [0i32; 2];
        decoder.decode(&mut ch, &mut second, 0, 2, 1, 0);
        // Continuing from pos_in_frame=2 (not re-reading the history header),
        // so this must not repeat the [5, 7] history samples.
        assert_ne!(second, [5, 7]);
        assert_ne!(ch.frame_offset, 0);
    }

    #[test]
    fn bytes_to_samples_matches_frame_layout() {
        let decoder = PtAdpcm { frame_size: 16 };
        // samples_per_frame = 2 + (16-5)*2 = 24
        assert_eq!(decoder.bytes_to_samples(16, 1), 24);
    }
}
