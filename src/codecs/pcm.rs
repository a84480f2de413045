//! Linear PCM decoders: trivial sample-format conversions that honor
//! interleave via `channel_index`/`channels`.

use super::{ChannelState, Decoder};

/// 8-bit PCM, one byte per sample.
#[derive(Debug, Default)]
pub struct Pcm8 {
    /// Whether samples are stored unsigned (offset by 0x80) rather than
    /// signed two's complement.
    pub unsigned: bool,
}

impl Decoder for Pcm8 {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let frame_offset = ch.offset + u64::from(first_sample);
        for k in 0..samples_to_do {
            let mut buf = [0u8; 1];
            ch.streamfile.read(&mut buf, frame_offset + u64::from(k));
            let sample = if self.unsigned {
                i32::from(buf[0]) - 128
            } else {
                i32::from(buf[0] as i8)
            } << 8;
            out[(channel_index as usize) + (channels as usize) * (k as usize)] = sample;
        }
        ch.offset = frame_offset + u64::from(samples_to_do);
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes / u64::from(channels.max(1))
    }
}

/// 16-bit PCM, one configurable-endianness `i16` per sample.
#[derive(Debug)]
pub struct Pcm16 {
    /// Byte order samples are stored in.
    pub big_endian: bool,
}

impl Decoder for Pcm16 {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let frame_offset = ch.offset + 2 * u64::from(first_sample);
        for k in 0..samples_to_do {
            let mut buf = [0u8; 2];
            ch.streamfile.read(&mut buf, frame_offset + 2 * u64::from(k));
            let sample = if self.big_endian {
                i16::from_be_bytes(buf)
            } else {
                i16::from_le_bytes(buf)
            };
            out[(channel_index as usize) + (channels as usize) * (k as usize)] = i32::from(sample);
        }
        ch.offset = frame_offset + 2 * u64::from(samples_to_do);
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes / (2 * u64::from(channels.max(1)))
    }
}

/// 24-bit PCM, little-endian, sign-extended to 32 bits for internal
/// processing.
#[derive(Debug, Default)]
pub struct Pcm24Le;

impl Decoder for Pcm24Le {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let frame_offset = ch.offset + 3 * u64::from(first_sample);
        for k in 0..samples_to_do {
            let mut buf = [0u8; 4];
            ch.streamfile.read(&mut buf[..3], frame_offset + 3 * u64::from(k));
            // sign-extend the 24-bit value held in the low 3 bytes
            let unsigned = i32::from_le_bytes(buf);
            let sample = (unsigned << 8) >> 8;
            out[(channel_index as usize) + (channels as usize) * (k as usize)] = sample >> 8;
        }
        ch.offset = frame_offset + 3 * u64::from(samples_to_do);
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes / (3 * u64::from(channels.max(1)))
    }
}

/// 32-bit PCM, little-endian.
#[derive(Debug, Default)]
pub struct Pcm32Le;

impl Decoder for Pcm32Le {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let frame_offset = ch.offset + 4 * u64::from(first_sample);
        for k in 0..samples_to_do {
            let mut buf = [0u8; 4];
            ch.streamfile.read(&mut buf, frame_offset + 4 * u64::from(k));
            let sample = i32::from_le_bytes(buf);
            out[(channel_index as usize) + (channels as usize) * (k as usize)] = sample >> 16;
        }
        ch.offset = frame_offset + 4 * u64::from(samples_to_do);
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes / (4 * u64::from(channels.max(1)))
    }
}

/// 32-bit IEEE 754 float PCM, little-endian, scaled to the crate's internal
/// `i32` sample representation.
#[derive(Debug, Default)]
pub struct PcmFloat;

impl Decoder for PcmFloat {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    ) {
        let frame_offset = ch.offset + 4 * u64::from(first_sample);
        for k in 0..samples_to_do {
            let mut buf = [0u8; 4];
            ch.streamfile.read(&mut buf, frame_offset + 4 * u64::from(k));
            let sample = f32::from_le_bytes(buf).clamp(-1.0, 1.0);
            out[(channel_index as usize) + (channels as usize) * (k as usize)] =
                (sample * f32::from(i16::MAX)) as i32;
        }
        ch.offset = frame_offset + 4 * u64::from(samples_to_do);
    }

    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64 {
        bytes / (4 * u64::from(channels.max(1)))
    }
}

#[cfg(test)]
mod test {
    use super::{Decoder, Pcm16};
    use crate::codecs::ChannelState;
    use crate::streamfile::SliceFile;

    #[test]
    fn decodes_little_endian_pcm16() {
        let sf = SliceFile::new(*b"\x01\x00\xFF\xFF\x02\x00", "t.pcm");
        let mut ch = ChannelState::new(Box::new(sf), 0);
        let mut decoder = Pcm16 { big_endian: false };
        let mut out = [0i32; 3];

        decoder.decode(&mut ch, &mut out, 0, 3, 1, 0);

        assert_eq!(out, [1, -1, 2]);
        assert_eq!(ch.offset, 6);
    }
}
