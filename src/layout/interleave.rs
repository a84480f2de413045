//! Interleaved layout: `[ch0 block][ch1 block]...[chN-1 block][ch0 block]...`
//!
//! Render proceeds in chunks bounded by block boundaries: for
//! each channel the engine points `ChannelState` at this chunk's block,
//! calls the codec for up to the block's sample count, then moves to the
//! next chunk.

use crate::codecs::{ChannelState, Decoder};

/// Byte-layout parameters for one interleaved stream. `first_block_size`/
/// `last_block_size` of `0` mean "same as `block_size`" (the common case);
/// non-zero values handle the short-first/short-last-block edge cases.
#[derive(Debug, Clone, Copy)]
pub struct InterleaveParams {
    /// Absolute offset of the first byte of channel 0's first block.
    pub data_start: u64,
    /// Bytes per channel per block.
    pub block_size: u64,
    /// Override for the size of the very first block (0 = `block_size`).
    pub first_block_size: u64,
    /// Bytes to skip into the first block before channel data starts
    /// (e.g. an embedded sub-header).
    pub first_skip: u64,
    /// Samples decoded from one full `block_size` block.
    pub samples_per_block: u32,
}

impl InterleaveParams {
    fn block_size_for(&self, block_index: u64) -> u64 {
        if block_index == 0 && self.first_block_size != 0 {
            self.first_block_size
        } else {
            self.block_size
        }
    }
}

pub(super) fn decode(
    params: &InterleaveParams,
    decoder: &mut dyn Decoder,
    channels: &mut [ChannelState],
    current_sample: u32,
    out: &mut [i32],
    samples_to_do: u32,
) {
    let nch = channels.len() as u8;
    let spb = params.samples_per_block.max(1);
    let mut done = 0u32;

    while done < samples_to_do {
        let global_sample = current_sample + done;
        let block_index = u64::from(global_sample / spb);
        let pos_in_block = global_sample % spb;
        let this_block_size = params.block_size_for(block_index);
        let chunk = (spb - pos_in_block).min(samples_to_do - done);

        let skip = if block_index == 0 { params.first_skip } else { 0 };
        let block_base = params.data_start + block_index * params.block_size * u64::from(nch) + skip;

        for (i, ch) in channels.iter_mut().enumerate() {
            // Codecs anchor `first_sample` off either field depending on
            // family (PCM/companding use `offset`, the ADPCM family uses
            // `start_offset`); set both to the block's start so either
            // convention lands at the same byte.
            ch.start_offset = block_base + (i as u64) * this_block_size;
            ch.offset = ch.start_offset;
        }

        let out_offset = (done as usize) * (nch as usize);
        for (i, ch) in channels.iter_mut().enumerate() {
            decoder.decode(ch, &mut out[out_offset..], pos_in_block, chunk, nch, i as u8);
        }

        done += chunk;
    }
}

#[cfg(test)]
mod test {
    use super::{decode, InterleaveParams};
    use crate::codecs::{pcm::Pcm16, ChannelState};
    use crate::streamfile::SliceFile;

    #[test]
    fn splits_stereo_blocks_per_channel() {
        // two channels, block_size=4 bytes (2 samples of PCM16), data is
        // ch0 block [1,2], ch1 block [10,20], ch0 block [3,4], ch1 block [30,40]
        let mut data = Vec::new();
        for v in [1i16, 2, 10, 20, 3, 4, 30, 40] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        let params = InterleaveParams {
            data_start: 0,
            block_size: 4,
            first_block_size: 0,
            first_skip: 0,
            samples_per_block: 2,
        };

        let mut channels = vec![
            ChannelState::new(Box::new(SliceFile::new(data.clone(), "t.bin")), 0),
            ChannelState::new(Box::new(SliceFile::new(data, "t.bin")), 0),
        ];
        let mut decoder = Pcm16 { big_endian: false };
        let mut out = [0i32; 8];

        decode(&params, &mut decoder, &mut channels, 0, &mut out, 4);

        assert_eq!(out, [1, 10, 2, 20, 3, 30, 4, 40]);
    }
}
