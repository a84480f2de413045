//! Blocked layout: the stream body is a sequence of container-defined
//! blocks, each carrying its own header; all channels advance together at
//! block boundaries. Each variant is a small
//! `update_block`-equivalent ([`BlockUpdater::update_block`]).

use crate::codecs::{ChannelState, Decoder};
use std::fmt::Debug;

/// Result of reading one block's header: how large the block is (per
/// channel, in bytes) and where the next one starts.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    /// Bytes of audio data this block holds for a single channel.
    pub block_size: u64,
    /// Absolute offset of the next block's header.
    pub next_block_offset: u64,
}

/// Per-format logic for walking one blocked-layout variant: reads the block
/// header at `offset`, repositions every channel's `start_offset`/`offset`
/// for the upcoming block, and reports the new block's size.
pub trait BlockUpdater: Debug {
    /// Reads the block header at `offset` and updates `channels` in place.
    fn update_block(&mut self, channels: &mut [ChannelState], offset: u64) -> BlockInfo;
}

/// EA SWVR blocked layout, grounded in `blocked_ea_swvr.c`: each block opens
/// with an 8-byte `[4-byte id][4-byte big-endian size]` pair; audio data for
/// every channel follows a fixed-size per-block sub-header, split evenly
/// across channels.
#[derive(Debug, Clone, Copy)]
pub struct EaSwvr {
    /// Bytes of per-block sub-header between the 8-byte chunk tag and the
    /// first channel's audio data.
    pub header_size: u64,
}

impl BlockUpdater for EaSwvr {
    fn update_block(&mut self, channels: &mut [ChannelState], offset: u64) -> BlockInfo {
        let nch = channels.len().max(1) as u64;

        let mut size_buf = [0u8; 4];
        channels[0].streamfile.read(&mut size_buf, offset + 4);
        let chunk_size = u64::from(u32::from_be_bytes(size_buf));
        let data_size = chunk_size.saturating_sub(8 + self.header_size);
        let per_channel = data_size / nch;

        for (i, ch) in channels.iter_mut().enumerate() {
            let start = offset + 8 + self.header_size + (i as u64) * per_channel;
            ch.start_offset = start;
            ch.offset = start;
        }

        BlockInfo {
            block_size: per_channel,
            next_block_offset: offset + chunk_size.max(8),
        }
    }
}

/// The handful of blocked-layout variants this crate implements concretely,
/// plus an extension point for variants outside the representative set.
#[derive(Debug)]
pub enum BlockedVariant {
    /// EA SWVR (`blocked_ea_swvr.c`).
    EaSwvr(EaSwvr),
    /// Caller-supplied variant not implemented natively.
    Custom(Box<dyn BlockUpdater>),
}

impl BlockedVariant {
    fn updater(&mut self) -> &mut dyn BlockUpdater {
        match self {
            Self::EaSwvr(u) => u,
            Self::Custom(u) => u.as_mut(),
        }
    }
}

/// Blocked-layout cursor: which block is current, how big it is, and where
/// the next one begins.
#[derive(Debug)]
pub struct BlockedState {
    variant: BlockedVariant,
    /// Offset of the block currently being decoded.
    pub current_block_offset: u64,
    /// Size (per channel, bytes) of the block currently being decoded.
    pub current_block_size: u64,
    /// Offset of the next block's header.
    pub next_block_offset: u64,
    samples_into_block: u32,
}

impl BlockedState {
    /// Starts a blocked-layout cursor with no block loaded yet; the first
    /// [`decode`] call will read the header at `first_block_offset`.
    #[must_use]
    pub fn new(variant: BlockedVariant, first_block_offset: u64) -> Self {
        Self {
            variant,
            current_block_offset: first_block_offset,
            current_block_size: 0,
            next_block_offset: first_block_offset,
            samples_into_block: 0,
        }
    }
}

pub(super) fn decode(
    state: &mut BlockedState,
    decoder: &mut dyn Decoder,
    channels: &mut [ChannelState],
    out: &mut [i32],
    samples_to_do: u32,
) {
    let nch = channels.len() as u8;
    let mut done = 0u32;

    while done < samples_to_do {
        let samples_per_block = if state.current_block_size == 0 {
            0
        } else {
            decoder.bytes_to_samples(state.current_block_size, 1) as u32
        };

        if state.samples_into_block >= samples_per_block {
            state.current_block_offset = state.next_block_offset;
            let info = state.variant.updater().update_block(channels, state.current_block_offset);
            state.current_block_size = info.block_size;
            state.next_block_offset = info.next_block_offset;
            state.samples_into_block = 0;
            continue;
        }

        let remaining_in_block = samples_per_block - state.samples_into_block;
        let chunk = remaining_in_block.min(samples_to_do - done);
        let out_offset = (done as usize) * (nch as usize);

        // `ch.offset` already tracks the true cursor (the codec advances it
        // after every `decode` call); it is only reset to the block's start
        // by `update_block`, so subsequent chunks within the same block pass
        // `first_sample: 0` rather than re-deriving it from
        // `samples_into_block` (that convention belongs to interleave's
        // always-reset-to-block-start strategy, see `interleave.rs`).
        for (i, ch) in channels.iter_mut().enumerate() {
            decoder.decode(ch, &mut out[out_offset..], 0, chunk, nch, i as u8);
        }

        state.samples_into_block += chunk;
        done += chunk;
    }
}
