//! Vorbis decoding: standard Ogg-encapsulated passthrough plus the
//! container-specific headerless framings in [`custom`].
//!
//! Both paths decode all channels together from one shared bitstream (a
//! Vorbis audio packet carries every channel's samples for that block), so
//! [`Decoder::is_multichannel`] is `true` here — the [layout engine](crate::layout)
//! drives this decoder once per render chunk against channel 0's
//! [`ChannelState`] rather than once per channel.

pub mod custom;

use super::{ChannelState, CodecState, Decoder};
use crate::streamfile::Streamfile;
use lewton::{
    audio::{read_audio_packet_generic, AudioReadError, PreviousWindowRight},
    header::{IdentHeader, SetupHeader},
    inside_ogg::OggStreamReader,
    samples::Samples,
};
use std::{
    fmt::{self, Debug, Formatter},
    io::{Read, Result as IoResult, Seek, SeekFrom},
};

/// Adapts a [`Streamfile`] to `Read + Seek` so `lewton`'s own Ogg page
/// parser (which wants a seekable reader) can drive it directly.
pub struct SeekableStreamfileReader {
    sf: Box<dyn Streamfile>,
    pos: u64,
}

impl SeekableStreamfileReader {
    fn new(sf: Box<dyn Streamfile>, start: u64) -> Self {
        Self { sf, pos: start }
    }
}

impl Read for SeekableStreamfileReader {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let n = self.sf.read(buf, self.pos);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for SeekableStreamfileReader {
    fn seek(&mut self, pos: SeekFrom) -> IoResult<u64> {
        self.pos = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::End(delta) => (self.sf.size() as i64 + delta).max(0) as u64,
            SeekFrom::Current(delta) => (self.pos as i64 + delta).max(0) as u64,
        };
        Ok(self.pos)
    }
}

/// Decoded samples buffered across `decode` calls: a Vorbis packet almost
/// never lines up with the caller's requested `samples_to_do`, so leftover
/// interleaved samples from the last packet carry forward here.
#[derive(Default)]
struct SampleQueue {
    interleaved: Vec<i32>,
    consumed: usize,
}

impl SampleQueue {
    fn remaining(&self) -> usize {
        self.interleaved.len() - self.consumed
    }

    fn push_block(&mut self, channels: &[Vec<f32>]) {
        self.interleaved.clear();
        self.consumed = 0;
        let n = channels.first().map_or(0, Vec::len);
        for i in 0..n {
            for ch in channels {
                let sample = (ch[i] * f32::from(i16::MAX)).clamp(
                    f32::from(i16::MIN),
                    f32::from(i16::MAX),
                );
                self.interleaved.push(sample as i32);
            }
        }
    }

    fn drain_into(&mut self, out: &mut [i32], channels: u8, want: u32) -> u32 {
        let channels = channels as usize;
        let mut done = 0u32;
        while done < want && self.remaining() >= channels {
            let base = self.consumed;
            out[(done as usize) * channels..(done as usize + 1) * channels]
                .copy_from_slice(&self.interleaved[base..base + channels]);
            self.consumed += channels;
            done += 1;
        }
        done
    }
}

struct VorbisBlock(Vec<Vec<f32>>);

impl Samples for VorbisBlock {
    fn from_floats(floats: Vec<Vec<f32>>) -> Self {
        Self(floats)
    }

    fn num_samples(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    fn truncate(&mut self, limit: usize) {
        for ch in &mut self.0 {
            if limit < ch.len() {
                ch.truncate(limit);
            }
        }
    }
}

/// Headless (`ident`/`setup` packets reconstructed or loaded externally)
/// Vorbis decode state, shared by every `custom` framing variant.
pub(super) struct CustomState {
    pub ident: IdentHeader,
    pub setup: SetupHeader,
    window: PreviousWindowRight,
    queue: SampleQueue,
    framing: custom::Framing,
}

/// Decode state for one Vorbis-coded [`crate::stream::Stream`]: either
/// standard Ogg-encapsulated passthrough or one of the headerless custom
/// framings.
pub enum VorbisState {
    /// Plain Ogg container; `lewton` parses pages and packets itself.
    Standard(Box<OggStreamReader<SeekableStreamfileReader>>, SampleQueue),
    /// Headerless framing (FSB/Wwise/OGL/SK/VID1/AWC), see [`custom`].
    Custom(CustomState),
}

impl Debug for VorbisState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard(..) => f.write_str("VorbisState::Standard(..)"),
            Self::Custom(..) => f.write_str("VorbisState::Custom(..)"),
        }
    }
}

impl VorbisState {
    /// Opens a standard Ogg Vorbis stream starting at `start_offset`.
    pub fn open_standard(sf: Box<dyn Streamfile>, start_offset: u64) -> Option<Self> {
        let reader = SeekableStreamfileReader::new(sf, start_offset);
        let ogg = OggStreamReader::new(reader).ok()?;
        Some(Self::Standard(Box::new(ogg), SampleQueue::default()))
    }

    /// Opens a custom-framed Vorbis stream (see [`custom::Framing`]).
    pub fn open_custom(
        ident: IdentHeader,
        setup: SetupHeader,
        framing: custom::Framing,
    ) -> Self {
        Self::Custom(CustomState {
            ident,
            setup,
            window: PreviousWindowRight::new(),
            queue: SampleQueue::default(),
            framing,
        })
    }
}

/// `Decoder` front-end for both Vorbis framings. `decode` is called once per
/// render chunk (see [`Decoder::is_multichannel`]) against channel 0.
#[derive(Debug, Default)]
pub struct Vorbis;

impl Decoder for Vorbis {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        _first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        _channel_index: u8,
    ) {
        let mut state = match std::mem::replace(&mut ch.codec, CodecState::None) {
            CodecState::Vorbis(state) => state,
            other => {
                ch.codec = other;
                out.iter_mut().take(samples_to_do as usize * channels as usize).for_each(|s| *s = 0);
                return;
            }
        };

        let mut done = 0u32;
        while done < samples_to_do {
            let queue_remaining = match state.as_mut() {
                VorbisState::Standard(_, queue) | VorbisState::Custom(CustomState { queue, .. }) => {
                    queue.remaining()
                }
            };

            if queue_remaining == 0 && !refill(&mut state, ch) {
                tracing::warn!("vorbis stream ended before play length was reached");
                break;
            }

            let queue = match state.as_mut() {
                VorbisState::Standard(_, queue) => queue,
                VorbisState::Custom(CustomState { queue, .. }) => queue,
            };
            let out_offset = (done as usize) * (channels as usize);
            done += queue.drain_into(&mut out[out_offset..], channels, samples_to_do - done);
        }

        if done < samples_to_do {
            let out_offset = (done as usize) * (channels as usize);
            out[out_offset..(samples_to_do as usize) * (channels as usize)]
                .iter_mut()
                .for_each(|s| *s = 0);
        }

        ch.codec = CodecState::Vorbis(state);
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        ch.offset = ch.start_offset;
        if let CodecState::Vorbis(state) = &mut ch.codec {
            match state.as_mut() {
                VorbisState::Standard(_, queue) => *queue = SampleQueue::default(),
                VorbisState::Custom(s) => {
                    s.window = PreviousWindowRight::new();
                    s.queue = SampleQueue::default();
                }
            }
        }
    }

    fn bytes_to_samples(&self, _bytes: u64, _channels: u8) -> u64 {
        // Vorbis is variable-bitrate; callers must get `num_samples` from
        // the container's declared sample count instead.
        0
    }

    fn is_multichannel(&self) -> bool {
        true
    }
}

fn refill(state: &mut Box<VorbisState>, ch: &mut ChannelState) -> bool {
    match state.as_mut() {
        VorbisState::Standard(ogg, queue) => match ogg.read_dec_packet_itl() {
            Ok(Some(samples)) => {
                queue.interleaved = samples.into_iter().map(i32::from).collect();
                queue.consumed = 0;
                true
            }
            _ => false,
        },
        VorbisState::Custom(s) => {
            let Some(packet) = custom::next_packet(&s.framing, ch) else {
                return false;
            };
            match read_audio_packet_generic::<VorbisBlock>(&s.ident, &s.setup, &packet, &mut s.window) {
                Ok(block) => {
                    s.queue.push_block(&block.0);
                    true
                }
                Err(AudioReadError::EndOfPacket) => false,
                Err(e) => {
                    tracing::warn!(error = %e, "vorbis packet decode failed, treating as end of stream");
                    false
                }
            }
        }
    }
}
