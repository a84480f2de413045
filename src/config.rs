//! Render-time configuration (`libvgmstream_config_t`).
//!
//! A plain data struct copied by value, matching the teacher's preference
//! for explicit structs over a builder — applied once, after a [`Stream`
//! is parsed](crate::stream::Stream) and before the first [`render`
//! call](crate::render).

/// Output sample format a caller may force via [`StreamConfig::force_sfmt`].
/// Internal decode always produces 16-bit-range values; wider formats are
/// produced by the [mixing chain](crate::mixing) at the final conversion
/// step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SampleFormat {
    /// 16-bit signed PCM (the decoder's native resolution).
    #[default]
    Pcm16,
    /// 24-bit signed PCM, packed little-endian.
    Pcm24,
    /// 32-bit signed PCM.
    Pcm32,
    /// 32-bit IEEE float, range `[-1.0, 1.0]`.
    Float32,
}

/// Render/loop/fade/downmix configuration applied to a [`Stream`](crate::stream::Stream)
/// at setup time (option table, reproduced here field for
/// field).
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamConfig {
    /// Target number of loops to play (fractional allowed, e.g. `1.5`).
    pub loop_count: f64,
    /// Seconds of linear fade appended after the target loop count.
    pub fade_time: f64,
    /// Seconds of silence appended after the fade, before the stream ends.
    pub fade_delay: f64,
    /// Treat the stream as non-looping even if it declares loop points.
    pub ignore_loop: bool,
    /// If the stream has no loop points, loop the full `0..num_samples`.
    pub force_loop: bool,
    /// Override even an existing loop point with the full-stream loop.
    pub really_force_loop: bool,
    /// Play the post-loop tail without fading.
    pub ignore_fade: bool,
    /// Never stop rendering (requires `allow_play_forever`).
    pub play_forever: bool,
    /// Gate for [`play_forever`](Self::play_forever); a stream that does not
    /// explicitly allow it ignores the request.
    pub allow_play_forever: bool,
    /// Downmix to this many channels if the source has more. `0` disables
    /// downmixing.
    pub auto_downmix_channels: u8,
    /// Force the output sample format, overriding the codec's native width.
    pub force_sfmt: Option<SampleFormat>,
    /// Select the Nth (1-based) stereo pair from a many-channel source
    /// before any other mixing step. `0` disables track selection.
    pub stereo_track: u8,
    /// Ignore format-embedded configuration hints (e.g. playlist-style
    /// loop/fade overrides some containers carry).
    pub disable_config_override: bool,
    /// Preserve heuristic loop-point detection for the handful of formats
    /// that need it (certain `.mus` variants, XMA UE3's "full loop disabled
    /// if short" rule) behind an explicit opt-in rather than always-on; see
    /// `DESIGN.md`'s Open Question Decisions.
    pub heuristic_loop: bool,
    /// Explicit 64-bit HCA decryption key, for `CipherType::Keyed` streams.
    /// Not part of the option table in §4.8 (HCA's key is a per-format
    /// concern, not a general render option) but threaded through the same
    /// struct since it's the only per-stream secret this crate's
    /// representative format set needs; see SPEC_FULL.md §11 and
    /// `meta::HcaMeta::open_with_key`.
    pub hca_key: Option<u64>,
}
