//! Public surface (§6): `version`, `set_log`, `create_stream`, `is_valid`,
//! the extension lists, `get_title`/`format_describe`, and the
//! [`FormatInfo`](crate::stream::FormatInfo) view.

use crate::config::StreamConfig;
use crate::registry::Registry;
use crate::stream::{FormatInfo, Stream};
use crate::streamfile::Streamfile;
use std::fmt::Write as _;
use std::sync::{Arc, Once};

/// This crate's version, packed as `0xMMmmpppp` (major/minor bytes, patch a
/// 16-bit field), per §6.
#[must_use]
pub fn version() -> u32 {
    const MAJOR: u32 = 0;
    const MINOR: u32 = 1;
    const PATCH: u32 = 0;
    (MAJOR << 24) | (MINOR << 16) | PATCH
}

/// Logging verbosity threshold for [`set_log`]. Lower values are more
/// verbose; a level only receives messages at or above its own severity
/// (`All` receives everything, `None` receives nothing).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[non_exhaustive]
pub enum LogLevel {
    /// Every message, including debug-level detail.
    All = 0,
    /// Debug-level detail and above.
    Debug = 20,
    /// Informational messages and above (the common default).
    Info = 30,
    /// No messages at all.
    None = 100,
}

fn severity(level: tracing::Level) -> u8 {
    match level {
        tracing::Level::TRACE | tracing::Level::DEBUG => LogLevel::Debug as u8,
        tracing::Level::INFO | tracing::Level::WARN | tracing::Level::ERROR => LogLevel::Info as u8,
    }
}

/// Bridges `tracing` events to a caller-supplied callback (§0.2/§5: "a
/// thin bridge that installs a `tracing::Subscriber` wrapping the caller's
/// callback"). Has no span-tracking of its own — every span gets the same
/// dummy id — since this crate's log points are all flat `event!` calls,
/// not nested spans.
struct CallbackSubscriber {
    min_level: u8,
    callback: Arc<dyn Fn(LogLevel, &str) + Send + Sync>,
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.message, " {}={value:?}", field.name());
        }
    }
}

impl tracing::Subscriber for CallbackSubscriber {
    fn enabled(&self, metadata: &tracing::Metadata<'_>) -> bool {
        severity(*metadata.level()) >= self.min_level
    }

    fn new_span(&self, _span: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        tracing::span::Id::from_u64(1)
    }

    fn record(&self, _span: &tracing::span::Id, _values: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _span: &tracing::span::Id, _follows: &tracing::span::Id) {}

    fn event(&self, event: &tracing::Event<'_>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let level = if severity(*event.metadata().level()) >= LogLevel::Info as u8 {
            LogLevel::Info
        } else {
            LogLevel::Debug
        };
        (self.callback)(level, &visitor.message);
    }

    fn enter(&self, _span: &tracing::span::Id) {}

    fn exit(&self, _span: &tracing::span::Id) {}
}

static LOG_INSTALLED: Once = Once::new();

/// Installs a global log sink (§5: "Global log sink (single callback
/// registered once)"). Only the first call across the process takes
/// effect; subsequent calls are ignored, matching the "registered once"
/// contract. Before any call, logging is a no-op.
pub fn set_log(level: LogLevel, callback: impl Fn(LogLevel, &str) + Send + Sync + 'static) {
    let subscriber = CallbackSubscriber { min_level: level as u8, callback: Arc::new(callback) };
    LOG_INSTALLED.call_once(|| {
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Parses a container from `sf` and sets up subsong `subsong_index`
/// (`0` meaning "default") with `config` (defaulted if `None`). Returns
/// `None` if no registered parser recognizes `sf`.
#[must_use]
pub fn create_stream(sf: &mut dyn Streamfile, subsong_index: u32, config: Option<StreamConfig>) -> Option<Stream> {
    let mut stream = Registry::standard().probe(sf, subsong_index)?;
    stream.configure(config.unwrap_or_default());
    Some(stream)
}

/// Options gating [`is_valid`]'s extension probe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IsValidOptions {
    /// Accept any extension not in either extension list.
    pub accept_unknown: bool,
    /// Also accept extensions from [`get_common_extensions`] (ambiguous
    /// with other tools, e.g. `.wav`/`.ogg`).
    pub accept_common: bool,
    /// Reject filenames with no extension outright, regardless of
    /// `accept_unknown`.
    pub reject_extensionless: bool,
    /// Skip the standard extension list, only consulting `accept_common`/
    /// `accept_unknown`.
    pub skip_standard: bool,
}

/// Extension-only probe (§6): does not open or read `filename`, just checks
/// its extension against the registered format lists per `options`.
#[must_use]
pub fn is_valid(filename: &str, options: IsValidOptions) -> bool {
    let Some(ext) = extension_of(filename) else {
        return !options.reject_extensionless && options.accept_unknown;
    };

    if !options.skip_standard && get_extensions().contains(&ext.as_str()) {
        return true;
    }
    if options.accept_common && get_common_extensions().contains(&ext.as_str()) {
        return true;
    }
    options.accept_unknown
}

fn extension_of(filename: &str) -> Option<String> {
    let dot = filename.rfind('.')?;
    if dot == 0 {
        return None;
    }
    Some(filename[dot + 1..].to_ascii_lowercase())
}

const EXTENSIONS: &[&str] = &["fsb", "acx", "hca", "nwa", "dsp", "vag", "ogg", "wav", "genh"];
const COMMON_EXTENSIONS: &[&str] = &["ogg", "wav"];

/// Every extension a registered parser recognizes by hint.
#[must_use]
pub fn get_extensions() -> &'static [&'static str] {
    EXTENSIONS
}

/// The subset of [`get_extensions`] that collide with common non-game-audio
/// uses (plain Ogg/WAV files), which callers may want to gate separately.
#[must_use]
pub fn get_common_extensions() -> &'static [&'static str] {
    COMMON_EXTENSIONS
}

/// Builds a read-only [`FormatInfo`] snapshot of `stream`'s shape.
#[must_use]
pub fn format_info(stream: &Stream) -> FormatInfo {
    FormatInfo {
        channels: stream.buf_channels,
        sample_rate: stream.sample_rate,
        stream_samples: stream.num_samples,
        play_samples: stream.play_samples,
        loop_start: stream.loop_start_sample,
        loop_end: stream.loop_end_sample,
        loop_flag: stream.loop_flag,
        play_forever: stream.config.play_forever && stream.config.allow_play_forever,
        subsong_index: stream.stream_index,
        subsong_count: stream.num_streams,
        codec_name: stream.coding_type.name(),
        layout_name: stream.layout_type.name(),
        meta_name: stream.meta_type.name(),
        stream_name: stream.stream_name.clone(),
        sample_format: stream.config.force_sfmt.unwrap_or_default(),
        sample_size: crate::mixing::sample_size(stream.config.force_sfmt.unwrap_or_default()),
        channel_layout: ChannelLayout::standard(stream.buf_channels),
        stream_bitrate: estimate_bitrate(stream),
    }
}

fn estimate_bitrate(stream: &Stream) -> u32 {
    if stream.num_samples == 0 || stream.sample_rate == 0 {
        return 0;
    }
    let seconds = f64::from(stream.num_samples) / f64::from(stream.sample_rate);
    if seconds <= 0.0 || stream.stream_size == 0 {
        return 0;
    }
    ((stream.stream_size as f64 * 8.0) / seconds).round() as u32
}

/// Options for [`get_title`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleOptions {
    /// Append the 1-based subsong index when a container has more than one
    /// stream.
    pub show_subsong: bool,
}

/// Builds a human-readable title into `buf` (cleared first), from the
/// stream's name and, if requested, its subsong index.
pub fn get_title(stream: &Stream, options: TitleOptions, buf: &mut String) {
    buf.clear();
    if stream.stream_name.is_empty() {
        buf.push_str(stream.meta_type.name());
    } else {
        buf.push_str(&stream.stream_name);
    }
    if options.show_subsong && stream.num_streams > 1 {
        let _ = write!(buf, " #{}", stream.stream_index);
    }
}

/// Writes a multi-line human-readable description of `stream` into `buf`
/// (cleared first): codec, layout, loop points, subsong position.
pub fn format_describe(stream: &Stream, buf: &mut String) {
    buf.clear();
    let _ = writeln!(buf, "meta: {}", stream.meta_type.name());
    let _ = writeln!(buf, "codec: {}", stream.coding_type.name());
    let _ = writeln!(buf, "layout: {}", stream.layout_type.name());
    let _ = writeln!(buf, "channels: {}", stream.channels);
    let _ = writeln!(buf, "sample rate: {} Hz", stream.sample_rate);
    let _ = writeln!(buf, "samples: {}", stream.num_samples);
    if stream.loop_flag {
        let _ = writeln!(buf, "loop: {} - {}", stream.loop_start_sample, stream.loop_end_sample);
    }
    if stream.num_streams > 1 {
        let _ = writeln!(buf, "stream: {} / {}", stream.stream_index, stream.num_streams);
    }
}

bitflags::bitflags! {
    /// Standard WAVE channel-position bitmask, used by [`FormatInfo::channel_layout`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChannelLayout: u32 {
        /// Front left.
        const FRONT_LEFT = 0x1;
        /// Front right.
        const FRONT_RIGHT = 0x2;
        /// Front center.
        const FRONT_CENTER = 0x4;
        /// Low-frequency effects.
        const LOW_FREQUENCY = 0x8;
        /// Back left.
        const BACK_LEFT = 0x10;
        /// Back right.
        const BACK_RIGHT = 0x20;
        /// Side left.
        const SIDE_LEFT = 0x200;
        /// Side right.
        const SIDE_RIGHT = 0x400;
    }
}

impl ChannelLayout {
    /// A conventional front-to-back channel layout for `channels` channels
    /// (mono/stereo/5.1/7.1); unlisted counts report no positions (an empty
    /// mask is a valid, if uninformative, WAVE channel mask).
    #[must_use]
    pub fn standard(channels: u8) -> Self {
        match channels {
            1 => Self::FRONT_CENTER,
            2 => Self::FRONT_LEFT | Self::FRONT_RIGHT,
            6 => {
                Self::FRONT_LEFT
                    | Self::FRONT_RIGHT
                    | Self::FRONT_CENTER
                    | Self::LOW_FREQUENCY
                    | Self::BACK_LEFT
                    | Self::BACK_RIGHT
            }
            8 => {
                Self::FRONT_LEFT
                    | Self::FRONT_RIGHT
                    | Self::FRONT_CENTER
                    | Self::LOW_FREQUENCY
                    | Self::BACK_LEFT
                    | Self::BACK_RIGHT
                    | Self::SIDE_LEFT
                    | Self::SIDE_RIGHT
            }
            _ => Self::empty(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{is_valid, IsValidOptions};

    #[test]
    fn accepts_known_extension() {
        assert!(is_valid("song.vag", IsValidOptions::default()));
    }

    #[test]
    fn rejects_unknown_extension_by_default() {
        assert!(!is_valid("song.xyz", IsValidOptions::default()));
    }

    #[test]
    fn accepts_unknown_when_requested() {
        let opts = IsValidOptions { accept_unknown: true, ..IsValidOptions::default() };
        assert!(is_valid("song.xyz", opts));
    }

    #[test]
    fn rejects_extensionless_when_requested() {
        let opts = IsValidOptions { accept_unknown: true, reject_extensionless: true, ..IsValidOptions::default() };
        assert!(!is_valid("song", opts));
    }
}
