//! # vgmstream
//!
//! `vgmstream` decodes audio streams from video game container formats into
//! PCM samples. It recognizes a representative set of bespoke,
//! platform-specific containers and renders linear audio with optional loop
//! expansion, fade-out, and channel downmixing.
//!
//! The crate is built around a [`streamfile::Streamfile`] abstraction (so
//! callers can back decoding with files, byte slices, or custom I/O), a
//! registry of format [`meta::Parser`]s that recognize a container and
//! produce a [`stream::Stream`], and a [`render`] loop that drives the
//! stream's layout and codec to produce PCM.

#![warn(clippy::pedantic, future_incompatible)]
#![deny(
    let_underscore_drop,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_abi,
    missing_debug_implementations,
    missing_docs,
    non_ascii_idents,
    nonstandard_style,
    noop_method_call,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_op_in_unsafe_fn,
    unused,
    unused_import_braces,
    unused_lifetimes,
    unused_macro_rules,
    unused_qualifications,
    unused_tuple_struct_fields
)]

pub mod api;
pub mod codecs;
pub mod config;
pub mod io;
pub mod layout;
pub mod meta;
pub mod mixing;
pub mod registry;
pub mod render;
pub mod stream;
pub mod streamfile;
pub mod tags;

pub use api::{
    create_stream, format_describe, get_common_extensions, get_extensions, get_title, is_valid,
    set_log, version, LogLevel,
};
pub use config::StreamConfig;
pub use stream::{ChannelState, FormatInfo, Stream};
pub use streamfile::Streamfile;
