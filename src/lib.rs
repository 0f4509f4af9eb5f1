//! # hxaudio
//!
//! `hxaudio` is a library for reading, editing, and writing hx-family
//! audio resource containers, the object-archive format used by a
//! family of early-2000s console games across six platform dialects
//! (`HXD`, `HXC`, `HX2`, `HXG`, `HXX`, `HX3`). It also decodes and
//! encodes the two platform-specific ADPCM codecs those containers
//! carry: GameCube "DSP" ADPCM and PlayStation "PSX" ADPCM.

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
    unused_crate_dependencies,
    unused_import_braces,
    unused_lifetimes,
    unused_macro_rules,
    unused_qualifications,
    unused_results,
    unused_tuple_struct_fields
)]

pub mod audio;
pub mod bytestream;
pub mod class;
pub mod codec;
pub mod container;
mod cuuid;
mod error;
pub mod language;
pub mod version;
pub mod wav;

pub use cuuid::Cuuid;
pub use error::HxError;

// Used only by `src/bin/hxtool.rs`; referenced here so the library
// target doesn't trip `unused_crate_dependencies`.
use clap as _;
use env_logger as _;
