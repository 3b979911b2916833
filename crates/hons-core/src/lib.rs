//! Hash-consing engine with applicative hash tables ("Hons Space"): a
//! `HonsSpace` canonicalizes recursive pair/atom value trees so that
//! semantic equality between two normed values reduces to a pointer
//! comparison, and layers an O(1) fast-alist registry on top of ordinary
//! cons-chain association lists.
//!
//! This crate is the embeddable engine: it has no process-wide default
//! instance and no global mutable state of its own (beyond the symbol
//! interning table in [`value`], which the spec treats as a host-provided
//! guarantee rather than part of any one space). See the `hons` crate for
//! a thread-local default `HonsSpace` and the free-function `hons_*` API
//! built on top of it.

pub mod backend;
pub mod cache;
pub mod combine;
pub mod config;
pub mod critical;
pub mod error;
pub mod fal;
pub mod flex;
pub mod host;
pub mod persist;
pub mod sbits;
pub mod space;
pub mod value;

pub use config::{BackendKind, HonsConfig, ResizeHints, SlowAlistAction};
pub use error::HonsError;
pub use space::HonsSpace;
pub use value::{deep_equal, lite_equal, Atom, Pair, Rational, Symbol, Value};
