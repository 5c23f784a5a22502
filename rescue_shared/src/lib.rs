//! `rescue_shared`
//!
//! Shared libraries used by both the visualizer client and the replay server.
//!
//! Design goals:
//! - Decoding is total: malformed server data degrades to warnings.
//! - Layout is pure and deterministic, so poses can be compared for change.
//! - Traits at the seams (transport, scene backend, counters display).
//! - No `unsafe`.

pub mod codec;
pub mod config;
pub mod error;
pub mod grid;
pub mod layout;
pub mod math;
pub mod net;
pub mod resources;
pub mod scene;
pub mod snapshot;
