//! Batched rendering and grouped JSON persistence for world-space overlays
//! drawn over a voxel game view.
//!
//! The host registers any number of [`OverlayRenderer`] implementations
//! with one [`OverlayContainer`] and calls [`OverlayContainer::render`]
//! once per frame. The container gates rendering until the camera has
//! settled after a (re)connect, refreshes each overlay's spatial data when
//! it asks for it, and draws all visible overlays in a single batch with
//! camera-relative translation. Overlay state is saved and restored as one
//! JSON document per destination file, with a backup taken before every
//! write.

pub mod backup;
pub mod config;
pub mod container;
pub mod gl;
pub mod host;
pub mod overlay;
pub mod persist;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::OverlayConfig;
pub use container::{FrameContext, OverlayContainer};
pub use gl::GlState;
pub use host::{Clock, MonotonicClock, NoopProfiler, Profiler, ViewEntity};
pub use overlay::{OverlayHandle, OverlayRenderer};
pub use persist::PersistError;
