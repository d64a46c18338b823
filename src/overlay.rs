use std::{cell::RefCell, path::PathBuf, rc::Rc};

use glam::{DVec3, IVec3};

use crate::{gl::GlState, host::ViewEntity};

/// Shared handle to a registered overlay.
///
/// The container and the feature that owns the overlay both keep handles;
/// removal from the container is by handle identity. Everything runs on the
/// render thread, hence `Rc` over `Arc`.
pub type OverlayHandle = Rc<RefCell<dyn OverlayRenderer>>;

/// Capability contract for a world-space overlay.
///
/// An overlay authors its geometry near its own anchor position and lets
/// the container place it relative to the camera, so coordinates stay small
/// regardless of where in the world the overlay sits. New overlay kinds are
/// added by implementing this trait; the container never needs to know the
/// concrete type.
pub trait OverlayRenderer {
    /// Whether this overlay participates in rendering at all. Enablement
    /// changes made outside the add/remove path must be followed by a call
    /// to the container's `set_enabled_renderers_need_update`.
    fn is_enabled(&self) -> bool;

    /// Per-frame eligibility, checked in both the update and draw pass.
    fn should_render(&self) -> bool;

    /// Whether the spatial data needs recomputing, typically when the
    /// entity crossed a block boundary. Independent of [`should_render`]:
    /// an overlay may draw every frame while only rebuilding geometry
    /// occasionally.
    ///
    /// [`should_render`]: Self::should_render
    fn needs_update(&self, entity: &dyn ViewEntity) -> bool;

    /// Rebuild geometry around `camera_pos`.
    fn update(&mut self, camera_pos: DVec3, entity: &dyn ViewEntity) -> anyhow::Result<()>;

    /// Draw with the shared batch state already configured and the matrix
    /// translated to this overlay's anchor.
    fn draw(&mut self, gl: &mut dyn GlState) -> anyhow::Result<()>;

    fn allocate_gl_resources(&mut self) -> anyhow::Result<()>;
    fn delete_gl_resources(&mut self);

    /// Block position of the entity at the time of the last spatial update.
    fn set_last_update_pos(&mut self, pos: IVec3);

    /// Anchor used for camera-relative translation in the draw pass.
    fn set_update_position(&mut self, pos: DVec3);
    fn update_position(&self) -> DVec3;

    /// Identifier within the save file. Blank excludes this overlay from
    /// persistence.
    fn save_id(&self) -> &str;

    /// Destination file, or `None` to exclude this overlay from
    /// persistence. The destination may differ when only the dimension
    /// changed, and may be shared with unrelated overlay types.
    fn save_file(&self, is_dimension_change_only: bool) -> Option<PathBuf>;

    fn to_json(&self) -> serde_json::Value;
    fn from_json(&mut self, value: &serde_json::Value) -> anyhow::Result<()>;

    /// Label for profiling markers around this overlay's update and draw.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
