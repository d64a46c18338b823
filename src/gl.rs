use glam::DVec3;

/// The slice of the host's GPU state machine that the batched overlay draw
/// pass touches. Implemented by the host against its own graphics API.
///
/// All calls are issued from the thread that owns the GPU context, and the
/// draw pass always unwinds the state it set up, also when an overlay's
/// draw hook fails.
pub trait GlState {
    /// Whether vertex buffer objects are currently in use. Overlays build
    /// different buffer layouts per mode, so the container watches this
    /// flag for changes across frames and recycles all resources when it
    /// flips.
    fn use_vbo(&self) -> bool;

    fn push_matrix(&mut self);
    fn pop_matrix(&mut self);
    fn translate(&mut self, offset: DVec3);

    fn color(&mut self, r: f32, g: f32, b: f32, a: f32);

    /// Discard fragments below the given alpha.
    fn alpha_cutoff(&mut self, cutoff: f32);

    fn enable_texture(&mut self);
    fn disable_texture(&mut self);

    fn enable_cull(&mut self);
    fn disable_cull(&mut self);

    fn disable_lighting(&mut self);

    fn enable_depth(&mut self);

    /// Toggle depth buffer writes.
    fn depth_mask(&mut self, write: bool);

    fn polygon_offset(&mut self, factor: f32, units: f32);
    fn enable_polygon_offset(&mut self);
    fn disable_polygon_offset(&mut self);

    /// Standard alpha blending over the world pass output.
    fn enable_blend(&mut self);
    fn disable_blend(&mut self);

    /// Vertex and color array client state, used only in VBO mode.
    fn enable_client_arrays(&mut self);
    fn disable_client_arrays(&mut self);

    /// Bind the array buffer; 0 unbinds.
    fn bind_array_buffer(&mut self, buffer: u32);
}
