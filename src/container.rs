use std::rc::Rc;

use anyhow::Result;
use glam::DVec3;

use crate::{
    config::OverlayConfig,
    gl::GlState,
    host::{Clock, MonotonicClock, Profiler, ViewEntity},
    overlay::OverlayHandle,
};

/// Host collaborators for one rendered frame.
pub struct FrameContext<'a> {
    /// Camera-bearing entity, if one exists yet.
    pub entity: Option<&'a dyn ViewEntity>,
    pub gl: &'a mut dyn GlState,
    pub profiler: &'a mut dyn Profiler,
}

/// Owns the full set of world-space overlays and runs them through one
/// shared pipeline: a settle gate after (re)connect, a spatial update pass,
/// and a single batched draw pass with camera-relative translation.
///
/// One container is constructed per session and lives until world leave.
/// Every method must be called from the render thread, and overlays must
/// not add or remove renderers from inside their own hooks; doing so ends
/// in a `RefCell` borrow panic, never in a corrupted registry.
pub struct OverlayContainer {
    pub(crate) renderers: Vec<OverlayHandle>,
    enabled_renderers: Vec<OverlayHandle>,
    resources_allocated: bool,
    use_vbo: bool,
    count_active: usize,

    can_render: bool,
    enabled_need_update: bool,
    login_time: u64,

    clock: Box<dyn Clock>,
    pub(crate) config: OverlayConfig,
}

impl OverlayContainer {
    pub fn new(config: OverlayConfig) -> Self {
        Self::with_clock(config, Box::new(MonotonicClock::new()))
    }

    /// Construct with a caller-supplied time source.
    pub fn with_clock(config: OverlayConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            renderers: Vec::new(),
            enabled_renderers: Vec::new(),
            resources_allocated: false,
            use_vbo: false,
            count_active: 0,
            can_render: false,
            enabled_need_update: false,
            login_time: clock.now_nanos(),
            clock,
            config,
        }
    }

    /// Register an overlay at the end of the draw order. If GPU resources
    /// are live, the overlay gets a fresh delete/allocate cycle so it never
    /// renders with stale or missing buffers, regardless of where it came
    /// from.
    pub fn add_renderer(&mut self, renderer: OverlayHandle) -> Result<()> {
        if self.resources_allocated {
            let mut r = renderer.borrow_mut();
            r.delete_gl_resources();
            r.allocate_gl_resources()?;
        }

        self.renderers.push(renderer);
        self.set_enabled_renderers_need_update();
        Ok(())
    }

    /// Remove an overlay by handle identity, freeing its GPU resources if
    /// the container currently holds any.
    pub fn remove_renderer(&mut self, renderer: &OverlayHandle) {
        self.renderers.retain(|r| !Rc::ptr_eq(r, renderer));
        self.set_enabled_renderers_need_update();

        if self.resources_allocated {
            renderer.borrow_mut().delete_gl_resources();
        }
    }

    /// Mark the enabled cache stale. Called by overlays whose enablement
    /// changed outside the add/remove path; the cache is rebuilt once, at
    /// the start of the next update pass.
    pub fn set_enabled_renderers_need_update(&mut self) {
        self.enabled_need_update = true;
    }

    fn refresh_enabled_renderers(&mut self) {
        self.enabled_renderers.clear();
        self.enabled_renderers.extend(
            self.renderers
                .iter()
                .filter(|r| r.borrow().is_enabled())
                .cloned(),
        );
        self.enabled_need_update = false;
    }

    /// Re-arm the settle gate. Called on world or dimension change.
    pub fn reset_render_timeout(&mut self) {
        self.can_render = false;
        self.login_time = self.clock.now_nanos();
    }

    fn camera_pos(entity: &dyn ViewEntity, tick_delta: f32) -> DVec3 {
        let prev = entity.prev_pos();
        prev + (entity.pos() - prev) * f64::from(tick_delta)
    }

    fn settle_gate_open(&self, entity: &dyn ViewEntity) -> bool {
        let waited = self.clock.now_nanos().saturating_sub(self.login_time);
        waited >= self.config.settle_timeout_nanos() || entity.pos() != self.config.settle_sentinel
    }

    /// Per-frame entry point: gate, then update pass, then draw pass.
    ///
    /// A missing camera entity or a closed settle gate skips the frame
    /// without error. Overlay faults propagate and abort the rest of the
    /// pass; the profiler markers and GPU state scopes are unwound either
    /// way.
    pub fn render(&mut self, tick_delta: f32, ctx: &mut FrameContext) -> Result<()> {
        let Some(entity) = ctx.entity else {
            return Ok(());
        };

        if !self.can_render {
            // Overlays would compute geometry against the placeholder
            // camera position the world starts out with.
            if !self.settle_gate_open(entity) {
                return Ok(());
            }

            self.can_render = true;
        }

        let camera_pos = Self::camera_pos(entity, tick_delta);

        ctx.profiler.push("update");
        let res = self.update(camera_pos, entity, ctx.gl, ctx.profiler);
        ctx.profiler.pop();
        res?;

        ctx.profiler.push("draw");
        let res = self.draw(camera_pos, ctx.gl, ctx.profiler);
        ctx.profiler.pop();
        res
    }

    fn update(
        &mut self,
        camera_pos: DVec3,
        entity: &dyn ViewEntity,
        gl: &dyn GlState,
        profiler: &mut dyn Profiler,
    ) -> Result<()> {
        if self.enabled_need_update {
            self.refresh_enabled_renderers();
        }

        self.check_video_settings(gl)?;
        self.count_active = 0;

        for renderer in &self.enabled_renderers {
            profiler.push(renderer.borrow().type_name());
            let res = update_one(renderer, camera_pos, entity);
            profiler.pop();

            if res? {
                self.count_active += 1;
            }
        }

        Ok(())
    }

    fn draw(&mut self, camera_pos: DVec3, gl: &mut dyn GlState, profiler: &mut dyn Profiler) -> Result<()> {
        // Nothing visible means no GPU state is touched at all.
        if !self.resources_allocated || self.count_active == 0 {
            return Ok(());
        }

        gl.push_matrix();

        gl.disable_texture();
        gl.alpha_cutoff(0.01);
        gl.disable_cull();
        gl.disable_lighting();
        gl.depth_mask(false);
        // Pull the overlays slightly towards the camera so they do not
        // z-fight the world geometry they trace.
        gl.polygon_offset(-3.0, -3.0);
        gl.enable_polygon_offset();
        gl.enable_blend();
        gl.color(1.0, 1.0, 1.0, 1.0);

        if self.use_vbo {
            gl.enable_client_arrays();
        }

        let mut result = Ok(());

        for renderer in &self.enabled_renderers {
            profiler.push(renderer.borrow().type_name());
            let res = draw_one(renderer, camera_pos, gl);
            profiler.pop();

            if res.is_err() {
                result = res;
                break;
            }
        }

        if self.use_vbo {
            gl.bind_array_buffer(0);
            gl.disable_client_arrays();
        }

        gl.color(1.0, 1.0, 1.0, 1.0);
        gl.polygon_offset(0.0, 0.0);
        gl.disable_polygon_offset();
        gl.disable_blend();
        gl.enable_depth();
        gl.enable_cull();
        gl.depth_mask(true);
        gl.enable_texture();

        gl.pop_matrix();

        result
    }

    fn check_video_settings(&mut self, gl: &dyn GlState) -> Result<()> {
        let vbo_last = self.use_vbo;
        self.use_vbo = gl.use_vbo();

        // A mode flip invalidates every overlay's buffer layout, so the
        // whole set is recycled, not just the enabled subset.
        if vbo_last != self.use_vbo || !self.resources_allocated {
            self.delete_gl_resources();
            self.allocate_gl_resources()?;
        }

        Ok(())
    }

    fn allocate_gl_resources(&mut self) -> Result<()> {
        if self.resources_allocated {
            return Ok(());
        }

        for renderer in &self.renderers {
            let mut r = renderer.borrow_mut();
            r.delete_gl_resources();
            r.allocate_gl_resources()?;
        }

        self.resources_allocated = true;
        Ok(())
    }

    fn delete_gl_resources(&mut self) {
        if !self.resources_allocated {
            return;
        }

        for renderer in &self.renderers {
            renderer.borrow_mut().delete_gl_resources();
        }

        self.resources_allocated = false;
    }
}

fn update_one(renderer: &OverlayHandle, camera_pos: DVec3, entity: &dyn ViewEntity) -> Result<bool> {
    let mut r = renderer.borrow_mut();

    if !r.should_render() {
        return Ok(false);
    }

    if r.needs_update(entity) {
        r.set_last_update_pos(entity.block_pos());
        r.set_update_position(camera_pos);
        r.update(camera_pos, entity)?;
    }

    Ok(true)
}

fn draw_one(renderer: &OverlayHandle, camera_pos: DVec3, gl: &mut dyn GlState) -> Result<()> {
    let mut r = renderer.borrow_mut();

    if !r.should_render() {
        return Ok(());
    }

    gl.push_matrix();
    gl.translate(r.update_position() - camera_pos);
    let res = r.draw(gl);
    gl.pop_matrix();
    res
}
