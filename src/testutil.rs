//! Test doubles shared by the container and persistence tests.

use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
    rc::Rc,
};

use anyhow::bail;
use glam::{DVec3, IVec3};
use serde_json::Value;

use crate::{
    gl::GlState,
    host::{Clock, Profiler, ViewEntity},
    overlay::{OverlayHandle, OverlayRenderer},
};

#[derive(Default)]
pub(crate) struct TestEntity {
    pub pos: DVec3,
    pub prev_pos: DVec3,
}

impl TestEntity {
    pub fn at(pos: DVec3) -> Self {
        Self {
            pos,
            prev_pos: pos,
        }
    }
}

impl ViewEntity for TestEntity {
    fn pos(&self) -> DVec3 {
        self.pos
    }

    fn prev_pos(&self) -> DVec3 {
        self.prev_pos
    }
}

/// Scriptable overlay that records every lifecycle call.
#[derive(Default)]
pub(crate) struct TestOverlay {
    pub enabled: bool,
    pub renderable: bool,
    pub needs_update: bool,
    pub fail_update: bool,
    pub fail_alloc: bool,
    pub fail_import: bool,

    pub update_calls: usize,
    pub draw_calls: usize,
    pub alloc_calls: usize,
    pub delete_calls: usize,

    pub last_update_pos: Option<IVec3>,
    pub update_position: DVec3,

    pub save_id: String,
    pub file: Option<PathBuf>,
    pub dim_file: Option<PathBuf>,
    pub value: Value,
}

impl TestOverlay {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            renderable: true,
            ..Self::default()
        }
    }

    pub fn saved(id: &str, file: PathBuf, value: Value) -> Self {
        Self {
            enabled: true,
            renderable: true,
            save_id: id.to_owned(),
            file: Some(file),
            value,
            ..Self::default()
        }
    }

    pub fn into_handle(self) -> (Rc<RefCell<TestOverlay>>, OverlayHandle) {
        let rc = Rc::new(RefCell::new(self));
        let handle: OverlayHandle = rc.clone();
        (rc, handle)
    }
}

impl OverlayRenderer for TestOverlay {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn should_render(&self) -> bool {
        self.renderable
    }

    fn needs_update(&self, _entity: &dyn ViewEntity) -> bool {
        self.needs_update
    }

    fn update(&mut self, _camera_pos: DVec3, _entity: &dyn ViewEntity) -> anyhow::Result<()> {
        self.update_calls += 1;
        if self.fail_update {
            bail!("update failed");
        }
        Ok(())
    }

    fn draw(&mut self, _gl: &mut dyn GlState) -> anyhow::Result<()> {
        self.draw_calls += 1;
        Ok(())
    }

    fn allocate_gl_resources(&mut self) -> anyhow::Result<()> {
        self.alloc_calls += 1;
        if self.fail_alloc {
            bail!("allocation failed");
        }
        Ok(())
    }

    fn delete_gl_resources(&mut self) {
        self.delete_calls += 1;
    }

    fn set_last_update_pos(&mut self, pos: IVec3) {
        self.last_update_pos = Some(pos);
    }

    fn set_update_position(&mut self, pos: DVec3) {
        self.update_position = pos;
    }

    fn update_position(&self) -> DVec3 {
        self.update_position
    }

    fn save_id(&self) -> &str {
        &self.save_id
    }

    fn save_file(&self, is_dimension_change_only: bool) -> Option<PathBuf> {
        if is_dimension_change_only {
            self.dim_file.clone()
        } else {
            self.file.clone()
        }
    }

    fn to_json(&self) -> Value {
        self.value.clone()
    }

    fn from_json(&mut self, value: &Value) -> anyhow::Result<()> {
        if self.fail_import {
            bail!("import failed");
        }
        self.value = value.clone();
        Ok(())
    }

    fn type_name(&self) -> &'static str {
        "TestOverlay"
    }
}

/// [`GlState`] double that logs every state change in call order.
#[derive(Default)]
pub(crate) struct RecordingGl {
    pub vbo: bool,
    pub calls: Vec<String>,
    pub translations: Vec<DVec3>,
}

impl RecordingGl {
    fn log(&mut self, call: impl Into<String>) {
        self.calls.push(call.into());
    }
}

impl GlState for RecordingGl {
    fn use_vbo(&self) -> bool {
        self.vbo
    }

    fn push_matrix(&mut self) {
        self.log("push_matrix");
    }

    fn pop_matrix(&mut self) {
        self.log("pop_matrix");
    }

    fn translate(&mut self, offset: DVec3) {
        self.translations.push(offset);
        self.log("translate");
    }

    fn color(&mut self, _r: f32, _g: f32, _b: f32, _a: f32) {
        self.log("color");
    }

    fn alpha_cutoff(&mut self, _cutoff: f32) {
        self.log("alpha_cutoff");
    }

    fn enable_texture(&mut self) {
        self.log("enable_texture");
    }

    fn disable_texture(&mut self) {
        self.log("disable_texture");
    }

    fn enable_cull(&mut self) {
        self.log("enable_cull");
    }

    fn disable_cull(&mut self) {
        self.log("disable_cull");
    }

    fn disable_lighting(&mut self) {
        self.log("disable_lighting");
    }

    fn enable_depth(&mut self) {
        self.log("enable_depth");
    }

    fn depth_mask(&mut self, write: bool) {
        self.log(format!("depth_mask:{write}"));
    }

    fn polygon_offset(&mut self, factor: f32, units: f32) {
        self.log(format!("polygon_offset:{factor}:{units}"));
    }

    fn enable_polygon_offset(&mut self) {
        self.log("enable_polygon_offset");
    }

    fn disable_polygon_offset(&mut self) {
        self.log("disable_polygon_offset");
    }

    fn enable_blend(&mut self) {
        self.log("enable_blend");
    }

    fn disable_blend(&mut self) {
        self.log("disable_blend");
    }

    fn enable_client_arrays(&mut self) {
        self.log("enable_client_arrays");
    }

    fn disable_client_arrays(&mut self) {
        self.log("disable_client_arrays");
    }

    fn bind_array_buffer(&mut self, buffer: u32) {
        self.log(format!("bind_array_buffer:{buffer}"));
    }
}

/// Manually advanced [`Clock`]; clones share the same time.
#[derive(Clone, Default)]
pub(crate) struct ManualClock(Rc<Cell<u64>>);

impl ManualClock {
    pub fn set(&self, nanos: u64) {
        self.0.set(nanos);
    }
}

impl Clock for ManualClock {
    fn now_nanos(&self) -> u64 {
        self.0.get()
    }
}

/// Profiler that tracks marker nesting.
#[derive(Default)]
pub(crate) struct CountingProfiler {
    pub depth: isize,
    pub pushes: usize,
    pub underflow: bool,
}

impl Profiler for CountingProfiler {
    fn push(&mut self, _label: &'static str) {
        self.depth += 1;
        self.pushes += 1;
    }

    fn pop(&mut self) {
        self.depth -= 1;
        if self.depth < 0 {
            self.underflow = true;
        }
    }
}
