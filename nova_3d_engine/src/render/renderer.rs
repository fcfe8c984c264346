/// Frame driver.
///
/// `render()` runs one frame against a graphics device:
///
/// ```text
/// disposal events ──► ResourceCache::process_events
/// Scene::update_matrix_world            (world matrices current)
/// Scene::camera_view                    (camera snapshot + frustum)
/// RenderListBuilder::build              (traversal, culling, sort)
/// CommandList: begin, viewport, Dispatcher::dispatch, end
/// GraphicsDevice::submit
/// ```
///
/// Per-draw failures are skipped and counted; only failures of the frame
/// itself (bad camera, command list errors, submit) are returned.
///
/// Each renderer subscribes to the resource manager's disposal events on
/// its first frame, so several renderers (one GPU cache each) can share a
/// manager. Call `unsubscribe` before dropping a renderer whose manager
/// lives on.

use crate::error::{Error, Result};
use crate::engine_debug;
use crate::graphics_device::{GraphicsDevice, Viewport};
use crate::resource::{EventSubscription, RenderBucket, ResourceManager};
use crate::scene::{NodeKey, Scene};
use super::config::RenderConfig;
use super::dispatcher::{DispatchContext, DispatchStats, Dispatcher};
use super::render_list_builder::{BuildStats, RenderListBuilder};
use super::resource_cache::{CacheStats, MemoryInfo, ResourceCache};

/// Summary of one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// 1 for the first frame
    pub frame: u64,
    pub opaque: usize,
    pub transmissive: usize,
    pub transparent: usize,
    pub build: BuildStats,
    pub dispatch: DispatchStats,
    /// Cache activity during this frame only
    pub cache: CacheStats,
}

impl FrameInfo {
    pub fn draw_calls(&self) -> u32 {
        self.dispatch.draw_calls
    }
}

/// Renders scenes through a graphics device
pub struct Renderer {
    device: Box<dyn GraphicsDevice>,
    config: RenderConfig,
    cache: ResourceCache,
    builder: RenderListBuilder,
    dispatcher: Dispatcher,
    events: Option<EventSubscription>,
    frame_count: u64,
}

impl Renderer {
    pub fn new(device: Box<dyn GraphicsDevice>, config: RenderConfig) -> Self {
        Self {
            device,
            config,
            cache: ResourceCache::new(),
            builder: RenderListBuilder::new(),
            dispatcher: Dispatcher::new(),
            events: None,
            frame_count: 0,
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RenderConfig {
        &mut self.config
    }

    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Access the render list builder (custom cullers)
    pub fn builder_mut(&mut self) -> &mut RenderListBuilder {
        &mut self.builder
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn memory(&self) -> MemoryInfo {
        self.cache.memory()
    }

    /// Stop receiving disposal events from `resources`
    pub fn unsubscribe(&mut self, resources: &mut ResourceManager) -> Result<()> {
        match self.events.take() {
            Some(subscription) => resources.unsubscribe(subscription),
            None => Ok(()),
        }
    }

    /// Render one frame of `scene` seen from `camera`
    ///
    /// # Errors
    ///
    /// `InvalidHandle` if `camera` is not in the scene, `ContractViolation`
    /// if it is not a camera, `DegenerateMatrix` if its world matrix cannot
    /// be inverted, and any error the device returns while recording or
    /// submitting.
    pub fn render(&mut self, scene: &mut Scene, resources: &mut ResourceManager, camera: NodeKey) -> Result<FrameInfo> {
        let cache_before = self.cache.stats();

        let subscription = match self.events {
            Some(subscription) if resources.is_subscribed(subscription) => subscription,
            _ => {
                let subscription = resources.subscribe();
                self.events = Some(subscription);
                subscription
            }
        };
        let events = resources.drain_events(subscription)?;
        self.cache.process_events(&events);

        if !scene.contains(camera) {
            return Err(Error::InvalidHandle(format!("camera {:?} is not in the scene", camera)));
        }
        scene.update_matrix_world(false);
        // a detached camera is not reached by the pass above
        if !scene.is_ancestor(scene.root(), camera) {
            scene.update_world_matrix(camera, true, false)?;
        }
        let view = scene.camera_view(camera)?;

        self.builder.build(scene, resources, &view, &self.config);
        let list = self.builder.list();
        let lights = *self.builder.lights();

        let viewport: Viewport = self.config.viewport.unwrap_or_else(|| self.device.default_viewport());
        let mut cmd = self.device.create_command_list()?;
        cmd.begin()?;
        cmd.set_viewport(viewport)?;
        self.dispatcher.begin_frame();
        let dispatch = {
            let mut ctx = DispatchContext {
                device: self.device.as_mut(),
                cache: &mut self.cache,
                resources,
                view: &view,
                lights: &lights,
                config: &self.config,
            };
            self.dispatcher.dispatch(list, &mut ctx, cmd.as_mut())
        };
        cmd.end()?;
        self.device.submit(cmd.as_ref())?;

        self.frame_count += 1;
        let info = FrameInfo {
            frame: self.frame_count,
            opaque: list.bucket(RenderBucket::Opaque).len(),
            transmissive: list.bucket(RenderBucket::Transmissive).len(),
            transparent: list.bucket(RenderBucket::Transparent).len(),
            build: self.builder.stats(),
            dispatch,
            cache: self.cache.stats().since(&cache_before),
        };
        engine_debug!("nova3d::Renderer",
            "Frame {}: {} draws, {} skipped, {} culled",
            info.frame, dispatch.draw_calls, dispatch.skipped, info.build.culled);
        Ok(info)
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
