//! Renderer frame orchestration.
//!
//! This module provides the [`Renderer`] struct that owns the Vulkan device
//! stack and drives the per-frame lifecycle: acquire an image, record into
//! its command buffer, submit, present, and rebuild the swapchain when the
//! surface changes.
//!
//! # Frame loop
//!
//! ```no_run
//! # use glimmer_platform::Window;
//! # use glimmer_renderer::Renderer;
//! # fn tick(renderer: &mut Renderer, window: &mut Window) -> Result<(), glimmer_rhi::RhiError> {
//! if let Some(cmd) = renderer.begin_frame(window)? {
//!     renderer.begin_render_pass(cmd);
//!     // record draw commands
//!     renderer.end_render_pass(cmd);
//!     renderer.end_frame(window)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A `None` from `begin_frame` means the tick was skipped (minimized window
//! or an out-of-date swapchain); the caller simply tries again next tick.

use std::mem::ManuallyDrop;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info};

use glimmer_platform::{Surface, Window};
use glimmer_rhi::device::Device;
use glimmer_rhi::instance::Instance;
use glimmer_rhi::physical_device::select_physical_device;
use glimmer_rhi::swapchain::Swapchain;
use glimmer_rhi::{RhiError, RhiResult};

use crate::frame::{self, FrameLifecycle, TickPlan};

/// Owns the Vulkan stack and the frame lifecycle.
///
/// # Resource Destruction Order
///
/// Vulkan resources must be destroyed in the correct order:
/// 1. Wait for all GPU work to complete
/// 2. Free the per-image command buffers
/// 3. Destroy the swapchain (framebuffers, views, render pass, sync objects)
/// 4. Destroy the surface
/// 5. Destroy the device (when the last `Arc<Device>` drops)
/// 6. Destroy the instance
///
/// ManuallyDrop is used to enforce this order in `Drop`.
pub struct Renderer {
    /// Vulkan instance (destroyed last).
    instance: ManuallyDrop<Instance>,
    /// Window surface (destroyed after the swapchain, before the instance).
    surface: ManuallyDrop<Surface>,
    /// Logical device, shared with every GPU resource.
    device: Arc<Device>,
    /// Swapchain with its render pass, framebuffers, and sync objects.
    swapchain: ManuallyDrop<Swapchain>,
    /// One primary command buffer per swapchain image, indexed by image index.
    command_buffers: Vec<vk::CommandBuffer>,
    /// Frame state machine.
    lifecycle: FrameLifecycle,
}

impl Renderer {
    /// Creates a renderer for the given window.
    ///
    /// Builds the instance, surface, device, swapchain, and per-image
    /// command buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan resource creation fails or no
    /// suitable GPU is found.
    pub fn new(window: &Window) -> RhiResult<Self> {
        let extent = window.extent();
        info!(
            "Initializing Vulkan renderer ({}x{})",
            extent.width, extent.height
        );

        // Validation layers in debug builds only
        let enable_validation = cfg!(debug_assertions);

        let surface_extensions = window
            .required_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(enable_validation, &surface_extensions)?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), extent, None)?;

        let command_buffers = Self::allocate_command_buffers(&device, swapchain.image_count())?;

        info!(
            "Renderer initialized: {} swapchain images, format {:?}",
            swapchain.image_count(),
            swapchain.format()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            surface: ManuallyDrop::new(surface),
            device,
            swapchain: ManuallyDrop::new(swapchain),
            command_buffers,
            lifecycle: FrameLifecycle::new(),
        })
    }

    /// Allocates one primary command buffer per swapchain image from the
    /// device's command pool.
    fn allocate_command_buffers(
        device: &Arc<Device>,
        count: usize,
    ) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(device.command_pool())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count as u32);

        let command_buffers = unsafe { device.handle().allocate_command_buffers(&alloc_info)? };

        debug!("Allocated {} command buffers", command_buffers.len());
        Ok(command_buffers)
    }

    fn free_command_buffers(&mut self) {
        if self.command_buffers.is_empty() {
            return;
        }
        unsafe {
            self.device
                .handle()
                .free_command_buffers(self.device.command_pool(), &self.command_buffers);
        }
        self.command_buffers.clear();
    }

    /// Begins a frame.
    ///
    /// Returns `Ok(None)` when the tick should be skipped: the window extent
    /// is degenerate (minimized) or the swapchain was out of date and has
    /// been rebuilt. Otherwise the acquired image's command buffer is put
    /// into the recording state and returned.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already in progress.
    ///
    /// # Errors
    ///
    /// Returns an error if acquisition, rebuilding, or command buffer
    /// recording fails.
    pub fn begin_frame(&mut self, window: &mut Window) -> RhiResult<Option<vk::CommandBuffer>> {
        assert!(
            !self.lifecycle.is_frame_in_progress(),
            "begin_frame called while a frame is already in progress"
        );

        // A zero-area window cannot back a swapchain; poll until it grows
        if !frame::extent_renderable(window.extent()) {
            debug!("Degenerate window extent, skipping frame");
            return Ok(None);
        }

        let acquire = self.swapchain.acquire_next_image()?;
        let image_index = match frame::plan_acquired_frame(acquire) {
            TickPlan::RebuildAndSkip => {
                self.recreate_swapchain(window)?;
                return Ok(None);
            }
            TickPlan::Render {
                image_index,
                suboptimal,
            } => {
                if suboptimal {
                    // Finish the frame with the acquired image; present
                    // reports the condition again and triggers the rebuild
                    debug!("Acquired suboptimal image {}", image_index);
                }
                image_index
            }
        };

        self.lifecycle.start_frame(image_index);

        let command_buffer = self.command_buffers[image_index as usize];
        let begin_info = vk::CommandBufferBeginInfo::default();
        unsafe {
            self.device
                .handle()
                .begin_command_buffer(command_buffer, &begin_info)?;
        }

        Ok(Some(command_buffer))
    }

    /// Ends the frame: ends the command buffer, submits, and presents.
    ///
    /// Rebuilds the swapchain if presentation reported out-of-date or
    /// suboptimal, or if the window's resize flag is set.
    ///
    /// # Panics
    ///
    /// Panics if no frame is in progress or a render pass is still open.
    ///
    /// # Errors
    ///
    /// Returns an error if submission, presentation, or rebuilding fails.
    pub fn end_frame(&mut self, window: &mut Window) -> RhiResult<()> {
        assert!(
            self.lifecycle.is_frame_in_progress(),
            "end_frame called with no frame in progress"
        );

        let image_index = self.lifecycle.image_index();
        let command_buffer = self.command_buffers[image_index as usize];

        unsafe {
            self.device.handle().end_command_buffer(command_buffer)?;
        }

        let present_result = self.swapchain.submit_and_present(command_buffer, image_index)?;

        if frame::needs_rebuild_after_present(present_result, window.was_resized()) {
            self.recreate_swapchain(window)?;
        }

        self.lifecycle.finish_frame();
        Ok(())
    }

    /// Begins the swapchain render pass on the current frame's command buffer.
    ///
    /// Clears color to near-black and depth to 1.0, and records a full-extent
    /// viewport and scissor (both dynamic states).
    ///
    /// # Panics
    ///
    /// Panics if no frame is in progress or `command_buffer` is not the
    /// current frame's buffer.
    pub fn begin_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        assert!(
            self.lifecycle.is_frame_in_progress(),
            "begin_render_pass called with no frame in progress"
        );
        assert_eq!(
            command_buffer,
            self.command_buffers[self.lifecycle.image_index() as usize],
            "begin_render_pass must target the current frame's command buffer"
        );

        self.lifecycle.enter_render_pass();

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.01, 0.01, 0.01, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let extent = self.swapchain.extent();
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.swapchain.render_pass())
            .framebuffer(
                self.swapchain
                    .framebuffer(self.lifecycle.image_index() as usize),
            )
            .render_area(render_area)
            .clear_values(&clear_values);

        unsafe {
            self.device.handle().cmd_begin_render_pass(
                command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );

            let viewport = vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: extent.width as f32,
                height: extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            };
            self.device
                .handle()
                .cmd_set_viewport(command_buffer, 0, &[viewport]);
            self.device
                .handle()
                .cmd_set_scissor(command_buffer, 0, &[render_area]);
        }
    }

    /// Ends the swapchain render pass.
    ///
    /// # Panics
    ///
    /// Panics if no render pass is open or `command_buffer` is not the
    /// current frame's buffer.
    pub fn end_render_pass(&mut self, command_buffer: vk::CommandBuffer) {
        assert_eq!(
            command_buffer,
            self.command_buffers[self.lifecycle.image_index() as usize],
            "end_render_pass must target the current frame's command buffer"
        );

        self.lifecycle.exit_render_pass();

        unsafe {
            self.device.handle().cmd_end_render_pass(command_buffer);
        }
    }

    /// Rebuilds the swapchain for the current window extent.
    ///
    /// If the extent is degenerate the rebuild is skipped and the window's
    /// resize flag stays set, so the next frame retries. On success the
    /// resize flag is cleared exactly once, and the per-image command
    /// buffers are reallocated if the image count changed.
    ///
    /// # Panics
    ///
    /// Panics if the replacement swapchain's color or depth format differs
    /// from the old one. Pipelines are built against those formats, so a
    /// change here cannot be recovered from.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting for the device or creating the
    /// replacement swapchain fails.
    pub fn recreate_swapchain(&mut self, window: &mut Window) -> RhiResult<()> {
        let extent = window.extent();
        let plan = frame::plan_rebuild(extent);
        if !plan.run {
            debug!("Degenerate extent, deferring swapchain rebuild");
            return Ok(());
        }

        info!(
            "Recreating swapchain for {}x{}",
            extent.width, extent.height
        );

        self.device.wait_idle()?;

        let new_swapchain = Swapchain::new(
            &self.instance,
            self.device.clone(),
            self.surface.handle(),
            extent,
            Some(&self.swapchain),
        )?;

        frame::ensure_formats_stable(new_swapchain.compare_formats(&self.swapchain));

        let old_image_count = self.swapchain.image_count();
        let old_swapchain = std::mem::replace(&mut *self.swapchain, new_swapchain);
        drop(old_swapchain);

        if self.swapchain.image_count() != old_image_count {
            debug!(
                "Swapchain image count changed {} -> {}, reallocating command buffers",
                old_image_count,
                self.swapchain.image_count()
            );
            self.free_command_buffers();
            self.command_buffers =
                Self::allocate_command_buffers(&self.device, self.swapchain.image_count())?;
        }

        if plan.clear_resize_flag {
            window.reset_resized();
        }
        Ok(())
    }

    /// Returns the logical device.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Returns the swapchain's render pass, for building pipelines against.
    #[inline]
    pub fn swapchain_render_pass(&self) -> vk::RenderPass {
        self.swapchain.render_pass()
    }

    /// Returns the swapchain extent's aspect ratio.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent_aspect_ratio()
    }

    /// Returns the current frame slot index.
    ///
    /// # Panics
    ///
    /// Panics if no frame is in progress.
    #[inline]
    pub fn frame_index(&self) -> usize {
        assert!(
            self.lifecycle.is_frame_in_progress(),
            "frame_index called with no frame in progress"
        );
        self.lifecycle.frame_index()
    }

    /// Returns true while a frame is being recorded.
    #[inline]
    pub fn is_frame_in_progress(&self) -> bool {
        self.lifecycle.is_frame_in_progress()
    }

    /// Returns the command buffer of the frame in progress.
    ///
    /// # Panics
    ///
    /// Panics if no frame is in progress.
    #[inline]
    pub fn current_command_buffer(&self) -> vk::CommandBuffer {
        assert!(
            self.lifecycle.is_frame_in_progress(),
            "current_command_buffer called with no frame in progress"
        );
        self.command_buffers[self.lifecycle.image_index() as usize]
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during renderer drop: {e}");
        }

        self.free_command_buffers();

        unsafe {
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
