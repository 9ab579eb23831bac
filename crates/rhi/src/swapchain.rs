//! Swapchain management.
//!
//! This module handles VkSwapchainKHR creation, image acquisition, submission,
//! and presentation.
//!
//! # Overview
//!
//! The [`Swapchain`] struct provides a safe abstraction over the Vulkan swapchain,
//! including:
//! - Surface capability querying with format and present mode selection
//! - Image view, depth buffer, render pass, and framebuffer management
//! - Frame-in-flight scheduling with per-image fence tracking
//! - Out-of-date and suboptimal reporting as values, not errors
//!
//! Up to [`MAX_FRAMES_IN_FLIGHT`] frames are recorded concurrently. Each frame
//! slot owns an image-available semaphore, a render-finished semaphore, and an
//! in-flight fence. A separate table tracks which slot last rendered to each
//! swapchain image, so an image acquired out of order is never overwritten
//! while the GPU still reads it.
//!
//! # Example
//!
//! ```no_run
//! use glimmer_rhi::swapchain::{AcquireResult, PresentResult, Swapchain};
//! use ash::vk;
//!
//! # fn example(swapchain: &mut Swapchain, command_buffer: vk::CommandBuffer) -> Result<(), glimmer_rhi::RhiError> {
//! match swapchain.acquire_next_image()? {
//!     AcquireResult::OutOfDate => {
//!         // rebuild the swapchain and retry next frame
//!     }
//!     AcquireResult::Ready { image_index, suboptimal } => {
//!         // record command_buffer against image_index, then:
//!         let result = swapchain.submit_and_present(command_buffer, image_index)?;
//!         if suboptimal || result != PresentResult::Ok {
//!             // rebuild the swapchain
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::RhiError;
use crate::image::{DeviceImage, Framebuffer, ImageView, RenderPass};
use crate::instance::Instance;
use crate::sync::{Fence, MAX_FRAMES_IN_FLIGHT, Semaphore};

/// Depth format candidates, in order of preference.
const DEPTH_FORMAT_CANDIDATES: &[vk::Format] = &[
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Result of acquiring a swapchain image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireResult {
    /// The swapchain no longer matches the surface and must be rebuilt
    /// before any image can be acquired.
    OutOfDate,
    /// An image was acquired and can be rendered to.
    Ready {
        /// Index of the acquired swapchain image.
        image_index: u32,
        /// True if the swapchain still works but no longer matches the
        /// surface exactly. The frame should complete, then rebuild.
        suboptimal: bool,
    },
}

/// Result of presenting a swapchain image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentResult {
    /// The image was presented and the swapchain matches the surface.
    Ok,
    /// The swapchain must be rebuilt before the next frame.
    OutOfDate,
    /// The image was presented but the swapchain should be rebuilt.
    Suboptimal,
}

/// Tracks which frame slot last rendered to each swapchain image.
///
/// With more images than frame slots, an image can be re-acquired while a
/// command buffer from an older frame slot still targets it. Before
/// submitting against such an image, the owning slot's fence must be waited
/// on. This table holds slot indices rather than fence handles so the
/// scheduling logic stays independent of Vulkan objects.
#[derive(Clone, Debug)]
pub struct ImagesInFlight {
    owners: Vec<Option<usize>>,
}

impl ImagesInFlight {
    /// Creates a table for `image_count` swapchain images with no owners.
    pub fn new(image_count: usize) -> Self {
        Self {
            owners: vec![None; image_count],
        }
    }

    /// Returns the frame slot that last submitted work against `image_index`,
    /// if any.
    #[inline]
    pub fn owner(&self, image_index: u32) -> Option<usize> {
        self.owners[image_index as usize]
    }

    /// Records that `slot` is now the owner of `image_index`.
    #[inline]
    pub fn record(&mut self, image_index: u32, slot: usize) {
        self.owners[image_index as usize] = Some(slot);
    }

    /// Returns the number of tracked images.
    #[inline]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if no images are tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Swapchain surface support details.
///
/// Contains information about what the surface supports for swapchain creation.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, etc.)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> Result<Self, RhiError> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            if capabilities.max_image_count == 0 {
                "unlimited".to_string()
            } else {
                capabilities.max_image_count.to_string()
            }
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Checks if the swapchain support is adequate for rendering.
    ///
    /// Returns true if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Vulkan swapchain wrapper.
///
/// This struct manages the swapchain and everything a frame renders through:
/// - Swapchain images and their views
/// - One depth image per swapchain image
/// - The render pass and one framebuffer per swapchain image
/// - Per-slot synchronization objects and the per-image fence table
///
/// # Thread Safety
///
/// The swapchain is not thread-safe. Only one thread should interact with
/// it at a time.
pub struct Swapchain {
    /// Reference to the logical device
    device: Arc<Device>,
    /// Swapchain extension loader
    swapchain_loader: ash::khr::swapchain::Device,
    /// Swapchain handle
    swapchain: vk::SwapchainKHR,
    /// Swapchain images (owned by the swapchain)
    images: Vec<vk::Image>,
    /// Image views for the swapchain images
    image_views: Vec<ImageView>,
    /// One depth attachment per swapchain image
    depth_images: Vec<DeviceImage>,
    /// Render pass describing the color + depth frame layout
    render_pass: RenderPass,
    /// One framebuffer per swapchain image
    framebuffers: Vec<Framebuffer>,
    /// Swapchain image format
    format: vk::Format,
    /// Depth attachment format
    depth_format: vk::Format,
    /// Swapchain extent (resolution)
    extent: vk::Extent2D,
    /// Per-slot semaphores signaled when an image is acquired
    image_available: Vec<Semaphore>,
    /// Per-slot semaphores signaled when rendering completes
    render_finished: Vec<Semaphore>,
    /// Per-slot fences signaled when the slot's submission retires
    in_flight: Vec<Fence>,
    /// Which slot last submitted against each image
    images_in_flight: ImagesInFlight,
    /// Current frame slot, cycles through 0..MAX_FRAMES_IN_FLIGHT
    current_frame: usize,
}

impl Swapchain {
    /// Creates a new swapchain.
    ///
    /// When `previous` is given, its handle is passed as the old swapchain so
    /// the driver can carry resources over; the caller drops the previous
    /// swapchain afterwards. The previous swapchain must not have work in
    /// flight (the caller waits for device idle before rebuilding).
    ///
    /// # Arguments
    ///
    /// * `instance` - The Vulkan instance
    /// * `device` - The logical device
    /// * `surface` - The window surface
    /// * `window_extent` - Desired swapchain extent in pixels
    /// * `previous` - The swapchain being replaced, if any
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Surface queries fail
    /// - No suitable format, present mode, or depth format is available
    /// - Swapchain, render pass, framebuffer, or sync object creation fails
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        window_extent: vk::Extent2D,
        previous: Option<&Swapchain>,
    ) -> Result<Self, RhiError> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        // Query swapchain support
        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, &surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Inadequate swapchain support (no formats or present modes)".to_string(),
            ));
        }

        // Select optimal settings
        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(
            &support.capabilities,
            window_extent.width,
            window_extent.height,
        );
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, present mode {:?}, {} images",
            extent.width, extent.height, surface_format.format, present_mode, image_count
        );

        // Handle queue family sharing
        let queue_families = device.queue_families();
        let graphics_family = queue_families.graphics_family.unwrap();
        let present_family = queue_families.present_family.unwrap();
        let queue_family_indices = [graphics_family, present_family];

        let (sharing_mode, queue_family_indices_slice) = if graphics_family != present_family {
            debug!(
                "Using CONCURRENT sharing mode between graphics ({}) and present ({}) queues",
                graphics_family, present_family
            );
            (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
        } else {
            debug!("Using EXCLUSIVE sharing mode (same queue family for graphics and present)");
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let old_swapchain = previous
            .map(|s| s.swapchain)
            .unwrap_or(vk::SwapchainKHR::null());

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        // Get swapchain images
        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
        info!("Swapchain created with {} images", images.len());

        let image_views = create_image_views(&device, &images, surface_format.format)?;

        // Depth resources, one per swapchain image
        let depth_format = device.find_supported_format(
            instance.handle(),
            DEPTH_FORMAT_CANDIDATES,
            vk::ImageTiling::OPTIMAL,
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
        )?;

        let depth_images = images
            .iter()
            .map(|_| {
                DeviceImage::depth_attachment(
                    device.clone(),
                    extent.width,
                    extent.height,
                    depth_format,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let render_pass = create_render_pass(&device, surface_format.format, depth_format)?;

        let framebuffers = create_framebuffers(
            &device,
            render_pass.handle(),
            &image_views,
            &depth_images,
            extent,
        )?;

        // Per-slot sync objects; fences start signaled so the first frame
        // does not block
        let mut image_available = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut render_finished = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut in_flight = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            image_available.push(Semaphore::new(device.clone())?);
            render_finished.push(Semaphore::new(device.clone())?);
            in_flight.push(Fence::new(device.clone(), true)?);
        }

        let images_in_flight = ImagesInFlight::new(images.len());

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            depth_images,
            render_pass,
            framebuffers,
            format: surface_format.format,
            depth_format,
            extent,
            image_available,
            render_finished,
            in_flight,
            images_in_flight,
            current_frame: 0,
        })
    }

    /// Acquires the next swapchain image for rendering.
    ///
    /// Blocks until the current frame slot's fence is signaled, then asks the
    /// swapchain for an image, signaling the slot's image-available semaphore.
    ///
    /// # Errors
    ///
    /// Out-of-date is not an error; it is reported as
    /// [`AcquireResult::OutOfDate`]. Any other Vulkan failure is returned as
    /// an error.
    pub fn acquire_next_image(&mut self) -> Result<AcquireResult, RhiError> {
        // The slot's previous submission must retire before its semaphores
        // and command buffer can be reused
        self.in_flight[self.current_frame].wait(u64::MAX)?;

        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.image_available[self.current_frame].handle(),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((image_index, suboptimal)) => Ok(AcquireResult::Ready {
                image_index,
                suboptimal,
            }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                warn!("Swapchain out of date on acquire");
                Ok(AcquireResult::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submits a recorded command buffer and presents the image.
    ///
    /// The submission waits on this slot's image-available semaphore at the
    /// color attachment output stage, signals the slot's render-finished
    /// semaphore and in-flight fence, and presentation waits on the
    /// render-finished semaphore. If another frame slot still owns
    /// `image_index`, its fence is waited on first.
    ///
    /// Advances to the next frame slot before returning.
    ///
    /// # Errors
    ///
    /// Out-of-date and suboptimal are not errors; they are reported through
    /// [`PresentResult`]. Any other Vulkan failure is returned as an error.
    pub fn submit_and_present(
        &mut self,
        command_buffer: vk::CommandBuffer,
        image_index: u32,
    ) -> Result<PresentResult, RhiError> {
        // If an older slot still targets this image, let it retire first
        if let Some(owner) = self.images_in_flight.owner(image_index) {
            if owner != self.current_frame {
                self.in_flight[owner].wait(u64::MAX)?;
            }
        }
        self.images_in_flight.record(image_index, self.current_frame);

        // Reset only after the wait, so a failed submit never leaves the
        // fence permanently unsignaled for a submission that happened
        self.in_flight[self.current_frame].reset()?;

        let wait_semaphores = [self.image_available[self.current_frame].handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.render_finished[self.current_frame].handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                self.in_flight[self.current_frame].handle(),
            )?;
        }

        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&signal_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let present_result = unsafe {
            self.swapchain_loader
                .queue_present(self.device.present_queue(), &present_info)
        };

        self.current_frame = (self.current_frame + 1) % MAX_FRAMES_IN_FLIGHT;

        match present_result {
            Ok(false) => Ok(PresentResult::Ok),
            Ok(true) => {
                debug!("Swapchain suboptimal on present");
                Ok(PresentResult::Suboptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                warn!("Swapchain out of date on present");
                Ok(PresentResult::OutOfDate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Checks that `other` uses the same color and depth formats.
    ///
    /// Pipelines are built against these formats through the render pass, so
    /// a rebuild that changes either cannot reuse existing pipelines.
    #[inline]
    pub fn compare_formats(&self, other: &Swapchain) -> bool {
        self.format == other.format && self.depth_format == other.depth_format
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the render pass.
    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Returns the framebuffer for the given image index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index].handle()
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the depth attachment format.
    #[inline]
    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    /// Returns the swapchain extent (resolution).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the extent aspect ratio (width / height).
    #[inline]
    pub fn extent_aspect_ratio(&self) -> f32 {
        self.extent.width as f32 / self.extent.height as f32
    }

    /// Returns the number of swapchain images.
    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Returns the current frame slot index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        // Framebuffers and image views must go before the swapchain handle
        // they reference. The render pass, depth images, semaphores, and
        // fences are owning wrappers and drop as fields afterwards.
        self.framebuffers.clear();
        self.image_views.clear();

        unsafe {
            self.swapchain_loader
                .destroy_swapchain(self.swapchain, None);
        }

        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.len()
        );
    }
}

/// Chooses the best surface format from the available formats.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR color space.
/// Falls back to the first available format if the preferred format is not available.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    // Prefer SRGB format for correct gamma handling
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the best present mode from the available modes.
///
/// Prefers MAILBOX (triple buffering, no tearing, low latency).
/// Falls back to FIFO (vsync, guaranteed to be available).
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode (triple buffering)");
        return vk::PresentModeKHR::MAILBOX;
    }

    // FIFO is guaranteed to be available by the Vulkan spec
    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent (resolution).
///
/// If the surface reports a fixed current extent, that is used as-is. A
/// current extent of u32::MAX means the surface takes its size from the
/// swapchain, in which case the requested size is clamped to the surface's
/// min/max extents.
fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    width: u32,
    height: u32,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// Determines the optimal number of swapchain images.
///
/// Prefers one more than the minimum (for triple buffering),
/// but respects the maximum if set.
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    // If max_image_count is 0, there's no maximum
    let image_count = if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    };

    debug!(
        "Image count: {} (min: {}, max: {})",
        image_count,
        capabilities.min_image_count,
        if capabilities.max_image_count == 0 {
            "unlimited".to_string()
        } else {
            capabilities.max_image_count.to_string()
        }
    );

    image_count
}

/// Creates one owning image view per swapchain image.
fn create_image_views(
    device: &Arc<Device>,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<Vec<ImageView>, RhiError> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let view = ImageView::new(device.clone(), image, format, vk::ImageAspectFlags::COLOR)
            .map_err(|e| {
                RhiError::SwapchainError(format!("Failed to create image view {}: {:?}", i, e))
            })?;
        image_views.push(view);
    }

    debug!("Created {} image views", image_views.len());
    Ok(image_views)
}

/// Creates the render pass for the color + depth frame layout.
///
/// The color attachment is cleared on load, stored, and transitioned to
/// present layout. The depth attachment is cleared and its contents are
/// discarded after the pass.
fn create_render_pass(
    device: &Arc<Device>,
    color_format: vk::Format,
    depth_format: vk::Format,
) -> Result<RenderPass, RhiError> {
    let color_attachment = vk::AttachmentDescription::default()
        .format(color_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let depth_attachment = vk::AttachmentDescription::default()
        .format(depth_format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::DONT_CARE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let color_ref = vk::AttachmentReference::default()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let depth_ref = vk::AttachmentReference::default()
        .attachment(1)
        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let color_refs = [color_ref];
    let subpass = vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .depth_stencil_attachment(&depth_ref);

    // Wait for the previous frame's color and depth writes before this
    // pass touches the attachments
    let dependency = vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        );

    let attachments = [color_attachment, depth_attachment];
    let subpasses = [subpass];
    let dependencies = [dependency];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    let render_pass = RenderPass::new(device.clone(), &create_info)?;

    debug!("Render pass uses color {:?}, depth {:?}", color_format, depth_format);

    Ok(render_pass)
}

/// Creates one framebuffer per swapchain image.
fn create_framebuffers(
    device: &Arc<Device>,
    render_pass: vk::RenderPass,
    image_views: &[ImageView],
    depth_images: &[DeviceImage],
    extent: vk::Extent2D,
) -> Result<Vec<Framebuffer>, RhiError> {
    let mut framebuffers = Vec::with_capacity(image_views.len());

    for (view, depth) in image_views.iter().zip(depth_images) {
        let attachments = [view.handle(), depth.view()];
        let framebuffer = Framebuffer::new(device.clone(), render_pass, &attachments, extent)?;
        framebuffers.push(framebuffer);
    }

    debug!("Created {} framebuffers", framebuffers.len());
    Ok(framebuffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_fallback_to_first() {
        let formats = vec![
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::R8G8B8A8_UNORM);
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];

        let selected = choose_present_mode(&modes);
        assert_eq!(selected, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_fallback_to_fifo() {
        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];

        let selected = choose_present_mode(&modes);
        assert_eq!(selected, vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        // Clamping to max
        let extent = choose_extent(&capabilities, 3000, 3000);
        assert_eq!(extent.width, 2000);
        assert_eq!(extent.height, 2000);

        // Clamping to min
        let extent = choose_extent(&capabilities, 50, 50);
        assert_eq!(extent.width, 100);
        assert_eq!(extent.height, 100);

        // Within range
        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!(extent.width, 800);
        assert_eq!(extent.height, 600);
    }

    #[test]
    fn test_determine_image_count() {
        // Max limit caps min+1
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        // Higher max limit leaves min+1
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        // 0 means no limit
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        // min+1 would exceed a tight max
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 2);
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![],
        };
        assert!(!no_modes.is_adequate());
    }

    #[test]
    fn test_images_in_flight_starts_unowned() {
        let table = ImagesInFlight::new(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.owner(0), None);
        assert_eq!(table.owner(1), None);
        assert_eq!(table.owner(2), None);
    }

    #[test]
    fn test_images_in_flight_records_owner() {
        let mut table = ImagesInFlight::new(3);
        table.record(1, 0);
        assert_eq!(table.owner(1), Some(0));
        assert_eq!(table.owner(0), None);

        // Re-recording replaces the owner
        table.record(1, 1);
        assert_eq!(table.owner(1), Some(1));
    }

    #[test]
    fn test_images_in_flight_reacquired_image_names_prior_slot() {
        // 3 images, 2 frame slots, images acquired in order 0, 1, 2, 0.
        // By the fourth acquisition, image 0 is still owned by slot 0,
        // which must be waited on before submitting against it again.
        let mut table = ImagesInFlight::new(3);
        let mut slot = 0usize;

        for image in [0u32, 1, 2] {
            table.record(image, slot);
            slot = (slot + 1) % MAX_FRAMES_IN_FLIGHT;
        }

        // Fourth frame: slot 1 acquires image 0
        assert_eq!(slot, 1);
        assert_eq!(table.owner(0), Some(0));

        table.record(0, slot);
        assert_eq!(table.owner(0), Some(1));
    }
}
