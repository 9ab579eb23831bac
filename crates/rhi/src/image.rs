//! GPU image management.
//!
//! This module provides [`DeviceImage`], a Vulkan image with gpu-allocator
//! managed memory and an associated image view. It backs depth attachments
//! and sampled textures.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glimmer_rhi::device::Device;
//! use glimmer_rhi::image::DeviceImage;
//! use ash::vk;
//!
//! # fn example(device: Arc<Device>) -> Result<(), glimmer_rhi::RhiError> {
//! let depth = DeviceImage::depth_attachment(device, 1920, 1080, vk::Format::D32_SFLOAT)?;
//! let view = depth.view();
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Returns the image aspect mask for a depth format.
///
/// Includes the stencil aspect for combined depth-stencil formats.
pub fn depth_aspect_mask(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::DEPTH,
    }
}

/// Vulkan image with managed memory and an image view.
///
/// # Resource Destruction
///
/// Resources are destroyed in the following order:
/// 1. Image view
/// 2. Image
/// 3. Memory allocation
pub struct DeviceImage {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Vulkan image view handle.
    view: vk::ImageView,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Image format.
    format: vk::Format,
    /// Image dimensions.
    extent: vk::Extent2D,
}

impl DeviceImage {
    /// Creates a new 2D image in device-local memory with an image view.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `width` - Width in pixels
    /// * `height` - Height in pixels
    /// * `format` - Image format
    /// * `usage` - Image usage flags
    /// * `aspect` - Aspect mask for the image view
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Image creation fails
    /// - Memory allocation fails
    /// - Image view creation fails
    pub fn new(
        device: Arc<Device>,
        width: u32,
        height: u32,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        aspect: vk::ImageAspectFlags,
    ) -> RhiResult<Self> {
        if width == 0 || height == 0 {
            return Err(RhiError::InvalidHandle(
                "Image dimensions must be greater than 0".to_string(),
            ));
        }

        let extent = vk::Extent2D { width, height };

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "image",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false, // Optimal tiling is not linear
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(aspect)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&view_info, None)? };

        debug!("Created image: {}x{} ({:?})", width, height, format);

        Ok(Self {
            device,
            image,
            view,
            allocation: Some(allocation),
            format,
            extent,
        })
    }

    /// Creates a depth attachment image.
    ///
    /// # Errors
    ///
    /// Returns an error if image creation fails.
    pub fn depth_attachment(
        device: Arc<Device>,
        width: u32,
        height: u32,
        format: vk::Format,
    ) -> RhiResult<Self> {
        Self::new(
            device,
            width,
            height,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            depth_aspect_mask(format),
        )
    }

    /// Creates a sampled texture image that can receive transfer writes.
    ///
    /// # Errors
    ///
    /// Returns an error if image creation fails.
    pub fn sampled_texture(
        device: Arc<Device>,
        width: u32,
        height: u32,
        format: vk::Format,
    ) -> RhiResult<Self> {
        Self::new(
            device,
            width,
            height,
            format,
            vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED,
            vk::ImageAspectFlags::COLOR,
        )
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the image extent (width and height).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for DeviceImage {
    fn drop(&mut self) {
        // Destroy resources in correct order:
        // 1. Image view (depends on image)
        // 2. Image (depends on allocation)
        // 3. Allocation (frees memory)
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free image allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed image: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

/// Owning wrapper for an image view over an externally owned image.
///
/// [`DeviceImage`] creates views for images it owns; this wrapper covers
/// images that belong to someone else, such as swapchain images whose
/// `vk::Image` handles are owned by the swapchain.
pub struct ImageView {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image view handle.
    view: vk::ImageView,
}

impl ImageView {
    /// Creates a 2D view of `image`.
    ///
    /// The caller must keep `image` alive for the lifetime of the view.
    ///
    /// # Errors
    ///
    /// Returns an error if image view creation fails.
    pub fn new(
        device: Arc<Device>,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
    ) -> RhiResult<Self> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(aspect)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&create_info, None)? };

        Ok(Self { device, view })
    }

    /// Returns the Vulkan image view handle.
    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.view
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_image_view(self.view, None);
        }
    }
}

/// Owning wrapper for a render pass.
pub struct RenderPass {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan render pass handle.
    render_pass: vk::RenderPass,
}

impl RenderPass {
    /// Creates a render pass from `create_info`.
    ///
    /// # Errors
    ///
    /// Returns an error if render pass creation fails.
    pub fn new(device: Arc<Device>, create_info: &vk::RenderPassCreateInfo<'_>) -> RhiResult<Self> {
        let render_pass = unsafe { device.handle().create_render_pass(create_info, None)? };

        debug!("Created render pass");

        Ok(Self {
            device,
            render_pass,
        })
    }

    /// Returns the Vulkan render pass handle.
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        debug!("Destroyed render pass");
    }
}

/// Owning wrapper for a framebuffer.
pub struct Framebuffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan framebuffer handle.
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    /// Creates a single-layer framebuffer binding `attachments` to
    /// `render_pass` at `extent`.
    ///
    /// The caller must keep the render pass and attachment views alive
    /// for the lifetime of the framebuffer.
    ///
    /// # Errors
    ///
    /// Returns an error if framebuffer creation fails.
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        Ok(Self {
            device,
            framebuffer,
        })
    }

    /// Returns the Vulkan framebuffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_framebuffer(self.framebuffer, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_aspect_for_pure_depth_formats() {
        assert_eq!(
            depth_aspect_mask(vk::Format::D32_SFLOAT),
            vk::ImageAspectFlags::DEPTH
        );
        assert_eq!(
            depth_aspect_mask(vk::Format::D16_UNORM),
            vk::ImageAspectFlags::DEPTH
        );
    }

    #[test]
    fn test_depth_aspect_includes_stencil_for_combined_formats() {
        let combined = depth_aspect_mask(vk::Format::D24_UNORM_S8_UINT);
        assert!(combined.contains(vk::ImageAspectFlags::DEPTH));
        assert!(combined.contains(vk::ImageAspectFlags::STENCIL));

        let combined = depth_aspect_mask(vk::Format::D32_SFLOAT_S8_UINT);
        assert!(combined.contains(vk::ImageAspectFlags::STENCIL));
    }

    #[test]
    fn test_image_view_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImageView>();
    }

    #[test]
    fn test_render_pass_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RenderPass>();
    }

    #[test]
    fn test_framebuffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Framebuffer>();
    }
}
