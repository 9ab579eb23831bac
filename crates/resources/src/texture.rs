//! Texture loading and GPU upload.

use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::info;

use glimmer_rhi::buffer::{Buffer, BufferUsage};
use glimmer_rhi::device::Device;
use glimmer_rhi::image::DeviceImage;

use crate::error::{ResourceError, ResourceResult};

/// A sampled 2D texture in device-local memory.
///
/// Owns the image and the sampler; [`descriptor_info`](Self::descriptor_info)
/// hands both to a combined image sampler binding.
pub struct Texture {
    device: Arc<Device>,
    image: DeviceImage,
    sampler: vk::Sampler,
}

impl Texture {
    /// Loads an image file, uploads it as RGBA8 sRGB, and creates a sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, decoding fails, or any GPU
    /// resource creation fails.
    pub fn from_file(device: Arc<Device>, path: impl AsRef<Path>) -> ResourceResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ResourceError::FileNotFound(path.to_path_buf()));
        }

        let decoded = image::open(path)?.to_rgba8();
        let (width, height) = decoded.dimensions();
        let pixels = decoded.into_raw();

        let texture = Self::from_pixels(device, &pixels, width, height)?;

        info!("Loaded texture {:?} ({}x{})", path, width, height);

        Ok(texture)
    }

    /// Uploads raw RGBA8 pixel data as a sampled texture.
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel data does not match the dimensions or
    /// GPU resource creation fails.
    pub fn from_pixels(
        device: Arc<Device>,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> ResourceResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(ResourceError::InvalidModel(format!(
                "Pixel data is {} bytes, expected {} for {}x{} RGBA8",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let image = DeviceImage::sampled_texture(
            device.clone(),
            width,
            height,
            vk::Format::R8G8B8A8_SRGB,
        )?;

        device.transition_image_layout(
            image.handle(),
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;
        device.copy_buffer_to_image(staging.handle(), image.handle(), width, height)?;
        device.transition_image_layout(
            image.handle(),
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;

        let sampler = create_sampler(&device)?;

        Ok(Self {
            device,
            image,
            sampler,
        })
    }

    /// Returns descriptor info for a combined image sampler binding.
    pub fn descriptor_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo {
            sampler: self.sampler,
            image_view: self.image.view(),
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }
    }

    /// Returns the texture dimensions.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }
}

fn create_sampler(device: &Arc<Device>) -> ResourceResult<vk::Sampler> {
    // Anisotropy is enabled as a device feature at creation
    let max_anisotropy = device.properties().limits.max_sampler_anisotropy;

    let sampler_info = vk::SamplerCreateInfo::default()
        .mag_filter(vk::Filter::LINEAR)
        .min_filter(vk::Filter::LINEAR)
        .mipmap_mode(vk::SamplerMipmapMode::LINEAR)
        .address_mode_u(vk::SamplerAddressMode::REPEAT)
        .address_mode_v(vk::SamplerAddressMode::REPEAT)
        .address_mode_w(vk::SamplerAddressMode::REPEAT)
        .anisotropy_enable(true)
        .max_anisotropy(max_anisotropy)
        .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
        .unnormalized_coordinates(false)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .min_lod(0.0)
        .max_lod(0.0);

    let sampler = unsafe {
        device
            .handle()
            .create_sampler(&sampler_info, None)
            .map_err(glimmer_rhi::RhiError::from)?
    };

    Ok(sampler)
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
        }
    }
}
