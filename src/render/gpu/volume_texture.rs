//! GPU copy of the volume window

use crate::volume::VolumeWindow;

/// Rgba8 3-D texture mirroring a [`VolumeWindow`]
///
/// Uploads only when the window's revision moves, so a static viewer costs
/// nothing per frame.
pub struct VolumeTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    size: u32,
    uploaded_revision: Option<u64>,
}

impl VolumeTexture {
    pub fn new(device: &wgpu::Device, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("volume_window"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            size,
            uploaded_revision: None,
        }
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Whether `window` differs from what the texture holds
    pub fn needs_upload(&self, window: &VolumeWindow) -> bool {
        window.has_sampled() && self.uploaded_revision != Some(window.revision())
    }

    /// Upload the window if it changed; returns true when texels were written
    pub fn sync(&mut self, queue: &wgpu::Queue, window: &VolumeWindow) -> bool {
        if !self.needs_upload(window) || window.size() != self.size {
            return false;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            window.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.size * 4),
                rows_per_image: Some(self.size),
            },
            extent(self.size),
        );
        self.uploaded_revision = Some(window.revision());
        log::debug!("Uploaded volume window revision {} ({}³)", window.revision(), self.size);
        true
    }
}

fn extent(size: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: size,
    }
}
