use crate::shared::error::{PlaybackError, Result};
use crate::shared::picture::PictureView;
use crate::shared::stream_metadata::StreamMetadata;
use crate::surface::domain::renderer::{Renderer, TextureHandle};

/// CPU backing store of the displayed picture plus its renderer texture.
#[derive(Debug)]
pub struct DisplaySurface {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    texture: TextureHandle,
    dirty: bool,
}

impl DisplaySurface {
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Owns the display surface: allocated once from the stream metadata, then
/// overwritten in place by every published picture.
#[derive(Debug, Default)]
pub struct SurfacePublisher {
    surface: Option<DisplaySurface>,
    allocations: u32,
}

impl SurfacePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the backing store and texture. Calling this a second time is
    /// an error; the surface never changes size during a session.
    pub fn allocate(&mut self, metadata: &StreamMetadata, renderer: &mut dyn Renderer) -> Result<()> {
        self.allocations += 1;
        if self.surface.is_some() {
            return Err(PlaybackError::SurfaceReallocation);
        }

        let pixels = vec![0u8; metadata.rgb_len()];
        let texture = renderer.create_texture(&pixels, metadata.width, metadata.height)?;
        log::info!(
            "allocated {}x{} display surface ({} bytes)",
            metadata.width,
            metadata.height,
            pixels.len()
        );
        self.surface = Some(DisplaySurface {
            pixels,
            width: metadata.width,
            height: metadata.height,
            texture,
            dirty: false,
        });
        Ok(())
    }

    /// Copies `picture` into the backing store and marks it for upload.
    pub fn publish(&mut self, picture: PictureView<'_>) -> Result<()> {
        let surface = self.surface.as_mut().ok_or(PlaybackError::SurfaceMissing)?;
        if picture.width() != surface.width
            || picture.height() != surface.height
            || picture.data().len() != surface.pixels.len()
        {
            return Err(PlaybackError::PictureSize {
                expected: surface.pixels.len(),
                actual: picture.data().len(),
            });
        }
        surface.pixels.copy_from_slice(picture.data());
        surface.dirty = true;
        Ok(())
    }

    /// Uploads the backing store if a picture arrived since the last flush.
    /// Returns whether an upload happened.
    pub fn flush(&mut self, renderer: &mut dyn Renderer) -> Result<bool> {
        match self.surface.as_mut() {
            Some(surface) if surface.dirty => {
                renderer.update_texture(surface.texture, &surface.pixels)?;
                surface.dirty = false;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub fn release(&mut self, renderer: &mut dyn Renderer) {
        if let Some(surface) = self.surface.take() {
            renderer.destroy_texture(surface.texture);
        }
    }

    pub fn surface(&self) -> Option<&DisplaySurface> {
        self.surface.as_ref()
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.surface.as_ref().map(|s| s.texture)
    }

    pub fn is_allocated(&self) -> bool {
        self.surface.is_some()
    }

    /// Number of `allocate` calls, including rejected ones.
    pub fn allocations(&self) -> u32 {
        self.allocations
    }
}
