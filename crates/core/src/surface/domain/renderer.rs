use crate::shared::error::Result;

/// Opaque id of a texture owned by a [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Rendering collaborator: owns textures, draws the scene and paces the
/// presentation ticks.
///
/// Texture pixel data is always packed RGB24, `width * height * 3` bytes.
pub trait Renderer {
    fn create_texture(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<TextureHandle>;

    fn update_texture(&mut self, handle: TextureHandle, pixels: &[u8]) -> Result<()>;

    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Draws one frame. With no texture the frame is just cleared.
    fn draw(&mut self, texture: Option<TextureHandle>) -> Result<()>;

    /// `false` once the user (or a tick budget) asks playback to stop.
    fn should_continue(&self) -> bool;

    /// Blocks until the next presentation tick is due.
    fn wait_for_tick(&mut self);

    fn tick_rate(&self) -> u32;
}
