use std::collections::HashMap;

use crate::shared::constants::{DEFAULT_TICK_RATE, RGB_CHANNELS};
use crate::shared::error::{PlaybackError, Result};
use crate::surface::domain::renderer::{Renderer, TextureHandle};
use crate::surface::domain::tick_clock::TickClock;

/// Draw calls kept by [`NullRenderer::draws`]; older ones are dropped.
const DRAW_HISTORY: usize = 1024;

/// Renderer with no output device. Keeps texture bookkeeping and a record
/// of the calls made, which the tests inspect.
#[derive(Debug)]
pub struct NullRenderer {
    clock: TickClock,
    textures: HashMap<TextureHandle, (u32, u32)>,
    next_id: u32,
    created: Vec<(u32, u32)>,
    destroyed: Vec<TextureHandle>,
    draws: Vec<Option<TextureHandle>>,
    draw_count: u64,
    updates: usize,
    last_upload: Option<Vec<u8>>,
}

impl NullRenderer {
    /// Ticks as fast as the caller loops.
    pub fn new() -> Self {
        Self::with_clock(TickClock::unpaced(DEFAULT_TICK_RATE))
    }

    pub fn with_clock(clock: TickClock) -> Self {
        Self {
            clock,
            textures: HashMap::new(),
            next_id: 1,
            created: Vec::new(),
            destroyed: Vec::new(),
            draws: Vec::new(),
            draw_count: 0,
            updates: 0,
            last_upload: None,
        }
    }

    /// Stops after `max_ticks` waits.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.clock = self.clock.with_max_ticks(max_ticks);
        self
    }

    pub fn created(&self) -> &[(u32, u32)] {
        &self.created
    }

    pub fn destroyed(&self) -> &[TextureHandle] {
        &self.destroyed
    }

    /// The most recent draw calls, oldest first.
    pub fn draws(&self) -> &[Option<TextureHandle>] {
        &self.draws
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn last_upload(&self) -> Option<&[u8]> {
        self.last_upload.as_deref()
    }

    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    fn check_len(pixels: &[u8], width: u32, height: u32) -> Result<()> {
        let expected = width as usize * height as usize * RGB_CHANNELS;
        if pixels.len() != expected {
            return Err(PlaybackError::Render(format!(
                "texture is {width}x{height} ({expected} bytes), got {} bytes",
                pixels.len()
            )));
        }
        Ok(())
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NullRenderer {
    fn create_texture(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<TextureHandle> {
        Self::check_len(pixels, width, height)?;
        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.textures.insert(handle, (width, height));
        self.created.push((width, height));
        Ok(handle)
    }

    fn update_texture(&mut self, handle: TextureHandle, pixels: &[u8]) -> Result<()> {
        let &(width, height) = self
            .textures
            .get(&handle)
            .ok_or_else(|| PlaybackError::Render(format!("unknown texture {handle:?}")))?;
        Self::check_len(pixels, width, height)?;
        self.updates += 1;
        let upload = self.last_upload.get_or_insert_with(Vec::new);
        upload.clear();
        upload.extend_from_slice(pixels);
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if self.textures.remove(&handle).is_some() {
            self.destroyed.push(handle);
        }
    }

    fn draw(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        if let Some(handle) = texture {
            if !self.textures.contains_key(&handle) {
                return Err(PlaybackError::Render(format!("unknown texture {handle:?}")));
            }
        }
        if self.draws.len() == DRAW_HISTORY {
            self.draws.drain(..DRAW_HISTORY / 2);
        }
        self.draws.push(texture);
        self.draw_count += 1;
        Ok(())
    }

    fn should_continue(&self) -> bool {
        self.clock.budget_left()
    }

    fn wait_for_tick(&mut self) {
        self.clock.wait();
    }

    fn tick_rate(&self) -> u32 {
        self.clock.rate()
    }
}
