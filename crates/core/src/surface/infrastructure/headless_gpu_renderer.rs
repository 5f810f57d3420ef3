use std::collections::HashMap;

use crate::shared::constants::RGB_CHANNELS;
use crate::shared::error::{PlaybackError, Result};
use crate::surface::domain::renderer::{Renderer, TextureHandle};
use crate::surface::domain::tick_clock::TickClock;

const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const RGBA_CHANNELS: u32 = 4;

struct VideoTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

/// wgpu renderer drawing into an offscreen target instead of a window.
///
/// Each draw clears the target to black and samples the video texture onto
/// an aspect-preserving quad. The target can be read back for inspection.
pub struct HeadlessGpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    target_size: (u32, u32),
    textures: HashMap<TextureHandle, VideoTexture>,
    next_id: u32,
    clock: TickClock,
    frames_drawn: u64,
    rgba: Vec<u32>,
}

impl HeadlessGpuRenderer {
    /// Returns `None` if no suitable adapter is available.
    pub fn new(width: u32, height: u32, clock: TickClock) -> Option<Self> {
        let instance = wgpu::Instance::default();
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("reelloop-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .ok()?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("textured-quad-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/textured_quad.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("video-bind-group-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("video-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("video-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TEXTURE_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("video-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let width = width.max(1);
        let height = height.max(1);
        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen-target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

        log::info!(
            "headless renderer on {} ({width}x{height} target)",
            adapter.get_info().name
        );

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            sampler,
            target,
            target_view,
            target_size: (width, height),
            textures: HashMap::new(),
            next_id: 1,
            clock,
            frames_drawn: 0,
            rgba: Vec::new(),
        })
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn target_size(&self) -> (u32, u32) {
        self.target_size
    }

    /// Copies the offscreen target back to the CPU as tightly packed RGBA.
    pub fn read_target(&self) -> Result<Vec<u8>> {
        let (width, height) = self.target_size;
        let row_bytes = width * RGBA_CHANNELS;
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("target-readback"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            });
        encoder.copy_texture_to_buffer(
            self.target.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.queue.submit(Some(encoder.finish()));

        let slice = staging.slice(..);
        slice.map_async(wgpu::MapMode::Read, |_| {});
        self.device.poll(wgpu::Maintain::Wait);

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
        for row in mapped.chunks(padded_row as usize).take(height as usize) {
            pixels.extend_from_slice(&row[..row_bytes as usize]);
        }
        drop(mapped);
        staging.unmap();
        Ok(pixels)
    }

    fn upload(&mut self, handle: TextureHandle, pixels: &[u8]) -> Result<()> {
        let video = self
            .textures
            .get(&handle)
            .ok_or_else(|| PlaybackError::Render(format!("unknown texture {handle:?}")))?;
        let expected = video.width as usize * video.height as usize * RGB_CHANNELS;
        if pixels.len() != expected {
            return Err(PlaybackError::Render(format!(
                "texture is {}x{} ({expected} bytes), got {} bytes",
                video.width,
                video.height,
                pixels.len()
            )));
        }

        expand_rgb(pixels, &mut self.rgba);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &video.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&self.rgba),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(video.width * RGBA_CHANNELS),
                rows_per_image: Some(video.height),
            },
            wgpu::Extent3d {
                width: video.width,
                height: video.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }
}

impl Renderer for HeadlessGpuRenderer {
    fn create_texture(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<TextureHandle> {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("video-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("video-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            handle,
            VideoTexture {
                texture,
                bind_group,
                width,
                height,
            },
        );
        if let Err(e) = self.upload(handle, pixels) {
            self.destroy_texture(handle);
            return Err(e);
        }
        Ok(handle)
    }

    fn update_texture(&mut self, handle: TextureHandle, pixels: &[u8]) -> Result<()> {
        self.upload(handle, pixels)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        if let Some(video) = self.textures.remove(&handle) {
            video.texture.destroy();
        }
    }

    fn draw(&mut self, texture: Option<TextureHandle>) -> Result<()> {
        let video = match texture {
            Some(handle) => Some(
                self.textures
                    .get(&handle)
                    .ok_or_else(|| PlaybackError::Render(format!("unknown texture {handle:?}")))?,
            ),
            None => None,
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("video-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if let Some(video) = video {
                let (x, y, w, h) = letterbox((video.width, video.height), self.target_size);
                pass.set_viewport(x, y, w, h, 0.0, 1.0);
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &video.bind_group, &[]);
                pass.draw(0..6, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));
        self.frames_drawn += 1;
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

/// Expands packed RGB24 into RGBA8 texels with opaque alpha.
fn expand_rgb(rgb: &[u8], rgba: &mut Vec<u32>) {
    rgba.clear();
    rgba.extend(
        rgb.chunks_exact(RGB_CHANNELS)
            .map(|p| u32::from_ne_bytes([p[0], p[1], p[2], 255])),
    );
}

/// Largest rectangle with the video's aspect ratio centred in the target:
/// `(x, y, width, height)` in target pixels.
fn letterbox(video: (u32, u32), target: (u32, u32)) -> (f32, f32, f32, f32) {
    let (vw, vh) = (video.0.max(1) as f32, video.1.max(1) as f32);
    let (tw, th) = (target.0 as f32, target.1 as f32);
    let scale = (tw / vw).min(th / vh);
    let (w, h) = (vw * scale, vh * scale);
    ((tw - w) / 2.0, (th - h) / 2.0, w, h)
}
