pub mod instance;
pub mod pipeline;
pub mod sheet;

use std::sync::Arc;

use glam::Vec2;
use winit::window::Window;

use self::instance::SpriteInstance;
use self::pipeline::SpritePipeline;
use self::sheet::{SheetTexture, SpriteSheet};
use crate::cat::animation::FrameRect;
use crate::debug::DebugOverlay;
use crate::error::StartupError;

/// Destination rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// What the session needs from a renderer. One `clear`, any number of
/// `draw_frame`s, then `present` per frame.
pub trait SpriteRenderer {
    /// Start a new frame filled with `rgb` (0xRRGGBB).
    fn clear(&mut self, rgb: u32);
    /// Blit `src` from the sprite sheet into `dest`, rotated clockwise by
    /// `angle_degrees` about its centre, optionally mirrored horizontally.
    fn draw_frame(&mut self, src: FrameRect, dest: DestRect, angle_degrees: f32, flip: bool);
    fn present(&mut self);
}

/// Device, queue, surface and the sprite pipeline with its sheet.
pub struct GpuState {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub sprite_pipeline: SpritePipeline,
    sheet: Option<SheetTexture>,
    clear_color: wgpu::Color,
    instance_buf: Vec<SpriteInstance>,
}

/// Intermediate frame state returned by `begin_frame`.
pub struct FrameContext {
    pub output: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

impl GpuState {
    /// Initialize wgpu and the sprite pipeline.
    pub fn new(window: Arc<Window>) -> Result<Self, StartupError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| StartupError::Renderer(format!("surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|e| StartupError::Renderer(format!("adapter: {e}")))?;

        log::info!(
            "GPU adapter: {:?} ({:?})",
            adapter.get_info().name,
            adapter.get_info().backend
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("catwalk_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
        ))
        .map_err(|e| StartupError::Renderer(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);

        let format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| StartupError::Renderer("surface has no formats".into()))?;

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        log::info!("Surface: format={:?}, alpha_mode={:?}", format, alpha_mode);

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // Pacing is ours; vsync only caps it.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let sprite_pipeline = SpritePipeline::new(&device, format);
        sprite_pipeline.update_screen_size(
            &queue,
            surface_config.width as f32,
            surface_config.height as f32,
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            sprite_pipeline,
            sheet: None,
            clear_color: wgpu::Color::BLACK,
            instance_buf: Vec::with_capacity(pipeline::MAX_INSTANCES),
        })
    }

    /// Create the sheet texture and its bind group. Replaces any previous sheet.
    pub fn upload_sprite_sheet(&mut self, sheet: &SpriteSheet) -> Result<(), StartupError> {
        sheet.check_fits(self.device.limits().max_texture_dimension_2d)?;

        let extent = wgpu::Extent3d {
            width: sheet.width,
            height: sheet.height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite_sheet"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            sheet.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * sheet.width),
                rows_per_image: Some(sheet.height),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.sprite_pipeline.bind_sheet(&self.device, &view);
        self.sheet = Some(SheetTexture {
            texture,
            bind_group,
        });
        Ok(())
    }

    /// Resize the surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.sprite_pipeline
            .update_screen_size(&self.queue, width as f32, height as f32);
    }

    /// Acquire the next surface texture and create a command encoder.
    /// Returns None if the surface is lost/outdated (caller should skip this frame).
    pub fn begin_frame(&self) -> Option<FrameContext> {
        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface
                    .configure(&self.device, &self.surface_config);
                return None;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                return None;
            }
            Err(e) => {
                log::warn!("Surface error: {e:?}");
                return None;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        Some(FrameContext {
            output,
            view,
            encoder,
        })
    }

    /// Clear to the background colour and draw the queued sprites.
    pub fn draw_sprites(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("sprite_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let p = &self.sprite_pipeline;
        let Some(sheet) = &self.sheet else {
            return;
        };
        if p.num_instances > 0 {
            render_pass.set_pipeline(&p.pipeline);
            render_pass.set_bind_group(0, &p.screen_bind_group, &[]);
            render_pass.set_bind_group(1, &sheet.bind_group, &[]);
            render_pass.set_vertex_buffer(0, p.vertex_buffer.slice(..));
            render_pass.set_vertex_buffer(1, p.instance_buffer.slice(..));
            render_pass.set_index_buffer(p.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            render_pass.draw_indexed(0..6, 0, 0..p.num_instances);
        }
    }

    /// Create an egui render pass that preserves existing content (LoadOp::Load).
    /// Returns a 'static render pass suitable for egui_wgpu::Renderer::render().
    pub fn begin_egui_pass(
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'static> {
        let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("egui_render_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                depth_slice: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.forget_lifetime()
    }

    /// Submit the command encoder and present.
    pub fn finish_frame(
        &self,
        encoder: wgpu::CommandEncoder,
        output: wgpu::SurfaceTexture,
        extra_cmd_bufs: Vec<wgpu::CommandBuffer>,
    ) {
        self.queue.submit(
            extra_cmd_bufs
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );
        output.present();
    }
}

/// Converts 0xRRGGBB to a linear clear colour for an sRGB surface.
fn clear_color(rgb: u32) -> wgpu::Color {
    let channel = |shift: u32| {
        let srgb = ((rgb >> shift) & 0xFF) as f64 / 255.0;
        if srgb <= 0.04045 {
            srgb / 12.92
        } else {
            ((srgb + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: channel(16),
        g: channel(8),
        b: channel(0),
        a: 1.0,
    }
}

/// One frame's worth of drawing onto the window, with the debug overlay
/// composited on top when present.
pub struct Canvas<'a> {
    gpu: &'a mut GpuState,
    overlay: Option<(&'a mut DebugOverlay, &'a Window)>,
}

impl<'a> Canvas<'a> {
    pub fn new(gpu: &'a mut GpuState, overlay: Option<(&'a mut DebugOverlay, &'a Window)>) -> Self {
        Self { gpu, overlay }
    }
}

impl SpriteRenderer for Canvas<'_> {
    fn clear(&mut self, rgb: u32) {
        self.gpu.clear_color = clear_color(rgb);
        self.gpu.instance_buf.clear();
    }

    fn draw_frame(&mut self, src: FrameRect, dest: DestRect, angle_degrees: f32, flip: bool) {
        let sheet_size = self
            .gpu
            .sheet
            .as_ref()
            .map_or(Vec2::ONE, SheetTexture::size);
        self.gpu
            .instance_buf
            .push(SpriteInstance::new(src, sheet_size, dest, angle_degrees, flip));
    }

    fn present(&mut self) {
        let gpu = &mut *self.gpu;
        gpu.sprite_pipeline
            .update_instances(&gpu.queue, &gpu.instance_buf);

        let Some(FrameContext {
            output,
            view,
            mut encoder,
        }) = gpu.begin_frame()
        else {
            return;
        };

        gpu.draw_sprites(&mut encoder, &view);

        let Some((overlay, window)) = self.overlay.as_mut() else {
            gpu.finish_frame(encoder, output, Vec::new());
            return;
        };

        let (primitives, textures_delta, screen_descriptor) = overlay.run_frame(
            window,
            gpu.surface_config.width,
            gpu.surface_config.height,
        );
        let extra = overlay.prepare_egui(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );
        {
            let mut pass = GpuState::begin_egui_pass(&mut encoder, &view);
            overlay.render_egui(&mut pass, &primitives, &screen_descriptor);
        }
        gpu.finish_frame(encoder, output, extra);
        overlay.free_textures(&textures_delta);
    }
}
