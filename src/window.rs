#![cfg(feature = "overlay")]
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event as WinitEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder, WindowLevel};

use crate::raster::{render_frame, RenderOptions};
use crate::sim::{Simulation, TickAccumulator, TICK};
use crate::tuning::Tuning;

const MARGIN: i32 = 20;
/// Redraw pacing while the overlay is fully covered by other windows.
const OCCLUDED_INTERVAL: Duration = Duration::from_millis(250);

const BLIT_SHADER: &str = r#"
@group(0) @binding(0) var scene_tex: texture_2d<f32>;
@group(0) @binding(1) var scene_sampler: sampler;

struct VertexOutput {
  @builtin(position) position: vec4<f32>,
  @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
  var positions = array<vec2<f32>, 3>(
    vec2<f32>(-1.0, -3.0),
    vec2<f32>(-1.0, 1.0),
    vec2<f32>(3.0, 1.0)
  );

  var out: VertexOutput;
  let p = positions[vertex_index];
  out.position = vec4<f32>(p, 0.0, 1.0);
  out.uv = p * vec2<f32>(0.5, -0.5) + vec2<f32>(0.5, 0.5);
  return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
  return textureSample(scene_tex, scene_sampler, input.uv);
}
"#;

#[derive(Debug, Clone, Copy)]
pub struct OverlayArgs {
    pub width: u32,
    pub height: u32,
    pub click_through: bool,
    pub seed: Option<u64>,
}

/// Borderless always-on-top overlay window. Esc/Q quit, C toggles
/// click-through, R regenerates, left-drag moves the window.
pub fn run_overlay(tuning: Tuning, args: OverlayArgs) -> Result<()> {
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut sim = Simulation::with_tuning(args.width, args.height, tuning, rng);

    let event_loop = EventLoop::new().context("failed to create overlay event loop")?;
    let initial_size = PhysicalSize::new(args.width.max(1), args.height.max(1));
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Tannenbaum")
            .with_inner_size(initial_size)
            .with_decorations(false)
            .with_transparent(true)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_resizable(true)
            .build(&event_loop)
            .context("failed to create overlay window")?,
    );
    position_bottom_right(&window, initial_size);

    let mut click_through = false;
    if args.click_through {
        click_through = set_click_through(&window, true);
    }

    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window.clone())
        .context("failed to create wgpu surface")?;
    let gpu = pollster::block_on(Gpu::for_surface(&instance, &surface))?;

    let caps = surface.get_capabilities(&gpu.adapter);
    let format = caps
        .formats
        .first()
        .copied()
        .ok_or_else(|| anyhow!("surface reports no supported texture formats"))?;
    // Premultiplied compositing keeps the transparent framebuffer correct;
    // the rasterizer already emits premultiplied alpha.
    let alpha_mode = if caps
        .alpha_modes
        .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
    {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        caps.alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto)
    };

    let mut surface_config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: initial_size.width,
        height: initial_size.height,
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(&gpu.device, &surface_config);

    let blit = BlitPipeline::new(&gpu.device, format);
    let viewport = sim.viewport();
    let mut scene_texture = SceneTexture::new(
        &gpu.device,
        &blit,
        viewport.width as u32,
        viewport.height as u32,
    );

    eprintln!(
        "[tannenbaum] overlay: {}x{} ({} ornaments, {} flakes)",
        initial_size.width,
        initial_size.height,
        sim.scene().ornaments.len(),
        sim.scene().snowflakes.len()
    );
    eprintln!("[tannenbaum] Controls: C click-through, R regenerate, drag to move, Esc/Q quit");

    let mut accumulator = TickAccumulator::new();
    let mut last_tick = Instant::now();
    let mut next_redraw_at = Instant::now();
    let mut occluded = false;

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Wait);

            match event {
                WinitEvent::WindowEvent { window_id, event } if window_id == window.id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.state != ElementState::Pressed || event.repeat {
                                return;
                            }
                            match event.physical_key {
                                PhysicalKey::Code(KeyCode::Escape | KeyCode::KeyQ) => {
                                    target.exit();
                                }
                                PhysicalKey::Code(KeyCode::KeyC) => {
                                    click_through = set_click_through(&window, !click_through);
                                }
                                PhysicalKey::Code(KeyCode::KeyR) => {
                                    let size = window.inner_size();
                                    sim.regenerate(size.width, size.height);
                                    window.request_redraw();
                                }
                                _ => {}
                            }
                        }
                        WindowEvent::MouseInput {
                            state: ElementState::Pressed,
                            button: MouseButton::Left,
                            ..
                        } => {
                            if !click_through {
                                if let Err(error) = window.drag_window() {
                                    eprintln!("[tannenbaum] overlay: drag failed: {error}");
                                }
                            }
                        }
                        WindowEvent::Resized(size) => {
                            if size.width > 0 && size.height > 0 {
                                surface_config.width = size.width;
                                surface_config.height = size.height;
                                surface.configure(&gpu.device, &surface_config);
                                sim.regenerate(size.width, size.height);
                                scene_texture = SceneTexture::new(
                                    &gpu.device,
                                    &blit,
                                    sim.viewport().width as u32,
                                    sim.viewport().height as u32,
                                );
                                window.request_redraw();
                            }
                        }
                        WindowEvent::Occluded(value) => {
                            occluded = value;
                        }
                        WindowEvent::RedrawRequested => {
                            for _ in 0..accumulator.advance(last_tick.elapsed()) {
                                sim.step();
                            }
                            last_tick = Instant::now();

                            if let Err(error) = draw_frame(
                                &gpu,
                                &surface,
                                &surface_config,
                                &blit,
                                &scene_texture,
                                &sim,
                            ) {
                                eprintln!("[tannenbaum] overlay: render error: {error:#}");
                            }
                        }
                        _ => {}
                    }
                }
                WinitEvent::AboutToWait => {
                    // Fixed-step pacing; idle slower while fully covered.
                    let interval = if occluded { OCCLUDED_INTERVAL } else { TICK };
                    let now = Instant::now();
                    if now >= next_redraw_at {
                        window.request_redraw();
                        next_redraw_at = now + interval;
                    }
                    target.set_control_flow(ControlFlow::WaitUntil(next_redraw_at));
                }
                _ => {}
            }
        })
        .map_err(|error| anyhow!("overlay event loop terminated: {error}"))
}

fn position_bottom_right(window: &Window, size: PhysicalSize<u32>) {
    if let Some(monitor) = window.primary_monitor() {
        let origin = monitor.position();
        let area = monitor.size();
        window.set_outer_position(PhysicalPosition::new(
            origin.x + area.width as i32 - size.width as i32 - MARGIN,
            origin.y + area.height as i32 - size.height as i32 - MARGIN,
        ));
    }
}

/// Returns the state actually applied; platforms without hit-test control
/// keep the previous behavior.
fn set_click_through(window: &Window, enabled: bool) -> bool {
    match window.set_cursor_hittest(!enabled) {
        Ok(()) => {
            eprintln!(
                "[tannenbaum] overlay: click-through {}",
                if enabled { "on" } else { "off" }
            );
            enabled
        }
        Err(error) => {
            eprintln!("[tannenbaum] overlay: click-through unsupported: {error}");
            false
        }
    }
}

struct Gpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl Gpu {
    async fn for_surface(instance: &wgpu::Instance, surface: &wgpu::Surface<'_>) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                force_fallback_adapter: false,
                compatible_surface: Some(surface),
            })
            .await
            .ok_or_else(|| anyhow!("no suitable GPU adapter found"))?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("tannenbaum-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .context("failed to request wgpu device")?;

        Ok(Self {
            adapter,
            device,
            queue,
        })
    }
}

struct BlitPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl BlitPipeline {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tannenbaum-blit-bind-group-layout"),
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

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tannenbaum-blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tannenbaum-blit-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tannenbaum-blit-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tannenbaum-blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }
}

struct SceneTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

impl SceneTexture {
    fn new(device: &wgpu::Device, blit: &BlitPipeline, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tannenbaum-scene-texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tannenbaum-scene-bind-group"),
            layout: &blit.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&blit.sampler),
                },
            ],
        });

        Self {
            texture,
            bind_group,
            width,
            height,
        }
    }

    fn upload(&self, queue: &wgpu::Queue, rgba: &[u8]) {
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn draw_frame(
    gpu: &Gpu,
    surface: &wgpu::Surface<'_>,
    surface_config: &wgpu::SurfaceConfiguration,
    blit: &BlitPipeline,
    scene_texture: &SceneTexture,
    sim: &Simulation,
) -> Result<()> {
    let pixmap = render_frame(sim, RenderOptions::default())?;
    scene_texture.upload(&gpu.queue, pixmap.data());

    let frame = match surface.get_current_texture() {
        Ok(frame) => frame,
        Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
            surface.configure(&gpu.device, surface_config);
            return Ok(());
        }
        Err(wgpu::SurfaceError::Timeout) => return Ok(()),
        Err(wgpu::SurfaceError::OutOfMemory) => {
            return Err(anyhow!("surface out of memory"));
        }
    };
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("tannenbaum-frame-encoder"),
        });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tannenbaum-blit-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        pass.set_pipeline(&blit.pipeline);
        pass.set_bind_group(0, &scene_texture.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }

    gpu.queue.submit(Some(encoder.finish()));
    frame.present();
    Ok(())
}
