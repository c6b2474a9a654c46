use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use tumbler_common::SceneConfig;
use tumbler_render::{RenderView, SceneLighting};
use tumbler_render_wgpu::{FollowCamera, WgpuRenderer};
use tumbler_scene::{FrameTimer, Scene};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Longest frame delta fed to the scene, in seconds.
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Parser)]
#[command(name = "tumbler-desktop", about = "Tumbler desktop viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// RNG seed for the surface waves; random when omitted
    #[arg(short, long)]
    seed: Option<u64>,

    /// Character model to load instead of the configured one
    #[arg(short, long)]
    model: Option<String>,
}

/// Application state.
struct AppState {
    scene: Scene,
    camera: FollowCamera,
    frames: FrameTimer,
    show_hud: bool,
    last_frame: Instant,
}

impl AppState {
    fn new(config: SceneConfig, seed: u64) -> Result<Self> {
        let camera = FollowCamera::new(&config.camera, 1280, 720);
        let mut scene = Scene::new(config, seed)?;
        scene.load_player_model();
        Ok(Self {
            scene,
            camera,
            frames: FrameTimer::new(120),
            show_hud: true,
            last_frame: Instant::now(),
        })
    }

    fn update(&mut self, dt: f32) {
        self.scene.tick(dt);
        self.frames.record_secs(dt);
        self.camera.follow(RenderView::from_scene(&self.scene));
    }

    fn handle_key(&mut self, key: KeyCode, event_loop: &ActiveEventLoop) {
        match key {
            KeyCode::F1 => self.show_hud = !self.show_hud,
            KeyCode::Escape => event_loop.exit(),
            _ => {}
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let surface = self.scene.surface();
        let rig = self.scene.rig();

        egui::SidePanel::left("hud")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Tumbler");
                ui.separator();
                ui.label(format!(
                    "Frame: {}  ({:.1}s)",
                    self.scene.frame(),
                    self.scene.elapsed()
                ));
                ui.label(format!(
                    "FPS: {:.0}  avg {:.2} ms  max {:.2} ms",
                    self.frames.fps(),
                    self.frames.average().as_secs_f64() * 1000.0,
                    self.frames.max().as_secs_f64() * 1000.0
                ));
                ui.separator();

                ui.heading("Surface");
                ui.label(format!(
                    "Vertices: {}  Triangles: {}",
                    surface.vertex_count(),
                    surface.indices().len() / 3
                ));
                ui.label(format!("Rotation: {:.4} rad", surface.rotation()));
                ui.separator();

                ui.heading("Player");
                let status = if rig.is_loading() {
                    "loading"
                } else {
                    rig.visual().label()
                };
                ui.label(format!("Visual: {status}"));
                match rig.mixer().and_then(|m| m.active()) {
                    Some(action) => {
                        ui.label(format!(
                            "Clip #{} {}",
                            action.clip_index,
                            action.name.as_deref().unwrap_or("<unnamed>")
                        ));
                        ui.label(format!("t = {:.2} / {:.2}", action.time, action.duration));
                    }
                    None => {
                        ui.label("Clip: none");
                    }
                }

                ui.separator();
                ui.small("F1: Toggle HUD | Esc: Quit");
            });
    }
}

/// Window and GPU resources, created once the event loop resumes.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, scene: &Scene) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Tumbler")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tumbler_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer =
            WgpuRenderer::new(&device, surface_format, config.width, config.height, scene);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.config.width = width.max(1);
        self.config.height = height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw_hud(&mut self, egui_ctx: &EguiContext, state: &AppState, view: &wgpu::TextureView) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.state.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.state.last_frame = now;
        self.state.update(dt);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let lighting = SceneLighting::from_scene(&self.state.scene);
        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &self.state.camera,
            &self.state.scene,
            &lighting,
        );
        gpu.draw_hud(&self.egui_ctx, &self.state, &view);

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.scene) {
            Ok(gpu) => {
                self.state
                    .camera
                    .set_viewport(gpu.config.width, gpu.config.height);
                self.gpu = Some(gpu);
            }
            Err(e) => {
                tracing::error!("failed to initialise graphics: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size.width, new_size.height);
                    self.state
                        .camera
                        .set_viewport(gpu.config.width, gpu.config.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state.handle_key(key, event_loop);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let mut config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    if let Some(model) = cli.model {
        config.rig.model_path = model;
    }
    let seed = cli.seed.unwrap_or_else(rand::random);

    tracing::info!(seed, model = %config.rig.model_path, "tumbler-desktop starting");

    let state = AppState::new(config, seed)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
