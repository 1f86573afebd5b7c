mod cli;
mod framepace;
mod gpu;

use std::sync::Arc;

use clap::Parser;
use framepace::FrameClock;
use gpu::GpuContext;
use log::{error, info, warn};
use snowfall::{
    camera::OrbitCamera, AsyncTextureLoader, SnowRenderer, SnowfallConfig, SnowfallEffect,
    Viewport, ViewportMetrics,
};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Collect Arguments
    let args = cli::Args::parse();
    let config = args.config();
    config.validate()?;

    // Setup Winit
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let tokio_rt = tokio::runtime::Runtime::new()?;
    let mut app_state = AppState {
        texture_loader: AsyncTextureLoader::new(tokio_rt.handle().clone()),
        tokio_rt,
        gfx: None,
        clock: FrameClock::new(),

        config,
        framerate: args.framerate,
    };

    event_loop.run_app(&mut app_state)?;
    Ok(())
}

struct GfxState {
    window: Arc<Window>,
    gpu: GpuContext<'static>,
    viewport: Viewport,
    camera: OrbitCamera,

    effect: SnowfallEffect,
    renderer: SnowRenderer,
}

struct AppState {
    tokio_rt: tokio::runtime::Runtime,
    texture_loader: AsyncTextureLoader,
    gfx: Option<GfxState>,
    clock: FrameClock,

    config: SnowfallConfig,
    framerate: u32,
}

impl AppState {
    fn create_gfx(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<GfxState> {
        let window = Arc::new(
            event_loop.create_window(Window::default_attributes().with_title("Snowfall"))?,
        );
        let window_size = window.inner_size();

        let gpu = self.tokio_rt.block_on(GpuContext::new(window.clone()))?;
        let mut viewport = Viewport::new(ViewportMetrics::from_physical(
            window_size.height,
            window.scale_factor(),
        ));

        let effect = SnowfallEffect::new(&self.config, &mut viewport, &self.texture_loader)?;
        let renderer = SnowRenderer::new(&gpu.device, &gpu.queue, gpu.swapchain_format(), &effect);
        let camera = OrbitCamera::for_volume(self.config.height, self.config.width, self.config.depth);

        info!(
            "Snowfall ready: {{ particles: {}, surface: {}x{}, format: {:?} }}",
            self.config.num_particles,
            gpu.config.width,
            gpu.config.height,
            gpu.swapchain_format()
        );

        Ok(GfxState {
            window,
            gpu,
            viewport,
            camera,

            effect,
            renderer,
        })
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gfx.is_some() {
            return;
        }

        match self.create_gfx(event_loop) {
            Ok(gfx) => self.gfx = Some(gfx),
            Err(err) => {
                error!("Failed to start: {err:#}");
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
        let Some(gfx) = &mut self.gfx else {
            return;
        };

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                gfx.effect.dispose(&mut gfx.viewport);
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                gfx.gpu.resize(new_size.width, new_size.height);
                gfx.viewport.resize(ViewportMetrics::from_physical(
                    new_size.height,
                    gfx.window.scale_factor(),
                ));
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                gfx.viewport.resize(ViewportMetrics::from_physical(
                    gfx.window.inner_size().height,
                    scale_factor,
                ));
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(gfx) = &mut self.gfx else {
            return;
        };

        if let Some(Err(err)) = gfx.effect.poll_texture() {
            warn!("Rendering snow without a texture: {err}");
        }

        let (delta, elapsed) = self.clock.begin_frame();
        gfx.effect.update(delta, elapsed);

        let frame = match gfx.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gfx.gpu.reconfigure_surface();
                return;
            }
            Err(err) => {
                warn!("Skipping frame: {err}");
                return;
            }
        };

        let (width, height) = (gfx.gpu.config.width, gfx.gpu.config.height);
        gfx.renderer.prepare(
            &gfx.gpu.device,
            &gfx.gpu.queue,
            &gfx.effect,
            gfx.camera.view(elapsed),
            gfx.camera.projection(width, height),
            [width, height],
        );

        let mut encoder = gfx
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        // Render
        {
            let view = frame
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());

            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            gfx.renderer.draw(&mut rpass);
        }

        gfx.gpu.queue.submit(Some(encoder.finish()));
        frame.present();

        self.clock.end_frame(self.framerate);
    }
}
