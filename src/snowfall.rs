use std::{
    cell::Cell,
    rc::Rc,
    sync::{
        mpsc::{self, Receiver, TryRecvError},
        Arc,
    },
};

use log::{debug, info};
use rand::Rng;

use crate::{
    config::SnowfallConfig,
    error::{Result, SnowfallError},
    material::{PointCloud, SnowMaterial, SnowUniforms},
    particle::ParticleSet,
    texture::{SnowflakeTexture, TextureLoader},
    viewport::{ListenerId, Viewport, ViewportMetrics},
};

/// Fraction of the viewport height a flake covers at unit `scale / distance`.
pub const PARTICLE_SIZE: f32 = 0.006;

/// Falling snow inside a `width x height x depth` box.
///
/// The particle buffers only hold the rest pose; `snow.wgsl` derives the
/// current position of every flake from the elapsed time.
pub struct SnowfallEffect {
    system: PointCloud,

    size: Rc<Cell<f32>>,
    resize_listener: Option<ListenerId>,
    texture_rx: Option<Receiver<Result<SnowflakeTexture>>>,
}

impl SnowfallEffect {
    pub fn new(
        config: &SnowfallConfig,
        viewport: &mut Viewport,
        loader: &dyn TextureLoader,
    ) -> Result<Self> {
        Self::with_rng(config, viewport, loader, &mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(
        config: &SnowfallConfig,
        viewport: &mut Viewport,
        loader: &dyn TextureLoader,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;

        let (tx, rx) = mpsc::channel();
        loader.load(
            &config.texture_path,
            Box::new(move |result| {
                // The effect may already be gone
                let _ = tx.send(result);
            }),
        );

        let size = Rc::new(Cell::new(particle_size_for(&viewport.metrics())));
        let weak_size = Rc::downgrade(&size);
        let resize_listener = viewport.add_resize_listener(Box::new(move |metrics| {
            let Some(size) = weak_size.upgrade() else {
                return false;
            };
            size.set(particle_size_for(metrics));
            debug!("Snow particle size is now {}", size.get());
            true
        }));

        let geometry = ParticleSet::generate(
            rng,
            config.num_particles,
            config.height,
            config.width,
            config.depth,
        )?;

        let uniforms = SnowUniforms::new(&config.appearance, config.height, size.get());
        let system = PointCloud::new(geometry, SnowMaterial::new(uniforms));
        debug!(
            "Created {} snow particles, bounding sphere {{ center: {}, radius: {} }}",
            system.geometry.len(),
            system.bounding_sphere.center,
            system.bounding_sphere.radius
        );

        Ok(Self {
            system,
            size,
            resize_listener: Some(resize_listener),
            texture_rx: Some(rx),
        })
    }

    /// Recomputes the cached particle size. Takes effect on the next [`update`](Self::update).
    pub fn set_particle_size(&self, metrics: &ViewportMetrics) {
        self.size.set(particle_size_for(metrics));
    }

    /// Cached size, depends on the viewport.
    pub fn particle_size(&self) -> f32 {
        self.size.get()
    }

    pub fn update(&mut self, _delta: f32, elapsed: f32) {
        let uniforms = &mut self.system.material.uniforms;
        uniforms.elapsed_time = elapsed;
        uniforms.size = self.size.get();
    }

    /// Binds the texture if its load finished since the last call.
    ///
    /// Returns `Some` exactly once, when the load resolves. On failure the
    /// effect keeps rendering without a texture.
    pub fn poll_texture(&mut self) -> Option<Result<()>> {
        let rx = self.texture_rx.as_ref()?;

        let result = match rx.try_recv() {
            Ok(Ok(texture)) => {
                info!(
                    "Snowflake texture bound: {{ width: {}, height: {} }}",
                    texture.width, texture.height
                );
                self.system.material.texture = Some(Arc::new(texture));
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(SnowfallError::TextureCancelled),
        };

        self.texture_rx = None;
        Some(result)
    }

    /// Stops listening for resizes. Call before removing the effect from the scene.
    pub fn dispose(&mut self, viewport: &mut Viewport) {
        if let Some(id) = self.resize_listener.take() {
            viewport.remove_resize_listener(id);
        }
    }

    pub fn system(&self) -> &PointCloud {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut PointCloud {
        &mut self.system
    }

    pub fn uniforms(&self) -> &SnowUniforms {
        &self.system.material.uniforms
    }

    pub fn has_texture(&self) -> bool {
        self.system.material.texture.is_some()
    }
}

fn particle_size_for(metrics: &ViewportMetrics) -> f32 {
    metrics.inner_height * PARTICLE_SIZE * metrics.device_pixel_ratio
}
