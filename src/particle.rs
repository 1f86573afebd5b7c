use glam::Vec3;
use rand::Rng;

use crate::{config::check_volume, error::Result, material::SnowUniforms};

/// Sphere enclosing a set of points, for culling.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn contains(&self, point: Vec3) -> bool {
        point.distance(self.center) <= self.radius
    }
}

/// Time-zero pose of every snowflake.
///
/// Both buffers are laid out exactly as they are uploaded: `positions` holds
/// `x, y, z` triples and `uniqueness` one phase offset per particle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSet {
    positions: Vec<f32>,
    uniqueness: Vec<f32>,
}

impl ParticleSet {
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        num_particles: usize,
        height: f32,
        width: f32,
        depth: f32,
    ) -> Result<Self> {
        // rand panics on an empty or non-finite range
        check_volume(height, width, depth)?;

        let mut positions = Vec::with_capacity(num_particles * 3);
        for _ in 0..num_particles {
            positions.push(rand_center(rng, width));
            positions.push(rng.gen_range(0.0..height));
            positions.push(rand_center(rng, depth));
        }

        // Desynchronizes the drift so neighbouring flakes don't sway in lockstep
        let uniqueness = (0..num_particles).map(|_| rng.gen::<f32>()).collect();

        Ok(Self {
            positions,
            uniqueness,
        })
    }

    pub fn len(&self) -> usize {
        self.uniqueness.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uniqueness.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn uniqueness(&self) -> &[f32] {
        &self.uniqueness
    }

    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * 3..index * 3 + 3])
    }

    fn extent(&self) -> Option<(Vec3, Vec3)> {
        (0..self.len()).map(|i| self.position(i)).fold(None, |acc, p| {
            Some(match acc {
                Some((min, max)) => (min.min(p), max.max(p)),
                None => (p, p),
            })
        })
    }

    /// Smallest sphere around the bounding box of the rest pose.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let Some((min, max)) = self.extent() else {
            return BoundingSphere::default();
        };

        let center = (min + max) * 0.5;
        let radius = (0..self.len())
            .map(|i| self.position(i).distance_squared(center))
            .fold(0.0f32, f32::max)
            .sqrt();

        BoundingSphere { center, radius }
    }

    /// Sphere around every position [`position_at`](Self::position_at) can return:
    /// the rest pose widened by the drift radius and the full fall height.
    pub fn swept_bounding_sphere(&self, uniforms: &SnowUniforms) -> BoundingSphere {
        let Some((min, max)) = self.extent() else {
            return BoundingSphere::default();
        };

        let drift = uniforms.radius.abs();
        let min = Vec3::new(min.x - drift, 0.0, min.z - drift);
        let max = Vec3::new(max.x + drift, uniforms.height, max.z + drift);

        BoundingSphere {
            center: (min + max) * 0.5,
            radius: min.distance(max) * 0.5,
        }
    }

    /// Where the vertex stage draws particle `index` for the given uniforms.
    ///
    /// Mirrors `vertex` in `snow.wgsl`; the renderer never calls this.
    pub fn position_at(&self, index: usize, uniforms: &SnowUniforms) -> Vec3 {
        let base = self.position(index);
        let uniqueness = self.uniqueness[index];
        let t = uniforms.elapsed_time;

        let fall = base.y - t * uniforms.speed_v;
        Vec3::new(
            base.x + ((t - base.z - uniqueness) * uniforms.speed_h).cos() * uniforms.radius,
            fall - uniforms.height * (fall / uniforms.height).floor(),
            base.z + ((t - base.x - uniqueness) * uniforms.speed_h).sin() * uniforms.radius,
        )
    }
}

fn rand_center<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    let half = extent * 0.5;
    rng.gen_range(-half..=half)
}
