use glam::{Mat4, Vec3};

/// Slowly circles a point, looking at it from a fixed height.
pub struct OrbitCamera {
    pub target: Vec3,
    pub distance: f32,
    pub elevation: f32,
    /// Radians per second
    pub angular_speed: f32,
    pub fov_y: f32,
}

impl OrbitCamera {
    /// Frames a snow volume of the given size from inside its upper half.
    pub fn for_volume(height: f32, width: f32, depth: f32) -> Self {
        Self {
            target: Vec3::new(0.0, height * 0.4, 0.0),
            distance: width.max(depth) * 0.35,
            elevation: height * 0.1,
            angular_speed: 0.05,
            fov_y: 60f32.to_radians(),
        }
    }

    pub fn eye(&self, elapsed: f32) -> Vec3 {
        let angle = elapsed * self.angular_speed;
        self.target
            + Vec3::new(
                angle.sin() * self.distance,
                self.elevation,
                angle.cos() * self.distance,
            )
    }

    pub fn view(&self, elapsed: f32) -> Mat4 {
        Mat4::look_at_rh(self.eye(elapsed), self.target, Vec3::Y)
    }

    pub fn projection(&self, width: u32, height: u32) -> Mat4 {
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        Mat4::perspective_rh(self.fov_y, aspect, 0.01, 1000.0)
    }
}
