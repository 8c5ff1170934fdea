use crate::camera::PerspectiveCamera;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;

/// Something that moves the camera once per frame.
pub trait CameraControls {
    /// Advance one step. Returns true if the camera moved.
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    pub enable_damping: bool,
    /// Fraction of the pending motion applied per update when damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: Option<f32>,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

/// Orbit camera controls: rotate around the target, pan it, dolly toward it.
///
/// Input accumulates pending motion; [`update`](CameraControls::update)
/// applies it. With damping on, each update applies `damping_factor` of the
/// pending rotation and pan and decays the rest, so motion eases out over
/// subsequent frames.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub config: OrbitConfig,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
    drag: Option<(DragMode, Vec2)>,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: None,
            viewport_height: 720.0,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Move the target along the camera's screen axes, in world units.
    pub fn pan(&mut self, camera: &PerspectiveCamera, right: f32, up: f32) {
        self.pan_offset += camera.right() * -right + camera.up() * up;
    }

    /// Scale the orbit radius by `factor` on the next update; below 1 moves closer.
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub fn pointer_down(&mut self, mode: DragMode, pos: Vec2) {
        self.drag = Some((mode, pos));
    }

    pub fn pointer_move(&mut self, camera: &PerspectiveCamera, pos: Vec2) {
        let Some((mode, last)) = self.drag else {
            return;
        };
        let delta = pos - last;
        self.drag = Some((mode, pos));
        match mode {
            DragMode::Rotate => {
                let d = delta * self.config.rotate_speed;
                self.rotate_left(TAU * d.x / self.viewport_height);
                self.rotate_up(TAU * d.y / self.viewport_height);
            }
            DragMode::Pan => {
                let d = delta * self.config.pan_speed;
                let half_fov = (camera.fov_degrees.to_radians() / 2.0).tan();
                let world_per_px = 2.0 * camera.distance() * half_fov / self.viewport_height;
                self.pan(camera, d.x * world_per_px, d.y * world_per_px);
            }
        }
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Mouse wheel; negative `delta_y` (scrolling up) moves closer.
    pub fn wheel(&mut self, delta_y: f32) {
        let step = 0.95_f32.powf(self.config.zoom_speed);
        if delta_y < 0.0 {
            self.dolly(step);
        } else if delta_y > 0.0 {
            self.dolly(1.0 / step);
        }
    }

    /// True while there is pending motion left to apply.
    pub fn is_moving(&self) -> bool {
        self.delta_theta.abs() > EPS
            || self.delta_phi.abs() > EPS
            || self.pan_offset.length_squared() > EPS * EPS
            || (self.scale - 1.0).abs() > EPS
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

impl CameraControls for OrbitControls {
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let offset = camera.position - camera.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let step = if self.config.enable_damping {
            self.config.damping_factor
        } else {
            1.0
        };
        theta += self.delta_theta * step;
        phi = (phi + self.delta_phi * step).clamp(EPS, PI - EPS);
        radius *= self.scale;
        radius = radius.max(self.config.min_distance);
        if let Some(max) = self.config.max_distance {
            radius = radius.min(max);
        }
        camera.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + offset;

        if self.config.enable_damping {
            let keep = 1.0 - self.config.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > EPS
    }
}
