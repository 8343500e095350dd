use serde::{Deserialize, Serialize};

/// Point or direction on the track plane.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::AddAssign,
    derive_more::Mul,
)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians counter-clockwise from +x.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self { x: cos, y: sin }
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }
}

/// Annular track centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl Ring {
    #[must_use]
    pub fn mid_radius(&self) -> f32 {
        (self.inner_radius + self.outer_radius) / 2.0
    }

    /// Whether a disc of `radius` at `center` touches either wall.
    #[must_use]
    pub fn touches_wall(&self, center: Vec2, radius: f32) -> bool {
        let r = center.length();
        r - radius <= self.inner_radius || r + radius >= self.outer_radius
    }

    /// Distance along the unit direction `dir` from `origin` to the nearest wall.
    ///
    /// Returns `None` when nothing is hit, which can only happen for a ray starting
    /// outside the outer wall.
    #[must_use]
    pub fn ray_distance(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        [self.inner_radius, self.outer_radius]
            .into_iter()
            .filter_map(|radius| ray_circle(origin, dir, radius))
            .min_by(f32::total_cmp)
    }
}

/// Smallest non-negative `t` with `|origin + t·dir| = radius`, for unit `dir`.
fn ray_circle(origin: Vec2, dir: Vec2, radius: f32) -> Option<f32> {
    let b = origin.dot(dir);
    let c = origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let root = discriminant.sqrt();
    [-b - root, -b + root].into_iter().find(|t| *t >= 0.0)
}
