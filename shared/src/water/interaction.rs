//! Pointer to field-space mapping.
//!
//! A pointer position in window pixels becomes normalized device
//! coordinates, then a world-space ray from the camera, which is intersected
//! with an invisible proxy plane matching the surface footprint. The hit
//! point is converted into field coordinates with the fixed `W / B` scale.
//!
//! The proxy is flat and undisplaced, so the mapping does not depend on the
//! current shape of the water.

use bevy::math::{primitives::InfinitePlane3d, Dir3, Mat4, Ray3d, Vec2, Vec3, Vec3Swizzles};
use bevy::prelude::Resource;
use thiserror::Error;

use super::grid::GridConfig;
use super::kernel::Disturbance;

/// Why a pointer sample produced no disturbance. Always recovered locally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MapFailure {
    #[error("viewport has zero or non-finite size")]
    DegenerateViewport,
    #[error("camera matrices produced no usable ray")]
    DegenerateRay,
    #[error("ray is parallel to or points away from the proxy surface")]
    NoIntersection,
    #[error("ray hits the proxy plane outside the surface footprint")]
    OutsideSurface,
}

/// Converts a pixel position (origin top-left, y down) into NDC.
pub fn pointer_to_ndc(pointer: Vec2, viewport: Vec2) -> Result<Vec2, MapFailure> {
    if !(viewport.x > 0.0 && viewport.y > 0.0) || !viewport.is_finite() {
        return Err(MapFailure::DegenerateViewport);
    }
    Ok(Vec2::new(
        pointer.x / viewport.x * 2.0 - 1.0,
        -(pointer.y / viewport.y) * 2.0 + 1.0,
    ))
}

/// The camera state the mapper needs: where it sits and how it projects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    world_from_view: Mat4,
    clip_from_view: Mat4,
}

impl CameraView {
    pub fn new(world_from_view: Mat4, clip_from_view: Mat4) -> Self {
        Self {
            world_from_view,
            clip_from_view,
        }
    }

    /// Ray from the near plane through `ndc`.
    ///
    /// Assumes a reverse-Z projection, where NDC depth 1 is the near plane
    /// and depth 0 lies at infinity.
    pub fn ray_through(&self, ndc: Vec2) -> Result<Ray3d, MapFailure> {
        let ndc_to_world = self.world_from_view * self.clip_from_view.inverse();
        let near = ndc_to_world.project_point3(ndc.extend(1.0));
        // Depth 0 is at infinity; EPSILON keeps the projection finite.
        let far = ndc_to_world.project_point3(ndc.extend(f32::EPSILON));
        let direction = Dir3::new(far - near).map_err(|_| MapFailure::DegenerateRay)?;
        if !near.is_finite() {
            return Err(MapFailure::DegenerateRay);
        }
        Ok(Ray3d::new(near, direction))
    }
}

/// Invisible horizontal plane with the same footprint as the render mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProxySurface {
    /// World position of the surface center.
    pub center: Vec3,
    /// Side length in world units.
    pub extent: f32,
}

impl ProxySurface {
    pub fn new(center: Vec3, extent: f32) -> Self {
        Self { center, extent }
    }

    /// World-space hit point of `ray`, if it lands inside the footprint.
    pub fn intersect(&self, ray: Ray3d) -> Result<Vec3, MapFailure> {
        let distance = ray
            .intersect_plane(self.center, InfinitePlane3d::new(Vec3::Y))
            .ok_or(MapFailure::NoIntersection)?;
        let point = ray.get_point(distance);
        let offset = (point - self.center).xz();
        let half = self.extent * 0.5;
        if offset.x.abs() > half || offset.y.abs() > half {
            return Err(MapFailure::OutsideSurface);
        }
        Ok(point)
    }
}

/// Full pipeline from pixel position to field coordinates.
pub fn try_map_pointer(
    pointer: Vec2,
    viewport: Vec2,
    camera: &CameraView,
    proxy: &ProxySurface,
    grid: &GridConfig,
) -> Result<Vec2, MapFailure> {
    let ndc = pointer_to_ndc(pointer, viewport)?;
    let ray = camera.ray_through(ndc)?;
    let hit = proxy.intersect(ray)?;
    let field = grid.world_to_field((hit - proxy.center).xz());
    // Hits exactly on the far edge land on W; fold them back onto the torus.
    let w = grid.resolution() as f32;
    Ok(Vec2::new(field.x.rem_euclid(w), field.y.rem_euclid(w)))
}

/// Like [`try_map_pointer`], but degrades every failure to "no disturbance".
pub fn map_pointer(
    pointer: Vec2,
    viewport: Vec2,
    camera: &CameraView,
    proxy: &ProxySurface,
    grid: &GridConfig,
) -> Disturbance {
    match try_map_pointer(pointer, viewport, camera, proxy, grid) {
        Ok(field) => Some(field),
        Err(failure) => {
            bevy_log::debug!("Pointer {} not mapped: {}", pointer, failure);
            None
        }
    }
}

/// The only state shared between pointer events and the simulation step.
///
/// The mapper records a sample on every pointer move; the frame driver takes
/// it exactly once per step. The moved flag and the coordinate live in one
/// `Option`, so a reader can never see one without the other.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct PendingDisturbance {
    moved: Option<Disturbance>,
}

impl PendingDisturbance {
    /// Marks the pointer as moved. Later samples in the same frame replace
    /// earlier ones.
    pub fn record(&mut self, disturbance: Disturbance) {
        self.moved = Some(disturbance);
    }

    pub fn is_moved(&self) -> bool {
        self.moved.is_some()
    }

    /// Reads and clears. Returns `None` when nothing moved since the last take.
    pub fn take(&mut self) -> Disturbance {
        self.moved.take().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn camera_at(eye: Vec3, target: Vec3, up: Vec3) -> CameraView {
        let world_from_view = Mat4::look_at_rh(eye, target, up).inverse();
        let clip_from_view = Mat4::perspective_infinite_reverse_rh(
            40f32.to_radians(),
            VIEWPORT.x / VIEWPORT.y,
            0.1,
        );
        CameraView::new(world_from_view, clip_from_view)
    }

    fn top_down() -> CameraView {
        camera_at(Vec3::new(0.0, 750.0, 0.0), Vec3::ZERO, Vec3::NEG_Z)
    }

    fn proxy() -> ProxySurface {
        ProxySurface::new(Vec3::ZERO, 512.0)
    }

    #[test]
    fn test_ndc_conversion() {
        assert_eq!(
            pointer_to_ndc(VIEWPORT * 0.5, VIEWPORT).unwrap(),
            Vec2::ZERO
        );
        assert_eq!(
            pointer_to_ndc(Vec2::ZERO, VIEWPORT).unwrap(),
            Vec2::new(-1.0, 1.0)
        );
        assert_eq!(
            pointer_to_ndc(VIEWPORT, VIEWPORT).unwrap(),
            Vec2::new(1.0, -1.0)
        );
    }

    #[test]
    fn test_zero_viewport_is_degenerate() {
        assert_eq!(
            pointer_to_ndc(Vec2::ZERO, Vec2::new(0.0, 720.0)),
            Err(MapFailure::DegenerateViewport)
        );
        let grid = GridConfig::default();
        assert_eq!(
            map_pointer(Vec2::ZERO, Vec2::ZERO, &top_down(), &proxy(), &grid),
            None
        );
    }

    #[test]
    fn test_screen_center_maps_to_field_center() {
        let grid = GridConfig::new(128, 512.0).unwrap();
        let field = map_pointer(VIEWPORT * 0.5, VIEWPORT, &top_down(), &proxy(), &grid).unwrap();
        assert!((field - Vec2::new(64.0, 64.0)).length() <= 1.0, "{field}");
    }

    #[test]
    fn test_oblique_camera_center_maps_to_field_center() {
        let grid = GridConfig::new(256, 512.0).unwrap();
        let camera = camera_at(Vec3::new(0.0, 300.0, 400.0), Vec3::ZERO, Vec3::Y);
        let field = map_pointer(VIEWPORT * 0.5, VIEWPORT, &camera, &proxy(), &grid).unwrap();
        assert!((field - Vec2::splat(128.0)).length() <= 1.0, "{field}");
    }

    #[test]
    fn test_projected_world_point_maps_back() {
        let grid = GridConfig::new(128, 512.0).unwrap();
        let camera = camera_at(Vec3::new(0.0, 300.0, 400.0), Vec3::ZERO, Vec3::Y);
        let target = Vec3::new(100.0, 0.0, -50.0);

        let clip_from_world = camera.clip_from_view * camera.world_from_view.inverse();
        let ndc = clip_from_world.project_point3(target).truncate();
        let pixel = Vec2::new(
            (ndc.x + 1.0) * 0.5 * VIEWPORT.x,
            (1.0 - ndc.y) * 0.5 * VIEWPORT.y,
        );

        let field = map_pointer(pixel, VIEWPORT, &camera, &proxy(), &grid).unwrap();
        assert!((field - Vec2::new(89.0, 51.5)).length() < 0.05, "{field}");
    }

    #[test]
    fn test_stationary_pointer_is_idempotent() {
        let grid = GridConfig::default();
        let pointer = Vec2::new(700.0, 300.0);
        let a = map_pointer(pointer, VIEWPORT, &top_down(), &proxy(), &grid);
        let b = map_pointer(pointer, VIEWPORT, &top_down(), &proxy(), &grid);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_miss_outside_footprint() {
        let grid = GridConfig::default();
        let small = ProxySurface::new(Vec3::ZERO, 10.0);
        assert_eq!(
            try_map_pointer(Vec2::new(10.0, 10.0), VIEWPORT, &top_down(), &small, &grid),
            Err(MapFailure::OutsideSurface)
        );
    }

    #[test]
    fn test_camera_facing_away_misses() {
        let grid = GridConfig::default();
        let camera = camera_at(Vec3::new(0.0, 100.0, 0.0), Vec3::new(0.0, 200.0, 0.0), Vec3::Z);
        assert_eq!(
            try_map_pointer(VIEWPORT * 0.5, VIEWPORT, &camera, &proxy(), &grid),
            Err(MapFailure::NoIntersection)
        );
    }

    #[test]
    fn test_proxy_offset_is_respected() {
        let grid = GridConfig::new(128, 512.0).unwrap();
        let shifted = ProxySurface::new(Vec3::new(50.0, -10.0, 0.0), 512.0);
        let camera = camera_at(Vec3::new(50.0, 500.0, 0.0), Vec3::new(50.0, -10.0, 0.0), Vec3::NEG_Z);
        let field = map_pointer(VIEWPORT * 0.5, VIEWPORT, &camera, &shifted, &grid).unwrap();
        assert!((field - Vec2::splat(64.0)).length() <= 1.0);
    }

    #[test]
    fn test_pending_disturbance_is_taken_once() {
        let mut pending = PendingDisturbance::default();
        assert!(!pending.is_moved());
        assert_eq!(pending.take(), None);

        pending.record(Some(Vec2::new(3.0, 4.0)));
        pending.record(Some(Vec2::new(5.0, 6.0)));
        assert!(pending.is_moved());
        assert_eq!(pending.take(), Some(Vec2::new(5.0, 6.0)));
        assert_eq!(pending.take(), None);
    }

    #[test]
    fn test_recorded_miss_clears_the_slot() {
        let mut pending = PendingDisturbance::default();
        pending.record(None);
        assert!(pending.is_moved());
        assert_eq!(pending.take(), None);
        assert!(!pending.is_moved());
    }
}
