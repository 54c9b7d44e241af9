//! Pointer events to pending disturbances.

use bevy::{
    input::touch::{TouchInput, TouchPhase},
    prelude::*,
    window::CursorMoved,
};
use shared::water::{map_pointer, CameraView, PendingDisturbance, ProxySurface};

use super::{mesh::PointerProxy, simulation::SurfaceGrid};
use crate::camera::WaterCamera;

/// The first active touch; other fingers are ignored until it lifts.
#[derive(Resource, Debug, Default)]
pub struct PrimaryTouch {
    id: Option<u64>,
}

impl PrimaryTouch {
    /// Position to use as the pointer for `event`, if it belongs to the
    /// primary touch.
    pub fn track(&mut self, event: &TouchInput) -> Option<Vec2> {
        match event.phase {
            TouchPhase::Started => {
                if self.id.is_some() {
                    return None;
                }
                self.id = Some(event.id);
                Some(event.position)
            }
            TouchPhase::Moved => (self.id == Some(event.id)).then_some(event.position),
            TouchPhase::Ended | TouchPhase::Canceled => {
                if self.id == Some(event.id) {
                    self.id = None;
                }
                None
            }
        }
    }
}

/// Maps the newest pointer position of this frame into field space.
///
/// Runs only when the pointer moved; the sample replaces whatever was
/// pending.
pub fn record_pointer_disturbance(
    mut cursor_moved: EventReader<CursorMoved>,
    mut touch_events: EventReader<TouchInput>,
    mut primary_touch: ResMut<PrimaryTouch>,
    camera: Query<(&Camera, &GlobalTransform), With<WaterCamera>>,
    proxy: Query<&GlobalTransform, With<PointerProxy>>,
    grid: Res<SurfaceGrid>,
    mut pending: ResMut<PendingDisturbance>,
) {
    let mut pointer = cursor_moved.read().last().map(|event| event.position);
    for event in touch_events.read() {
        if let Some(position) = primary_touch.track(event) {
            pointer = Some(position);
        }
    }
    let Some(pointer) = pointer else {
        return;
    };

    let (Ok((camera, camera_transform)), Ok(proxy_transform)) = (camera.single(), proxy.single())
    else {
        return;
    };
    let Some(viewport) = camera.logical_viewport_rect() else {
        return;
    };

    let view = CameraView::new(camera_transform.compute_matrix(), camera.clip_from_view());
    let surface = ProxySurface::new(proxy_transform.translation(), grid.extent());
    pending.record(map_pointer(
        pointer - viewport.min,
        viewport.size(),
        &view,
        &surface,
        &grid.0,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(id: u64, phase: TouchPhase, x: f32) -> TouchInput {
        TouchInput {
            phase,
            position: Vec2::new(x, 0.0),
            window: Entity::PLACEHOLDER,
            force: None,
            id,
        }
    }

    #[test]
    fn test_second_finger_is_ignored() {
        let mut primary = PrimaryTouch::default();
        assert_eq!(
            primary.track(&touch(1, TouchPhase::Started, 10.0)),
            Some(Vec2::new(10.0, 0.0))
        );
        assert_eq!(primary.track(&touch(2, TouchPhase::Started, 50.0)), None);
        assert_eq!(primary.track(&touch(2, TouchPhase::Moved, 55.0)), None);
        assert_eq!(
            primary.track(&touch(1, TouchPhase::Moved, 12.0)),
            Some(Vec2::new(12.0, 0.0))
        );
    }

    #[test]
    fn test_primary_is_released_on_end() {
        let mut primary = PrimaryTouch::default();
        primary.track(&touch(1, TouchPhase::Started, 0.0));
        // Ending a secondary touch keeps the primary.
        primary.track(&touch(2, TouchPhase::Ended, 0.0));
        assert_eq!(
            primary.track(&touch(1, TouchPhase::Moved, 1.0)),
            Some(Vec2::new(1.0, 0.0))
        );

        assert_eq!(primary.track(&touch(1, TouchPhase::Canceled, 0.0)), None);
        assert_eq!(
            primary.track(&touch(3, TouchPhase::Started, 7.0)),
            Some(Vec2::new(7.0, 0.0))
        );
    }
}
