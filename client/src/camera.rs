use bevy::prelude::*;
use shared::WaterSettings;

/// The camera pointer rays are cast from.
#[derive(Component)]
pub struct WaterCamera;

/// Oblique view over the whole surface, scaled to its extent.
pub fn camera_transform(extent: f32) -> Transform {
    Transform::from_xyz(0.0, extent * 0.82, extent).looking_at(Vec3::ZERO, Vec3::Y)
}

pub fn spawn_camera(mut commands: Commands, settings: Res<WaterSettings>) {
    commands.spawn((
        Name::new("WaterCamera"),
        WaterCamera,
        Camera3d::default(),
        camera_transform(settings.extent),
    ));

    commands.spawn((
        Name::new("Sun"),
        DirectionalLight {
            illuminance: 8000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(1.0, 2.0, 0.5).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.75, 0.85, 1.0),
        brightness: 250.0,
        ..default()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_looks_at_surface_center() {
        let transform = camera_transform(512.0);
        assert!(transform.translation.y > 0.0);
        let forward = transform.forward();
        // The ray through the view center reaches y = 0 at the origin.
        let t = -transform.translation.y / forward.y;
        let hit = transform.translation + forward * t;
        assert!(hit.length() < 0.5);
    }
}
