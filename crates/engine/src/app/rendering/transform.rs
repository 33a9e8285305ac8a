use crate::app::Camera2D;
use crate::assembly::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Side view: world x to the right, world y up, depth ignored.
pub fn world_to_screen(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let ppw = camera.pixels_per_world;
    let x = (world.x - camera.position.x) * ppw + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.y - camera.position.y) * ppw;
    (x.round() as i32, y.round() as i32)
}

pub fn screen_to_world(screen_px: Vec2, camera: &Camera2D, viewport: Viewport) -> Vec2 {
    let ppw = if camera.pixels_per_world > 0.0 {
        camera.pixels_per_world
    } else {
        1.0
    };
    Vec2 {
        x: (screen_px.x - viewport.width as f32 * 0.5) / ppw + camera.position.x,
        y: (viewport.height as f32 * 0.5 - screen_px.y) / ppw + camera.position.y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(x: f32, y: f32, ppw: f32) -> Camera2D {
        Camera2D {
            position: Vec2 { x, y },
            pixels_per_world: ppw,
        }
    }

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = camera_at(3.0, 2.0, 32.0);
        assert_eq!(world_to_screen(Vec2 { x: 3.0, y: 2.0 }, &camera, viewport), (400, 300));
    }

    #[test]
    fn world_up_is_screen_up() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let camera = camera_at(10.0, -5.0, 10.0);
        assert_eq!(
            world_to_screen(Vec2 { x: 12.0, y: -4.0 }, &camera, viewport),
            (420, 290)
        );
    }

    #[test]
    fn screen_to_world_inverts_world_to_screen() {
        let viewport = Viewport {
            width: 1280,
            height: 720,
        };
        let camera = camera_at(0.0, 2.0, 80.0);
        let world = screen_to_world(Vec2 { x: 720.0, y: 200.0 }, &camera, viewport);
        assert_eq!(world_to_screen(world, &camera, viewport), (720, 200));
    }
}
