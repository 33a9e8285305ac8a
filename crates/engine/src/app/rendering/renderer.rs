use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::{Camera2D, SceneWorld, UnitVisual, CAP_HALF_EXTENTS, SHAFT_HALF_EXTENTS};
use crate::assembly::{Vec2, VisualState};

use super::{world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [20, 22, 28, 255];
const PLATE_COLOR: [u8; 4] = [58, 62, 72, 255];
const PLATE_EDGE_COLOR: [u8; 4] = [88, 94, 108, 255];
const SHAFT_COLOR: [u8; 4] = [150, 154, 162, 255];
const MARKER_COLOR: [u8; 4] = [24, 24, 24, 255];
const PROGRESS_BACK_COLOR: [u8; 4] = [40, 44, 52, 255];
const PROGRESS_FILL_COLOR: [u8; 4] = [90, 200, 250, 255];
const PROGRESS_HALF_WIDTH_WORLD: f32 = 0.5;
const PROGRESS_HEIGHT_PX: i32 = 6;
const PROGRESS_GAP_PX: i32 = 10;
const MARKER_HALF_SIZE_PX: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        draw_scene(self.pixels.frame_mut(), self.viewport, world);
        self.pixels.render()
    }
}

fn draw_scene(frame: &mut [u8], viewport: Viewport, world: &SceneWorld) {
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }
    let camera = world.camera();

    if let Some(plate) = world.plate() {
        let center = Vec2 {
            x: (plate.min.x + plate.max.x) * 0.5,
            y: (plate.min.y + plate.max.y) * 0.5,
        };
        let half = Vec2 {
            x: (plate.max.x - plate.min.x) * 0.5,
            y: (plate.max.y - plate.min.y) * 0.5,
        };
        let rect = world_rect_to_screen(center, half, camera, viewport);
        fill_rect_clipped(frame, viewport, rect, PLATE_COLOR);
        outline_rect_clipped(frame, viewport, rect, PLATE_EDGE_COLOR);
    }

    for visual in world.visuals().iter().filter(|visual| !visual.hidden) {
        draw_unit(frame, viewport, world, visual);
    }

    if let Some((unit, fraction)) = world.hold_progress() {
        let cap_position = world
            .visuals()
            .get(unit)
            .filter(|visual| !visual.hidden)
            .and_then(|visual| world.nodes().world_position(visual.cap));
        if let Some(cap_position) = cap_position {
            draw_progress_bar(frame, viewport, camera, cap_position.xy(), fraction);
        }
    }
}

fn draw_unit(frame: &mut [u8], viewport: Viewport, world: &SceneWorld, visual: &UnitVisual) {
    let camera = world.camera();
    let nodes = world.nodes();
    if let Some(shaft) = nodes.world_position(visual.shaft) {
        let rect = world_rect_to_screen(shaft.xy(), SHAFT_HALF_EXTENTS, camera, viewport);
        fill_rect_clipped(frame, viewport, rect, SHAFT_COLOR);
    }
    let Some(cap) = nodes.world_position(visual.cap) else {
        return;
    };
    let rect = world_rect_to_screen(cap.xy(), CAP_HALF_EXTENTS, camera, viewport);
    fill_rect_clipped(frame, viewport, rect, material_color(visual.material));
    outline_rect_clipped(frame, viewport, rect, MARKER_COLOR);

    // Turns are single-axis, so the summed Euler angles carry the whole turn.
    let turn_degrees = nodes
        .euler_degrees(visual.cap)
        .map_or(0.0, |euler| euler.x + euler.y + euler.z);
    let (cx, cy) = world_to_screen(cap.xy(), camera, viewport);
    let half_width_px = (rect.right - rect.left) / 2;
    let marker_x = cx + (turn_degrees.to_radians().sin() * half_width_px as f32).round() as i32;
    let marker = ScreenRectPx {
        left: marker_x - MARKER_HALF_SIZE_PX,
        right: marker_x + MARKER_HALF_SIZE_PX,
        top: cy - MARKER_HALF_SIZE_PX,
        bottom: cy + MARKER_HALF_SIZE_PX,
    };
    fill_rect_clipped(frame, viewport, marker, MARKER_COLOR);
}

fn draw_progress_bar(
    frame: &mut [u8],
    viewport: Viewport,
    camera: &Camera2D,
    cap_center: Vec2,
    fraction: f32,
) {
    let cap_top = Vec2 {
        x: cap_center.x,
        y: cap_center.y + CAP_HALF_EXTENTS.y,
    };
    let (cx, top_px) = world_to_screen(cap_top, camera, viewport);
    let half_width_px = (PROGRESS_HALF_WIDTH_WORLD * camera.pixels_per_world).round() as i32;
    let back = ScreenRectPx {
        left: cx - half_width_px,
        right: cx + half_width_px,
        top: top_px - PROGRESS_GAP_PX - PROGRESS_HEIGHT_PX,
        bottom: top_px - PROGRESS_GAP_PX,
    };
    fill_rect_clipped(frame, viewport, back, PROGRESS_BACK_COLOR);
    let filled = ((back.right - back.left) as f32 * fraction.clamp(0.0, 1.0)).round() as i32;
    if filled > 0 {
        let fill = ScreenRectPx {
            right: back.left + filled,
            ..back
        };
        fill_rect_clipped(frame, viewport, fill, PROGRESS_FILL_COLOR);
    }
}

fn material_color(visual: VisualState) -> [u8; 4] {
    match visual {
        VisualState::Original => [196, 198, 204, 255],
        VisualState::Highlighted => [250, 214, 72, 255],
        VisualState::Selected => [110, 180, 255, 255],
        VisualState::Correct => [96, 220, 120, 255],
        VisualState::Wrong => [235, 80, 72, 255],
        VisualState::Tightened => [46, 140, 74, 255],
    }
}

fn world_rect_to_screen(
    center: Vec2,
    half_extents: Vec2,
    camera: &Camera2D,
    viewport: Viewport,
) -> ScreenRectPx {
    let (left, top) = world_to_screen(
        Vec2 {
            x: center.x - half_extents.x,
            y: center.y + half_extents.y,
        },
        camera,
        viewport,
    );
    let (right, bottom) = world_to_screen(
        Vec2 {
            x: center.x + half_extents.x,
            y: center.y - half_extents.y,
        },
        camera,
        viewport,
    );
    ScreenRectPx {
        left,
        right,
        top,
        bottom,
    }
}

fn fill_rect_clipped(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let left = rect.left.max(0);
    let top = rect.top.max(0);
    let right = rect.right.min(viewport.width as i32 - 1);
    let bottom = rect.bottom.min(viewport.height as i32 - 1);
    for y in top..=bottom {
        for x in left..=right {
            write_pixel_rgba_clipped(frame, viewport.width as usize, x, y, color);
        }
    }
}

fn outline_rect_clipped(frame: &mut [u8], viewport: Viewport, rect: ScreenRectPx, color: [u8; 4]) {
    let width = viewport.width as usize;
    for x in rect.left..=rect.right {
        write_pixel_rgba_clipped(frame, width, x, rect.top, color);
        write_pixel_rgba_clipped(frame, width, x, rect.bottom, color);
    }
    for y in rect.top..=rect.bottom {
        write_pixel_rgba_clipped(frame, width, rect.left, y, color);
        write_pixel_rgba_clipped(frame, width, rect.right, y, color);
    }
}

fn write_pixel_rgba_clipped(frame: &mut [u8], width: usize, x: i32, y: i32, color: [u8; 4]) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(pixel_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
    else {
        return;
    };
    let Some(byte_offset) = pixel_offset.checked_mul(4) else {
        return;
    };
    let Some(end) = byte_offset.checked_add(4) else {
        return;
    };
    if end > frame.len() {
        return;
    }
    frame[byte_offset..end].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PlateRect;
    use crate::assembly::{AssemblyUnit, FeedbackSink, NodePose, UnitId, Vec3};

    const VIEWPORT: Viewport = Viewport {
        width: 200,
        height: 160,
    };

    fn pixel(frame: &[u8], x: i32, y: i32) -> [u8; 4] {
        let offset = (y as usize * VIEWPORT.width as usize + x as usize) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn world_with_one_bolt() -> SceneWorld {
        let mut world = SceneWorld::default();
        *world.camera_mut() = Camera2D {
            position: Vec2 { x: 0.0, y: 2.0 },
            pixels_per_world: 20.0,
        };
        let nodes = world.nodes_mut();
        let root = nodes
            .insert("bolt", None, NodePose::default())
            .expect("root");
        let shaft = nodes
            .insert(
                "bolt/shaft",
                Some(root),
                NodePose {
                    position: Vec3::new(0.0, 2.4, 0.0),
                    euler_degrees: Vec3::ZERO,
                },
            )
            .expect("shaft");
        let cap = nodes
            .insert(
                "bolt/cap",
                Some(root),
                NodePose {
                    position: Vec3::new(0.0, 3.4, 0.0),
                    euler_degrees: Vec3::ZERO,
                },
            )
            .expect("cap");
        world
            .visuals_mut()
            .push(&AssemblyUnit::new(UnitId(1), cap, shaft));
        world
    }

    #[test]
    fn cap_is_filled_with_its_material_color() {
        let mut world = world_with_one_bolt();
        world
            .visuals_mut()
            .apply_material(UnitId(1), VisualState::Correct);
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        draw_scene(&mut frame, VIEWPORT, &world);

        let (_, cap_y) = world_to_screen(Vec2 { x: 0.0, y: 3.4 }, world.camera(), VIEWPORT);
        // Left of the rotation marker, inside the outline.
        assert_eq!(pixel(&frame, 100 - 5, cap_y), material_color(VisualState::Correct));
        assert_eq!(pixel(&frame, 2, 2), CLEAR_COLOR);
    }

    #[test]
    fn hidden_units_are_not_drawn() {
        let mut world = world_with_one_bolt();
        world.visuals_mut().set_hidden(UnitId(1), true);
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        draw_scene(&mut frame, VIEWPORT, &world);
        let (_, shaft_y) = world_to_screen(Vec2 { x: 0.0, y: 2.4 }, world.camera(), VIEWPORT);
        assert_eq!(pixel(&frame, 100, shaft_y), CLEAR_COLOR);
    }

    #[test]
    fn plate_and_progress_bar_are_drawn() {
        let mut world = world_with_one_bolt();
        world.set_plate(PlateRect {
            min: Vec2 { x: -4.0, y: 0.8 },
            max: Vec2 { x: 4.0, y: 1.6 },
        });
        world.set_hold_progress(Some((UnitId(1), 1.0)));
        let mut frame = vec![0u8; (VIEWPORT.width * VIEWPORT.height * 4) as usize];
        draw_scene(&mut frame, VIEWPORT, &world);

        let (_, plate_y) = world_to_screen(Vec2 { x: 0.0, y: 1.2 }, world.camera(), VIEWPORT);
        assert_eq!(pixel(&frame, 40, plate_y), PLATE_COLOR);

        let (_, cap_top) = world_to_screen(Vec2 { x: 0.0, y: 3.6 }, world.camera(), VIEWPORT);
        let bar_y = cap_top - PROGRESS_GAP_PX - PROGRESS_HEIGHT_PX / 2;
        assert_eq!(pixel(&frame, 100, bar_y), PROGRESS_FILL_COLOR);
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut frame = vec![0u8; 16];
        write_pixel_rgba_clipped(&mut frame, 2, -1, 0, [1, 1, 1, 1]);
        write_pixel_rgba_clipped(&mut frame, 2, 2, 0, [1, 1, 1, 1]);
        write_pixel_rgba_clipped(&mut frame, 2, 0, 5, [1, 1, 1, 1]);
        assert!(frame.iter().all(|byte| *byte == 0));

        write_pixel_rgba_clipped(&mut frame, 2, 1, 1, [9, 9, 9, 9]);
        assert_eq!(&frame[12..16], &[9, 9, 9, 9]);
    }

    #[test]
    fn every_visual_state_has_a_distinct_color() {
        let states = [
            VisualState::Original,
            VisualState::Highlighted,
            VisualState::Selected,
            VisualState::Correct,
            VisualState::Wrong,
            VisualState::Tightened,
        ];
        for (i, a) in states.iter().enumerate() {
            for b in &states[i + 1..] {
                assert_ne!(material_color(*a), material_color(*b));
            }
        }
    }
}
