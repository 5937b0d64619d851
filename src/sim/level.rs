/// The course: one fixed set of platforms laid out along the ground line.
///
/// ```text
///                                   ┌────┐
///                    ┌───┐          │ P2 │             ▌▀
///                    │P1 │          └────┘    ┌───┐   ▌▀
///  @      ┌───P0───┐ └───┘                    │P3 │   ▌
/// ════════╧════════╧══════════════════════════╧═══╧═══▌═══  ground
/// ```
///
/// Heights are measured up from the ground line so the layout follows
/// `ground_offset` and `height` from the config.

use crate::config::WorldConfig;
use crate::domain::entity::Platform;

/// `(x, rise above ground, width, thickness)`
const LAYOUT: [(f32, f32, f32, f32); 4] = [
    (120.0, 18.0, 120.0, 18.0),
    (300.0, 70.0, 100.0, 18.0),
    (460.0, 110.0, 120.0, 18.0),
    (620.0, 50.0, 100.0, 18.0),
];

pub fn course_platforms(world: &WorldConfig) -> Vec<Platform> {
    let ground = world.ground_y();
    LAYOUT
        .iter()
        .map(|&(x, rise, w, h)| Platform::new(x, ground - rise, w, h))
        .collect()
}
