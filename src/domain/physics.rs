/// Per-entity physics step.
///
/// ## Order (one call = one entity, one frame)
///
///   1. Gravity: `vy += g`, then `y += vy` (semi-implicit Euler)
///   2. Ground: clear `grounded`; below the ground line → snap, stop, ground
///   3. Platforms: land on top only (see below)
///   4. Horizontal: `x += vx`; friction scales `vx` when enabled
///   5. Clamp `x` into `[0, world_width - width]` (velocity untouched)
///
/// ## Platform landing
///
/// A body lands on a platform when ALL of:
///   - its bounding box overlaps the platform
///   - it is falling or still (`vy >= 0`)
///   - its bottom before this frame's fall (`bottom - vy`) was no lower
///     than the platform top plus `landing_tolerance`
///
/// Side and underside contacts are not resolved: a body walking into a
/// platform's edge passes into it. A body falling faster than the platform
/// is thick can skip it entirely. Both are known limitations.

use crate::config::WorldConfig;
use super::entity::{Body, Platform};

pub fn apply(body: &mut Body, platforms: &[Platform], world: &WorldConfig, friction: bool) {
    let w = body.width();
    let h = body.height();

    body.vy += world.gravity;
    body.y += body.vy;
    body.grounded = false;

    let ground = world.ground_y();
    if body.y + h > ground {
        body.y = ground - h;
        body.vy = 0.0;
        body.grounded = true;
    }

    for p in platforms {
        if !body.bounds().overlaps(&p.rect) {
            continue;
        }
        if body.vy >= 0.0 && body.y + h - body.vy <= p.top() + world.landing_tolerance {
            body.y = p.top() - h;
            body.vy = 0.0;
            body.grounded = true;
        }
    }

    body.x += body.vx;
    if friction {
        body.vx *= world.friction;
    }

    if body.x < 0.0 {
        body.x = 0.0;
    }
    if body.x + w > world.width {
        body.x = world.width - w;
    }
}
