/// Cheese AI: always run right, hop onto platforms that come up ahead.
///
/// Stateless; re-evaluated every frame before physics.
///
/// A platform triggers a jump when, measured from the cheese's right edge
/// and feet:
///   - its left edge is ahead by more than 0 and less than `lookahead`
///   - its top is higher than the feet by more than `min_rise`
///   - the cheese is grounded
///
/// Platforms are scanned in course order and the first match wins, which
/// is not necessarily the nearest one.

use crate::config::CheeseConfig;
use super::entity::{Body, Platform};

/// Returns the index of the platform the cheese jumped for, if any.
pub fn pursue(cheese: &mut Body, platforms: &[Platform], cfg: &CheeseConfig) -> Option<usize> {
    cheese.vx = cfg.run_speed;

    if !cheese.grounded {
        return None;
    }

    let target = platforms.iter().position(|p| {
        let ahead = p.rect.x - cheese.right();
        let rise = p.top() - cheese.bottom();
        ahead > 0.0 && ahead < cfg.lookahead && rise < -cfg.min_rise
    })?;

    cheese.vy = -cfg.jump;
    cheese.grounded = false;
    Some(target)
}
