//! Collision tests.
//!
//! Everything here is a plain distance check against trail points or heads.
//! Distances are straight Euclidean even though worm movement wraps; a trail
//! near one arena edge does not threaten a head near the opposite edge.

use glam::Vec2;

/// Check a candidate head position against a trail. Any point within twice
/// the worm radius kills.
pub fn trail_hit(head: Vec2, trail: &[Vec2], worm_radius: f32) -> bool {
    let kill_distance_sq = (worm_radius * 2.0) * (worm_radius * 2.0);
    trail
        .iter()
        .any(|point| point.distance_squared(head) < kill_distance_sq)
}

/// Self-collision check: the newest `tail_exclusion` points are skipped so a
/// worm cannot die on the segments it laid down in the last few ticks of
/// normal curvature.
pub fn own_trail_hit(head: Vec2, trail: &[Vec2], worm_radius: f32, tail_exclusion: usize) -> bool {
    let end = trail.len().saturating_sub(tail_exclusion);
    trail_hit(head, &trail[..end], worm_radius)
}

/// Bullet vs worm head.
pub fn bullet_hit(bullet: Vec2, head: Vec2, worm_radius: f32, bullet_radius: f32) -> bool {
    let hit_distance = worm_radius + bullet_radius;
    bullet.distance_squared(head) < hit_distance * hit_distance
}

/// Worm head vs power-up.
pub fn powerup_in_reach(head: Vec2, powerup: Vec2, worm_radius: f32, powerup_radius: f32) -> bool {
    let reach = worm_radius + powerup_radius;
    head.distance_squared(powerup) < reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;

    const RADIUS: f32 = 3.0;

    #[test]
    fn test_trail_hit_radius() {
        let trail = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        assert!(trail_hit(Vec2::new(10.0, 5.0), &trail, RADIUS));
        assert!(!trail_hit(Vec2::new(10.0, 6.0), &trail, RADIUS));
        assert!(!trail_hit(Vec2::new(100.0, 100.0), &trail, RADIUS));
    }

    #[test]
    fn test_tail_exclusion_spares_recent_points() {
        // A worm turning in place: every point is within kill range of the
        // head, but fewer points than the threshold means no self-collision.
        let head = Vec2::new(50.0, 50.0);
        let trail: Vec<Vec2> = (0..9)
            .map(|i| head + Vec2::from_angle(i as f32 * 0.1) * 2.0)
            .collect();
        assert!(trail_hit(head, &trail, RADIUS));
        assert!(!own_trail_hit(head, &trail, RADIUS, 10));
    }

    #[test]
    fn test_old_trail_still_kills() {
        // Eleven stacked points with a threshold of ten: exactly one point is
        // old enough to count.
        let head = Vec2::new(50.0, 50.0);
        let trail = vec![head; 11];
        assert!(own_trail_hit(head, &trail, RADIUS, 10));
        assert!(!own_trail_hit(head, &trail[1..], RADIUS, 10));
    }

    #[test]
    fn test_bullet_hit_combines_radii() {
        let head = Vec2::new(10.0, 10.0);
        assert!(bullet_hit(Vec2::new(17.0, 10.0), head, 3.0, 5.0));
        assert!(!bullet_hit(Vec2::new(18.0, 10.0), head, 3.0, 5.0));
    }

    #[test]
    fn test_powerup_reach() {
        let head = Vec2::new(0.0, 0.0);
        assert!(powerup_in_reach(head, Vec2::new(12.0, 0.0), 3.0, 10.0));
        assert!(!powerup_in_reach(head, Vec2::new(13.0, 0.0), 3.0, 10.0));
    }
}
