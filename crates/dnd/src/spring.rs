//! Damped spring easing used for every eased motion of the board: displaced
//! items, the settle-back after a drop, enter/exit progress and corrective
//! translations.
//!
//! Integration is semi-implicit Euler, subdivided into steps of at most
//! [`MAX_STEP`] for stability with stiff springs.

use std::time::Duration;

use crate::config::SpringConfig;
use crate::geometry::Point;

const MAX_STEP: f32 = 0.004;

#[derive(Clone, Debug, PartialEq)]
pub struct Spring {
    position: f32,
    velocity: f32,
    target: f32,
    config: SpringConfig,
    at_rest: bool,
}

impl Spring {
    /// `config` is clamped with [`SpringConfig::sanitized`].
    pub fn new(initial: f32, target: f32, config: SpringConfig) -> Self {
        let config = config.sanitized();
        Self {
            position: initial,
            velocity: 0.,
            target,
            config,
            at_rest: (initial - target).abs() < config.rest_threshold,
        }
    }

    /// A spring resting at `position`.
    pub fn at(position: f32, config: SpringConfig) -> Self {
        Self::new(position, position, config)
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn is_at_rest(&self) -> bool {
        self.at_rest
    }

    /// Retarget, keeping the current position and velocity.
    pub fn set_target(&mut self, target: f32) {
        if (self.target - target).abs() > f32::EPSILON {
            self.target = target;
            self.at_rest = false;
        }
    }

    /// Place the spring at `position` with no motion (a zero-duration move).
    pub fn jump_to(&mut self, position: f32) {
        self.position = position;
        self.target = position;
        self.velocity = 0.;
        self.at_rest = true;
    }

    pub fn advance(&mut self, dt: Duration) {
        if self.at_rest {
            return;
        }

        let mut remaining = dt.as_secs_f32();
        while remaining > 0. {
            let step = remaining.min(MAX_STEP);
            let displacement = self.position - self.target;
            let acceleration =
                -self.config.stiffness * displacement - self.config.damping * self.velocity;
            self.velocity += acceleration * step;
            self.position += self.velocity * step;
            remaining -= step;
        }

        if (self.position - self.target).abs() < self.config.rest_threshold
            && self.velocity.abs() < self.config.velocity_threshold
        {
            self.position = self.target;
            self.velocity = 0.;
            self.at_rest = true;
        }
    }
}

/// Two independent springs driving a 2d translation.
#[derive(Clone, Debug, PartialEq)]
pub struct SpringPoint {
    x: Spring,
    y: Spring,
}

impl SpringPoint {
    pub fn at(position: Point, config: SpringConfig) -> Self {
        Self {
            x: Spring::at(position.x, config),
            y: Spring::at(position.y, config),
        }
    }

    pub fn new(from: Point, to: Point, config: SpringConfig) -> Self {
        Self {
            x: Spring::new(from.x, to.x, config),
            y: Spring::new(from.y, to.y, config),
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x.position(), self.y.position())
    }

    pub fn set_target(&mut self, target: Point) {
        self.x.set_target(target.x);
        self.y.set_target(target.y);
    }

    pub fn jump_to(&mut self, position: Point) {
        self.x.jump_to(position.x);
        self.y.jump_to(position.y);
    }

    pub fn advance(&mut self, dt: Duration) {
        self.x.advance(dt);
        self.y.advance(dt);
    }

    pub fn is_at_rest(&self) -> bool {
        self.x.is_at_rest() && self.y.is_at_rest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(16);

    fn run(spring: &mut Spring, frames: usize) {
        for _ in 0..frames {
            spring.advance(FRAME);
        }
    }

    #[test]
    fn spring_reaches_target_and_rests() {
        let mut spring = Spring::new(0., 120., SpringConfig::default());
        assert!(!spring.is_at_rest());
        run(&mut spring, 300);
        assert!(spring.is_at_rest());
        assert_eq!(spring.position(), 120.);
    }

    #[test]
    fn retarget_wakes_a_resting_spring() {
        let mut spring = Spring::at(10., SpringConfig::default());
        assert!(spring.is_at_rest());
        spring.advance(FRAME);
        assert_eq!(spring.position(), 10.);

        spring.set_target(-40.);
        assert!(!spring.is_at_rest());
        spring.advance(FRAME);
        assert!(spring.position() < 10.);
    }

    #[test]
    fn jump_is_immediate() {
        let mut point = SpringPoint::new(Point::ZERO, Point::new(100., 50.), SpringConfig::default());
        point.jump_to(Point::new(-5., 7.));
        assert!(point.is_at_rest());
        assert_eq!(point.position(), Point::new(-5., 7.));
    }

    #[test]
    fn overdamped_spring_does_not_overshoot() {
        let config = SpringConfig {
            damping: 80.,
            ..SpringConfig::default()
        };
        let mut spring = Spring::new(0., 1., config);
        for _ in 0..300 {
            spring.advance(FRAME);
            assert!(spring.position() <= 1. + 1e-3, "{}", spring.position());
        }
    }

    fn frames_to_rest(spring: &mut Spring, limit: usize) -> Option<usize> {
        (1..=limit).find(|_| {
            spring.advance(FRAME);
            spring.is_at_rest()
        })
    }

    #[test]
    fn undamped_config_still_comes_to_rest() {
        let config: SpringConfig = serde_json::from_str(r#"{ "damping": 0.0 }"#).unwrap();
        let mut spring = Spring::new(0., 200., config);
        assert!(frames_to_rest(&mut spring, 5_000).is_some());
        assert_eq!(spring.position(), 200.);
    }

    #[test]
    fn negative_stiffness_does_not_diverge() {
        let config: SpringConfig = serde_json::from_str(r#"{ "stiffness": -50.0 }"#).unwrap();
        let mut spring = Spring::new(0., 200., config);
        for _ in 0..200 {
            spring.advance(FRAME);
            assert!((-1.0..=201.).contains(&spring.position()), "{}", spring.position());
        }
        assert!(frames_to_rest(&mut spring, 5_000).is_some());
        assert_eq!(spring.position(), 200.);
    }

    #[test]
    fn zero_thresholds_still_rest() {
        let config: SpringConfig =
            serde_json::from_str(r#"{ "rest_threshold": 0.0, "velocity_threshold": -1.0 }"#)
                .unwrap();
        let mut spring = Spring::new(0., 1., config);
        assert!(frames_to_rest(&mut spring, 1_000).is_some());
    }
}
