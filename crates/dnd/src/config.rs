use serde::{Deserialize, Serialize};

const MIN_STIFFNESS: f32 = 10.;
const MAX_STIFFNESS: f32 = 10_000.;
const MIN_DAMPING: f32 = 1.;
/// Above this the explicit velocity update overshoots within one step.
const MAX_DAMPING: f32 = 400.;
const MIN_THRESHOLD: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    /// Distance from the target under which the spring may come to rest.
    pub rest_threshold: f32,
    pub velocity_threshold: f32,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 170.,
            damping: 26.,
            rest_threshold: 0.01,
            velocity_threshold: 0.05,
        }
    }
}

impl SpringConfig {
    /// Clamp every field into a range in which a spring comes to rest.
    /// NaN falls back to the lower bound.
    pub fn sanitized(self) -> Self {
        Self {
            stiffness: self.stiffness.max(MIN_STIFFNESS).min(MAX_STIFFNESS),
            damping: self.damping.max(MIN_DAMPING).min(MAX_DAMPING),
            rest_threshold: self.rest_threshold.abs().max(MIN_THRESHOLD),
            velocity_threshold: self.velocity_threshold.abs().max(MIN_THRESHOLD),
        }
    }
}

/// Motion settings of the drag engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Siblings sliding out of the way of a dragged item.
    pub displace: SpringConfig,
    /// The dragged item returning to its slot on release.
    pub settle: SpringConfig,
    /// Enter, exit and corrective motion of the list transition.
    pub transition: SpringConfig,
}

impl DragConfig {
    pub fn sanitized(&self) -> Self {
        Self {
            displace: self.displace.sanitized(),
            settle: self.settle.sanitized(),
            transition: self.transition.sanitized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: DragConfig =
            serde_json::from_str(r#"{ "settle": { "stiffness": 300.0 } }"#).unwrap();
        assert_eq!(config.settle.stiffness, 300.);
        assert_eq!(config.settle.damping, SpringConfig::default().damping);
        assert_eq!(config.displace, SpringConfig::default());
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = SpringConfig {
            stiffness: -50.,
            damping: 0.,
            rest_threshold: -0.5,
            velocity_threshold: 0.,
        }
        .sanitized();
        assert_eq!(config.stiffness, MIN_STIFFNESS);
        assert_eq!(config.damping, MIN_DAMPING);
        assert_eq!(config.rest_threshold, 0.5);
        assert_eq!(config.velocity_threshold, MIN_THRESHOLD);

        let config = SpringConfig {
            stiffness: f32::NAN,
            damping: f32::INFINITY,
            ..SpringConfig::default()
        }
        .sanitized();
        assert_eq!(config.stiffness, MIN_STIFFNESS);
        assert_eq!(config.damping, MAX_DAMPING);
    }

    #[test]
    fn defaults_are_already_sane() {
        assert_eq!(SpringConfig::default().sanitized(), SpringConfig::default());
    }
}
