//! Configuration constants and the runtime configuration resource

use crate::error::SimError;
use bevy::math::DVec2;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// ARENA SETTINGS
// ============================================================================

/// Width of the play area in world units
pub const ARENA_WIDTH: f64 = 960.0;

/// Height of the play area in world units
pub const ARENA_HEIGHT: f64 = 960.0;

/// Radius of a single agent; also the inset margin of the arena on every side
pub const AGENT_RADIUS: f64 = 5.0;

// ============================================================================
// POPULATION & TIMING
// ============================================================================

/// Default number of agents of each kind when none are given on the command line
pub const DEFAULT_KIND_COUNT: usize = 80;

/// Ticks before the run is declared a draw
pub const MAX_TICKS: u64 = 3000;

/// Ticks per second when the viewer drives the simulation
pub const FRAME_CAP: f64 = 144.0;

// ============================================================================
// MOVEMENT
// ============================================================================

/// Reference speed for pursuit and the hard cap on per-tick displacement
pub const BASE_SPEED: f64 = 2.0;

/// Maximum speed after force summation
pub const MAX_SPEED: f64 = 2.0;

/// Scale of the uniform per-axis jitter, each axis drawn from [-0.5, 0.5] * scale
pub const RANDOM_MOVEMENT: f64 = 0.5;

/// Strength of the pull toward the arena center
pub const CENTER_FORCE: f64 = 0.9;

/// Velocity multiplier applied to an axis that hits a wall (sign inverted)
pub const BOUNCE_DAMPING: f64 = 0.5;

// ============================================================================
// FLOCKING
// ============================================================================

/// Radius within which same-kind agents count as flock neighbors
pub const FLOCK_RADIUS: f64 = 100.0;

/// Spacing below which separation kicks in and above which cohesion applies
pub const FLOCK_MIN_SPACING: f64 = 30.0;

/// Separation coefficient
pub const FLOCK_SEPARATION: f64 = 0.82;

/// Cohesion coefficient
pub const FLOCK_COHESION: f64 = 0.1;

/// Alignment coefficient
pub const FLOCK_ALIGNMENT: f64 = 0.1;

// ============================================================================
// PREDATION & CONTACT
// ============================================================================

/// Number of nearest prey considered when picking a target
pub const TARGET_CANDIDATES: usize = 3;

/// Probability of chasing the nearest prey rather than one of the runners-up
pub const NEAREST_TARGET_CHANCE: f64 = 0.95;

/// Strength of the push away from predators
pub const REPULSION_FACTOR: f64 = 4.0;

/// Radius within which predators are fled from
pub const REPULSION_RADIUS: f64 = 150.0;

/// Contact distance for conversion and the global anti-overlap force
pub const MIN_DISTANCE: f64 = AGENT_RADIUS * 2.0;

/// The anti-overlap force triggers below MIN_DISTANCE / this divisor
pub const OVERLAP_TRIGGER_DIVISOR: f64 = 1.05;

/// Peak strength of the anti-overlap force
pub const OVERLAP_STRENGTH: f64 = 20.0;

/// Probability that a contact with a predator converts the prey
pub const CONVERSION_CHANCE: f64 = 0.3;

/// Tunable parameters for a run. Built from the constants above and optionally
/// overridden from a TOML file.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub width: f64,
    pub height: f64,
    pub agent_radius: f64,
    pub max_ticks: u64,
    pub frame_cap: f64,
    pub base_speed: f64,
    pub max_speed: f64,
    pub random_movement: f64,
    pub center_attraction: bool,
    pub center_force: f64,
    pub bounce_damping: f64,
    pub group_behavior: bool,
    pub flock_radius: f64,
    pub flock_min_spacing: f64,
    pub flock_separation: f64,
    pub flock_cohesion: f64,
    pub flock_alignment: f64,
    pub target_candidates: usize,
    pub nearest_target_chance: f64,
    pub repulsion_factor: f64,
    pub repulsion_radius: f64,
    pub min_distance: f64,
    pub overlap_trigger_divisor: f64,
    pub overlap_strength: f64,
    pub conversion_chance: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: ARENA_WIDTH,
            height: ARENA_HEIGHT,
            agent_radius: AGENT_RADIUS,
            max_ticks: MAX_TICKS,
            frame_cap: FRAME_CAP,
            base_speed: BASE_SPEED,
            max_speed: MAX_SPEED,
            random_movement: RANDOM_MOVEMENT,
            center_attraction: true,
            center_force: CENTER_FORCE,
            bounce_damping: BOUNCE_DAMPING,
            group_behavior: true,
            flock_radius: FLOCK_RADIUS,
            flock_min_spacing: FLOCK_MIN_SPACING,
            flock_separation: FLOCK_SEPARATION,
            flock_cohesion: FLOCK_COHESION,
            flock_alignment: FLOCK_ALIGNMENT,
            target_candidates: TARGET_CANDIDATES,
            nearest_target_chance: NEAREST_TARGET_CHANCE,
            repulsion_factor: REPULSION_FACTOR,
            repulsion_radius: REPULSION_RADIUS,
            min_distance: MIN_DISTANCE,
            overlap_trigger_divisor: OVERLAP_TRIGGER_DIVISOR,
            overlap_strength: OVERLAP_STRENGTH,
            conversion_chance: CONVERSION_CHANCE,
        }
    }
}

impl SimConfig {
    /// Load a configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        let config: SimConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pursuit speed toward a target: weaker than the flight response, but never
    /// below 70% of the base speed.
    pub fn attraction_speed(&self) -> f64 {
        self.base_speed * (1.0 - self.repulsion_factor / 2.0).max(0.7)
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Check that every parameter is usable before any agent is placed.
    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("agent_radius", self.agent_radius),
            ("frame_cap", self.frame_cap),
            ("max_speed", self.max_speed),
            ("flock_radius", self.flock_radius),
            ("flock_min_spacing", self.flock_min_spacing),
            ("repulsion_radius", self.repulsion_radius),
            ("min_distance", self.min_distance),
            ("overlap_trigger_divisor", self.overlap_trigger_divisor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(SimError::InvalidConfiguration(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }

        let non_negative = [
            ("base_speed", self.base_speed),
            ("random_movement", self.random_movement),
            ("center_force", self.center_force),
            ("bounce_damping", self.bounce_damping),
            ("flock_separation", self.flock_separation),
            ("flock_cohesion", self.flock_cohesion),
            ("flock_alignment", self.flock_alignment),
            ("repulsion_factor", self.repulsion_factor),
            ("overlap_strength", self.overlap_strength),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::InvalidConfiguration(format!(
                    "{name} must be non-negative and finite, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("nearest_target_chance", self.nearest_target_chance),
            ("conversion_chance", self.conversion_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SimError::InvalidConfiguration(format!(
                    "{name} must be a probability in [0, 1], got {value}"
                )));
            }
        }

        if self.target_candidates == 0 {
            return Err(SimError::InvalidConfiguration(
                "target_candidates must be at least 1".to_string(),
            ));
        }

        let margin = 2.0 * self.agent_radius;
        if self.width <= margin || self.height <= margin {
            return Err(SimError::InvalidConfiguration(format!(
                "arena {}x{} is too small for agents of radius {}",
                self.width, self.height, self.agent_radius
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn attraction_speed_is_floored() {
        let config = SimConfig::default();
        // 1 - 4/2 is negative, so the 0.7 floor applies
        assert!((config.attraction_speed() - 1.4).abs() < 1e-12);

        let gentle = SimConfig {
            repulsion_factor: 0.2,
            ..SimConfig::default()
        };
        assert!((gentle.attraction_speed() - 1.8).abs() < 1e-12);
    }

    #[test]
    fn arena_smaller_than_margin_is_rejected() {
        let config = SimConfig {
            width: 10.0,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn probability_out_of_range_is_rejected() {
        let config = SimConfig {
            conversion_chance: 1.5,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn nan_radius_is_rejected() {
        let config = SimConfig {
            repulsion_radius: f64::NAN,
            ..SimConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_overrides_keep_other_defaults() {
        let config: SimConfig = toml::from_str("max_ticks = 10\nconversion_chance = 1.0\n").unwrap();
        assert_eq!(config.max_ticks, 10);
        assert_eq!(config.conversion_chance, 1.0);
        assert_eq!(config.width, ARENA_WIDTH);
    }
}
