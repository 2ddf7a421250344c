use crate::agent::Agent;
use crate::config::SimConfig;
use crate::spatial::SpatialIndex;
use bevy::math::DVec2;
use rand::Rng;

/// Turns neighbor queries into a velocity for one agent.
///
/// Reads only the tick's frozen snapshot: `agents` holds positions, kinds and the
/// velocities from the previous completed integration, and `index` was built
/// from the same positions. Agent ids are indices into `agents`.
pub struct ForceModel<'a> {
    config: &'a SimConfig,
    agents: &'a [Agent],
    index: &'a SpatialIndex,
}

impl<'a> ForceModel<'a> {
    pub fn new(config: &'a SimConfig, agents: &'a [Agent], index: &'a SpatialIndex) -> Self {
        Self {
            config,
            agents,
            index,
        }
    }

    /// Pick this tick's prey: usually the nearest, occasionally one of the
    /// runners-up. Returns the target's id.
    pub fn choose_target<R: Rng>(&self, agent: &Agent, rng: &mut R) -> Option<usize> {
        let candidates =
            self.index
                .nearest_of_kind(agent, agent.kind.prey(), self.config.target_candidates);
        if candidates.is_empty() {
            return None;
        }

        // Always roll so the stream advances the same way regardless of candidate count
        let take_nearest = rng.gen_bool(self.config.nearest_target_chance);
        if take_nearest || candidates.len() == 1 {
            Some(candidates[0].id)
        } else {
            Some(candidates[rng.gen_range(1..candidates.len())].id)
        }
    }

    /// Sum every contribution from zero, then cap the speed.
    pub fn velocity<R: Rng>(&self, agent: &Agent, target: Option<usize>, rng: &mut R) -> DVec2 {
        let mut velocity = self.pursuit(agent, target);
        velocity += self.threat_repulsion(agent);
        if self.config.group_behavior {
            velocity += self.flocking(agent);
        }
        if self.config.center_attraction {
            velocity += self.center_pull(agent);
        }
        velocity += self.jitter(rng);
        velocity += self.overlap_repulsion(agent);

        clamp_speed(velocity, self.config.max_speed)
    }

    pub fn pursuit(&self, agent: &Agent, target: Option<usize>) -> DVec2 {
        let Some(target) = target.and_then(|id| self.agents.get(id)) else {
            return DVec2::ZERO;
        };
        let offset = target.position - agent.position;
        let distance = offset.length();
        if distance > 0.0 {
            offset / distance * self.config.attraction_speed()
        } else {
            DVec2::ZERO
        }
    }

    /// Flee every predator inside the repulsion radius, harder when closer.
    pub fn threat_repulsion(&self, agent: &Agent) -> DVec2 {
        let radius = self.config.repulsion_radius;
        let mut push = DVec2::ZERO;

        for threat in self
            .index
            .query_by_kind(agent, radius, agent.kind.predator())
        {
            // coincident threats have no direction to flee in
            if threat.distance <= 0.0 {
                continue;
            }
            let away = (agent.position - self.agents[threat.id].position) / threat.distance;
            push += away * self.config.repulsion_factor * (1.0 - threat.distance / radius);
        }
        push
    }

    /// Separation, cohesion and alignment against same-kind neighbors.
    pub fn flocking(&self, agent: &Agent) -> DVec2 {
        let neighbors: Vec<&Agent> = self
            .index
            .query_by_kind(agent, self.config.flock_radius, agent.kind)
            .iter()
            .filter_map(|n| self.agents.get(n.id))
            .collect();
        if neighbors.is_empty() {
            return DVec2::ZERO;
        }

        let spacing = self.config.flock_min_spacing;
        let count = neighbors.len() as f64;
        let mut force = DVec2::ZERO;

        // Separation
        let mut separation = DVec2::ZERO;
        let mut crowding = 0;
        for neighbor in &neighbors {
            let offset = agent.position - neighbor.position;
            let distance = offset.length();
            if distance < spacing && distance > 0.0 {
                separation += offset / distance * (1.0 - distance / spacing);
                crowding += 1;
            }
        }
        if crowding > 0 {
            force += separation * self.config.flock_separation;
        }

        // Cohesion, only once the group has drifted beyond the spacing
        let centroid = neighbors.iter().map(|n| n.position).sum::<DVec2>() / count;
        let to_centroid = centroid - agent.position;
        let distance = to_centroid.length();
        if distance > spacing {
            force += to_centroid / distance * self.config.flock_cohesion;
        }

        // Alignment with last tick's headings
        let mean_velocity = neighbors.iter().map(|n| n.velocity).sum::<DVec2>() / count;
        force += mean_velocity * self.config.flock_alignment;

        force
    }

    /// Pull back toward the middle once outside a quarter-width radius.
    pub fn center_pull(&self, agent: &Agent) -> DVec2 {
        let half_width = self.config.width / 2.0;
        let to_center = self.config.center() - agent.position;
        let distance = to_center.length();
        if distance > self.config.width / 4.0 {
            to_center / distance * self.config.center_force * (distance / half_width)
        } else {
            DVec2::ZERO
        }
    }

    pub fn jitter<R: Rng>(&self, rng: &mut R) -> DVec2 {
        let scale = self.config.random_movement;
        DVec2::new(
            (rng.gen_range(0.0..1.0) - 0.5) * scale,
            (rng.gen_range(0.0..1.0) - 0.5) * scale,
        )
    }

    /// Short-range push against every other agent regardless of kind. Scans the
    /// whole snapshot rather than the index.
    pub fn overlap_repulsion(&self, agent: &Agent) -> DVec2 {
        let min_distance = self.config.min_distance;
        let trigger = min_distance / self.config.overlap_trigger_divisor;
        let mut push = DVec2::ZERO;

        for other in self.agents {
            if other.id == agent.id {
                continue;
            }
            let offset = agent.position - other.position;
            let distance = offset.length();
            if distance < trigger && distance > 0.0 {
                let strength = self.config.overlap_strength * (min_distance - distance) / min_distance;
                push += offset / distance * strength;
            }
        }
        push
    }
}

/// Rescale to exactly `max_speed` when faster, keeping direction.
pub fn clamp_speed(velocity: DVec2, max_speed: f64) -> DVec2 {
    let speed = velocity.length();
    if speed > max_speed {
        velocity / speed * max_speed
    } else {
        velocity
    }
}

/// Move by `velocity` and bounce off the inset arena walls. Each axis that
/// leaves `[radius, dimension - radius]` is clamped and its velocity inverted
/// with damping. Returns the new position and velocity.
pub fn integrate(position: DVec2, velocity: DVec2, config: &SimConfig) -> (DVec2, DVec2) {
    let mut position = position + velocity;
    let mut velocity = velocity;
    let r = config.agent_radius;

    if position.x < r {
        position.x = r;
        velocity.x *= -config.bounce_damping;
    } else if position.x > config.width - r {
        position.x = config.width - r;
        velocity.x *= -config.bounce_damping;
    }

    if position.y < r {
        position.y = r;
        velocity.y *= -config.bounce_damping;
    } else if position.y > config.height - r {
        position.y = config.height - r;
        velocity.y *= -config.bounce_damping;
    }

    (position, velocity)
}
