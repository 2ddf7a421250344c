use crate::agent::{Agent, Kind};
use crate::config::SimConfig;
use crate::spatial::SpatialIndex;
use bevy::math::DVec2;
use rand::Rng;

/// Decides contact conversions once every agent has moved.
///
/// The index still holds tick-start positions, so it is only a prefilter:
/// candidates come from a query of twice the contact distance and the exact
/// test uses the post-move positions in `moved`, indexed by agent id.
pub struct CollisionResolver<'a> {
    config: &'a SimConfig,
    agents: &'a [Agent],
    moved: &'a [DVec2],
    index: &'a SpatialIndex,
}

impl<'a> CollisionResolver<'a> {
    pub fn new(
        config: &'a SimConfig,
        agents: &'a [Agent],
        moved: &'a [DVec2],
        index: &'a SpatialIndex,
    ) -> Self {
        Self {
            config,
            agents,
            moved,
            index,
        }
    }

    /// First predator, in query order, strictly closer than the contact distance
    /// after movement.
    pub fn contact_predator(&self, agent: &Agent) -> Option<usize> {
        let min_distance = self.config.min_distance;
        let position = self.moved[agent.id];
        self.index
            .query_by_kind(agent, min_distance * 2.0, agent.kind.predator())
            .into_iter()
            .find(|candidate| {
                self.agents[candidate.id].kind.beats(agent.kind)
                    && position.distance(self.moved[candidate.id]) < min_distance
            })
            .map(|candidate| candidate.id)
    }

    /// At most one conversion roll per agent per tick. Returns the new kind when
    /// the roll succeeds.
    pub fn resolve<R: Rng>(&self, agent: &Agent, rng: &mut R) -> Option<Kind> {
        let predator = self.contact_predator(agent)?;
        rng.gen_bool(self.config.conversion_chance)
            .then(|| self.agents[predator].kind)
    }
}
