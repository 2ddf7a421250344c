use crate::agent::{Agent, Kind};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Position-only record stored in the index so agents are not cloned into the tree.
#[derive(Clone, Debug)]
pub struct AgentLocation {
    pub id: usize,
    pub position: [f64; 2],
}

impl RTreeObject for AgentLocation {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for AgentLocation {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// A query hit: the neighbor's id and its Euclidean distance from the query agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f64,
}

/// Read-only neighbor index over one tick's frozen positions.
///
/// One R*-tree per kind, bulk loaded in O(n log n). Every query excludes the
/// querying agent itself, and radius tests are strict (`distance < radius`).
pub struct SpatialIndex {
    trees: [RTree<AgentLocation>; 3],
}

impl SpatialIndex {
    pub fn build(agents: &[Agent]) -> Self {
        let mut buckets: [Vec<AgentLocation>; 3] = Default::default();
        for agent in agents {
            buckets[agent.kind.index()].push(AgentLocation {
                id: agent.id,
                position: [agent.position.x, agent.position.y],
            });
        }
        Self {
            trees: buckets.map(RTree::bulk_load),
        }
    }

    /// All agents of any kind strictly within `radius`, ordered by id.
    pub fn query_radius(&self, agent: &Agent, radius: f64) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = Kind::ALL
            .iter()
            .flat_map(|&kind| self.within(agent, radius, kind))
            .collect();
        hits.sort_by_key(|n| n.id);
        hits
    }

    /// Agents of `kind` strictly within `radius`, ordered by id.
    pub fn query_by_kind(&self, agent: &Agent, radius: f64, kind: Kind) -> Vec<Neighbor> {
        let mut hits: Vec<Neighbor> = self.within(agent, radius, kind).collect();
        hits.sort_by_key(|n| n.id);
        hits
    }

    /// Up to `k` agents of `kind`, nearest first. Empty when there are no
    /// candidates besides the agent itself.
    pub fn nearest_of_kind(&self, agent: &Agent, kind: Kind, k: usize) -> Vec<Neighbor> {
        let point = [agent.position.x, agent.position.y];
        self.trees[kind.index()]
            .nearest_neighbor_iter(&point)
            .filter(|loc| loc.id != agent.id)
            .take(k)
            .map(|loc| Neighbor {
                id: loc.id,
                distance: loc.distance_2(&point).sqrt(),
            })
            .collect()
    }

    fn within<'a>(
        &'a self,
        agent: &'a Agent,
        radius: f64,
        kind: Kind,
    ) -> impl Iterator<Item = Neighbor> + 'a {
        let center = [agent.position.x, agent.position.y];
        let envelope = AABB::from_corners(
            [center[0] - radius, center[1] - radius],
            [center[0] + radius, center[1] + radius],
        );
        let r_sq = radius * radius;

        self.trees[kind.index()]
            .locate_in_envelope(&envelope)
            .filter(move |loc| loc.id != agent.id)
            .filter_map(move |loc| {
                let d_sq = loc.distance_2(&center);
                (d_sq < r_sq).then(|| Neighbor {
                    id: loc.id,
                    distance: d_sq.sqrt(),
                })
            })
    }
}
