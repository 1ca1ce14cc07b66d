//! Portal-graph traversal producing the potentially visible sector set.

use glam::Vec3;
use sectorscope_core::{SectorId, WallId};

use crate::graph::SpatialGraph;

/// Opening between two sectors, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Portal {
    pub wall: WallId,
    /// Sector on the far side.
    pub sector: SectorId,
    /// Top start, top end, bottom end, bottom start.
    pub points: [Vec3; 4],
}

/// Decides whether a portal boundary can be seen.
pub trait PortalVisibility {
    fn is_visible(&self, points: &[Vec3]) -> bool;
}

/// Accepts every portal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysVisible;

impl PortalVisibility for AlwaysVisible {
    fn is_visible(&self, _points: &[Vec3]) -> bool {
        true
    }
}

impl<F> PortalVisibility for F
where
    F: Fn(&[Vec3]) -> bool,
{
    fn is_visible(&self, points: &[Vec3]) -> bool {
        self(points)
    }
}

struct Frame<'a> {
    portals: &'a [Portal],
    next: usize,
}

/// Depth-first walk from `seed` through accepted portals. Sectors appear in
/// discovery order, each once.
pub fn visible_sectors(
    graph: &SpatialGraph,
    seed: SectorId,
    predicate: &dyn PortalVisibility,
) -> Vec<SectorId> {
    if graph.sector(seed).is_none() {
        return Vec::new();
    }

    let mut visited = vec![false; graph.sectors().len()];
    let mut order = vec![seed];
    visited[seed.index()] = true;
    let mut stack = vec![Frame {
        portals: graph.portals(seed),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(portal) = frame.portals.get(frame.next) else {
            stack.pop();
            continue;
        };
        frame.next += 1;

        let target = portal.sector;
        if visited[target.index()] || !predicate.is_visible(&portal.points) {
            continue;
        }
        visited[target.index()] = true;
        order.push(target);
        stack.push(Frame {
            portals: graph.portals(target),
            next: 0,
        });
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{corridor, link, rect, LevelFixture};

    fn camera_in(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.1, z)
    }

    #[test]
    fn test_two_rooms_accept_and_reject() {
        let graph = SpatialGraph::build(&corridor(2)).unwrap();
        let seed = graph.locate(camera_in(0.5, 0.5)).unwrap();
        assert_eq!(seed, SectorId(0));

        let all = visible_sectors(&graph, seed, &AlwaysVisible);
        assert_eq!(all, vec![SectorId(0), SectorId(1)]);

        let none = visible_sectors(&graph, seed, &|_: &[Vec3]| false);
        assert_eq!(none, vec![SectorId(0)]);
    }

    #[test]
    fn test_cycle_terminates_in_discovery_order() {
        // Four rooms in a 2x2 ring: 0 | 1 over 3 | 2
        let mut fixture = LevelFixture::default();
        let a = fixture.sector(&[rect(0, 0, 1024, 1024)], 0, -16384);
        let b = fixture.sector(&[rect(1024, 0, 2048, 1024)], 0, -16384);
        let c = fixture.sector(&[rect(1024, 1024, 2048, 2048)], 0, -16384);
        let d = fixture.sector(&[rect(0, 1024, 1024, 2048)], 0, -16384);
        let mut level = fixture.finish();
        // east/west, south/north edges of each rect: walls 1 (east), 2 (south), 3 (west), 0 (north)
        link(&mut level, a + 1, b + 3);
        link(&mut level, b + 2, c);
        link(&mut level, c + 3, d + 1);
        link(&mut level, d, a + 2);

        let graph = SpatialGraph::build(&level).unwrap();
        let order = visible_sectors(&graph, SectorId(0), &AlwaysVisible);
        assert_eq!(order, vec![SectorId(0), SectorId(1), SectorId(2), SectorId(3)]);

        let from_c = visible_sectors(&graph, SectorId(2), &AlwaysVisible);
        assert_eq!(from_c, vec![SectorId(2), SectorId(1), SectorId(0), SectorId(3)]);
    }

    #[test]
    fn test_predicate_sees_portal_boundary() {
        let graph = SpatialGraph::build(&corridor(2)).unwrap();
        let seen = std::cell::RefCell::new(Vec::new());
        let predicate = |points: &[Vec3]| {
            seen.borrow_mut().push(points.to_vec());
            true
        };
        visible_sectors(&graph, SectorId(0), &predicate);

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 1);
        let points = &seen[0];
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| (p.x - 1.024).abs() < 1e-6));
        assert!((points[0].y - 1.024).abs() < 1e-6);
        assert!(points[2].y.abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let graph = SpatialGraph::build(&corridor(5)).unwrap();
        let first = visible_sectors(&graph, SectorId(2), &AlwaysVisible);
        for _ in 0..10 {
            assert_eq!(visible_sectors(&graph, SectorId(2), &AlwaysVisible), first);
        }
        assert_eq!(
            first,
            vec![SectorId(2), SectorId(3), SectorId(4), SectorId(1), SectorId(0)]
        );
    }

    #[test]
    fn test_unknown_seed_is_empty() {
        let graph = SpatialGraph::build(&corridor(1)).unwrap();
        assert!(visible_sectors(&graph, SectorId(7), &AlwaysVisible).is_empty());
    }
}
