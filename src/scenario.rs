//! Seeded random graph generation and the compact scenario descriptor
//! string that reproduces a graph together with its endpoints.

use core::fmt;
use std::str::FromStr;

use grid_util::grid::Grid;
use grid_util::point::Point;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::error::GridError;
use crate::grid_graph::GridGraph;

impl GridGraph {
    /// Generates a random graph from a seed. Each cell rolls once: below
    /// `blocked_fraction` it is blocked, below the sum of the fractions it
    /// becomes a teleportation candidate. Candidates are paired up at
    /// random into reciprocal links, dropping one at random when their
    /// count is odd. Start and goal are drawn uniformly from the cells
    /// that are neither blocked nor part of a link, and the connected
    /// components are generated before returning.
    ///
    /// The same seed and parameters always produce the same graph.
    pub fn random(
        width: usize,
        height: usize,
        blocked_fraction: f64,
        teleport_fraction: f64,
        seed: u64,
    ) -> Result<GridGraph, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::InvalidScenario(format!(
                "a {}x{} grid has no cells",
                width, height
            )));
        }
        if !(0.0..=1.0).contains(&blocked_fraction) || !(0.0..=1.0).contains(&teleport_fraction) {
            return Err(GridError::InvalidScenario(format!(
                "fractions must lie in [0, 1], got blocked {} and teleport {}",
                blocked_fraction, teleport_fraction
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut graph = GridGraph::new(width, height, false);
        let mut candidates: Vec<Point> = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let roll: f64 = rng.gen();
                if roll < blocked_fraction {
                    graph.grid.set(x, y, true);
                } else if roll < blocked_fraction + teleport_fraction {
                    candidates.push(Point::new(x as i32, y as i32));
                }
            }
        }
        if candidates.len() % 2 == 1 {
            let index = rng.gen_range(0..candidates.len());
            candidates.remove(index);
        }
        candidates.shuffle(&mut rng);
        for pair in candidates.chunks_exact(2) {
            graph.add_teleportation_link(pair[0], pair[1])?;
            graph.add_teleportation_link(pair[1], pair[0])?;
        }
        let mut eligible: Vec<Point> = Vec::new();
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let cell = Point::new(x, y);
                if !graph.grid.get(x as usize, y as usize) && !graph.is_teleportation_node(&cell) {
                    eligible.push(cell);
                }
            }
        }
        if eligible.len() < 2 {
            return Err(GridError::InvalidScenario(format!(
                "only {} cells are eligible as endpoints, need 2",
                eligible.len()
            )));
        }
        let start = eligible.swap_remove(rng.gen_range(0..eligible.len()));
        let goal = eligible.swap_remove(rng.gen_range(0..eligible.len()));
        graph.set_start(Some(start))?;
        graph.set_goal(Some(goal))?;
        graph.generate_components();
        info!(
            "Generated a {}x{} graph with {} blocked cells and {} linked cells from seed {}",
            width,
            height,
            width * height - graph.vertex_count(),
            graph.teleportation_nodes().len(),
            seed
        );
        Ok(graph)
    }
}

/// The parameters reproducing a randomly generated graph and its
/// endpoints, round-trippable through the hyphen separated form
/// `width-height-blocked-teleport-seed-startx-starty-goalx-goaly`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scenario {
    pub width: usize,
    pub height: usize,
    pub blocked_fraction: f64,
    pub teleport_fraction: f64,
    pub seed: u64,
    pub start_x: i32,
    pub start_y: i32,
    pub goal_x: i32,
    pub goal_y: i32,
}

impl Scenario {
    /// Regenerates the graph and installs the recorded endpoints, clamping
    /// each coordinate into bounds. An endpoint landing on a blocked cell
    /// is kept but logged; a search can still step off a blocked start.
    pub fn build(&self) -> Result<GridGraph, GridError> {
        let mut graph = GridGraph::random(
            self.width,
            self.height,
            self.blocked_fraction,
            self.teleport_fraction,
            self.seed,
        )?;
        let start = Point::new(
            self.start_x.clamp(0, self.width as i32 - 1),
            self.start_y.clamp(0, self.height as i32 - 1),
        );
        let goal = Point::new(
            self.goal_x.clamp(0, self.width as i32 - 1),
            self.goal_y.clamp(0, self.height as i32 - 1),
        );
        for endpoint in [start, goal] {
            if graph.is_blocked(endpoint.x, endpoint.y)? {
                warn!("Scenario endpoint {} lies on a blocked cell", endpoint);
            }
        }
        graph.set_start(Some(start))?;
        graph.set_goal(Some(goal))?;
        Ok(graph)
    }
}

fn parse_field<T: FromStr>(field: &str, name: &str) -> Result<T, GridError> {
    field.parse().map_err(|_| {
        GridError::MalformedScenario(format!("field {} has invalid value {:?}", name, field))
    })
}

impl FromStr for Scenario {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('-').collect();
        if fields.len() != 9 {
            return Err(GridError::MalformedScenario(format!(
                "expected 9 hyphen separated fields, got {}",
                fields.len()
            )));
        }
        Ok(Scenario {
            width: parse_field(fields[0], "width")?,
            height: parse_field(fields[1], "height")?,
            blocked_fraction: parse_field(fields[2], "blocked")?,
            teleport_fraction: parse_field(fields[3], "teleport")?,
            seed: parse_field(fields[4], "seed")?,
            start_x: parse_field(fields[5], "startx")?,
            start_y: parse_field(fields[6], "starty")?,
            goal_x: parse_field(fields[7], "goalx")?,
            goal_y: parse_field(fields[8], "goaly")?,
        })
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}-{}-{}-{}-{}",
            self.width,
            self.height,
            self.blocked_fraction,
            self.teleport_fraction,
            self.seed,
            self.start_x,
            self.start_y,
            self.goal_x,
            self.goal_y
        )
    }
}
