//! Search variants and the engine that drives them over a [GridGraph].

use core::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use grid_util::point::Point;
use log::info;
use smallvec::SmallVec;

use crate::best_first::SearchContext;
use crate::error::GridError;
use crate::grid_graph::GridGraph;
use crate::{N_SMALLVEC_SIZE, UNIT_EDGE_COST};

/// The supported algorithm variants. All three run the same best-first loop
/// and differ only in how much of the edge weight and of the heuristic they
/// feed it: zeroing the heuristic gives Dijkstra, zeroing the accumulated
/// weight gives greedy best-first, keeping both gives A*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SearchVariant {
    AStar,
    Greedy,
    Dijkstra,
}

impl SearchVariant {
    pub const ALL: [SearchVariant; 3] = [
        SearchVariant::AStar,
        SearchVariant::Greedy,
        SearchVariant::Dijkstra,
    ];

    /// Edge weight fed to the search. Greedy ranks frontier nodes by
    /// heuristic alone, so it weighs every edge as zero.
    pub fn edge_weight(&self, graph: &GridGraph, from: &Point, to: &Point) -> i32 {
        match self {
            SearchVariant::Greedy => 0,
            _ => graph.edge_cost(from, to),
        }
    }

    /// Remaining-cost estimate fed to the search. Dijkstra orders the
    /// frontier by accumulated weight alone, so it estimates zero
    /// everywhere. The estimate ignores wrap-around and teleportation
    /// shortcuts, which can make it an overestimate on graphs using them.
    pub fn heuristic(&self, node: &Point, goal: &Point) -> i32 {
        match self {
            SearchVariant::Dijkstra => 0,
            _ => manhattan_distance(node, goal),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SearchVariant::AStar => "A* Search",
            SearchVariant::Greedy => "Greedy Best-First Search",
            SearchVariant::Dijkstra => "Dijkstra's Algorithm",
        }
    }
}

impl fmt::Display for SearchVariant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchVariant {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A* Search" => Ok(SearchVariant::AStar),
            "Greedy Best-First Search" => Ok(SearchVariant::Greedy),
            "Dijkstra's Algorithm" => Ok(SearchVariant::Dijkstra),
            _ => Err(GridError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// A reusable engine binding a [SearchVariant] to the shared best-first
/// loop. Reusing one engine across searches recycles its internal
/// allocations. The `heuristic_factor` scales the heuristic; values above
/// 1.0 trade path optimality for fewer settled cells.
#[derive(Clone, Debug)]
pub struct SearchEngine {
    pub variant: SearchVariant,
    pub heuristic_factor: f32,
    context: SearchContext<Point, i32>,
}

impl SearchEngine {
    pub fn new(variant: SearchVariant) -> SearchEngine {
        SearchEngine {
            variant,
            heuristic_factor: 1.0,
            context: SearchContext::new(),
        }
    }

    /// Computes a path from `start` to `goal`, both inclusive, or [None]
    /// when no sequence of moves connects them. Each cell is settled at
    /// most once per search, so an exhausted search settles exactly the
    /// cells reachable from `start`.
    pub fn search(
        &mut self,
        graph: &GridGraph,
        start: Point,
        goal: Point,
    ) -> Result<Option<Vec<Point>>, GridError> {
        graph.check_bounds(start.x, start.y)?;
        graph.check_bounds(goal.x, goal.y)?;
        let variant = self.variant;
        let factor = self.heuristic_factor;
        let result = self.context.best_first_search(
            &start,
            |node| {
                graph
                    .neighbors(node)
                    .into_iter()
                    .map(|neighbor| (neighbor, variant.edge_weight(graph, node, &neighbor)))
                    .collect::<SmallVec<[(Point, i32); N_SMALLVEC_SIZE]>>()
            },
            |node| (variant.heuristic(node, &goal) as f32 * factor) as i32,
            |node| *node == goal,
        );
        Ok(result.map(|(path, _)| path))
    }

    /// The number of cells settled by the most recent search.
    pub fn nodes_explored(&self) -> usize {
        self.context.nodes_explored()
    }
}

/// The path of a single search together with its diagnostic measurements.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub path: Option<Vec<Point>>,
    pub nodes_explored: usize,
    pub elapsed: Duration,
}

impl SearchOutcome {
    /// The number of cells on the path, zero when there is none.
    pub fn path_length(&self) -> usize {
        self.path.as_ref().map_or(0, |path| path.len())
    }
}

/// Runs a one-off search with the given variant and collects the settled
/// cell count and wall-clock duration alongside the path.
pub fn find_path(
    graph: &GridGraph,
    start: Point,
    goal: Point,
    variant: SearchVariant,
) -> Result<SearchOutcome, GridError> {
    let mut engine = SearchEngine::new(variant);
    let before = Instant::now();
    let path = engine.search(graph, start, goal)?;
    let elapsed = before.elapsed();
    let nodes_explored = engine.nodes_explored();
    match &path {
        Some(path) => info!(
            "{} settled {} cells and found a {} cell path",
            variant,
            nodes_explored,
            path.len()
        ),
        None => info!(
            "{} settled {} cells without reaching the goal, is it reachable?",
            variant, nodes_explored
        ),
    }
    Ok(SearchOutcome {
        path,
        nodes_explored,
        elapsed,
    })
}

/// Manhattan distance between two cells, ignoring wrap-around and
/// teleportation shortcuts.
pub fn manhattan_distance(a: &Point, b: &Point) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

/// Total cost of a path in edge units.
pub fn path_cost(graph: &GridGraph, path: &[Point]) -> i32 {
    path.windows(2)
        .map(|pair| graph.edge_cost(&pair[0], &pair[1]))
        .sum()
}

/// Converts an integral edge-unit cost to the unit-cost float scale.
pub fn cost_to_unit_float(cost: i32) -> f64 {
    cost as f64 / UNIT_EDGE_COST as f64
}
