//! # warp_pathfinding
//!
//! A grid-based pathfinding system for uniform-cost grids with optional
//! [toroidal](https://en.wikipedia.org/wiki/Torus) wrap-around and directed
//! teleportation links. Implements
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm),
//! [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
//! and greedy best-first search as a single parameterized best-first loop
//! and reports how many cells each search settled. Pre-computes
//! [connected components](https://en.wikipedia.org/wiki/Component_(graph_theory))
//! so reachability can be answered without running a search.
mod best_first;
pub mod error;
pub mod grid_graph;
pub mod scenario;
pub mod solver;

pub use error::GridError;
pub use grid_graph::{ComplexityEstimate, GridGraph};
pub use scenario::Scenario;
pub use solver::{
    cost_to_unit_float, find_path, manhattan_distance, path_cost, SearchEngine, SearchOutcome,
    SearchVariant,
};

/// Cost of traversing a single edge, cardinal step and teleportation jump
/// alike.
pub const UNIT_EDGE_COST: i32 = 1;
/// Stack capacity of neighbor lists: four cardinal neighbors plus one
/// teleportation destination.
pub const N_SMALLVEC_SIZE: usize = 5;
