use core::fmt;

use fxhash::FxHashMap;
use grid_util::grid::{BoolGrid, Grid};
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;
use smallvec::SmallVec;

use crate::error::GridError;
use crate::{N_SMALLVEC_SIZE, UNIT_EDGE_COST};

/// The four cardinal offsets in the fixed emission order: north, east,
/// south, west.
const CARDINAL_OFFSETS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

/// [GridGraph] represents a rectangular grid of cells over which paths are
/// searched. It owns the blocked-cell state in a [BoolGrid] ([true] meaning
/// occupied), a directed table of teleportation links, a wrap-around toggle
/// that makes the grid toroidal, and optional designated start/goal cells.
/// Connected components over the unblocked cells are maintained in a
/// [UnionFind] structure so that reachability can be answered without a
/// search. Implements [Grid] by building on [BoolGrid].
///
/// Component queries treat a teleportation link as an undirected connection,
/// so for non-reciprocal links they are advisory rather than exact; the
/// search engine never consults them.
#[derive(Clone, Debug)]
pub struct GridGraph {
    pub grid: BoolGrid,
    pub components: UnionFind<usize>,
    pub components_dirty: bool,
    teleportation_links: FxHashMap<Point, Point>,
    wrap_around_enabled: bool,
    start: Option<Point>,
    goal: Option<Point>,
}

impl GridGraph {
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.grid.width && (y as usize) < self.grid.height
    }

    pub(crate) fn check_bounds(&self, x: i32, y: i32) -> Result<(), GridError> {
        if self.in_bounds(x, y) {
            Ok(())
        } else {
            Err(GridError::OutOfBounds {
                x,
                y,
                width: self.grid.width,
                height: self.grid.height,
            })
        }
    }

    fn cell_index(&self, cell: &Point) -> usize {
        cell.y as usize * self.grid.width + cell.x as usize
    }

    /// Marks a cell as impassable. Cardinal neighbor enumeration will no
    /// longer emit it; teleportation destinations still may.
    pub fn block_cell(&mut self, x: i32, y: i32) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        self.set(x as usize, y as usize, true);
        Ok(())
    }

    /// Makes a cell passable again.
    pub fn unblock_cell(&mut self, x: i32, y: i32) -> Result<(), GridError> {
        self.check_bounds(x, y)?;
        self.set(x as usize, y as usize, false);
        Ok(())
    }

    pub fn is_blocked(&self, x: i32, y: i32) -> Result<bool, GridError> {
        self.check_bounds(x, y)?;
        Ok(self.grid.get(x as usize, y as usize))
    }

    /// Enables or disables toroidal wrap-around of the cardinal neighbor
    /// computation. Enabling joins the opposite edges of the grid; disabling
    /// severs them and flags the components as dirty.
    pub fn set_wrap_around_enabled(&mut self, enabled: bool) {
        if self.wrap_around_enabled == enabled {
            return;
        }
        self.wrap_around_enabled = enabled;
        if enabled {
            let w = self.grid.width as i32;
            let h = self.grid.height as i32;
            for y in 0..h {
                self.union_if_open(Point::new(0, y), Point::new(w - 1, y));
            }
            for x in 0..w {
                self.union_if_open(Point::new(x, 0), Point::new(x, h - 1));
            }
        } else {
            self.components_dirty = true;
        }
    }

    pub fn is_wrap_around_enabled(&self) -> bool {
        self.wrap_around_enabled
    }

    /// Installs or overwrites the directed teleportation link leaving `from`.
    /// A cell has at most one outgoing link; links are usually installed in
    /// reciprocal pairs but nothing here requires that. Either endpoint may
    /// be a blocked cell.
    pub fn add_teleportation_link(&mut self, from: Point, to: Point) -> Result<(), GridError> {
        self.check_bounds(from.x, from.y)?;
        self.check_bounds(to.x, to.y)?;
        match self.teleportation_links.insert(from, to) {
            // Overwriting severs the previous edge, which can split a component.
            Some(previous) if previous != to => self.components_dirty = true,
            _ => self.union_if_open(from, to),
        }
        Ok(())
    }

    pub fn is_teleportation_node(&self, cell: &Point) -> bool {
        self.teleportation_links.contains_key(cell)
    }

    pub fn teleport_destination(&self, cell: &Point) -> Option<Point> {
        self.teleportation_links.get(cell).copied()
    }

    /// All cells with an outgoing teleportation link.
    pub fn teleportation_nodes(&self) -> Vec<Point> {
        self.teleportation_links.keys().copied().collect()
    }

    /// Sets (or unsets) the designated start cell. The cell may be blocked
    /// or a teleportation node; only its coordinates are validated.
    pub fn set_start(&mut self, start: Option<Point>) -> Result<(), GridError> {
        if let Some(p) = start {
            self.check_bounds(p.x, p.y)?;
        }
        self.start = start;
        Ok(())
    }

    /// Sets (or unsets) the designated goal cell.
    pub fn set_goal(&mut self, goal: Option<Point>) -> Result<(), GridError> {
        if let Some(p) = goal {
            self.check_bounds(p.x, p.y)?;
        }
        self.goal = goal;
        Ok(())
    }

    pub fn start(&self) -> Option<Point> {
        self.start
    }

    pub fn goal(&self) -> Option<Point> {
        self.goal
    }

    /// Enumerates the neighbors of a cell: up to four cardinal neighbors in
    /// fixed north, east, south, west order, wrapping at the edges when
    /// wrap-around is enabled and otherwise dropping out-of-bounds targets,
    /// with blocked targets filtered out; then, if the cell has an outgoing
    /// teleportation link, its destination appended last, unconditionally.
    /// The destination bypasses the blocked filter and may duplicate a
    /// cardinal neighbor.
    pub fn neighbors(&self, cell: &Point) -> SmallVec<[Point; N_SMALLVEC_SIZE]> {
        let mut neighbors = SmallVec::new();
        let w = self.grid.width as i32;
        let h = self.grid.height as i32;
        for (dx, dy) in CARDINAL_OFFSETS {
            let mut nx = cell.x + dx;
            let mut ny = cell.y + dy;
            if self.wrap_around_enabled {
                if nx < 0 {
                    nx = w - 1;
                }
                if nx >= w {
                    nx = 0;
                }
                if ny < 0 {
                    ny = h - 1;
                }
                if ny >= h {
                    ny = 0;
                }
            }
            if self.in_bounds(nx, ny) && !self.grid.get(nx as usize, ny as usize) {
                neighbors.push(Point::new(nx, ny));
            }
        }
        if let Some(destination) = self.teleport_destination(cell) {
            neighbors.push(destination);
        }
        neighbors
    }

    /// The neighbors of a cell paired with the cost of stepping to each.
    pub fn neighborhood_with_cost(&self, cell: &Point) -> SmallVec<[(Point, i32); N_SMALLVEC_SIZE]> {
        self.neighbors(cell)
            .into_iter()
            .map(|neighbor| (neighbor, self.edge_cost(cell, &neighbor)))
            .collect()
    }

    /// The cost of traversing one edge. Every traversable edge costs the
    /// same single unit, cardinal step and teleportation jump alike.
    pub fn edge_cost(&self, _from: &Point, _to: &Point) -> i32 {
        UNIT_EDGE_COST
    }

    /// The number of unblocked cells.
    pub fn vertex_count(&self) -> usize {
        let mut count = 0;
        for x in 0..self.grid.width {
            for y in 0..self.grid.height {
                if !self.grid.get(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// The number of directed edges: the sum of `neighbors(cell)` sizes over
    /// all unblocked cells. A bidirectional cardinal adjacency counts twice,
    /// once from each endpoint.
    pub fn edge_count(&self) -> usize {
        let mut count = 0;
        for x in 0..self.grid.width {
            for y in 0..self.grid.height {
                if !self.grid.get(x, y) {
                    count += self.neighbors(&Point::new(x as i32, y as i32)).len();
                }
            }
        }
        count
    }

    /// Packages the vertex and edge counts with the asymptotic bounds of the
    /// binary-heap best-first family running over this graph.
    pub fn complexity_estimate(&self) -> ComplexityEstimate {
        ComplexityEstimate {
            vertices: self.vertex_count(),
            edges: self.edge_count(),
        }
    }

    /// Resets blocked state, teleportation links, and start/goal, leaving
    /// the dimensions and the wrap-around flag unchanged.
    pub fn clear(&mut self) {
        for x in 0..self.grid.width {
            for y in 0..self.grid.height {
                self.grid.set(x, y, false);
            }
        }
        self.teleportation_links.clear();
        self.start = None;
        self.goal = None;
        self.components_dirty = true;
    }

    fn union_if_open(&mut self, a: Point, b: Point) {
        if self.in_bounds(a.x, a.y)
            && self.in_bounds(b.x, b.y)
            && !self.grid.get(a.x as usize, a.y as usize)
            && !self.grid.get(b.x as usize, b.y as usize)
        {
            let a_ix = self.cell_index(&a);
            let b_ix = self.cell_index(&b);
            self.components.union(a_ix, b_ix);
        }
    }

    /// Joins a freshly opened cell to the components of its unblocked
    /// cardinal neighbors, its outgoing link target, and any link sources
    /// pointing at it.
    fn union_with_neighborhood(&mut self, cell: Point) {
        for neighbor in self.neighbors(&cell) {
            self.union_if_open(cell, neighbor);
        }
        let incoming: Vec<Point> = self
            .teleportation_links
            .iter()
            .filter(|(_, destination)| **destination == cell)
            .map(|(source, _)| *source)
            .collect();
        for source in incoming {
            self.union_if_open(source, cell);
        }
    }

    /// Retrieves the component id a given cell belongs to, or [None] for
    /// out-of-bounds coordinates.
    pub fn component_of(&self, cell: &Point) -> Option<usize> {
        if self.in_bounds(cell.x, cell.y) {
            Some(self.components.find(self.cell_index(cell)))
        } else {
            None
        }
    }

    /// Checks if start and goal are on the same component.
    pub fn reachable(&self, start: &Point, goal: &Point) -> bool {
        !self.unreachable(start, goal)
    }

    /// Checks if start and goal are not on the same component.
    pub fn unreachable(&self, start: &Point, goal: &Point) -> bool {
        if self.in_bounds(start.x, start.y) && self.in_bounds(goal.x, goal.y) {
            let start_ix = self.cell_index(start);
            let goal_ix = self.cell_index(goal);
            !self.components.equiv(start_ix, goal_ix)
        } else {
            true
        }
    }

    /// Regenerates the components if they are marked as dirty.
    pub fn update(&mut self) {
        if self.components_dirty {
            info!("Components are dirty: regenerating components");
            self.generate_components();
        }
    }

    /// Generates a new [UnionFind] structure and links up grid neighbours to
    /// the same components, honoring wrap-around and teleportation links.
    pub fn generate_components(&mut self) {
        info!("Generating connected components");
        let w = self.grid.width;
        let h = self.grid.height;
        self.components = UnionFind::new(w * h);
        self.components_dirty = false;
        for x in 0..w as i32 {
            for y in 0..h as i32 {
                if self.grid.get(x as usize, y as usize) {
                    continue;
                }
                let cell = Point::new(x, y);
                // Half neighborhood: the east and north adjacency of every
                // cell covers each undirected cardinal edge exactly once.
                for (mut nx, mut ny) in [(x + 1, y), (x, y + 1)] {
                    if self.wrap_around_enabled {
                        if nx >= w as i32 {
                            nx = 0;
                        }
                        if ny >= h as i32 {
                            ny = 0;
                        }
                    } else if nx >= w as i32 || ny >= h as i32 {
                        continue;
                    }
                    self.union_if_open(cell, Point::new(nx, ny));
                }
            }
        }
        let links: Vec<(Point, Point)> = self
            .teleportation_links
            .iter()
            .map(|(source, destination)| (*source, *destination))
            .collect();
        for (source, destination) in links {
            self.union_if_open(source, destination);
        }
    }
}

impl fmt::Display for GridGraph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Grid:")?;
        for y in 0..self.grid.height {
            let values = (0..self.grid.width)
                .map(|x| self.grid.get(x, y) as i32)
                .collect::<Vec<i32>>();
            writeln!(f, "{:?}", values)?;
        }
        Ok(())
    }
}

impl Grid<bool> for GridGraph {
    fn new(width: usize, height: usize, default_value: bool) -> Self {
        GridGraph {
            grid: BoolGrid::new(width, height, default_value),
            components: UnionFind::new(width * height),
            components_dirty: false,
            teleportation_links: FxHashMap::default(),
            wrap_around_enabled: false,
            start: None,
            goal: None,
        }
    }
    fn get(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }
    /// Updates the blocked state of a cell. Joins newly connected components
    /// and flags the components as dirty if components are (potentially)
    /// broken apart into multiple.
    fn set(&mut self, x: usize, y: usize, blocked: bool) {
        if self.grid.get(x, y) != blocked && blocked {
            self.components_dirty = true;
            self.grid.set(x, y, blocked);
        } else {
            self.grid.set(x, y, blocked);
            self.union_with_neighborhood(Point::new(x as i32, y as i32));
        }
    }
    fn width(&self) -> usize {
        self.grid.width()
    }
    fn height(&self) -> usize {
        self.grid.height()
    }
}

/// Vertex and edge counts of a graph together with the worst-case bounds of
/// running any of the search variants over it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComplexityEstimate {
    pub vertices: usize,
    pub edges: usize,
}

impl ComplexityEstimate {
    pub fn time(&self) -> String {
        format!("O((V + E) log V), V = {}, E = {}", self.vertices, self.edges)
    }

    pub fn space(&self) -> String {
        format!("O(V), V = {}", self.vertices)
    }
}

impl fmt::Display for ComplexityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "time {}; space {}", self.time(), self.space())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cardinal neighbors come out in fixed north, east, south, west order.
    #[test]
    fn neighbor_order_is_north_east_south_west() {
        let graph = GridGraph::new(5, 5, false);
        let neighbors = graph.neighbors(&Point::new(2, 2));
        assert_eq!(
            neighbors.as_slice(),
            [
                Point::new(2, 3),
                Point::new(3, 2),
                Point::new(2, 1),
                Point::new(1, 2)
            ]
        );
    }

    #[test]
    fn blocked_targets_are_filtered() {
        let mut graph = GridGraph::new(3, 3, false);
        graph.block_cell(1, 2).unwrap();
        graph.block_cell(2, 1).unwrap();
        let neighbors = graph.neighbors(&Point::new(1, 1));
        assert_eq!(
            neighbors.as_slice(),
            [Point::new(1, 0), Point::new(0, 1)]
        );
    }

    #[test]
    fn corner_without_wrap_has_two_neighbors() {
        let graph = GridGraph::new(5, 5, false);
        let neighbors = graph.neighbors(&Point::new(0, 0));
        assert_eq!(neighbors.as_slice(), [Point::new(0, 1), Point::new(1, 0)]);
    }

    /// With wrap-around on a width-5 grid the west neighbor of (0, y) is
    /// (4, y); disabling wrap-around removes it again.
    #[test]
    fn wrap_around_west_edge() {
        let mut graph = GridGraph::new(5, 5, false);
        graph.set_wrap_around_enabled(true);
        let wrapped = graph.neighbors(&Point::new(0, 2));
        assert_eq!(
            wrapped.as_slice(),
            [
                Point::new(0, 3),
                Point::new(1, 2),
                Point::new(0, 1),
                Point::new(4, 2)
            ]
        );
        graph.set_wrap_around_enabled(false);
        let unwrapped = graph.neighbors(&Point::new(0, 2));
        assert_eq!(
            unwrapped.as_slice(),
            [Point::new(0, 3), Point::new(1, 2), Point::new(0, 1)]
        );
    }

    /// Teleport destinations are appended last and bypass the blocked
    /// filter, even when the destination duplicates a cardinal neighbor.
    #[test]
    fn teleport_destination_appended_unconditionally() {
        let mut graph = GridGraph::new(5, 5, false);
        graph
            .add_teleportation_link(Point::new(2, 2), Point::new(4, 4))
            .unwrap();
        graph.block_cell(4, 4).unwrap();
        let neighbors = graph.neighbors(&Point::new(2, 2));
        assert_eq!(neighbors.len(), 5);
        assert_eq!(neighbors[4], Point::new(4, 4));

        graph
            .add_teleportation_link(Point::new(0, 0), Point::new(0, 1))
            .unwrap();
        let duplicated = graph.neighbors(&Point::new(0, 0));
        assert_eq!(
            duplicated.as_slice(),
            [Point::new(0, 1), Point::new(1, 0), Point::new(0, 1)]
        );
    }

    #[test]
    fn teleportation_queries() {
        let mut graph = GridGraph::new(4, 4, false);
        let a = Point::new(0, 0);
        let b = Point::new(3, 3);
        graph.add_teleportation_link(a, b).unwrap();
        graph.add_teleportation_link(b, a).unwrap();
        assert!(graph.is_teleportation_node(&a));
        assert!(graph.is_teleportation_node(&b));
        assert!(!graph.is_teleportation_node(&Point::new(1, 1)));
        assert_eq!(graph.teleport_destination(&a), Some(b));
        assert_eq!(graph.teleport_destination(&Point::new(1, 1)), None);
        let mut nodes = graph.teleportation_nodes();
        nodes.sort_by_key(|p| (p.x, p.y));
        assert_eq!(nodes, vec![a, b]);
    }

    #[test]
    fn neighborhood_costs_are_uniform() {
        let mut graph = GridGraph::new(3, 3, false);
        graph
            .add_teleportation_link(Point::new(1, 1), Point::new(0, 0))
            .unwrap();
        let with_cost = graph.neighborhood_with_cost(&Point::new(1, 1));
        assert_eq!(with_cost.len(), 5);
        assert!(with_cost.iter().all(|(_, cost)| *cost == UNIT_EDGE_COST));
    }

    #[test]
    fn vertex_and_edge_counts() {
        let mut graph = GridGraph::new(3, 3, false);
        assert_eq!(graph.vertex_count(), 9);
        // 4 corners x 2 + 4 edge cells x 3 + 1 center x 4.
        assert_eq!(graph.edge_count(), 24);

        graph.set_wrap_around_enabled(true);
        assert_eq!(graph.edge_count(), 36);
        graph.set_wrap_around_enabled(false);

        graph
            .add_teleportation_link(Point::new(0, 0), Point::new(2, 2))
            .unwrap();
        assert_eq!(graph.edge_count(), 25);

        graph.block_cell(1, 1).unwrap();
        assert_eq!(graph.vertex_count(), 8);
        let estimate = graph.complexity_estimate();
        assert_eq!(estimate.vertices, 8);
        assert!(estimate.time().contains("log V"));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut graph = GridGraph::new(4, 3, false);
        assert!(graph.block_cell(1, 2).is_ok());
        assert_eq!(
            graph.block_cell(4, 0),
            Err(GridError::OutOfBounds {
                x: 4,
                y: 0,
                width: 4,
                height: 3
            })
        );
        assert!(graph.is_blocked(-1, 0).is_err());
        assert!(graph
            .add_teleportation_link(Point::new(0, 0), Point::new(0, 3))
            .is_err());
        assert!(graph.set_start(Some(Point::new(9, 9))).is_err());
        assert!(graph.set_start(Some(Point::new(0, 0))).is_ok());
        assert_eq!(graph.start(), Some(Point::new(0, 0)));
    }

    #[test]
    fn clear_resets_state_but_not_dimensions() {
        let mut graph = GridGraph::new(4, 4, false);
        graph.block_cell(1, 1).unwrap();
        graph
            .add_teleportation_link(Point::new(0, 0), Point::new(3, 3))
            .unwrap();
        graph.set_start(Some(Point::new(0, 0))).unwrap();
        graph.set_goal(Some(Point::new(3, 3))).unwrap();
        graph.set_wrap_around_enabled(true);
        graph.clear();
        assert!(!graph.is_blocked(1, 1).unwrap());
        assert!(!graph.is_teleportation_node(&Point::new(0, 0)));
        assert_eq!(graph.start(), None);
        assert_eq!(graph.goal(), None);
        assert_eq!(graph.width(), 4);
        assert!(graph.is_wrap_around_enabled());
    }

    /// Tests whether cells are correctly mapped to different connected
    /// components.
    #[test]
    fn component_generation() {
        // Corresponds to the following 3x2 grid:
        //  ___
        // | # |
        // | # |
        //  ---
        let mut graph = GridGraph::new(3, 2, false);
        graph.grid.set(1, 0, true);
        graph.grid.set(1, 1, true);
        graph.generate_components();
        let left = Point::new(0, 0);
        let left_up = Point::new(0, 1);
        let right = Point::new(2, 0);
        assert!(graph.reachable(&left, &left_up));
        assert!(graph.unreachable(&left, &right));
        assert_eq!(graph.component_of(&left), graph.component_of(&left_up));
    }

    /// A teleportation link joins two otherwise separate components.
    #[test]
    fn components_honor_teleportation() {
        let mut graph = GridGraph::new(3, 3, false);
        for y in 0..3 {
            graph.block_cell(1, y).unwrap();
        }
        graph.generate_components();
        let left = Point::new(0, 0);
        let right = Point::new(2, 2);
        assert!(graph.unreachable(&left, &right));
        graph.add_teleportation_link(left, right).unwrap();
        graph.add_teleportation_link(right, left).unwrap();
        assert!(graph.reachable(&left, &right));
    }

    /// Enabling wrap-around joins the components across the severed column;
    /// disabling it flags them dirty for regeneration.
    #[test]
    fn components_honor_wrap_around() {
        let mut graph = GridGraph::new(5, 1, false);
        graph.block_cell(2, 0).unwrap();
        graph.generate_components();
        let west = Point::new(0, 0);
        let east = Point::new(4, 0);
        assert!(graph.unreachable(&west, &east));
        graph.set_wrap_around_enabled(true);
        assert!(graph.reachable(&west, &east));
        graph.set_wrap_around_enabled(false);
        assert!(graph.components_dirty);
        graph.update();
        assert!(graph.unreachable(&west, &east));
    }

    #[test]
    fn blocking_dirties_and_unblocking_rejoins() {
        let mut graph = GridGraph::new(3, 1, false);
        graph.block_cell(1, 0).unwrap();
        assert!(graph.components_dirty);
        graph.update();
        assert!(graph.unreachable(&Point::new(0, 0), &Point::new(2, 0)));
        graph.unblock_cell(1, 0).unwrap();
        assert!(graph.reachable(&Point::new(0, 0), &Point::new(2, 0)));
    }

    #[test]
    fn overwriting_a_link_dirties_components() {
        let mut graph = GridGraph::new(4, 1, false);
        graph.block_cell(1, 0).unwrap();
        graph.block_cell(3, 0).unwrap();
        graph.generate_components();
        let a = Point::new(0, 0);
        let b = Point::new(2, 0);
        graph.add_teleportation_link(a, b).unwrap();
        assert!(graph.reachable(&a, &b));
        // Redirect the link elsewhere; the old union is stale now.
        graph
            .add_teleportation_link(a, Point::new(3, 0))
            .unwrap();
        assert!(graph.components_dirty);
        graph.update();
        assert!(graph.unreachable(&a, &b));
    }
}
