//! The single best-first loop shared by every search variant, adapted from
//! [pathfinding's astar function](https://docs.rs/pathfinding/latest/pathfinding/directed/astar/index.html)
//! to keep a closed set and to count the nodes it settles.

use fxhash::{FxBuildHasher, FxHashSet};
use indexmap::map::Entry::{Occupied, Vacant};
use indexmap::IndexMap;
use num_traits::Zero;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::hash::Hash;

struct SmallestCostHolder<K> {
    estimated_cost: K,
    cost: K,
    index: usize,
}

impl<K: PartialEq> Eq for SmallestCostHolder<K> {}

impl<K: PartialEq> PartialEq for SmallestCostHolder<K> {
    fn eq(&self, other: &Self) -> bool {
        self.estimated_cost.eq(&other.estimated_cost) && self.cost.eq(&other.cost)
    }
}

impl<K: Ord> PartialOrd for SmallestCostHolder<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for SmallestCostHolder<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        // First orders per estimated cost, then creates subordering
        // based on cost, favoring exploration of smallest cost nodes first
        match other.estimated_cost.cmp(&self.estimated_cost) {
            Ordering::Equal => self.cost.cmp(&other.cost),
            s => s,
        }
    }
}

fn reverse_path<N, V, F>(parents: &FxIndexMap<N, V>, mut parent: F, start: usize) -> Vec<N>
where
    N: Eq + Hash + Clone,
    F: FnMut(&V) -> usize,
{
    let mut path: Vec<N> = itertools::unfold(start, |i| {
        parents.get_index(*i).map(|(node, value)| {
            *i = parent(value);
            node.clone()
        })
    })
    .collect();
    path.reverse();
    path
}

/// Working state of a best-first search, reusable across searches. The
/// parent map doubles as the open bookkeeping, the closed set records
/// settled nodes, and the counter is the number of nodes settled by the
/// latest search.
#[derive(Clone, Debug)]
pub(crate) struct SearchContext<N, C> {
    parents: FxIndexMap<N, (usize, C)>,
    closed: FxHashSet<N>,
    explored: usize,
}

impl<N, C> SearchContext<N, C>
where
    N: Eq + Hash + Clone,
    C: Zero + Ord + Copy,
{
    pub(crate) fn new() -> Self {
        SearchContext {
            parents: FxIndexMap::default(),
            closed: FxHashSet::default(),
            explored: 0,
        }
    }

    /// The number of nodes settled by the most recent search. A node
    /// counts when it is popped with its final cost; duplicate heap
    /// entries for it are discarded without counting.
    pub(crate) fn nodes_explored(&self) -> usize {
        self.explored
    }

    /// Runs a best-first search from `start` until `success` or
    /// exhaustion. The variants differ only in the closures passed here:
    /// `successors` yields neighbors with their edge weights and
    /// `heuristic` estimates the remaining cost. A node is settled at most
    /// once; an open node is rerouted only by a strictly cheaper path.
    pub(crate) fn best_first_search<FN, IN, FH, FS>(
        &mut self,
        start: &N,
        mut successors: FN,
        mut heuristic: FH,
        mut success: FS,
    ) -> Option<(Vec<N>, C)>
    where
        FN: FnMut(&N) -> IN,
        IN: IntoIterator<Item = (N, C)>,
        FH: FnMut(&N) -> C,
        FS: FnMut(&N) -> bool,
    {
        self.parents.clear();
        self.closed.clear();
        self.explored = 0;
        let mut to_see = BinaryHeap::new();
        to_see.push(SmallestCostHolder {
            estimated_cost: Zero::zero(),
            cost: Zero::zero(),
            index: 0,
        });
        self.parents.insert(start.clone(), (usize::MAX, Zero::zero()));
        while let Some(SmallestCostHolder { cost, index, .. }) = to_see.pop() {
            let successors = {
                let (node, &(_, c)) = self.parents.get_index(index).unwrap();
                if self.closed.contains(node) {
                    continue;
                }
                // We may have inserted a node several times into the binary
                // heap if we found a better way to access it. Ensure that we
                // are currently dealing with the best path and discard the
                // others.
                if cost > c {
                    continue;
                }
                self.explored += 1;
                if success(node) {
                    let path = reverse_path(&self.parents, |&(p, _)| p, index);
                    return Some((path, cost));
                }
                self.closed.insert(node.clone());
                successors(node)
            };
            for (successor, move_cost) in successors {
                if self.closed.contains(&successor) {
                    continue;
                }
                let new_cost = cost + move_cost;
                let h; // heuristic(&successor)
                let n; // index for successor
                match self.parents.entry(successor) {
                    Vacant(e) => {
                        h = heuristic(e.key());
                        n = e.index();
                        e.insert((index, new_cost));
                    }
                    Occupied(mut e) => {
                        if e.get().1 > new_cost {
                            h = heuristic(e.key());
                            n = e.index();
                            e.insert((index, new_cost));
                        } else {
                            continue;
                        }
                    }
                }

                to_see.push(SmallestCostHolder {
                    estimated_cost: new_cost + h,
                    cost: new_cost,
                    index: n,
                });
            }
        }
        None
    }
}
