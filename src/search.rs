//! Generic A* engine.
//!
//! The frontier is a binary heap keyed on `g + h` with FIFO tie-breaking
//! (an insertion counter), backed by a per-key record map that gives
//! decrease-key semantics by lazy re-insertion. Nodes are deduplicated by
//! their canonical string key; a closed set prevents re-expansion. The
//! search stops on the first goal dequeue.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, hash_map::Entry};
use std::time::{Duration, Instant};

use log::debug;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub trait SearchSpace {
    type Node: Clone;
    /// Edge label carried into the reconstructed path.
    type Step: Clone;

    fn key(&self, node: &Self::Node) -> String;
    fn successors(&mut self, node: &Self::Node) -> Vec<(Self::Step, Self::Node, usize)>;
    fn is_goal(&self, node: &Self::Node) -> bool;
    fn heuristic(&self, node: &Self::Node) -> usize;
}

/// Wall-clock budget plus a cooperative cancellation signal, both checked
/// once per expansion.
#[derive(Clone, Debug)]
pub struct SearchLimits {
    pub timeout: Duration,
    pub cancel: CancellationToken,
}

impl Default for SearchLimits {
    fn default() -> Self {
        SearchLimits { timeout: DEFAULT_TIMEOUT, cancel: CancellationToken::new() }
    }
}

#[derive(Clone, Debug)]
pub struct FoundPath<N, S> {
    /// Steps from the start (exclusive) to the goal, each with the node it
    /// leads to.
    pub steps: Vec<(S, N)>,
    pub cost: usize,
    /// Nodes ever added to the frontier.
    pub discovered: usize,
}

#[derive(Clone, Debug)]
pub enum SearchOutcome<N, S> {
    Found(FoundPath<N, S>),
    Exhausted { discovered: usize },
    Timeout { discovered: usize },
}

impl<N, S> SearchOutcome<N, S> {
    pub fn found(self) -> Option<FoundPath<N, S>> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SearchOutcome::Timeout { .. })
    }
}

struct Record<N, S> {
    node: N,
    best_cost: usize,
    heuristic: usize,
    parent: Option<(String, S)>,
}

pub fn astar<S: SearchSpace>(
    space: &mut S,
    start: S::Node,
    limits: &SearchLimits,
) -> SearchOutcome<S::Node, S::Step> {
    let started = Instant::now();
    let mut records: HashMap<String, Record<S::Node, S::Step>> = HashMap::new();
    // (f, insertion sequence, g, key); the sequence is unique, so ordering
    // never reaches g or the key.
    let mut open: BinaryHeap<Reverse<(usize, u64, usize, String)>> = BinaryHeap::new();
    let mut closed: HashSet<String> = HashSet::new();
    let mut seq: u64 = 0;
    let mut discovered: usize = 1;

    let start_key = space.key(&start);
    let start_h = space.heuristic(&start);
    records.insert(
        start_key.clone(),
        Record { node: start, best_cost: 0, heuristic: start_h, parent: None },
    );
    open.push(Reverse((start_h, seq, 0, start_key)));

    while let Some(Reverse((_, _, cost, key))) = open.pop() {
        if closed.contains(&key) {
            continue;
        }
        let record = &records[&key];
        if cost > record.best_cost {
            // Superseded by a cheaper re-insertion.
            continue;
        }
        let node = record.node.clone();

        if space.is_goal(&node) {
            let steps = reconstruct(&records, &key);
            debug!(
                target: "search",
                "goal at cost {cost}, {discovered} nodes discovered, {} expanded",
                closed.len()
            );
            return SearchOutcome::Found(FoundPath { steps, cost, discovered });
        }
        if started.elapsed() > limits.timeout || limits.cancel.is_cancelled() {
            debug!(target: "search", "gave up after {discovered} nodes");
            return SearchOutcome::Timeout { discovered };
        }
        closed.insert(key.clone());

        for (step, successor, step_cost) in space.successors(&node) {
            let successor_key = space.key(&successor);
            if closed.contains(&successor_key) {
                continue;
            }
            let next_cost = cost + step_cost;
            let heuristic = match records.entry(successor_key.clone()) {
                Entry::Occupied(mut entry) => {
                    let record = entry.get_mut();
                    if next_cost >= record.best_cost {
                        continue;
                    }
                    record.best_cost = next_cost;
                    record.parent = Some((key.clone(), step));
                    record.heuristic
                }
                Entry::Vacant(entry) => {
                    let heuristic = space.heuristic(&successor);
                    discovered += 1;
                    entry.insert(Record {
                        node: successor,
                        best_cost: next_cost,
                        heuristic,
                        parent: Some((key.clone(), step)),
                    });
                    heuristic
                }
            };
            seq += 1;
            open.push(Reverse((next_cost + heuristic, seq, next_cost, successor_key)));
        }
    }

    debug!(target: "search", "exhausted after {discovered} nodes");
    SearchOutcome::Exhausted { discovered }
}

fn reconstruct<N: Clone, S: Clone>(
    records: &HashMap<String, Record<N, S>>,
    goal_key: &str,
) -> Vec<(S, N)> {
    let mut steps = Vec::new();
    let mut cursor = goal_key.to_owned();
    loop {
        let record = &records[&cursor];
        match &record.parent {
            Some((previous, step)) => {
                steps.push((step.clone(), record.node.clone()));
                cursor = previous.clone();
            }
            None => break,
        }
    }
    steps.reverse();
    steps
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use assertables::{assert_gt, assert_lt};
    use test_case::test_case;

    use super::*;

    /// 2-D grid harness: four-connected cells, optional walls, optional
    /// Manhattan heuristic.
    struct GridSpace {
        width: i32,
        height: i32,
        walls: HashSet<(i32, i32)>,
        goal: (i32, i32),
        manhattan: bool,
    }

    impl GridSpace {
        fn open(&self, cell: (i32, i32)) -> bool {
            (0..self.width).contains(&cell.0)
                && (0..self.height).contains(&cell.1)
                && !self.walls.contains(&cell)
        }

        fn bfs_distance(&self, start: (i32, i32)) -> Option<usize> {
            let mut seen = HashSet::from([start]);
            let mut queue = VecDeque::from([(start, 0)]);
            while let Some((cell, dist)) = queue.pop_front() {
                if cell == self.goal {
                    return Some(dist);
                }
                for next in neighbors(cell) {
                    if self.open(next) && seen.insert(next) {
                        queue.push_back((next, dist + 1));
                    }
                }
            }
            None
        }
    }

    fn neighbors((x, y): (i32, i32)) -> [(i32, i32); 4] {
        [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]
    }

    impl SearchSpace for GridSpace {
        type Node = (i32, i32);
        type Step = (i32, i32);

        fn key(&self, node: &Self::Node) -> String {
            format!("{},{}", node.0, node.1)
        }

        fn successors(&mut self, node: &Self::Node) -> Vec<(Self::Step, Self::Node, usize)> {
            neighbors(*node)
                .into_iter()
                .filter(|cell| self.open(*cell))
                .map(|cell| (cell, cell, 1))
                .collect()
        }

        fn is_goal(&self, node: &Self::Node) -> bool {
            *node == self.goal
        }

        fn heuristic(&self, node: &Self::Node) -> usize {
            if self.manhattan {
                (node.0.abs_diff(self.goal.0) + node.1.abs_diff(self.goal.1)) as usize
            } else {
                0
            }
        }
    }

    fn snake_maze(manhattan: bool) -> GridSpace {
        // Two wall columns with gaps at opposite ends force an S-shaped
        // detour.
        let walls = (0..8)
            .flat_map(|y| [(2, y), (5, 7 - y)])
            .filter(|&(x, y)| !(x == 2 && y == 7) && !(x == 5 && y == 0))
            .collect();
        GridSpace { width: 8, height: 8, walls, goal: (7, 0), manhattan }
    }

    #[test_case(true; "manhattan")]
    #[test_case(false; "zero heuristic")]
    fn astar_is_optimal_on_the_maze(manhattan: bool) {
        let mut space = snake_maze(manhattan);
        let expected = space.bfs_distance((0, 0)).unwrap();
        let path = astar(&mut space, (0, 0), &SearchLimits::default()).found().unwrap();
        assert_eq!(path.cost, expected);
        assert_eq!(path.steps.len(), path.cost, "unit steps: cost equals path length");
    }

    #[test]
    fn manhattan_discovers_fewer_nodes() {
        // Open corridor: rows away from the goal row have a strictly larger
        // f, so the informed search never reaches most of the grid.
        let make = |manhattan| GridSpace {
            width: 5,
            height: 5,
            walls: HashSet::new(),
            goal: (4, 2),
            manhattan,
        };
        let informed =
            astar(&mut make(true), (0, 2), &SearchLimits::default()).found().unwrap();
        let uninformed =
            astar(&mut make(false), (0, 2), &SearchLimits::default()).found().unwrap();
        assert_eq!(informed.cost, uninformed.cost);
        assert_lt!(informed.discovered, uninformed.discovered);
    }

    /// Tiny weighted graph where the cheap route to `b` is found after the
    /// expensive one, exercising the decrease-key path.
    struct WeightedSpace;

    impl SearchSpace for WeightedSpace {
        type Node = &'static str;
        type Step = &'static str;

        fn key(&self, node: &Self::Node) -> String {
            node.to_string()
        }

        fn successors(&mut self, node: &Self::Node) -> Vec<(Self::Step, Self::Node, usize)> {
            match *node {
                "a" => vec![("a->b", "b", 10), ("a->c", "c", 1)],
                "c" => vec![("c->b", "b", 1)],
                _ => vec![],
            }
        }

        fn is_goal(&self, node: &Self::Node) -> bool {
            *node == "b"
        }

        fn heuristic(&self, _node: &Self::Node) -> usize {
            0
        }
    }

    #[test]
    fn cheaper_late_path_wins() {
        let path = astar(&mut WeightedSpace, "a", &SearchLimits::default()).found().unwrap();
        assert_eq!(path.cost, 2);
        let steps: Vec<_> = path.steps.iter().map(|(step, _)| *step).collect();
        assert_eq!(steps, ["a->c", "c->b"]);
    }

    #[test]
    fn exhaustion_is_reported() {
        let mut space = GridSpace {
            width: 3,
            height: 1,
            walls: HashSet::from([(1, 0)]),
            goal: (2, 0),
            manhattan: true,
        };
        let outcome = astar(&mut space, (0, 0), &SearchLimits::default());
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
    }

    #[test]
    fn cancellation_stops_the_search() {
        let limits = SearchLimits::default();
        limits.cancel.cancel();
        let outcome = astar(&mut snake_maze(false), (0, 0), &limits);
        assert!(outcome.is_timeout());
    }

    #[test]
    fn discovered_counts_are_sane() {
        let path = astar(&mut snake_maze(true), (0, 0), &SearchLimits::default())
            .found()
            .unwrap();
        assert_gt!(path.discovered, path.cost);
    }
}
