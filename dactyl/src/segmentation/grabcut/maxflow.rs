//! Dinic max-flow specialised for graph-cut segmentation.
//!
//! Every pixel is a node. Terminal capacities are stored per node and the
//! common part of the source and sink capacity is cancelled up front, which
//! leaves each node attached to at most one terminal.

use std::collections::VecDeque;

const NONE: u32 = u32::MAX;
const CAPACITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy)]
struct Arc {
    to: u32,
    next: u32,
    cap: f64,
}

#[derive(Debug)]
pub(super) struct FlowGraph {
    node_count: usize,
    head: Vec<u32>,
    arcs: Vec<Arc>,
    level: Vec<u32>,
    cursor: Vec<u32>,
}

impl FlowGraph {
    /// Graph with `nodes` inner nodes plus the two terminals.
    pub(super) fn new(nodes: usize, arcs_hint: usize) -> Self {
        let total = nodes + 2;
        Self {
            node_count: nodes,
            head: vec![NONE; total],
            arcs: Vec::with_capacity(arcs_hint),
            level: vec![0; total],
            cursor: vec![NONE; total],
        }
    }

    #[inline]
    fn source(&self) -> usize {
        self.node_count
    }

    #[inline]
    fn sink(&self) -> usize {
        self.node_count + 1
    }

    fn push_arc(&mut self, from: usize, to: usize, cap: f64) {
        let idx = self.arcs.len() as u32;
        self.arcs.push(Arc {
            to: to as u32,
            next: self.head[from],
            cap,
        });
        self.head[from] = idx;
    }

    /// Arc pair `a → b` / `b → a` with the given capacities.
    fn add_pair(&mut self, a: usize, b: usize, cap_ab: f64, cap_ba: f64) {
        self.push_arc(a, b, cap_ab);
        self.push_arc(b, a, cap_ba);
    }

    /// Undirected neighbour link.
    pub(super) fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        self.add_pair(a, b, weight, weight);
    }

    /// Terminal links of one node. Only the difference between the two
    /// capacities influences the cut.
    pub(super) fn add_terminal(&mut self, node: usize, from_source: f64, to_sink: f64) {
        let common = from_source.min(to_sink);
        let (s, t) = (from_source - common, to_sink - common);
        if s > CAPACITY_EPSILON {
            self.add_pair(self.source(), node, s, 0.0);
        } else if t > CAPACITY_EPSILON {
            self.add_pair(node, self.sink(), t, 0.0);
        }
    }

    fn build_levels(&mut self) -> bool {
        self.level.fill(NONE);
        let source = self.source();
        self.level[source] = 0;
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let mut e = self.head[v];
            while e != NONE {
                let arc = self.arcs[e as usize];
                if arc.cap > CAPACITY_EPSILON && self.level[arc.to as usize] == NONE {
                    self.level[arc.to as usize] = self.level[v] + 1;
                    queue.push_back(arc.to as usize);
                }
                e = arc.next;
            }
        }
        self.level[self.sink()] != NONE
    }

    /// Saturate the level graph with augmenting paths found by an explicit-stack DFS.
    fn blocking_flow(&mut self) -> f64 {
        let (source, sink) = (self.source(), self.sink());
        self.cursor.copy_from_slice(&self.head);
        let mut total = 0.0;
        let mut path: Vec<u32> = Vec::new();
        let mut v = source;

        loop {
            if v == sink {
                let bottleneck = path
                    .iter()
                    .map(|&e| self.arcs[e as usize].cap)
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.arcs[e as usize].cap -= bottleneck;
                    self.arcs[(e ^ 1) as usize].cap += bottleneck;
                }
                total += bottleneck;
                path.clear();
                v = source;
                continue;
            }

            let mut advanced = false;
            while self.cursor[v] != NONE {
                let e = self.cursor[v];
                let arc = self.arcs[e as usize];
                if arc.cap > CAPACITY_EPSILON && self.level[arc.to as usize] == self.level[v] + 1 {
                    path.push(e);
                    v = arc.to as usize;
                    advanced = true;
                    break;
                }
                self.cursor[v] = arc.next;
            }
            if advanced {
                continue;
            }

            // dead end: retreat one arc and skip it
            match path.pop() {
                None => return total,
                Some(e) => {
                    self.level[v] = NONE;
                    v = self.arcs[(e ^ 1) as usize].to as usize;
                    self.cursor[v] = self.arcs[e as usize].next;
                }
            }
        }
    }

    /// Run max-flow and return the flow value.
    pub(super) fn max_flow(&mut self) -> f64 {
        let mut flow = 0.0;
        while self.build_levels() {
            flow += self.blocking_flow();
        }
        flow
    }

    /// Nodes on the source side of the minimum cut, valid after [`max_flow`](Self::max_flow).
    pub(super) fn source_side(&self) -> Vec<bool> {
        let total = self.node_count + 2;
        let mut reached = vec![false; total];
        let source = self.source();
        reached[source] = true;
        let mut queue = VecDeque::from([source]);
        while let Some(v) = queue.pop_front() {
            let mut e = self.head[v];
            while e != NONE {
                let arc = self.arcs[e as usize];
                if arc.cap > CAPACITY_EPSILON && !reached[arc.to as usize] {
                    reached[arc.to as usize] = true;
                    queue.push_back(arc.to as usize);
                }
                e = arc.next;
            }
        }
        reached.truncate(self.node_count);
        reached
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_bottleneck() {
        // s -> 0 -> 1 -> 2 -> t with a weak middle link
        let mut g = FlowGraph::new(3, 16);
        g.add_terminal(0, 10.0, 0.0);
        g.add_edge(0, 1, 3.0);
        g.add_edge(1, 2, 1.5);
        g.add_terminal(2, 0.0, 10.0);
        assert!((g.max_flow() - 1.5).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true, true, false]);
    }

    #[test]
    fn test_terminal_cancellation() {
        let mut g = FlowGraph::new(2, 8);
        g.add_terminal(0, 5.0, 2.0);
        g.add_terminal(1, 1.0, 4.0);
        g.add_edge(0, 1, 10.0);
        // after cancelling 2 and 1: s->0 = 3, 1->t = 3
        assert!((g.max_flow() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_paths() {
        // two disjoint routes of capacity 2 and 3
        let mut g = FlowGraph::new(4, 32);
        g.add_terminal(0, 100.0, 0.0);
        g.add_terminal(1, 100.0, 0.0);
        g.add_edge(0, 2, 2.0);
        g.add_edge(1, 3, 3.0);
        g.add_terminal(2, 0.0, 100.0);
        g.add_terminal(3, 0.0, 100.0);
        assert!((g.max_flow() - 5.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true, true, false, false]);
    }

    #[test]
    fn test_isolated_nodes_fall_on_sink_side() {
        let mut g = FlowGraph::new(2, 4);
        g.add_terminal(0, 1.0, 0.0);
        g.max_flow();
        assert_eq!(g.source_side(), vec![true, false]);
    }
}
