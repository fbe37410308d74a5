//! Graph generator: builds an edge multiset for one of several graph shapes, then hands the
//! edges out one at a time.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::GeneratorOptions;
use crate::error::{GenError, GenResult};
use crate::generators::base::{BuildGenerator, CustomGenerator, GeneratorCore, Size};
use crate::rng::CaseRng;

/// Node count above which a complete graph is refused
pub const COMPLETE_GRAPH_MAX_NODES: usize = 10_000;

/// An undirected edge between two 1-based node labels
pub type Edge = (usize, usize);

/// Graph shapes, identified by their numeric type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    /// Type 1: exactly `M` random pairs
    Arbitrary,
    /// Type 2: a random spanning tree plus `M - (N - 1)` random pairs
    Connected,
    /// Type 3: every pair of nodes
    Complete,
    /// Type 4: `N` edges around a ring
    Cycle,
    /// Type 10
    Path,
    /// Type 11: random recursive tree
    Tree,
    /// Type 12
    Star,
    /// Type 13: a long path with the remaining nodes hanging off it
    Caterpillar,
    /// Type 14
    BinaryTree,
}

impl GraphKind {
    pub const ALL: [GraphKind; 9] = [
        GraphKind::Arbitrary,
        GraphKind::Connected,
        GraphKind::Complete,
        GraphKind::Cycle,
        GraphKind::Path,
        GraphKind::Tree,
        GraphKind::Star,
        GraphKind::Caterpillar,
        GraphKind::BinaryTree,
    ];

    /// The numeric type code
    pub fn code(&self) -> u32 {
        match self {
            GraphKind::Arbitrary => 1,
            GraphKind::Connected => 2,
            GraphKind::Complete => 3,
            GraphKind::Cycle => 4,
            GraphKind::Path => 10,
            GraphKind::Tree => 11,
            GraphKind::Star => 12,
            GraphKind::Caterpillar => 13,
            GraphKind::BinaryTree => 14,
        }
    }

    /// Whether the shape takes its edge count from `M`
    pub fn needs_edge_count(&self) -> bool {
        matches!(self, GraphKind::Arbitrary | GraphKind::Connected)
    }
}

impl TryFrom<u32> for GraphKind {
    type Error = GenError;

    fn try_from(code: u32) -> GenResult<Self> {
        GraphKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.code() == code)
            .ok_or_else(|| {
                let codes: Vec<u32> = GraphKind::ALL.iter().map(GraphKind::code).collect();
                GenError::unknown_type(code.to_string(), &codes)
            })
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Generates the edges of a random graph, one edge per `next` call
///
/// `N` is resolved once when the generator is built; all edges are constructed up front and
/// `next` returns `None` once they are exhausted.
#[derive(Debug, Clone)]
pub struct GraphGenerator {
    core: GeneratorCore,
    kind: GraphKind,
    nodes: Vec<usize>,
    edge_count: Option<usize>,
    duplicates: bool,
    self_loops: bool,
    counts: BTreeMap<Edge, usize>,
    pending: VecDeque<Edge>,
}

impl GraphGenerator {
    /// Start configuring a graph of `size` nodes with the given shape
    pub fn builder(size: impl Into<Size>, kind: GraphKind) -> GraphGeneratorBuilder {
        GraphGeneratorBuilder {
            size: size.into(),
            kind,
            edge_count: None,
            duplicates: false,
            self_loops: false,
            options: GeneratorOptions::default(),
        }
    }

    /// The graph shape
    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    /// The node count resolved at construction
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges not yet handed out
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Pop the next edge in a random orientation, `None` once exhausted
    pub fn next_edge(&mut self) -> Option<Edge> {
        let (u, v) = self.pending.pop_front()?;
        if self.core.rng.r#gen_bool(0.5) {
            Some((u, v))
        } else {
            Some((v, u))
        }
    }

    fn validate(&self) -> GenResult<()> {
        let n = self.nodes.len();
        if self.kind.needs_edge_count() && self.edge_count.is_none() {
            return Err(GenError::MissingParameter {
                name: "M",
                context: format!("graph type {}", self.kind),
            });
        }
        if self.kind == GraphKind::Connected && self.edge_count.unwrap_or(0) < n.saturating_sub(1) {
            return Err(GenError::infeasible(format!(
                "Impossible graph: a connected graph on {} nodes needs at least {} edges",
                n,
                n - 1
            )));
        }
        if self.kind == GraphKind::Complete && n > COMPLETE_GRAPH_MAX_NODES {
            return Err(GenError::infeasible(format!(
                "a complete graph on {} nodes exceeds the limit of {} nodes",
                n, COMPLETE_GRAPH_MAX_NODES
            )));
        }
        Ok(())
    }

    fn canonical(a: usize, b: usize) -> Edge {
        if a <= b { (a, b) } else { (b, a) }
    }

    fn add_edge(&mut self, group: &mut Vec<Edge>, a: usize, b: usize) {
        let edge = Self::canonical(a, b);
        *self.counts.entry(edge).or_insert(0) += 1;
        group.push(edge);
    }

    fn random_pair(&mut self) -> GenResult<Edge> {
        if self.nodes.is_empty() {
            return Err(GenError::infeasible("cannot draw an edge from a graph with no nodes"));
        }
        let nodes = &self.nodes;
        let pick = |rng: &mut CaseRng| {
            let a = nodes[rng.r#gen_range(0..nodes.len())];
            let b = nodes[rng.r#gen_range(0..nodes.len())];
            (a, b)
        };
        let (self_loops, duplicates) = (self.self_loops, self.duplicates);
        let counts = &self.counts;
        // Self-loops and repeated pairs are rejected unless enabled.
        self.core.sample_until("node pair", pick, |&(a, b)| {
            (self_loops || a != b)
                && (duplicates || !counts.contains_key(&Self::canonical(a, b)))
        })
    }

    fn add_random_edges(&mut self, group: &mut Vec<Edge>, count: usize) -> GenResult<()> {
        for _ in 0..count {
            let (a, b) = self.random_pair()?;
            self.add_edge(group, a, b);
        }
        Ok(())
    }

    fn add_random_tree(&mut self, group: &mut Vec<Edge>) {
        for i in 1..self.nodes.len() {
            let parent = self.core.rng.r#gen_range(0..i);
            let (a, b) = (self.nodes[parent], self.nodes[i]);
            self.add_edge(group, a, b);
        }
    }

    fn add_path(&mut self, group: &mut Vec<Edge>, len: usize) {
        for i in 0..len {
            let (a, b) = (self.nodes[i], self.nodes[i + 1]);
            self.add_edge(group, a, b);
        }
    }

    fn populate(&mut self) -> GenResult<()> {
        let n = self.nodes.len();
        let mut structure = Vec::new();
        let mut extra = Vec::new();

        match self.kind {
            GraphKind::Arbitrary => {
                let m = self.edge_count.unwrap_or(0);
                self.add_random_edges(&mut extra, m)?;
            }
            GraphKind::Connected => {
                self.add_random_tree(&mut structure);
                let m = self.edge_count.unwrap_or(0);
                self.add_random_edges(&mut extra, m - n.saturating_sub(1))?;
            }
            GraphKind::Complete => {
                let skip = usize::from(!self.self_loops);
                for i in 0..n {
                    for j in (i + skip)..n {
                        let (a, b) = (self.nodes[i], self.nodes[j]);
                        self.add_edge(&mut structure, a, b);
                    }
                }
            }
            GraphKind::Cycle => {
                for i in 0..n {
                    let (a, b) = (self.nodes[i], self.nodes[(i + 1) % n]);
                    self.add_edge(&mut structure, a, b);
                }
            }
            GraphKind::Path => self.add_path(&mut structure, n.saturating_sub(1)),
            GraphKind::Tree => self.add_random_tree(&mut structure),
            GraphKind::Star => {
                let hub = self.nodes.choose(&mut self.core.rng).copied();
                if let Some(hub) = hub {
                    for i in 0..n {
                        let node = self.nodes[i];
                        if node != hub {
                            self.add_edge(&mut structure, node, hub);
                        }
                    }
                }
            }
            GraphKind::Caterpillar => {
                if n > 0 {
                    let spine = self.core.rng.r#gen_range(n / 2..=n - 1);
                    self.add_path(&mut structure, spine);
                    for j in (spine + 1)..n {
                        let parent = self.core.rng.r#gen_range(0..j);
                        let (a, b) = (self.nodes[parent], self.nodes[j]);
                        self.add_edge(&mut structure, a, b);
                    }
                }
            }
            GraphKind::BinaryTree => {
                // Position i (1-based) hangs off position i / 2.
                for i in 2..=n {
                    let (a, b) = (self.nodes[i - 1], self.nodes[i / 2 - 1]);
                    self.add_edge(&mut structure, a, b);
                }
            }
        }

        // Spanning-tree edges of a connected graph come out before the extra edges.
        structure.shuffle(&mut self.core.rng);
        extra.shuffle(&mut self.core.rng);
        self.pending = structure.into_iter().chain(extra).collect();

        debug!(
            "graph type {} on {} nodes with {} edges",
            self.kind,
            n,
            self.pending.len()
        );
        Ok(())
    }
}

impl CustomGenerator for GraphGenerator {
    type Output = Option<Edge>;

    fn next(&mut self) -> GenResult<Option<Edge>> {
        Ok(self.next_edge())
    }
}

/// Builder for [`GraphGenerator`]
#[derive(Debug, Clone)]
pub struct GraphGeneratorBuilder {
    size: Size,
    kind: GraphKind,
    edge_count: Option<usize>,
    duplicates: bool,
    self_loops: bool,
    options: GeneratorOptions,
}

impl GraphGeneratorBuilder {
    /// Number of edges `M` (required for arbitrary and connected graphs)
    pub fn edges(mut self, m: usize) -> Self {
        self.edge_count = Some(m);
        self
    }

    /// Allow the same pair to be drawn more than once
    pub fn duplicates(mut self, allow: bool) -> Self {
        self.duplicates = allow;
        self
    }

    /// Allow edges from a node to itself
    pub fn self_loops(mut self, allow: bool) -> Self {
        self.self_loops = allow;
        self
    }

    /// Seed the private RNG
    pub fn seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    /// Give up drawing node pairs after `limit` consecutive rejections
    pub fn rejection_limit(mut self, limit: usize) -> Self {
        self.options.rejection_limit = Some(limit);
        self
    }

    /// Replace all shared options at once
    pub fn options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve `N`, validate, and construct every edge
    pub fn build(self) -> GenResult<GraphGenerator> {
        self.finish()
    }

    fn finish(self) -> GenResult<GraphGenerator> {
        let mut core = GeneratorCore::new(self.size, self.options)?;
        let n = core.resolve_size()?;
        let mut nodes: Vec<usize> = (1..=n).collect();
        nodes.shuffle(&mut core.rng);

        let mut generator = GraphGenerator {
            core,
            kind: self.kind,
            nodes,
            edge_count: self.edge_count,
            duplicates: self.duplicates,
            self_loops: self.self_loops,
            counts: BTreeMap::new(),
            pending: VecDeque::new(),
        };
        generator.validate()?;
        generator.populate()?;
        Ok(generator)
    }
}

impl BuildGenerator for GraphGeneratorBuilder {
    type Generator = GraphGenerator;

    fn build(self) -> GenResult<GraphGenerator> {
        self.finish()
    }
}
