use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use tracing::{debug, trace, warn};

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::graph::{Graph, GraphError, VertexId};
use crate::graph_ops::shortest_path;
use crate::mol::Structure;
use crate::pattern::{PatternMatcher, PatternQuery, SubstructMatcher};
use crate::traits::HasElement;

use super::archive::RingClosuresArchive;
use super::conformation::ClosableConformation;
use super::error::{RingClosureError, Result};
use super::finder::RingClosureFinder;
use super::params::{check_search_step, ClosabilityMode, RingClosureParams};
use super::path::{PathGeometry, PathSubGraph};

/// Verdict on a candidate ring.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Closability {
    pub closable: bool,
    /// Closing torsions found by the 3D search, one per rotatable bond of
    /// the chain. Empty unless the 3D search ran and succeeded.
    pub conformations: Vec<ClosableConformation>,
    /// Closability was assumed rather than demonstrated.
    pub assumed: bool,
}

impl Closability {
    fn accepted() -> Self {
        Self {
            closable: true,
            ..Self::default()
        }
    }

    fn rejected() -> Self {
        Self::default()
    }
}

/// Decides whether the chain between two ring-closing vertices may become
/// a ring, according to the configured [`ClosabilityMode`].
pub struct PathClosabilityEvaluator<'a, M = SubstructMatcher> {
    params: &'a RingClosureParams,
    archive: &'a RingClosuresArchive,
    finder: RingClosureFinder,
    required: Vec<Element>,
    patterns: Vec<PatternQuery>,
    matcher: M,
}

impl<'a> PathClosabilityEvaluator<'a, SubstructMatcher> {
    pub fn new(params: &'a RingClosureParams, archive: &'a RingClosuresArchive) -> Result<Self> {
        Self::with_matcher(params, archive, SubstructMatcher)
    }
}

impl<'a, M: PatternMatcher<Atom, Bond>> PathClosabilityEvaluator<'a, M> {
    pub fn with_matcher(
        params: &'a RingClosureParams,
        archive: &'a RingClosuresArchive,
        matcher: M,
    ) -> Result<Self> {
        check_search_step(params.conf_search_step)?;
        let required = params
            .required_elements
            .iter()
            .map(|s| {
                Element::from_symbol(s).ok_or_else(|| RingClosureError::InvalidParameter {
                    key: "required_elements".into(),
                    value: s.clone(),
                    reason: "not an element symbol".into(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let patterns = params
            .patterns
            .iter()
            .map(|p| {
                PatternQuery::parse(p).map_err(|source| RingClosureError::Pattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            params,
            archive,
            finder: RingClosureFinder::new(params),
            required,
            patterns,
            matcher,
        })
    }

    pub fn mode(&self) -> ClosabilityMode {
        self.params.mode
    }

    pub fn params(&self) -> &'a RingClosureParams {
        self.params
    }

    pub fn evaluate(
        &self,
        graph: &Graph,
        structure: &Structure,
        path: &PathSubGraph,
    ) -> Result<Closability> {
        if path.head_bond() != path.tail_bond() {
            return Err(GraphError::BondTypeMismatch {
                head: Some(path.head()),
                tail: Some(path.tail()),
                head_bond: path.head_bond(),
                tail_bond: path.tail_bond(),
            }
            .into());
        }

        let mode = self.params.mode;
        if mode.checks_constitution() && !self.constitution_allows(graph, structure, path)? {
            trace!(head = path.head(), tail = path.tail(), "constitution rejects ring");
            return Ok(Closability::rejected());
        }
        if mode.checks_conformation() {
            return self.conformation_allows(graph, structure, path);
        }
        Ok(Closability::accepted())
    }

    /// Tests the pruned chain: a required element on the anchor-to-anchor
    /// path, or a pattern match once the closing bond is added.
    fn constitution_allows(
        &self,
        graph: &Graph,
        structure: &Structure,
        path: &PathSubGraph,
    ) -> Result<bool> {
        if self.required.is_empty() && self.patterns.is_empty() {
            return Ok(false);
        }
        let by_vertex = structure.atoms_by_vertex();
        let vs = path.vertices();
        let inner: HashSet<NodeIndex> = vs[1..vs.len() - 1]
            .iter()
            .filter_map(|v| by_vertex.get(v))
            .flatten()
            .copied()
            .collect();
        let mut keep = inner.clone();
        for &a in &inner {
            keep.extend(structure.neighbors(a).filter(|&n| !structure.atom(n).is_attractor()));
        }
        let head = anchor_atom(graph, &by_vertex, path, true)?;
        let tail = anchor_atom(graph, &by_vertex, path, false)?;

        let (mut pruned, map) = structure.induced_subgraph(|a| keep.contains(&a));
        let (Some(h), Some(t)) = (map[head.index()], map[tail.index()]) else {
            return Err(RingClosureError::InconsistentPath(
                "anchor atoms are not on the path".into(),
            ));
        };

        if !self.required.is_empty() {
            let on_path = shortest_path(&pruned, h, t).unwrap_or_default();
            if on_path
                .iter()
                .any(|&a| pruned.atom(a).element().is_some_and(|e| self.required.contains(&e)))
            {
                return Ok(true);
            }
        }

        if self.patterns.is_empty() {
            return Ok(false);
        }
        let bond_type = path.head_bond();
        if bond_type.has_chemical_analogue() && h != t && pruned.bond_between(h, t).is_none() {
            pruned.add_bond(h, t, Bond::new(bond_type));
        }
        Ok(self
            .patterns
            .iter()
            .any(|q| self.matcher.has_match(&pruned, q)))
    }

    fn conformation_allows(
        &self,
        graph: &Graph,
        structure: &Structure,
        path: &PathSubGraph,
    ) -> Result<Closability> {
        let chain = path.chain_id();
        if let Some(hit) = self.archive.lookup(chain)? {
            trace!(chain = %chain, closable = hit.closable, "archive hit");
            if !hit.closable || hit.conformations.is_empty() {
                return Ok(Closability {
                    closable: hit.closable,
                    conformations: Vec::new(),
                    assumed: hit.closable,
                });
            }
            let Some(geometry) = self.geometry(graph, structure, path)? else {
                return Ok(Closability::rejected());
            };
            return Ok(Closability {
                closable: true,
                conformations: to_conformations(&geometry, &hit.conformations)?,
                assumed: false,
            });
        }

        let Some(geometry) = self.geometry(graph, structure, path)? else {
            return Ok(Closability::rejected());
        };
        let outcome = self
            .finder
            .search(&geometry.points, &geometry.rotatable, &geometry.dihedral_refs)?;
        self.archive
            .record(chain, outcome.closable, &outcome.conformations)?;
        debug!(
            chain = %chain,
            closable = outcome.closable,
            conformations = outcome.conformations.len(),
            "3D closability evaluated"
        );
        Ok(Closability {
            closable: outcome.closable,
            conformations: to_conformations(&geometry, &outcome.conformations)?,
            assumed: outcome.assumed,
        })
    }

    fn geometry(
        &self,
        graph: &Graph,
        structure: &Structure,
        path: &PathSubGraph,
    ) -> Result<Option<PathGeometry>> {
        match path.geometry(graph, structure) {
            Ok(g) => Ok(Some(g)),
            Err(RingClosureError::MissingCoordinates { atom }) => {
                warn!(
                    head = path.head(),
                    tail = path.tail(),
                    atom,
                    "cannot build 3D model of the chain; treating it as not closable"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Atom of the vertex next to one end of the path that holds the edge
/// towards the ring-closing vertex.
fn anchor_atom(
    graph: &Graph,
    by_vertex: &HashMap<VertexId, Vec<NodeIndex>>,
    path: &PathSubGraph,
    at_head: bool,
) -> Result<NodeIndex> {
    let vs = path.vertices();
    let (edge, v, rcv) = if at_head {
        (path.edges()[0], vs[1], path.head())
    } else {
        (path.edges()[path.edges().len() - 1], vs[vs.len() - 2], path.tail())
    };
    graph
        .edge(edge)
        .and_then(|e| e.ap_on(v))
        .and_then(|ap| graph.vertex(v)?.aps.get(ap)?.atom)
        .and_then(|pos| by_vertex.get(&v)?.get(pos).copied())
        .ok_or_else(|| {
            RingClosureError::InconsistentPath(format!(
                "no anchor atom on vertex {v} for ring-closing vertex {rcv}"
            ))
        })
}

fn to_conformations(
    geometry: &PathGeometry,
    torsions: &[Vec<f64>],
) -> Result<Vec<ClosableConformation>> {
    torsions
        .iter()
        .map(|t| geometry.conformation_from(t))
        .collect()
}
