//! Graph view of the class hierarchy.
//!
//! Every class of the pool is a node; an edge `sub -> super` exists for each resolved
//! superclass or interface link. Unresolved supertypes have no edge, but the class is
//! flagged so callers can treat its ancestry as incomplete.

use crate::model::{ClassId, ClassPool, TypeLink};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, Reversed};
use petgraph::Direction;

/// Kind of a hierarchy edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Extends,
    Implements,
}

#[derive(Debug, Clone)]
pub struct Hierarchy {
    graph: DiGraph<ClassId, Relation>,
    nodes: Vec<NodeIndex>,
    /// Classes whose own or inherited supertypes include an unresolved one.
    incomplete: Vec<bool>,
    cyclic: bool,
}

impl Hierarchy {
    pub fn build(pool: &ClassPool) -> Self {
        let mut graph = DiGraph::with_capacity(pool.len(), pool.len());
        let nodes: Vec<NodeIndex> = pool.ids().map(|id| graph.add_node(id)).collect();

        for id in pool.ids() {
            let class = pool.get(id);
            // petgraph walks neighbors in reverse insertion order, so interfaces are added
            // last-to-first and the superclass last: traversals then visit the superclass
            // first and the interfaces in declaration order.
            for link in class.interfaces.iter().rev() {
                if let TypeLink::Resolved(target) = link {
                    graph.add_edge(nodes[id.index()], nodes[target.index()], Relation::Implements);
                }
            }
            if let Some(TypeLink::Resolved(target)) = &class.superclass {
                graph.add_edge(nodes[id.index()], nodes[target.index()], Relation::Extends);
            }
        }

        let cyclic = is_cyclic_directed(&graph);
        if cyclic {
            tracing::warn!("Class hierarchy contains a cycle; affected classes are resolved best-effort");
        }

        let mut hierarchy = Self {
            graph,
            nodes,
            incomplete: vec![false; pool.len()],
            cyclic,
        };
        for id in pool.ids() {
            let incomplete = hierarchy.ancestors_inclusive(id).into_iter().any(|c| {
                pool.get(c)
                    .supertypes()
                    .any(|link| matches!(link, TypeLink::External(_)))
            });
            hierarchy.incomplete[id.index()] = incomplete;
        }
        hierarchy
    }

    pub const fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    /// The class itself followed by all its superclasses and superinterfaces,
    /// breadth-first, each class once.
    pub fn ancestors_inclusive(&self, id: ClassId) -> Vec<ClassId> {
        let mut bfs = Bfs::new(&self.graph, self.nodes[id.index()]);
        let mut out = Vec::new();
        while let Some(node) = bfs.next(&self.graph) {
            out.push(self.graph[node]);
        }
        out
    }

    /// All superclasses and superinterfaces, excluding the class itself.
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut out = self.ancestors_inclusive(id);
        out.retain(|&c| c != id);
        out
    }

    /// All direct and indirect subtypes, excluding the class itself.
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, self.nodes[id.index()]);
        let mut out = Vec::new();
        while let Some(node) = bfs.next(reversed) {
            let class = self.graph[node];
            if class != id {
                out.push(class);
            }
        }
        out
    }

    /// Direct subtypes of a class.
    pub fn subtypes(&self, id: ClassId) -> impl Iterator<Item = ClassId> + '_ {
        self.graph
            .neighbors_directed(self.nodes[id.index()], Direction::Incoming)
            .map(|n| self.graph[n])
    }

    /// True if the class can be reached from an unresolved supertype link.
    pub fn is_incomplete(&self, id: ClassId) -> bool {
        self.incomplete[id.index()]
    }

    /// Program classes without program subtypes, in pool order.
    ///
    /// Classes caught in a hierarchy cycle are included as well so that every
    /// program class belongs to at least one traversal.
    pub fn bottom_classes(&self, pool: &ClassPool) -> Vec<ClassId> {
        let mut covered = vec![false; pool.len()];
        let mut bottoms = Vec::new();
        for id in pool.program_ids() {
            if self.subtypes(id).all(|sub| pool.get(sub).library) {
                for ancestor in self.ancestors_inclusive(id) {
                    covered[ancestor.index()] = true;
                }
                bottoms.push(id);
            }
        }
        for id in pool.program_ids() {
            if !covered[id.index()] {
                for ancestor in self.ancestors_inclusive(id) {
                    covered[ancestor.index()] = true;
                }
                bottoms.push(id);
            }
        }
        bottoms
    }
}
