//! Iterative transitive closure over a single edge predicate.
//!
//! Class hierarchies come from several graphs at once (ontology plus request
//! data), so every function takes a slice of graphs that are read together.
//! Traversal is breadth-first with a visited set, so cycles terminate.

use std::collections::{BTreeSet, VecDeque};

use super::{GraphStore, Iri, Term};
use crate::vocab;

/// `root` plus every node that reaches `root` through one or more `edge` triples
/// (`(child edge parent)` direction, as in `rdfs:subClassOf`).
pub fn descendants(graphs: &[&GraphStore], root: &Term, edge: &Iri) -> BTreeSet<Term> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(root.clone());
    queue.push_back(root.clone());

    while let Some(current) = queue.pop_front() {
        for graph in graphs {
            for child in graph.subjects(edge, &current) {
                if visited.insert(child.clone()) {
                    queue.push_back(child.clone());
                }
            }
        }
    }
    visited
}

/// `start` plus every node reachable from it along `edge` (`(child edge parent)` upward).
pub fn ancestors(graphs: &[&GraphStore], start: &Term, edge: &Iri) -> BTreeSet<Term> {
    let mut visited = BTreeSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start.clone());
    queue.push_back(start.clone());

    while let Some(current) = queue.pop_front() {
        for graph in graphs {
            for parent in graph.objects(&current, edge) {
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
    }
    visited
}

/// `class` and all of its `rdfs:subClassOf` descendants.
pub fn subclasses(graphs: &[&GraphStore], class: &Term) -> BTreeSet<Term> {
    descendants(graphs, class, &Iri::new(vocab::RDFS_SUBCLASS_OF))
}

/// Every node typed (in `data`) with `class` or one of its subclasses.
pub fn instances_of(data: &GraphStore, hierarchy: &[&GraphStore], class: &Term) -> BTreeSet<Term> {
    let rdf_type = Iri::new(vocab::RDF_TYPE);
    subclasses(hierarchy, class)
        .iter()
        .flat_map(|c| data.subjects(&rdf_type, c))
        .cloned()
        .collect()
}

/// Whether `node` is typed (in `data`) with `class` or one of its subclasses.
pub fn is_instance_of(data: &GraphStore, hierarchy: &[&GraphStore], node: &Term, class: &Term) -> bool {
    let rdf_type = Iri::new(vocab::RDF_TYPE);
    let subclass_of = Iri::new(vocab::RDFS_SUBCLASS_OF);
    data.objects(node, &rdf_type)
        .any(|declared| ancestors(hierarchy, declared, &subclass_of).contains(class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Triple;

    fn sub(child: &str, parent: &str) -> Triple {
        Triple::new(Term::iri(child), Iri::new(vocab::RDFS_SUBCLASS_OF), Term::iri(parent))
    }

    fn typed(node: &str, class: &str) -> Triple {
        Triple::new(Term::iri(node), Iri::new(vocab::RDF_TYPE), Term::iri(class))
    }

    #[test]
    fn closure_terminates_on_cycles() {
        let g: GraphStore = [sub("A", "B"), sub("B", "C"), sub("C", "A"), sub("D", "C")]
            .into_iter()
            .collect();
        let all = subclasses(&[&g], &Term::iri("C"));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn instances_follow_subclasses_across_graphs() {
        let ontology: GraphStore = [sub("Merger", "Acquisition")].into_iter().collect();
        let data: GraphStore = [typed("m1", "Merger"), typed("a1", "Acquisition"), typed("x", "Other")]
            .into_iter()
            .collect();
        let found = instances_of(&data, &[&ontology, &data], &Term::iri("Acquisition"));
        assert_eq!(found, BTreeSet::from([Term::iri("a1"), Term::iri("m1")]));

        assert!(is_instance_of(&data, &[&ontology], &Term::iri("m1"), &Term::iri("Acquisition")));
        assert!(!is_instance_of(&data, &[&ontology], &Term::iri("x"), &Term::iri("Acquisition")));
    }

    #[test]
    fn ancestors_include_start() {
        let g: GraphStore = [sub("A", "B"), sub("B", "C")].into_iter().collect();
        let up = ancestors(&[&g], &Term::iri("A"), &Iri::new(vocab::RDFS_SUBCLASS_OF));
        assert_eq!(up.len(), 3);
    }
}
