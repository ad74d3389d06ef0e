//! In-memory triple set with three permutation indexes.
//!
//! Every bound/unbound combination of [`GraphStore::matching`] is answered by
//! walking one of the SPO, POS or OSP indexes, so lookups never scan the whole
//! graph unless nothing is bound. `BTreeMap`s keep iteration order
//! deterministic, which keeps rule application and reports reproducible.

use std::collections::{BTreeMap, BTreeSet};

use super::io::{self, RdfSyntax};
use super::{Iri, Term, Triple};
use crate::error::GraphResult;

type Spo = BTreeMap<Term, BTreeMap<Iri, BTreeSet<Term>>>;
type Pos = BTreeMap<Iri, BTreeMap<Term, BTreeSet<Term>>>;
type Osp = BTreeMap<Term, BTreeMap<Term, BTreeSet<Iri>>>;

/// A set of triples plus a prefix table used only for serialization.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    spo: Spo,
    pos: Pos,
    osp: Osp,
    len: usize,
    prefixes: BTreeMap<String, String>,
}

impl PartialEq for GraphStore {
    /// Triple-set equality; prefixes do not take part in identity.
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.spo == other.spo
    }
}

impl Eq for GraphStore {}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse serialized RDF into a new store.
    pub fn parse(input: &str, syntax: RdfSyntax, base_iri: Option<&str>) -> GraphResult<Self> {
        let mut store = Self::new();
        for triple in io::parse(input, syntax, base_iri)? {
            store.insert(triple);
        }
        Ok(store)
    }

    /// Serialize all triples, emitting the prefix table where the syntax supports it.
    pub fn serialize(&self, syntax: RdfSyntax) -> GraphResult<String> {
        io::serialize(self, syntax)
    }

    /// Insert a triple. Returns `false` if it was already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        let Triple {
            subject,
            predicate,
            object,
        } = triple;

        let inserted = self
            .spo
            .entry(subject.clone())
            .or_default()
            .entry(predicate.clone())
            .or_default()
            .insert(object.clone());
        if !inserted {
            return false;
        }

        self.pos
            .entry(predicate.clone())
            .or_default()
            .entry(object.clone())
            .or_default()
            .insert(subject.clone());
        self.osp
            .entry(object)
            .or_default()
            .entry(subject)
            .or_default()
            .insert(predicate);
        self.len += 1;
        true
    }

    /// Insert every triple from an iterator, returning how many were new.
    pub fn extend<I: IntoIterator<Item = Triple>>(&mut self, triples: I) -> usize {
        triples.into_iter().filter(|t| self.insert(t.clone())).count()
    }

    /// Set union with another store. Returns how many triples were new.
    ///
    /// Prefixes from `other` are adopted unless the name is already bound here.
    pub fn merge(&mut self, other: &GraphStore) -> usize {
        for (name, ns) in &other.prefixes {
            self.prefixes
                .entry(name.clone())
                .or_insert_with(|| ns.clone());
        }
        let mut added = 0;
        for triple in other.iter() {
            if self.insert(triple) {
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.spo
            .get(&triple.subject)
            .and_then(|by_p| by_p.get(&triple.predicate))
            .is_some_and(|objects| objects.contains(&triple.object))
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every triple, in SPO order.
    pub fn iter(&self) -> impl Iterator<Item = Triple> + '_ {
        self.spo.iter().flat_map(|(s, by_p)| {
            by_p.iter().flat_map(move |(p, objects)| {
                objects
                    .iter()
                    .map(move |o| Triple::new(s.clone(), p.clone(), o.clone()))
            })
        })
    }

    /// Lazily enumerate triples matching the bound terms. `None` is a wildcard.
    pub fn matching<'a>(
        &'a self,
        subject: Option<&'a Term>,
        predicate: Option<&'a Iri>,
        object: Option<&'a Term>,
    ) -> Box<dyn Iterator<Item = Triple> + 'a> {
        match (subject, predicate, object) {
            (Some(s), Some(p), Some(o)) => {
                let triple = Triple::new(s.clone(), p.clone(), o.clone());
                if self.contains(&triple) {
                    Box::new(std::iter::once(triple))
                } else {
                    Box::new(std::iter::empty())
                }
            }
            (Some(s), Some(p), None) => Box::new(
                self.spo
                    .get(s)
                    .and_then(|by_p| by_p.get(p))
                    .into_iter()
                    .flatten()
                    .map(move |o| Triple::new(s.clone(), p.clone(), o.clone())),
            ),
            (Some(s), None, None) => Box::new(self.spo.get(s).into_iter().flat_map(move |by_p| {
                by_p.iter().flat_map(move |(p, objects)| {
                    objects
                        .iter()
                        .map(move |o| Triple::new(s.clone(), p.clone(), o.clone()))
                })
            })),
            (Some(s), None, Some(o)) => Box::new(
                self.osp
                    .get(o)
                    .and_then(|by_s| by_s.get(s))
                    .into_iter()
                    .flatten()
                    .map(move |p| Triple::new(s.clone(), p.clone(), o.clone())),
            ),
            (None, Some(p), Some(o)) => Box::new(
                self.pos
                    .get(p)
                    .and_then(|by_o| by_o.get(o))
                    .into_iter()
                    .flatten()
                    .map(move |s| Triple::new(s.clone(), p.clone(), o.clone())),
            ),
            (None, Some(p), None) => Box::new(self.pos.get(p).into_iter().flat_map(move |by_o| {
                by_o.iter().flat_map(move |(o, subjects)| {
                    subjects
                        .iter()
                        .map(move |s| Triple::new(s.clone(), p.clone(), o.clone()))
                })
            })),
            (None, None, Some(o)) => Box::new(self.osp.get(o).into_iter().flat_map(move |by_s| {
                by_s.iter().flat_map(move |(s, predicates)| {
                    predicates
                        .iter()
                        .map(move |p| Triple::new(s.clone(), p.clone(), o.clone()))
                })
            })),
            (None, None, None) => Box::new(self.iter()),
        }
    }

    /// Objects of `(subject, predicate, ?)`.
    pub fn objects<'a>(&'a self, subject: &Term, predicate: &Iri) -> impl Iterator<Item = &'a Term> + use<'a> {
        self.spo
            .get(subject)
            .and_then(|by_p| by_p.get(predicate))
            .into_iter()
            .flatten()
    }

    /// Subjects of `(?, predicate, object)`.
    pub fn subjects<'a>(&'a self, predicate: &Iri, object: &Term) -> impl Iterator<Item = &'a Term> + use<'a> {
        self.pos
            .get(predicate)
            .and_then(|by_o| by_o.get(object))
            .into_iter()
            .flatten()
    }

    /// Every distinct subject that has at least one `predicate` edge.
    pub fn subjects_with<'a>(&'a self, predicate: &Iri) -> BTreeSet<&'a Term> {
        self.pos
            .get(predicate)
            .into_iter()
            .flat_map(|by_o| by_o.values().flatten())
            .collect()
    }

    /// First object of `(subject, predicate, ?)` in term order.
    pub fn value(&self, subject: &Term, predicate: &Iri) -> Option<&Term> {
        self.objects(subject, predicate).next()
    }

    /// Whether the term occurs anywhere in subject or object position.
    pub fn mentions(&self, term: &Term) -> bool {
        self.spo.contains_key(term) || self.osp.contains_key(term)
    }

    /// Remove every `(subject?, predicate, object?)` triple. Returns how many went.
    pub fn remove(&mut self, predicate: &Iri, subject: Option<&Term>, object: Option<&Term>) -> usize {
        let doomed: Vec<Triple> = self.matching(subject, Some(predicate), object).collect();
        doomed.iter().filter(|t| self.remove_triple(t)).count()
    }

    /// Remove one triple. Returns `false` if it was absent.
    pub fn remove_triple(&mut self, triple: &Triple) -> bool {
        if !remove_nested(&mut self.spo, &triple.subject, &triple.predicate, &triple.object) {
            return false;
        }
        remove_nested(&mut self.pos, &triple.predicate, &triple.object, &triple.subject);
        remove_nested(&mut self.osp, &triple.object, &triple.subject, &triple.predicate);
        self.len -= 1;
        true
    }

    pub fn set_prefix(&mut self, name: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(name.into(), namespace.into());
    }

    /// Bind several prefixes at once, replacing existing bindings of the same name.
    pub fn with_prefixes<I, K, V>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, ns) in prefixes {
            self.set_prefix(name, ns);
        }
        self
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }
}

impl FromIterator<Triple> for GraphStore {
    fn from_iter<I: IntoIterator<Item = Triple>>(iter: I) -> Self {
        let mut store = GraphStore::new();
        store.extend(iter);
        store
    }
}

fn remove_nested<A: Ord, B: Ord, C: Ord>(
    index: &mut BTreeMap<A, BTreeMap<B, BTreeSet<C>>>,
    a: &A,
    b: &B,
    c: &C,
) -> bool {
    let Some(by_b) = index.get_mut(a) else {
        return false;
    };
    let Some(leaf) = by_b.get_mut(b) else {
        return false;
    };
    if !leaf.remove(c) {
        return false;
    }
    if leaf.is_empty() {
        by_b.remove(b);
    }
    if by_b.is_empty() {
        index.remove(a);
    }
    true
}
