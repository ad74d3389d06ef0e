//! Manifest parsing: which partitions to load and in what order.

use std::collections::BTreeSet;

use crate::config::Vocabulary;
use crate::graph::{GraphStore, Term};

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Partition {
    pub order: i64,
    pub locator: String,
}

/// Extract partitions from a manifest graph, sorted by `(order, locator)`.
///
/// Subjects that carry only one of the two properties, or a non-integer order,
/// are skipped with a warning.
pub fn partitions(manifest: &GraphStore, vocabulary: &Vocabulary) -> Vec<Partition> {
    let order_p = vocabulary.load_order();
    let locator_p = vocabulary.source_file();

    let subjects: BTreeSet<&Term> = manifest
        .subjects_with(&order_p)
        .into_iter()
        .chain(manifest.subjects_with(&locator_p))
        .collect();

    let mut out = Vec::new();
    for subject in subjects {
        let order = manifest.value(subject, &order_p);
        let locator = manifest.value(subject, &locator_p);
        let (Some(order), Some(locator)) = (order, locator) else {
            tracing::warn!(%subject, "manifest entry lacks an order or a locator, skipping");
            continue;
        };
        let Some(order) = order.as_literal().and_then(|l| l.as_i64()) else {
            tracing::warn!(%subject, order = %order, "manifest order is not an integer, skipping");
            continue;
        };
        out.push(Partition {
            order,
            locator: locator.lexical().to_string(),
        });
    }
    out.sort();
    out
}
