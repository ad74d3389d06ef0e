//! Federated loading from local directories and stubbed remote hosts.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use shapegraph::config::{FederationConfig, Vocabulary};
use shapegraph::error::{ManifestError, ManifestResult};
use shapegraph::federation::fetch::Fetch;
use shapegraph::federation::{FederationLoader, LoadSource};
use shapegraph::graph::{Iri, Term, Triple};

const PREFIX: &str = "@prefix : <http://example.org/ontology/> .\n";

fn partition(tag: &str, size: usize) -> String {
    let mut text = PREFIX.to_string();
    for i in 0..size {
        text.push_str(&format!(":{tag}{i} :member :{tag} .\n"));
    }
    text
}

/// Manifest with A at order 3, B at order 1 and C at order 2.
fn manifest(a: &str, b: &str, c: &str) -> String {
    format!(
        "{PREFIX}:pa :loadOrder 3 ; :sourceFile \"{a}\" .\n\
         :pb :loadOrder 1 ; :sourceFile \"{b}\" .\n\
         :pc :loadOrder 2 ; :sourceFile \"{c}\" .\n"
    )
}

fn write(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(name), text).unwrap();
}

fn local_config(dir: &Path) -> FederationConfig {
    FederationConfig {
        manifest: Some(dir.join("manifest.ttl").display().to_string()),
        ..FederationConfig::default()
    }
}

/// In-memory remote host; records every URL requested.
#[derive(Default)]
struct StubHost {
    documents: HashMap<String, String>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl StubHost {
    fn with(mut self, url: &str, text: String) -> Self {
        self.documents.insert(url.to_string(), text);
        self
    }
}

impl Fetch for StubHost {
    fn fetch(&self, url: &str) -> ManifestResult<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.documents.get(url).cloned().ok_or_else(|| ManifestError::Fetch {
            locator: url.to_string(),
            message: "HTTP 404".into(),
        })
    }
}

#[test]
fn partitions_merge_in_declared_order() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "a.ttl", &partition("a", 3));
    write(dir.path(), "b.ttl", &partition("b", 4));
    write(dir.path(), "c.ttl", &partition("c", 5));
    write(dir.path(), "manifest.ttl", &manifest("a.ttl", "b.ttl", "c.ttl"));

    let (graph, report) = FederationLoader::new(local_config(dir.path()), Vocabulary::default())
        .load()
        .unwrap();

    assert!(!report.is_degraded());
    assert_eq!(graph.len(), 3 + 4 + 5);
    let order: Vec<_> = report.progress.iter().map(|p| p.locator.as_str()).collect();
    assert_eq!(order, ["b.ttl", "c.ttl", "a.ttl"]);
    let totals: Vec<_> = report.progress.iter().map(|p| (p.added, p.total)).collect();
    assert_eq!(totals, [(4, 4), (5, 9), (3, 12)]);
}

#[test]
fn overlapping_partitions_count_once() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "a.ttl", &partition("x", 3));
    write(dir.path(), "b.ttl", &partition("x", 3));
    write(dir.path(), "c.ttl", &partition("y", 2));
    write(dir.path(), "manifest.ttl", &manifest("a.ttl", "b.ttl", "c.ttl"));

    let (graph, report) = FederationLoader::new(local_config(dir.path()), Vocabulary::default())
        .load()
        .unwrap();
    assert_eq!(graph.len(), 5);
    assert_eq!(report.progress.last().unwrap().added, 0);
}

#[test]
fn remote_partitions_resolve_against_manifest_url() {
    let host = StubHost::default()
        .with("https://ontology.test/v1/manifest.ttl", manifest("a.ttl", "b.ttl", "https://mirror.test/c.ttl"))
        .with("https://ontology.test/v1/a.ttl", partition("a", 1))
        .with("https://ontology.test/v1/b.ttl", partition("b", 2))
        .with("https://mirror.test/c.ttl", partition("c", 3));
    let config = FederationConfig {
        manifest: Some("https://ontology.test/v1/manifest.ttl".into()),
        ..FederationConfig::default()
    };

    let requested = host.requested.clone();
    let (graph, report) = FederationLoader::new(config, Vocabulary::default())
        .with_fetcher(host)
        .load()
        .unwrap();

    assert_eq!(graph.len(), 6);
    assert_eq!(
        report.source,
        LoadSource::Federated {
            manifest: "https://ontology.test/v1/manifest.ttl".into()
        }
    );
    assert_eq!(
        *requested.lock().unwrap(),
        [
            "https://ontology.test/v1/manifest.ttl",
            "https://ontology.test/v1/b.ttl",
            "https://mirror.test/c.ttl",
            "https://ontology.test/v1/a.ttl",
        ]
    );
}

#[test]
fn cached_partitions_skip_the_network() {
    let cache = tempfile::TempDir::new().unwrap();
    write(cache.path(), "b.ttl", &partition("cached", 7));

    let host = StubHost::default()
        .with("https://ontology.test/manifest.ttl", manifest("a.ttl", "b.ttl", "c.ttl"))
        .with("https://ontology.test/a.ttl", partition("a", 1))
        .with("https://ontology.test/c.ttl", partition("c", 1));
    let config = FederationConfig {
        manifest: Some("https://ontology.test/manifest.ttl".into()),
        cache_dir: Some(cache.path().to_path_buf()),
        ..FederationConfig::default()
    };

    let requested = host.requested.clone();
    let (graph, _) = FederationLoader::new(config, Vocabulary::default())
        .with_fetcher(host)
        .load()
        .unwrap();

    assert_eq!(graph.len(), 9);
    assert!(!requested.lock().unwrap().iter().any(|u| u.ends_with("/b.ttl")));
}

#[test]
fn cached_copy_resolves_relative_iris_like_the_remote_one() {
    let relative = "<thing> <rel> <other> .\n".to_string();
    let listing = format!("{PREFIX}:p :loadOrder 1 ; :sourceFile \"part.ttl\" .\n");
    let host = || {
        StubHost::default()
            .with("https://onto.test/manifest.ttl", listing.clone())
            .with("https://onto.test/part.ttl", relative.clone())
    };
    let config = FederationConfig {
        manifest: Some("https://onto.test/manifest.ttl".into()),
        ..FederationConfig::default()
    };
    let (remote, _) = FederationLoader::new(config.clone(), Vocabulary::default())
        .with_fetcher(host())
        .load()
        .unwrap();

    let cache = tempfile::TempDir::new().unwrap();
    write(cache.path(), "part.ttl", &relative);
    let cached_config = FederationConfig {
        cache_dir: Some(cache.path().to_path_buf()),
        ..config
    };
    let cached_host = host();
    let requested = cached_host.requested.clone();
    let (cached, report) = FederationLoader::new(cached_config, Vocabulary::default())
        .with_fetcher(cached_host)
        .load()
        .unwrap();

    assert!(!report.is_degraded());
    assert!(!requested.lock().unwrap().iter().any(|u| u.ends_with("/part.ttl")));
    assert!(remote.contains(&Triple::new(
        Term::iri("https://onto.test/thing"),
        Iri::new("https://onto.test/rel"),
        Term::iri("https://onto.test/other"),
    )));
    assert_eq!(cached, remote);
}

#[test]
fn one_missing_partition_degrades_to_fallback() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "a.ttl", &partition("a", 3));
    write(dir.path(), "c.ttl", &partition("c", 5));
    write(dir.path(), "manifest.ttl", &manifest("a.ttl", "missing.ttl", "c.ttl"));
    write(dir.path(), "snapshot.ttl", &partition("snap", 2));

    let config = FederationConfig {
        fallback: Some(dir.path().join("snapshot.ttl")),
        ..local_config(dir.path())
    };
    let (graph, report) = FederationLoader::new(config, Vocabulary::default())
        .load()
        .unwrap();

    assert!(report.is_degraded());
    assert_eq!(graph.len(), 2);
    match report.source {
        LoadSource::Fallback { reason, .. } => assert!(reason.contains("missing.ttl")),
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[test]
fn malformed_partition_degrades_to_bundled_snapshot() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "a.ttl", &partition("a", 1));
    write(dir.path(), "b.ttl", "this is :not turtle");
    write(dir.path(), "c.ttl", &partition("c", 1));
    write(dir.path(), "manifest.ttl", &manifest("a.ttl", "b.ttl", "c.ttl"));

    let (graph, report) = FederationLoader::new(local_config(dir.path()), Vocabulary::default())
        .load()
        .unwrap();
    assert!(report.is_degraded());
    assert!(graph.len() > 50);
}

#[test]
fn manifest_without_partitions_degrades() {
    let dir = tempfile::TempDir::new().unwrap();
    write(dir.path(), "manifest.ttl", &format!("{PREFIX}:orphan :sourceFile \"a.ttl\" ."));

    let (_, report) = FederationLoader::new(local_config(dir.path()), Vocabulary::default())
        .load()
        .unwrap();
    match report.source {
        LoadSource::Fallback { reason, .. } => assert!(reason.contains("no usable partitions")),
        other => panic!("expected fallback, got {other:?}"),
    }
}
