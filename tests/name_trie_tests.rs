//! # FIB Tests: Name, NameTrie, RouteRegistry
//!
//! Validates name parsing, prefix relations, longest-prefix match, and handle
//! reuse in the route registry.

use ndnfw_core::RouteRegistry;
use ndnfw_dsa::{Name, NameError, NameTrie};
use std::time::Instant;

fn name(uri: &str) -> Name {
    Name::parse(uri).expect("valid name")
}

#[test]
fn test_name_parse_and_display() {
    let t = Instant::now();

    let n = name("/video//seg/7/");
    assert_eq!(n.len(), 3, "empty components are skipped");
    assert_eq!(n.to_string(), "/video/seg/7");
    assert_eq!(Name::root().to_string(), "/");
    assert_eq!(name("/"), Name::root());
    assert_eq!(Name::parse("video"), Err(NameError::NotAbsolute));

    let parsed: Name = "/a/b".parse().expect("FromStr");
    assert_eq!(parsed, name("/a").child("b"));

    let binary = Name::from_components([&b"ok"[..], &[0xff, b'/'][..]]);
    assert_eq!(binary.to_string(), "/ok/%FF%2F");

    let overhead = t.elapsed();
    println!("test_name_parse_and_display: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_name_uri_round_trip() {
    let t = Instant::now();

    let names = [
        Name::from_components(["a/b"]),
        Name::from_components([&[0xff][..]]),
        Name::from_components(["100%", "two words", "caf\u{e9}"]),
        Name::from_components(["", ".", "...", "seg=0"]),
        Name::root().child([0u8, b'/', b'%', 0x7f]),
    ];
    for original in names {
        let printed = original.to_string();
        let reparsed = Name::parse(&printed).expect("printed names parse");
        assert_eq!(reparsed, original, "{} did not round-trip", printed);
    }

    assert_eq!(Name::from_components(["a/b"]).to_string(), "/a%2Fb");
    assert_eq!(Name::from_components(["a/b"]).len(), 1);
    assert_eq!(name("/%FF").components().next(), Some(&[0xff][..]));
    assert_eq!(name("/a%2fb"), Name::from_components(["a/b"]), "hex digits are case-insensitive");
    assert_eq!(name("/..."), Name::from_components([""]));
    assert_eq!(Name::parse("/bad%"), Err(NameError::BadEscape));
    assert_eq!(Name::parse("/bad%G1"), Err(NameError::BadEscape));

    let overhead = t.elapsed();
    println!("test_name_uri_round_trip: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_name_prefix_relation() {
    let t = Instant::now();

    assert!(Name::root().is_prefix_of(&name("/a/b")));
    assert!(name("/a").is_prefix_of(&name("/a/b")));
    assert!(name("/a/b").is_prefix_of(&name("/a/b")));
    assert!(!name("/a/b").is_prefix_of(&name("/a")));
    assert!(!name("/ab").is_prefix_of(&name("/a/b")), "prefixes match whole components");

    let overhead = t.elapsed();
    println!("test_name_prefix_relation: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_trie_longest_prefix_match() {
    let t = Instant::now();

    let mut trie = NameTrie::new(16);
    assert_eq!(trie.associate(&name("/a"), 1), None);
    assert_eq!(trie.associate(&name("/a/b/c"), 3), None);
    let seq = trie.sequence_number;

    assert_eq!(trie.longest_prefix_match(&name("/a/b/c/d")), Some((3, 3)));
    assert_eq!(trie.longest_prefix_match(&name("/a/b")), Some((1, 1)));
    assert_eq!(trie.longest_prefix_match(&name("/x")), None);
    assert_eq!(trie.exact(&name("/a/b")), None, "interior nodes carry no handle");

    // A root route catches everything.
    trie.associate(&Name::root(), 0);
    assert_eq!(trie.longest_prefix_match(&name("/x/y")), Some((0, 0)));

    assert_eq!(trie.associate(&name("/a"), 9), Some(1));
    assert_eq!(trie.dissociate(&name("/a/b/c")), Some(3));
    assert_eq!(trie.dissociate(&name("/a/b/c")), None);
    assert_eq!(trie.longest_prefix_match(&name("/a/b/c/d")), Some((9, 1)));
    assert!(trie.sequence_number > seq);

    // Warming never binds a handle.
    let before = trie.nodes_len();
    trie.warm(&name("/q/r"));
    assert_eq!(trie.nodes_len(), before + 2);
    assert_eq!(trie.exact(&name("/q/r")), None);

    let overhead = t.elapsed();
    println!("test_trie_longest_prefix_match: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_registry_lookup_and_reuse() {
    let t = Instant::now();

    let mut registry = RouteRegistry::new();
    let video = registry.route(&name("/video"));
    let again = registry.route(&name("/video"));
    assert!(std::sync::Arc::ptr_eq(&video, &again), "route() is get-or-create");
    registry.route(&name("/video/live"));
    assert_eq!(registry.len(), 2);

    let hit = registry.lookup(&name("/video/live/cam")).expect("LPM hit");
    assert_eq!(hit.prefix(), &name("/video/live"));
    let hit = registry.lookup(&name("/video/vod")).expect("LPM hit");
    assert_eq!(hit.prefix(), &name("/video"));
    assert!(registry.lookup(&name("/audio")).is_none());

    let removed = registry.unregister(&name("/video/live")).expect("registered");
    assert_eq!(removed.prefix(), &name("/video/live"));
    assert!(registry.unregister(&name("/video/live")).is_none());
    assert_eq!(registry.len(), 1);
    assert_eq!(
        registry.lookup(&name("/video/live/cam")).map(|r| r.prefix().clone()),
        Some(name("/video"))
    );

    // The freed slot is reused.
    registry.route(&name("/audio"));
    assert_eq!(registry.len(), 2);
    assert!(registry.exact(&name("/audio")).is_some());
    assert!(registry.exact(&name("/video/live")).is_none());

    let overhead = t.elapsed();
    println!("test_registry_lookup_and_reuse: Testing Overhead = {:?}", overhead);
}
