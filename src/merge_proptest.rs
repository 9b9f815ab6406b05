//! Property-based tests for the merge engine.
//!
//! These tests use proptest to generate random entry names and layer
//! contents and verify that the merge invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::{BTreeMap, BTreeSet, HashSet};
    use std::path::PathBuf;

    use crate::layer::{Layer, MemoryLayer};
    use crate::merge::{
        merge_layers, normalize, pad_width, resolve_files, FileEntry, OrderClass, Preference,
    };
    use proptest::prelude::*;

    // ============================================================================
    // normalize property tests
    // ============================================================================

    proptest! {
        /// Property: directories keep their literal name, numbered or not
        #[test]
        fn directories_are_never_ordered(name in ".*") {
            let entry = normalize(&name, true).unwrap();
            prop_assert!(!entry.identity.ordered);
            prop_assert_eq!(&entry.identity.name, &name);
            prop_assert_eq!(entry.target_name, name);
            prop_assert_eq!(entry.class, OrderClass::Unordered);
        }

        /// Property: NNN[_pre|_post]_rest files are ordered and keep "rest"
        #[test]
        fn numbered_files_are_ordered(
            index in 0u16..1000,
            tag in prop_oneof![Just(""), Just("pre_"), Just("post_")],
            rest in "[a-zA-Z0-9_. -]{0,20}",
        ) {
            // an untagged rest starting with a tag would read as tagged
            prop_assume!(!tag.is_empty() || !(rest.starts_with("pre_") || rest.starts_with("post_")));
            let name = format!("{:03}_{}{}", index, tag, rest);
            let entry = normalize(&name, false).unwrap();
            prop_assert!(entry.identity.ordered);
            prop_assert_eq!(entry.identity.name, "");

            let OrderClass::Ordered { index: parsed, preference } = entry.class else {
                return Err(TestCaseError::fail("expected an ordered class"));
            };
            prop_assert_eq!(parsed, index);
            match tag {
                "pre_" => {
                    prop_assert_eq!(preference, Preference::Pre);
                    prop_assert_eq!(entry.target_name, rest);
                }
                "post_" => {
                    prop_assert_eq!(preference, Preference::Post);
                    prop_assert_eq!(entry.target_name, rest);
                }
                _ => {
                    prop_assert_eq!(preference, Preference::Neutral);
                    prop_assert_eq!(entry.target_name, rest);
                }
            }
        }

        /// Property: names without three leading ASCII digits and an underscore
        /// are unordered files identified by their literal name
        #[test]
        fn other_files_are_unordered(name in "[a-zA-Z_.-][a-zA-Z0-9_.-]{0,20}") {
            let entry = normalize(&name, false).unwrap();
            prop_assert!(!entry.identity.ordered);
            prop_assert_eq!(entry.identity.name, name.clone());
            prop_assert_eq!(entry.target_name, name);
        }

        /// Property: normalize never fails on arbitrary input
        #[test]
        fn normalize_never_fails(name in ".*", is_dir in any::<bool>()) {
            prop_assert!(normalize(&name, is_dir).is_ok());
        }
    }

    // ============================================================================
    // resolve_files property tests
    // ============================================================================

    fn preference_strategy() -> impl Strategy<Value = Preference> {
        prop_oneof![
            Just(Preference::Pre),
            Just(Preference::Neutral),
            Just(Preference::Post),
        ]
    }

    proptest! {
        /// Property: ordered entries get a dense, padded, bucket-ordered sequence
        #[test]
        fn ordered_sequence_is_dense_and_bucketed(
            preferences in prop::collection::vec(preference_strategy(), 1..60),
        ) {
            let entries: Vec<FileEntry> = preferences
                .iter()
                .enumerate()
                .map(|(i, &preference)| FileEntry {
                    layer_index: i % 3,
                    source_path: PathBuf::from(format!("010_step{}.ps1", i)),
                    target_name: format!("step{}.ps1", i),
                    class: OrderClass::Ordered { index: 10, preference },
                })
                .collect();

            let (mappings, collisions) = resolve_files(&entries).unwrap();
            prop_assert!(collisions.is_empty());
            prop_assert_eq!(mappings.len(), entries.len());

            let width = pad_width(entries.len());
            let rank = |p: Preference| match p {
                Preference::Pre => 0,
                Preference::Neutral => 1,
                Preference::Post => 2,
            };
            let mut last_rank = 0;
            for (position, mapping) in mappings.iter().enumerate() {
                let target = mapping.target_path.to_string_lossy().into_owned();
                let prefix = format!("{:0width$}_", position, width = width);
                prop_assert!(target.starts_with(&prefix), "{} lacks {}", target, prefix);

                let source_index = entries
                    .iter()
                    .position(|e| e.source_path == mapping.source_path)
                    .unwrap();
                let current_rank = rank(preferences[source_index]);
                prop_assert!(current_rank >= last_rank);
                last_rank = current_rank;
            }
        }

        /// Property: two or more unordered contributors always collide
        #[test]
        fn unordered_duplicates_collide(layers in prop::collection::btree_set(0usize..8, 2..6)) {
            let entries: Vec<FileEntry> = layers
                .iter()
                .map(|&layer| FileEntry {
                    layer_index: layer,
                    source_path: PathBuf::from("config.json"),
                    target_name: "config.json".to_string(),
                    class: OrderClass::Unordered,
                })
                .collect();
            let (mappings, collisions) = resolve_files(&entries).unwrap();
            prop_assert!(mappings.is_empty());
            prop_assert_eq!(collisions, layers.into_iter().collect::<Vec<_>>());
        }
    }

    // ============================================================================
    // merge_layers property tests
    // ============================================================================

    fn layer_names() -> impl Strategy<Value = Vec<BTreeSet<String>>> {
        let name = prop_oneof![
            "[a-d]{1,2}\\.txt",
            "[0-9]{3}_(pre_|post_)?[a-c]\\.ps1",
        ];
        prop::collection::vec(prop::collection::btree_set(name, 0..8), 1..5)
    }

    proptest! {
        /// Property: in a flat stack every file is either mapped once or part of
        /// a collision, and no two mappings share a target
        #[test]
        fn flat_merge_accounts_for_every_file(names in layer_names()) {
            let layers: Vec<MemoryLayer> = names
                .iter()
                .enumerate()
                .map(|(i, files)| {
                    let mut layer = MemoryLayer::new(format!("layer{}", i));
                    for file in files {
                        layer.add_file_string(file, file).unwrap();
                    }
                    layer
                })
                .collect();
            let refs: Vec<&dyn Layer> = layers.iter().map(|l| l as &dyn Layer).collect();

            let outcome = merge_layers(&refs, ".").unwrap();
            prop_assert!(outcome.type_collisions.is_empty());

            let targets: HashSet<&PathBuf> = outcome.mappings.iter().map(|m| &m.target_path).collect();
            prop_assert_eq!(targets.len(), outcome.mappings.len());

            let mut unordered: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
            let mut ordered_count = 0;
            for (layer, files) in names.iter().enumerate() {
                for file in files {
                    if file.ends_with(".ps1") {
                        ordered_count += 1;
                    } else {
                        unordered.entry(file.as_str()).or_default().push(layer);
                    }
                }
            }

            let ordered_mappings = outcome
                .mappings
                .iter()
                .filter(|m| m.source_path.extension().is_some_and(|e| e == "ps1"))
                .count();
            prop_assert_eq!(ordered_mappings, ordered_count);

            for (name, contributors) in unordered {
                if contributors.len() == 1 {
                    let mapped = outcome
                        .mappings
                        .iter()
                        .find(|m| m.source_path == PathBuf::from(name));
                    prop_assert!(mapped.is_some_and(|m| !m.is_renamed() && m.layer_index == contributors[0]));
                } else {
                    let collision = outcome
                        .file_collisions
                        .iter()
                        .find(|c| c.path == PathBuf::from(name));
                    prop_assert!(collision.is_some_and(|c| c.colliding_layer_indexes == contributors));
                }
            }
        }

        /// Property: merging the same stack twice gives the same outcome
        #[test]
        fn merge_is_deterministic(names in layer_names()) {
            let layers: Vec<MemoryLayer> = names
                .iter()
                .map(|files| {
                    let mut layer = MemoryLayer::new("layer");
                    for file in files {
                        layer.add_file_string(format!("sub/{}", file), "").unwrap();
                    }
                    layer
                })
                .collect();
            let refs: Vec<&dyn Layer> = layers.iter().map(|l| l as &dyn Layer).collect();

            let first = merge_layers(&refs, ".").unwrap();
            let second = merge_layers(&refs, ".").unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
