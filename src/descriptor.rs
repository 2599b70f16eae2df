//! # Module Descriptor Writer
//!
//! Produces or updates the `module.xml` at a module's home directory.
//!
//! Under `MERGE` an existing descriptor is loaded as the base document and
//! new entries are unioned into it through the find-or-create primitive;
//! under `UPDATE` and `REPLACE` the document starts fresh. Resources are
//! re-scanned from disk rather than taken from the in-memory copy list, so
//! externally staged jars are picked up. Either way the result upholds the
//! descriptor invariants: resource-roots unique by `path`, dependency
//! entries unique by `(name, slot)`.

use crate::config::{ExtraDependency, WriteMode};
use crate::error::{Error, Result};
use crate::module::Module;
use crate::xml::{self, ChildSpec};
use std::collections::BTreeSet;
use std::path::Path;
use walkdir::WalkDir;
use xot::Xot;

/// Target descriptor schema namespace.
pub const MODULE_NAMESPACE: &str = "urn:jboss:module:1.1";

/// Descriptor file name inside a module home.
pub const DESCRIPTOR_FILE: &str = "module.xml";

/// Names of the `.jar` files directly inside `home`, sorted for
/// deterministic descriptor output.
pub fn jar_files(home: &Path) -> Result<Vec<String>> {
    let mut jars = Vec::new();
    for entry in WalkDir::new(home).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("failed to scan {}: {}", home.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".jar") {
            jars.push(name);
        }
    }
    jars.sort();
    Ok(jars)
}

/// Generate or merge the descriptor for `module`, returning the resource
/// file names it now lists.
///
/// `flattened` suppresses dependency emission entirely and drops a
/// `dependencies` element left over from an earlier non-flattened run (the
/// resource scan already covers the subtree's jars); `extras` are the
/// statically configured dependencies, passed only for the root module.
/// With dedup disabled an extra may duplicate a graph-derived entry within
/// one run, but never its own prior appearance in the loaded document.
pub fn write_descriptor(
    module: &Module,
    write_mode: WriteMode,
    flattened: bool,
    extras: &[ExtraDependency],
    dedupe_extras: bool,
) -> Result<Vec<String>> {
    let path = module.home.join(DESCRIPTOR_FILE);
    let mut xot = Xot::new();

    let document = if write_mode == WriteMode::Merge && path.exists() {
        xml::load_document(&mut xot, &path)?
    } else {
        xml::parse_document(&mut xot, &format!(r#"<module xmlns="{}"/>"#, MODULE_NAMESPACE))?
    };
    let root = xot.document_element(document)?;
    xml::set_attribute(&mut xot, root, "name", module.name.as_str());
    xml::set_attribute(&mut xot, root, "slot", module.slot.as_str());

    let resources = jar_files(&module.home)?;
    if !resources.is_empty() {
        let (resources_element, _) =
            xml::get_or_create_child(&mut xot, root, &ChildSpec::new("resources"))?;
        for jar in &resources {
            xml::get_or_create_child(
                &mut xot,
                resources_element,
                &ChildSpec::new("resource-root").attribute("path", jar.clone()),
            )?;
        }
    }

    // Entries already in the loaded document, before this run adds any.
    let prior_dependencies: BTreeSet<(String, String)> =
        match xml::find_child(&xot, root, "dependencies", None) {
            Some(element) => xml::element_children(&xot, element)
                .into_iter()
                .filter_map(|entry| {
                    Some((
                        xml::attribute_value(&xot, entry, "name")?,
                        xml::attribute_value(&xot, entry, "slot")?,
                    ))
                })
                .collect(),
            None => BTreeSet::new(),
        };

    let graph_dependencies = if flattened { &[][..] } else { &module.dependencies[..] };
    let extra_dependencies = if flattened { &[][..] } else { extras };

    if flattened {
        // A dependency list merged in from a pre-flatten descriptor would
        // leave the module with edges it no longer needs.
        if let Some(stale) = xml::find_child(&xot, root, "dependencies", None) {
            xot.remove(stale)?;
        }
    }

    // An empty dependency set emits no dependencies element at all.
    if !graph_dependencies.is_empty() || !extra_dependencies.is_empty() {
        let (dependencies_element, _) =
            xml::get_or_create_child(&mut xot, root, &ChildSpec::new("dependencies"))?;
        for dependency in graph_dependencies {
            xml::get_or_create_child(
                &mut xot,
                dependencies_element,
                &ChildSpec::new("module")
                    .attribute("name", dependency.name.clone())
                    .attribute("slot", dependency.slot.clone())
                    .create_attribute("export", "true"),
            )?;
        }
        for extra in extra_dependencies {
            let spec = ChildSpec::new("module")
                .attribute("name", extra.name.clone())
                .attribute("slot", extra.slot.clone())
                .create_attribute("export", "true");
            if dedupe_extras {
                xml::get_or_create_child(&mut xot, dependencies_element, &spec)?;
            } else if !prior_dependencies.contains(&(extra.name.clone(), extra.slot.clone())) {
                xml::create_child(&mut xot, dependencies_element, &spec)?;
            }
        }
    }

    xml::write_document(&mut xot, document, &path).map_err(|e| Error::Descriptor {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    Ok(resources)
}

/// Parsed view of a descriptor, for inspection and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSummary {
    pub name: Option<String>,
    pub slot: Option<String>,
    pub resources: BTreeSet<String>,
    /// Dependency entries as `(name, slot)` pairs.
    pub dependencies: BTreeSet<(String, String)>,
}

/// Read a descriptor back from disk.
pub fn read_descriptor(path: &Path) -> Result<DescriptorSummary> {
    let mut xot = Xot::new();
    let document = xml::load_document(&mut xot, path)?;
    let root = xot.document_element(document)?;

    let mut summary = DescriptorSummary {
        name: xml::attribute_value(&xot, root, "name"),
        slot: xml::attribute_value(&xot, root, "slot"),
        resources: BTreeSet::new(),
        dependencies: BTreeSet::new(),
    };

    for child in xml::element_children(&xot, root) {
        match xml::local_name(&xot, child).as_deref() {
            Some("resources") => {
                for entry in xml::element_children(&xot, child) {
                    if let Some(path) = xml::attribute_value(&xot, entry, "path") {
                        summary.resources.insert(path);
                    }
                }
            }
            Some("dependencies") => {
                for entry in xml::element_children(&xot, child) {
                    let name = xml::attribute_value(&xot, entry, "name").unwrap_or_default();
                    let slot = xml::attribute_value(&xot, entry, "slot").unwrap_or_default();
                    summary.dependencies.insert((name, slot));
                }
            }
            _ => {}
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleRef;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn module_with_home(home: PathBuf, dependencies: Vec<ModuleRef>) -> Module {
        Module {
            name: "global.com.acme.driver".to_string(),
            slot: "1.0".to_string(),
            home,
            resources: Vec::new(),
            dependencies,
            depth: 0,
        }
    }

    fn stage_jar(home: &Path, name: &str) {
        fs::create_dir_all(home).unwrap();
        fs::write(home.join(name), b"jar bytes").unwrap();
    }

    #[test]
    fn test_jar_files_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "b.jar");
        stage_jar(temp.path(), "a.jar");
        fs::write(temp.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir_all(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub/nested.jar"), b"x").unwrap();

        let jars = jar_files(temp.path()).unwrap();
        assert_eq!(jars, vec!["a.jar".to_string(), "b.jar".to_string()]);
    }

    #[test]
    fn test_fresh_descriptor_with_dependency() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );

        let resources =
            write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();
        assert_eq!(resources, vec!["driver-1.0.jar".to_string()]);

        let summary = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(summary.name.as_deref(), Some("global.com.acme.driver"));
        assert_eq!(summary.slot.as_deref(), Some("1.0"));
        assert!(summary.resources.contains("driver-1.0.jar"));
        assert!(summary
            .dependencies
            .contains(&("global.com.acme.util".to_string(), "2.0".to_string())));
    }

    #[test]
    fn test_no_dependencies_element_for_leaf() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "util-2.0.jar");
        let module = module_with_home(temp.path().to_path_buf(), Vec::new());

        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();

        let contents = fs::read_to_string(temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert!(!contents.contains("<dependencies"));
    }

    #[test]
    fn test_merge_preserves_foreign_entries() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        fs::write(
            temp.path().join(DESCRIPTOR_FILE),
            r#"<module xmlns="urn:jboss:module:1.1" name="global.com.acme.driver">
    <resources>
        <resource-root path="staged-extra.jar"/>
    </resources>
    <dependencies>
        <module name="org.postgresql.jdbc" slot="main"/>
    </dependencies>
</module>"#,
        )
        .unwrap();

        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );
        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();

        let summary = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        // The stale resource entry survives a merge even though the file is
        // not on disk; only the union grows.
        assert!(summary.resources.contains("staged-extra.jar"));
        assert!(summary.resources.contains("driver-1.0.jar"));
        assert!(summary
            .dependencies
            .contains(&("org.postgresql.jdbc".to_string(), "main".to_string())));
        assert!(summary
            .dependencies
            .contains(&("global.com.acme.util".to_string(), "2.0".to_string())));
    }

    #[test]
    fn test_update_discards_previous_descriptor() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        fs::write(
            temp.path().join(DESCRIPTOR_FILE),
            r#"<module xmlns="urn:jboss:module:1.1"><dependencies><module name="stale" slot="main"/></dependencies></module>"#,
        )
        .unwrap();

        let module = module_with_home(temp.path().to_path_buf(), Vec::new());
        write_descriptor(&module, WriteMode::Update, false, &[], true).unwrap();

        let summary = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert!(summary.dependencies.is_empty());
        assert!(summary.resources.contains("driver-1.0.jar"));
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );

        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();
        let first = fs::read_to_string(temp.path().join(DESCRIPTOR_FILE)).unwrap();
        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();
        let second = fs::read_to_string(temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_flattened_descriptor_has_no_dependency_edges() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        stage_jar(temp.path(), "util-2.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );

        let resources = write_descriptor(
            &module,
            WriteMode::Merge,
            true,
            &[ExtraDependency {
                name: "org.postgresql.jdbc".to_string(),
                slot: "main".to_string(),
            }],
            true,
        )
        .unwrap();
        assert_eq!(resources.len(), 2);

        let summary = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert!(summary.dependencies.is_empty());
        assert_eq!(summary.resources.len(), 2);
    }

    #[test]
    fn test_extra_dependencies_deduped_against_graph() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );
        let extras = vec![ExtraDependency {
            name: "global.com.acme.util".to_string(),
            slot: "2.0".to_string(),
        }];

        write_descriptor(&module, WriteMode::Merge, false, &extras, true).unwrap();
        let summary = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(summary.dependencies.len(), 1);
    }

    #[test]
    fn test_extras_without_dedupe_may_duplicate_graph_entries() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![ModuleRef {
                name: "global.com.acme.util".to_string(),
                slot: "2.0".to_string(),
            }],
        );
        let extras = vec![ExtraDependency {
            name: "global.com.acme.util".to_string(),
            slot: "2.0".to_string(),
        }];

        write_descriptor(&module, WriteMode::Update, false, &extras, false).unwrap();

        // Within one run the opt-out allows the extra to double a
        // graph-derived entry.
        let contents = fs::read_to_string(temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(contents.matches("global.com.acme.util").count(), 2);
    }

    #[test]
    fn test_extras_without_dedupe_stable_across_merge_runs() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(temp.path().to_path_buf(), Vec::new());
        let extras = vec![ExtraDependency {
            name: "org.postgresql.jdbc".to_string(),
            slot: "main".to_string(),
        }];

        write_descriptor(&module, WriteMode::Merge, false, &extras, false).unwrap();
        write_descriptor(&module, WriteMode::Merge, false, &extras, false).unwrap();
        write_descriptor(&module, WriteMode::Merge, false, &extras, false).unwrap();

        // An extra already in the loaded document is never appended again.
        let contents = fs::read_to_string(temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(contents.matches("org.postgresql.jdbc").count(), 1);
    }

    #[test]
    fn test_merge_flatten_drops_previous_dependency_edges() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        stage_jar(temp.path(), "util-2.0.jar");
        let dependencies = vec![ModuleRef {
            name: "global.com.acme.util".to_string(),
            slot: "2.0".to_string(),
        }];
        let module = module_with_home(temp.path().to_path_buf(), dependencies);

        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();
        let before = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert_eq!(before.dependencies.len(), 1);

        // Turning flattening on over the merged descriptor removes the
        // edges from the earlier run instead of keeping them alongside the
        // subtree resources.
        write_descriptor(&module, WriteMode::Merge, true, &[], true).unwrap();
        let after = read_descriptor(&temp.path().join(DESCRIPTOR_FILE)).unwrap();
        assert!(after.dependencies.is_empty());
        assert!(after.resources.contains("driver-1.0.jar"));
        assert!(after.resources.contains("util-2.0.jar"));
    }

    #[test]
    fn test_round_trip_preserves_sets() {
        let temp = TempDir::new().unwrap();
        stage_jar(temp.path(), "driver-1.0.jar");
        let module = module_with_home(
            temp.path().to_path_buf(),
            vec![
                ModuleRef {
                    name: "global.com.acme.util".to_string(),
                    slot: "2.0".to_string(),
                },
                ModuleRef {
                    name: "global.com.acme.other".to_string(),
                    slot: "3.1".to_string(),
                },
            ],
        );
        write_descriptor(&module, WriteMode::Merge, false, &[], true).unwrap();

        let path = temp.path().join(DESCRIPTOR_FILE);
        let first = read_descriptor(&path).unwrap();
        // Serialize the parsed document again and re-read.
        let mut xot = Xot::new();
        let document = crate::xml::load_document(&mut xot, &path).unwrap();
        let serialized = crate::xml::serialize_document(&mut xot, document).unwrap();
        fs::write(&path, serialized).unwrap();
        let second = read_descriptor(&path).unwrap();

        assert_eq!(first.resources, second.resources);
        assert_eq!(first.dependencies, second.dependencies);
    }
}
