//! # Generic XML Subtree Primitive
//!
//! The single place encoding "idempotent XML mutation" for the whole
//! installer. Both the module descriptor writer and the server
//! configuration patcher descend and mutate documents exclusively through
//! [`get_or_create_child`]: an element matched by tag and predicate
//! attributes is returned unchanged, so re-adding the same resource,
//! dependency, or registration is a no-op and repeated runs converge.
//!
//! Formatting is not maintained in the tree. Documents are normalized on
//! load (whitespace-only text nodes dropped) and re-indented by the
//! serializer on write, so element insertion never needs text-node surgery.

use crate::error::Result;
use std::fs;
use std::path::Path;
use xot::output::xml::{Declaration, Parameters};
use xot::output::Indentation;
use xot::{NameId, Node, Xot};

/// Search/creation specification for one child element.
///
/// Predicate attributes participate in matching and are set on a created
/// element; create-only attributes (e.g. `export`) are set on creation but
/// never matched against.
#[derive(Debug, Clone, Default)]
pub struct ChildSpec<'a> {
    tag: &'a str,
    namespace: Option<&'a str>,
    attributes: Vec<(&'a str, String)>,
    create_attributes: Vec<(&'a str, String)>,
    create_namespace: Option<&'a str>,
}

impl<'a> ChildSpec<'a> {
    pub fn new(tag: &'a str) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    /// Require the child's namespace URI to match `prefix`, ignoring the
    /// trailing version segment (`urn:jboss:domain:ee` matches
    /// `urn:jboss:domain:ee:5.0`).
    pub fn namespace(mut self, prefix: &'a str) -> Self {
        self.namespace = Some(prefix);
        self
    }

    /// Add a predicate attribute: matched during search, set on creation.
    pub fn attribute(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    /// Add an attribute set only when the element is created.
    pub fn create_attribute(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.create_attributes.push((name, value.into()));
        self
    }

    /// Full namespace URI (declared as the default namespace) for an
    /// element this spec creates. Without it a created element inherits the
    /// parent's namespace.
    pub fn create_namespace(mut self, uri: &'a str) -> Self {
        self.create_namespace = Some(uri);
        self
    }
}

/// Whether a namespace URI matches a predicate prefix, ignoring the version
/// suffix after the last `:`.
pub fn namespace_matches(uri: &str, prefix: &str) -> bool {
    if uri == prefix {
        return true;
    }
    match uri.rsplit_once(':') {
        Some((head, _)) => head == prefix,
        None => false,
    }
}

/// Find a direct child of `parent` matching `spec`, creating and appending
/// it when absent.
///
/// Returns the child and whether it was created by this call. A found child
/// is returned completely unchanged; this is what makes repeated runs
/// idempotent under merge semantics.
pub fn get_or_create_child(xot: &mut Xot, parent: Node, spec: &ChildSpec) -> Result<(Node, bool)> {
    let attribute_names: Vec<NameId> = spec
        .attributes
        .iter()
        .map(|(name, _)| xot.add_name(name))
        .collect();

    let children: Vec<Node> = xot.children(parent).collect();
    for child in children {
        let name = match xot.element(child) {
            Some(element) => element.name(),
            None => continue,
        };
        let (local, uri) = xot.name_ns_str(name);
        if local != spec.tag {
            continue;
        }
        if let Some(prefix) = spec.namespace {
            if !namespace_matches(uri, prefix) {
                continue;
            }
        }
        let attributes = xot.attributes(child);
        let all_match = attribute_names
            .iter()
            .zip(spec.attributes.iter())
            .all(|(id, (_, want))| attributes.get(*id).map(|v| v == want).unwrap_or(false));
        if all_match {
            return Ok((child, false));
        }
    }

    let child = create_child(xot, parent, spec)?;
    Ok((child, true))
}

/// Create and append a child element for `spec` unconditionally, setting
/// both predicate and create-only attributes.
pub fn create_child(xot: &mut Xot, parent: Node, spec: &ChildSpec) -> Result<Node> {
    let explicit_namespace = spec.create_namespace.map(str::to_string);
    let inherited_namespace = xot
        .element(parent)
        .map(|element| xot.name_ns_str(element.name()).1.to_string())
        .filter(|uri| !uri.is_empty());
    let namespace_uri = explicit_namespace.clone().or(inherited_namespace);

    let name = match &namespace_uri {
        Some(uri) => {
            let namespace = xot.add_namespace(uri);
            xot.add_name_ns(spec.tag, namespace)
        }
        None => xot.add_name(spec.tag),
    };
    let element = xot.new_element(name);

    // An explicitly namespaced element declares its namespace as the
    // default one, so descendants created later inherit it cleanly.
    if let Some(uri) = &explicit_namespace {
        let namespace = xot.add_namespace(uri);
        let default_prefix = xot.add_prefix("");
        xot.namespaces_mut(element).insert(default_prefix, namespace);
    }

    xot.append(parent, element)?;

    let mut pending: Vec<(NameId, String)> = Vec::new();
    for (name, value) in spec.attributes.iter().chain(spec.create_attributes.iter()) {
        let id = xot.add_name(name);
        pending.push((id, value.clone()));
    }
    let mut attributes = xot.attributes_mut(element);
    for (id, value) in pending {
        attributes.insert(id, value);
    }

    Ok(element)
}

/// Read one attribute of an element as an owned string.
pub fn attribute_value(xot: &Xot, node: Node, name: &str) -> Option<String> {
    let id = xot.name(name)?;
    xot.attributes(node).get(id).cloned()
}

/// Set one attribute on an element, overwriting any previous value.
pub fn set_attribute(xot: &mut Xot, node: Node, name: &str, value: impl Into<String>) {
    let id = xot.add_name(name);
    xot.attributes_mut(node).insert(id, value.into());
}

/// The element's local name, without namespace.
pub fn local_name(xot: &Xot, node: Node) -> Option<String> {
    let element = xot.element(node)?;
    Some(xot.name_ns_str(element.name()).0.to_string())
}

/// Direct element children of a node.
pub fn element_children(xot: &Xot, node: Node) -> Vec<Node> {
    xot.children(node)
        .filter(|&child| xot.element(child).is_some())
        .collect()
}

/// Read-only search for a direct child element, without creating anything.
///
/// The namespace predicate matches like [`namespace_matches`].
pub fn find_child(xot: &Xot, parent: Node, tag: &str, namespace: Option<&str>) -> Option<Node> {
    element_children(xot, parent).into_iter().find(|&child| {
        let Some(element) = xot.element(child) else {
            return false;
        };
        let (local, uri) = xot.name_ns_str(element.name());
        if local != tag {
            return false;
        }
        match namespace {
            Some(prefix) => namespace_matches(uri, prefix),
            None => true,
        }
    })
}

/// Parse an XML string into a normalized document.
pub fn parse_document(xot: &mut Xot, contents: &str) -> Result<Node> {
    let document = xot.parse(contents)?;
    strip_whitespace_text(xot, document)?;
    Ok(document)
}

/// Load and normalize an XML document from a file.
pub fn load_document(xot: &mut Xot, path: &Path) -> Result<Node> {
    let contents = fs::read_to_string(path)?;
    parse_document(xot, &contents)
}

/// Serialize a document with stable indentation and an XML declaration.
pub fn serialize_document(xot: &mut Xot, document: Node) -> Result<String> {
    let parameters = Parameters {
        indentation: Some(Indentation::default()),
        declaration: Some(Declaration {
            encoding: Some("UTF-8".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    };
    Ok(xot.serialize_xml_string(parameters, document)?)
}

/// Serialize a document to a file.
pub fn write_document(xot: &mut Xot, document: Node, path: &Path) -> Result<()> {
    let contents = serialize_document(xot, document)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Drop whitespace-only text nodes so the serializer's indentation is the
/// only formatting in the document.
fn strip_whitespace_text(xot: &mut Xot, document: Node) -> Result<()> {
    let whitespace: Vec<Node> = xot
        .descendants(document)
        .filter(|&node| {
            xot.text(node)
                .map(|text| text.get().trim().is_empty())
                .unwrap_or(false)
        })
        .collect();
    for node in whitespace {
        xot.remove(node)?;
    }
    Ok(())
}
