//! Field schema resolution
//!
//! Every file under a data stream's `fields/` directory holds a list of field
//! definitions. Definitions nest: a `group` field lists its children under
//! `fields`, and a child's full name is the dotted path from the top-level
//! node down to it. Names may themselves contain dots, so `data_stream.type`
//! can be written flat or as `type` nested under `data_stream`.
//!
//! Lookups try the flattened dotted names first and fall back to walking the
//! tree one path segment at a time. The schema is rebuilt for every
//! validation pass and never cached.

use crate::error::{Error, Result};
use pkgstream_core_interface::{children_pattern, PackageFileSystem};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, trace};

/// One node of a field definition tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNode {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldNode>,
}

impl FieldNode {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            fields: Vec::new(),
        }
    }

    /// Group node with nested children
    pub fn group(name: impl Into<String>, fields: Vec<FieldNode>) -> Self {
        Self {
            name: name.into(),
            kind: "group".to_string(),
            fields,
        }
    }
}

/// Flattened `(name, type)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    pub name: String,
    pub kind: String,
}

/// All field definitions of one data stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSchema {
    nodes: Vec<FieldNode>,
}

impl FieldSchema {
    pub fn from_nodes(nodes: Vec<FieldNode>) -> Self {
        Self { nodes }
    }

    /// Load and concatenate the top-level nodes of every file in `fields_dir`
    ///
    /// Only immediate children are read, in path order; subdirectories are
    /// skipped. A missing directory yields an empty schema.
    pub fn load(fs: &dyn PackageFileSystem, fields_dir: &Path) -> Result<Self> {
        let pattern = children_pattern(fields_dir);
        let paths = fs
            .glob(&pattern)
            .map_err(|e| Error::file_system("listing fields files failed", fields_dir, e))?;

        let mut nodes = Vec::new();
        for path in paths {
            let meta = fs
                .stat(&path)
                .map_err(|e| Error::file_system("stat fields file failed", &path, e))?;
            if meta.is_dir {
                debug!(path = %path.display(), "skipping directory in fields");
                continue;
            }
            let parsed = parse_fields_file(fs, &path)?;
            debug!(path = %path.display(), count = parsed.len(), "loaded fields file");
            nodes.extend(parsed);
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[FieldNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dotted-path leaf entries; a node with children contributes its
    /// descendants instead of itself
    pub fn flatten(&self) -> Vec<FieldEntry> {
        let mut entries = Vec::new();
        for node in &self.nodes {
            flatten_into(node, None, &mut entries);
        }
        entries
    }

    /// Find a field by dotted name
    ///
    /// # Errors
    ///
    /// `FieldNotFound` when neither lookup strategy matches,
    /// `FieldTypeUndefined` when the only match has no type.
    pub fn find(&self, name: &str) -> Result<FieldEntry> {
        let direct = self.flatten().into_iter().find(|e| e.name == name);
        if let Some(entry) = &direct {
            if !entry.kind.is_empty() {
                return Ok(entry.clone());
            }
        }

        let split = self.find_split(name);
        trace!(name, direct = ?direct, split = ?split, "field lookup");
        match (direct, split) {
            (_, Some(entry)) if !entry.kind.is_empty() => Ok(entry),
            (None, None) => Err(Error::FieldNotFound(name.to_string())),
            _ => Err(Error::FieldTypeUndefined(name.to_string())),
        }
    }

    /// Walk the unflattened tree segment by segment
    fn find_split(&self, name: &str) -> Option<FieldEntry> {
        let segments: Vec<&str> = name.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut current: &[FieldNode] = &self.nodes;
        for segment in parents {
            let parent = current.iter().find(|n| n.name == *segment)?;
            current = &parent.fields;
        }
        current.iter().find(|n| n.name == *last).map(|n| FieldEntry {
            name: name.to_string(),
            kind: n.kind.clone(),
        })
    }

    /// Require `name` to exist with type `expected`
    pub fn require(&self, name: &str, expected: &str) -> Result<()> {
        let entry = self.find(name)?;
        if entry.kind != expected {
            return Err(Error::field_type_mismatch(name, expected, entry.kind.as_str()));
        }
        Ok(())
    }
}

fn flatten_into(node: &FieldNode, prefix: Option<&str>, out: &mut Vec<FieldEntry>) {
    let name = match prefix {
        Some(prefix) => format!("{prefix}.{}", node.name),
        None => node.name.clone(),
    };
    if node.fields.is_empty() {
        out.push(FieldEntry {
            name,
            kind: node.kind.clone(),
        });
        return;
    }
    for child in &node.fields {
        flatten_into(child, Some(&name), out);
    }
}

fn parse_fields_file(fs: &dyn PackageFileSystem, path: &Path) -> Result<Vec<FieldNode>> {
    let body = fs
        .read_all(path)
        .map_err(|e| Error::file_system("reading fields file failed", path, e))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    let nodes: Option<Vec<FieldNode>> = serde_yaml::from_slice(&body).map_err(|source| Error::FieldsFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(nodes.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgstream_core_interface::MemoryFileSystem;

    fn schema(nodes: Vec<FieldNode>) -> FieldSchema {
        FieldSchema::from_nodes(nodes)
    }

    #[test]
    fn test_flatten_nested_groups() {
        let s = schema(vec![
            FieldNode::group(
                "data_stream",
                vec![
                    FieldNode::new("type", "constant_keyword"),
                    FieldNode::group("meta", vec![FieldNode::new("owner", "keyword")]),
                ],
            ),
            FieldNode::new("@timestamp", "date"),
        ]);
        assert_eq!(
            s.flatten(),
            vec![
                FieldEntry {
                    name: "data_stream.type".into(),
                    kind: "constant_keyword".into()
                },
                FieldEntry {
                    name: "data_stream.meta.owner".into(),
                    kind: "keyword".into()
                },
                FieldEntry {
                    name: "@timestamp".into(),
                    kind: "date".into()
                },
            ]
        );
    }

    #[test]
    fn test_direct_match_on_dotted_name() {
        let s = schema(vec![FieldNode::new("data_stream.type", "constant_keyword")]);
        s.require("data_stream.type", "constant_keyword").unwrap();
    }

    #[test]
    fn test_type_mismatch_reports_both_types() {
        let s = schema(vec![FieldNode::new("data_stream.type", "keyword")]);
        let err = s.require("data_stream.type", "constant_keyword").unwrap_err();
        assert!(matches!(
            err,
            Error::FieldTypeMismatch { ref expected, ref got, .. }
                if expected == "constant_keyword" && got == "keyword"
        ));
    }

    #[test]
    fn test_nested_only_definition_is_found() {
        let s = schema(vec![FieldNode::group(
            "parent",
            vec![FieldNode::new("child", "keyword")],
        )]);
        assert_eq!(s.find("parent.child").unwrap().kind, "keyword");
        assert_eq!(s.find_split("parent.child").unwrap().kind, "keyword");

        let without = schema(vec![FieldNode::group("parent", vec![])]);
        assert!(matches!(
            without.find("parent.child").unwrap_err(),
            Error::FieldNotFound(ref n) if n == "parent.child"
        ));
    }

    #[test]
    fn test_split_walk_resolves_group_nodes() {
        let s = schema(vec![FieldNode::group(
            "data_stream",
            vec![FieldNode::new("type", "constant_keyword")],
        )]);
        // Groups never appear in the flattened list
        assert!(s.flatten().iter().all(|e| e.name != "data_stream"));
        assert_eq!(s.find("data_stream").unwrap().kind, "group");
    }

    #[test]
    fn test_split_walk_mixed_dotted_names() {
        let s = schema(vec![FieldNode::group(
            "a",
            vec![FieldNode::group("b", vec![FieldNode::new("c", "long")])],
        )]);
        assert_eq!(s.find_split("a.b.c").unwrap().kind, "long");
        assert!(s.find_split("a.x.c").is_none());
        assert!(s.find_split("b.c").is_none());
    }

    #[test]
    fn test_undefined_type() {
        let s = schema(vec![FieldNode::new("@timestamp", "")]);
        assert!(matches!(
            s.find("@timestamp").unwrap_err(),
            Error::FieldTypeUndefined(ref n) if n == "@timestamp"
        ));
    }

    #[test]
    fn test_load_aggregates_every_file() {
        let fs = MemoryFileSystem::new()
            .with_file(
                "ds/fields/base-fields.yml",
                "- name: data_stream.type\n  type: constant_keyword\n- name: '@timestamp'\n  type: date\n",
            )
            .with_file(
                "ds/fields/ecs.yml",
                "- name: data_stream\n  type: group\n  fields:\n    - name: dataset\n      type: constant_keyword\n      description: extra keys are ignored\n",
            )
            .with_file("ds/fields/empty.yml", "\n")
            .with_file("ds/fields/sub/ignored.yml", "- name: hidden\n  type: keyword\n");

        let s = FieldSchema::load(&fs, Path::new("ds/fields")).unwrap();
        assert_eq!(s.nodes().len(), 3);
        s.require("data_stream.type", "constant_keyword").unwrap();
        s.require("data_stream.dataset", "constant_keyword").unwrap();
        s.require("@timestamp", "date").unwrap();
        assert!(s.find("hidden").is_err());
    }

    #[test]
    fn test_load_missing_directory_is_empty() {
        let fs = MemoryFileSystem::new();
        let s = FieldSchema::load(&fs, Path::new("ds/fields")).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let fs = MemoryFileSystem::new().with_file("ds/fields/bad.yml", "name: not-a-list\n");
        let err = FieldSchema::load(&fs, Path::new("ds/fields")).unwrap_err();
        assert!(matches!(err, Error::FieldsFile { ref path, .. } if path == Path::new("ds/fields/bad.yml")));
    }
}
