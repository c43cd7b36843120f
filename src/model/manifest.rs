//! Manifest loading: the boundary with the front-end.
//!
//! The front-end writes everything it extracted from annotated source as
//! one JSON document. This module turns it into a [`MetadataGraph`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Instantiation, MetadataGraph, UserConstant, UserFunction, UserType};
use crate::diagnostic::Diagnostic;
use crate::span::Span;

/// On-disk layout of the front-end's metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub types: Vec<UserType>,
    #[serde(default)]
    pub constants: Vec<UserConstant>,
    #[serde(default)]
    pub functions: Vec<UserFunction>,
    #[serde(default)]
    pub instantiations: Vec<Instantiation>,
}

impl Manifest {
    pub fn into_graph(self) -> MetadataGraph {
        let mut graph = MetadataGraph::new();
        for ty in self.types {
            graph.add_type(ty);
        }
        for constant in self.constants {
            graph.add_constant(constant);
        }
        for function in self.functions {
            graph.add_function(function);
        }
        for inst in self.instantiations {
            graph.add_instantiation(inst);
        }
        graph
    }
}

/// Parse manifest text. Syntax and schema errors point at the offending
/// position in `source`.
pub fn parse_manifest(source: &str) -> Result<MetadataGraph, Diagnostic> {
    let manifest: Manifest = serde_json::from_str(source).map_err(|e| {
        let offset = byte_offset(source, e.line(), e.column());
        let end = (offset + 1).min(source.len()).max(offset);
        Diagnostic::error(
            format!("invalid manifest: {}", e),
            Span::new(0, offset as u32, end as u32),
        )
        .with_help("manifests are produced by the front-end; regenerate it".to_string())
    })?;
    Ok(manifest.into_graph())
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<(MetadataGraph, String), Diagnostic> {
    let source = std::fs::read_to_string(path).map_err(|e| {
        Diagnostic::error(
            format!("cannot read '{}': {}", path.display(), e),
            Span::dummy(),
        )
    })?;
    let graph = parse_manifest(&source)?;
    Ok((graph, source))
}

/// serde_json reports 1-based lines and columns; line 0 means "no position".
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line - 1)
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerKind, IndexingMode, Skeleton};

    const PAIRS: &str = r#"{
  "functions": [
    {
      "name": "mult",
      "unique_name": "mult_0",
      "return_type": "float",
      "indexing": "row_col",
      "elementwise": [
        { "name": "a", "type": "float" },
        { "name": "b", "type": "float" }
      ],
      "containers": [{ "name": "m", "type": "float", "kind": "matrix_row" }],
      "scalars": [{ "name": "k", "type": "float" }],
      "body": "return a * b * k;"
    }
  ],
  "instantiations": [{ "skeleton": "MapPairs", "function": "mult_0" }]
}"#;

    #[test]
    fn test_parse_pairs_manifest() {
        let graph = parse_manifest(PAIRS).unwrap();
        let f = graph.function("mult_0").unwrap();
        assert_eq!(f.indexing, IndexingMode::RowCol);
        assert_eq!(f.index_param, "index");
        assert_eq!(f.containers[0].kind, ContainerKind::MatrixRow);
        assert_eq!(f.scalars[0].resolved_type, "float");
        let inst = &graph.instantiations()[0];
        assert_eq!(inst.skeleton, Skeleton::MapPairs);
        assert_eq!((inst.varity, inst.harity), (1, 1));
    }

    #[test]
    fn test_syntax_error_points_at_line() {
        let source = "{\n  \"functions\": [\n    oops\n  ]\n}";
        let err = parse_manifest(source).unwrap_err();
        assert!(err.message.starts_with("invalid manifest"));
        let offset = err.span.start as usize;
        assert_eq!(&source[offset..offset + 4], "oops");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse_manifest(r#"{ "kernels": [] }"#).unwrap_err();
        assert!(err.message.contains("kernels"));
    }

    #[test]
    fn test_byte_offset_clamps() {
        assert_eq!(byte_offset("abc", 0, 0), 0);
        assert_eq!(byte_offset("abc\ndef", 2, 2), 5);
        assert_eq!(byte_offset("abc", 1, 99), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_manifest(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.message.contains("cannot read"));
    }
}
