use std::collections::BTreeSet;

use super::*;
use crate::error::GenError;

fn elwise(names: &[&str]) -> Vec<ElementwiseParam> {
    names
        .iter()
        .map(|n| ElementwiseParam {
            name: n.to_string(),
            resolved_type: "float".to_string(),
            side: Side::Vertical,
        })
        .collect()
}

fn function(unique: &str, params: &[&str]) -> UserFunction {
    UserFunction {
        name: unique.to_string(),
        unique_name: unique.to_string(),
        return_type: "float".to_string(),
        indexing: IndexingMode::None,
        index_param: "index".to_string(),
        requires_double_precision: false,
        elementwise: elwise(params),
        containers: Vec::new(),
        scalars: Vec::new(),
        referenced_types: Vec::new(),
        calls: Vec::new(),
        body: "return 0;".to_string(),
        location: None,
    }
}

fn user_type(name: &str, deps: &[&str]) -> UserType {
    UserType {
        name: name.to_string(),
        definition: format!("typedef struct {{ int x; }} {};", name),
        depends_on: deps.iter().map(|d| d.to_string()).collect(),
    }
}

fn pairs(function: &str, varity: usize, harity: usize) -> Instantiation {
    Instantiation {
        skeleton: Skeleton::MapPairs,
        function: function.to_string(),
        varity,
        harity,
    }
}

fn type_names(types: Vec<&UserType>) -> Vec<&str> {
    types.into_iter().map(|t| t.name.as_str()).collect()
}

// ─── Binding ───────────────────────────────────────────────────────

#[test]
fn test_bind_assigns_sides() {
    let mut graph = MetadataGraph::new();
    graph.add_function(function("f", &["a", "b", "c", "d", "e"]));
    let bound = graph.bind(&pairs("f", 2, 3)).unwrap();
    let sides: Vec<Side> = bound.elementwise.iter().map(|p| p.side).collect();
    assert_eq!(
        sides,
        vec![
            Side::Vertical,
            Side::Vertical,
            Side::Horizontal,
            Side::Horizontal,
            Side::Horizontal
        ]
    );
    assert_eq!(bound.varity(), 2);
}

#[test]
fn test_bind_checks_parameter_count() {
    let mut graph = MetadataGraph::new();
    graph.add_function(function("f", &["a", "b", "c"]));
    let err = graph.bind(&pairs("f", 1, 1)).unwrap_err();
    match err {
        GenError::ShapeMismatch {
            expected, found, ..
        } => assert_eq!((expected, found), (2, 3)),
        other => panic!("expected shape mismatch, got {:?}", other),
    }
}

#[test]
fn test_bind_unknown_function() {
    let graph = MetadataGraph::new();
    assert!(matches!(
        graph.bind(&pairs("missing", 1, 1)),
        Err(GenError::UnknownFunction(name)) if name == "missing"
    ));
}

#[test]
fn test_bind_unpaired_skeleton_keeps_params() {
    let mut graph = MetadataGraph::new();
    graph.add_function(function("f", &["a"]));
    let inst = Instantiation {
        skeleton: Skeleton::Map,
        function: "f".to_string(),
        varity: 1,
        harity: 1,
    };
    assert_eq!(graph.bind(&inst).unwrap().elementwise.len(), 1);
}

#[test]
fn test_add_function_replaces_duplicate() {
    let mut graph = MetadataGraph::new();
    graph.add_function(function("f", &["a"]));
    graph.add_function(function("f", &["a", "b"]));
    assert_eq!(graph.functions().len(), 1);
    assert_eq!(graph.function("f").unwrap().elementwise.len(), 2);
}

// ─── User types ────────────────────────────────────────────────────

#[test]
fn test_types_dependencies_first() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("Body", &["Vec3", "Mass"]));
    graph.add_type(user_type("Vec3", &["Scalar"]));
    graph.add_type(user_type("Mass", &[]));
    graph.add_type(user_type("Scalar", &[]));
    graph.add_type(user_type("Unused", &[]));

    let mut f = function("f", &["a", "b"]);
    f.referenced_types = vec!["Body".to_string()];
    let types = graph.types_for(&f).unwrap();
    assert_eq!(type_names(types), vec!["Scalar", "Vec3", "Mass", "Body"]);
}

#[test]
fn test_types_shared_dependency_emitted_once() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("A", &["Common"]));
    graph.add_type(user_type("B", &["Common"]));
    graph.add_type(user_type("Common", &[]));

    let mut f = function("f", &["a", "b"]);
    f.referenced_types = vec!["B".to_string(), "A".to_string()];
    let types = graph.types_for(&f).unwrap();
    assert_eq!(type_names(types), vec!["Common", "B", "A"]);
}

#[test]
fn test_types_cycle_is_error() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("A", &["B"]));
    graph.add_type(user_type("B", &["A"]));
    let mut f = function("f", &["a", "b"]);
    f.referenced_types = vec!["A".to_string()];
    assert!(matches!(graph.types_for(&f), Err(GenError::TypeCycle(_))));
}

#[test]
fn test_types_unknown_reference() {
    let graph = MetadataGraph::new();
    let mut f = function("f", &["a", "b"]);
    f.referenced_types = vec!["Ghost".to_string()];
    assert!(matches!(
        graph.types_for(&f),
        Err(GenError::UnknownUserType { name, .. }) if name == "Ghost"
    ));
}

#[test]
fn test_no_referenced_types() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("A", &[]));
    assert!(graph.types_for(&function("f", &["a", "b"])).unwrap().is_empty());
}

// ─── Validation ────────────────────────────────────────────────────

fn allowed() -> BTreeSet<String> {
    ["sqrt", "exp"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_validate_clean_graph() {
    let mut graph = MetadataGraph::new();
    let mut helper = function("helper", &["x"]);
    helper.calls = vec!["sqrt".to_string()];
    let mut f = function("f_0", &["a", "b"]);
    f.name = "f".to_string();
    f.calls = vec!["helper".to_string(), "exp".to_string()];
    graph.add_function(helper);
    graph.add_function(f);
    graph.add_instantiation(pairs("f_0", 1, 1));
    assert!(graph.validate(&allowed()).is_empty());
}

#[test]
fn test_validate_collects_every_problem() {
    let mut graph = MetadataGraph::new();
    let mut f = function("f", &["a", "skel_b"]);
    f.calls = vec!["printf".to_string()];
    f.referenced_types = vec!["Ghost".to_string()];
    f.scalars = vec![ScalarParam {
        name: "n".to_string(),
        resolved_type: "int".to_string(),
    }];
    graph.add_function(f);
    graph.add_instantiation(pairs("f", 2, 1));
    graph.add_instantiation(pairs("g", 1, 1));

    let errors = graph.validate(&allowed());
    assert_eq!(errors.len(), 6, "{:#?}", errors);
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::ReservedName { param, .. } if param == "skel_b")));
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::ReservedName { param, .. } if param == "n")));
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::DisallowedCall { callee, .. } if callee == "printf")));
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::UnknownUserType { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::ShapeMismatch { .. })));
    assert!(errors
        .iter()
        .any(|e| matches!(e, GenError::UnknownFunction(name) if name == "g")));
}

#[test]
fn test_validate_invalid_identifiers() {
    let mut graph = MetadataGraph::new();
    graph.add_function(function("f-1", &["a b"]));
    graph.add_constant(UserConstant {
        name: "2PI".to_string(),
        type_name: "float".to_string(),
        definition: "6.28f".to_string(),
    });
    let errors = graph.validate(&allowed());
    let what: Vec<&str> = errors
        .iter()
        .filter_map(|e| match e {
            GenError::InvalidIdentifier { what, .. } => Some(*what),
            _ => None,
        })
        .collect();
    assert_eq!(what, vec!["constant", "function", "parameter"]);
}

#[test]
fn test_validate_reports_type_cycle() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("A", &["A"]));
    let errors = graph.validate(&allowed());
    assert!(matches!(errors.as_slice(), [GenError::TypeCycle(name)] if name == "A"));
}

#[test]
fn test_validate_rejects_duplicate_params() {
    let mut graph = MetadataGraph::new();
    let mut f = function("f", &["a", "b"]);
    f.scalars = vec![ScalarParam {
        name: "a".to_string(),
        resolved_type: "float".to_string(),
    }];
    graph.add_function(f);
    let mut g = function("g", &["x", "y"]);
    g.indexing = IndexingMode::Linear;
    g.index_param = "y".to_string();
    graph.add_function(g);

    let errors = graph.validate(&allowed());
    let dups: Vec<(&str, &str)> = errors
        .iter()
        .filter_map(|e| match e {
            GenError::DuplicateParam { function, param } => Some((function.as_str(), param.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(dups, vec![("f", "a"), ("g", "y")]);
    assert_eq!(errors.len(), 2, "{:#?}", errors);
}

// ─── Calls ─────────────────────────────────────────────────────────

#[test]
fn test_callees_dependencies_first() {
    let mut graph = MetadataGraph::new();
    let mut leaf = function("leaf_0", &["x"]);
    leaf.name = "leaf".to_string();
    let mut mid = function("mid_0", &["x"]);
    mid.name = "mid".to_string();
    mid.calls = vec!["leaf".to_string(), "sqrt".to_string()];
    graph.add_function(leaf);
    graph.add_function(mid);

    let mut f = function("f", &["a", "b"]);
    f.calls = vec!["mid".to_string(), "leaf".to_string()];
    let callees = graph.callees(&f).unwrap();
    let names: Vec<(&str, &str)> = callees
        .iter()
        .map(|c| (c.name.as_str(), c.function.unique_name.as_str()))
        .collect();
    assert_eq!(names, vec![("leaf", "leaf_0"), ("mid", "mid_0")]);
}

#[test]
fn test_resolve_call_prefers_unique_name() {
    let mut graph = MetadataGraph::new();
    let mut a = function("g", &["x"]);
    a.name = "h".to_string();
    let mut b = function("h_0", &["x"]);
    b.name = "g".to_string();
    graph.add_function(a);
    graph.add_function(b);
    assert_eq!(graph.resolve_call("g").unwrap().unique_name, "g");
    assert_eq!(graph.resolve_call("h").unwrap().unique_name, "g");
    assert!(graph.resolve_call("sqrt").is_none());
}

#[test]
fn test_types_include_callee_types() {
    let mut graph = MetadataGraph::new();
    graph.add_type(user_type("A", &[]));
    graph.add_type(user_type("B", &["C"]));
    graph.add_type(user_type("C", &[]));
    let mut helper = function("helper", &["x"]);
    helper.referenced_types = vec!["B".to_string()];
    graph.add_function(helper);

    let mut f = function("f", &["a", "b"]);
    f.referenced_types = vec!["A".to_string()];
    f.calls = vec!["helper".to_string()];
    let types = graph.types_for(&f).unwrap();
    assert_eq!(type_names(types), vec!["A", "C", "B"]);
}

#[test]
fn test_recursive_calls_are_rejected() {
    let mut graph = MetadataGraph::new();
    let mut f = function("f_0", &["a", "b"]);
    f.name = "f".to_string();
    f.calls = vec!["g".to_string()];
    let mut g = function("g", &["x"]);
    g.calls = vec!["f".to_string()];
    graph.add_function(f.clone());
    graph.add_function(g);
    graph.add_instantiation(pairs("f_0", 1, 1));

    assert!(matches!(graph.callees(&f), Err(GenError::RecursiveCall(name)) if name == "f_0"));
    let errors = graph.validate(&allowed());
    assert!(matches!(errors.as_slice(), [GenError::RecursiveCall(name)] if name == "f_0"));
}

// ─── Values ────────────────────────────────────────────────────────

#[test]
fn test_param_names_order() {
    let mut f = function("f", &["a", "b"]);
    f.indexing = IndexingMode::Linear;
    f.index_param = "idx".to_string();
    f.containers = vec![ContainerParam {
        name: "m".to_string(),
        resolved_type: "float".to_string(),
        kind: ContainerKind::Matrix,
    }];
    f.scalars = vec![ScalarParam {
        name: "k".to_string(),
        resolved_type: "int".to_string(),
    }];
    let names: Vec<&str> = f.param_names().collect();
    assert_eq!(names, vec!["idx", "a", "b", "m", "k"]);
    assert!(f.is_indexed());
}

#[test]
fn test_skeleton_names() {
    assert_eq!(Skeleton::MapPairs.kernel_tag(), "MapPairsKernel");
    assert_eq!(Skeleton::from_name("MapOverlap2D"), Some(Skeleton::MapOverlap2D));
    assert_eq!(Skeleton::from_name("Zip"), None);
    assert!(Skeleton::MapPairsReduce.is_paired());
    assert!(!Skeleton::Map.is_paired());
}
