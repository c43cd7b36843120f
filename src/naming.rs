//! Kernel and wrapper naming.
//!
//! `kernel = sanitize(base)_<Tag>_<uniqueName>_Varity_<v>_Harity_<h>`,
//! `wrapper = Wrapper_<kernel>`. Names are pure functions of their inputs, so
//! rebuilding the same program yields the same names.

use std::collections::HashMap;

use crate::error::GenError;
use crate::model::{Instantiation, Skeleton, SkeletonShape};

/// Prefix reserved for identifiers the generator introduces.
pub const RESERVED_PREFIX: &str = "skel_";

/// Locals and parameters every generated kernel declares.
const KERNEL_LOCALS: [&str; 8] = ["i", "n", "w", "gridSize", "output", "Vsize", "Hsize", "base"];

/// Whether `s` is a C identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Whether a user parameter name would clash with generated code.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with(RESERVED_PREFIX) || KERNEL_LOCALS.contains(&name)
}

/// Turn arbitrary text (a file name, a type spelling) into an identifier.
pub fn sanitize(text: &str) -> String {
    let mut out: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

pub fn kernel_name(base: &str, skeleton: Skeleton, unique_name: &str, shape: SkeletonShape) -> String {
    format!(
        "{}_{}_{}_Varity_{}_Harity_{}",
        sanitize(base),
        skeleton.kernel_tag(),
        unique_name,
        shape.varity,
        shape.harity
    )
}

pub fn wrapper_name(kernel_name: &str) -> String {
    format!("Wrapper_{}", kernel_name)
}

/// Names assigned to one instantiation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelNames {
    pub kernel: String,
    pub wrapper: String,
}

/// Whether the registry has seen an instantiation before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    New(KernelNames),
    Existing(KernelNames),
}

impl Registration {
    pub fn names(&self) -> &KernelNames {
        match self {
            Registration::New(names) | Registration::Existing(names) => names,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct InstanceKey {
    skeleton: Skeleton,
    function: String,
    shape: SkeletonShape,
}

impl InstanceKey {
    fn describe(&self) -> String {
        format!(
            "{} {} ({}x{})",
            self.skeleton, self.function, self.shape.varity, self.shape.harity
        )
    }
}

/// Hands out kernel names for one compilation run and refuses to give the
/// same name to two different instantiations.
#[derive(Clone, Debug)]
pub struct NameRegistry {
    base: String,
    assigned: HashMap<String, InstanceKey>,
}

impl NameRegistry {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
            assigned: HashMap::new(),
        }
    }

    pub fn register(&mut self, inst: &Instantiation) -> Result<Registration, GenError> {
        let key = InstanceKey {
            skeleton: inst.skeleton,
            function: inst.function.clone(),
            shape: inst.shape(),
        };
        let kernel = kernel_name(&self.base, key.skeleton, &key.function, key.shape);
        let names = KernelNames {
            wrapper: wrapper_name(&kernel),
            kernel: kernel.clone(),
        };

        match self.assigned.get(&kernel) {
            Some(existing) if *existing == key => Ok(Registration::Existing(names)),
            Some(existing) => Err(GenError::NameCollision {
                name: kernel,
                first: existing.describe(),
                second: key.describe(),
            }),
            None => {
                self.assigned.insert(kernel, key);
                Ok(Registration::New(names))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(function: &str, varity: usize, harity: usize) -> Instantiation {
        Instantiation {
            skeleton: Skeleton::MapPairs,
            function: function.to_string(),
            varity,
            harity,
        }
    }

    #[test]
    fn test_kernel_name_layout() {
        let name = kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(2, 3));
        assert_eq!(name, "prog_MapPairsKernel_f_Varity_2_Harity_3");
        assert_eq!(wrapper_name(&name), "Wrapper_prog_MapPairsKernel_f_Varity_2_Harity_3");
    }

    #[test]
    fn test_kernel_name_deterministic() {
        let a = kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(2, 3));
        let b = kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(2, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_names_differ_by_identity_and_shape() {
        let base = kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(1, 1));
        assert_ne!(base, kernel_name("prog", Skeleton::MapPairs, "g", SkeletonShape::new(1, 1)));
        assert_ne!(base, kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(2, 1)));
        assert_ne!(base, kernel_name("prog", Skeleton::MapPairs, "f", SkeletonShape::new(1, 2)));
        assert_ne!(base, kernel_name("prog", Skeleton::Map, "f", SkeletonShape::new(1, 1)));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("out/prog.cpp"), "out_prog_cpp");
        assert_eq!(sanitize("3d-demo"), "_3d_demo");
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("unsigned int"), "unsigned_int");
    }

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("a"));
        assert!(is_identifier("_x9"));
        assert!(!is_identifier("9x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_reserved() {
        assert!(is_reserved("skel_data_a"));
        assert!(is_reserved("Hsize"));
        assert!(is_reserved("i"));
        assert!(!is_reserved("index"));
        assert!(!is_reserved("skeleton"));
    }

    #[test]
    fn test_registry_same_instantiation_twice() {
        let mut reg = NameRegistry::new("prog");
        let first = reg.register(&pairs("f", 2, 3)).unwrap();
        let second = reg.register(&pairs("f", 2, 3)).unwrap();
        assert!(matches!(first, Registration::New(_)));
        assert!(matches!(second, Registration::Existing(_)));
        assert_eq!(first.names(), second.names());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_registry_detects_collision() {
        let mut reg = NameRegistry::new("prog");
        let names = reg.register(&pairs("f", 1, 1)).unwrap().names().clone();
        // Names are injective over well-formed metadata; plant a foreign
        // owner to exercise the guard.
        reg.assigned.insert(
            names.kernel.clone(),
            InstanceKey {
                skeleton: Skeleton::Map,
                function: "g".to_string(),
                shape: SkeletonShape::new(1, 1),
            },
        );
        match reg.register(&pairs("f", 1, 1)) {
            Err(GenError::NameCollision { name, first, second }) => {
                assert_eq!(name, names.kernel);
                assert_eq!(first, "Map g (1x1)");
                assert_eq!(second, "MapPairs f (1x1)");
            }
            other => panic!("expected collision, got {:?}", other),
        }
    }
}
