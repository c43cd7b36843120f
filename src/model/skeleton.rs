use std::fmt;

use serde::{Deserialize, Serialize};

/// A backend-agnostic parallel pattern a user function is instantiated with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Skeleton {
    Map,
    Reduce1D,
    Reduce2D,
    MapReduce,
    Scan,
    MapOverlap1D,
    MapOverlap2D,
    MapOverlap3D,
    MapOverlap4D,
    MapPairs,
    MapPairsReduce,
    Call,
}

impl Skeleton {
    pub const ALL: [Skeleton; 12] = [
        Skeleton::Map,
        Skeleton::Reduce1D,
        Skeleton::Reduce2D,
        Skeleton::MapReduce,
        Skeleton::Scan,
        Skeleton::MapOverlap1D,
        Skeleton::MapOverlap2D,
        Skeleton::MapOverlap3D,
        Skeleton::MapOverlap4D,
        Skeleton::MapPairs,
        Skeleton::MapPairsReduce,
        Skeleton::Call,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Skeleton::Map => "Map",
            Skeleton::Reduce1D => "Reduce1D",
            Skeleton::Reduce2D => "Reduce2D",
            Skeleton::MapReduce => "MapReduce",
            Skeleton::Scan => "Scan",
            Skeleton::MapOverlap1D => "MapOverlap1D",
            Skeleton::MapOverlap2D => "MapOverlap2D",
            Skeleton::MapOverlap3D => "MapOverlap3D",
            Skeleton::MapOverlap4D => "MapOverlap4D",
            Skeleton::MapPairs => "MapPairs",
            Skeleton::MapPairsReduce => "MapPairsReduce",
            Skeleton::Call => "Call",
        }
    }

    /// Tag embedded in kernel names, e.g. `MapPairsKernel`.
    pub fn kernel_tag(self) -> String {
        format!("{}Kernel", self.name())
    }

    /// Look up a skeleton by its display name.
    pub fn from_name(name: &str) -> Option<Skeleton> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Whether instantiations pair a vertical and a horizontal container set.
    pub fn is_paired(self) -> bool {
        matches!(self, Skeleton::MapPairs | Skeleton::MapPairsReduce)
    }
}

impl fmt::Display for Skeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
