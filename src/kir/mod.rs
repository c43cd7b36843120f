//! KIR — kernel generation for data-parallel device backends.
//!
//! There is no separate kernel IR: lowering works straight from skeleton
//! metadata. The pieces are:
//!
//! ```text
//! UserFunction ─┬→ proxy::ProxySet ───────┐
//!               ├→ lower::*::params ──────┼→ template::Template → kernel source
//!               └→ naming::KernelNames ───┘                      ↓
//!                                                  wrapper template → artifact
//! ```
//!
//! Each device worker runs a grid-stride loop over `[0, n)` and calls the
//! user function once per index.

pub mod lower;
pub mod proxy;
pub mod template;
