//! Host runtime for generated kernels.
//!
//! The generator emits C++ wrappers for the `skel::backend` runtime. Rust
//! hosts use the same contract through this module: a device implements
//! `ComputeDevice`, and a `KernelCache` built from a `GeneratedArtifact`
//! compiles the kernel once for every device and dispatches launches.
//!
//! No device SDK is linked here. Backends live in separate crates and plug
//! in through the trait; `cpu` is an in-process reference executor that
//! follows the same grid-stride loop as the device kernel.

pub mod cpu;
pub mod dispatch;
pub mod grid;
pub mod signature;


pub use dispatch::{
    BufferHandle, ComputeDevice, DispatchError, KernelArg, KernelCache, LaunchShape, ScalarValue,
};
pub use grid::{GridStride, Index1, Index2};
pub use signature::{ArgSlot, KernelSignature, LAUNCH_TRAILER};
