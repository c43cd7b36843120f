//! Kernel cache and launch dispatch.
//!
//! A `KernelCache` compiles its kernel for every discovered device the first
//! time it is needed. Concurrent first calls race safely: one caller builds,
//! the others wait for its result. A failed build is remembered and
//! reported on every later call until `teardown`.

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use super::signature::KernelSignature;
use crate::artifact::GeneratedArtifact;

/// Opaque device-memory handle, meaningful only to the device that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub u64);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScalarValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
}

/// One marshaled kernel argument.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KernelArg {
    Buffer(BufferHandle),
    Size(usize),
    Scalar(ScalarValue),
}

// ─── Device Trait ──────────────────────────────────────────────────

/// A compute device able to compile and launch kernels.
///
/// Backend crates implement this over their device SDK. Errors are plain
/// messages (build logs, driver status text); the cache wraps them with
/// the kernel and device names.
pub trait ComputeDevice: Send + Sync {
    /// Compiled kernel handle.
    type Kernel: Send + Sync;

    fn name(&self) -> &str;

    /// Compile `source` and look up the entry point `kernel_name`.
    fn build(&self, source: &str, kernel_name: &str) -> Result<Self::Kernel, String>;

    /// Enqueue one launch. Returns once the launch is queued; completion is
    /// the caller's business.
    fn enqueue(
        &self,
        kernel: &Self::Kernel,
        args: &[KernelArg],
        global_size: usize,
        local_size: usize,
    ) -> Result<(), String>;
}

// ─── Errors ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("building kernel '{kernel}' for device '{device}' failed:\n{log}")]
    Build {
        kernel: String,
        device: String,
        log: String,
    },

    #[error("kernel '{kernel}' has not been initialized")]
    NotInitialized { kernel: String },

    #[error("kernel '{kernel}': no device {device} ({count} discovered)")]
    UnknownDevice {
        kernel: String,
        device: usize,
        count: usize,
    },

    #[error("kernel '{kernel}': {reason}")]
    ArgumentMismatch { kernel: String, reason: String },

    #[error(
        "kernel '{kernel}': global size {global} must be a non-zero multiple of local size {local}"
    )]
    InvalidWorkSize {
        kernel: String,
        global: usize,
        local: usize,
    },

    #[error("launching kernel '{kernel}' on device '{device}' failed: {reason}")]
    Enqueue {
        kernel: String,
        device: String,
        reason: String,
    },
}

// ─── Launch Shape ──────────────────────────────────────────────────

/// The fixed trailing launch arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LaunchShape {
    /// Row width used by row/column indexing.
    pub w: usize,
    /// Number of output elements this launch covers.
    pub n: usize,
    pub vsize: usize,
    pub hsize: usize,
    /// Global offset of this launch's first element.
    pub base: usize,
}

impl LaunchShape {
    /// A single launch over the whole `vsize x hsize` cross product.
    pub fn pairs(vsize: usize, hsize: usize) -> Self {
        Self {
            w: hsize,
            n: vsize * hsize,
            vsize,
            hsize,
            base: 0,
        }
    }

    /// Trailer arguments in kernel parameter order.
    pub fn args(&self) -> [KernelArg; 5] {
        [
            KernelArg::Size(self.w),
            KernelArg::Size(self.n),
            KernelArg::Size(self.vsize),
            KernelArg::Size(self.hsize),
            KernelArg::Size(self.base),
        ]
    }
}

// ─── Kernel Cache ──────────────────────────────────────────────────

type KernelTable<K> = Result<HashMap<usize, K>, DispatchError>;

/// Per-kernel table of compiled kernels, one per device ordinal.
pub struct KernelCache<D: ComputeDevice> {
    kernel_name: String,
    source: String,
    signature: KernelSignature,
    devices: Vec<D>,
    table: OnceLock<KernelTable<D::Kernel>>,
}

impl<D: ComputeDevice> KernelCache<D> {
    pub fn new(
        kernel_name: impl Into<String>,
        source: impl Into<String>,
        signature: KernelSignature,
        devices: Vec<D>,
    ) -> Self {
        Self {
            kernel_name: kernel_name.into(),
            source: source.into(),
            signature,
            devices,
            table: OnceLock::new(),
        }
    }

    pub fn from_artifact(artifact: &GeneratedArtifact, devices: Vec<D>) -> Self {
        Self::new(
            artifact.kernel_name.clone(),
            artifact.kernel_source.clone(),
            artifact.signature.clone(),
            devices,
        )
    }

    pub fn kernel_name(&self) -> &str {
        &self.kernel_name
    }

    pub fn signature(&self) -> &KernelSignature {
        &self.signature
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Build the kernel for every device. Idempotent; only the first call
    /// compiles, and its outcome is shared with every caller.
    pub fn initialize(&self) -> Result<(), DispatchError> {
        self.table().map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.table.get(), Some(Ok(_)))
    }

    /// Drop the compiled kernels, or a remembered build failure. The next
    /// `initialize` builds again.
    pub fn teardown(&mut self) {
        if self.table.take().is_some() {
            log::debug!("{}: kernels released", self.kernel_name);
        }
    }

    /// The compiled kernel for `device`, without building it.
    pub fn kernel(&self, device: usize) -> Result<&D::Kernel, DispatchError> {
        match self.table.get() {
            Some(Ok(table)) => self.lookup(table, device),
            Some(Err(e)) => Err(e.clone()),
            None => Err(DispatchError::NotInitialized {
                kernel: self.kernel_name.clone(),
            }),
        }
    }

    /// Launch the kernel on `device`.
    ///
    /// `args` are the user arguments in signature order; the output buffer
    /// and the launch trailer are appended here. The call builds the kernel
    /// on first use and does not wait for the launch to finish.
    pub fn map(
        &self,
        device: usize,
        local_size: usize,
        global_size: usize,
        args: &[KernelArg],
        output: BufferHandle,
        launch: LaunchShape,
    ) -> Result<(), DispatchError> {
        if local_size == 0 || global_size == 0 || global_size % local_size != 0 {
            return Err(DispatchError::InvalidWorkSize {
                kernel: self.kernel_name.clone(),
                global: global_size,
                local: local_size,
            });
        }
        let target = self.devices.get(device).ok_or_else(|| self.unknown_device(device))?;

        let mut marshaled = Vec::with_capacity(args.len() + 6);
        marshaled.extend_from_slice(args);
        marshaled.push(KernelArg::Buffer(output));
        marshaled.extend(launch.args());
        self.signature
            .check(&marshaled)
            .map_err(|reason| DispatchError::ArgumentMismatch {
                kernel: self.kernel_name.clone(),
                reason,
            })?;

        let table = self.table()?;
        let kernel = self.lookup(table, device)?;
        log::debug!(
            "{}: launch on '{}' global={} local={} n={}",
            self.kernel_name,
            target.name(),
            global_size,
            local_size,
            launch.n
        );
        target
            .enqueue(kernel, &marshaled, global_size, local_size)
            .map_err(|reason| DispatchError::Enqueue {
                kernel: self.kernel_name.clone(),
                device: target.name().to_string(),
                reason,
            })
    }

    fn table(&self) -> Result<&HashMap<usize, D::Kernel>, DispatchError> {
        self.table
            .get_or_init(|| self.build_all())
            .as_ref()
            .map_err(Clone::clone)
    }

    fn build_all(&self) -> KernelTable<D::Kernel> {
        let mut table = HashMap::with_capacity(self.devices.len());
        for (ordinal, device) in self.devices.iter().enumerate() {
            log::debug!("{}: building for '{}'", self.kernel_name, device.name());
            let kernel = device
                .build(&self.source, &self.kernel_name)
                .map_err(|log| DispatchError::Build {
                    kernel: self.kernel_name.clone(),
                    device: device.name().to_string(),
                    log,
                })?;
            table.insert(ordinal, kernel);
        }
        Ok(table)
    }

    fn lookup<'a>(
        &self,
        table: &'a HashMap<usize, D::Kernel>,
        device: usize,
    ) -> Result<&'a D::Kernel, DispatchError> {
        table.get(&device).ok_or_else(|| self.unknown_device(device))
    }

    fn unknown_device(&self, device: usize) -> DispatchError {
        DispatchError::UnknownDevice {
            kernel: self.kernel_name.clone(),
            device,
            count: self.devices.len(),
        }
    }
}
