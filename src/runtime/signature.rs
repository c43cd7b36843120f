//! Host-side argument layout of a generated kernel.

use std::fmt;

use super::dispatch::KernelArg;

/// One host argument position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgSlot {
    /// Opaque device-memory handle.
    Buffer { name: String, elem_type: String },
    /// A shape field (size, row count, ...) passed as `size_t`.
    Size { name: String },
    /// A user scalar passed by value.
    Scalar { name: String, ty: String },
}

impl ArgSlot {
    pub fn name(&self) -> &str {
        match self {
            ArgSlot::Buffer { name, .. } | ArgSlot::Size { name } | ArgSlot::Scalar { name, .. } => {
                name
            }
        }
    }

    fn accepts(&self, arg: &KernelArg) -> bool {
        matches!(
            (self, arg),
            (ArgSlot::Buffer { .. }, KernelArg::Buffer(_))
                | (ArgSlot::Size { .. }, KernelArg::Size(_))
                | (ArgSlot::Scalar { .. }, KernelArg::Scalar(_))
        )
    }
}

impl fmt::Display for ArgSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSlot::Buffer { name, elem_type } => write!(f, "buffer<{}> {}", elem_type, name),
            ArgSlot::Size { name } => write!(f, "size_t {}", name),
            ArgSlot::Scalar { name, ty } => write!(f, "{} {}", ty, name),
        }
    }
}

/// Names of the fixed launch arguments every MapPairs kernel ends with,
/// after the output buffer.
pub const LAUNCH_TRAILER: [&str; 5] = ["w", "n", "Vsize", "Hsize", "base"];

/// Ordered host arguments of one kernel: the user-derived slots followed by
/// the output buffer and the launch trailer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KernelSignature {
    slots: Vec<ArgSlot>,
    user_len: usize,
}

impl KernelSignature {
    pub fn new(user_slots: Vec<ArgSlot>, result_type: &str) -> Self {
        let user_len = user_slots.len();
        let mut slots = user_slots;
        slots.push(ArgSlot::Buffer {
            name: "output".to_string(),
            elem_type: result_type.to_string(),
        });
        slots.extend(LAUNCH_TRAILER.iter().map(|name| ArgSlot::Size {
            name: name.to_string(),
        }));
        Self { slots, user_len }
    }

    pub fn slots(&self) -> &[ArgSlot] {
        &self.slots
    }

    /// Slots the caller supplies before the output buffer.
    pub fn user_slots(&self) -> &[ArgSlot] {
        &self.slots[..self.user_len]
    }

    /// Check a fully marshaled argument list against the signature.
    pub fn check(&self, args: &[KernelArg]) -> Result<(), String> {
        if args.len() != self.slots.len() {
            return Err(format!(
                "expected {} arguments, got {}",
                self.slots.len(),
                args.len()
            ));
        }
        for (pos, (slot, arg)) in self.slots.iter().zip(args).enumerate() {
            if !slot.accepts(arg) {
                return Err(format!("argument {} ({}) cannot take {:?}", pos, slot, arg));
            }
        }
        Ok(())
    }
}
