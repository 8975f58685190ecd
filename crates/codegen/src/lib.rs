#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(test, allow(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

mod error;
pub use error::CodegenError;

pub mod ir;
pub use ir::{ClassUnit, Instruction, IrBuilder, IrType, Method, Operand, VarTable};

pub mod transform;
pub use transform::{ConstantFolder, ConstantPropagator, OptStats, optimize};

pub mod lower;
pub use lower::{GenContext, Lowerer};

pub mod analysis;
pub use analysis::{InterferenceGraph, LiveSet, Liveness};

mod regalloc;
pub use regalloc::{AllocationReport, RegisterAllocator};

pub mod jasmin;
pub use jasmin::JasminEmitter;

mod pipeline;
pub use pipeline::{Artifacts, compile, compile_until};
