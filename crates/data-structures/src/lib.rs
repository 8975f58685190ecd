#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod index;
pub mod map;
pub mod sync;

pub use smallvec;
