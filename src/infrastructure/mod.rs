// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer - Adapters implementing application ports.
//!
//! - [`onnx`]: ONNX Runtime detector adapter

pub mod onnx;
