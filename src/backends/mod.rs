// SPDX-License-Identifier: GPL-3.0-only

//! Sensor backends
//!
//! - [`sensor`]: depth+color frame source abstraction, registration and the
//!   processing loop thread

pub mod sensor;
