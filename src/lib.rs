/*
 * SPDX-FileCopyrightText: 2026 Inria
 * SPDX-FileCopyrightText: 2026 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]

pub mod dataflow;
pub mod driver;
pub mod math;
pub mod records;
pub mod snapshot;
pub mod sources;
pub mod stages;

pub mod prelude {
    pub use crate::dataflow::*;
    pub use crate::driver::*;
    pub use crate::math::*;
    pub use crate::records::*;
    pub use crate::snapshot::*;
    pub use crate::sources::*;
    pub use crate::stages::*;
}
