// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Internal tracing that compiles away without the `log` feature.

#[cfg(feature = "log")]
macro_rules! flow_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! flow_trace {
    ($($arg:tt)*) => {{}};
}

pub(crate) use flow_trace;
