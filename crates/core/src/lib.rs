// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod command;
mod error;
mod plan;
mod selector;

#[cfg(test)]
mod tests;

pub use command::{Command, StatusAction};
pub use error::CoreError;
pub use plan::{
    TransitionResult, plan_cancellation, plan_check_in, plan_completion, plan_confirmation,
    plan_reschedule, plan_start_visit,
};
pub use selector::select_batch;
