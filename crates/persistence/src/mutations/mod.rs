// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend-agnostic mutation modules.
//!
//! This module contains all state-changing operations for the persistence
//! layer. Most mutations use Diesel DSL and are backend-agnostic, with
//! minimal use of backend-specific helpers (e.g., `last_insert_rowid()`
//! for `SQLite`).
//!
//! ## Module Organization
//!
//! - `audit` — Audit event persistence
//! - `reference` — Reference entity mutations (parents, centers, vaccines,
//!   children, staff)
//! - `inventory` — Inventory batch receipt and correction
//! - `appointments` — Appointment creation and the transactional
//!   transition orchestrators
//!
//! ## Backend-Specific Code
//!
//! Backend-specific helpers (e.g., `get_last_insert_rowid()`) are imported
//! from the `backend` module. All other code uses Diesel DSL exclusively.

pub mod appointments;
pub mod audit;
pub mod inventory;
pub mod reference;

// Re-export backend-specific mutation functions used by lib.rs
pub use appointments::{
    PersistTransitionResult, apply_transition_mysql, apply_transition_sqlite,
    complete_appointment_mysql, complete_appointment_sqlite, create_appointment_mysql,
    create_appointment_sqlite, schedule_appointment_mysql, schedule_appointment_sqlite,
};
pub use audit::{persist_audit_event_mysql, persist_audit_event_sqlite};
pub use inventory::{
    insert_batch_mysql, insert_batch_sqlite, record_batch_correction_mysql,
    record_batch_correction_sqlite, record_batch_receipt_mysql, record_batch_receipt_sqlite,
    update_batch_mysql, update_batch_sqlite,
};
pub use reference::{
    create_center_mysql, create_center_sqlite, create_child_mysql, create_child_sqlite,
    create_parent_mysql, create_parent_sqlite, create_staff_mysql, create_staff_sqlite,
    create_vaccine_mysql, create_vaccine_sqlite, set_vaccine_active_mysql,
    set_vaccine_active_sqlite,
};
