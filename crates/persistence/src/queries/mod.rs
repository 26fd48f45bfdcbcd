// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Query modules for the persistence layer.
//!
//! All read-only queries live here, organized by entity:
//!
//! - `reference` — centers, vaccines, children, staff, parents
//! - `inventory` — inventory batches
//! - `appointments` — appointments and the staff worklist
//! - `records` — vaccination records and dose history
//! - `audit` — audit events and per-appointment timelines
//!
//! Every query is generated in backend-specific monomorphic versions
//! (`_sqlite` and `_mysql` suffixes) by the `backend_fn!` macro; the
//! `Persistence` adapter in `lib.rs` dispatches on the active backend.

pub mod appointments;
pub mod audit;
pub mod inventory;
pub mod records;
pub mod reference;

pub use appointments::{
    get_appointment_mysql, get_appointment_sqlite, get_appointment_status_mysql,
    get_appointment_status_sqlite, list_appointments_for_center_date_mysql,
    list_appointments_for_center_date_sqlite,
};
pub use audit::{
    get_appointment_timeline_mysql, get_appointment_timeline_sqlite, get_audit_event_mysql,
    get_audit_event_sqlite, get_center_events_mysql, get_center_events_sqlite,
};
pub use inventory::{
    find_batch_by_number_mysql, find_batch_by_number_sqlite, get_batch_mysql, get_batch_sqlite,
    list_batches_for_center_mysql, list_batches_for_center_sqlite,
    list_batches_for_vaccine_center_mysql, list_batches_for_vaccine_center_sqlite,
};
pub use records::{
    count_records_for_child_vaccine_mysql, count_records_for_child_vaccine_sqlite,
    get_record_for_appointment_mysql, get_record_for_appointment_sqlite,
    list_records_for_child_mysql, list_records_for_child_sqlite,
};
pub use reference::{
    get_center_mysql, get_center_sqlite, get_child_mysql, get_child_sqlite, get_staff_mysql,
    get_staff_sqlite, get_vaccine_mysql, get_vaccine_sqlite, list_centers_mysql,
    list_centers_sqlite, list_vaccines_mysql, list_vaccines_sqlite, parent_exists_mysql,
    parent_exists_sqlite,
};
