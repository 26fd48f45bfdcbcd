// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use time::macros::{date, time};
use vax_audit::{Actor, Cause};
use vax_domain::{Appointment, BatchNumber, Center, InventoryBatch, Vaccine};

pub fn create_test_actor() -> Actor {
    Actor::with_staff(
        String::from("staff-4"),
        String::from("staff"),
        4,
        String::from("Nurse Devi"),
    )
}

pub fn create_test_cause() -> Cause {
    Cause::new(String::from("req-456"), String::from("Staff request"))
}

pub fn create_test_vaccine() -> Vaccine {
    Vaccine::with_id(1, String::from("BCG"), 1, true)
}

pub fn create_test_center() -> Center {
    Center::with_id(3, String::from("Ward 12 PHC"))
}

/// An appointment scheduled for 2026-03-10 at center 3, vaccine 1.
pub fn create_test_appointment() -> Appointment {
    let mut appointment: Appointment = Appointment::new(
        10,
        20,
        1,
        3,
        date!(2026 - 03 - 10),
        time!(09:30),
        String::from("$2b$12$test-hash"),
    );
    appointment.appointment_id = Some(17);
    appointment
}

/// A batch with `consumed` doses already drawn from `quantity` 10-dose vials.
pub fn create_test_batch(batch_id: i64, number: &str, quantity: u32, consumed: u32) -> InventoryBatch {
    let mut batch: InventoryBatch = InventoryBatch::receive(
        1,
        3,
        BatchNumber::new(number),
        10,
        quantity,
        date!(2026 - 09 - 30),
        date!(2025 - 11 - 01),
        date!(2026 - 01 - 05),
    )
    .unwrap();
    batch.batch_id = Some(batch_id);
    batch.stock = vax_domain::StockLevel::derive(quantity, 10, consumed).unwrap();
    batch
}
