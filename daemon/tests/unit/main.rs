//! Unit test harness

mod test_schedule;
mod test_status;
mod test_update;
