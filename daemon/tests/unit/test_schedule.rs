//! Schedule parsing unit tests

use stackward::schedule::{Schedule, DEFAULT_SCHEDULE, DEFAULT_SCHEDULE_SECS};

#[test]
fn test_valid_schedule_weighted_sum() {
    assert_eq!(Schedule::parse("00:02:30:00").as_secs(), 2 * 3_600 + 30 * 60);
    assert_eq!(Schedule::parse("00:00:00:45").as_secs(), 45);
    assert_eq!(Schedule::parse("03:00:00:00").as_secs(), 3 * 86_400);
}

#[test]
fn test_default_schedule_constant() {
    assert_eq!(Schedule::parse(DEFAULT_SCHEDULE).as_secs(), DEFAULT_SCHEDULE_SECS);
    assert_eq!(Schedule::default().as_secs(), DEFAULT_SCHEDULE_SECS);
}

#[test]
fn test_malformed_schedules_fall_back_as_a_whole() {
    // Wrong part count
    assert_eq!(Schedule::parse("01:00:00").as_secs(), DEFAULT_SCHEDULE_SECS);

    // Bound violation in a later component does not keep the valid parts
    assert_eq!(Schedule::parse("00:00:00:61").as_secs(), DEFAULT_SCHEDULE_SECS);

    // Negative component
    assert_eq!(Schedule::parse("-1:00:00:00").as_secs(), DEFAULT_SCHEDULE_SECS);

    // Non-numeric component
    assert_eq!(Schedule::parse("one:00:00:00").as_secs(), DEFAULT_SCHEDULE_SECS);
}
