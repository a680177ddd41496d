//! MS-DOS date and time decoding.
//!
//! Local and central headers carry last-modified timestamps as packed
//! 16-bit MS-DOS date and time words. Decoding is lenient about the raw
//! values a record may carry (tests deliberately write nonsense), so every
//! conversion returns `Option` instead of failing the record.

use time::{Date, Month, PrimitiveDateTime, Time};

/// Decode a packed MS-DOS date word (bits 15-9 year since 1980, 8-5 month,
/// 4-0 day of month).
pub fn dos_date(date: u16) -> Option<Date> {
    let year = ((date >> 9) & 0x7F) as i32 + 1980;
    let month = Month::try_from(((date >> 5) & 0xF) as u8).ok()?;
    let day = (date & 0x1F) as u8;
    Date::from_calendar_date(year, month, day).ok()
}

/// Decode a packed MS-DOS time word (bits 15-11 hours, 10-5 minutes,
/// 4-0 two-second units).
pub fn dos_time(time: u16) -> Option<Time> {
    let hours = ((time >> 11) & 0x1F) as u8;
    let minutes = ((time >> 5) & 0x3F) as u8;
    let seconds = 2 * (time & 0x1F) as u8;
    Time::from_hms(hours, minutes, seconds).ok()
}

/// Combine the two packed words into a date-time, if both are valid.
pub fn dos_date_time(date: u16, time: u16) -> Option<PrimitiveDateTime> {
    Some(PrimitiveDateTime::new(dos_date(date)?, dos_time(time)?))
}

/// Pack a calendar date into the MS-DOS date word. Years before 1980 clamp
/// to 1980.
pub fn to_dos_date(date: Date) -> u16 {
    let year = (date.year().clamp(1980, 2107) - 1980) as u16;
    (year << 9) | ((date.month() as u16) << 5) | date.day() as u16
}

/// Pack a wall-clock time into the MS-DOS time word. Seconds round down to
/// two-second resolution.
pub fn to_dos_time(time: Time) -> u16 {
    ((time.hour() as u16) << 11) | ((time.minute() as u16) << 5) | (time.second() as u16 / 2)
}

#[cfg(test)]
mod test {
    use super::*;
    use time::Month;

    #[test]
    fn decodes_packed_date_and_time() {
        // 2020-01-01 13:42:34
        let date = dos_date(0x5021).unwrap();
        assert_eq!(date.year(), 2020);
        assert_eq!(date.month(), Month::January);
        assert_eq!(date.day(), 1);

        let time = dos_time(0x6D51).unwrap();
        assert_eq!((time.hour(), time.minute(), time.second()), (13, 42, 34));
    }

    #[test]
    fn rejects_zero_date() {
        // Month 0 is not a calendar month
        assert!(dos_date(0).is_none());
    }

    #[test]
    fn packs_round_trip() {
        let date = Date::from_calendar_date(1999, Month::December, 31).unwrap();
        let time = Time::from_hms(23, 59, 58).unwrap();
        assert_eq!(dos_date(to_dos_date(date)), Some(date));
        assert_eq!(dos_time(to_dos_time(time)), Some(time));
    }
}
