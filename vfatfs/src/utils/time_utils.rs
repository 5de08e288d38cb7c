// SPDX-License-Identifier: MIT

use time::{Date, Month, PrimitiveDateTime, Time};

/// Decodes a FAT date word: bits 15-9 years since 1980, 8-5 month, 4-0 day.
pub fn fat_date(date: u16) -> Option<Date> {
    if date == 0 {
        return None;
    }
    let year = 1980 + (date >> 9) as i32;
    let month = Month::try_from(((date >> 5) & 0x0F) as u8).ok()?;
    let day = (date & 0x1F) as u8;
    Date::from_calendar_date(year, month, day).ok()
}

/// Decodes a FAT time word (2-second resolution) plus the optional
/// creation-time tenths byte (10 ms units, 0..=199).
pub fn fat_time(time: u16, tenths: u8) -> Option<Time> {
    let hour = (time >> 11) as u8;
    let minute = ((time >> 5) & 0x3F) as u8;
    let second = ((time & 0x1F) * 2) as u8;

    let tenths = if tenths < 200 { tenths } else { 0 };
    let second = second + tenths / 100;
    let millis = (tenths % 100) as u16 * 10;

    Time::from_hms_milli(hour, minute, second, millis).ok()
}

/// Combined date and time; `None` when either part is invalid.
pub fn fat_datetime(date: u16, time: u16, tenths: u8) -> Option<PrimitiveDateTime> {
    Some(PrimitiveDateTime::new(fat_date(date)?, fat_time(time, tenths)?))
}

/// Encodes a date/time into FAT (date, time) words. Years are clamped to the
/// representable 1980..=2107 range.
pub fn to_fat_datetime(ts: PrimitiveDateTime) -> (u16, u16) {
    let year = ts.year().clamp(1980, 2107);
    let date = (((year - 1980) as u16) << 9) | ((ts.month() as u16) << 5) | ts.day() as u16;
    let time = ((ts.hour() as u16) << 11) | ((ts.minute() as u16) << 5) | (ts.second() as u16 / 2);
    (date, time)
}
