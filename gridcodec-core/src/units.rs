//! Unit conversions between the pixel-based model and the file's units,
//! and date serial numbers.
//!
//! All conversions assume 96 DPI and the Calibri 11 default font
//! (maximum digit width 7 px, 5 px cell padding).

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// EMUs per pixel at 96 DPI.
pub const EMU_PER_PIXEL: i64 = 9525;
/// Default row height in points.
pub const DEFAULT_ROW_HEIGHT_PT: f64 = 15.0;
/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT_PX: u32 = 20;
/// Default column width in pixels (8.43 characters).
pub const DEFAULT_COLUMN_WIDTH_PX: u32 = 64;

const MAX_DIGIT_WIDTH_PX: f64 = 7.0;
const COLUMN_PADDING_PX: f64 = 5.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub fn points_to_pixels(points: f64) -> u32 {
    if points <= 0.0 {
        return 0;
    }
    (points * 4.0 / 3.0).round() as u32
}

pub fn pixels_to_points(pixels: u32) -> f64 {
    pixels as f64 * 0.75
}

pub fn emu_to_pixels(emu: i64) -> i64 {
    (emu as f64 / EMU_PER_PIXEL as f64).round() as i64
}

pub fn pixels_to_emu(pixels: i64) -> i64 {
    pixels * EMU_PER_PIXEL
}

/// Column width in characters, truncated to 1/256 of a character.
pub fn pixels_to_column_width(pixels: u32) -> f64 {
    if pixels as f64 <= COLUMN_PADDING_PX {
        return 0.0;
    }
    let chars = (pixels as f64 - COLUMN_PADDING_PX) / MAX_DIGIT_WIDTH_PX;
    (chars * 256.0).trunc() / 256.0
}

pub fn column_width_to_pixels(width: f64) -> u32 {
    if width <= 0.0 {
        return 0;
    }
    (width * MAX_DIGIT_WIDTH_PX + COLUMN_PADDING_PX).round() as u32
}

fn epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 31)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Convert a date-time to a serial day count.
///
/// Serial 1 is 1900-01-01. Serial 60 is the nonexistent 1900-02-29, so every
/// date from 1900-03-01 onward is shifted up by one day.
pub fn datetime_to_serial(value: NaiveDateTime) -> f64 {
    let days = (value.date() - epoch().date()).num_days();
    let days = if days >= 60 { days + 1 } else { days };
    let seconds = value.time().num_seconds_from_midnight() as f64
        + value.time().nanosecond() as f64 / 1e9;
    days as f64 + seconds / SECONDS_PER_DAY
}

/// Convert a serial day count back to a date-time; `None` when out of range.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let whole = serial.floor() as i64;
    let days = match whole {
        n if n >= 61 => n - 1,
        // the phantom 1900-02-29 reads as the last real day of February
        60 => 59,
        n => n,
    };
    let millis = ((serial - serial.floor()) * SECONDS_PER_DAY * 1000.0).round() as i64;
    Some(epoch() + Duration::days(days) + Duration::milliseconds(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_serial_epoch_and_leap_quirk() {
        assert_eq!(datetime_to_serial(dt(1900, 1, 1, 0, 0, 0)), 1.0);
        assert_eq!(datetime_to_serial(dt(1900, 2, 28, 0, 0, 0)), 59.0);
        assert_eq!(datetime_to_serial(dt(1900, 3, 1, 0, 0, 0)), 61.0);
        assert_eq!(datetime_to_serial(dt(2024, 1, 15, 0, 0, 0)), 45306.0);
        assert_eq!(datetime_to_serial(dt(2024, 1, 15, 12, 0, 0)), 45306.5);
    }

    #[test]
    fn test_serial_roundtrip() {
        for value in [
            dt(1900, 1, 1, 0, 0, 0),
            dt(1900, 2, 28, 23, 59, 59),
            dt(1900, 3, 1, 0, 0, 0),
            dt(1999, 12, 31, 6, 30, 0),
            dt(2024, 2, 29, 18, 45, 15),
        ] {
            assert_eq!(serial_to_datetime(datetime_to_serial(value)), Some(value));
        }
        assert_eq!(serial_to_datetime(60.0), Some(dt(1900, 2, 28, 0, 0, 0)));
        assert_eq!(serial_to_datetime(-1.0), None);
        assert_eq!(serial_to_datetime(f64::NAN), None);
    }

    #[test]
    fn test_column_width_roundtrip() {
        assert_eq!(pixels_to_column_width(64), 2157.0 / 256.0);
        for px in 6..500 {
            assert_eq!(column_width_to_pixels(pixels_to_column_width(px)), px);
        }
        assert_eq!(pixels_to_column_width(3), 0.0);
        assert_eq!(column_width_to_pixels(0.0), 0);
    }

    #[test]
    fn test_points_and_emu() {
        assert_eq!(points_to_pixels(15.0), 20);
        assert_eq!(pixels_to_points(20), 15.0);
        for px in 0..400 {
            assert_eq!(points_to_pixels(pixels_to_points(px)), px);
        }
        assert_eq!(pixels_to_emu(10), 95_250);
        assert_eq!(emu_to_pixels(95_250), 10);
    }
}
