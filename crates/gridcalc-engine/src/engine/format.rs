//! Display formatting for cell values.
//!
//! Dates and times use spreadsheet serial numbers: the integer part counts
//! days from 1899-12-30 (serial 0), the fractional part is the time of day.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellType};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateStyle {
    /// 03/15/2023
    MmDdYyyy,
    /// 15/03/2023
    DdMmYyyy,
    /// 2023-03-15
    YyyyMmDd,
    /// 03/15/23
    Short,
    /// Mar 15, 2023
    MonDdYyyy,
    /// 15 Mar 2023
    DdMonYyyy,
    /// 2023 Mar 15
    YyyyMonDd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeStyle {
    /// 2:30 PM
    Hour12,
    /// 14:30
    Hour24,
    /// 14:30:05
    Seconds,
    /// 2:30:05 PM
    Hour12Seconds,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateTimeStyle {
    /// 03/15/2023 14:30
    Short,
    /// Mar 15, 2023 2:30:05 PM
    Long,
    /// 2023-03-15T14:30:05
    Iso,
}

/// How a numeric value is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumberFormat {
    #[default]
    General,
    Number,
    Percentage,
    Currency,
    Date(DateStyle),
    Time(TimeStyle),
    DateTime(DateTimeStyle),
}

/// Order used when cycling a cell through date/time formats.
pub const DATETIME_CYCLE: [NumberFormat; 13] = [
    NumberFormat::Date(DateStyle::MmDdYyyy),
    NumberFormat::Date(DateStyle::DdMmYyyy),
    NumberFormat::Date(DateStyle::YyyyMmDd),
    NumberFormat::Date(DateStyle::Short),
    NumberFormat::Date(DateStyle::MonDdYyyy),
    NumberFormat::Date(DateStyle::DdMonYyyy),
    NumberFormat::Time(TimeStyle::Hour12),
    NumberFormat::Time(TimeStyle::Hour24),
    NumberFormat::Time(TimeStyle::Seconds),
    NumberFormat::Time(TimeStyle::Hour12Seconds),
    NumberFormat::DateTime(DateTimeStyle::Short),
    NumberFormat::DateTime(DateTimeStyle::Long),
    NumberFormat::DateTime(DateTimeStyle::Iso),
];

impl NumberFormat {
    /// Next format in the date/time cycle; anything outside the cycle starts it.
    pub fn next_in_cycle(self) -> NumberFormat {
        let next = DATETIME_CYCLE
            .iter()
            .position(|f| *f == self)
            .map_or(0, |i| (i + 1) % DATETIME_CYCLE.len());
        DATETIME_CYCLE[next]
    }

    /// Cycle MM/DD/YYYY -> DD/MM/YYYY -> YYYY-MM-DD; non-date formats start at MM/DD/YYYY.
    pub fn next_date_style(self) -> NumberFormat {
        let style = match self {
            NumberFormat::Date(DateStyle::MmDdYyyy) => DateStyle::DdMmYyyy,
            NumberFormat::Date(DateStyle::DdMmYyyy) => DateStyle::YyyyMmDd,
            _ => DateStyle::MmDdYyyy,
        };
        NumberFormat::Date(style)
    }

    pub fn description(&self) -> &'static str {
        match self {
            NumberFormat::General => "general",
            NumberFormat::Number => "number",
            NumberFormat::Percentage => "percentage",
            NumberFormat::Currency => "currency",
            NumberFormat::Date(DateStyle::MmDdYyyy) => "date MM/DD/YYYY",
            NumberFormat::Date(DateStyle::DdMmYyyy) => "date DD/MM/YYYY",
            NumberFormat::Date(DateStyle::YyyyMmDd) => "date YYYY-MM-DD",
            NumberFormat::Date(DateStyle::Short) => "date MM/DD/YY",
            NumberFormat::Date(DateStyle::MonDdYyyy) => "date Mon DD, YYYY",
            NumberFormat::Date(DateStyle::DdMonYyyy) => "date DD Mon YYYY",
            NumberFormat::Date(DateStyle::YyyyMonDd) => "date YYYY Mon DD",
            NumberFormat::Time(TimeStyle::Hour12) => "time 12-hour",
            NumberFormat::Time(TimeStyle::Hour24) => "time 24-hour",
            NumberFormat::Time(TimeStyle::Seconds) => "time with seconds",
            NumberFormat::Time(TimeStyle::Hour12Seconds) => "time 12-hour with seconds",
            NumberFormat::DateTime(DateTimeStyle::Short) => "datetime short",
            NumberFormat::DateTime(DateTimeStyle::Long) => "datetime long",
            NumberFormat::DateTime(DateTimeStyle::Iso) => "datetime ISO 8601",
        }
    }
}

/// Render a cell according to its contents and format.
pub fn format_cell(cell: &Cell) -> String {
    match &cell.contents {
        CellType::Empty => String::new(),
        CellType::Text(s) => s.clone(),
        CellType::Number(n) => format_value(*n, cell.format, cell.precision),
        CellType::Formula { cached, .. } => {
            if let Some(err) = cached.error {
                err.to_string()
            } else if let Some(text) = &cached.text {
                text.clone()
            } else {
                format_value(cached.value, cell.format, cell.precision)
            }
        }
        CellType::Error(err) => err.to_string(),
    }
}

/// Render a number with the given format and precision.
pub fn format_value(n: f64, format: NumberFormat, precision: usize) -> String {
    if let Some(special) = non_finite(n) {
        return special;
    }
    match format {
        NumberFormat::General | NumberFormat::Number => format_number(n, precision),
        NumberFormat::Percentage => format!("{:.*}%", precision, n * 100.0),
        NumberFormat::Currency => money_string(n, "$", 2),
        NumberFormat::Date(style) => {
            format_date(n, style).unwrap_or_else(|| format_number(n, precision))
        }
        NumberFormat::Time(style) => format_time(n, style),
        NumberFormat::DateTime(style) => {
            format_datetime(n, style).unwrap_or_else(|| format_number(n, precision))
        }
    }
}

fn non_finite(n: f64) -> Option<String> {
    if n.is_nan() {
        Some("#NAN!".to_string())
    } else if n.is_infinite() {
        Some("#INF!".to_string())
    } else {
        None
    }
}

/// Fixed precision with trailing zeros (and a dangling '.') stripped.
pub fn format_number(n: f64, precision: usize) -> String {
    if let Some(special) = non_finite(n) {
        return special;
    }
    let mut s = format!("{:.*}", precision, n);
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.').len();
        s.truncate(trimmed);
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

fn money_string(n: f64, symbol: &str, decimals: usize) -> String {
    let sign = if n < 0.0 { "-" } else { "" };
    format!("{}{}{:.*}", sign, symbol, decimals, n.abs())
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
}

fn serial_to_date(days: i64) -> Option<NaiveDate> {
    let days = u64::try_from(days).ok()?;
    epoch().checked_add_days(Days::new(days))
}

fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let total_seconds = (serial * 86_400.0).round();
    if !(0.0..=i64::MAX as f64).contains(&total_seconds) {
        return None;
    }
    let total_seconds = total_seconds as i64;
    let date = serial_to_date(total_seconds.div_euclid(86_400))?;
    let secs = total_seconds.rem_euclid(86_400) as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0)?;
    Some(date.and_time(time))
}

fn date_pattern(style: DateStyle) -> &'static str {
    match style {
        DateStyle::MmDdYyyy => "%m/%d/%Y",
        DateStyle::DdMmYyyy => "%d/%m/%Y",
        DateStyle::YyyyMmDd => "%Y-%m-%d",
        DateStyle::Short => "%m/%d/%y",
        DateStyle::MonDdYyyy => "%b %d, %Y",
        DateStyle::DdMonYyyy => "%d %b %Y",
        DateStyle::YyyyMonDd => "%Y %b %d",
    }
}

fn time_pattern(style: TimeStyle) -> &'static str {
    match style {
        TimeStyle::Hour12 => "%-I:%M %p",
        TimeStyle::Hour24 => "%H:%M",
        TimeStyle::Seconds => "%H:%M:%S",
        TimeStyle::Hour12Seconds => "%-I:%M:%S %p",
    }
}

fn format_date(serial: f64, style: DateStyle) -> Option<String> {
    if !(0.0..=i64::MAX as f64).contains(&serial) {
        return None;
    }
    let date = serial_to_date(serial.floor() as i64)?;
    Some(date.format(date_pattern(style)).to_string())
}

/// Only the fractional day matters; negative serials wrap around midnight.
fn format_time(serial: f64, style: TimeStyle) -> String {
    let secs = ((serial.rem_euclid(1.0) * 86_400.0).round() as u32) % 86_400;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or_default();
    time.format(time_pattern(style)).to_string()
}

fn format_datetime(serial: f64, style: DateTimeStyle) -> Option<String> {
    let dt = serial_to_datetime(serial)?;
    let pattern = match style {
        DateTimeStyle::Short => "%m/%d/%Y %H:%M",
        DateTimeStyle::Long => "%b %d, %Y %-I:%M:%S %p",
        DateTimeStyle::Iso => "%Y-%m-%dT%H:%M:%S",
    };
    Some(dt.format(pattern).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CellError, FormulaResult};

    #[test]
    fn test_general_strips_trailing_zeros() {
        assert_eq!(format_number(14.0, 2), "14");
        assert_eq!(format_number(0.75, 2), "0.75");
        assert_eq!(format_number(2.5, 2), "2.5");
        assert_eq!(format_number(1.23456, 2), "1.23");
        assert_eq!(format_number(-0.001, 2), "0");
        assert_eq!(format_number(f64::NAN, 2), "#NAN!");
        assert_eq!(format_number(f64::NEG_INFINITY, 2), "#INF!");
    }

    #[test]
    fn test_percentage_and_currency() {
        assert_eq!(format_value(0.1234, NumberFormat::Percentage, 2), "12.34%");
        assert_eq!(format_value(0.5, NumberFormat::Percentage, 0), "50%");
        assert_eq!(format_value(1234.56, NumberFormat::Currency, 2), "$1234.56");
        assert_eq!(format_value(-3.5, NumberFormat::Currency, 0), "-$3.50");
    }

    #[test]
    fn test_date_styles_from_serial() {
        let serial = 45000.0; // 2023-03-15
        let cases = [
            (DateStyle::MmDdYyyy, "03/15/2023"),
            (DateStyle::DdMmYyyy, "15/03/2023"),
            (DateStyle::YyyyMmDd, "2023-03-15"),
            (DateStyle::Short, "03/15/23"),
            (DateStyle::MonDdYyyy, "Mar 15, 2023"),
            (DateStyle::DdMonYyyy, "15 Mar 2023"),
            (DateStyle::YyyyMonDd, "2023 Mar 15"),
        ];
        for (style, expected) in cases {
            assert_eq!(format_value(serial, NumberFormat::Date(style), 2), expected);
        }
        assert_eq!(
            format_value(0.0, NumberFormat::Date(DateStyle::YyyyMmDd), 2),
            "1899-12-30"
        );
    }

    #[test]
    fn test_negative_date_serial_falls_back_to_number() {
        assert_eq!(
            format_value(-3.0, NumberFormat::Date(DateStyle::MmDdYyyy), 2),
            "-3"
        );
    }

    #[test]
    fn test_time_styles() {
        assert_eq!(format_value(0.5, NumberFormat::Time(TimeStyle::Hour12), 2), "12:00 PM");
        assert_eq!(format_value(0.75, NumberFormat::Time(TimeStyle::Hour24), 2), "18:00");
        assert_eq!(
            format_value(0.0, NumberFormat::Time(TimeStyle::Hour12Seconds), 2),
            "12:00:00 AM"
        );
        // 1 second past 06:00
        let serial = 0.25 + 1.0 / 86_400.0;
        assert_eq!(format_value(serial, NumberFormat::Time(TimeStyle::Seconds), 2), "06:00:01");
    }

    #[test]
    fn test_datetime_styles() {
        let serial = 45000.5;
        assert_eq!(
            format_value(serial, NumberFormat::DateTime(DateTimeStyle::Short), 2),
            "03/15/2023 12:00"
        );
        assert_eq!(
            format_value(serial, NumberFormat::DateTime(DateTimeStyle::Long), 2),
            "Mar 15, 2023 12:00:00 PM"
        );
        assert_eq!(
            format_value(serial, NumberFormat::DateTime(DateTimeStyle::Iso), 2),
            "2023-03-15T12:00:00"
        );
    }

    #[test]
    fn test_cycle_wraps_and_starts_from_general() {
        assert_eq!(
            NumberFormat::General.next_in_cycle(),
            NumberFormat::Date(DateStyle::MmDdYyyy)
        );
        assert_eq!(
            NumberFormat::DateTime(DateTimeStyle::Iso).next_in_cycle(),
            NumberFormat::Date(DateStyle::MmDdYyyy)
        );
        assert_eq!(
            NumberFormat::Date(DateStyle::DdMonYyyy).next_in_cycle(),
            NumberFormat::Time(TimeStyle::Hour12)
        );
        assert_eq!(
            NumberFormat::Date(DateStyle::YyyyMmDd).next_date_style(),
            NumberFormat::Date(DateStyle::MmDdYyyy)
        );
    }

    #[test]
    fn test_format_cell_checks_error_before_value() {
        let mut cell = Cell::new_empty(0, 0);
        cell.set_formula("=1/0");
        if let CellType::Formula { cached, .. } = &mut cell.contents {
            *cached = FormulaResult {
                value: 42.0,
                text: Some("ignored".into()),
                error: Some(CellError::DivZero),
            };
        }
        assert_eq!(format_cell(&cell), "#DIV/0!");
    }
}
