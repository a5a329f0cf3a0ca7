use crate::token::DateFormat;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// Renders `value` in one of the date-time formats a token can ask for.
///
/// Returns `None` for [`DateFormat::Subseconds`], which isn't part of the
/// date-time value and has to come from the metadata itself.
pub(crate) fn format_date(value: PrimitiveDateTime, format: DateFormat) -> Option<String> {
    let description: &[BorrowedFormatItem<'_>] = match format {
        DateFormat::YearMonthDay => format_description!("[year][month][day]"),
        DateFormat::YearMonthDayDashed => format_description!("[year]-[month]-[day]"),
        DateFormat::ShortYearMonthDay => format_description!("[year repr:last_two][month][day]"),
        DateFormat::ShortYearMonthDayDashed => format_description!("[year repr:last_two]-[month]-[day]"),
        DateFormat::MonthDayYear => format_description!("[month][day][year]"),
        DateFormat::MonthDayShortYear => format_description!("[month][day][year repr:last_two]"),
        DateFormat::MonthDay => format_description!("[month][day]"),
        DateFormat::DayMonthYear => format_description!("[day][month][year]"),
        DateFormat::DayMonthShortYear => format_description!("[day][month][year repr:last_two]"),
        DateFormat::Year => format_description!("[year]"),
        DateFormat::ShortYear => format_description!("[year repr:last_two]"),
        DateFormat::Month => format_description!("[month]"),
        DateFormat::Day => format_description!("[day]"),
        DateFormat::MonthShort => format_description!("[month repr:short]"),
        DateFormat::MonthLong => format_description!("[month repr:long]"),
        DateFormat::HourMinuteSecond => format_description!("[hour][minute][second]"),
        DateFormat::HourMinute => format_description!("[hour][minute]"),
        DateFormat::HourMinuteSecondDashed => format_description!("[hour]-[minute]-[second]"),
        DateFormat::HourMinuteDashed => format_description!("[hour]-[minute]"),
        DateFormat::Hour => format_description!("[hour]"),
        DateFormat::Minute => format_description!("[minute]"),
        DateFormat::Second => format_description!("[second]"),
        DateFormat::Subseconds => return None,
    };
    match value.format(description) {
        Ok(formatted) => Some(formatted),
        Err(e) => {
            tracing::warn!(%value, ?format, error = %e, "Could not format date");
            None
        },
    }
}

/// Zero-pads `value` to at least `width` digits.
pub(crate) fn pad(value: u32, width: Option<usize>) -> String {
    match width {
        Some(width) => format!("{value:0width$}"),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use time::macros::datetime;

    #[rstest]
    #[case(DateFormat::YearMonthDay, "20240309")]
    #[case(DateFormat::YearMonthDayDashed, "2024-03-09")]
    #[case(DateFormat::ShortYearMonthDay, "240309")]
    #[case(DateFormat::MonthDayYear, "03092024")]
    #[case(DateFormat::DayMonthShortYear, "090324")]
    #[case(DateFormat::Year, "2024")]
    #[case(DateFormat::Month, "03")]
    #[case(DateFormat::MonthShort, "Mar")]
    #[case(DateFormat::MonthLong, "March")]
    #[case(DateFormat::HourMinuteSecond, "140533")]
    #[case(DateFormat::HourMinuteDashed, "14-05")]
    #[case(DateFormat::Minute, "05")]
    #[case(DateFormat::Second, "33")]
    fn test_format_date(#[case] format: DateFormat, #[case] expected: &str) {
        assert_eq!(format_date(datetime!(2024-03-09 14:05:33), format).as_deref(), Some(expected));
    }

    #[test]
    fn test_subseconds_are_not_formatted() {
        assert_eq!(format_date(datetime!(2024-03-09 14:05:33), DateFormat::Subseconds), None);
    }

    #[rstest]
    #[case(7, None, "7")]
    #[case(7, Some(3), "007")]
    #[case(1234, Some(2), "1234")]
    fn test_pad(#[case] value: u32, #[case] width: Option<usize>, #[case] expected: &str) {
        assert_eq!(pad(value, width), expected);
    }
}
