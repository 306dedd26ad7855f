use time::{macros::format_description, Date, OffsetDateTime};

const MINUTES_PER_DAY: i64 = 60 * 24;
const MINUTES_PER_MONTH: i64 = MINUTES_PER_DAY * 30;

/// Relative age of `then` as seen at `now`, e.g. "about 2 hours ago".
/// Timestamps in the future read as "less than a minute ago".
pub fn time_ago(then: OffsetDateTime, now: OffsetDateTime) -> String {
    let seconds = (now - then).whole_seconds().max(0);
    let minutes = (seconds + 30) / 60;

    if seconds < 30 {
        return "less than a minute ago".into();
    }
    if minutes < 45 {
        return format!("{} ago", plural(minutes.max(1), "minute"));
    }
    if minutes < 90 {
        return "about 1 hour ago".into();
    }
    if minutes < MINUTES_PER_DAY {
        return format!("about {} ago", plural(round_div(minutes, 60), "hour"));
    }
    if minutes < 42 * 60 {
        return "1 day ago".into();
    }
    if minutes < MINUTES_PER_MONTH {
        return format!("{} ago", plural(round_div(minutes, MINUTES_PER_DAY), "day"));
    }
    if minutes < 2 * MINUTES_PER_MONTH {
        return format!("about {} ago", plural(round_div(minutes, MINUTES_PER_MONTH), "month"));
    }

    let months = round_div(minutes, MINUTES_PER_MONTH);
    if months < 12 {
        return format!("{} ago", plural(months, "month"));
    }
    let (years, rest) = (months / 12, months % 12);
    match rest {
        0..=2 => format!("about {} ago", plural(years, "year")),
        3..=8 => format!("over {} ago", plural(years, "year")),
        _ => format!("almost {} ago", plural(years + 1, "year")),
    }
}

/// "March 5, 1990".
pub fn long_date(date: Date) -> String {
    date.format(format_description!("[month repr:long] [day padding:none], [year]"))
        .unwrap_or_else(|_| date.to_string())
}

fn round_div(n: i64, d: i64) -> i64 {
    (n + d / 2) / d
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
