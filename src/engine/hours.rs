//! Conversions from time-of-day pairs and duration text into fractional hours.

use chrono::NaiveTime;
use tracing::debug;

use crate::model::attendance::TIME_FORMAT;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Hours between two `HH:MM:SS` values. A check-out that falls before the
/// check-in is taken to be on the next day, so the result lies in `[0, 24)`.
pub fn shift_hours(check_in: &str, check_out: &str) -> Option<f64> {
    let start = NaiveTime::parse_from_str(check_in.trim(), TIME_FORMAT).ok()?;
    let end = NaiveTime::parse_from_str(check_out.trim(), TIME_FORMAT).ok()?;

    let mut hours = (end - start).num_seconds() as f64 / SECONDS_PER_HOUR;
    if hours < 0.0 {
        hours += 24.0;
    }
    Some(hours)
}

/// Same as [`shift_hours`] but never fails: unparseable values give 0.0.
pub fn worked_hours_between(check_in: &str, check_out: &str) -> f64 {
    shift_hours(check_in, check_out).unwrap_or_else(|| {
        debug!(check_in, check_out, "unparseable shift times, counting 0 hours");
        0.0
    })
}

/// Reads a textual duration as signed hours.
///
/// Accepted shapes:
/// - clock form `HH:MM:SS`, `HH:MM`, with optional fractional seconds
/// - a leading day count, `1 days 02:00:00`
/// - unit form, `8h 30m`, `1.5 hours`, `45min`, `2 days 3h`
/// - a bare decimal number, read as hours
///
/// A leading `-` or `+` applies to the whole value.
pub fn parse_clock_duration(text: &str) -> Option<f64> {
    let text = text.trim();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest.trim_start()),
        None => (1.0, text.strip_prefix('+').unwrap_or(text).trim_start()),
    };
    if body.is_empty() {
        return None;
    }

    if let Ok(hours) = body.parse::<f64>() {
        return hours.is_finite().then_some(sign * hours);
    }

    let hours = if !body.contains(':') {
        parse_units(body)?
    } else if let Some((days, rest)) = body.split_once("day") {
        let days: f64 = days.trim().parse().ok()?;
        let rest = rest.trim_start_matches('s').trim_start_matches(',').trim();
        days * 24.0 + parse_clock(rest)?
    } else {
        parse_clock(body)?
    };

    Some(sign * hours)
}

fn parse_clock(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.split(':').map(str::trim).collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m] => (*h, *m, "0"),
        [h, m, s] => (*h, *m, *s),
        _ => return None,
    };

    if !is_digits(h) || !is_digits(m) {
        return None;
    }
    let hours: f64 = h.parse().ok()?;
    let minutes: f64 = m.parse().ok()?;
    let seconds: f64 = s.parse().ok()?;
    if minutes >= 60.0 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    Some(hours + minutes / 60.0 + seconds / SECONDS_PER_HOUR)
}

fn parse_units(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut components = 0;
    let mut chars = text.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut number = String::new();
        while let Some(c) = chars.next_if(|c| c.is_ascii_digit() || *c == '.') {
            number.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut unit = String::new();
        while let Some(c) = chars.next_if(|c| c.is_alphabetic()) {
            unit.push(c.to_ascii_lowercase());
        }

        let value: f64 = number.parse().ok()?;
        let scale = match unit.as_str() {
            "d" | "day" | "days" => 24.0,
            "h" | "hr" | "hrs" | "hour" | "hours" => 1.0,
            "m" | "min" | "mins" | "minute" | "minutes" => 1.0 / 60.0,
            "s" | "sec" | "secs" | "second" | "seconds" => 1.0 / SECONDS_PER_HOUR,
            _ => return None,
        };
        total += value * scale;
        components += 1;
    }

    (components > 0).then_some(total)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
