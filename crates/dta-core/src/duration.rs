//! Duration tokens as printed by the experiment tool chain.
//!
//! Two encodings occur in the logs:
//! - a bare integer, meaning nanoseconds (`1500000000`)
//! - a clock value `H:MM:SS` with up to six fractional digits (`0:01:02.5`)
//!
//! Anything else is not a duration and yields `None`.

const NANOS_PER_SECOND: f64 = 1e9;
const MICROS_PER_SECOND: f64 = 1e6;
const MAX_FRACTION_DIGITS: usize = 6;

/// Convert a duration token to seconds.
///
/// Never fails: malformed tokens are reported as absent so callers can keep
/// the "missing" and "zero" cases apart.
pub fn parse_duration_seconds(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if token.bytes().all(|b| b.is_ascii_digit()) {
        let nanos: u128 = token.parse().ok()?;
        return Some(nanos as f64 / NANOS_PER_SECOND);
    }

    parse_clock(token)
}

/// `H:MM:SS[.f{1,6}]`, minutes and seconds in 0..=59 written with one or two digits.
fn parse_clock(token: &str) -> Option<f64> {
    let mut parts = token.split(':');
    let hours = parts.next()?;
    let minutes = parts.next()?;
    let rest = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let (seconds, fraction) = match rest.split_once('.') {
        Some((s, f)) => (s, Some(f)),
        None => (rest, None),
    };

    if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u128 = hours.parse().ok()?;
    let minutes = parse_sexagesimal(minutes)?;
    let seconds = parse_sexagesimal(seconds)?;

    let micros = match fraction {
        Some(f) => {
            if f.is_empty()
                || f.len() > MAX_FRACTION_DIGITS
                || !f.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            // right-pad to microseconds: ".5" is 500000us
            let padded = format!("{f:0<width$}", width = MAX_FRACTION_DIGITS);
            padded.parse::<u32>().ok()?
        }
        None => 0,
    };

    // hour fields long enough to overflow u128 are malformed
    let whole = hours
        .checked_mul(3600)?
        .checked_add(u128::from(minutes) * 60 + u128::from(seconds))?;
    Some(whole as f64 + f64::from(micros) / MICROS_PER_SECOND)
}

fn parse_sexagesimal(field: &str) -> Option<u32> {
    let bytes = field.as_bytes();
    let valid = match bytes {
        [d] => d.is_ascii_digit(),
        [t, d] => (b'0'..=b'5').contains(t) && d.is_ascii_digit(),
        _ => false,
    };
    if valid { field.parse().ok() } else { None }
}
