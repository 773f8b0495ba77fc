use chrono::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Render a duration in the `1h2m3.5s` form used by the snapshot files.
///
/// Sub-second values use the largest fitting unit (`ns`, `µs`, `ms`), zero is
/// `0s`, and fractional digits are printed without trailing zeros.
pub fn format_duration(d: Duration) -> String {
    let total = i128::from(d.num_seconds()) * NANOS_PER_SEC as i128 + i128::from(d.subsec_nanos());
    let neg = total < 0;
    let u = total.unsigned_abs();

    let mut out = String::new();
    if neg {
        out.push('-');
    }

    if u == 0 {
        return "0s".to_string();
    }

    if u < NANOS_PER_SEC {
        let (prec, unit) = if u < 1_000 {
            (0, "ns")
        } else if u < 1_000_000 {
            (3, "µs")
        } else {
            (6, "ms")
        };
        let scale = 10u128.pow(prec);
        out.push_str(&with_fraction(u / scale, u % scale, prec));
        out.push_str(unit);
        return out;
    }

    let secs = u / NANOS_PER_SEC;
    let frac = u % NANOS_PER_SEC;
    let minutes = secs / 60;
    if minutes > 0 {
        let hours = minutes / 60;
        if hours > 0 {
            out.push_str(&format!("{}h", hours));
        }
        out.push_str(&format!("{}m", minutes % 60));
    }
    out.push_str(&with_fraction(secs % 60, frac, 9));
    out.push('s');
    out
}

fn with_fraction(int: u128, frac: u128, prec: u32) -> String {
    if prec == 0 || frac == 0 {
        return int.to_string();
    }
    let digits = format!("{:0width$}", frac, width = prec as usize);
    format!("{}.{}", int, digits.trim_end_matches('0'))
}

/// Serde adapter storing a duration as an integer nanosecond count.
pub mod nanos {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration
            .num_nanoseconds()
            .unwrap_or(i64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ns = i64::deserialize(deserializer)?;
        Ok(Duration::nanoseconds(ns))
    }
}
