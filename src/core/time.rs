//! Timestamp formatting in the bulletin's Spanish conventions

use chrono::{DateTime, Locale, Utc};

/// Current Unix time in seconds
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// `dd/mm/yyyy, HH:MM:SS`, used in commit messages
pub fn commit_stamp(timestamp: i64) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(d) => d.format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => unknown_date(),
    }
}

/// Long form, e.g. `5 de marzo de 2025, 09:07`
pub fn long_date(timestamp: i64) -> String {
    if timestamp == 0 {
        return unknown_date();
    }
    let Some(d) = DateTime::<Utc>::from_timestamp(timestamp, 0) else {
        return unknown_date();
    };

    d.format_localized("%-d de %B de %Y, %H:%M", Locale::es_ES)
        .to_string()
}

fn unknown_date() -> String {
    "Fecha desconocida".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_stamp() {
        // 2025-03-05T09:07:03Z
        assert_eq!(commit_stamp(1741165623), "05/03/2025, 09:07:03");
    }

    #[test]
    fn test_long_date() {
        assert_eq!(long_date(1741165623), "5 de marzo de 2025, 09:07");
        assert_eq!(long_date(1767225599), "31 de diciembre de 2025, 23:59");
        assert_eq!(long_date(0), "Fecha desconocida");
    }
}
