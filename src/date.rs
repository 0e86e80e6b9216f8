//! Date parsing for front matter and the localized "readable date" format
//! used by templates (`05 Mar 2024`, `05 mar 2024`).

use chrono::{
    DateTime, Locale, NaiveDate, NaiveDateTime, ParseResult, SecondsFormat, TimeZone, Utc,
};
use std::fmt;
use std::str::FromStr;

/// The format of readable dates: two-digit day, abbreviated month, year.
pub const READABLE_FORMAT: &str = "%d %b %Y";

/// The locales whose month names can be used in readable dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateLocale {
    EnUs,
    EnGb,
    PtPt,
    PtBr,
    EsEs,
    FrFr,
    DeDe,
}

impl DateLocale {
    /// Picks the locale for a bare language code. Unknown languages get
    /// English month names.
    pub fn for_language(code: &str) -> DateLocale {
        match code {
            "pt" => DateLocale::PtPt,
            "es" => DateLocale::EsEs,
            "fr" => DateLocale::FrFr,
            "de" => DateLocale::DeDe,
            _ => DateLocale::EnUs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DateLocale::EnUs => "en_US",
            DateLocale::EnGb => "en_GB",
            DateLocale::PtPt => "pt_PT",
            DateLocale::PtBr => "pt_BR",
            DateLocale::EsEs => "es_ES",
            DateLocale::FrFr => "fr_FR",
            DateLocale::DeDe => "de_DE",
        }
    }

    fn chrono(self) -> Locale {
        match self {
            DateLocale::EnUs => Locale::en_US,
            DateLocale::EnGb => Locale::en_GB,
            DateLocale::PtPt => Locale::pt_PT,
            DateLocale::PtBr => Locale::pt_BR,
            DateLocale::EsEs => Locale::es_ES,
            DateLocale::FrFr => Locale::fr_FR,
            DateLocale::DeDe => Locale::de_DE,
        }
    }
}

impl FromStr for DateLocale {
    type Err = UnknownLocaleError;

    /// Parses `pt_PT` style tags. `pt-PT` is accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let all = [
            DateLocale::EnUs,
            DateLocale::EnGb,
            DateLocale::PtPt,
            DateLocale::PtBr,
            DateLocale::EsEs,
            DateLocale::FrFr,
            DateLocale::DeDe,
        ];
        let normalized = s.replace('-', "_");
        all.iter()
            .copied()
            .find(|locale| locale.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownLocaleError(s.to_owned()))
    }
}

#[derive(Debug)]
pub struct UnknownLocaleError(String);

impl fmt::Display for UnknownLocaleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown date locale: `{}`", self.0)
    }
}

impl std::error::Error for UnknownLocaleError {}

/// Parses a front matter date. Accepts `YYYY-MM-DD` (interpreted as midnight
/// UTC) and RFC 3339 timestamps.
pub fn parse_date(input: &str) -> ParseResult<DateTime<Utc>> {
    let input = input.trim();
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(_) => {
            let midnight = NaiveDateTime::parse_from_str(
                &format!("{}T00:00:00", input),
                "%Y-%m-%dT%H:%M:%S",
            )?;
            Ok(Utc.from_utc_datetime(&midnight))
        }
        Err(_) => Ok(DateTime::parse_from_rfc3339(input)?.with_timezone(&Utc)),
    }
}

/// Formats a date in UTC as `dd LLL yyyy` with month names from `locale`.
pub fn readable_date(date: &DateTime<Utc>, locale: DateLocale) -> String {
    date.format_localized(READABLE_FORMAT, locale.chrono())
        .to_string()
}

/// The representation of dates handed to templates and feeds.
pub fn to_rfc3339(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}
