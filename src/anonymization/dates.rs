//! Date values and their written layout
//!
//! A [`DateValue`] remembers how a date was written so that a shifted date
//! can be rendered the same way: separator, zero padding, two- or four-digit
//! year, month-name language and capitalization. Recognized shapes cover
//! every date the lexical tagger reports:
//!
//! - RFC 3339 and `YYYY-MM-DD[T ]HH:MM:SS` date-times
//! - year-first numeric dates with a four-digit year (`2021-03-05`, `2021/3/5`)
//! - day-first numeric dates with a two- or four-digit year (`05/03/21`, `5.3.2021`)
//! - English and French month names, day-first (`5 March 2021`, `1er janvier 2021`)
//!   or month-first (`March 5, 2021`)

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime};

/// Naive date-time layouts, tried in order
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Two-digit years below this pivot belong to the 2000s
const CENTURY_PIVOT: i32 = 70;

const ENGLISH_MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

/// Accented and unaccented spellings of the French month names
const FRENCH_MONTHS: [(&str, &str); 12] = [
    ("janvier", "janvier"),
    ("février", "fevrier"),
    ("mars", "mars"),
    ("avril", "avril"),
    ("mai", "mai"),
    ("juin", "juin"),
    ("juillet", "juillet"),
    ("août", "aout"),
    ("septembre", "septembre"),
    ("octobre", "octobre"),
    ("novembre", "novembre"),
    ("décembre", "decembre"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    English,
    French { accented: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Case {
    Lower,
    Capitalized,
    Upper,
}

impl Case {
    fn of(word: &str) -> Self {
        let mut chars = word.chars();
        let first_upper = chars.next().is_some_and(char::is_uppercase);
        let rest: Vec<char> = chars.collect();
        if first_upper && !rest.is_empty() && rest.iter().all(|c| c.is_uppercase()) {
            Case::Upper
        } else if first_upper {
            Case::Capitalized
        } else {
            Case::Lower
        }
    }

    fn apply(&self, word: &str) -> String {
        match self {
            Case::Lower => word.to_string(),
            Case::Upper => word.to_uppercase(),
            Case::Capitalized => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Layout {
    Rfc3339(FixedOffset),
    DateTime(&'static str),
    Numeric {
        year_first: bool,
        separator: char,
        pad_day: bool,
        pad_month: bool,
        short_year: bool,
    },
    Named {
        language: Language,
        case: Case,
        month_first: bool,
        comma: bool,
        pad_day: bool,
        ordinal: bool,
    },
}

/// A parsed date together with the layout it was written in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    datetime: NaiveDateTime,
    layout: Layout,
}

impl DateValue {
    /// Parses a date written in one of the recognized layouts
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(Self {
                datetime: parsed.naive_local(),
                layout: Layout::Rfc3339(*parsed.offset()),
            });
        }

        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Self {
                    datetime,
                    layout: Layout::DateTime(*format),
                });
            }
        }

        parse_numeric(text).or_else(|| parse_named(text))
    }

    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// The same instant moved by `days`, rendered in the original layout
    pub fn shifted(&self, days: i64) -> Option<String> {
        let moved = Self {
            datetime: self.datetime.checked_add_signed(Duration::days(days))?,
            layout: self.layout.clone(),
        };
        Some(moved.render())
    }

    /// Renders the date in its layout
    pub fn render(&self) -> String {
        let date = self.datetime.date();
        match &self.layout {
            Layout::Rfc3339(offset) => {
                match self.datetime.and_local_timezone(*offset).single() {
                    Some(zoned) => zoned.to_rfc3339(),
                    None => self.datetime.format("%Y-%m-%dT%H:%M:%S").to_string(),
                }
            }
            Layout::DateTime(format) => self.datetime.format(format).to_string(),
            Layout::Numeric {
                year_first,
                separator,
                pad_day,
                pad_month,
                short_year,
            } => {
                let day = number(date.day(), *pad_day);
                let month = number(date.month(), *pad_month);
                let year = if *short_year {
                    format!("{:02}", date.year().rem_euclid(100))
                } else {
                    format!("{:04}", date.year())
                };
                if *year_first {
                    format!("{year}{separator}{month}{separator}{day}")
                } else {
                    format!("{day}{separator}{month}{separator}{year}")
                }
            }
            Layout::Named {
                language,
                case,
                month_first,
                comma,
                pad_day,
                ordinal,
            } => {
                let index = date.month0() as usize;
                let month = case.apply(match language {
                    Language::English => ENGLISH_MONTHS[index],
                    Language::French { accented: true } => FRENCH_MONTHS[index].0,
                    Language::French { accented: false } => FRENCH_MONTHS[index].1,
                });
                let mut day = number(date.day(), *pad_day);
                if *ordinal && date.day() == 1 {
                    day.push_str("er");
                }
                let comma = if *comma { "," } else { "" };
                if *month_first {
                    format!("{month} {day}{comma} {}", date.year())
                } else {
                    format!("{day} {month}{comma} {}", date.year())
                }
            }
        }
    }
}

fn number(value: u32, pad: bool) -> String {
    if pad {
        format!("{value:02}")
    } else {
        value.to_string()
    }
}

fn digits(part: &str, min: usize, max: usize) -> Option<u32> {
    if (min..=max).contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

/// `YYYY-M-D` with a four-digit year, or `D/M/YY[YY]`, one separator throughout
fn parse_numeric(text: &str) -> Option<DateValue> {
    let separator = text.chars().find(|c| matches!(c, '-' | '/' | '.'))?;
    let parts: Vec<&str> = text.split(separator).collect();
    let [first, second, third] = parts.as_slice() else {
        return None;
    };

    let (year, month, day, year_first, short_year) = if let Some(year) = digits(first, 4, 4) {
        (year as i32, digits(second, 1, 2)?, digits(third, 1, 2)?, true, false)
    } else {
        let day = digits(first, 1, 2)?;
        let month = digits(second, 1, 2)?;
        let (year, short_year) = match third.len() {
            2 => {
                let short = digits(third, 2, 2)? as i32;
                let century = if short < CENTURY_PIVOT { 2000 } else { 1900 };
                (century + short, true)
            }
            4 => (digits(third, 4, 4)? as i32, false),
            _ => return None,
        };
        (year, month, day, false, short_year)
    };

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let (day_part, month_part) = if year_first {
        (*third, *second)
    } else {
        (*first, *second)
    };

    Some(DateValue {
        datetime: date.and_hms_opt(0, 0, 0)?,
        layout: Layout::Numeric {
            year_first,
            separator,
            pad_day: day_part.len() == 2,
            pad_month: month_part.len() == 2,
            short_year,
        },
    })
}

fn month_number(word: &str) -> Option<(u32, Language)> {
    let lower = word.to_lowercase();
    if let Some(index) = ENGLISH_MONTHS.iter().position(|m| *m == lower) {
        return Some((index as u32 + 1, Language::English));
    }
    FRENCH_MONTHS.iter().enumerate().find_map(|(index, (accented, plain))| {
        if *accented == lower {
            Some((index as u32 + 1, Language::French { accented: true }))
        } else if *plain == lower {
            Some((index as u32 + 1, Language::French { accented: false }))
        } else {
            None
        }
    })
}

/// `Month D, YYYY`, `D Month YYYY` and French `1er mois YYYY`
fn parse_named(text: &str) -> Option<DateValue> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [first, second, third] = tokens.as_slice() else {
        return None;
    };

    let year = digits(third, 4, 4)? as i32;

    let (day_token, month_token, month_first) = if month_number(first).is_some() {
        (*second, *first, true)
    } else {
        (*first, *second, false)
    };

    let comma = if month_first {
        day_token.ends_with(',')
    } else {
        month_token.ends_with(',')
    };
    let day_token = day_token.trim_end_matches(',');
    let month_token = month_token.trim_end_matches(',');

    let (month, language) = month_number(month_token)?;
    let (day_digits, ordinal) = match day_token.strip_suffix("er") {
        Some(stripped) => (stripped, true),
        None => (day_token, false),
    };
    let day = digits(day_digits, 1, 2)?;

    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(DateValue {
        datetime: date.and_hms_opt(0, 0, 0)?,
        layout: Layout::Named {
            language,
            case: Case::of(month_token),
            month_first,
            comma,
            pad_day: day_digits.starts_with('0'),
            ordinal,
        },
    })
}
