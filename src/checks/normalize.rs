//! Normalisation of Japanese numerals, yen amounts and dates.
//!
//! Documents mix half-width and full-width digits, comma separators, kanji
//! numerals (including the formal 大字 forms used on contracts) and era-based
//! dates. Every numeric comparison in the rule engine goes through these
//! functions first.

use std::sync::LazyLock;

use regex::Regex;

/// Fold full-width digits and punctuation to ASCII, dropping thousands separators and spaces.
pub fn normalize_digits(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
            ',' | '，' => None,
            c if c.is_whitespace() => None,
            '．' => Some('.'),
            '－' | '−' => Some('-'),
            '／' => Some('/'),
            '（' => Some('('),
            '）' => Some(')'),
            _ => Some(c),
        })
        .collect()
}

fn kanji_digit(c: char) -> Option<u64> {
    let value = match c {
        '〇' | '零' => 0,
        '一' | '壱' | '壹' | '弌' => 1,
        '二' | '弐' | '貳' => 2,
        '三' | '参' | '參' => 3,
        '四' | '肆' => 4,
        '五' | '伍' => 5,
        '六' | '陸' => 6,
        '七' | '漆' => 7,
        '八' | '捌' => 8,
        '九' | '玖' => 9,
        _ => return None,
    };
    Some(value)
}

fn small_unit(c: char) -> Option<u64> {
    match c {
        '十' | '拾' => Some(10),
        '百' | '佰' => Some(100),
        '千' | '阡' | '仟' => Some(1_000),
        _ => None,
    }
}

fn large_unit(c: char) -> Option<u64> {
    match c {
        '万' | '萬' => Some(10_000),
        '億' => Some(100_000_000),
        '兆' => Some(1_000_000_000_000),
        _ => None,
    }
}

/// Whether `c` can appear inside a numeral (ASCII digit, kanji digit or unit).
pub fn is_numeral_char(c: char) -> bool {
    c.is_ascii_digit()
        || kanji_digit(c).is_some()
        || small_unit(c).is_some()
        || large_unit(c).is_some()
}

/// Parse a numeral written with ASCII digits, kanji, or a mix of both.
///
/// Handles positional kanji (二〇二五), unit-based kanji (二千五百), 大字
/// (壱阡萬) and mixed forms such as `1億2500万`. Returns `None` for empty
/// input, any other character, or overflow.
pub fn parse_numeral(s: &str) -> Option<u64> {
    let normalized = normalize_digits(s);
    if normalized.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    let mut section: u64 = 0;
    let mut current: Option<u64> = None;

    for c in normalized.chars() {
        if let Some(d) = c.to_digit(10).map(u64::from).or_else(|| kanji_digit(c)) {
            current = Some(current.unwrap_or(0).checked_mul(10)?.checked_add(d)?);
        } else if let Some(unit) = small_unit(c) {
            section = section.checked_add(current.unwrap_or(1).checked_mul(unit)?)?;
            current = None;
        } else if let Some(unit) = large_unit(c) {
            let block = section.checked_add(current.unwrap_or(0))?;
            if block == 0 {
                return None;
            }
            total = total.checked_add(block.checked_mul(unit)?)?;
            section = 0;
            current = None;
        } else {
            return None;
        }
    }

    total.checked_add(section)?.checked_add(current.unwrap_or(0))
}

/// Parse a yen amount such as `1,000,000円`, `１００万円` or `金壱阡萬円也`.
pub fn parse_amount(s: &str) -> Option<u64> {
    let normalized = normalize_digits(s);
    let trimmed = normalized
        .trim_start_matches(['金', '¥', '￥', '\\'])
        .trim_end_matches(['也', '-', '―', '円', '.']);
    parse_numeral(trimmed)
}

/// Format a yen value with thousands separators.
pub fn format_yen(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

static NUMERAL_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9〇零一二三四五六七八九壱壹弌弐貳参參肆伍陸漆捌玖十拾百佰千阡仟万萬億兆]+")
        .unwrap()
});

/// Rewrite every numeral run as ASCII digits and fold widths.
///
/// Used to tell "same value, different notation" (一丁目二番地 vs 1丁目2番地)
/// apart from a real mismatch.
pub fn fold_numerals(s: &str) -> String {
    let normalized = normalize_digits(s);
    NUMERAL_RUN
        .replace_all(&normalized, |caps: &regex::Captures| {
            let run = &caps[0];
            parse_numeral(run)
                .map(|n| n.to_string())
                .unwrap_or_else(|| run.to_string())
        })
        .into_owned()
}

/// Japanese imperial eras.
/// Largest era year accepted when reading a date. No era has reached 70.
pub const MAX_ERA_YEAR: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Meiji,
    Taisho,
    Showa,
    Heisei,
    Reiwa,
}

impl Era {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "明治" | "M" | "m" => Some(Era::Meiji),
            "大正" | "T" | "t" => Some(Era::Taisho),
            "昭和" | "S" | "s" => Some(Era::Showa),
            "平成" | "H" | "h" => Some(Era::Heisei),
            "令和" | "R" | "r" => Some(Era::Reiwa),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Era::Meiji => "明治",
            Era::Taisho => "大正",
            Era::Showa => "昭和",
            Era::Heisei => "平成",
            Era::Reiwa => "令和",
        }
    }

    /// First day of the era as (year, month, day).
    pub fn start(&self) -> (i32, u32, u32) {
        match self {
            Era::Meiji => (1868, 1, 25),
            Era::Taisho => (1912, 7, 30),
            Era::Showa => (1926, 12, 25),
            Era::Heisei => (1989, 1, 8),
            Era::Reiwa => (2019, 5, 1),
        }
    }

    /// Last day of the era, or `None` for the current one.
    pub fn end(&self) -> Option<(i32, u32, u32)> {
        match self {
            Era::Meiji => Some((1912, 7, 29)),
            Era::Taisho => Some((1926, 12, 24)),
            Era::Showa => Some((1989, 1, 7)),
            Era::Heisei => Some((2019, 4, 30)),
            Era::Reiwa => None,
        }
    }

    /// Gregorian year for an era year (元年 is 1), or `None` when the era
    /// year is beyond [`MAX_ERA_YEAR`].
    pub fn to_gregorian(&self, era_year: u32) -> Option<i32> {
        if era_year > MAX_ERA_YEAR {
            return None;
        }
        let era_year = i32::try_from(era_year).ok()?;
        self.start().0.checked_add(era_year)?.checked_sub(1)
    }
}

/// A date as written, before calendar validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParts {
    /// The matched text.
    pub text: String,
    pub era: Option<Era>,
    pub era_year: Option<u32>,
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl DateParts {
    pub fn ymd(&self) -> (i32, u32, u32) {
        (self.year, self.month, self.day)
    }
}

const NUM: &str = "[0-9〇零一二三四五六七八九十]+";

static JAPANESE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:(令和|平成|昭和|大正|明治)({NUM}|元)|([0-9]{{4}}))年({NUM})月({NUM})日"
    ))
    .unwrap()
});

static NUMERIC_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{4})[-/.]([0-9]{1,2})[-/.]([0-9]{1,2})").unwrap());

static ABBREVIATED_ERA_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([RHSTMrhstm])([0-9]{1,2})[./]([0-9]{1,2})[./]([0-9]{1,2})").unwrap()
});

fn to_u32(s: &str) -> Option<u32> {
    if s == "元" {
        return Some(1);
    }
    parse_numeral(s).and_then(|n| u32::try_from(n).ok())
}

fn era_parts(text: &str, era: Era, era_year: u32, month: u32, day: u32) -> Option<DateParts> {
    Some(DateParts {
        text: text.to_string(),
        era: Some(era),
        era_year: Some(era_year),
        year: era.to_gregorian(era_year)?,
        month,
        day,
    })
}

/// Find every date in `text`, in order of appearance.
///
/// Recognises `令和6年3月1日`, `2024年3月1日`, `2024-03-01`, `2024/3/1` and
/// `R6.3.1`. Month and day are returned as written, so out-of-range values
/// survive for the validator to report. Era years above [`MAX_ERA_YEAR`] are
/// not dates.
pub fn find_dates(text: &str) -> Vec<DateParts> {
    let normalized = normalize_digits(text);
    let mut found: Vec<(usize, DateParts)> = Vec::new();

    for caps in JAPANESE_DATE.captures_iter(&normalized) {
        let whole = &caps[0];
        let (Some(month), Some(day)) = (to_u32(&caps[4]), to_u32(&caps[5])) else {
            continue;
        };
        let parts = if let (Some(era), Some(era_year)) = (caps.get(1), caps.get(2)) {
            let era = Era::from_str(era.as_str());
            let era_year = to_u32(era_year.as_str());
            let Some(parts) = era.zip(era_year).and_then(|(era, era_year)| {
                era_parts(whole, era, era_year, month, day)
            }) else {
                continue;
            };
            parts
        } else {
            let Some(year) = caps.get(3).and_then(|y| y.as_str().parse().ok()) else {
                continue;
            };
            DateParts {
                text: whole.to_string(),
                era: None,
                era_year: None,
                year,
                month,
                day,
            }
        };
        found.push((caps.get(0).map(|m| m.start()).unwrap_or(0), parts));
    }

    for caps in NUMERIC_DATE.captures_iter(&normalized) {
        let (Ok(year), Ok(month), Ok(day)) = (caps[1].parse(), caps[2].parse(), caps[3].parse())
        else {
            continue;
        };
        found.push((
            caps.get(0).map(|m| m.start()).unwrap_or(0),
            DateParts {
                text: caps[0].to_string(),
                era: None,
                era_year: None,
                year,
                month,
                day,
            },
        ));
    }

    for caps in ABBREVIATED_ERA_DATE.captures_iter(&normalized) {
        let start = caps.get(0).map(|m| m.start()).unwrap_or(0);
        // Skip matches that are the tail of a longer alphanumeric token
        if normalized[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric())
        {
            continue;
        }
        let (Some(era), Ok(era_year), Ok(month), Ok(day)) = (
            Era::from_str(&caps[1]),
            caps[2].parse(),
            caps[3].parse(),
            caps[4].parse(),
        ) else {
            continue;
        };
        if let Some(parts) = era_parts(&caps[0], era, era_year, month, day) {
            found.push((start, parts));
        }
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, parts)| parts).collect()
}

/// Parse the first date in `s`.
pub fn parse_date(s: &str) -> Option<DateParts> {
    find_dates(s).into_iter().next()
}
