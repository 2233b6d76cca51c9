//! Number format translation between the `{kind, args}` model and format codes.
//!
//! Format codes are the `numFmt` strings of the stylesheet (`#,##0.00;[Red](#,##0.00)`).
//! Ids below [`FIRST_CUSTOM_FORMAT_ID`] are built in and never written to the table.
//! Date/time patterns are kept in a neutral token set (`yyyy MM dd HH mm ss tt fff`)
//! and translated to the file's tokens on the way in and out.

use crate::units;

/// First id available for custom formats.
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// Built-in format ids understood without a table entry.
const BUILTIN_FORMATS: &[(u32, &str)] = &[
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (14, "mm-dd-yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (37, "#,##0 ;(#,##0)"),
    (38, "#,##0 ;[Red](#,##0)"),
    (39, "#,##0.00;(#,##0.00)"),
    (40, "#,##0.00;[Red](#,##0.00)"),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (49, "@"),
];

/// Windows locale ids with a known name.
const LOCALES: &[(&str, &str)] = &[
    ("409", "en-US"),
    ("809", "en-GB"),
    ("407", "de-DE"),
    ("40C", "fr-FR"),
    ("410", "it-IT"),
    ("C0A", "es-ES"),
    ("416", "pt-BR"),
    ("413", "nl-NL"),
    ("41D", "sv-SE"),
    ("419", "ru-RU"),
    ("411", "ja-JP"),
    ("412", "ko-KR"),
    ("804", "zh-CN"),
    ("404", "zh-TW"),
];

pub fn builtin_code(id: u32) -> Option<&'static str> {
    BUILTIN_FORMATS.iter().find(|(i, _)| *i == id).map(|(_, c)| *c)
}

pub fn builtin_id(code: &str) -> Option<u32> {
    BUILTIN_FORMATS.iter().find(|(_, c)| *c == code).map(|(i, _)| *i)
}

/// How negative numbers are presented.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum NegativeStyle {
    /// Plain leading minus.
    #[default]
    Minus,
    /// Red text with a minus.
    Red,
    /// Parenthesized.
    Brackets,
    /// Red and parenthesized.
    RedBrackets,
    /// A locale-specific sign glyph in place of the minus.
    SignGlyph(char),
    /// Literal text around the number.
    Custom { prefix: String, postfix: String },
}

/// Arguments of the numeric kinds.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NumberArgs {
    pub decimals: u8,
    pub grouping: bool,
    pub negative: NegativeStyle,
}

impl NumberArgs {
    pub fn new(decimals: u8, grouping: bool) -> Self {
        NumberArgs { decimals, grouping, negative: NegativeStyle::Minus }
    }

    pub fn with_negative(mut self, negative: NegativeStyle) -> Self {
        self.negative = negative;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolPlacement {
    Prefix,
    Postfix,
}

/// A cell's data format.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DataFormat {
    #[default]
    General,
    Number(NumberArgs),
    Percent(NumberArgs),
    Currency {
        number: NumberArgs,
        symbol: String,
        placement: SymbolPlacement,
    },
    /// A neutral date/time pattern and an optional locale name.
    DateTime {
        pattern: String,
        locale: Option<String>,
    },
    Text,
    /// A format code the model has no kind for, kept verbatim.
    Custom(String),
}

/// A number rendered through a format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedValue {
    pub text: String,
    /// The negative style asks for red text.
    pub red: bool,
}

impl DataFormat {
    /// The format applied to date values that carry no date format of their own.
    pub fn default_datetime() -> Self {
        DataFormat::DateTime { pattern: "M/d/yy H:mm".to_string(), locale: None }
    }

    pub fn date(pattern: &str) -> Self {
        DataFormat::DateTime { pattern: pattern.to_string(), locale: None }
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, DataFormat::DateTime { .. })
    }

    /// Translate a built-in format id.
    pub fn from_builtin(id: u32) -> Option<Self> {
        builtin_code(id).map(Self::from_pattern)
    }

    /// Format code for this format.
    pub fn to_pattern(&self) -> String {
        match self {
            DataFormat::General => "General".to_string(),
            DataFormat::Text => "@".to_string(),
            DataFormat::Custom(code) => code.clone(),
            DataFormat::Number(args) => with_negative(number_body(args), &args.negative),
            DataFormat::Percent(args) => {
                let mut body = number_body(args);
                body.push('%');
                with_negative(body, &args.negative)
            }
            DataFormat::Currency { number, symbol, placement } => {
                let digits = number_body(number);
                let body = match placement {
                    SymbolPlacement::Prefix => format!("{}{}", quote_literal(symbol), digits),
                    SymbolPlacement::Postfix => format!("{}{}", digits, quote_literal(symbol)),
                };
                with_negative(body, &number.negative)
            }
            DataFormat::DateTime { pattern, locale } => {
                let mut out = String::new();
                if let Some(locale) = locale {
                    out.push_str("[$-");
                    out.push_str(locale_to_lcid(locale));
                    out.push(']');
                }
                out.push_str(&neutral_to_excel(pattern));
                out
            }
        }
    }

    /// Parse a format code. Codes outside the model become [`DataFormat::Custom`].
    pub fn from_pattern(code: &str) -> Self {
        let trimmed = code.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("general") {
            return DataFormat::General;
        }
        if trimmed == "@" {
            return DataFormat::Text;
        }
        if looks_like_date(trimmed) {
            return match excel_to_neutral(trimmed) {
                Some((pattern, locale)) => DataFormat::DateTime { pattern, locale },
                None => DataFormat::Custom(code.to_string()),
            };
        }
        parse_numeric(trimmed).unwrap_or_else(|| DataFormat::Custom(code.to_string()))
    }

    /// Render a numeric value the way this format displays it.
    pub fn render_number(&self, value: f64) -> RenderedValue {
        let plain = |text: String| RenderedValue { text, red: false };
        match self {
            DataFormat::General | DataFormat::Text | DataFormat::Custom(_) => {
                plain(format_general(value))
            }
            DataFormat::Number(args) => apply_negative(value, format_digits(value.abs(), args), &args.negative),
            DataFormat::Percent(args) => {
                let mut body = format_digits(value.abs() * 100.0, args);
                body.push('%');
                apply_negative(value, body, &args.negative)
            }
            DataFormat::Currency { number, symbol, placement } => {
                let digits = format_digits(value.abs(), number);
                let body = match placement {
                    SymbolPlacement::Prefix => format!("{}{}", symbol, digits),
                    SymbolPlacement::Postfix => format!("{}{}", digits, symbol),
                };
                apply_negative(value, body, &number.negative)
            }
            DataFormat::DateTime { pattern, .. } => match render_datetime(pattern, value) {
                Some(text) => plain(text),
                None => plain(format_general(value)),
            },
        }
    }
}

fn number_body(args: &NumberArgs) -> String {
    let mut body = String::from(if args.grouping { "#,##0" } else { "0" });
    if args.decimals > 0 {
        body.push('.');
        body.extend(std::iter::repeat('0').take(args.decimals as usize));
    }
    body
}

fn with_negative(body: String, negative: &NegativeStyle) -> String {
    match negative {
        NegativeStyle::Minus => body,
        NegativeStyle::Red => format!("{body};[Red]-{body}"),
        NegativeStyle::Brackets => format!("{body};({body})"),
        NegativeStyle::RedBrackets => format!("{body};[Red]({body})"),
        NegativeStyle::SignGlyph(glyph) => format!("{body};\\{glyph}{body}"),
        NegativeStyle::Custom { prefix, postfix } => {
            let pre = if prefix.is_empty() { String::new() } else { quote_literal(prefix) };
            let post = if postfix.is_empty() { String::new() } else { quote_literal(postfix) };
            format!("{body};{pre}{body}{post}")
        }
    }
}

fn quote_literal(text: &str) -> String {
    if text.contains('"') {
        text.chars().flat_map(|c| ['\\', c]).collect()
    } else {
        format!("\"{}\"", text)
    }
}

/// Split on `;` outside quotes, escapes and brackets.
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut in_bracket = false;
    let mut escaped = false;
    for (i, c) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if !in_quote => escaped = true,
            '"' if !in_bracket => in_quote = !in_quote,
            '[' if !in_quote => in_bracket = true,
            ']' if !in_quote => in_bracket = false,
            ';' if !in_quote && !in_bracket => {
                sections.push(&code[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// One number section split into literal prefix, digit pattern and literal suffix.
#[derive(Debug)]
struct NumberSection<'a> {
    prefix: String,
    /// The prefix began with a backslash-escaped character.
    escaped_lead: Option<char>,
    core: &'a str,
    suffix: String,
}

impl NumberSection<'_> {
    fn prefix(&self) -> &str {
        significant(&self.prefix)
    }

    fn suffix(&self) -> &str {
        significant(&self.suffix)
    }
}

/// Whitespace-only literals carry no meaning.
fn significant(s: &str) -> &str {
    if s.trim().is_empty() {
        ""
    } else {
        s
    }
}

/// Consume one literal piece from the front of `rest`.
///
/// Returns `Ok(None)` when `rest` starts with a digit placeholder and
/// `Err(())` on anything a number section cannot contain.
fn take_literal(rest: &mut &str, out: &mut String) -> Result<Option<bool>, ()> {
    let s: &str = *rest;
    let mut chars = s.chars();
    let c = match chars.next() {
        Some(c) => c,
        None => return Ok(None),
    };
    match c {
        '#' | '0' | '?' => Ok(None),
        '"' => {
            let inner = &s[1..];
            let end = inner.find('"').ok_or(())?;
            out.push_str(&inner[..end]);
            *rest = &inner[end + 1..];
            Ok(Some(false))
        }
        '\\' => {
            let e = chars.next().ok_or(())?;
            out.push(e);
            *rest = &s[1 + e.len_utf8()..];
            Ok(Some(true))
        }
        '_' | '*' => {
            // padding and repeat fill take one argument character and print nothing
            let e = chars.next().ok_or(())?;
            *rest = &s[1 + e.len_utf8()..];
            Ok(Some(false))
        }
        '[' => {
            let end = s.find(']').ok_or(())?;
            let currency = s[1..end].strip_prefix('$').ok_or(())?;
            out.push_str(currency.split('-').next().unwrap_or(""));
            *rest = &s[end + 1..];
            Ok(Some(false))
        }
        '.' | ',' | '@' | ';' => Err(()),
        c if c.is_ascii_alphabetic() => Err(()),
        c => {
            out.push(c);
            *rest = &s[c.len_utf8()..];
            Ok(Some(false))
        }
    }
}

fn parse_number_section(section: &str) -> Option<NumberSection<'_>> {
    let mut rest = section;
    let mut prefix = String::new();
    let mut escaped_lead = None;
    let mut first = true;
    loop {
        let before = prefix.len();
        match take_literal(&mut rest, &mut prefix).ok()? {
            None => break,
            Some(escaped) => {
                if first && escaped {
                    escaped_lead = prefix[before..].chars().next();
                }
                if prefix.len() > before {
                    first = false;
                }
            }
        }
    }
    if rest.is_empty() {
        return None;
    }

    let core_len = rest
        .find(|c: char| !matches!(c, '#' | '0' | '?' | ',' | '.'))
        .unwrap_or(rest.len());
    let core = &rest[..core_len];
    rest = &rest[core_len..];

    let mut suffix = String::new();
    while !rest.is_empty() {
        if let Some(tail) = rest.strip_prefix('%') {
            suffix.push('%');
            rest = tail;
            continue;
        }
        if take_literal(&mut rest, &mut suffix).ok()?.is_none() {
            // a second digit run (exponents, fractions) is outside the model
            return None;
        }
    }

    Some(NumberSection { prefix, escaped_lead, core, suffix })
}

/// `0`, `#,##0`, optionally followed by `.` and zeros.
fn analyze_core(core: &str) -> Option<(u8, bool)> {
    let (int_part, frac) = match core.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (core, None),
    };
    let grouping = match int_part {
        "0" => false,
        "#,##0" => true,
        _ => return None,
    };
    let decimals = match frac {
        None => 0,
        Some(f) if !f.is_empty() && f.len() <= 30 && f.bytes().all(|b| b == b'0') => f.len() as u8,
        Some(_) => return None,
    };
    Some((decimals, grouping))
}

fn parse_numeric(code: &str) -> Option<DataFormat> {
    let sections = split_sections(code);
    let positive = parse_number_section(sections[0].trim())?;
    let (decimals, grouping) = analyze_core(positive.core)?;

    let negative = match sections.get(1) {
        None => NegativeStyle::Minus,
        Some(section) => parse_negative(section, &positive)?,
    };
    if let Some(zero) = sections.get(2) {
        let zero = parse_number_section(zero.trim())?;
        if zero.core != positive.core || zero.prefix() != positive.prefix() || zero.suffix() != positive.suffix() {
            return None;
        }
    }
    if sections.len() > 3 {
        return None;
    }

    let number = NumberArgs { decimals, grouping, negative };
    match (positive.prefix(), positive.suffix()) {
        ("", "") => Some(DataFormat::Number(number)),
        ("", "%") => Some(DataFormat::Percent(number)),
        (symbol, "") if !symbol.contains('%') => Some(DataFormat::Currency {
            number,
            symbol: symbol.to_string(),
            placement: SymbolPlacement::Prefix,
        }),
        ("", symbol) if !symbol.contains('%') => Some(DataFormat::Currency {
            number,
            symbol: symbol.to_string(),
            placement: SymbolPlacement::Postfix,
        }),
        _ => None,
    }
}

/// Peel `[Red]`, a minus sign and parentheses, then compare what remains with
/// the positive section.
fn parse_negative(section: &str, positive: &NumberSection<'_>) -> Option<NegativeStyle> {
    let mut s = section.trim();
    let mut red = false;
    let mut brackets = false;
    let mut minus = false;

    if let Some(rest) = s.get(..5).filter(|p| p.eq_ignore_ascii_case("[red]")).and(s.get(5..)) {
        red = true;
        s = rest.trim_start();
    }
    if let Some(rest) = s.strip_prefix('-') {
        minus = true;
        s = rest;
    }
    if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        brackets = true;
        s = &s[1..s.len() - 1];
    }

    let neg = parse_number_section(s)?;
    if neg.core != positive.core {
        return None;
    }
    let extra_pre = neg.prefix().strip_suffix(positive.prefix())?;
    let extra_post = neg.suffix().strip_prefix(positive.suffix())?;

    if extra_pre.is_empty() && extra_post.is_empty() {
        return Some(match (red, brackets) {
            (true, true) => NegativeStyle::RedBrackets,
            (true, false) => NegativeStyle::Red,
            (false, true) => NegativeStyle::Brackets,
            (false, false) => NegativeStyle::Minus,
        });
    }
    if red || brackets || minus {
        return None;
    }

    let mut glyph = extra_pre.chars();
    match (neg.escaped_lead, glyph.next(), glyph.next()) {
        (Some(lead), Some(g), None) if lead == g && extra_post.is_empty() => {
            Some(NegativeStyle::SignGlyph(g))
        }
        _ => Some(NegativeStyle::Custom {
            prefix: extra_pre.to_string(),
            postfix: extra_post.to_string(),
        }),
    }
}

fn format_general(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(value as i64).to_string()
    } else {
        let mut buf = ryu::Buffer::new();
        buf.format(value).to_string()
    }
}

fn format_digits(abs: f64, args: &NumberArgs) -> String {
    let fixed = format!("{:.*}", args.decimals as usize, abs);
    if !args.grouping {
        return fixed;
    }
    let (int_part, frac) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if let Some(f) = frac {
        grouped.push('.');
        grouped.push_str(f);
    }
    grouped
}

fn apply_negative(value: f64, body: String, negative: &NegativeStyle) -> RenderedValue {
    // a value that rounds to zero shows without a sign
    let is_zero = body.chars().filter(|c| c.is_ascii_digit()).all(|c| c == '0');
    if value >= 0.0 || is_zero {
        return RenderedValue { text: body, red: false };
    }
    let (text, red) = match negative {
        NegativeStyle::Minus => (format!("-{body}"), false),
        NegativeStyle::Red => (format!("-{body}"), true),
        NegativeStyle::Brackets => (format!("({body})"), false),
        NegativeStyle::RedBrackets => (format!("({body})"), true),
        NegativeStyle::SignGlyph(glyph) => (format!("{glyph}{body}"), false),
        NegativeStyle::Custom { prefix, postfix } => (format!("{prefix}{body}{postfix}"), false),
    };
    RenderedValue { text, red }
}

fn lcid_to_locale(lcid: &str) -> String {
    let key = lcid.trim_start_matches('0');
    LOCALES
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(key))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| lcid.to_string())
}

fn locale_to_lcid(locale: &str) -> &str {
    LOCALES
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(locale))
        .map(|(id, _)| *id)
        .unwrap_or(locale)
}

/// Date/time letters outside quotes, escapes and non-elapsed brackets.
fn looks_like_date(code: &str) -> bool {
    let mut chars = code.chars().peekable();
    let mut in_quote = false;
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quote = !in_quote,
            _ if in_quote => {}
            '\\' | '_' | '*' => {
                chars.next();
            }
            '[' => {
                let tag: String = chars.by_ref().take_while(|&c| c != ']').collect();
                if is_elapsed_tag(&tag) {
                    return true;
                }
            }
            'y' | 'Y' | 'm' | 'M' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {}
        }
    }
    false
}

fn is_elapsed_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.eq_ignore_ascii_case(&'h') || c.eq_ignore_ascii_case(&'m') || c.eq_ignore_ascii_case(&'s'))
        && tag.chars().all(|c| c.eq_ignore_ascii_case(&tag.chars().next().unwrap_or(c)))
}

#[derive(Clone, Debug, PartialEq)]
enum DateToken {
    Year(usize),
    Month(usize),
    Day(usize),
    Hour { len: usize, twelve: bool },
    Minute(usize),
    Second(usize),
    AmPm,
    AP,
    Fraction(usize),
    Elapsed(String),
    Literal(String),
}

impl DateToken {
    fn is_hourish(&self) -> bool {
        match self {
            DateToken::Hour { .. } => true,
            DateToken::Elapsed(tag) => tag.starts_with(|c: char| c.eq_ignore_ascii_case(&'h')),
            _ => false,
        }
    }

    fn is_secondish(&self) -> bool {
        match self {
            DateToken::Second(_) => true,
            DateToken::Elapsed(tag) => tag.starts_with(|c: char| c.eq_ignore_ascii_case(&'s')),
            _ => false,
        }
    }
}

fn push_literal(tokens: &mut Vec<DateToken>, text: &str) {
    if let Some(DateToken::Literal(prev)) = tokens.last_mut() {
        prev.push_str(text);
    } else {
        tokens.push(DateToken::Literal(text.to_string()));
    }
}

fn starts_with_ignore_case(chars: &[char], pattern: &str) -> bool {
    let mut it = chars.iter();
    pattern
        .chars()
        .all(|p| it.next().map_or(false, |c| c.eq_ignore_ascii_case(&p)))
}

/// Tokenize a file-format date code. `m` is left as a month until resolved.
fn excel_date_tokens(code: &str) -> Option<(Vec<DateToken>, Option<String>)> {
    let chars: Vec<char> = code.chars().collect();
    let mut tokens = Vec::new();
    let mut locale = None;
    let mut ambiguous_m = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = |ch: char| {
            chars[i..]
                .iter()
                .take_while(|x| x.eq_ignore_ascii_case(&ch))
                .count()
        };
        match c.to_ascii_lowercase() {
            '"' => {
                let end = chars[i + 1..].iter().position(|&x| x == '"')?;
                let text: String = chars[i + 1..i + 1 + end].iter().collect();
                push_literal(&mut tokens, &text);
                i += end + 2;
            }
            '\\' => {
                let e = *chars.get(i + 1)?;
                push_literal(&mut tokens, &e.to_string());
                i += 2;
            }
            '_' | '*' => i += 2,
            '[' => {
                let end = chars[i + 1..].iter().position(|&x| x == ']')?;
                let tag: String = chars[i + 1..i + 1 + end].iter().collect();
                if is_elapsed_tag(&tag) {
                    tokens.push(DateToken::Elapsed(tag.to_ascii_lowercase()));
                } else if let Some(currency) = tag.strip_prefix('$') {
                    let (symbol, lcid) = currency.split_once('-').unwrap_or((currency, ""));
                    if !symbol.is_empty() {
                        push_literal(&mut tokens, symbol);
                    }
                    if !lcid.is_empty() {
                        locale = Some(lcid_to_locale(lcid));
                    }
                } else {
                    return None;
                }
                i += end + 2;
            }
            'y' => {
                let n = run('y');
                tokens.push(DateToken::Year(n));
                i += n;
            }
            'd' => {
                let n = run('d');
                tokens.push(DateToken::Day(n));
                i += n;
            }
            'h' => {
                let n = run('h');
                tokens.push(DateToken::Hour { len: n, twelve: false });
                i += n;
            }
            's' => {
                let n = run('s');
                tokens.push(DateToken::Second(n));
                i += n;
            }
            'm' => {
                let n = run('m');
                ambiguous_m.push(tokens.len());
                tokens.push(DateToken::Month(n));
                i += n;
            }
            'a' => {
                if starts_with_ignore_case(&chars[i..], "am/pm") {
                    tokens.push(DateToken::AmPm);
                    i += 5;
                } else if starts_with_ignore_case(&chars[i..], "a/p") {
                    tokens.push(DateToken::AP);
                    i += 3;
                } else {
                    return None;
                }
            }
            '0' => {
                let seconds_before = tokens
                    .iter()
                    .rev()
                    .find(|t| !matches!(t, DateToken::Literal(_)))
                    .map(DateToken::is_secondish)
                    .unwrap_or(false);
                if !seconds_before {
                    return None;
                }
                let n = run('0');
                tokens.push(DateToken::Fraction(n));
                i += n;
            }
            ch if ch.is_ascii_alphanumeric() || ch == '#' || ch == '?' || ch == '@' => return None,
            _ => {
                push_literal(&mut tokens, &c.to_string());
                i += 1;
            }
        }
    }

    // `m` is minutes right after an hour or right before a second
    for &idx in &ambiguous_m {
        let n = match tokens[idx] {
            DateToken::Month(n) => n,
            _ => continue,
        };
        if n > 2 {
            continue;
        }
        let prev = tokens[..idx].iter().rev().find(|t| !matches!(t, DateToken::Literal(_)));
        let next = tokens[idx + 1..].iter().find(|t| !matches!(t, DateToken::Literal(_)));
        if prev.map(DateToken::is_hourish).unwrap_or(false) || next.map(DateToken::is_secondish).unwrap_or(false) {
            tokens[idx] = DateToken::Minute(n);
        }
    }

    let twelve = tokens.iter().any(|t| matches!(t, DateToken::AmPm | DateToken::AP));
    for t in tokens.iter_mut() {
        if let DateToken::Hour { twelve: tw, .. } = t {
            *tw = twelve;
        }
    }
    Some((tokens, locale))
}

/// Tokenize a neutral pattern.
fn neutral_tokens(pattern: &str) -> Vec<DateToken> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let n = chars[i..].iter().take_while(|&&x| x == c).count();
        match c {
            '\'' => {
                let end = chars[i + 1..].iter().position(|&x| x == '\'').unwrap_or(chars.len() - i - 1);
                let text: String = chars[i + 1..i + 1 + end].iter().collect();
                push_literal(&mut tokens, &text);
                i += end + 2;
                continue;
            }
            '\\' => {
                if let Some(e) = chars.get(i + 1) {
                    push_literal(&mut tokens, &e.to_string());
                }
                i += 2;
                continue;
            }
            '[' => {
                let end = chars[i + 1..].iter().position(|&x| x == ']');
                match end {
                    Some(end) => {
                        let tag: String = chars[i + 1..i + 1 + end].iter().collect();
                        tokens.push(DateToken::Elapsed(tag));
                        i += end + 2;
                    }
                    None => {
                        let text: String = chars[i..].iter().collect();
                        push_literal(&mut tokens, &text);
                        i = chars.len();
                    }
                }
                continue;
            }
            'y' => tokens.push(DateToken::Year(n)),
            'M' => tokens.push(DateToken::Month(n)),
            'd' => tokens.push(DateToken::Day(n)),
            'H' => tokens.push(DateToken::Hour { len: n, twelve: false }),
            'h' => tokens.push(DateToken::Hour { len: n, twelve: true }),
            'm' => tokens.push(DateToken::Minute(n)),
            's' => tokens.push(DateToken::Second(n)),
            't' => tokens.push(if n == 1 { DateToken::AP } else { DateToken::AmPm }),
            'f' => tokens.push(DateToken::Fraction(n)),
            _ => {
                let text: String = chars[i..i + n].iter().collect();
                push_literal(&mut tokens, &text);
            }
        }
        i += n;
    }
    tokens
}

fn is_plain_literal(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '/' | '-' | ':' | ',' | '.'))
}

fn excel_to_neutral(code: &str) -> Option<(String, Option<String>)> {
    let (tokens, locale) = excel_date_tokens(code)?;
    let mut out = String::new();
    for token in &tokens {
        match token {
            DateToken::Year(n) => out.push_str(if *n <= 2 { "yy" } else { "yyyy" }),
            DateToken::Month(n) if *n <= 4 => out.push_str(&"M".repeat(*n)),
            DateToken::Month(_) => return None,
            DateToken::Day(n) => out.push_str(&"d".repeat((*n).min(4))),
            DateToken::Hour { len, twelve } => {
                out.push_str(&(if *twelve { "h" } else { "H" }).repeat((*len).min(2)))
            }
            DateToken::Minute(n) => out.push_str(&"m".repeat((*n).min(2))),
            DateToken::Second(n) => out.push_str(&"s".repeat((*n).min(2))),
            DateToken::AmPm => out.push_str("tt"),
            DateToken::AP => out.push('t'),
            DateToken::Fraction(n) => out.push_str(&"f".repeat(*n)),
            DateToken::Elapsed(tag) => {
                out.push('[');
                out.push_str(tag);
                out.push(']');
            }
            DateToken::Literal(text) if is_plain_literal(text) => out.push_str(text),
            DateToken::Literal(text) if !text.contains('\'') => {
                out.push('\'');
                out.push_str(text);
                out.push('\'');
            }
            DateToken::Literal(text) => {
                for c in text.chars() {
                    out.push('\\');
                    out.push(c);
                }
            }
        }
    }
    Some((out, locale))
}

fn neutral_to_excel(pattern: &str) -> String {
    let mut out = String::new();
    for token in neutral_tokens(pattern) {
        match token {
            DateToken::Year(n) => out.push_str(if n <= 2 { "yy" } else { "yyyy" }),
            DateToken::Month(n) => out.push_str(&"m".repeat(n.min(5))),
            DateToken::Day(n) => out.push_str(&"d".repeat(n.min(4))),
            DateToken::Hour { len, .. } => out.push_str(&"h".repeat(len.min(2))),
            DateToken::Minute(n) => out.push_str(&"m".repeat(n.min(2))),
            DateToken::Second(n) => out.push_str(&"s".repeat(n.min(2))),
            DateToken::AmPm => out.push_str("AM/PM"),
            DateToken::AP => out.push_str("A/P"),
            DateToken::Fraction(n) => out.push_str(&"0".repeat(n)),
            DateToken::Elapsed(tag) => {
                out.push('[');
                out.push_str(&tag);
                out.push(']');
            }
            DateToken::Literal(text) if is_plain_literal(&text) => out.push_str(&text),
            DateToken::Literal(text) => out.push_str(&quote_literal(&text)),
        }
    }
    out
}

const MONTHS: [&str; 12] = [
    "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];
const WEEKDAYS: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];

/// Render a date serial through a neutral pattern.
pub fn render_datetime(pattern: &str, serial: f64) -> Option<String> {
    use chrono::{Datelike, Timelike};

    let dt = units::serial_to_datetime(serial)?;
    let mut out = String::new();
    let two = |v: u32| format!("{:02}", v);
    for token in neutral_tokens(pattern) {
        match token {
            DateToken::Year(n) if n <= 2 => out.push_str(&two((dt.year().rem_euclid(100)) as u32)),
            DateToken::Year(_) => out.push_str(&format!("{:04}", dt.year())),
            DateToken::Month(1) => out.push_str(&dt.month().to_string()),
            DateToken::Month(2) => out.push_str(&two(dt.month())),
            DateToken::Month(3) => out.push_str(&MONTHS[dt.month0() as usize][..3]),
            DateToken::Month(_) => out.push_str(MONTHS[dt.month0() as usize]),
            DateToken::Day(1) => out.push_str(&dt.day().to_string()),
            DateToken::Day(2) => out.push_str(&two(dt.day())),
            DateToken::Day(3) => out.push_str(&WEEKDAYS[dt.weekday().num_days_from_monday() as usize][..3]),
            DateToken::Day(_) => out.push_str(WEEKDAYS[dt.weekday().num_days_from_monday() as usize]),
            DateToken::Hour { len, twelve } => {
                let h = if twelve {
                    match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    }
                } else {
                    dt.hour()
                };
                out.push_str(&if len >= 2 { two(h) } else { h.to_string() });
            }
            DateToken::Minute(n) => {
                out.push_str(&if n >= 2 { two(dt.minute()) } else { dt.minute().to_string() })
            }
            DateToken::Second(n) => {
                out.push_str(&if n >= 2 { two(dt.second()) } else { dt.second().to_string() })
            }
            DateToken::AmPm => out.push_str(if dt.hour() < 12 { "AM" } else { "PM" }),
            DateToken::AP => out.push(if dt.hour() < 12 { 'A' } else { 'P' }),
            DateToken::Fraction(n) => {
                let millis = format!("{:03}", dt.nanosecond() / 1_000_000);
                let digits: String = millis.chars().chain(std::iter::repeat('0')).take(n).collect();
                out.push_str(&digits);
            }
            DateToken::Elapsed(tag) => {
                let unit = match tag.chars().next() {
                    Some('h') | Some('H') => 24.0,
                    Some('m') | Some('M') => 1440.0,
                    _ => 86_400.0,
                };
                let elapsed = (serial * unit + 1e-9).floor() as i64;
                out.push_str(&format!("{:0width$}", elapsed, width = tag.len()));
            }
            DateToken::Literal(text) => out.push_str(&text),
        }
    }
    Some(out)
}
