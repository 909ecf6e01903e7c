//! Разбор одной строки товара в пару (название, количество).
//!
//! Грамматики проверяются по порядку, побеждает первая давшая
//! непустое название и положительное количество:
//! 1. `название:количество<ед.>` (двоеточие ASCII или полноширинное);
//! 2. `название<2+ пробела/таба>количество`;
//! 3. `название<количество>[件]` в конце строки.

use contracts::usecases::u508_fill_order_template::LineItem;
use once_cell::sync::Lazy;
use regex::Regex;

static FIRST_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("integer regex must compile"));

static SPACED_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s{2,}([0-9]+)$").expect("spaced quantity regex must compile")
});

static SUFFIX_QUANTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)([0-9]+)件?$").expect("suffix quantity regex must compile")
});

fn positive_quantity(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|q| *q > 0)
}

fn accept(name: &str, digits: &str) -> Option<LineItem> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    positive_quantity(digits).map(|quantity| LineItem {
        raw_name: name.to_string(),
        quantity,
    })
}

fn parse_label(line: &str) -> Option<LineItem> {
    let (name, rest) = line.split_once([':', '：'])?;
    let digits = FIRST_INTEGER.find(rest)?;
    accept(name, digits.as_str())
}

fn parse_spaced(line: &str) -> Option<LineItem> {
    let caps = SPACED_QUANTITY.captures(line)?;
    accept(&caps[1], &caps[2])
}

fn parse_suffix(line: &str) -> Option<LineItem> {
    let caps = SUFFIX_QUANTITY.captures(line)?;
    accept(&caps[1], &caps[2])
}

/// Никогда не падает: нераспознанная строка дает `None`.
pub fn parse_line(line: &str) -> Option<LineItem> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    parse_label(line)
        .or_else(|| parse_spaced(line))
        .or_else(|| parse_suffix(line))
}
