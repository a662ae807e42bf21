//! Tidies upstream town, address and station name strings for display.
//!
//! Upstream text is mostly upper case and full of abbreviations. Each
//! normaliser capitalises words fully, drops noise (`Cedex` suffixes, `/12`
//! address complements) and then expands abbreviations in a single pass.

const TOWN_WORD_DELIMITERS: &[char] = &[' ', '-', '\'', '/'];
const ADDRESS_WORD_DELIMITERS: &[char] = &[' ', '-', '\''];
const NAME_WORD_DELIMITERS: &[char] = &[' ', '-'];

const TOWN_CEDEX: &str = " Cedex";

const TOWN_REPLACEMENTS: &[(&str, &str)] = &[("Mt ", "Mont "), ("S/", "Sur "), ("/", ",")];

const ADDRESS_REPLACEMENTS: &[(&str, &str)] = &[
    ("Bld.", "Boulevard "),
    ("Bld ", "Boulevard "),
    ("Bd ", "Boulevard "),
    ("Av.", "Avenue "),
    ("Av ", "Avenue "),
    ("Ave ", "Avenue "),
    ("Rn ", "RN "),
    ("Rd ", "RD "),
    ("Za ", "Z.A. "),
    ("Zac ", "Z.A.C. "),
    (",", ""),
    ("S/ ", "Sur "),
    ("/", ","),
];

const NAME_REPLACEMENTS: &[(&str, &str)] = &[
    ("Sas ", "S.A.S. "),
    ("Sarl", "S.A.R.L."),
    ("E.leclerc", "Leclerc"),
    ("rmarche", "rmarché"),
    ("Geant ", "Géant "),
];

pub fn normalise_town(town: &str) -> String {
    let mut town = capitalise_fully(town, TOWN_WORD_DELIMITERS);
    if let Some(at) = town.find(TOWN_CEDEX) {
        town.truncate(at);
    }
    replace_each(&town, TOWN_REPLACEMENTS)
}

pub fn normalise_address(address: &str) -> String {
    let address = capitalise_fully(address, ADDRESS_WORD_DELIMITERS);
    replace_each(&strip_numbered_complements(&address), ADDRESS_REPLACEMENTS)
}

pub fn normalise_station_name(name: &str) -> String {
    replace_each(&capitalise_fully(name, NAME_WORD_DELIMITERS), NAME_REPLACEMENTS)
}

/// Upper-cases the first character of every word and lower-cases the rest.
fn capitalise_fully(text: &str, delimiters: &[char]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if delimiters.contains(&c) {
            out.push(c);
            word_start = true;
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Removes `/` immediately followed by digits, e.g. `Rn 7/12` becomes `Rn 7`.
fn strip_numbered_complements(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek().is_some_and(char::is_ascii_digit) {
            while chars.next_if(char::is_ascii_digit).is_some() {}
        } else {
            out.push(c);
        }
    }
    out
}

/// Replaces every occurrence of each pattern in one left-to-right pass, so a
/// replacement is never matched again. When several patterns match at the
/// same position the first listed wins.
fn replace_each(text: &str, replacements: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let next = replacements
            .iter()
            .filter_map(|&(from, to)| rest.find(from).map(|at| (at, from, to)))
            .min_by_key(|&(at, _, _)| at);

        match next {
            Some((at, from, to)) => {
                out.push_str(&rest[..at]);
                out.push_str(to);
                rest = &rest[at + from.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
