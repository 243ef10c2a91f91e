//! Version ordering compatible with the one game builds have always been
//! compared with (`v3.4.0-dev < v3.4.0 < v3.4.1`).
//!
//! A version is split into parts at `.`, `-`, `_`, `+` and at every switch
//! between digits and non-digits. Numeric parts compare numerically, other
//! parts by their release stage (`dev < alpha < beta < rc < # < pl`, where `#`
//! stands for any number). Unknown words sort below `dev`, and an empty
//! version below everything.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Part<'a> {
    Number(u64),
    Word(&'a str),
}

fn split(version: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let bytes = version.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        if matches!(bytes[start], b'.' | b'-' | b'_' | b'+') {
            start += 1;
            continue;
        }
        let digit = bytes[start].is_ascii_digit();
        let mut end = start;
        while end < bytes.len()
            && bytes[end].is_ascii_digit() == digit
            && !matches!(bytes[end], b'.' | b'-' | b'_' | b'+')
        {
            end += 1;
        }
        let text = &version[start..end];
        parts.push(if digit {
            Part::Number(text.parse().unwrap_or(u64::MAX))
        } else {
            Part::Word(text)
        });
        start = end;
    }
    parts
}

fn stage(word: &str) -> i32 {
    const STAGES: &[(&str, i32)] = &[
        ("dev", 0),
        ("alpha", 1),
        ("a", 1),
        ("beta", 2),
        ("b", 2),
        ("RC", 3),
        ("rc", 3),
        ("#", 4),
        ("pl", 5),
        ("p", 5),
    ];
    STAGES
        .iter()
        .find(|(name, _)| word.starts_with(name))
        .map(|(_, rank)| *rank)
        .unwrap_or(-6)
}

fn compare_parts(a: &Part<'_>, b: &Part<'_>) -> Ordering {
    match (a, b) {
        (Part::Number(x), Part::Number(y)) => x.cmp(y),
        (Part::Word(x), Part::Word(y)) => stage(x).cmp(&stage(y)),
        (Part::Number(_), Part::Word(y)) => stage("#").cmp(&stage(y)),
        (Part::Word(x), Part::Number(_)) => stage(x).cmp(&stage("#")),
    }
}

// A trailing number makes the longer version newer; a trailing word is ranked against "#".
fn compare_tail(extra: &Part<'_>) -> Ordering {
    match extra {
        Part::Number(_) => Ordering::Less,
        Part::Word(w) => stage("#").cmp(&stage(w)),
    }
}

pub fn compare(left: &str, right: &str) -> Ordering {
    // A missing version is older than any reported one.
    match (left.is_empty(), right.is_empty()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        (false, false) => {}
    }

    let a = split(left);
    let b = split(right);

    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare_parts(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    match a.len().cmp(&b.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Less => compare_tail(&b[a.len()]),
        Ordering::Greater => compare_tail(&a[b.len()]).reverse(),
    }
}

pub fn is_older(version: &str, than: &str) -> bool {
    compare(version, than) == Ordering::Less
}
