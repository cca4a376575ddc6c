// sanifix-core/src/probes.rs
//! Adversarial probe strings for the safety classifier.
//!
//! For each rule we derive short *witnesses*, strings its pattern matches, by
//! walking the pattern's HIR (the `regex-syntax` high-level IR, which already
//! accounts for flags such as case folding):
//!
//! * literals are copied verbatim,
//! * a class contributes one representative character (printable if possible),
//! * a repetition contributes `min` and, when allowed, `min + 1` copies,
//! * every alternation branch yields its own witness,
//! * look-around assertions contribute nothing.
//!
//! Witnesses the compiled rule does not actually match (anchors and word
//! boundaries can defeat the walk) are dropped. Probes are then built by
//! doubling witnesses and splicing one witness into every character split of
//! another, which is exactly how a one-shot deletion exposes a new match.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex_syntax::hir::{Class, Hir, HirKind, Literal};

use crate::rule::Rule;
use crate::rule_set::RuleSet;

/// Witnesses kept per rule.
pub const MAX_WITNESSES_PER_RULE: usize = 8;
/// Total probes generated for one rule set.
pub const MAX_PROBES: usize = 512;
/// Longest witness considered, in bytes.
const MAX_WITNESS_LEN: usize = 256;
/// Copies emitted for a repetition, regardless of its minimum.
const MAX_REPEAT: u32 = 16;

fn representative(class: &Class) -> Option<char> {
    match class {
        Class::Unicode(ranges) => {
            let mut fallback = None;
            for range in ranges.iter() {
                for c in range.start()..=range.end() {
                    if c.is_ascii_graphic() || c == ' ' {
                        return Some(c);
                    }
                    if c as u32 > 0x7F {
                        break;
                    }
                }
                fallback = fallback.or(Some(range.start()));
            }
            fallback
        }
        Class::Bytes(ranges) => {
            let mut fallback = None;
            for range in ranges.iter() {
                for b in range.start()..=range.end() {
                    if b.is_ascii_graphic() || b == b' ' {
                        return Some(b as char);
                    }
                }
                if range.start().is_ascii() {
                    fallback = fallback.or(Some(range.start() as char));
                }
            }
            fallback
        }
    }
}

fn concat_all(left: &[String], right: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for l in left {
        for r in right {
            if out.len() >= MAX_WITNESSES_PER_RULE {
                return out;
            }
            if l.len() + r.len() <= MAX_WITNESS_LEN {
                out.push(format!("{l}{r}"));
            }
        }
    }
    out
}

fn hir_witnesses(hir: &Hir) -> Vec<String> {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => vec![String::new()],
        HirKind::Literal(Literal(bytes)) => match std::str::from_utf8(bytes) {
            Ok(s) => vec![s.to_string()],
            Err(_) => Vec::new(),
        },
        HirKind::Class(class) => representative(class)
            .map(|c| vec![c.to_string()])
            .unwrap_or_default(),
        HirKind::Capture(cap) => hir_witnesses(&cap.sub),
        HirKind::Repetition(rep) => {
            let sub = hir_witnesses(&rep.sub);
            let min = rep.min.min(MAX_REPEAT);
            let mut counts = vec![min];
            if rep.max.map_or(true, |max| max > rep.min) && min < MAX_REPEAT {
                counts.push(min + 1);
            }
            let mut out = Vec::new();
            for count in counts {
                for w in &sub {
                    let repeated = w.repeat(count as usize);
                    if repeated.len() <= MAX_WITNESS_LEN && !out.contains(&repeated) {
                        out.push(repeated);
                    }
                }
            }
            out.truncate(MAX_WITNESSES_PER_RULE);
            out
        }
        HirKind::Concat(subs) => subs
            .iter()
            .fold(vec![String::new()], |acc, sub| concat_all(&acc, &hir_witnesses(sub))),
        HirKind::Alternation(alts) => {
            let mut out = Vec::new();
            for alt in alts {
                for w in hir_witnesses(alt) {
                    if out.len() < MAX_WITNESSES_PER_RULE && !out.contains(&w) {
                        out.push(w);
                    }
                }
            }
            out
        }
    }
}

/// Strings that `rule` matches, derived from its compiled pattern.
pub fn witnesses(rule: &Rule) -> Vec<String> {
    let flags = rule.flags();
    let mut parser = regex_syntax::ParserBuilder::new()
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multiline)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .swap_greed(flags.lazy)
        .build();
    let hir = match parser.parse(rule.regex_source()) {
        Ok(hir) => hir,
        Err(e) => {
            debug!("Could not analyse rule '{}' for witnesses: {}", rule.name(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<String> = hir_witnesses(&hir)
        .into_iter()
        .filter(|w| !w.is_empty() && rule.is_match(w))
        .collect();
    found.dedup();
    debug!("Rule '{}' has {} witness(es).", rule.name(), found.len());
    found
}

/// Every way of inserting `inner` at a character boundary strictly inside `outer`.
fn splices<'a>(outer: &'a str, inner: &str) -> impl Iterator<Item = String> + 'a {
    let inner = inner.to_string();
    outer
        .char_indices()
        .skip(1)
        .map(move |(i, _)| format!("{}{}{}", &outer[..i], inner, &outer[i..]))
}

fn push_probe(probes: &mut Vec<String>, probe: String) -> bool {
    if probes.len() >= MAX_PROBES {
        return false;
    }
    if !probes.contains(&probe) {
        probes.push(probe);
    }
    true
}

/// Builds the adversarial corpus for `rule_set`, capped at [`MAX_PROBES`].
pub fn probe_corpus(rule_set: &RuleSet) -> Vec<String> {
    let mut probes = vec![String::new()];

    for rule in rule_set.rules() {
        let doubled = rule.replacement().repeat(2);
        push_probe(&mut probes, doubled);
    }

    let per_rule: Vec<Vec<String>> = rule_set.rules().iter().map(witnesses).collect();
    let all: Vec<&String> = per_rule.iter().flatten().collect();

    'outer: for w in &all {
        if !push_probe(&mut probes, (*w).clone()) || !push_probe(&mut probes, w.repeat(2)) {
            break;
        }
        for inner in &all {
            for probe in splices(w, inner) {
                if !push_probe(&mut probes, probe) {
                    break 'outer;
                }
            }
        }
    }

    debug!("Generated {} probe(s) for rule set '{}'.", probes.len(), rule_set.name());
    probes
}
