//! Symbol normalization.
//!
//! Knowledge graphs write the same physical symbol many ways: `ΣF`, `F合`,
//! `F_net` and `F` all name the net force; `v₀` and `v_0` the initial
//! velocity. Formula expressions and quantity symbols both pass through
//! [`normalize`] so that distinct notations unify to one ASCII token.

/// Whole-symbol rewrites, applied before the generic rules.
///
/// Longer spellings come first so that `F_net` is not half-rewritten by a
/// shorter entry.
const SYMBOL_ALIASES: &[(&str, &str)] = &[
    ("F_net", "F"),
    ("Fnet", "F"),
    ("F_合", "F"),
    ("F合", "F"),
    ("ΣF", "F"),
    ("∑F", "F"),
    ("Σv", "v"),
    ("∑v", "v"),
    ("Σa", "a"),
    ("∑a", "a"),
    ("ΣE", "E"),
    ("∑E", "E"),
];

/// Greek letters spelled out so every token is ASCII.
const GREEK: &[(char, &str)] = &[
    ('α', "alpha"), ('β', "beta"), ('γ', "gamma"), ('δ', "delta"),
    ('ε', "epsilon"), ('η', "eta"), ('θ', "theta"), ('κ', "kappa"),
    ('λ', "lambda"), ('μ', "mu"), ('ν', "nu"), ('ρ', "rho"),
    ('σ', "sigma"), ('τ', "tau"), ('φ', "phi"), ('ω', "omega"),
    ('Δ', "Delta"), ('Ω', "Omega"), ('Φ', "Phi"),
];

/// Normalize a formula expression or a single symbol.
pub fn normalize(input: &str) -> String {
    let mut s = input.trim().to_string();

    for (alias, canonical) in SYMBOL_ALIASES {
        if s.contains(alias) {
            s = s.replace(alias, canonical);
        }
    }

    let s = rewrite_glyphs(&s);
    let s = collapse_subscripts(&s);
    collapse_letter_superscripts(&s)
}

/// Character-level rewrites: summation glyphs, unicode sub/superscripts,
/// operator glyphs, π, √ and Greek letters.
fn rewrite_glyphs(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            // A leftover summation glyph denotes "total of"; keep the base.
            'Σ' | '∑' => {}
            '·' | '⋅' | '×' => out.push('*'),
            '÷' => out.push('/'),
            '−' | '–' => out.push('-'),
            'π' => out.push_str("pi"),
            '½' => out.push_str("(1/2)"),
            '√' => out.push_str("sqrt"),
            '₀'..='₉' => out.push(subscript_digit(c)),
            'ₐ' => out.push('a'),
            'ₑ' => out.push('e'),
            'ₒ' => out.push('o'),
            'ₓ' => out.push('x'),
            'ₙ' => out.push('n'),
            'ₘ' => out.push('m'),
            'ₜ' => out.push('t'),
            'ₖ' => out.push('k'),
            'ₚ' => out.push('p'),
            'ₛ' => out.push('s'),
            'ₕ' => out.push('h'),
            c if is_superscript(c) => {
                let mut exponent = String::new();
                exponent.push(superscript_char(c));
                while let Some(&next) = chars.peek() {
                    if !is_superscript(next) {
                        break;
                    }
                    exponent.push(superscript_char(next));
                    chars.next();
                }
                if exponent.len() == 1 {
                    out.push('^');
                    out.push_str(&exponent);
                } else {
                    out.push_str("^(");
                    out.push_str(&exponent);
                    out.push(')');
                }
            }
            c => match GREEK.iter().find(|(g, _)| *g == c) {
                Some((_, name)) => out.push_str(name),
                None => out.push(c),
            },
        }
    }
    out
}

fn subscript_digit(c: char) -> char {
    let offset = c as u32 - '₀' as u32;
    char::from_digit(offset, 10).unwrap_or('0')
}

fn is_superscript(c: char) -> bool {
    matches!(c, '⁰' | '¹' | '²' | '³' | '⁴'..='⁹' | '⁻')
}

fn superscript_char(c: char) -> char {
    match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        _ => '-',
    }
}

/// `v_0` → `v0`, `E_k` → `Ek`: an underscore between a letter and an
/// alphanumeric marks a subscript.
fn collapse_subscripts(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            let prev_letter = i > 0 && chars[i - 1].is_alphabetic();
            let next_alnum = chars.get(i + 1).is_some_and(|n| n.is_alphanumeric());
            if prev_letter && next_alnum {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// `E^k` (letter superscript, not a power) → `Ek`.
///
/// Only applies when both sides of `^` are bare letter runs; `v^2` and
/// `e^(x)` are left alone.
fn collapse_letter_superscripts(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == '^' {
            let prev_letter = i > 0 && chars[i - 1].is_ascii_alphabetic();
            let next_letter = chars.get(i + 1).is_some_and(|n| n.is_ascii_alphabetic());
            if prev_letter && next_letter && !follows_pi(&chars[..i]) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// `pi^x` is a power, not a superscript.
fn follows_pi(head: &[char]) -> bool {
    let run: String = head
        .iter()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    run == "pi"
}
