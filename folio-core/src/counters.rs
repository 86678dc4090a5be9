//! Counters in several numbering styles.
//!
//! A counter is an iterator of labels: `new_counter("a")` yields `a`, `b`,
//! ... `z`, `aa`, `ab`. Labels select the style: `1 a A i I g G *`.

const LATIN_LETTERS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const GREEK_LETTERS: &[char] = &[
    'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ', 'σ', 'τ',
    'υ', 'φ', 'χ', 'ψ', 'ω',
];
const SYMBOL_MARKERS: &[char] = &['*', '†', '‡', '§', '‖', '¶'];

/// Roman numerals restart at I after this.
const ROMAN_MAX: u64 = 4999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStyle {
    Numbers,
    Letters { uppercase: bool },
    Greek { uppercase: bool },
    Roman { uppercase: bool },
    Symbols,
}

impl CounterStyle {
    /// Style for a counter label; anything unknown counts in numbers.
    pub fn from_label(label: &str) -> Self {
        match label {
            "a" => CounterStyle::Letters { uppercase: false },
            "A" => CounterStyle::Letters { uppercase: true },
            "g" => CounterStyle::Greek { uppercase: false },
            "G" => CounterStyle::Greek { uppercase: true },
            "i" => CounterStyle::Roman { uppercase: false },
            "I" => CounterStyle::Roman { uppercase: true },
            "*" => CounterStyle::Symbols,
            _ => CounterStyle::Numbers,
        }
    }
}

pub fn is_counter_label(label: &str) -> bool {
    matches!(label, "1" | "a" | "A" | "g" | "G" | "i" | "I" | "*")
}

/// Iterator over the labels of one counter style.
#[derive(Debug, Clone)]
pub struct Counter {
    style: CounterStyle,
    next: u64,
}

impl Counter {
    pub fn new(style: CounterStyle) -> Self {
        Self { style, next: 1 }
    }

    pub fn numbers() -> Self {
        Self::new(CounterStyle::Numbers)
    }

    pub fn letters() -> Self {
        Self::new(CounterStyle::Letters { uppercase: false })
    }

    pub fn roman() -> Self {
        Self::new(CounterStyle::Roman { uppercase: false })
    }

    pub fn symbols() -> Self {
        Self::new(CounterStyle::Symbols)
    }

    pub fn style(&self) -> CounterStyle {
        self.style
    }

    /// Label for the nth item (1-based) in this counter's style.
    pub fn label(&self, n: u64) -> String {
        match self.style {
            CounterStyle::Numbers => n.to_string(),
            CounterStyle::Letters { uppercase } => case(letters(n, LATIN_LETTERS), uppercase),
            CounterStyle::Greek { uppercase } => case(letters(n, GREEK_LETTERS), uppercase),
            CounterStyle::Roman { uppercase } => {
                let numeral = to_roman((n - 1) % ROMAN_MAX + 1);
                if uppercase {
                    numeral
                } else {
                    numeral.to_lowercase()
                }
            }
            CounterStyle::Symbols => {
                let len = SYMBOL_MARKERS.len() as u64;
                let symbol = SYMBOL_MARKERS[((n - 1) % len) as usize];
                std::iter::repeat(symbol)
                    .take(((n - 1) / len + 1) as usize)
                    .collect()
            }
        }
    }
}

impl Iterator for Counter {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let label = self.label(self.next);
        self.next += 1;
        Some(label)
    }
}

/// Factory: creates a counter by its label. Unknown labels count in numbers.
pub fn new_counter(label: &str) -> Counter {
    Counter::new(CounterStyle::from_label(label))
}

fn case(text: String, uppercase: bool) -> String {
    if uppercase {
        text.to_uppercase()
    } else {
        text
    }
}

/// Bijective base-k: a, b, ... z, aa, ab, ... az, ba, ...
fn letters(mut n: u64, pool: &[char]) -> String {
    let base = pool.len() as u64;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(pool[(n % base) as usize]);
        n /= base;
    }
    out.iter().rev().collect()
}

fn to_roman(mut n: u64) -> String {
    const TABLE: &[(u64, &str)] = &[
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for &(value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}
