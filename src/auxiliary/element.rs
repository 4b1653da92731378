//! Look-up of chemical element symbols.

use std::collections::HashMap;

use periodic_table;

#[cfg(test)]
#[path = "element_tests.rs"]
mod element_tests;

/// A struct storing a look-up of element symbols to give atomic numbers and atomic masses.
pub struct ElementMap<'a> {
    /// A [`HashMap`] from a symbol string to a tuple of atomic number and atomic mass.
    pub map: HashMap<&'a str, (u32, f64)>,
}

impl Default for ElementMap<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl ElementMap<'static> {
    /// Creates a new [`ElementMap`] for all elements in the periodic table.
    #[must_use]
    pub fn new() -> ElementMap<'static> {
        let map = periodic_table::periodic_table()
            .into_iter()
            .map(|element| {
                (
                    element.symbol,
                    (element.atomic_number, parse_atomic_mass(element.atomic_mass)),
                )
            })
            .collect::<HashMap<_, _>>();
        ElementMap { map }
    }
}

impl<'a> ElementMap<'a> {
    /// Checks if `symbol` is a known element symbol.
    #[must_use]
    pub fn contains(&self, symbol: &str) -> bool {
        self.map.contains_key(symbol)
    }

    /// Returns the atomic number of the element with symbol `symbol`, if known.
    #[must_use]
    pub fn atomic_number(&self, symbol: &str) -> Option<u32> {
        self.map.get(symbol).map(|(z, _)| *z)
    }
}

/// Normalises a raw species string such as `fe3+` or `O2-` into an element symbol with its first
/// letter in upper case and the rest in lower case, discarding digits, signs and punctuation.
///
/// # Arguments
///
/// * `raw` - The raw species string.
///
/// # Returns
///
/// The normalised symbol. This may be empty if `raw` contains no letters.
#[must_use]
pub fn normalise_element_symbol(raw: &str) -> String {
    let letters = raw
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>();
    let mut chars = letters.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Parses the atomic mass string in the format of [`periodic_table`] to a single float value.
///
/// # Arguments
///
/// * `mass_str` - A string of mass value that is either `x.y(z)` where the uncertain digit `z` is
///   enclosed in parentheses, or `[x]` where `x` is the mass number in place of precise
///   experimental values.
///
/// # Returns
///
/// The numeric mass value, or `NaN` if the string cannot be parsed.
fn parse_atomic_mass(mass_str: &str) -> f64 {
    let mass = mass_str.replace(&['(', ')', '[', ']'][..], "");
    mass.parse::<f64>().unwrap_or(f64::NAN)
}
