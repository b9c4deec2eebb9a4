/*
 * facts.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Fact sheet resolution.
//!
//! `[[facts:KEY]]` tags are replaced by a named block of reference text.
//! Providers are looked up through the [`FactSheetProvider`] trait so hosts
//! can supply their own (localized) sheets.

use std::collections::HashMap;

/// A named piece of reference text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactSheet {
    pub name: String,
    pub body: String,
}

impl FactSheet {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        FactSheet {
            name: name.into(),
            body: body.into(),
        }
    }

    /// The text that replaces the tag.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.name, self.body)
    }
}

/// Trait for looking up fact sheets by key.
pub trait FactSheetProvider {
    /// Return the sheet registered under `key`, or `None` if there is none.
    fn lookup(&self, key: &str) -> Option<FactSheet>;
}

/// Provider with no sheets.
#[derive(Debug, Clone, Default)]
pub struct NullFactSheets;

impl FactSheetProvider for NullFactSheets {
    fn lookup(&self, _key: &str) -> Option<FactSheet> {
        None
    }
}

/// Provider backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactSheets {
    sheets: HashMap<String, FactSheet>,
}

impl MemoryFactSheets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, sheet: FactSheet) -> &mut Self {
        self.sheets.insert(key.into(), sheet);
        self
    }

    pub fn with_sheets(sheets: impl IntoIterator<Item = (impl Into<String>, FactSheet)>) -> Self {
        let mut provider = Self::new();
        for (key, sheet) in sheets {
            provider.add(key, sheet);
        }
        provider
    }
}

impl FactSheetProvider for MemoryFactSheets {
    fn lookup(&self, key: &str) -> Option<FactSheet> {
        self.sheets.get(key).cloned()
    }
}

/// `(key, name, body)`
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "calc_diff_linearity_rule",
        "Linearity of differentiation",
        "For constants \\(a\\) and \\(b\\), \
         \\[\\frac{\\mathrm{d}}{\\mathrm{d}x}\\left(a\\,f(x)+b\\,g(x)\\right) \
         = a\\frac{\\mathrm{d}f}{\\mathrm{d}x}+b\\frac{\\mathrm{d}g}{\\mathrm{d}x}.\\]",
    ),
    (
        "calc_product_rule",
        "The product rule",
        "\\[\\frac{\\mathrm{d}}{\\mathrm{d}x}\\left(u\\,v\\right) \
         = u\\frac{\\mathrm{d}v}{\\mathrm{d}x}+v\\frac{\\mathrm{d}u}{\\mathrm{d}x}.\\]",
    ),
    (
        "calc_quotient_rule",
        "The quotient rule",
        "\\[\\frac{\\mathrm{d}}{\\mathrm{d}x}\\left(\\frac{u}{v}\\right) \
         = \\frac{v\\frac{\\mathrm{d}u}{\\mathrm{d}x}-u\\frac{\\mathrm{d}v}{\\mathrm{d}x}}{v^2}.\\]",
    ),
    (
        "calc_chain_rule",
        "The chain rule",
        "If \\(y=f(u)\\) and \\(u=g(x)\\) then \
         \\[\\frac{\\mathrm{d}y}{\\mathrm{d}x}=\\frac{\\mathrm{d}y}{\\mathrm{d}u}\\cdot\\frac{\\mathrm{d}u}{\\mathrm{d}x}.\\]",
    ),
    (
        "calc_int_linearity_rule",
        "Linearity of integration",
        "For constants \\(a\\) and \\(b\\), \
         \\[\\int a\\,f(x)+b\\,g(x)\\,\\mathrm{d}x = a\\int f(x)\\,\\mathrm{d}x+b\\int g(x)\\,\\mathrm{d}x.\\]",
    ),
];

/// The calculus fact sheets shipped with the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFactSheets;

impl BuiltinFactSheets {
    /// Every registered key.
    pub fn keys() -> impl Iterator<Item = &'static str> {
        BUILTIN.iter().map(|(key, _, _)| *key)
    }
}

impl FactSheetProvider for BuiltinFactSheets {
    fn lookup(&self, key: &str) -> Option<FactSheet> {
        BUILTIN
            .iter()
            .find(|(k, _, _)| *k == key)
            .map(|(_, name, body)| FactSheet::new(*name, *body))
    }
}

impl<T: FactSheetProvider + ?Sized> FactSheetProvider for &T {
    fn lookup(&self, key: &str) -> Option<FactSheet> {
        (**self).lookup(key)
    }
}
