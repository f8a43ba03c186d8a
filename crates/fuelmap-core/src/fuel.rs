//! Fuel-code vocabulary: descriptions, canonical petrol/diesel codes and
//! their aliases.
//!
//! The vocabulary is fixed at startup (built-in or from the registry file);
//! codes that appear only in feed data are still priced but never aliased.

use serde::{Deserialize, Serialize};

/// Normalize a fuel code for lookup: trimmed, upper-case.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelCodeEntry {
    pub code: String,
    pub description: String,
}

/// Canonical code for one fuel class plus alias codes tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelClassCodes {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuelClass {
    Petrol,
    Diesel,
}

impl std::fmt::Display for FuelClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelClass::Petrol => write!(f, "petrol"),
            FuelClass::Diesel => write!(f, "diesel"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelCatalog {
    #[serde(default = "default_codes")]
    pub codes: Vec<FuelCodeEntry>,
    #[serde(default = "default_petrol")]
    pub petrol: FuelClassCodes,
    #[serde(default = "default_diesel")]
    pub diesel: FuelClassCodes,
}

impl Default for FuelCatalog {
    fn default() -> Self {
        Self {
            codes: default_codes(),
            petrol: default_petrol(),
            diesel: default_diesel(),
        }
    }
}

impl FuelCatalog {
    /// Alias codes registered for `code` when it is a canonical code.
    ///
    /// Non-canonical codes have no aliases.
    #[must_use]
    pub fn aliases_for(&self, code: &str) -> &[String] {
        let code = normalize_code(code);
        if code == normalize_code(&self.petrol.canonical) {
            &self.petrol.aliases
        } else if code == normalize_code(&self.diesel.canonical) {
            &self.diesel.aliases
        } else {
            &[]
        }
    }

    /// Human description of a code, or the trimmed code when it is unknown.
    #[must_use]
    pub fn describe(&self, code: &str) -> String {
        let normalized = normalize_code(code);
        self.codes
            .iter()
            .find(|entry| normalize_code(&entry.code) == normalized)
            .map_or_else(|| code.trim().to_string(), |entry| entry.description.clone())
    }

    /// Fuel class a code belongs to, for spread summaries.
    ///
    /// Petrol covers E10, E5 and the petrol aliases; diesel covers B7, SDV and
    /// the diesel aliases.
    #[must_use]
    pub fn class_of(&self, code: &str) -> Option<FuelClass> {
        let code = normalize_code(code);
        let in_class = |codes: &FuelClassCodes, premium: &str| {
            code == normalize_code(&codes.canonical)
                || code == premium
                || codes.aliases.iter().any(|a| normalize_code(a) == code)
        };
        if in_class(&self.petrol, "E5") {
            Some(FuelClass::Petrol)
        } else if in_class(&self.diesel, "SDV") {
            Some(FuelClass::Diesel)
        } else {
            None
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        for (label, codes) in [("petrol", &self.petrol), ("diesel", &self.diesel)] {
            if codes.canonical.trim().is_empty() {
                return Err(format!("{label} canonical code must be non-empty"));
            }
            if codes.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(format!("{label} aliases must be non-empty codes"));
            }
        }
        if normalize_code(&self.petrol.canonical) == normalize_code(&self.diesel.canonical) {
            return Err("petrol and diesel canonical codes must differ".to_string());
        }
        Ok(())
    }
}

/// Which fuel drives price colouring; `None` disables the scale.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FuelSelection {
    #[default]
    None,
    Code(String),
}

impl FuelSelection {
    /// Parse a user-facing selection; `"none"` (any case) and blank mean `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let code = normalize_code(raw);
        if code.is_empty() || code == "NONE" {
            FuelSelection::None
        } else {
            FuelSelection::Code(code)
        }
    }

    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            FuelSelection::None => None,
            FuelSelection::Code(code) => Some(code),
        }
    }
}

impl std::fmt::Display for FuelSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FuelSelection::None => write!(f, "none"),
            FuelSelection::Code(code) => write!(f, "{code}"),
        }
    }
}

fn default_codes() -> Vec<FuelCodeEntry> {
    [
        ("E5", "Premium Unleaded (E5)"),
        ("E10", "Unleaded (E10)"),
        ("B7", "Diesel (B7)"),
        ("SDV", "Super Diesel"),
        ("UNL", "Unleaded"),
        ("DSL", "Diesel"),
        ("PUL", "Premium Unleaded"),
        ("SUL", "Super Unleaded"),
        ("PDL", "Premium Diesel"),
    ]
    .into_iter()
    .map(|(code, description)| FuelCodeEntry {
        code: code.to_string(),
        description: description.to_string(),
    })
    .collect()
}

fn default_petrol() -> FuelClassCodes {
    FuelClassCodes {
        canonical: "E10".to_string(),
        aliases: vec!["UNL".to_string()],
    }
}

fn default_diesel() -> FuelClassCodes {
    FuelClassCodes {
        canonical: "B7".to_string(),
        aliases: vec!["DSL".to_string()],
    }
}
