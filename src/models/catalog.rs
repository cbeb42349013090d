//! Static catalog of the nine supported isotherm models.
//!
//! Each entry lists its constants in display order together with the default
//! `[min, max]` search range. Model names match the backend's canonical names,
//! which are also the keys of `parameter_bounds` in a fitting request.

/// One fitted constant and its default search range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub default_min: f64,
    pub default_max: f64,
}

/// Catalog entry for one isotherm model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSpec {
    /// Canonical name sent to the backend.
    pub name: &'static str,
    /// Stable lowercase identifier (`dual_site_langmuir`, ...).
    pub id: &'static str,
    pub description: &'static str,
    /// Plain-text equation.
    pub equation: &'static str,
    pub parameters: &'static [ParameterSpec],
}

impl ModelSpec {
    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

const fn param(name: &'static str, default_min: f64, default_max: f64) -> ParameterSpec {
    ParameterSpec {
        name,
        default_min,
        default_max,
    }
}

pub static MODELS: [ModelSpec; 9] = [
    ModelSpec {
        name: "Langmuir",
        id: "langmuir",
        description: "Monolayer adsorption on homogeneous surfaces with identical sites and finite saturation capacity.",
        equation: "qe = qsat·k·Ce / (1 + k·Ce)",
        parameters: &[param("k", 1e-6, 10.0), param("qsat", 0.0, 100.0)],
    },
    ModelSpec {
        name: "Sips",
        id: "sips",
        description: "Combines Langmuir and Freundlich behavior for heterogeneous surfaces with saturation.",
        equation: "qe = qsat·k·Ce^n / (1 + k·Ce^n)",
        parameters: &[
            param("k", 1e-6, 10.0),
            param("qsat", 0.0, 100.0),
            param("exponent", 0.1, 10.0),
        ],
    },
    ModelSpec {
        name: "Freundlich",
        id: "freundlich",
        description: "Empirical power-law isotherm for heterogeneous surfaces without explicit saturation.",
        equation: "qe = k·Ce^(1/n)",
        parameters: &[param("k", 1e-6, 10.0), param("exponent", 0.1, 10.0)],
    },
    ModelSpec {
        name: "Temkin",
        id: "temkin",
        description: "Accounts for adsorbate interactions with heat of adsorption decreasing linearly with coverage.",
        equation: "qe = β·ln(k·Ce)",
        parameters: &[param("k", 1e-6, 10.0), param("beta", 0.1, 10.0)],
    },
    ModelSpec {
        name: "Toth",
        id: "toth",
        description: "Modified Langmuir for heterogeneous surfaces with improved fit at high loading.",
        equation: "qe = qsat·k·Ce / (1 + (k·Ce)^n)^(1/n)",
        parameters: &[
            param("k", 1e-6, 10.0),
            param("qsat", 0.0, 100.0),
            param("exponent", 0.1, 10.0),
        ],
    },
    ModelSpec {
        name: "Dubinin-Radushkevich",
        id: "dubinin_radushkevich",
        description: "Micropore filling model based on Polanyi potential theory for porous solids.",
        equation: "qe = qsat·exp(-β·ε²)",
        parameters: &[param("qsat", 0.0, 100.0), param("beta", 1e-6, 10.0)],
    },
    ModelSpec {
        name: "Dual-Site Langmuir",
        id: "dual_site_langmuir",
        description: "Two independent site families with separate capacities; total loading is their sum.",
        equation: "qe = qsat1·k1·Ce / (1 + k1·Ce) + qsat2·k2·Ce / (1 + k2·Ce)",
        parameters: &[
            param("k1", 1e-6, 10.0),
            param("qsat1", 0.0, 100.0),
            param("k2", 1e-6, 10.0),
            param("qsat2", 0.0, 100.0),
        ],
    },
    ModelSpec {
        name: "Redlich-Peterson",
        id: "redlich_peterson",
        description: "Empirical model interpolating between Langmuir and Freundlich over broad ranges.",
        equation: "qe = k·Ce / (1 + a·Ce^β)",
        parameters: &[
            param("k", 1e-6, 10.0),
            param("a", 1e-6, 10.0),
            param("beta", 0.1, 1.0),
        ],
    },
    ModelSpec {
        name: "Jovanovic",
        id: "jovanovic",
        description: "Monolayer isotherm with exponential approach to saturation, suited for rigid adsorbents.",
        equation: "qe = qsat·(1 - exp(-k·Ce))",
        parameters: &[param("k", 1e-6, 10.0), param("qsat", 0.0, 100.0)],
    },
];

/// Look up a model by canonical name or id, ignoring case.
///
/// `"dual-site langmuir"`, `"Dual-Site Langmuir"` and `"dual_site_langmuir"`
/// all resolve to the same entry.
pub fn find(name: &str) -> Option<&'static ModelSpec> {
    let wanted = name.trim();
    MODELS.iter().find(|m| {
        m.name.eq_ignore_ascii_case(wanted)
            || m.id.eq_ignore_ascii_case(wanted)
            || m.id.eq_ignore_ascii_case(&wanted.replace(['-', ' '], "_"))
    })
}

/// Canonical model names in catalog order.
pub fn model_names() -> impl Iterator<Item = &'static str> {
    MODELS.iter().map(|m| m.name)
}
