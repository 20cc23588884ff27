//! Material tiers and their breaking thresholds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Material tag carried by every member.
///
/// The three tiers differ only in how far a member may deform before it
/// breaks; higher tiers tolerate a larger deformation ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    /// Low tolerance.
    Wood,
    /// Medium tolerance.
    #[default]
    Steel,
    /// High tolerance.
    Titanium,
}

impl Material {
    /// Every material tier, weakest first.
    pub const ALL: [Material; 3] = [Material::Wood, Material::Steel, Material::Titanium];

    /// Lower-case name used in input documents and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Material::Wood => "wood",
            Material::Steel => "steel",
            Material::Titanium => "titanium",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Material::ALL
            .into_iter()
            .find(|material| material.name().eq_ignore_ascii_case(value))
            .ok_or_else(|| format!("unknown material `{value}`"))
    }
}

/// Maximum deformation ratio per material.
///
/// A member fails in tension above `max_stretch` and in compression below the
/// mirrored ratio `2 - max_stretch`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    /// Threshold for [`Material::Wood`].
    pub wood: f64,
    /// Threshold for [`Material::Steel`].
    pub steel: f64,
    /// Threshold for [`Material::Titanium`].
    pub titanium: f64,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            wood: 1.05,
            steel: 1.10,
            titanium: 1.12,
        }
    }
}

impl MaterialTable {
    /// Look up the maximum stretch ratio for `material`.
    ///
    /// # Examples
    /// ```
    /// use trussim::{Material, MaterialTable};
    ///
    /// let table = MaterialTable::default();
    /// assert_eq!(table.max_stretch(Material::Steel), 1.10);
    /// ```
    #[must_use]
    pub fn max_stretch(&self, material: Material) -> f64 {
        match material {
            Material::Wood => self.wood,
            Material::Steel => self.steel,
            Material::Titanium => self.titanium,
        }
    }

    /// Iterate over each material and its threshold.
    pub fn entries(&self) -> impl Iterator<Item = (Material, f64)> + '_ {
        Material::ALL
            .into_iter()
            .map(move |material| (material, self.max_stretch(material)))
    }
}
