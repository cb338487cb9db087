//! Countries that substations can be attached to.
//!
//! CGMES carries the country only indirectly, as the name of the geographical
//! region a substation belongs to. [`Country::from_region_name`] accepts either
//! the ISO 3166 alpha-2 code or the English short name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Al,
    At,
    Ba,
    Be,
    Bg,
    Ch,
    Cy,
    Cz,
    De,
    Dk,
    Ee,
    Es,
    Fi,
    Fr,
    Gb,
    Gr,
    Hr,
    Hu,
    Ie,
    It,
    Lt,
    Lu,
    Lv,
    Md,
    Me,
    Mk,
    Mt,
    Nl,
    No,
    Pl,
    Pt,
    Ro,
    Rs,
    Se,
    Si,
    Sk,
    Tr,
    Ua,
}

const COUNTRIES: &[(Country, &str, &str)] = &[
    (Country::Al, "AL", "Albania"),
    (Country::At, "AT", "Austria"),
    (Country::Ba, "BA", "Bosnia and Herzegovina"),
    (Country::Be, "BE", "Belgium"),
    (Country::Bg, "BG", "Bulgaria"),
    (Country::Ch, "CH", "Switzerland"),
    (Country::Cy, "CY", "Cyprus"),
    (Country::Cz, "CZ", "Czechia"),
    (Country::De, "DE", "Germany"),
    (Country::Dk, "DK", "Denmark"),
    (Country::Ee, "EE", "Estonia"),
    (Country::Es, "ES", "Spain"),
    (Country::Fi, "FI", "Finland"),
    (Country::Fr, "FR", "France"),
    (Country::Gb, "GB", "United Kingdom"),
    (Country::Gr, "GR", "Greece"),
    (Country::Hr, "HR", "Croatia"),
    (Country::Hu, "HU", "Hungary"),
    (Country::Ie, "IE", "Ireland"),
    (Country::It, "IT", "Italy"),
    (Country::Lt, "LT", "Lithuania"),
    (Country::Lu, "LU", "Luxembourg"),
    (Country::Lv, "LV", "Latvia"),
    (Country::Md, "MD", "Moldova"),
    (Country::Me, "ME", "Montenegro"),
    (Country::Mk, "MK", "North Macedonia"),
    (Country::Mt, "MT", "Malta"),
    (Country::Nl, "NL", "Netherlands"),
    (Country::No, "NO", "Norway"),
    (Country::Pl, "PL", "Poland"),
    (Country::Pt, "PT", "Portugal"),
    (Country::Ro, "RO", "Romania"),
    (Country::Rs, "RS", "Serbia"),
    (Country::Se, "SE", "Sweden"),
    (Country::Si, "SI", "Slovenia"),
    (Country::Sk, "SK", "Slovakia"),
    (Country::Tr, "TR", "Turkey"),
    (Country::Ua, "UA", "Ukraine"),
];

impl Country {
    /// Resolve a geographical region name to a country.
    pub fn from_region_name(name: &str) -> Option<Country> {
        let name = name.trim();
        COUNTRIES
            .iter()
            .find(|(_, code, english)| {
                code.eq_ignore_ascii_case(name) || english.eq_ignore_ascii_case(name)
            })
            .map(|(country, _, _)| *country)
    }

    /// ISO 3166 alpha-2 code
    pub fn code(&self) -> &'static str {
        COUNTRIES
            .iter()
            .find(|(country, _, _)| country == self)
            .map(|(_, code, _)| *code)
            .unwrap_or("??")
    }
}

impl std::fmt::Display for Country {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
