//! Canonical region taxonomy and label reconciliation.
//!
//! The three sources name regions three different ways: the election table
//! uses provinces, the GDP table prefixes numeric codes and sometimes ships
//! mojibake, and the education CSV uses the statistics agency's inverted
//! "Madrid, Comunidad de" form. Everything funnels into [`Ccaa`] here.

use encoding_rs::WINDOWS_1252;

/// The 17 autonomous communities plus the 2 autonomous cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ccaa {
    Andalucia,
    Aragon,
    Asturias,
    IllesBalears,
    Canarias,
    Cantabria,
    CastillaYLeon,
    CastillaLaMancha,
    Cataluna,
    ComunitatValenciana,
    Extremadura,
    Galicia,
    Madrid,
    Murcia,
    Navarra,
    PaisVasco,
    LaRioja,
    Ceuta,
    Melilla,
}

pub const ALL: [Ccaa; 19] = [
    Ccaa::Andalucia,
    Ccaa::Aragon,
    Ccaa::Asturias,
    Ccaa::IllesBalears,
    Ccaa::Canarias,
    Ccaa::Cantabria,
    Ccaa::CastillaYLeon,
    Ccaa::CastillaLaMancha,
    Ccaa::Cataluna,
    Ccaa::ComunitatValenciana,
    Ccaa::Extremadura,
    Ccaa::Galicia,
    Ccaa::Madrid,
    Ccaa::Murcia,
    Ccaa::Navarra,
    Ccaa::PaisVasco,
    Ccaa::LaRioja,
    Ccaa::Ceuta,
    Ccaa::Melilla,
];

impl Ccaa {
    /// Canonical label, the spelling every source must reconcile to.
    pub fn name(&self) -> &'static str {
        match self {
            Ccaa::Andalucia => "Andalucía",
            Ccaa::Aragon => "Aragón",
            Ccaa::Asturias => "Principado de Asturias",
            Ccaa::IllesBalears => "Illes Balears",
            Ccaa::Canarias => "Canarias",
            Ccaa::Cantabria => "Cantabria",
            Ccaa::CastillaYLeon => "Castilla y León",
            Ccaa::CastillaLaMancha => "Castilla-La Mancha",
            Ccaa::Cataluna => "Cataluña",
            Ccaa::ComunitatValenciana => "Comunitat Valenciana",
            Ccaa::Extremadura => "Extremadura",
            Ccaa::Galicia => "Galicia",
            Ccaa::Madrid => "Comunidad de Madrid",
            Ccaa::Murcia => "Región de Murcia",
            Ccaa::Navarra => "Comunidad Foral de Navarra",
            Ccaa::PaisVasco => "País Vasco",
            Ccaa::LaRioja => "La Rioja",
            Ccaa::Ceuta => "Ceuta",
            Ccaa::Melilla => "Melilla",
        }
    }

    /// Exact canonical-label lookup. Labels must already be repaired; this
    /// does no cleaning of its own.
    pub fn from_name(name: &str) -> Option<Ccaa> {
        ALL.iter().copied().find(|c| c.name() == name)
    }

    pub fn from_province(province: &str) -> Option<Ccaa> {
        PROVINCE_TO_CCAA
            .iter()
            .find(|(p, _)| *p == province)
            .map(|(_, c)| *c)
    }
}

impl std::fmt::Display for Ccaa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Province names as the election table spells them, including the Catalan,
/// Valencian and Basque doublets and the agency's "Coruña, A" inversion.
static PROVINCE_TO_CCAA: &[(&str, Ccaa)] = &[
    ("Almería", Ccaa::Andalucia),
    ("Cádiz", Ccaa::Andalucia),
    ("Córdoba", Ccaa::Andalucia),
    ("Granada", Ccaa::Andalucia),
    ("Huelva", Ccaa::Andalucia),
    ("Jaén", Ccaa::Andalucia),
    ("Málaga", Ccaa::Andalucia),
    ("Sevilla", Ccaa::Andalucia),
    ("Huesca", Ccaa::Aragon),
    ("Teruel", Ccaa::Aragon),
    ("Zaragoza", Ccaa::Aragon),
    ("Asturias", Ccaa::Asturias),
    ("Illes Balears", Ccaa::IllesBalears),
    ("Baleares", Ccaa::IllesBalears),
    ("Las Palmas", Ccaa::Canarias),
    ("Santa Cruz de Tenerife", Ccaa::Canarias),
    ("Cantabria", Ccaa::Cantabria),
    ("Ávila", Ccaa::CastillaYLeon),
    ("Avila", Ccaa::CastillaYLeon),
    ("Burgos", Ccaa::CastillaYLeon),
    ("León", Ccaa::CastillaYLeon),
    ("Palencia", Ccaa::CastillaYLeon),
    ("Salamanca", Ccaa::CastillaYLeon),
    ("Segovia", Ccaa::CastillaYLeon),
    ("Soria", Ccaa::CastillaYLeon),
    ("Valladolid", Ccaa::CastillaYLeon),
    ("Zamora", Ccaa::CastillaYLeon),
    ("Albacete", Ccaa::CastillaLaMancha),
    ("Ciudad Real", Ccaa::CastillaLaMancha),
    ("Cuenca", Ccaa::CastillaLaMancha),
    ("Guadalajara", Ccaa::CastillaLaMancha),
    ("Toledo", Ccaa::CastillaLaMancha),
    ("Barcelona", Ccaa::Cataluna),
    ("Girona", Ccaa::Cataluna),
    ("Lleida", Ccaa::Cataluna),
    ("Tarragona", Ccaa::Cataluna),
    ("Alicante", Ccaa::ComunitatValenciana),
    ("Alacant", Ccaa::ComunitatValenciana),
    ("Castellón", Ccaa::ComunitatValenciana),
    ("Castelló", Ccaa::ComunitatValenciana),
    ("Valencia", Ccaa::ComunitatValenciana),
    ("València", Ccaa::ComunitatValenciana),
    ("Badajoz", Ccaa::Extremadura),
    ("Cáceres", Ccaa::Extremadura),
    ("A Coruña", Ccaa::Galicia),
    ("Coruña, A", Ccaa::Galicia),
    ("Lugo", Ccaa::Galicia),
    ("Ourense", Ccaa::Galicia),
    ("Pontevedra", Ccaa::Galicia),
    ("Madrid", Ccaa::Madrid),
    ("Murcia", Ccaa::Murcia),
    ("Navarra", Ccaa::Navarra),
    ("Araba", Ccaa::PaisVasco),
    ("Álava", Ccaa::PaisVasco),
    ("Bizkaia", Ccaa::PaisVasco),
    ("Vizcaya", Ccaa::PaisVasco),
    ("Gipuzkoa", Ccaa::PaisVasco),
    ("Guipúzcoa", Ccaa::PaisVasco),
    ("La Rioja", Ccaa::LaRioja),
    ("Ceuta", Ccaa::Ceuta),
    ("Melilla", Ccaa::Melilla),
];

/// Best-effort repair chain for agency region labels. Steps run in a fixed
/// order and each one only fires when its trigger pattern is present:
///
/// 1. mojibake re-encode: `"AndalucÃ­a"` → `"Andalucía"`
/// 2. leading code strip: `"01 Andalucía"` → `"Andalucía"`
/// 3. comma inversion: `"Madrid, Comunidad de"` → `"Comunidad de Madrid"`
/// 4. spaced hyphen: `"Castilla - La Mancha"` → `"Castilla-La Mancha"`
///
/// Already-clean labels pass through untouched, so the chain is idempotent
/// for them. Inputs outside the observed agency formats are not guaranteed
/// to compose through all four steps.
pub fn repair_region_label(raw: &str) -> String {
    let mut name = raw.trim().to_string();

    if let Some(fixed) = repair_mojibake(&name) {
        name = fixed;
    }
    if let Some(rest) = strip_code_prefix(&name) {
        name = rest;
    }
    if let Some(swapped) = unswap_comma_form(&name) {
        name = swapped;
    }

    name.replace(" - ", "-").trim().to_string()
}

/// UTF-8 bytes read back through a single-byte codepage leave `Ã`/`Â`
/// artifacts. Undo by encoding through the suspected original codepage and
/// decoding as UTF-8. `None` when the trigger is absent or the round trip
/// fails, in which case the caller keeps the label as-is.
fn repair_mojibake(name: &str) -> Option<String> {
    if !name.contains('Ã') && !name.contains('Â') {
        return None;
    }
    let (bytes, _, had_unmappable) = WINDOWS_1252.encode(name);
    if had_unmappable {
        return None;
    }
    String::from_utf8(bytes.into_owned()).ok()
}

/// `"01 Andalucía"` → `"Andalucía"`. Only a first token made entirely of
/// digits counts as a code.
fn strip_code_prefix(name: &str) -> Option<String> {
    let (first, rest) = name.split_once(' ')?;
    if !first.is_empty() && first.chars().all(|c| c.is_ascii_digit()) {
        Some(rest.to_string())
    } else {
        None
    }
}

/// `"Madrid, Comunidad de"` → `"Comunidad de Madrid"`.
fn unswap_comma_form(name: &str) -> Option<String> {
    let (head, tail) = name.split_once(',')?;
    Some(format!("{} {}", tail.trim(), head.trim()))
}
