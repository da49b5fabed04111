//! Property unit records
//!
//! Backend payloads arrive as loosely shaped JSON: fields are optional, names
//! drift between endpoint versions and numbers are sometimes sent as strings.
//! [`RawUnit`] accepts all of that; [`UnitRecord`] is the normalized shape the
//! rest of the engine works with.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Floor token the cadastre uses for the ground floor ("bajo").
pub const GROUND_FLOOR_TOKEN: &str = "BJ";

/// Default stair/block key when the backend omits it.
pub const DEFAULT_GROUP_KEY: &str = "0";

/// Unit category. Declaration order is the order used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Residential,
    Commercial,
    Storage,
    Parking,
    CommonElement,
    Other,
}

impl UnitKind {
    pub const ALL: [UnitKind; 6] = [
        UnitKind::Residential,
        UnitKind::Commercial,
        UnitKind::Storage,
        UnitKind::Parking,
        UnitKind::CommonElement,
        UnitKind::Other,
    ];

    /// Classify a cadastral usage code.
    ///
    /// Accepts both the single-letter group keys (`V`, `C`, `O`, `A`, `G`)
    /// and the long usage names returned by the newer endpoint.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        match code.as_str() {
            "V" | "VIVIENDA" | "RESIDENCIAL" => UnitKind::Residential,
            "C" | "O" | "COMERCIAL" | "OFICINA" | "OFICINAS" => UnitKind::Commercial,
            "A" | "ALMACEN" | "ALMACÉN" => UnitKind::Storage,
            "G" | "APARCAMIENTO" | "GARAJE" => UnitKind::Parking,
            "EC" | "ELEMENTOS COMUNES" => UnitKind::CommonElement,
            _ => UnitKind::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UnitKind::Residential => "Vivienda",
            UnitKind::Commercial => "Comercial",
            UnitKind::Storage => "Almacén",
            UnitKind::Parking => "Aparcamiento",
            UnitKind::CommonElement => "Elementos comunes",
            UnitKind::Other => "Otro",
        }
    }
}

/// A unit exactly as the backend sent it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUnit {
    #[serde(default, deserialize_with = "lenient_string")]
    pub ref_catastral: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub clave_grupo_bice_o_uso: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uso_principal: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub planta: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub puerta: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub escalera: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub bloque: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub sup_inmueble_construido: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub superficie_m2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub num_policia_1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub letra_1: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tipo_via: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre_via: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre_municipio: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub nombre_provincia: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cp: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub anyo_antiguedad_bien: Option<String>,
}

/// Building-level address fields carried by every unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street_type: Option<String>,
    pub street_name: Option<String>,
    pub municipality: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub construction_year: Option<String>,
}

/// A normalized property unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Position in the load order. Never changes after ingestion.
    pub original_index: usize,
    pub kind: UnitKind,
    pub floor: String,
    pub door: String,
    pub stair: String,
    pub block: String,
    /// Built area in m². Zero when absent or malformed.
    pub built_area: f64,
    pub street_number: String,
    pub street_letter: String,
    pub cadastral_ref: String,
    pub address: Address,
}

impl UnitRecord {
    /// Normalize a raw unit, applying the default-coercion rules once.
    pub fn from_raw(original_index: usize, raw: RawUnit) -> Self {
        let usage = raw
            .clave_grupo_bice_o_uso
            .or(raw.uso_principal)
            .unwrap_or_default();
        let area = raw
            .sup_inmueble_construido
            .or(raw.superficie_m2)
            .filter(|a| a.is_finite() && *a > 0.0)
            .unwrap_or(0.0);

        Self {
            original_index,
            kind: UnitKind::from_code(&usage),
            floor: raw.planta.unwrap_or_default(),
            door: raw.puerta.unwrap_or_default(),
            stair: group_key(raw.escalera),
            block: group_key(raw.bloque),
            built_area: area,
            street_number: raw.num_policia_1.unwrap_or_default(),
            street_letter: raw.letra_1.unwrap_or_default(),
            cadastral_ref: raw.ref_catastral.unwrap_or_default(),
            address: Address {
                street_type: raw.tipo_via,
                street_name: raw.nombre_via,
                municipality: raw.nombre_municipio,
                province: raw.nombre_provincia,
                postal_code: raw.cp,
                construction_year: raw.anyo_antiguedad_bien,
            },
        }
    }

    pub fn is_ground_floor(&self) -> bool {
        self.floor.trim().eq_ignore_ascii_case(GROUND_FLOOR_TOKEN)
    }

    /// Floor as shown to users, with the ground floor spelled out.
    pub fn floor_label<'a>(&'a self, ground_label: &'a str) -> &'a str {
        if self.is_ground_floor() {
            ground_label
        } else {
            &self.floor
        }
    }

    /// "CL MAYOR 12 B" style street line.
    pub fn street_line(&self) -> String {
        let number = self.street_number.trim();
        let number = match number.parse::<i64>() {
            Ok(n) => n.to_string(),
            Err(_) => number.to_string(),
        };
        [
            self.address.street_type.as_deref().unwrap_or(""),
            self.address.street_name.as_deref().unwrap_or(""),
            number.as_str(),
            self.street_letter.trim(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

fn group_key(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => DEFAULT_GROUP_KEY.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    })
}
