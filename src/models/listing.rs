//! Listing record produced by the site adapters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of property a listing advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Condo,
}

impl PropertyType {
    /// Canonical lowercase name, as stored in record sets and tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Condo => "condo",
        }
    }

    /// Infer the property type from a printed label or a card title.
    ///
    /// Apartment keywords win: an apartment title often mentions its
    /// building's condomínio. Condo means a house in a gated condominium,
    /// so it needs either the bare label or "casa" alongside "condom".
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        if lower.is_empty() {
            return None;
        }
        const APARTMENT: [&str; 6] = ["apartamento", "apartment", "apto", "cobertura", "kitnet", "flat"];
        if APARTMENT.iter().any(|k| lower.contains(k)) {
            return Some(PropertyType::Apartment);
        }
        const CONDO: [&str; 5] = ["condo", "condomínio", "condominio", "condomínios", "condominios"];
        if CONDO.contains(&lower.as_str()) || (lower.contains("casa") && lower.contains("condom")) {
            return Some(PropertyType::Condo);
        }
        const HOUSE: [&str; 3] = ["casa", "house", "sobrado"];
        if HOUSE.iter().any(|k| lower.contains(k)) {
            return Some(PropertyType::House);
        }
        None
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing card, reconciled into the common record shape.
///
/// Every field is independently nullable: a card missing a sub-element
/// yields `None` for that field only. Numeric fields stay as cleaned
/// strings; parsing them is left to downstream consumers.
///
/// Deserialization also accepts the keys of the legacy Portuguese feeds
/// (`tipo`, `localizacao`, `quartos`, ...) and numbers where strings are
/// expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawListingRecord {
    #[serde(default, alias = "tipo", deserialize_with = "lenient::property_type")]
    pub property_type: Option<PropertyType>,

    #[serde(default, alias = "localizacao", deserialize_with = "lenient::text")]
    pub location: Option<String>,

    #[serde(default, deserialize_with = "lenient::text")]
    pub area: Option<String>,

    #[serde(default, alias = "quartos", deserialize_with = "lenient::text")]
    pub rooms: Option<String>,

    #[serde(default, alias = "banheiros", deserialize_with = "lenient::text")]
    pub bathrooms: Option<String>,

    #[serde(default, alias = "vagas", deserialize_with = "lenient::text")]
    pub parking_spots: Option<String>,

    #[serde(default, alias = "preco", deserialize_with = "lenient::text")]
    pub price: Option<String>,

    #[serde(default, alias = "condo", deserialize_with = "lenient::text")]
    pub condo_fee: Option<String>,
}

mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;
    use serde_json::Value;

    use super::PropertyType;

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected string or number, found {other}"
            ))),
        }
    }

    pub fn property_type<'de, D>(deserializer: D) -> Result<Option<PropertyType>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(text(deserializer)?.and_then(|label| PropertyType::from_label(&label)))
    }
}
