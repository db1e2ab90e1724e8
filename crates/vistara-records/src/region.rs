use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SEPARATOR: char = '/';

/// Identifies a district within a state.
///
/// Serialized as `"STATE/DISTRICT"` so it can key JSON maps. Names are kept as
/// given; normalization (case, spelling variants) is the ingestion side's job.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DistrictId {
    state: String,
    district: String,
}

/// Key for a forecast series: a single district, or the sum over a state.
///
/// Serialized as `"STATE/DISTRICT"` or `"STATE"` respectively.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionId {
    District(DistrictId),
    State(String),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseRegionIdError {
    #[display("region id is empty")]
    Empty,
    #[display("invalid district id '{input}': expected STATE/DISTRICT")]
    InvalidDistrict { input: String },
}

impl DistrictId {
    #[must_use]
    pub fn new(state: impl Into<String>, district: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            district: district.into(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub fn district(&self) -> &str {
        &self.district
    }

    /// Returns the first part, as `(field, name)`, that would not survive a
    /// round trip through the `"STATE/DISTRICT"` form.
    #[must_use]
    pub fn malformed_part(&self) -> Option<(&'static str, &str)> {
        [("state", self.state.as_str()), ("district", self.district.as_str())]
            .into_iter()
            .find(|(_, name)| !is_well_formed_name(name))
    }
}

fn is_well_formed_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(SEPARATOR) && name.trim() == name
}

impl fmt::Display for DistrictId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.state, self.district)
    }
}

impl FromStr for DistrictId {
    type Err = ParseRegionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRegionIdError::InvalidDistrict { input: s.to_owned() };
        let (state, district) = s.split_once(SEPARATOR).ok_or_else(invalid)?;
        let (state, district) = (state.trim(), district.trim());
        if state.is_empty() || district.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(state, district))
    }
}

impl RegionId {
    /// Returns the state this region belongs to (or is).
    #[must_use]
    pub fn state(&self) -> &str {
        match self {
            RegionId::District(id) => id.state(),
            RegionId::State(state) => state,
        }
    }
}

impl From<DistrictId> for RegionId {
    fn from(id: DistrictId) -> Self {
        RegionId::District(id)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::District(id) => id.fmt(f),
            RegionId::State(state) => f.write_str(state),
        }
    }
}

impl FromStr for RegionId {
    type Err = ParseRegionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRegionIdError::Empty);
        }
        if s.contains(SEPARATOR) {
            Ok(RegionId::District(s.parse()?))
        } else {
            Ok(RegionId::State(s.to_owned()))
        }
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(DistrictId);
string_serde!(RegionId);

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_district_id_roundtrip_through_display() {
        let id = DistrictId::new("KARNATAKA", "BENGALURU URBAN");
        assert_eq!(id.to_string(), "KARNATAKA/BENGALURU URBAN");
        assert_eq!(id.to_string().parse::<DistrictId>().unwrap(), id);
    }

    #[test]
    fn test_district_id_rejects_missing_parts() {
        assert!("KARNATAKA".parse::<DistrictId>().is_err());
        assert!("/BENGALURU".parse::<DistrictId>().is_err());
        assert!("KARNATAKA/ ".parse::<DistrictId>().is_err());
    }

    #[test]
    fn test_region_id_kind_follows_separator() {
        assert_eq!(
            "GOA".parse::<RegionId>().unwrap(),
            RegionId::State("GOA".to_owned())
        );
        assert_eq!(
            "GOA/NORTH GOA".parse::<RegionId>().unwrap(),
            RegionId::District(DistrictId::new("GOA", "NORTH GOA"))
        );
        assert_eq!("  ".parse::<RegionId>(), Err(ParseRegionIdError::Empty));
    }

    #[test]
    fn test_region_state() {
        let district = RegionId::from(DistrictId::new("GOA", "NORTH GOA"));
        assert_eq!(district.state(), "GOA");
        assert_eq!(RegionId::State("GOA".to_owned()).state(), "GOA");
    }

    #[test]
    fn test_ids_work_as_json_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(RegionId::State("GOA".to_owned()), 1);
        map.insert(DistrictId::new("GOA", "SOUTH GOA").into(), 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"GOA/SOUTH GOA":2,"GOA":1}"#);
        let back: BTreeMap<RegionId, i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_malformed_parts() {
        assert_eq!(DistrictId::new("GOA", "NORTH GOA").malformed_part(), None);
        assert_eq!(
            DistrictId::new("A/B", "C").malformed_part(),
            Some(("state", "A/B"))
        );
        assert_eq!(
            DistrictId::new("A", "B/C").malformed_part(),
            Some(("district", "B/C"))
        );
        assert_eq!(
            DistrictId::new("A", "C ").malformed_part(),
            Some(("district", "C "))
        );

        // well-formed ids survive the string form; malformed ones would not
        let id = DistrictId::new("A", "B/C");
        assert_ne!(id.to_string().parse::<DistrictId>().unwrap(), id);
    }
}
