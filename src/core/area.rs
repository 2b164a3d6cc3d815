use std::fmt::{Display, Formatter};

use itertools::Itertools;
use serde::{Serialize, Serializer};

/// Bidding zones available from the provider.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd)]
pub enum AreaCode {
    Fr,
    Dk1,
    Dk2,
    De,
    Se1,
    Se2,
    Se3,
    Se4,
    No1,
    No2,
    No3,
    No4,
    No5,
    Fi,
}

impl AreaCode {
    pub const ALL: [Self; 14] = [
        Self::Fr,
        Self::Dk1,
        Self::Dk2,
        Self::De,
        Self::Se1,
        Self::Se2,
        Self::Se3,
        Self::Se4,
        Self::No1,
        Self::No2,
        Self::No3,
        Self::No4,
        Self::No5,
        Self::Fi,
    ];

    pub const fn short_code(self) -> &'static str {
        match self {
            Self::Fr => "FR",
            Self::Dk1 => "DK1",
            Self::Dk2 => "DK2",
            Self::De => "DE",
            Self::Se1 => "SE1",
            Self::Se2 => "SE2",
            Self::Se3 => "SE3",
            Self::Se4 => "SE4",
            Self::No1 => "NO1",
            Self::No2 => "NO2",
            Self::No3 => "NO3",
            Self::No4 => "NO4",
            Self::No5 => "NO5",
            Self::Fi => "FI",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Fr => "France",
            Self::Dk1 => "Denmark - West",
            Self::Dk2 => "Denmark - East",
            Self::De => "Germany",
            Self::Se1 => "Sweden - 1",
            Self::Se2 => "Sweden - 2",
            Self::Se3 => "Sweden - 3",
            Self::Se4 => "Sweden - 4",
            Self::No1 => "Norway - 1",
            Self::No2 => "Norway - 2",
            Self::No3 => "Norway - 3",
            Self::No4 => "Norway - 4",
            Self::No5 => "Norway - 5",
            Self::Fi => "Finland",
        }
    }

    /// EIC code of the bidding zone, used as both `in_Domain` and `out_Domain`.
    pub const fn domain_code(self) -> &'static str {
        match self {
            Self::Fr => "10YFR-RTE------C",
            Self::Dk1 => "10YDK-1--------W",
            Self::Dk2 => "10YDK-2--------M",
            Self::De => "10Y1001A1001A82H",
            Self::Se1 => "10Y1001A1001A44P",
            Self::Se2 => "10Y1001A1001A45N",
            Self::Se3 => "10Y1001A1001A46L",
            Self::Se4 => "10Y1001A1001A47J",
            Self::No1 => "10YNO-1--------2",
            Self::No2 => "10YNO-2--------T",
            Self::No3 => "10YNO-3--------J",
            Self::No4 => "10YNO-4--------9",
            Self::No5 => "10Y1001A1001A48H",
            Self::Fi => "10YFI-1--------U",
        }
    }

    /// Look up the area by its short code, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn find(short_code: &str) -> Option<Self> {
        let short_code = short_code.trim();
        Self::ALL.into_iter().find(|area| area.short_code().eq_ignore_ascii_case(short_code))
    }

    /// Comma-separated list of the supported short codes.
    pub fn listing() -> String {
        Self::ALL.into_iter().map(Self::short_code).join(", ")
    }
}

impl Display for AreaCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_code())
    }
}

impl Serialize for AreaCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_code())
    }
}

/// Area metadata attached to a price document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Area {
    pub code: AreaCode,
    pub name: &'static str,

    #[serde(rename = "domain")]
    pub domain_code: &'static str,
}

impl From<AreaCode> for Area {
    fn from(code: AreaCode) -> Self {
        Self { code, name: code.display_name(), domain_code: code.domain_code() }
    }
}

impl Display for Area {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_find_ignores_case_ok() {
        assert_eq!(AreaCode::find("dk1"), Some(AreaCode::Dk1));
        assert_eq!(AreaCode::find(" Se3 "), Some(AreaCode::Se3));
        assert_eq!(AreaCode::find("XX"), None);
        assert_eq!(AreaCode::find(""), None);
    }

    #[test]
    fn test_domain_codes_unique_ok() {
        let domain_codes: HashSet<_> = AreaCode::ALL.into_iter().map(AreaCode::domain_code).collect();
        assert_eq!(domain_codes.len(), AreaCode::ALL.len());
    }

    #[test]
    fn test_listing_ok() {
        assert!(AreaCode::listing().starts_with("FR, DK1, DK2, DE"));
    }
}
