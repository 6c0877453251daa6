// Crop domain model
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a configured crop profile. Also the value broadcast on the
/// selection channel, so it must stay a small positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CropId(pub u32);

impl fmt::Display for CropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crop {
    pub id: CropId,
    pub name: String,
}

impl Crop {
    pub fn new(id: CropId, name: impl Into<String>) -> Self {
        let name = Self::format_name(&name.into());
        Self { id, name }
    }

    fn format_name(name: &str) -> String {
        // "  green_chilli " -> "green chilli"
        name.trim().replace('_', " ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_name() {
        let crop = Crop::new(CropId(2), " Green_Chilli ");
        assert_eq!(crop.name, "Green Chilli");
        assert_eq!(crop.id.to_string(), "2");
    }
}
