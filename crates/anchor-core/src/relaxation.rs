//! Static catalog of relaxation environments.

use serde::Serialize;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub ambient_sound: &'static str,
    pub image_url: &'static str,
}

pub const ENVIRONMENTS: [Environment; 4] = [
    Environment {
        id: "forest",
        name: "Peaceful Forest",
        description: "Immerse yourself in a tranquil woodland with gentle bird songs",
        ambient_sound: "Forest birds and rustling leaves",
        image_url: "https://images.pexels.com/photos/518489/pexels-photo-518489.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
    Environment {
        id: "ocean",
        name: "Ocean Waves",
        description: "Relax by the endless ocean with soothing wave sounds",
        ambient_sound: "Gentle ocean waves",
        image_url: "https://images.pexels.com/photos/457882/pexels-photo-457882.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
    Environment {
        id: "mountain",
        name: "Mountain Vista",
        description: "Find peace in the majestic silence of mountain peaks",
        ambient_sound: "Mountain wind and distant echoes",
        image_url: "https://images.pexels.com/photos/147411/italy-mountains-pragser-wildsee-lake-147411.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
    Environment {
        id: "clouds",
        name: "Above the Clouds",
        description: "Float peacefully above a sea of fluffy white clouds",
        ambient_sound: "Soft wind and distant thunder",
        image_url: "https://images.pexels.com/photos/531880/pexels-photo-531880.jpeg?auto=compress&cs=tinysrgb&w=800",
    },
];

pub fn environments() -> &'static [Environment] {
    &ENVIRONMENTS
}

/// Look up an environment by id.
pub fn environment(id: &str) -> Result<&'static Environment, ValidationError> {
    ENVIRONMENTS
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| ValidationError::UnknownId {
            kind: "environment",
            id: id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_four_unique_ids() {
        let mut ids: Vec<_> = environments().iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids, vec!["clouds", "forest", "mountain", "ocean"]);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(environment("ocean").unwrap().name, "Ocean Waves");
        assert_eq!(
            environment("desert"),
            Err(ValidationError::UnknownId {
                kind: "environment",
                id: "desert".to_string()
            })
        );
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(environment("forest").unwrap()).unwrap();
        assert_eq!(json["ambientSound"], "Forest birds and rustling leaves");
        assert!(json["imageUrl"].as_str().unwrap().starts_with("https://"));
    }
}
