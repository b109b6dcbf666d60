use serde::{Deserialize, Serialize};

/// A selectable voice/identity profile for the therapist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Catalog key (e.g. "calm_female"), also sent to the backend as `voice_persona`
    pub id: String,

    /// Display name
    pub name: String,

    /// Synthesis voice identifier
    pub voice_id: String,

    /// Tone/category tag
    pub tone: String,

    pub description: String,
}

impl Persona {
    fn new(id: &str, name: &str, voice_id: &str, tone: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            voice_id: voice_id.to_string(),
            tone: tone.to_string(),
            description: description.to_string(),
        }
    }
}

/// Navigation direction through the persona carousel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "left", alias = "prev")]
    Previous,
    #[serde(alias = "right")]
    Next,
}

/// Ordered, immutable persona catalog
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
}

impl PersonaCatalog {
    /// Build a catalog from an explicit list. Returns `None` for an empty list.
    pub fn new(personas: Vec<Persona>) -> Option<Self> {
        if personas.is_empty() {
            return None;
        }
        Some(Self { personas })
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Persona at `index`, wrapping out-of-range indices
    pub fn get(&self, index: usize) -> &Persona {
        &self.personas[index % self.personas.len()]
    }

    pub fn find(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    /// Index reached by moving one step from `index` in `direction`
    pub fn step(&self, index: usize, direction: Direction) -> usize {
        let len = self.personas.len();
        let index = index % len;
        match direction {
            Direction::Next => (index + 1) % len,
            Direction::Previous => (index + len - 1) % len,
        }
    }
}

impl Default for PersonaCatalog {
    fn default() -> Self {
        Self {
            personas: vec![
                Persona::new(
                    "calm_female",
                    "Serene Sarah",
                    "nova",
                    "calm",
                    "Calm and nurturing female voice",
                ),
                Persona::new(
                    "wise_male",
                    "Mindful Marcus",
                    "onyx",
                    "reassuring",
                    "Deep and reassuring male voice",
                ),
                Persona::new(
                    "gentle_guide",
                    "Peaceful Priya",
                    "alloy",
                    "gentle",
                    "Gentle and guiding voice",
                ),
                Persona::new(
                    "nature_spirit",
                    "Forest Finn",
                    "echo",
                    "earthy",
                    "Natural and earthy voice",
                ),
                Persona::new(
                    "zen_master",
                    "Tranquil Tara",
                    "shimmer",
                    "centered",
                    "Wise and centered voice",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_wraps_both_directions() {
        let catalog = PersonaCatalog::default();
        let last = catalog.len() - 1;

        assert_eq!(catalog.step(0, Direction::Previous), last);
        assert_eq!(catalog.step(last, Direction::Next), 0);
        assert_eq!(catalog.step(2, Direction::Next), 3);
        assert_eq!(catalog.step(2, Direction::Previous), 1);
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(PersonaCatalog::new(Vec::new()).is_none());
    }

    #[test]
    fn test_direction_accepts_left_right_aliases() {
        let left: Direction = serde_json::from_str("\"left\"").unwrap();
        let right: Direction = serde_json::from_str("\"right\"").unwrap();
        assert_eq!(left, Direction::Previous);
        assert_eq!(right, Direction::Next);
    }
}
