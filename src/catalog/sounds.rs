use serde::{Deserialize, Serialize};

/// An ambient sound a meditation can be paired with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeditationSound {
    pub id: String,

    /// Category key used for the track lookup
    pub category: String,

    pub name: String,

    pub description: String,
}

/// Ordered, immutable sound catalog
#[derive(Debug, Clone)]
pub struct SoundCatalog {
    sounds: Vec<MeditationSound>,
}

impl SoundCatalog {
    pub fn new(sounds: Vec<MeditationSound>) -> Self {
        Self { sounds }
    }

    pub fn find(&self, id: &str) -> Option<&MeditationSound> {
        self.sounds.iter().find(|s| s.id == id)
    }

    pub fn all(&self) -> &[MeditationSound] {
        &self.sounds
    }
}

impl Default for SoundCatalog {
    fn default() -> Self {
        let entries = [
            ("rainfall", "Rainfall/Thunder", "Steady rain with distant thunder"),
            ("ocean", "Ocean Waves", "Waves rolling onto the shore"),
            ("forest", "Forest/Nature Sounds", "Birdsong and rustling leaves"),
            ("whitenoise", "White Noise/Pink Noise", "Even ambient noise for focus"),
            ("tibetan", "Tibetan Bowls/Meditation Bells", "Singing bowls and soft bells"),
        ];

        Self {
            sounds: entries
                .iter()
                .map(|(key, name, description)| MeditationSound {
                    id: key.to_string(),
                    category: key.to_string(),
                    name: name.to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }
}
