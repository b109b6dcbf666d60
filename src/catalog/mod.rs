//! Fixed persona and meditation-sound catalogs
//!
//! Both catalogs are ordered and immutable. Persona selection is an index
//! into [`PersonaCatalog`] with wrap-around in both directions.

mod personas;
mod sounds;

pub use personas::{Direction, Persona, PersonaCatalog};
pub use sounds::{MeditationSound, SoundCatalog};
