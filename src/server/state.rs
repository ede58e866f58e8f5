use crate::font::HeroFonts;
use crate::hero::HeroDefaults;

pub struct ServerState {
    pub defaults: HeroDefaults,
    pub fonts: HeroFonts,
}
