/// Glyphs, the custom glyph table, and per-entity sprite sets.
///
/// A glyph is either a literal printable character or a reference into the
/// custom glyph table. Custom glyphs carry a 5×8 bitmap (one byte per pixel
/// row, low 5 bits used) for surfaces that can program character cells, plus
/// a stand-in character and tint for surfaces that cannot.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Glyph {
    Char(char),
    Custom(u8),
}

impl Glyph {
    pub const BLANK: Glyph = Glyph::Char(' ');
}

/// One programmable character cell.
#[derive(Clone, Copy, Debug)]
pub struct CustomGlyph {
    pub id: u8,
    pub bitmap: [u8; 8],
    pub stand_in: char,
    pub tint: (u8, u8, u8),
}

// Custom glyph ids
pub const JUMPER_STANDING: u8 = 0;
pub const JUMPER_JUMPING: u8 = 1;
pub const JUMPER_DEAD: u8 = 2;
pub const PLATFORM: u8 = 3;
pub const HEART: u8 = 4;
pub const PATROLLER: u8 = 5;

pub const CUSTOM_GLYPHS: [CustomGlyph; 6] = [
    CustomGlyph {
        id: JUMPER_STANDING,
        bitmap: [0b00000, 0b11111, 0b10101, 0b11111, 0b11111, 0b00100, 0b01110, 0b11011],
        stand_in: '@',
        tint: (250, 220, 80),
    },
    CustomGlyph {
        id: JUMPER_JUMPING,
        bitmap: [0b11111, 0b10101, 0b11111, 0b11111, 0b00100, 0b00101, 0b11111, 0b10000],
        stand_in: '&',
        tint: (250, 220, 80),
    },
    CustomGlyph {
        id: JUMPER_DEAD,
        bitmap: [0b00000, 0b01110, 0b10101, 0b11011, 0b01110, 0b01110, 0b00000, 0b00000],
        stand_in: 'x',
        tint: (220, 60, 60),
    },
    CustomGlyph {
        id: PLATFORM,
        bitmap: [0b11111, 0b11111, 0b11111, 0b11111, 0b00100, 0b11111, 0b11111, 0b11111],
        stand_in: '#',
        tint: (150, 110, 70),
    },
    CustomGlyph {
        id: HEART,
        bitmap: [0b00000, 0b00000, 0b01010, 0b11111, 0b11111, 0b01110, 0b00100, 0b00000],
        stand_in: 'h',
        tint: (230, 80, 120),
    },
    CustomGlyph {
        id: PATROLLER,
        bitmap: [0b00000, 0b01110, 0b11111, 0b10101, 0b11111, 0b11111, 0b10101, 0b00000],
        stand_in: 'E',
        tint: (200, 70, 200),
    },
];

pub fn custom_glyph(id: u8) -> Option<&'static CustomGlyph> {
    CUSTOM_GLYPHS.iter().find(|g| g.id == id)
}

/// Is this glyph drawable? Literal characters always are; custom ids must be
/// in the table.
pub fn is_known(glyph: Glyph) -> bool {
    match glyph {
        Glyph::Char(_) => true,
        Glyph::Custom(id) => custom_glyph(id).is_some(),
    }
}

/// Sprite states an entity can be displayed in.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteState {
    Default,
    Falling,
    Dead,
}

/// Mapping from sprite state to glyph. `dead` is only required for entities
/// that can die; the level loader checks this before play starts.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SpriteSet {
    pub default: Glyph,
    pub falling: Glyph,
    pub dead: Option<Glyph>,
}

impl SpriteSet {
    pub fn player() -> Self {
        SpriteSet {
            default: Glyph::Custom(JUMPER_STANDING),
            falling: Glyph::Custom(JUMPER_JUMPING),
            dead: Some(Glyph::Custom(JUMPER_DEAD)),
        }
    }

    pub fn block() -> Self {
        SpriteSet {
            default: Glyph::Char('O'),
            falling: Glyph::Char('O'),
            dead: None,
        }
    }

    pub fn patroller() -> Self {
        SpriteSet {
            default: Glyph::Custom(PATROLLER),
            falling: Glyph::Custom(PATROLLER),
            dead: None,
        }
    }

    pub fn has(&self, state: SpriteState) -> bool {
        match state {
            SpriteState::Default | SpriteState::Falling => true,
            SpriteState::Dead => self.dead.is_some(),
        }
    }

    pub fn glyph(&self, state: SpriteState) -> Glyph {
        match state {
            SpriteState::Default => self.default,
            SpriteState::Falling => self.falling,
            SpriteState::Dead => self.dead.unwrap_or(self.default),
        }
    }

    /// Every glyph this set can produce.
    pub fn glyphs(&self) -> impl Iterator<Item = Glyph> + '_ {
        [Some(self.default), Some(self.falling), self.dead].into_iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_table_ids_are_unique_and_dense() {
        for (i, g) in CUSTOM_GLYPHS.iter().enumerate() {
            assert_eq!(g.id as usize, i);
            assert!(g.bitmap.iter().all(|row| *row < 0b100000));
        }
    }

    #[test]
    fn stand_ins_are_single_column() {
        for g in &CUSTOM_GLYPHS {
            assert!(g.stand_in.is_ascii_graphic(), "{:?}", g.stand_in);
        }
    }

    #[test]
    fn builtin_sprites_are_known() {
        for set in [SpriteSet::player(), SpriteSet::block(), SpriteSet::patroller()] {
            assert!(set.glyphs().all(is_known));
        }
        assert!(!is_known(Glyph::Custom(42)));
    }

    #[test]
    fn dead_state_only_on_player() {
        assert!(SpriteSet::player().has(SpriteState::Dead));
        assert!(!SpriteSet::block().has(SpriteState::Dead));
        assert_eq!(
            SpriteSet::player().glyph(SpriteState::Dead),
            Glyph::Custom(JUMPER_DEAD)
        );
    }
}
