use crate::Direction;

/// Number of discrete action codes understood by the simulation.
pub const ACTION_COUNT: u8 = 10;

/// Discrete action held by an externally controlled entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Action {
    /// Do nothing.
    #[default]
    Idle,
    /// Move one step along the direction.
    Move(Direction),
    /// Request an attack with the current weapon.
    Attack,
    /// First special ability of the entity's kind.
    AbilityOne,
    /// Second special ability of the entity's kind.
    AbilityTwo,
    /// Summon drawing from the indexed pool variant.
    Summon(u8),
}

impl Action {
    /// Decodes an action code, returning `None` for codes outside the table.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        let action = match code {
            0 => Self::Idle,
            1 => Self::Move(Direction::North),
            2 => Self::Move(Direction::South),
            3 => Self::Move(Direction::West),
            4 => Self::Move(Direction::East),
            5 => Self::Attack,
            6 => Self::AbilityOne,
            7 => Self::AbilityTwo,
            8 => Self::Summon(0),
            9 => Self::Summon(1),
            _ => return None,
        };
        Some(action)
    }

    /// Code that decodes to this action.
    ///
    /// Summon variants without a dedicated code collapse onto the last one.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Move(Direction::North) => 1,
            Self::Move(Direction::South) => 2,
            Self::Move(Direction::West) => 3,
            Self::Move(Direction::East) => 4,
            Self::Attack => 5,
            Self::AbilityOne => 6,
            Self::AbilityTwo => 7,
            Self::Summon(0) => 8,
            Self::Summon(_) => 9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_decodes_to_its_own_action() {
        for code in 0..ACTION_COUNT {
            let action = Action::from_code(code).expect("code in table");
            assert_eq!(action.code(), code);
        }
        assert_eq!(Action::from_code(ACTION_COUNT), None);
    }

    #[test]
    fn movement_codes_follow_screen_axes() {
        assert_eq!(Action::from_code(1), Some(Action::Move(Direction::North)));
        assert_eq!(Action::from_code(4), Some(Action::Move(Direction::East)));
    }
}
