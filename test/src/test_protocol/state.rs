use replica_shared::{BitBuffer, Kinded, SerdeErr, StateData, UpdateOrder};

use super::{angle_compressor, angles_equal, coordinate_compressor, coordinates_equal, lerp_unclamped};

/// Every state variant of the game
#[derive(Clone, Debug, PartialEq)]
pub enum GameState {
    Dummy(DummyEntityState),
    Avatar(AvatarState),
}

impl GameState {
    pub const DUMMY: u16 = 0;
    pub const AVATAR: u16 = 1;

    pub fn as_dummy(&self) -> Option<&DummyEntityState> {
        match self {
            GameState::Dummy(dummy) => Some(dummy),
            _ => None,
        }
    }

    pub fn as_dummy_mut(&mut self) -> Option<&mut DummyEntityState> {
        match self {
            GameState::Dummy(dummy) => Some(dummy),
            _ => None,
        }
    }

    pub fn as_avatar(&self) -> Option<&AvatarState> {
        match self {
            GameState::Avatar(avatar) => Some(avatar),
            _ => None,
        }
    }

    pub fn as_avatar_mut(&mut self) -> Option<&mut AvatarState> {
        match self {
            GameState::Avatar(avatar) => Some(avatar),
            _ => None,
        }
    }

    /// Planar position, used for scoping
    pub fn position(&self) -> (f32, f32) {
        match self {
            GameState::Dummy(dummy) => (dummy.x, dummy.y),
            GameState::Avatar(avatar) => (avatar.x, avatar.y),
        }
    }
}

impl Kinded for GameState {
    fn kind(&self) -> u16 {
        match self {
            GameState::Dummy(_) => Self::DUMMY,
            GameState::Avatar(_) => Self::AVATAR,
        }
    }

    fn from_kind(kind: u16) -> Option<Self> {
        match kind {
            Self::DUMMY => Some(GameState::Dummy(DummyEntityState::default())),
            Self::AVATAR => Some(GameState::Avatar(AvatarState::default())),
            _ => None,
        }
    }

    fn kind_count() -> u16 {
        2
    }
}

impl StateData for GameState {
    fn flag_bits(&self) -> u32 {
        match self {
            GameState::Dummy(_) => DummyEntityState::FLAG_BITS,
            GameState::Avatar(_) => AvatarState::FLAG_BITS,
        }
    }

    fn compare_mutable(&self, basis: &Self) -> u32 {
        match (self, basis) {
            (GameState::Dummy(state), GameState::Dummy(basis)) => state.compare_mutable(basis),
            (GameState::Avatar(state), GameState::Avatar(basis)) => state.compare_mutable(basis),
            _ => u32::MAX,
        }
    }

    fn is_controller_equal(&self, other: &Self) -> bool {
        match (self, other) {
            (GameState::Avatar(state), GameState::Avatar(other)) => {
                state.action_count == other.action_count
            }
            _ => true,
        }
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: u32) {
        match (self, source) {
            (GameState::Dummy(state), GameState::Dummy(source)) => {
                state.apply_mutable_from(source, flags)
            }
            (GameState::Avatar(state), GameState::Avatar(source)) => {
                state.apply_mutable_from(source, flags)
            }
            _ => {}
        }
    }

    fn apply_controller_from(&mut self, source: &Self) {
        if let (GameState::Avatar(state), GameState::Avatar(source)) = (self, source) {
            state.action_count = source.action_count;
        }
    }

    fn apply_immutable_from(&mut self, source: &Self) {
        match (self, source) {
            (GameState::Dummy(state), GameState::Dummy(source)) => {
                state.archetype_id = source.archetype_id;
                state.user_id = source.user_id;
            }
            (GameState::Avatar(state), GameState::Avatar(source)) => {
                state.user_id = source.user_id;
            }
            _ => {}
        }
    }

    fn reset_controller(&mut self) {
        if let GameState::Avatar(state) = self {
            state.action_count = 0;
        }
    }

    fn apply_interpolated(&mut self, first: &Self, second: &Self, t: f32) {
        match (self, first, second) {
            (GameState::Dummy(state), GameState::Dummy(first), GameState::Dummy(second)) => {
                state.x = lerp_unclamped(first.x, second.x, t);
                state.y = lerp_unclamped(first.y, second.y, t);
                state.z = lerp_unclamped(first.z, second.z, t);
            }
            (GameState::Avatar(state), GameState::Avatar(first), GameState::Avatar(second)) => {
                state.x = lerp_unclamped(first.x, second.x, t);
                state.y = lerp_unclamped(first.y, second.y, t);
            }
            _ => {}
        }
    }

    fn update_order(&self) -> UpdateOrder {
        match self {
            // avatars move first so dummies can react to them in the same tick
            GameState::Avatar(_) => UpdateOrder::Early,
            GameState::Dummy(_) => UpdateOrder::Normal,
        }
    }

    fn encode_mutable(&self, buffer: &mut BitBuffer, flags: u32) {
        match self {
            GameState::Dummy(state) => state.encode_mutable(buffer, flags),
            GameState::Avatar(state) => state.encode_mutable(buffer, flags),
        }
    }

    fn decode_mutable(&mut self, buffer: &mut BitBuffer, flags: u32) -> Result<(), SerdeErr> {
        match self {
            GameState::Dummy(state) => state.decode_mutable(buffer, flags),
            GameState::Avatar(state) => state.decode_mutable(buffer, flags),
        }
    }

    fn encode_controller(&self, buffer: &mut BitBuffer) {
        if let GameState::Avatar(state) = self {
            buffer.write_uint(state.action_count);
        }
    }

    fn decode_controller(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        if let GameState::Avatar(state) = self {
            state.action_count = buffer.read_uint()?;
        }
        Ok(())
    }

    fn encode_immutable(&self, buffer: &mut BitBuffer) {
        match self {
            GameState::Dummy(state) => {
                buffer.write_int(state.archetype_id);
                buffer.write_int(state.user_id);
            }
            GameState::Avatar(state) => buffer.write_int(state.user_id),
        }
    }

    fn decode_immutable(&mut self, buffer: &mut BitBuffer) -> Result<(), SerdeErr> {
        match self {
            GameState::Dummy(state) => {
                state.archetype_id = buffer.read_int()?;
                state.user_id = buffer.read_int()?;
            }
            GameState::Avatar(state) => state.user_id = buffer.read_int()?,
        }
        Ok(())
    }
}

// DummyEntityState

/// A scenery entity with five mutable fields and two immutable ones
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DummyEntityState {
    // Immutable
    pub archetype_id: i32,
    pub user_id: i32,

    // Mutable
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub angle: f32,
    pub status: u8,
}

impl DummyEntityState {
    pub const X: u32 = 1 << 0;
    pub const Y: u32 = 1 << 1;
    pub const Z: u32 = 1 << 2;
    pub const ANGLE: u32 = 1 << 3;
    pub const STATUS: u32 = 1 << 4;
    pub const ALL: u32 = Self::X | Self::Y | Self::Z | Self::ANGLE | Self::STATUS;

    const FLAG_BITS: u32 = 5;

    fn compare_mutable(&self, basis: &Self) -> u32 {
        let mut flags = 0;
        if !coordinates_equal(self.x, basis.x) {
            flags |= Self::X;
        }
        if !coordinates_equal(self.y, basis.y) {
            flags |= Self::Y;
        }
        if !coordinates_equal(self.z, basis.z) {
            flags |= Self::Z;
        }
        if !angles_equal(self.angle, basis.angle) {
            flags |= Self::ANGLE;
        }
        if self.status != basis.status {
            flags |= Self::STATUS;
        }
        flags
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: u32) {
        if flags & Self::X != 0 {
            self.x = source.x;
        }
        if flags & Self::Y != 0 {
            self.y = source.y;
        }
        if flags & Self::Z != 0 {
            self.z = source.z;
        }
        if flags & Self::ANGLE != 0 {
            self.angle = source.angle;
        }
        if flags & Self::STATUS != 0 {
            self.status = source.status;
        }
    }

    fn encode_mutable(&self, buffer: &mut BitBuffer, flags: u32) {
        let coordinate = coordinate_compressor();
        if flags & Self::X != 0 {
            buffer.write_compressed_float(&coordinate, self.x);
        }
        if flags & Self::Y != 0 {
            buffer.write_compressed_float(&coordinate, self.y);
        }
        if flags & Self::Z != 0 {
            buffer.write_compressed_float(&coordinate, self.z);
        }
        if flags & Self::ANGLE != 0 {
            buffer.write_compressed_float(&angle_compressor(), self.angle);
        }
        if flags & Self::STATUS != 0 {
            buffer.write_byte(self.status);
        }
    }

    fn decode_mutable(&mut self, buffer: &mut BitBuffer, flags: u32) -> Result<(), SerdeErr> {
        let coordinate = coordinate_compressor();
        if flags & Self::X != 0 {
            self.x = buffer.read_compressed_float(&coordinate)?;
        }
        if flags & Self::Y != 0 {
            self.y = buffer.read_compressed_float(&coordinate)?;
        }
        if flags & Self::Z != 0 {
            self.z = buffer.read_compressed_float(&coordinate)?;
        }
        if flags & Self::ANGLE != 0 {
            self.angle = buffer.read_compressed_float(&angle_compressor())?;
        }
        if flags & Self::STATUS != 0 {
            self.status = buffer.read_byte()?;
        }
        Ok(())
    }
}

// AvatarState

/// A player-controlled entity. The action counter is controller data, only
/// its controlling client sees it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AvatarState {
    // Immutable
    pub user_id: i32,

    // Mutable
    pub x: f32,
    pub y: f32,

    // Controller
    pub action_count: u32,
}

impl AvatarState {
    pub const X: u32 = 1 << 0;
    pub const Y: u32 = 1 << 1;

    const FLAG_BITS: u32 = 2;

    fn compare_mutable(&self, basis: &Self) -> u32 {
        let mut flags = 0;
        if !coordinates_equal(self.x, basis.x) {
            flags |= Self::X;
        }
        if !coordinates_equal(self.y, basis.y) {
            flags |= Self::Y;
        }
        flags
    }

    fn apply_mutable_from(&mut self, source: &Self, flags: u32) {
        if flags & Self::X != 0 {
            self.x = source.x;
        }
        if flags & Self::Y != 0 {
            self.y = source.y;
        }
    }

    fn encode_mutable(&self, buffer: &mut BitBuffer, flags: u32) {
        let coordinate = coordinate_compressor();
        if flags & Self::X != 0 {
            buffer.write_compressed_float(&coordinate, self.x);
        }
        if flags & Self::Y != 0 {
            buffer.write_compressed_float(&coordinate, self.y);
        }
    }

    fn decode_mutable(&mut self, buffer: &mut BitBuffer, flags: u32) -> Result<(), SerdeErr> {
        let coordinate = coordinate_compressor();
        if flags & Self::X != 0 {
            self.x = buffer.read_compressed_float(&coordinate)?;
        }
        if flags & Self::Y != 0 {
            self.y = buffer.read_compressed_float(&coordinate)?;
        }
        Ok(())
    }
}
