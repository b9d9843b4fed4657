use serde::{Deserialize, Serialize};

use crate::world::RideId;

/// Type tag of an entity slot. `Null` marks a free slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[default]
    Null,
    Vehicle,
    Guest,
    Staff,
    Litter,
    Duck,
    Balloon,
    JumpingFountain,
    MoneyEffect,
    CrashedVehicleParticle,
}

pub(crate) const ENTITY_KIND_COUNT: usize = 10;

impl EntityKind {
    /// Stable index of this kind's membership list (and placeholder
    /// sprite).
    pub fn list_index(self) -> usize {
        match self {
            EntityKind::Null => 0,
            EntityKind::Vehicle => 1,
            EntityKind::Guest => 2,
            EntityKind::Staff => 3,
            EntityKind::Litter => 4,
            EntityKind::Duck => 5,
            EntityKind::Balloon => 6,
            EntityKind::JumpingFountain => 7,
            EntityKind::MoneyEffect => 8,
            EntityKind::CrashedVehicleParticle => 9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleData {
    pub ride: Option<RideId>,
    pub car_index: u8,
    pub velocity: i32,
    pub acceleration: i32,
    pub track_progress: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestData {
    pub energy: u8,
    pub happiness: u8,
    pub hunger: u8,
    pub destination_x: i32,
    pub destination_y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffData {
    pub staff_type: u8,
    pub lawns_mown: u32,
    pub litter_swept: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LitterData {
    pub litter_type: u8,
    pub creation_tick: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuckData {
    pub target_x: i32,
    pub target_y: i32,
    pub state: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalloonData {
    pub colour: u8,
    pub popped: bool,
    pub time_to_move: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpingFountainData {
    pub fountain_type: u8,
    pub num_ticks_alive: u32,
    pub fountain_flags: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyEffectData {
    pub value: i32,
    pub move_delay: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrashedVehicleParticleData {
    pub frame: u16,
    pub time_to_live: u16,
}

/// Per-kind payload of an entity slot; the tag always matches the list the
/// slot is linked into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityData {
    #[default]
    Null,
    Vehicle(VehicleData),
    Guest(GuestData),
    Staff(StaffData),
    Litter(LitterData),
    Duck(DuckData),
    Balloon(BalloonData),
    JumpingFountain(JumpingFountainData),
    MoneyEffect(MoneyEffectData),
    CrashedVehicleParticle(CrashedVehicleParticleData),
}

impl EntityData {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityData::Null => EntityKind::Null,
            EntityData::Vehicle(_) => EntityKind::Vehicle,
            EntityData::Guest(_) => EntityKind::Guest,
            EntityData::Staff(_) => EntityKind::Staff,
            EntityData::Litter(_) => EntityKind::Litter,
            EntityData::Duck(_) => EntityKind::Duck,
            EntityData::Balloon(_) => EntityKind::Balloon,
            EntityData::JumpingFountain(_) => EntityKind::JumpingFountain,
            EntityData::MoneyEffect(_) => EntityKind::MoneyEffect,
            EntityData::CrashedVehicleParticle(_) => EntityKind::CrashedVehicleParticle,
        }
    }

    /// Zeroed payload for a freshly created entity of a kind.
    pub fn default_for(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Null => EntityData::Null,
            EntityKind::Vehicle => EntityData::Vehicle(VehicleData::default()),
            EntityKind::Guest => EntityData::Guest(GuestData::default()),
            EntityKind::Staff => EntityData::Staff(StaffData::default()),
            EntityKind::Litter => EntityData::Litter(LitterData::default()),
            EntityKind::Duck => EntityData::Duck(DuckData::default()),
            EntityKind::Balloon => EntityData::Balloon(BalloonData::default()),
            EntityKind::JumpingFountain => {
                EntityData::JumpingFountain(JumpingFountainData::default())
            }
            EntityKind::MoneyEffect => EntityData::MoneyEffect(MoneyEffectData::default()),
            EntityKind::CrashedVehicleParticle => {
                EntityData::CrashedVehicleParticle(CrashedVehicleParticleData::default())
            }
        }
    }

    pub fn as_vehicle(&self) -> Option<&VehicleData> {
        match self {
            EntityData::Vehicle(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    pub fn as_vehicle_mut(&mut self) -> Option<&mut VehicleData> {
        match self {
            EntityData::Vehicle(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    pub fn as_guest(&self) -> Option<&GuestData> {
        match self {
            EntityData::Guest(guest) => Some(guest),
            _ => None,
        }
    }

    pub fn as_guest_mut(&mut self) -> Option<&mut GuestData> {
        match self {
            EntityData::Guest(guest) => Some(guest),
            _ => None,
        }
    }

    pub fn as_staff(&self) -> Option<&StaffData> {
        match self {
            EntityData::Staff(staff) => Some(staff),
            _ => None,
        }
    }

    pub fn as_litter(&self) -> Option<&LitterData> {
        match self {
            EntityData::Litter(litter) => Some(litter),
            _ => None,
        }
    }

    pub fn as_duck(&self) -> Option<&DuckData> {
        match self {
            EntityData::Duck(duck) => Some(duck),
            _ => None,
        }
    }

    pub fn as_duck_mut(&mut self) -> Option<&mut DuckData> {
        match self {
            EntityData::Duck(duck) => Some(duck),
            _ => None,
        }
    }
}
