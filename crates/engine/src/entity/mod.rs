mod kinds;
mod pool;

pub use kinds::{
    BalloonData, CrashedVehicleParticleData, DuckData, EntityData, EntityKind, GuestData,
    JumpingFountainData, LitterData, MoneyEffectData, StaffData, VehicleData,
};
pub use pool::{
    Entity, EntityError, EntityId, EntityIter, EntityPool, EntitySnapshot, MAX_ENTITIES,
};
