use engine::{Entity, EntityId, EntityKind, GameState, WorldCoords};

/// Ticks before a piece of litter decays away.
pub const LITTER_LIFETIME_TICKS: u32 = 1024;

/// Height above which a balloon pops.
pub const BALLOON_POP_HEIGHT: i32 = 320;

/// How far a duck paddles per tick, in world units.
const DUCK_STEP: i32 = 2;

/// Advance every entity kind with per-tick behaviour. Deterministic: the
/// same state and tick always produce the same result.
pub fn tick_entities(state: &mut GameState, tick: u32) {
    tick_ducks(state);
    tick_balloons(state);
    tick_litter(state, tick);
    tick_money_effects(state);
}

fn ids_of_kind(state: &GameState, kind: EntityKind) -> Vec<EntityId> {
    state.entities.entities_of_kind(kind).map(Entity::id).collect()
}

/// Ducks paddle toward their stored target and idle once they arrive.
fn tick_ducks(state: &mut GameState) {
    for id in ids_of_kind(state, EntityKind::Duck) {
        let Some(entity) = state.entities.try_get(id) else {
            continue;
        };
        let Some(position) = entity.position() else {
            continue;
        };
        let Some(duck) = entity.data.as_duck() else {
            continue;
        };

        let dx = (duck.target_x - position.x).clamp(-DUCK_STEP, DUCK_STEP);
        let dy = (duck.target_y - position.y).clamp(-DUCK_STEP, DUCK_STEP);
        if dx == 0 && dy == 0 {
            continue;
        }
        let next = WorldCoords::new(position.x + dx, position.y + dy);
        let z = state
            .map
            .element_water_height(next)
            .max(state.map.element_height(next));
        state.entities.set_position(id, Some(next), z);
    }
}

/// Balloons rise one step per tick and pop once out of sight.
fn tick_balloons(state: &mut GameState) {
    for id in ids_of_kind(state, EntityKind::Balloon) {
        let Some(entity) = state.entities.try_get(id) else {
            continue;
        };
        let Some(position) = entity.position() else {
            continue;
        };
        let z = entity.z() + 1;
        if z > BALLOON_POP_HEIGHT {
            state.entities.remove(id);
        } else {
            state.entities.set_position(id, Some(position), z);
        }
    }
}

/// Litter decays after a fixed lifetime.
fn tick_litter(state: &mut GameState, tick: u32) {
    for id in ids_of_kind(state, EntityKind::Litter) {
        let created = state
            .entities
            .try_get(id)
            .and_then(|entity| entity.data.as_litter().map(|litter| litter.creation_tick));
        let Some(created) = created else {
            continue;
        };
        if tick.saturating_sub(created) >= LITTER_LIFETIME_TICKS {
            state.entities.remove(id);
        }
    }
}

/// Money effects float up briefly, then vanish.
fn tick_money_effects(state: &mut GameState) {
    for id in ids_of_kind(state, EntityKind::MoneyEffect) {
        let Some(entity) = state.entities.try_get_mut(id) else {
            continue;
        };
        let position = entity.position();
        let z = entity.z() + 1;
        let expired = match entity.data {
            engine::EntityData::MoneyEffect(ref mut effect) => {
                if effect.move_delay == 0 {
                    true
                } else {
                    effect.move_delay -= 1;
                    false
                }
            }
            _ => continue,
        };
        if expired {
            state.entities.remove(id);
        } else {
            state.entities.set_position(id, position, z);
        }
    }
}
