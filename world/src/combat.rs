//! Attack resolution, poison, and death handling.
//!
//! All state mutation stays inside the world crate; behavior systems only
//! decide *what* to attempt and the resolution here decides what actually
//! happens.

use deepdelve_core::{ActorId, ActorKind, GridError, Point, Power, Stats};
use rand::{Rng, RngCore};

use crate::{query, relocate, Item, Level, LineOfSight};

/// Attempts to strike the target with the attacker's power.
///
/// Returns `Ok(false)` without side effects when the strike cannot happen:
/// the target is out of sight or beyond the power's reach. Returns `Ok(true)`
/// once the power resolved, whether or not the damage roll connected.
pub(crate) fn attempt_attack(
    level: &mut Level,
    attacker: ActorId,
    target: ActorId,
    rng: &mut dyn RngCore,
    los: LineOfSight<'_>,
) -> Result<bool, GridError> {
    let Some(from) = level.actors.get(attacker).map(|org| org.position()) else {
        return Ok(false);
    };
    let Some(to) = level.actors.get(target).map(|org| org.position()) else {
        return Ok(false);
    };

    if !query::is_visible(level, attacker, to, los) {
        return Ok(false);
    }

    let power = match level.actors.get(attacker) {
        Some(org) => org.power(),
        None => return Ok(false),
    };
    if from.range_to(to) > power.attack_range() {
        return Ok(false);
    }

    match power {
        Power::Poison {
            damage_modifier,
            duration,
        } => {
            let base_damage = level
                .actors
                .get(attacker)
                .map_or(0, |org| org.stats().base_damage);
            let per_turn = (damage_modifier * base_damage as f32).ceil() as i32;
            if let Some(victim) = level.actors.get_mut(target) {
                victim.set_poison(per_turn, duration);
            }
            Ok(true)
        }
        Power::BasicMelee { .. } | Power::BasicRanged { .. } => {
            let damage = roll_damage(level, attacker, target, power, rng);
            let _ = apply_damage(level, target, damage)?;
            Ok(true)
        }
        Power::BounceBack { .. } => {
            let damage = roll_damage(level, attacker, target, power, rng);
            let died = apply_damage(level, target, damage)?;
            if !died {
                bounce(level, attacker, target, from, to)?;
            }
            Ok(true)
        }
    }
}

/// Knocks the victim one cell further along the attack direction, or the
/// attacker one cell back when the victim has nowhere to go.
fn bounce(
    level: &mut Level,
    attacker: ActorId,
    target: ActorId,
    from: Point,
    to: Point,
) -> Result<(), GridError> {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();

    let pushed = to.translate(dx, dy);
    if level.grid.is_open(pushed.x(), pushed.y()) {
        return relocate(level, target, pushed);
    }

    let retreat = from.translate(-dx, -dy);
    if level.grid.is_open(retreat.x(), retreat.y()) {
        return relocate(level, attacker, retreat);
    }

    Ok(())
}

fn roll_damage(
    level: &Level,
    attacker: ActorId,
    target: ActorId,
    power: Power,
    rng: &mut dyn RngCore,
) -> i32 {
    let (Some(attacker_stats), Some(target_stats)) = (
        level.actors.get(attacker).map(|org| org.stats().clone()),
        level.actors.get(target).map(|org| org.stats().clone()),
    ) else {
        return 0;
    };

    if rng.gen::<f32>() > attacker_stats.chance_to_hit {
        return 0;
    }

    let reduction = (target_stats.armor - attacker_stats.piercing).max(0);
    let mut modified = attacker_stats.base_damage as f32 * power.damage_modifier();
    modified *= rng.gen::<f32>() / 5.0 + 0.9;
    modified -= reduction as f32;
    modified.ceil() as i32
}

/// Applies direct damage to the victim, handling death. A non-positive roll
/// is a miss and leaves the victim untouched. Returns whether the victim
/// died.
pub(crate) fn apply_damage(
    level: &mut Level,
    victim: ActorId,
    damage: i32,
) -> Result<bool, GridError> {
    if damage <= 0 {
        return Ok(false);
    }
    let Some(org) = level.actors.get_mut(victim) else {
        return Ok(false);
    };
    let health = org.stats().health();
    org.stats_mut().set_health(health - damage);
    if org.stats().is_alive() {
        return Ok(false);
    }
    handle_death(level, victim)?;
    Ok(true)
}

/// Ticks the actor's poison at the start of its turn. Returns whether the
/// poison killed it.
pub(crate) fn tick_poison(level: &mut Level, actor: ActorId) -> Result<bool, GridError> {
    let Some(org) = level.actors.get_mut(actor) else {
        // The record is gone; make sure the order agrees.
        level.scheduler.remove(actor);
        return Ok(true);
    };
    if org.poison_duration() == 0 {
        return Ok(false);
    }
    org.tick_poison();
    if org.stats().is_alive() {
        return Ok(false);
    }
    handle_death(level, actor)?;
    Ok(true)
}

/// Resolves a death: monsters vacate the grid and the initiative order, drop
/// a corpse, and award the player experience. The player's record stays in
/// place so the caller can observe the outcome.
fn handle_death(level: &mut Level, victim: ActorId) -> Result<(), GridError> {
    let Some(org) = level.actors.get(victim) else {
        return Ok(());
    };
    if org.kind() == ActorKind::Player {
        return Ok(());
    }

    let position = org.position();
    let power = org.power();
    let health_bonus = org.stats().max_health();
    let monster_level = org.stats().level;

    let _ = level.grid.remove_organism(position.x(), position.y())?;
    level.scheduler.remove(victim);
    let _ = level.actors.remove(victim);

    let corpse = level.items.insert(Item::Corpse {
        power,
        health_bonus,
    });
    level.grid.push_item(corpse, position.x(), position.y())?;

    award_kill_xp(level, monster_level);
    Ok(())
}

/// Experience is scaled by the level gap: kills above the player's level pay
/// double per level of difference, kills below pay half.
fn award_kill_xp(level: &mut Level, monster_level: i32) {
    let Some(player) = level.player else {
        return;
    };
    let floor_start = level.floor_start;
    let kills_per_level = level.kills_per_level.max(1);
    let Some(org) = level.actors.get_mut(player) else {
        return;
    };

    let gap = monster_level - org.stats().level;
    let modifier = 2.0_f32.powi(gap);
    let reward = (org.stats().xp_max as f32 / kills_per_level as f32 * modifier).ceil() as i32;
    org.stats_mut().xp += reward;

    if org.stats().xp >= org.stats().xp_max {
        let next_level = org.stats().level + 1;
        org.replace_stats(Stats::for_player(next_level, floor_start));
    }
}
