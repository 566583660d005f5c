//! The authoritative world simulator.
//!
//! Owns the registries of active players, monster instances, battles,
//! and scheduled world events, and advances them through a six-phase
//! tick. All registry mutation happens on the caller's thread: hosts
//! run one simulator per world shard and deliver external actions and
//! ticks through the same execution context, which is what keeps
//! read-modify-write on player records race-free.
//!
//! Time and randomness are injected. `tick` takes `now` so tests drive
//! virtual clocks; `tick_now` is the production convenience wrapper.

use crate::character::player::{Location, Player};
use crate::combat::combatant::{Combatant, CombatantKind};
use crate::combat::resolver::CombatResolver;
use crate::combat::types::{
    ActionResult, BattleEndReason, BattleInstance, BattleOutcome, BattleParticipant, BattleStatus,
};
use crate::core::constants::{
    BATTLE_CLEANUP_DELAY_SECONDS, EVENT_AUDIT_WINDOW_SECONDS, MELEE_ENGAGE_RANGE,
    MONSTER_CLEANUP_DELAY_SECONDS, PLAYTIME_FLUSH_SECONDS, SPAWN_CHECK_INTERVAL_SECONDS,
    TICK_INTERVAL_MS,
};
use crate::data::stores::{GameDataStore, PlayerStore};
use crate::data::templates::{AreaTemplate, EffectKind, MonsterBehavior, MonsterTemplate};
use crate::error::{EngineError, EngineResult};
use crate::progression::engine::{ExperienceSource, ProgressionEngine};
use crate::world::events::WorldEvent;
use crate::world::monster::{MonsterInstance, MonsterStatus};
use crate::world::registry::Registry;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// An externally requested combat action, routed to the resolver on the
/// acting player's turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerAction {
    Attack,
    UseSkill { skill_id: String },
    UseItem { item_id: String },
    Defend,
    Flee,
}

/// Registry counters for host dashboards and tests.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSnapshot {
    pub running: bool,
    pub tick_count: u64,
    pub player_count: usize,
    pub monster_count: usize,
    pub battle_count: usize,
    pub pending_event_count: usize,
}

pub struct WorldSimulator {
    players: Arc<dyn PlayerStore>,
    game_data: Arc<dyn GameDataStore>,
    resolver: CombatResolver,
    progression: ProgressionEngine,
    /// Area templates, loaded once at construction.
    areas: HashMap<String, AreaTemplate>,
    active_players: Registry<Player>,
    active_monsters: Registry<MonsterInstance>,
    active_battles: Registry<BattleInstance>,
    pending_events: Vec<WorldEvent>,
    running: bool,
    tick_count: u64,
    last_spawn_check: Option<DateTime<Utc>>,
    last_playtime_flush: Option<DateTime<Utc>>,
}

impl WorldSimulator {
    pub fn new(players: Arc<dyn PlayerStore>, game_data: Arc<dyn GameDataStore>) -> Self {
        let areas = game_data
            .all_areas()
            .into_iter()
            .map(|area| (area.id.clone(), area))
            .collect();
        Self {
            resolver: CombatResolver::new(game_data.clone(), players.clone()),
            progression: ProgressionEngine::new(players.clone()),
            players,
            game_data,
            areas,
            active_players: Registry::new(),
            active_monsters: Registry::new(),
            active_battles: Registry::new(),
            pending_events: Vec::new(),
            running: false,
            tick_count: 0,
            last_spawn_check: None,
            last_playtime_flush: None,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            log::warn!("world simulator is already running");
            return;
        }
        self.running = true;
        log::info!("world simulator started ({} areas)", self.areas.len());
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        log::info!("world simulator stopped after {} ticks", self.tick_count);
    }

    // ───────────────────────── tick ─────────────────────────

    /// Advances the world one tick at the given instant.
    ///
    /// Phases run in a fixed order; a failure inside one phase is logged
    /// and never aborts the remaining phases or future ticks.
    pub fn tick(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) {
        if !self.running {
            log::debug!("tick skipped: simulator is stopped");
            return;
        }
        self.tick_count += 1;

        // ── 1. Process due world events ─────────────────────────
        if let Err(err) = self.process_world_events(now) {
            log::error!("world event phase failed: {err}");
        }

        // ── 2. Monster AI ───────────────────────────────────────
        if let Err(err) = self.run_monster_ai(now) {
            log::error!("monster AI phase failed: {err}");
        }

        // ── 3. Update active battles ────────────────────────────
        if let Err(err) = self.update_battles(now, rng) {
            log::error!("battle update phase failed: {err}");
        }

        // ── 4. Player bookkeeping ───────────────────────────────
        if let Err(err) = self.accumulate_playtime(now) {
            log::error!("playtime phase failed: {err}");
        }

        // ── 5. Periodic monster spawning ────────────────────────
        if let Err(err) = self.run_spawn_checks(now, rng) {
            log::error!("spawn phase failed: {err}");
        }

        // ── 6. Cleanup expired monsters and battles ─────────────
        self.cleanup_expired(now);
    }

    /// Production wrapper: one tick against the wall clock.
    pub fn tick_now(&mut self, rng: &mut impl Rng) {
        self.tick(Utc::now(), rng);
    }

    fn process_world_events(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let due: Vec<WorldEvent> = self
            .pending_events
            .iter()
            .filter(|event| event.is_due(now))
            .cloned()
            .collect();
        for event in self.pending_events.iter_mut() {
            if event.is_due(now) {
                event.processed = true;
                event.processed_at = Some(now);
            }
        }

        for event in &due {
            self.handle_world_event(event, now);
        }

        // Processed events linger for the audit window, then go.
        self.pending_events.retain(|event| {
            !(event.processed
                && event
                    .processed_at
                    .map(|at| (now - at).num_seconds() >= EVENT_AUDIT_WINDOW_SECONDS)
                    .unwrap_or(false))
        });
        Ok(())
    }

    fn handle_world_event(&mut self, event: &WorldEvent, now: DateTime<Utc>) {
        match event.kind.as_str() {
            "spawn_monster" => {
                let template_id = event.payload.get("template_id").and_then(|v| v.as_str());
                let x = event.payload.get("x").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let y = event.payload.get("y").and_then(|v| v.as_f64()).unwrap_or(0.0);
                match (template_id, event.area_id.as_deref()) {
                    (Some(template_id), Some(area_id)) => {
                        if let Err(err) = self.spawn_monster(template_id, area_id, x, y, now) {
                            log::warn!("scheduled spawn of {template_id} failed: {err}");
                        }
                    }
                    _ => log::warn!(
                        "spawn_monster event {} is missing a template id or area",
                        event.id
                    ),
                }
            }
            // Host-defined kinds fire as notifications only; the audit
            // trail is what the host reads back.
            other => log::debug!("world event {} ({other}) fired", event.id),
        }
    }

    fn run_monster_ai(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let mut engagements: Vec<(String, String)> = Vec::new();

        for monster_id in self.active_monsters.ids() {
            let Some(monster) = self.active_monsters.get(&monster_id).cloned() else {
                continue;
            };
            if matches!(monster.status, MonsterStatus::Fighting | MonsterStatus::Dead) {
                continue;
            }
            // At most one evaluation per monster per tick period.
            if (now - monster.last_ai_at).num_milliseconds() < TICK_INTERVAL_MS {
                continue;
            }
            let Some(template) = self.game_data.monster(&monster.template_id) else {
                log::warn!(
                    "monster {} references unknown template {}",
                    monster.id,
                    monster.template_id
                );
                continue;
            };

            match monster.status {
                MonsterStatus::Idle => {
                    if template.behavior == MonsterBehavior::Aggressive {
                        let target = self.nearest_eligible_player(
                            &monster.area_id,
                            monster.x,
                            monster.y,
                            template.detection_range,
                        );
                        if let Some(target_id) = target {
                            if let Some(m) = self.active_monsters.get_mut(&monster_id) {
                                m.status = MonsterStatus::Hunting;
                                m.target_player_id = Some(target_id.clone());
                                log::debug!("{} begins hunting {target_id}", m.name);
                            }
                        }
                    }
                }
                MonsterStatus::Hunting => {
                    let target = monster.target_player_id.as_deref().and_then(|id| {
                        self.active_players
                            .get(id)
                            .filter(|p| {
                                p.location.area_id == monster.area_id
                                    && !self.entity_in_battle(id)
                            })
                            .map(|p| (id.to_string(), p.location.x, p.location.y))
                    });
                    match target {
                        Some((player_id, x, y)) => {
                            if let Some(m) = self.active_monsters.get_mut(&monster_id) {
                                m.step_towards(x, y, template.move_speed);
                                if m.distance_to(x, y) <= MELEE_ENGAGE_RANGE {
                                    engagements.push((player_id, monster_id.clone()));
                                }
                            }
                        }
                        None => {
                            // Target logged off, despawned, or is busy.
                            if let Some(m) = self.active_monsters.get_mut(&monster_id) {
                                m.disengage();
                            }
                        }
                    }
                }
                MonsterStatus::Fighting | MonsterStatus::Dead => {}
            }

            if let Some(m) = self.active_monsters.get_mut(&monster_id) {
                m.last_ai_at = now;
            }
        }

        for (player_id, monster_id) in engagements {
            match self.start_battle(&player_id, &monster_id, now) {
                Ok(battle_id) => log::debug!("monster {monster_id} engaged {player_id} ({battle_id})"),
                Err(err) => log::debug!("auto-engage by {monster_id} skipped: {err}"),
            }
        }
        Ok(())
    }

    fn update_battles(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> EngineResult<()> {
        for battle_id in self.active_battles.ids() {
            let outcome = match self.active_battles.get(&battle_id) {
                Some(battle) if battle.is_active() => self.resolver.check_battle_end(battle, now),
                _ => continue,
            };
            if let BattleOutcome::Ended { reason, winner_id } = outcome {
                if let Err(err) = self.conclude_battle(&battle_id, reason, winner_id, now, rng) {
                    log::error!("failed to conclude battle {battle_id}: {err}");
                }
                continue;
            }

            self.take_monster_turn(&battle_id, rng);

            // The monster's action may have decided the battle.
            let outcome = match self.active_battles.get(&battle_id) {
                Some(battle) if battle.is_active() => self.resolver.check_battle_end(battle, now),
                _ => continue,
            };
            if let BattleOutcome::Ended { reason, winner_id } = outcome {
                if let Err(err) = self.conclude_battle(&battle_id, reason, winner_id, now, rng) {
                    log::error!("failed to conclude battle {battle_id}: {err}");
                }
            }
        }
        Ok(())
    }

    /// Lets the monster act when the turn is its own: a basic attack on
    /// the opposing participant, once per tick at most.
    fn take_monster_turn(&mut self, battle_id: &str, rng: &mut impl Rng) {
        let (monster_id, player_id) = {
            let Some(battle) = self.active_battles.get(battle_id) else {
                return;
            };
            let Some(turn_id) = battle.active_turn_id() else {
                return;
            };
            let Some(actor) = battle.participant(turn_id) else {
                return;
            };
            if actor.kind != CombatantKind::Monster || !actor.is_alive() {
                return;
            }
            let Some(opponent) = battle.opponent_of(turn_id) else {
                return;
            };
            (turn_id.to_string(), opponent.id.clone())
        };

        let Some(attacker) = self.active_monsters.get(&monster_id).map(|m| m.combatant()) else {
            log::warn!("battle {battle_id}: monster {monster_id} is missing from the registry");
            return;
        };
        let Some(target) = self.active_players.get(&player_id).map(Combatant::from_player)
        else {
            log::warn!("battle {battle_id}: player {player_id} is missing from the registry");
            return;
        };

        if let Some(actor) = self
            .active_battles
            .get_mut(battle_id)
            .and_then(|b| b.participant_mut(&monster_id))
        {
            actor.defending = false;
        }

        let result = match self.active_battles.get_mut(battle_id) {
            Some(battle) => self.resolver.basic_attack(&attacker, &target, battle, rng),
            None => return,
        };
        log::debug!("{}", result.message);

        if let Some(battle) = self.active_battles.get_mut(battle_id) {
            battle.advance_turn();
        }
    }

    fn accumulate_playtime(&mut self, now: DateTime<Utc>) -> EngineResult<()> {
        let Some(last) = self.last_playtime_flush else {
            self.last_playtime_flush = Some(now);
            return Ok(());
        };
        let elapsed = (now - last).num_seconds();
        if elapsed < PLAYTIME_FLUSH_SECONDS {
            return Ok(());
        }
        self.last_playtime_flush = Some(now);

        for id in self.active_players.ids() {
            if let Err(err) = self.players.add_playtime(&id, elapsed as u64) {
                log::error!("playtime update failed for {id}: {err}");
                continue;
            }
            if let Some(player) = self.active_players.get_mut(&id) {
                player.playtime_seconds += elapsed as u64;
            }
        }
        Ok(())
    }

    fn run_spawn_checks(&mut self, now: DateTime<Utc>, rng: &mut impl Rng) -> EngineResult<()> {
        if let Some(last) = self.last_spawn_check {
            if (now - last).num_seconds() < SPAWN_CHECK_INTERVAL_SECONDS {
                return Ok(());
            }
        }
        self.last_spawn_check = Some(now);

        let mut due: Vec<(String, String, f64, f64)> = Vec::new();
        for area in self.areas.values() {
            for spawn in &area.spawns {
                let live = self.count_template_in_area(&spawn.template_id, &area.id);
                if live >= spawn.max_instances {
                    continue;
                }
                if rng.gen::<f64>() >= spawn.spawn_chance {
                    continue;
                }
                let x = rng.gen_range(spawn.x_range.0..=spawn.x_range.1);
                let y = rng.gen_range(spawn.y_range.0..=spawn.y_range.1);
                due.push((spawn.template_id.clone(), area.id.clone(), x, y));
            }
        }

        for (template_id, area_id, x, y) in due {
            match self.spawn_monster(&template_id, &area_id, x, y, now) {
                Ok(id) => log::debug!("spawned {template_id} {id} in {area_id}"),
                Err(err) => log::warn!("periodic spawn of {template_id} in {area_id} failed: {err}"),
            }
        }
        Ok(())
    }

    fn cleanup_expired(&mut self, now: DateTime<Utc>) {
        for id in self.active_monsters.ids() {
            let expired = self
                .active_monsters
                .get(&id)
                .map(|m| {
                    m.status == MonsterStatus::Dead
                        && m.died_at
                            .map(|at| (now - at).num_seconds() >= MONSTER_CLEANUP_DELAY_SECONDS)
                            .unwrap_or(false)
                })
                .unwrap_or(false);
            if expired {
                self.active_monsters.remove(&id);
                log::debug!("removed dead monster {id}");
            }
        }

        for id in self.active_battles.ids() {
            let expired = self
                .active_battles
                .get(&id)
                .map(|b| {
                    b.status == BattleStatus::Ended
                        && b.ended_at
                            .map(|at| (now - at).num_seconds() >= BATTLE_CLEANUP_DELAY_SECONDS)
                            .unwrap_or(false)
                })
                .unwrap_or(false);
            if expired {
                self.active_battles.remove(&id);
                log::debug!("removed ended battle {id}");
            }
        }
    }

    // ──────────────────── player lifecycle ────────────────────

    /// Brings a player into the world from the store.
    pub fn player_join(&mut self, player_id: &str) -> EngineResult<()> {
        if self.active_players.contains(player_id) {
            return Err(EngineError::state(format!(
                "{player_id} is already in the world"
            )));
        }
        let mut player = self
            .players
            .load_player(player_id)?
            .ok_or_else(|| EngineError::validation(format!("unknown player: {player_id}")))?;
        let area = self
            .areas
            .get(&player.location.area_id)
            .ok_or_else(|| {
                EngineError::validation(format!("unknown area: {}", player.location.area_id))
            })?;
        if self.players_in_area(&area.id).len() >= area.max_players {
            return Err(EngineError::state(format!("{} is full", area.name)));
        }

        player.online = true;
        self.players.update_online_status(player_id, true)?;
        log::debug!("{} joined {}", player.name, player.location.area_id);
        self.active_players.insert(player_id, player);
        Ok(())
    }

    /// Removes a player, ending any battle they were part of.
    pub fn player_leave(&mut self, player_id: &str, now: DateTime<Utc>) -> EngineResult<()> {
        if !self.active_players.contains(player_id) {
            return Err(EngineError::validation(format!(
                "{player_id} is not in the world"
            )));
        }
        if let Some(battle_id) = self.active_battle_id_for(player_id) {
            self.end_battle(&battle_id, BattleEndReason::PlayerLeft, None, now)?;
        }
        self.players.update_online_status(player_id, false)?;
        self.active_players.remove(player_id);
        log::debug!("{player_id} left the world");
        Ok(())
    }

    /// Relocates a player. Movement is blocked mid-battle.
    pub fn player_move(&mut self, player_id: &str, area_id: &str, x: f64, y: f64) -> EngineResult<()> {
        if !self.active_players.contains(player_id) {
            return Err(EngineError::validation(format!(
                "{player_id} is not in the world"
            )));
        }
        if self.active_battle_id_for(player_id).is_some() {
            return Err(EngineError::state("cannot move while in a battle"));
        }
        if !self.areas.contains_key(area_id) {
            return Err(EngineError::validation(format!("unknown area: {area_id}")));
        }

        let location = Location::new(area_id, x, y);
        self.players.update_location(player_id, &location)?;
        if let Some(player) = self.active_players.get_mut(player_id) {
            player.location = location;
        }
        Ok(())
    }

    // ─────────────────── monsters and battles ───────────────────

    /// Creates a monster instance from a template, subject to the area's
    /// per-template cap.
    pub fn spawn_monster(
        &mut self,
        template_id: &str,
        area_id: &str,
        x: f64,
        y: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<Uuid> {
        let template = self.game_data.monster(template_id).ok_or_else(|| {
            EngineError::validation(format!("unknown monster template: {template_id}"))
        })?;
        let area = self
            .areas
            .get(area_id)
            .ok_or_else(|| EngineError::validation(format!("unknown area: {area_id}")))?;
        let cap = area.template_cap(template_id);
        if self.count_template_in_area(template_id, area_id) >= cap {
            return Err(EngineError::state(format!(
                "{area_id} already holds {cap} of {template_id}"
            )));
        }

        let monster = MonsterInstance::from_template(&template, area_id, x, y, now);
        let id = monster.id;
        self.active_monsters.insert(id.to_string(), monster);
        Ok(id)
    }

    /// Opens a two-participant battle between a player and a monster.
    /// Either party already being in any active battle is a state
    /// conflict; only one battle may exist per entity.
    pub fn start_battle(
        &mut self,
        player_id: &str,
        monster_instance_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Uuid> {
        let player = self
            .active_players
            .get(player_id)
            .ok_or_else(|| EngineError::validation(format!("{player_id} is not in the world")))?;
        let monster = self.active_monsters.get(monster_instance_id).ok_or_else(|| {
            EngineError::validation(format!("unknown monster instance: {monster_instance_id}"))
        })?;
        if !monster.is_alive() {
            return Err(EngineError::state(format!("{} is already dead", monster.name)));
        }
        if player.location.area_id != monster.area_id {
            return Err(EngineError::state(format!(
                "{} and {} are not in the same area",
                player.name, monster.name
            )));
        }
        if self.entity_in_battle(player_id) {
            return Err(EngineError::state(format!(
                "{} is already in a battle",
                player.name
            )));
        }
        if self.entity_in_battle(monster_instance_id) {
            return Err(EngineError::state(format!(
                "{} is already in a battle",
                monster.name
            )));
        }

        let participants = vec![player_participant(player), monster_participant(monster)];
        let battle = BattleInstance::new(monster.area_id.clone(), participants, now);
        let battle_id = battle.id;
        self.active_battles.insert(battle_id.to_string(), battle);

        if let Some(m) = self.active_monsters.get_mut(monster_instance_id) {
            m.status = MonsterStatus::Fighting;
            m.target_player_id = Some(player_id.to_string());
        }
        log::debug!("battle {battle_id} started: {player_id} vs {monster_instance_id}");
        Ok(battle_id)
    }

    /// Routes a player's combat action to the resolver on their turn.
    ///
    /// Failures (not in a battle, wrong turn, short resources) come back
    /// as unsuccessful results rather than errors.
    pub fn player_action(
        &mut self,
        player_id: &str,
        action: PlayerAction,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> ActionResult {
        let Some(player) = self.active_players.get(player_id) else {
            return ActionResult::failure("player is not in the world");
        };
        let actor = Combatant::from_player(player);

        let Some(battle_id) = self.active_battle_id_for(player_id) else {
            return ActionResult::failure("not in a battle");
        };
        let Some(battle) = self.active_battles.get(&battle_id) else {
            return ActionResult::failure("battle not found");
        };
        if battle.active_turn_id() != Some(player_id) {
            return ActionResult::failure("it is not your turn");
        }
        let target = battle
            .participants
            .iter()
            .find(|p| p.kind == CombatantKind::Monster)
            .and_then(|p| self.active_monsters.get(&p.id))
            .map(|m| m.combatant());

        // A guard raised last turn drops the moment its owner acts again.
        if let Some(participant) = self
            .active_battles
            .get_mut(&battle_id)
            .and_then(|b| b.participant_mut(player_id))
        {
            participant.defending = false;
        }

        let result = match &action {
            PlayerAction::Attack => {
                let Some(target) = &target else {
                    return ActionResult::failure("no opposing combatant to attack");
                };
                match self.active_battles.get_mut(&battle_id) {
                    Some(battle) => self.resolver.basic_attack(&actor, target, battle, rng),
                    None => return ActionResult::failure("battle not found"),
                }
            }
            PlayerAction::UseSkill { skill_id } => {
                // Purely supportive skills fall back to the caster; any
                // offensive component aims at the opponent.
                let offensive = self
                    .game_data
                    .skill(skill_id)
                    .map(|s| {
                        s.effects
                            .iter()
                            .any(|e| matches!(e.kind, EffectKind::Damage | EffectKind::Debuff))
                    })
                    .unwrap_or(true);
                let skill_target = if offensive { target.as_ref() } else { None };
                match self.active_battles.get_mut(&battle_id) {
                    Some(battle) => {
                        self.resolver
                            .use_skill(&actor, skill_target, skill_id, battle, rng)
                    }
                    None => return ActionResult::failure("battle not found"),
                }
            }
            PlayerAction::UseItem { item_id } => match self.active_battles.get_mut(&battle_id) {
                Some(battle) => self.resolver.use_item(&actor, item_id, battle),
                None => return ActionResult::failure("battle not found"),
            },
            PlayerAction::Defend => match self.active_battles.get_mut(&battle_id) {
                Some(battle) => self.resolver.defend(player_id, battle),
                None => return ActionResult::failure("battle not found"),
            },
            PlayerAction::Flee => match self.active_battles.get(&battle_id) {
                Some(battle) => self.resolver.attempt_flee(&actor, battle, rng),
                None => return ActionResult::failure("battle not found"),
            },
        };

        if let PlayerAction::Flee = action {
            if result.success {
                if let Err(err) =
                    self.conclude_battle(&battle_id, BattleEndReason::Fled, None, now, rng)
                {
                    log::error!("failed to end battle {battle_id} after flee: {err}");
                }
            } else {
                // A failed escape roll still spends the turn.
                if let Some(battle) = self.active_battles.get_mut(&battle_id) {
                    battle.advance_turn();
                }
            }
            return result;
        }

        if !result.success {
            return result;
        }
        if let Some(battle) = self.active_battles.get_mut(&battle_id) {
            battle.advance_turn();
        }

        let outcome = match self.active_battles.get(&battle_id) {
            Some(battle) if battle.is_active() => self.resolver.check_battle_end(battle, now),
            _ => BattleOutcome::Ongoing,
        };
        if let BattleOutcome::Ended { reason, winner_id } = outcome {
            if let Err(err) = self.conclude_battle(&battle_id, reason, winner_id, now, rng) {
                log::error!("failed to conclude battle {battle_id}: {err}");
            }
        }
        result
    }

    /// Runs the reward flow for a player victory, then ends the battle.
    fn conclude_battle(
        &mut self,
        battle_id: &str,
        reason: BattleEndReason,
        winner_id: Option<String>,
        now: DateTime<Utc>,
        rng: &mut impl Rng,
    ) -> EngineResult<()> {
        if reason == BattleEndReason::Victory {
            if let Some(winner) = winner_id.as_deref() {
                if self.active_players.contains(winner) {
                    if let Err(err) = self.grant_battle_rewards(battle_id, winner, rng) {
                        log::error!("reward grant failed for battle {battle_id}: {err}");
                    }
                }
            }
        }
        self.end_battle(battle_id, reason, winner_id, now)
    }

    fn grant_battle_rewards(
        &mut self,
        battle_id: &str,
        winner_id: &str,
        rng: &mut impl Rng,
    ) -> EngineResult<()> {
        let Some(battle) = self.active_battles.get(battle_id) else {
            return Ok(());
        };
        let defeated: Vec<MonsterTemplate> = battle
            .participants
            .iter()
            .filter(|p| p.kind == CombatantKind::Monster && !p.is_alive())
            .filter_map(|p| self.active_monsters.get(&p.id))
            .filter_map(|m| self.game_data.monster(&m.template_id))
            .collect();
        if defeated.is_empty() {
            return Ok(());
        }

        let winner_level = self
            .active_players
            .get(winner_id)
            .map(|p| p.level)
            .unwrap_or(1);
        let refs: Vec<&MonsterTemplate> = defeated.iter().collect();
        let rewards = self.resolver.calculate_battle_rewards(winner_level, &refs, rng);
        log::debug!(
            "battle {battle_id} rewards: {} xp, {} gold, {} item stack(s)",
            rewards.experience,
            rewards.gold,
            rewards.items.len()
        );

        if let Some(player) = self.active_players.get_mut(winner_id) {
            player.gold += rewards.gold;
            self.players.save_player(player)?;
        }
        for item in &rewards.items {
            self.players.add_item(winner_id, &item.item_id, item.quantity)?;
        }
        self.progression
            .add_experience(winner_id, rewards.experience, ExperienceSource::Combat, 1.0)?;

        // The store is authoritative after progression ran; refresh the
        // registry copy so later snapshots see the new level.
        if let Some(fresh) = self.players.load_player(winner_id)? {
            self.active_players.insert(winner_id, fresh);
        }
        Ok(())
    }

    /// Marks a battle ended and settles its monster participants: dead
    /// at 0 HP, back to idle wandering otherwise.
    fn end_battle(
        &mut self,
        battle_id: &str,
        reason: BattleEndReason,
        winner_id: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let Some(battle) = self.active_battles.get_mut(battle_id) else {
            return Err(EngineError::validation(format!("unknown battle: {battle_id}")));
        };
        if !battle.is_active() {
            return Ok(());
        }
        battle.end(reason, winner_id, now);
        let monster_states: Vec<(String, u32)> = battle
            .participants
            .iter()
            .filter(|p| p.kind == CombatantKind::Monster)
            .map(|p| (p.id.clone(), p.current_hp))
            .collect();

        for (id, hp) in monster_states {
            if let Some(monster) = self.active_monsters.get_mut(&id) {
                if hp == 0 {
                    monster.mark_dead(now);
                } else {
                    monster.current_hp = hp;
                    monster.disengage();
                }
            }
        }
        log::debug!("battle {battle_id} ended: {reason:?}");
        Ok(())
    }

    // ───────────────────────── queries ─────────────────────────

    /// Schedules a one-shot world event; returns its id for auditing.
    pub fn schedule_world_event(
        &mut self,
        kind: impl Into<String>,
        area_id: Option<String>,
        payload: serde_json::Value,
        trigger_at: DateTime<Utc>,
    ) -> Uuid {
        let event = WorldEvent::new(kind, area_id, payload, trigger_at);
        let id = event.id;
        self.pending_events.push(event);
        id
    }

    pub fn game_state(&self) -> WorldSnapshot {
        WorldSnapshot {
            running: self.running,
            tick_count: self.tick_count,
            player_count: self.active_players.len(),
            monster_count: self.active_monsters.len(),
            battle_count: self.active_battles.len(),
            pending_event_count: self.pending_events.len(),
        }
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.active_players.get(player_id)
    }

    pub fn monster(&self, monster_id: &str) -> Option<&MonsterInstance> {
        self.active_monsters.get(monster_id)
    }

    pub fn battle(&self, battle_id: &str) -> Option<&BattleInstance> {
        self.active_battles.get(battle_id)
    }

    pub fn players_in_area(&self, area_id: &str) -> Vec<&Player> {
        self.active_players
            .iter()
            .filter(|(_, p)| p.location.area_id == area_id)
            .map(|(_, p)| p)
            .collect()
    }

    pub fn monsters_in_area(&self, area_id: &str) -> Vec<&MonsterInstance> {
        self.active_monsters
            .iter()
            .filter(|(_, m)| m.area_id == area_id)
            .map(|(_, m)| m)
            .collect()
    }

    /// The active battle an entity participates in, if any.
    pub fn active_battle_for(&self, entity_id: &str) -> Option<&BattleInstance> {
        self.active_battles
            .iter()
            .map(|(_, b)| b)
            .find(|b| b.is_active() && b.contains(entity_id))
    }

    fn active_battle_id_for(&self, entity_id: &str) -> Option<String> {
        self.active_battles
            .iter()
            .find(|(_, b)| b.is_active() && b.contains(entity_id))
            .map(|(id, _)| id.to_string())
    }

    fn entity_in_battle(&self, entity_id: &str) -> bool {
        self.active_battles
            .iter()
            .any(|(_, b)| b.is_active() && b.contains(entity_id))
    }

    fn nearest_eligible_player(
        &self,
        area_id: &str,
        x: f64,
        y: f64,
        range: f64,
    ) -> Option<String> {
        let mut best: Option<(String, f64)> = None;
        for (id, player) in self.active_players.iter() {
            if player.location.area_id != area_id || self.entity_in_battle(id) {
                continue;
            }
            let distance = player.location.distance_to(x, y);
            if distance > range {
                continue;
            }
            if best.as_ref().map(|(_, d)| distance < *d).unwrap_or(true) {
                best = Some((id.to_string(), distance));
            }
        }
        best.map(|(id, _)| id)
    }

    fn count_template_in_area(&self, template_id: &str, area_id: &str) -> usize {
        self.active_monsters
            .iter()
            .filter(|(_, m)| {
                m.template_id == template_id
                    && m.area_id == area_id
                    && m.status != MonsterStatus::Dead
            })
            .count()
    }
}

fn player_participant(player: &Player) -> BattleParticipant {
    let stats = player.derived_stats();
    BattleParticipant {
        id: player.id.clone(),
        kind: CombatantKind::Player,
        name: player.name.clone(),
        level: player.level,
        current_hp: stats.max_hp,
        max_hp: stats.max_hp,
        current_mp: stats.max_mp,
        max_mp: stats.max_mp,
        position: (player.location.x, player.location.y),
        defending: false,
    }
}

fn monster_participant(monster: &MonsterInstance) -> BattleParticipant {
    let stats = monster.stats();
    BattleParticipant {
        id: monster.id.to_string(),
        kind: CombatantKind::Monster,
        name: monster.name.clone(),
        level: monster.level,
        current_hp: monster.current_hp,
        max_hp: stats.max_hp,
        current_mp: monster.current_mp,
        max_mp: stats.max_mp,
        position: (monster.x, monster.y),
        defending: false,
    }
}
