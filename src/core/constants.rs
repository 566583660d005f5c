// Tick and timing
pub const TICK_INTERVAL_MS: i64 = 1000;
pub const SPAWN_CHECK_INTERVAL_SECONDS: i64 = 30;
pub const PLAYTIME_FLUSH_SECONDS: i64 = 60;

// Battle lifecycle
pub const BATTLE_TIMEOUT_SECONDS: i64 = 30 * 60;
pub const BATTLE_CLEANUP_DELAY_SECONDS: i64 = 30;
pub const MONSTER_CLEANUP_DELAY_SECONDS: i64 = 5 * 60;
pub const EVENT_AUDIT_WINDOW_SECONDS: i64 = 60;

// Hit chance: base + (accuracy - evasion) * factor, clamped
pub const HIT_CHANCE_BASE: f64 = 95.0 - 5.0;
pub const HIT_CHANCE_ACCURACY_FACTOR: f64 = 0.5;
pub const HIT_CHANCE_MIN: f64 = 10.0;
pub const HIT_CHANCE_MAX: f64 = 95.0;

// Critical strikes
pub const CRIT_CHANCE_BASE: f64 = 5.0;
pub const CRIT_CHANCE_PER_LUCK: f64 = 0.1;
pub const CRIT_CHANCE_MAX: f64 = 50.0;
pub const CRIT_DAMAGE_MULTIPLIER: f64 = 1.5;

// Damage
pub const DEFENSE_MITIGATION_FACTOR: f64 = 0.5;
pub const DAMAGE_VARIANCE: f64 = 0.2;
pub const DEFEND_DAMAGE_REDUCTION: f64 = 0.5;

// Flee chance: base + (evasion - pivot) * factor + level_diff * level_factor
pub const FLEE_CHANCE_BASE: f64 = 50.0;
pub const FLEE_EVASION_PIVOT: f64 = 50.0;
pub const FLEE_EVASION_FACTOR: f64 = 0.5;
pub const FLEE_LEVEL_DIFF_FACTOR: f64 = 5.0;
pub const FLEE_CHANCE_MIN: f64 = 10.0;
pub const FLEE_CHANCE_MAX: f64 = 90.0;

// Monster AI
pub const MELEE_ENGAGE_RANGE: f64 = 1.5;
pub const DEFAULT_MONSTERS_PER_TEMPLATE: usize = 10;

// Character stats
pub const BASE_STAT_VALUE: u32 = 10;
pub const NUM_STATS: usize = 5;

// Derived stat formulas
pub const BASE_HP: u32 = 100;
pub const HP_PER_VITALITY: u32 = 10;
pub const HP_PER_LEVEL: u32 = 5;
pub const BASE_MP: u32 = 50;
pub const MP_PER_INTELLIGENCE: u32 = 8;
pub const MP_PER_LEVEL: u32 = 3;
pub const BASE_ATTACK: u32 = 10;
pub const ATTACK_PER_STRENGTH: u32 = 2;
pub const BASE_DEFENSE: u32 = 5;
pub const ACCURACY_PER_DEXTERITY: u32 = 2;

// XP curve: floor(base * growth^(level - 2)) to advance past `level`
pub const XP_CURVE_BASE: f64 = 100.0;
pub const XP_CURVE_GROWTH: f64 = 1.2;
pub const MAX_LEVEL: u32 = 9999;

// Level-up rewards
pub const STAT_POINTS_PER_LEVEL: u32 = 5;
pub const SKILL_POINTS_PER_LEVEL: u32 = 1;
pub const GOLD_BONUS_LEVEL_INTERVAL: u32 = 10;
pub const GOLD_BONUS_PER_LEVEL: u64 = 100;
pub const MAJOR_BONUS_LEVEL_INTERVAL: u32 = 50;
pub const MAJOR_GOLD_BONUS_PER_LEVEL: u64 = 500;
pub const MILESTONE_LEVEL_INTERVAL: u32 = 100;
pub const MILESTONE_STAT_POINTS: u32 = 5;
pub const MILESTONE_ITEM_ID: &str = "milestone_cache";

// High-level XP brackets: gains compound by the bonus at each threshold
pub const LEVEL_BRACKET_BONUS: f64 = 1.1;
pub const LEVEL_BRACKETS: [u32; 3] = [100, 500, 1000];

// Stat allocation
pub const STAT_CAP_PER_LEVEL: u32 = 10;

// Battle rewards: XP scaling by winner/monster level gap
pub const REWARD_LEVEL_GAP: u32 = 5;
pub const OVERLEVEL_EXP_SCALE: f64 = 0.1;
pub const UNDERLEVEL_EXP_SCALE: f64 = 1.5;

// Party experience
pub const PARTY_BONUS_MULTIPLIER: f64 = 1.2;
pub const PARTY_LEVEL_FACTOR_PER_LEVEL: f64 = 0.05;
pub const PARTY_LEVEL_FACTOR_MIN: f64 = 0.5;
pub const PARTY_LEVEL_FACTOR_MAX: f64 = 1.5;
