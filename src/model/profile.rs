use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// XP needed to advance one display level.
pub const XP_PER_LEVEL: i32 = 1000;

// Fixed catalog ids of the three badge-gating achievement tiers.
pub const BEGINNER_ACHIEVEMENT_ID: Uuid = Uuid::from_u128(0x0cc95048_c100_4f6c_bf4c_3b2ec372cddb);
pub const INTERMEDIATE_ACHIEVEMENT_ID: Uuid =
    Uuid::from_u128(0x20775b28_295d_40a7_b403_8ac2046d5719);
pub const EXPERT_ACHIEVEMENT_ID: Uuid = Uuid::from_u128(0x946200c8_a676_4ffc_ab97_3015ddaa65af);

/// The `users` columns the profile view reads.
#[derive(Deserialize, Serialize, Debug, Clone, Queryable)]
pub struct UserRow {
    pub email: String,
    pub username: String,
    pub profile_photo: Option<String>,
    pub points: i32,
    pub xp: i32,
    pub badges1: bool,
    pub badges2: bool,
    pub badges3: bool,
    pub longest_quiz_streak: i32,
}

/// Display-level split of a raw xp total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress {
    pub level: i32,
    pub xp_in_level: i32,
    pub progress_fraction: f32,
}

impl LevelProgress {
    /// Splits a non-negative xp total into level, in-level remainder and
    /// the filled fraction of the current level bar.
    pub fn from_xp(xp: i32) -> Self {
        let xp_in_level = xp % XP_PER_LEVEL;
        LevelProgress {
            level: xp / XP_PER_LEVEL,
            xp_in_level,
            progress_fraction: xp_in_level as f32 / XP_PER_LEVEL as f32,
        }
    }
}

/// The unified profile view: persisted user state plus the derived display
/// fields and the externally-computed leaderboard rank.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProfileView {
    pub email: String,
    pub username: String,
    pub profile_photo: Option<String>,
    pub points: i32,
    pub xp: i32,
    pub badges1: bool,
    pub badges2: bool,
    pub badges3: bool,
    pub longest_quiz_streak: i32,

    pub level: i32,
    pub xp_in_level: i32,
    pub progress_fraction: f32,
    pub rank: Option<i64>,
}
