use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::NICKNAME_MAX_CHARS;

/// A row of the public leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: i32,
}

/// A submitted high score, as received from a client
#[derive(Debug, Clone, Deserialize)]
pub struct NewScore {
    pub nickname: String,
    pub score: i32,
}

impl NewScore {
    /// Trims the nickname and checks the submission is storable.
    pub fn validated(self) -> Result<Self, ScoreRejection> {
        let nickname = self.nickname.trim().to_string();
        let chars = nickname.chars().count();

        if chars == 0 {
            return Err(ScoreRejection::EmptyNickname);
        }

        if chars > NICKNAME_MAX_CHARS {
            return Err(ScoreRejection::NicknameTooLong {
                max: NICKNAME_MAX_CHARS,
            });
        }

        if self.score < 0 {
            return Err(ScoreRejection::NegativeScore);
        }

        Ok(Self {
            nickname,
            score: self.score,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveAck {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreRejection {
    #[error("nickname must not be empty")]
    EmptyNickname,

    #[error("nickname must be at most {max} characters")]
    NicknameTooLong { max: usize },

    #[error("score must not be negative")]
    NegativeScore,
}
