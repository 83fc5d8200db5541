use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

use super::{
    opt_string_encode_size, read_opt_string, read_string, string_encode_size, write_opt_string,
    write_string, MAX_DISPLAY_NAME_LENGTH, MAX_NAME_LENGTH, MAX_PLAYER_ID_LENGTH,
    MAX_TAPS_PER_BATCH, MIN_TAPS_PER_BATCH, PLAYER_ID_PREFIX,
};

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum ValidationError {
    #[error("tap count out of range (got={got}, min={min}, max={max})")]
    TapsOutOfRange { got: u32, min: u32, max: u32 },
    #[error("player id is empty")]
    EmptyPlayerId,
    #[error("player id too long (len={len}, max={max})")]
    PlayerIdTooLong { len: usize, max: usize },
}

/// Stable player key, `tg:<platform id>` for players coming from the chat platform.
///
/// Every constructor enforces the length bound, so an id that can be built can always be decoded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    pub fn from_platform_id(platform_id: u64) -> Self {
        Self(format!("{PLAYER_ID_PREFIX}{platform_id}"))
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyPlayerId);
        }
        if trimmed.len() > MAX_PLAYER_ID_LENGTH {
            return Err(ValidationError::PlayerIdTooLong {
                len: trimmed.len(),
                max: MAX_PLAYER_ID_LENGTH,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Platform-native user id encoded in the key, if any.
    pub fn platform_id(&self) -> Option<u64> {
        let digits = self.0.strip_prefix(PLAYER_ID_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerId {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Write for PlayerId {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.0, writer);
    }
}

impl Read for PlayerId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let raw = read_string(reader, MAX_PLAYER_ID_LENGTH)?;
        if raw.is_empty() {
            return Err(Error::Invalid("PlayerId", "empty"));
        }
        Ok(Self(raw))
    }
}

impl EncodeSize for PlayerId {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.0)
    }
}

/// A client-submitted tap count that passed range validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapBatch(u32);

impl TapBatch {
    pub fn new(taps: u32) -> Result<Self, ValidationError> {
        if !(MIN_TAPS_PER_BATCH..=MAX_TAPS_PER_BATCH).contains(&taps) {
            return Err(ValidationError::TapsOutOfRange {
                got: taps,
                min: MIN_TAPS_PER_BATCH,
                max: MAX_TAPS_PER_BATCH,
            });
        }
        Ok(Self(taps))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

/// Truncates a user-supplied name to `MAX_NAME_LENGTH` bytes on a char boundary.
pub fn clamp_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() <= MAX_NAME_LENGTH {
        return trimmed.to_string();
    }
    let mut end = MAX_NAME_LENGTH;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}

/// Full name when present, else `@handle`, else the player id.
pub fn display_name(
    id: &PlayerId,
    first_name: &str,
    last_name: &str,
    username: Option<&str>,
) -> String {
    let full_name = [first_name.trim(), last_name.trim()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !full_name.is_empty() {
        return full_name;
    }
    if let Some(handle) = username.map(|u| u.trim_start_matches('@')).filter(|u| !u.is_empty()) {
        return format!("@{handle}");
    }
    id.to_string()
}

/// Authoritative per-player game state.
///
/// Timestamps are Unix milliseconds; `last_tap_second` is a Unix second.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub platform_id: Option<u64>,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,

    pub points: u64,
    pub level: u32,
    pub multiplier: u32,

    pub referrals: u64,
    pub referred_by: Option<u64>,

    pub daily_bonus_claimed_at: Option<u64>,
    pub lottery_joined: bool,
    pub lottery_entered_at: Option<u64>,
    pub night_mode_unlocked: bool,

    pub last_tap_second: u64,
    pub taps_in_second: u32,

    pub created_at: u64,
    pub updated_at: u64,
}

impl PlayerRecord {
    /// Fresh record with every counter zeroed.
    pub fn new(id: PlayerId, now: u64) -> Self {
        let platform_id = id.platform_id();
        let display_name = display_name(&id, "", "", None);
        Self {
            id,
            platform_id,
            username: None,
            first_name: String::new(),
            last_name: String::new(),
            display_name,
            points: 0,
            level: 1,
            multiplier: 1,
            referrals: 0,
            referred_by: None,
            daily_bonus_claimed_at: None,
            lottery_joined: false,
            lottery_entered_at: None,
            night_mode_unlocked: false,
            last_tap_second: 0,
            taps_in_second: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn refresh_display_name(&mut self) {
        self.display_name = display_name(
            &self.id,
            &self.first_name,
            &self.last_name,
            self.username.as_deref(),
        );
    }
}

impl Write for PlayerRecord {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.platform_id.write(writer);
        write_opt_string(&self.username, writer);
        write_string(&self.first_name, writer);
        write_string(&self.last_name, writer);
        write_string(&self.display_name, writer);
        self.points.write(writer);
        self.level.write(writer);
        self.multiplier.write(writer);
        self.referrals.write(writer);
        self.referred_by.write(writer);
        self.daily_bonus_claimed_at.write(writer);
        self.lottery_joined.write(writer);
        self.lottery_entered_at.write(writer);
        self.night_mode_unlocked.write(writer);
        self.last_tap_second.write(writer);
        self.taps_in_second.write(writer);
        self.created_at.write(writer);
        self.updated_at.write(writer);
    }
}

impl Read for PlayerRecord {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: PlayerId::read(reader)?,
            platform_id: Option::<u64>::read(reader)?,
            username: read_opt_string(reader, MAX_NAME_LENGTH)?,
            first_name: read_string(reader, MAX_NAME_LENGTH)?,
            last_name: read_string(reader, MAX_NAME_LENGTH)?,
            display_name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            points: u64::read(reader)?,
            level: u32::read(reader)?,
            multiplier: u32::read(reader)?,
            referrals: u64::read(reader)?,
            referred_by: Option::<u64>::read(reader)?,
            daily_bonus_claimed_at: Option::<u64>::read(reader)?,
            lottery_joined: bool::read(reader)?,
            lottery_entered_at: Option::<u64>::read(reader)?,
            night_mode_unlocked: bool::read(reader)?,
            last_tap_second: u64::read(reader)?,
            taps_in_second: u32::read(reader)?,
            created_at: u64::read(reader)?,
            updated_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for PlayerRecord {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.platform_id.encode_size()
            + opt_string_encode_size(&self.username)
            + string_encode_size(&self.first_name)
            + string_encode_size(&self.last_name)
            + string_encode_size(&self.display_name)
            + self.points.encode_size()
            + self.level.encode_size()
            + self.multiplier.encode_size()
            + self.referrals.encode_size()
            + self.referred_by.encode_size()
            + self.daily_bonus_claimed_at.encode_size()
            + self.lottery_joined.encode_size()
            + self.lottery_entered_at.encode_size()
            + self.night_mode_unlocked.encode_size()
            + self.last_tap_second.encode_size()
            + self.taps_in_second.encode_size()
            + self.created_at.encode_size()
            + self.updated_at.encode_size()
    }
}
