use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use serde::{Deserialize, Serialize};

use super::{read_string, string_encode_size, write_string, PlayerId, MAX_DISPLAY_NAME_LENGTH};

/// Denormalized ranking row kept in lockstep with a `PlayerRecord`.
///
/// Not authoritative: when the two disagree the player record wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RatingRow {
    pub id: PlayerId,
    pub platform_id: Option<u64>,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub referrals: u64,
    pub updated_at: u64,
}

impl Write for RatingRow {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.platform_id.write(writer);
        write_string(&self.display_name, writer);
        self.points.write(writer);
        self.level.write(writer);
        self.referrals.write(writer);
        self.updated_at.write(writer);
    }
}

impl Read for RatingRow {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: PlayerId::read(reader)?,
            platform_id: Option::<u64>::read(reader)?,
            display_name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            points: u64::read(reader)?,
            level: u32::read(reader)?,
            referrals: u64::read(reader)?,
            updated_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for RatingRow {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.platform_id.encode_size()
            + string_encode_size(&self.display_name)
            + self.points.encode_size()
            + self.level.encode_size()
            + self.referrals.encode_size()
            + self.updated_at.encode_size()
    }
}

/// Snapshot of a player taken when they joined the lottery. Never updated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotteryEntry {
    pub uid: PlayerId,
    pub platform_id: Option<u64>,
    pub display_name: String,
    pub points: u64,
    pub level: u32,
    pub entered_at: u64,
}

impl Write for LotteryEntry {
    fn write(&self, writer: &mut impl BufMut) {
        self.uid.write(writer);
        self.platform_id.write(writer);
        write_string(&self.display_name, writer);
        self.points.write(writer);
        self.level.write(writer);
        self.entered_at.write(writer);
    }
}

impl Read for LotteryEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            uid: PlayerId::read(reader)?,
            platform_id: Option::<u64>::read(reader)?,
            display_name: read_string(reader, MAX_DISPLAY_NAME_LENGTH)?,
            points: u64::read(reader)?,
            level: u32::read(reader)?,
            entered_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LotteryEntry {
    fn encode_size(&self) -> usize {
        self.uid.encode_size()
            + self.platform_id.encode_size()
            + string_encode_size(&self.display_name)
            + self.points.encode_size()
            + self.level.encode_size()
            + self.entered_at.encode_size()
    }
}
