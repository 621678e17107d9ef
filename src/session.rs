use serde::{Deserialize, Serialize};

/// Reserved object id of the client's own entity. The recorder assigns id 1
/// to the locally controlled player in every session.
pub const CONTROLLED_ID: i64 = 1;

/// World object kind as integer-coded by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ObjectKind {
    Player,
    Rocket,
    Bullet,
}

impl TryFrom<u8> for ObjectKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(ObjectKind::Player),
            1 => Ok(ObjectKind::Rocket),
            2 => Ok(ObjectKind::Bullet),
            other => Err(format!("unknown object kind code {}", other)),
        }
    }
}

impl From<ObjectKind> for u8 {
    fn from(k: ObjectKind) -> u8 {
        match k {
            ObjectKind::Player => 0,
            ObjectKind::Rocket => 1,
            ObjectKind::Bullet => 2,
        }
    }
}

/// Client input kind as integer-coded by the recorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum InputKind {
    Move,
    FireBullet,
    FireRocket,
    SetLatency,
}

impl TryFrom<u8> for InputKind {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(InputKind::Move),
            1 => Ok(InputKind::FireBullet),
            2 => Ok(InputKind::FireRocket),
            3 => Ok(InputKind::SetLatency),
            other => Err(format!("unknown input kind code {}", other)),
        }
    }
}

impl From<InputKind> for u8 {
    fn from(k: InputKind) -> u8 {
        match k {
            InputKind::Move => 0,
            InputKind::FireBullet => 1,
            InputKind::FireRocket => 2,
            InputKind::SetLatency => 3,
        }
    }
}

/// One object instance inside a snapshot's object list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldObject {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    pub id: i64,
}

/// One recorded instant: the client's predicted world next to the server's
/// authoritative world. `time_ms` drives all windowing and delay arithmetic;
/// `tick`/`server_tick` are carried through from the recorder but unused by
/// the current metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tick: i64,
    pub server_tick: i64,
    pub time_ms: i64,
    #[serde(rename = "gameObjectState")]
    pub predicted: Vec<WorldObject>,
    #[serde(rename = "serverGameObjectState")]
    pub authoritative: Vec<WorldObject>,
}

/// A discrete client action targeted at a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEvent {
    pub tick: i64,
    pub server_tick: i64,
    pub time_ms: i64,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub kind: InputKind,
}

/// One complete recorded play session. Sequences are chronological as
/// recorded; the analysis never re-sorts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(rename = "states")]
    pub snapshots: Vec<Snapshot>,
    #[serde(rename = "actions")]
    pub inputs: Vec<InputEvent>,
    #[serde(rename = "receivedActions")]
    pub acked: Vec<InputEvent>,
}

impl SessionRecord {
    /// Snapshots whose `time_ms` falls inside `[from, to]`, inclusive both
    /// ends. Bounds may arrive in either order.
    pub fn snapshots_between(&self, a: i64, b: i64) -> Vec<Snapshot> {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        self.snapshots
            .iter()
            .filter(|s| s.time_ms >= from && s.time_ms <= to)
            .cloned()
            .collect()
    }
}
