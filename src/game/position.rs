use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Room coordinate on the world grid, displayed in the usual
/// `E3N7` / `W0S2` form. East/north are the non-negative half-axes.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RoomName {
    x: i16,
    y: i16,
}

impl RoomName {
    pub fn new(x: i16, y: i16) -> RoomName {
        RoomName { x, y }
    }

    pub fn x(self) -> i16 {
        self.x
    }

    pub fn y(self) -> i16 {
        self.y
    }

    /// The four rooms reachable through this room's exits.
    pub fn neighbors(self) -> [RoomName; 4] {
        [
            RoomName::new(self.x + 1, self.y),
            RoomName::new(self.x - 1, self.y),
            RoomName::new(self.x, self.y + 1),
            RoomName::new(self.x, self.y - 1),
        ]
    }

    pub fn is_neighbor(self, other: RoomName) -> bool {
        self.neighbors().contains(&other)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, hv) = if self.x >= 0 { ('E', self.x) } else { ('W', -self.x - 1) };
        let (v, vv) = if self.y >= 0 { ('N', self.y) } else { ('S', -self.y - 1) };

        write!(f, "{}{}{}{}", h, hv, v, vv)
    }
}

impl fmt::Debug for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for RoomName {
    type Err = RoomNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();

        let h = chars.next().ok_or(RoomNameParseError)?;
        let rest: String = chars.collect();
        let split = rest
            .find(|c| c == 'N' || c == 'S' || c == 'n' || c == 's')
            .ok_or(RoomNameParseError)?;
        let (hv, v_part) = rest.split_at(split);
        let v = v_part.chars().next().ok_or(RoomNameParseError)?;
        let vv = &v_part[1..];

        let hv: i16 = hv.parse().map_err(|_| RoomNameParseError)?;
        let vv: i16 = vv.parse().map_err(|_| RoomNameParseError)?;

        let x = match h.to_ascii_uppercase() {
            'E' => hv,
            'W' => -hv - 1,
            _ => return Err(RoomNameParseError),
        };
        let y = match v.to_ascii_uppercase() {
            'N' => vv,
            'S' => -vv - 1,
            _ => return Err(RoomNameParseError),
        };

        Ok(RoomName::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomNameParseError;

impl fmt::Display for RoomNameParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid room name")
    }
}

impl std::error::Error for RoomNameParseError {}

impl Serialize for RoomName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A tile inside a named room.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub room: RoomName,
    x: u8,
    y: u8,
}

impl Position {
    pub fn new(room: RoomName, x: u8, y: u8) -> Position {
        Position {
            room,
            x: x.min(ROOM_WIDTH - 1),
            y: y.min(ROOM_HEIGHT - 1),
        }
    }

    pub fn x(self) -> u8 {
        self.x
    }

    pub fn y(self) -> u8 {
        self.y
    }

    /// Chebyshev range to another position in the same room.
    pub fn range_to(self, other: Position) -> Option<u32> {
        if self.room != other.room {
            return None;
        }

        let dx = (self.x as i32 - other.x as i32).abs();
        let dy = (self.y as i32 - other.y as i32).abs();

        Some(dx.max(dy) as u32)
    }

    pub fn in_range_to(self, other: Position, range: u32) -> bool {
        self.range_to(other).map(|r| r <= range).unwrap_or(false)
    }

    pub fn is_near_to(self, other: Position) -> bool {
        self.in_range_to(other, 1)
    }

    pub fn is_room_edge(self) -> bool {
        self.x == 0 || self.y == 0 || self.x == ROOM_WIDTH - 1 || self.y == ROOM_HEIGHT - 1
    }

    /// Center tile of this position's room, the conventional cross-room
    /// navigation target.
    pub fn room_center(self) -> Position {
        Position::new(self.room, ROOM_WIDTH / 2, ROOM_HEIGHT / 2)
    }

    /// Packed in-room coordinate, usable as a compact map key.
    pub fn packed_xy(self) -> u16 {
        ((self.x as u16) << 8) | self.y as u16
    }

    pub fn from_packed_xy(room: RoomName, packed: u16) -> Position {
        Position::new(room, (packed >> 8) as u8, (packed & 0xFF) as u8)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {},{}]", self.room, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_name_round_trips_through_display() {
        for name in [
            RoomName::new(3, 7),
            RoomName::new(-1, 0),
            RoomName::new(0, -4),
            RoomName::new(-12, -12),
        ] {
            let parsed: RoomName = name.to_string().parse().unwrap();
            assert_eq!(parsed, name);
        }

        assert_eq!("E3N7".parse::<RoomName>().unwrap(), RoomName::new(3, 7));
        assert_eq!("W0S0".parse::<RoomName>().unwrap(), RoomName::new(-1, -1));
        assert!("Q1N1".parse::<RoomName>().is_err());
    }

    #[test]
    fn range_is_chebyshev_and_room_scoped() {
        let room = RoomName::new(0, 0);
        let a = Position::new(room, 10, 10);
        let b = Position::new(room, 13, 11);

        assert_eq!(a.range_to(b), Some(3));
        assert!(a.in_range_to(b, 3));
        assert!(!a.is_near_to(b));

        let elsewhere = Position::new(RoomName::new(1, 0), 10, 10);
        assert_eq!(a.range_to(elsewhere), None);
        assert!(!a.in_range_to(elsewhere, 49));
    }
}
