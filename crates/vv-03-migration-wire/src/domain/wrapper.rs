//! Behaviour state carried next to the snapshot.
//!
//! The organism's own code keeps arbitrary named values between ticks. They
//! travel as an opaque byte payload inside the message, but every value is
//! one of the closed [`WrapperValue`] variants, so decoding them never needs
//! more than the allow-list.

use serde::{Deserialize, Serialize};
use shared_types::Point;
use uuid::Uuid;

use crate::guard::AllowedType;

/// Where an organism is heading and how fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementVector {
    pub destination: Point,
    pub speed: u32,
}

/// Action the organism had queued when it was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    MoveTo(MovementVector),
    Attack { target: Uuid },
    Eat { target: Uuid },
    Defend { attacker: Uuid },
    Reproduce,
}

/// A value the organism stored for itself.
#[derive(Debug, Clone, PartialEq)]
pub enum WrapperValue {
    Id(Uuid),
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Point(Point),
    Vector(MovementVector),
    Action(PendingAction),
}

impl WrapperValue {
    /// Allow-list type this value is tagged with on the wire.
    pub fn allowed_type(&self) -> AllowedType {
        match self {
            WrapperValue::Id(_) => AllowedType::Uuid,
            WrapperValue::Text(_) => AllowedType::Text,
            WrapperValue::Integer(_) => AllowedType::Integer,
            WrapperValue::Float(_) => AllowedType::Float,
            WrapperValue::Boolean(_) => AllowedType::Boolean,
            WrapperValue::Point(_) => AllowedType::Point,
            WrapperValue::Vector(_) => AllowedType::MovementVector,
            WrapperValue::Action(_) => AllowedType::PendingAction,
        }
    }
}

/// Named values, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WrapperState {
    entries: Vec<(String, WrapperValue)>,
}

impl WrapperState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`.
    pub fn set(&mut self, key: impl Into<String>, value: WrapperValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: WrapperValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&WrapperValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WrapperValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}
