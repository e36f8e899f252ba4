//! Sensor event catalog and the bounded queue that carries it to observers.
//!
//! Events encode to a compact `category << 24 | payload` word so displays and
//! transports agree on values without sharing Rust types. The queue never
//! blocks the scan loop: lights and parry updates may be discarded under
//! pressure, weapon changes and touches are refused instead so the producer
//! can hold on to them.

use core::fmt;

use heapless::Deque;

use crate::clock::Instant;
use crate::lights::LightState;
use crate::probe::Side;
use crate::weapons::WeaponKind;

/// Classification of a confirmed touch.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HitKind {
    /// Valid touch: red for the left fencer, green for the right.
    OnTarget(Side),
    /// Off-target touch (foil white lamp).
    OffTarget(Side),
}

impl HitKind {
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            HitKind::OnTarget(side) | HitKind::OffTarget(side) => side,
        }
    }

    const fn code(self) -> u32 {
        match self {
            HitKind::OnTarget(Side::Left) => 0,
            HitKind::OnTarget(Side::Right) => 1,
            HitKind::OffTarget(Side::Left) => 2,
            HitKind::OffTarget(Side::Right) => 3,
        }
    }

    const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(HitKind::OnTarget(Side::Left)),
            1 => Some(HitKind::OnTarget(Side::Right)),
            2 => Some(HitKind::OffTarget(Side::Left)),
            3 => Some(HitKind::OffTarget(Side::Right)),
            _ => None,
        }
    }
}

impl fmt::Display for HitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitKind::OnTarget(side) => write!(f, "on-target {side}"),
            HitKind::OffTarget(side) => write!(f, "off-target {side}"),
        }
    }
}

/// State changes emitted by the sensor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SensorEvent {
    LightsChanged(LightState),
    WeaponChanged(WeaponKind),
    Hit(HitKind),
    ParryChanged(bool),
}

impl SensorEvent {
    pub const LIGHTS_CATEGORY: u8 = 0x01;
    pub const WEAPON_CATEGORY: u8 = 0x02;
    pub const HIT_CATEGORY: u8 = 0x03;
    pub const PARRY_CATEGORY: u8 = 0x04;

    const PAYLOAD_MASK: u32 = 0x00FF_FFFF;

    #[must_use]
    pub const fn category(self) -> u8 {
        match self {
            SensorEvent::LightsChanged(_) => Self::LIGHTS_CATEGORY,
            SensorEvent::WeaponChanged(_) => Self::WEAPON_CATEGORY,
            SensorEvent::Hit(_) => Self::HIT_CATEGORY,
            SensorEvent::ParryChanged(_) => Self::PARRY_CATEGORY,
        }
    }

    #[must_use]
    pub fn payload(self) -> u32 {
        match self {
            SensorEvent::LightsChanged(state) => u32::from(state.bits()),
            SensorEvent::WeaponChanged(kind) => u32::from(kind.code()),
            SensorEvent::Hit(kind) => kind.code(),
            SensorEvent::ParryChanged(active) => u32::from(active),
        }
    }

    /// Encodes the event into its transport word.
    #[must_use]
    pub fn to_raw(self) -> u32 {
        (u32::from(self.category()) << 24) | self.payload()
    }

    /// Decodes a transport word. Unknown categories or payloads yield `None`.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        let payload = raw & Self::PAYLOAD_MASK;
        let category = u8::try_from(raw >> 24).ok()?;
        match category {
            Self::LIGHTS_CATEGORY => u8::try_from(payload)
                .ok()
                .map(|bits| SensorEvent::LightsChanged(LightState::from_bits(bits))),
            Self::WEAPON_CATEGORY => u8::try_from(payload)
                .ok()
                .and_then(WeaponKind::from_code)
                .map(SensorEvent::WeaponChanged),
            Self::HIT_CATEGORY => HitKind::from_code(payload).map(SensorEvent::Hit),
            Self::PARRY_CATEGORY => match payload {
                0 => Some(SensorEvent::ParryChanged(false)),
                1 => Some(SensorEvent::ParryChanged(true)),
                _ => None,
            },
            _ => None,
        }
    }

    /// Display updates that a newer event supersedes; everything else must be delivered.
    #[must_use]
    pub const fn is_droppable(self) -> bool {
        matches!(
            self,
            SensorEvent::LightsChanged(_) | SensorEvent::ParryChanged(_)
        )
    }
}

impl fmt::Display for SensorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorEvent::LightsChanged(state) => write!(f, "lights {state}"),
            SensorEvent::WeaponChanged(kind) => write!(f, "weapon {kind}"),
            SensorEvent::Hit(kind) => write!(f, "hit {kind}"),
            SensorEvent::ParryChanged(true) => f.write_str("parry start"),
            SensorEvent::ParryChanged(false) => f.write_str("parry end"),
        }
    }
}

/// Event stamped with the scan timestamp that produced it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimedEvent {
    pub at: Instant,
    pub event: SensorEvent,
}

impl TimedEvent {
    #[must_use]
    pub const fn new(at: Instant, event: SensorEvent) -> Self {
        Self { at, event }
    }
}

/// Queue refused an event that must not be dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PublishError {
    Full(TimedEvent),
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishError::Full(pending) => {
                write!(f, "event queue full, holding `{}`", pending.event)
            }
        }
    }
}

/// How a publish was absorbed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delivery {
    Queued,
    /// Queued after discarding the oldest undelivered display update.
    EvictedOldest,
    /// The incoming display update itself was discarded.
    Discarded,
}

/// Consumer side of the scan loop's event output.
pub trait EventSink {
    /// Hands one event to the observers without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Full`] when a non-droppable event cannot be
    /// accepted; the caller keeps it and retries later.
    fn publish(&mut self, event: TimedEvent) -> Result<Delivery, PublishError>;
}

/// Loss counters kept by [`EventQueue`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct QueueStats {
    pub published: u32,
    pub dropped_updates: u32,
    pub refused: u32,
}

/// Fixed-capacity FIFO implementing the drop policy.
pub struct EventQueue<const N: usize> {
    events: Deque<TimedEvent, N>,
    stats: QueueStats,
}

impl<const N: usize> EventQueue<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Deque::new(),
            stats: QueueStats {
                published: 0,
                dropped_updates: 0,
                refused: 0,
            },
        }
    }

    pub fn pop(&mut self) -> Option<TimedEvent> {
        self.events.pop_front()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&TimedEvent> {
        self.events.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedEvent> {
        self.events.iter()
    }

    /// Removes the oldest droppable entry, preserving the order of the rest.
    fn evict_oldest_droppable(&mut self) -> bool {
        let Some(position) = self
            .events
            .iter()
            .position(|queued| queued.event.is_droppable())
        else {
            return false;
        };

        let mut kept: Deque<TimedEvent, N> = Deque::new();
        for (index, queued) in self.events.iter().enumerate() {
            if index != position {
                // Capacity matches and one entry is skipped, so this cannot fail.
                let _ = kept.push_back(*queued);
            }
        }
        self.events = kept;
        true
    }
}

impl<const N: usize> Default for EventQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> EventSink for EventQueue<N> {
    fn publish(&mut self, event: TimedEvent) -> Result<Delivery, PublishError> {
        let mut delivery = Delivery::Queued;
        if self.events.is_full() {
            if self.evict_oldest_droppable() {
                self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
                delivery = Delivery::EvictedOldest;
            } else if event.event.is_droppable() {
                self.stats.dropped_updates = self.stats.dropped_updates.saturating_add(1);
                return Ok(Delivery::Discarded);
            } else {
                self.stats.refused = self.stats.refused.saturating_add(1);
                return Err(PublishError::Full(event));
            }
        }

        match self.events.push_back(event) {
            Ok(()) => {
                self.stats.published = self.stats.published.saturating_add(1);
                Ok(delivery)
            }
            Err(rejected) => {
                self.stats.refused = self.stats.refused.saturating_add(1);
                Err(PublishError::Full(rejected))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lights(bits: u8, at: u64) -> TimedEvent {
        TimedEvent::new(
            Instant::from_micros(at),
            SensorEvent::LightsChanged(LightState::from_bits(bits)),
        )
    }

    fn hit(at: u64) -> TimedEvent {
        TimedEvent::new(
            Instant::from_micros(at),
            SensorEvent::Hit(HitKind::OnTarget(Side::Left)),
        )
    }

    #[test]
    fn raw_codes_are_stable() {
        assert_eq!(
            SensorEvent::LightsChanged(LightState::from_bits(0x84)).to_raw(),
            0x0100_0084
        );
        assert_eq!(SensorEvent::WeaponChanged(WeaponKind::Foil).to_raw(), 0x0200_0000);
        assert_eq!(SensorEvent::WeaponChanged(WeaponKind::Sabre).to_raw(), 0x0200_0002);
        assert_eq!(
            SensorEvent::Hit(HitKind::OffTarget(Side::Right)).to_raw(),
            0x0300_0003
        );
        assert_eq!(SensorEvent::ParryChanged(true).to_raw(), 0x0400_0001);
    }

    #[test]
    fn unknown_raw_codes_are_rejected() {
        assert_eq!(SensorEvent::from_raw(0x0200_0007), None);
        assert_eq!(SensorEvent::from_raw(0x0900_0000), None);
        assert_eq!(SensorEvent::from_raw(0x0100_0100), None);
        assert_eq!(
            SensorEvent::from_raw(0x0200_0001),
            Some(SensorEvent::WeaponChanged(WeaponKind::Epee))
        );
    }

    #[test]
    fn full_queue_evicts_oldest_lights_update() {
        let mut queue = EventQueue::<3>::new();
        queue.publish(hit(1)).unwrap();
        queue.publish(lights(0x80, 2)).unwrap();
        queue.publish(lights(0x82, 3)).unwrap();

        assert_eq!(queue.publish(hit(4)), Ok(Delivery::EvictedOldest));
        let drained: heapless::Vec<u64, 3> =
            core::iter::from_fn(|| queue.pop()).map(|event| event.at.as_micros()).collect();
        assert_eq!(drained.as_slice(), &[1, 3, 4]);
        assert_eq!(queue.stats().dropped_updates, 1);
    }

    #[test]
    fn critical_events_are_refused_not_dropped() {
        let mut queue = EventQueue::<2>::new();
        queue.publish(hit(1)).unwrap();
        queue.publish(hit(2)).unwrap();

        assert_eq!(queue.publish(hit(3)), Err(PublishError::Full(hit(3))));
        assert_eq!(queue.publish(lights(0x04, 4)), Ok(Delivery::Discarded));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.stats().refused, 1);
        assert_eq!(queue.stats().dropped_updates, 1);
    }
}
