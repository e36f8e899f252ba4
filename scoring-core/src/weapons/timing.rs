//! Competition timing windows per discipline.
//!
//! Lock times come from the competition rules; contact times are the minimum
//! continuous contact that may score.

use core::time::Duration;

/// Interval between two full scans.
pub const SCAN_PERIOD: Duration = Duration::from_micros(140);

/// Lockout after the first foil touch (300 ms ±25 ms).
pub const FOIL_LOCK: Duration = Duration::from_millis(300);
/// Minimum tip depression for a foil touch.
pub const FOIL_CONTACT: Duration = Duration::from_micros(13_500);
/// Shortening applied to the partner timer once one foil side confirms.
pub const FOIL_DOS_SANTOS_CORRECTION: Duration = Duration::from_micros(150);
/// Lamé leak must persist this long before the orange indicator lights.
pub const FOIL_LAME_LEAK: Duration = Duration::from_micros(2_000);
/// Blade-on-blade contact needed to report a parry.
pub const FOIL_PARRY_ON: Duration = Duration::from_micros(1_500);
/// Blade separation needed to clear a parry.
pub const FOIL_PARRY_OFF: Duration = Duration::from_millis(43);

/// Lockout after the first epee touch (40-50 ms).
pub const EPEE_LOCK: Duration = Duration::from_millis(45);
/// Minimum tip depression for an epee touch.
pub const EPEE_CONTACT: Duration = Duration::from_micros(6_000);
/// Shortening applied to the partner timer once one epee side confirms.
pub const EPEE_DOS_SANTOS_CORRECTION: Duration = Duration::from_micros(150);
/// Margin taken off each epee contact timer when it arms: one scan period plus slack.
pub const EPEE_ARMING_MARGIN: Duration = Duration::from_micros(150);
/// Weapon leak (A to B) must persist this long before the orange indicator lights.
pub const EPEE_WEAPON_LEAK: Duration = Duration::from_micros(2_000);

/// Lockout after the first sabre touch (170 ms ±10 ms).
pub const SABRE_LOCK: Duration = Duration::from_millis(170);
/// Minimum blade contact on the opponent's lamé.
pub const SABRE_CONTACT: Duration = Duration::from_micros(120);
/// Shortening applied to the partner timer: two thirds of the contact time.
pub const SABRE_DOS_SANTOS_CORRECTION: Duration = Duration::from_micros(80);
/// Body-wire interruption needed before the white continuity light shows.
pub const SABRE_CONTINUITY: Duration = Duration::from_micros(1_400);

/// Cross-discipline evidence must hold this long before the weapon switches.
pub const DETECTION_HOLD: Duration = Duration::from_millis(2_500);
/// Both sides unplugged this long reverts foil or sabre to epee.
pub const DISCONNECTED_FALLBACK: Duration = Duration::from_secs(120);
/// One side unplugged this long silences the buzzer.
pub const PARTIALLY_DISCONNECTED: Duration = Duration::from_millis(10);

/// Default time lights stay up after a touch.
pub const DEFAULT_LIGHTS_DURATION: Duration = Duration::from_millis(2_000);
/// Extra display time granted after the buzzer is silenced.
pub const BUZZER_GRACE: Duration = Duration::from_millis(500);
/// Minimum interval between refreshes of the fault and continuity indicators.
pub const INDICATOR_REFRESH: Duration = Duration::from_millis(233);

/// Window before confirmation during which a touch counts as imminent.
pub const HIT_IMMINENT_WINDOW: Duration = Duration::from_micros(500);
