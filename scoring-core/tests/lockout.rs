#[allow(dead_code)]
mod common;

use common::Bout;
use scoring_core::weapons::timing::SABRE_LOCK;
use scoring_core::{DetectionMode, HitKind, Instant, LightState, Path, SensorEvent, Side, WeaponKind};

/// Right scores at 1540 and withdraws.
fn sabre_touch() -> Bout {
    let mut bout = Bout::new(WeaponKind::Sabre, DetectionMode::Manual).plug_in();
    bout.run_until(1_260);
    bout.close(Path::OpponentLame(Side::Right));
    bout.run_until(5_000);
    bout.open(Path::OpponentLame(Side::Right));
    assert_eq!(bout.hits(), vec![(1_540, HitKind::OnTarget(Side::Right))]);
    bout
}

#[test]
fn lock_engages_once_the_window_elapses() {
    let mut bout = sabre_touch();
    let lock = bout.sensor.lockout().lock().unwrap();
    assert_eq!(lock.started_at, Instant::from_micros(1_540));
    assert_eq!(lock.duration, SABRE_LOCK);

    let lockout = bout.sensor.lockout();
    assert!(!lockout.is_locked(Instant::from_micros(171_539)));
    assert!(lockout.is_locked(Instant::from_micros(171_540)));

    // A late touch by the other side is refused.
    bout.run_until(180_000);
    bout.close(Path::OpponentLame(Side::Left));
    bout.run_until(200_000);
    assert_eq!(bout.hits().len(), 1);
    assert!(bout.sensor.signals().both());
}

#[test]
fn lights_drain_silences_the_buzzer_then_resets() {
    let mut bout = sabre_touch();
    bout.run_until(1_990_000);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::GREEN | LightState::BUZZER));

    // Lights duration after the touch: buzzer off, lamps stay.
    bout.run_until(2_010_000);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::GREEN));
    assert!(!lights.contains(LightState::BUZZER));

    // 500 ms grace before the bout clears.
    bout.run_until(2_490_000);
    assert!(bout.sensor.light_state().contains(LightState::GREEN));
    bout.run_until(2_520_000);
    assert_eq!(bout.sensor.light_state(), LightState::OFF);
    assert!(!bout.sensor.signals().either());
    assert!(!bout.sensor.lockout().lock_started());
    assert_eq!(
        bout.published.last().map(|timed| timed.event),
        Some(SensorEvent::LightsChanged(LightState::OFF))
    );
}

#[test]
fn next_touch_scores_after_the_reset() {
    let mut bout = sabre_touch();
    bout.run_until(2_600_000);
    bout.close(Path::OpponentLame(Side::Left));
    bout.run_until(2_700_000);

    let sides: Vec<Side> = bout.hits().into_iter().map(|(_, hit)| hit.side()).collect();
    assert_eq!(sides, vec![Side::Right, Side::Left]);
    assert!(bout.sensor.light_state().contains(LightState::RED));
}

#[test]
fn operator_reset_clears_immediately() {
    let mut bout = sabre_touch();
    bout.run_until(100_000);
    assert!(bout.command("reset").is_ok());

    assert_eq!(bout.sensor.light_state(), LightState::OFF);
    assert!(!bout.sensor.lockout().lock_started());
    assert!(!bout.sensor.signals().either());
}
