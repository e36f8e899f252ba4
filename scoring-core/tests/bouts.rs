#[allow(dead_code)]
mod common;

use common::Bout;
use scoring_core::weapons::timing::FOIL_LOCK;
use scoring_core::{DetectionMode, HitKind, LightState, Path, Side, WeaponKind};

fn foil() -> Bout {
    Bout::new(WeaponKind::Foil, DetectionMode::Manual).plug_in()
}

#[test]
fn foil_off_target_press_shows_white_and_locks() {
    let mut bout = foil();
    bout.run_until(1_400);
    bout.open(Path::TipCircuit(Side::Left));

    // Pressed from 1540: 13.5 ms are needed.
    bout.run_until(14_980);
    assert!(bout.hits().is_empty());
    bout.run_until(15_120);
    assert_eq!(bout.hits(), vec![(15_120, HitKind::OffTarget(Side::Left))]);
    assert!(bout.sensor.signals().left());
    assert_eq!(
        bout.sensor.lockout().lock().map(|lock| lock.duration),
        Some(FOIL_LOCK)
    );

    bout.run_until(15_260);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::WHITE_LEFT));
    assert!(!lights.contains(LightState::RED));
}

#[test]
fn foil_press_on_lame_scores_red() {
    let mut bout = foil();
    bout.run_until(1_400);
    bout.open(Path::TipCircuit(Side::Left));
    bout.close(Path::OpponentLame(Side::Left));

    bout.run_until(15_260);
    assert_eq!(bout.hits(), vec![(15_120, HitKind::OnTarget(Side::Left))]);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::RED));
    assert!(!lights.contains(LightState::WHITE_LEFT));
}

#[test]
fn foil_short_press_never_scores() {
    let mut bout = foil();
    bout.run_until(1_400);
    bout.open(Path::TipCircuit(Side::Left));
    bout.run_until(14_700);
    bout.close(Path::TipCircuit(Side::Left));
    bout.run_until(100_000);

    assert!(bout.hits().is_empty());
    assert!(!bout.sensor.lockout().lock_started());
}

#[test]
fn foil_reply_inside_the_lockout_also_scores() {
    let mut bout = foil();
    bout.run_until(1_400);
    bout.open(Path::TipCircuit(Side::Left));
    bout.close(Path::OpponentLame(Side::Left));
    bout.run_until(20_000);
    bout.close(Path::TipCircuit(Side::Left));
    bout.open(Path::OpponentLame(Side::Left));

    // Lock runs until 315120; the reply confirms at 213640.
    bout.run_until(199_920);
    bout.open(Path::TipCircuit(Side::Right));
    bout.run_until(220_000);

    assert_eq!(
        bout.hits(),
        vec![
            (15_120, HitKind::OnTarget(Side::Left)),
            (213_640, HitKind::OffTarget(Side::Right)),
        ]
    );
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::RED));
    assert!(lights.contains(LightState::WHITE_RIGHT));
}

#[test]
fn foil_touch_after_the_lockout_is_ignored() {
    let mut bout = foil();
    bout.run_until(1_400);
    bout.open(Path::TipCircuit(Side::Left));
    bout.run_until(20_000);
    bout.close(Path::TipCircuit(Side::Left));

    bout.run_until(330_000);
    bout.open(Path::TipCircuit(Side::Right));
    bout.close(Path::OpponentLame(Side::Right));
    bout.run_until(400_000);

    assert_eq!(bout.hits(), vec![(15_120, HitKind::OffTarget(Side::Left))]);
    assert!(!bout.sensor.light_state().contains(LightState::GREEN));
}

#[test]
fn epee_contact_scores_red() {
    let mut bout = Bout::new(WeaponKind::Epee, DetectionMode::Manual);
    bout.close(Path::OwnLame(Side::Left));
    bout.run_until(6_020);

    assert_eq!(bout.hits(), vec![(5_880, HitKind::OnTarget(Side::Left))]);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::RED));
    assert!(lights.contains(LightState::BUZZER));
}

#[test]
fn epee_guard_contact_restarts_the_count() {
    let mut bout = Bout::new(WeaponKind::Epee, DetectionMode::Manual);
    bout.close(Path::OwnLame(Side::Left));
    bout.run_until(4_900);
    bout.close(Path::OpponentGuard(Side::Left));
    bout.run_until(5_040);
    bout.open(Path::OpponentGuard(Side::Left));

    // More than 6 ms of contact in total, but never 6 ms in one stretch.
    bout.run_until(10_920);
    assert!(bout.hits().is_empty());
    bout.run_until(11_060);
    assert_eq!(bout.hits(), vec![(11_060, HitKind::OnTarget(Side::Left))]);
}

#[test]
fn epee_double_touch_lights_both_colours() {
    let mut bout = Bout::new(WeaponKind::Epee, DetectionMode::Manual);
    bout.close(Path::OwnLame(Side::Left));
    bout.run_until(20_000);
    bout.close(Path::OwnLame(Side::Right));
    bout.run_until(40_000);

    let sides: Vec<Side> = bout.hits().into_iter().map(|(_, hit)| hit.side()).collect();
    assert_eq!(sides, vec![Side::Left, Side::Right]);
    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::RED | LightState::GREEN));
}

fn sabre() -> Bout {
    Bout::new(WeaponKind::Sabre, DetectionMode::Manual).plug_in()
}

#[test]
fn sabre_scores_after_120_microseconds() {
    let mut bout = sabre();
    bout.run_until(1_260);
    bout.close(Path::OpponentLame(Side::Right));
    bout.run_until(1_400);
    assert!(bout.hits().is_empty());
    bout.run_until(1_540);

    assert_eq!(bout.hits(), vec![(1_540, HitKind::OnTarget(Side::Right))]);
    bout.run_until(1_680);
    assert!(bout.sensor.light_state().contains(LightState::GREEN));
}

#[test]
fn sabre_flicker_shorter_than_the_contact_time_never_scores() {
    let mut bout = sabre();
    let mut now = 0;
    for round in 0..200 {
        if round % 2 == 0 {
            bout.close(Path::OpponentLame(Side::Left));
        } else {
            bout.open(Path::OpponentLame(Side::Left));
        }
        bout.run_until(now);
        now += 140;
    }

    assert!(bout.hits().is_empty());
    assert!(!bout.sensor.lockout().lock_started());
}

#[test]
fn sabre_broken_body_wire_shows_white() {
    let mut bout = sabre();
    bout.open(Path::TipCircuit(Side::Left));
    // White indicators refresh on the 233 ms throttle.
    bout.run_until(240_000);

    let lights = bout.sensor.light_state();
    assert!(lights.contains(LightState::WHITE_LEFT));
    assert!(!lights.contains(LightState::WHITE_RIGHT));
    assert!(bout.hits().is_empty());
}
