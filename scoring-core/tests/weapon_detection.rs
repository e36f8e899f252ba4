#[allow(dead_code)]
mod common;

use core::time::Duration;

use common::Bout;
use scoring_core::{DetectionMode, LightState, Path, Side, WeaponKind};

/// Sabres plugged into a foil box: both blades rest on the opposing lamé.
fn sabres_on_foil_box(mode: DetectionMode) -> Bout {
    let mut bout = Bout::new(WeaponKind::Foil, mode).plug_in();
    for side in Side::BOTH {
        bout.close(Path::OpponentLame(side));
    }
    bout
}

#[test]
fn sustained_cross_signal_switches_foil_to_sabre() {
    let mut bout = sabres_on_foil_box(DetectionMode::Auto);
    bout.run_until(2_400_000);
    assert!(bout.weapon_changes().is_empty());

    bout.run_until(2_501_000);
    let changes = bout.weapon_changes();
    assert_eq!(changes.len(), 1);
    let (at, kind) = changes[0];
    assert_eq!(kind, WeaponKind::Sabre);
    assert!((2_500_000..=2_501_000).contains(&at));
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Sabre);
}

#[test]
fn cross_signal_removed_before_the_hold_keeps_the_weapon() {
    let mut bout = sabres_on_foil_box(DetectionMode::Auto);
    bout.run_until(2_400_000);
    bout.open(Path::OpponentLame(Side::Right));
    bout.run_until(3_000_000);

    assert!(bout.weapon_changes().is_empty());
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Foil);
}

#[test]
fn manual_mode_never_switches() {
    let mut bout = sabres_on_foil_box(DetectionMode::Manual);
    bout.run_until(3_000_000);

    assert!(bout.weapon_changes().is_empty());
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Foil);
}

#[test]
fn operator_weapon_change_restarts_the_hold() {
    let mut bout = sabres_on_foil_box(DetectionMode::Auto);
    bout.run_until(2_000_000);
    assert!(bout.command("weapon epee").is_ok());
    assert!(bout.command("weapon foil").is_ok());
    bout.run_until(3_000_000);

    assert_eq!(
        bout.weapon_changes().iter().map(|(_, kind)| *kind).collect::<Vec<_>>(),
        vec![WeaponKind::Epee, WeaponKind::Foil]
    );
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Foil);
}

/// Epees plugged into a foil box: the A-B circuit rests open and the blade
/// line reaches its own lamé line.
fn epees_on_foil_box(mode: DetectionMode) -> Bout {
    let mut bout = Bout::new(WeaponKind::Foil, mode);
    for side in Side::BOTH {
        bout.close(Path::LameLeak(side));
    }
    bout
}

fn switched_to(bout: &Bout) -> Vec<WeaponKind> {
    bout.weapon_changes().iter().map(|(_, kind)| *kind).collect()
}

#[test]
fn open_tips_with_own_lame_contact_switch_foil_to_epee() {
    let mut bout = epees_on_foil_box(DetectionMode::Auto);
    bout.run_until(2_400_000);
    assert!(bout.weapon_changes().is_empty());
    // Every touch on the way there scored both sides.
    assert!(bout.hits().len() >= 2);

    bout.run_until(3_000_000);
    let changes = bout.weapon_changes();
    assert_eq!(changes.len(), 1);
    let (at, kind) = changes[0];
    assert_eq!(kind, WeaponKind::Epee);
    assert!((2_500_000..=2_600_000).contains(&at), "switched at {at}");
}

#[test]
fn hybrid_mode_switches_foil_to_epee_once_the_lights_clear() {
    let mut bout = epees_on_foil_box(DetectionMode::Hybrid);
    bout.run_until(3_000_000);
    assert!(bout.weapon_changes().is_empty());

    bout.run_until(6_000_000);
    let changes = bout.weapon_changes();
    assert_eq!(changes.len(), 1);
    let (at, kind) = changes[0];
    assert_eq!(kind, WeaponKind::Epee);
    assert!(at > 3_000_000);
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Epee);
}

#[test]
fn opponent_lame_contact_switches_epee_to_foil() {
    let mut bout = Bout::new(WeaponKind::Epee, DetectionMode::Auto);
    for side in Side::BOTH {
        bout.close(Path::OpponentLame(side));
    }
    bout.run_until(2_400_000);
    assert!(bout.weapon_changes().is_empty());

    bout.run_until(3_000_000);
    assert_eq!(switched_to(&bout), vec![WeaponKind::Foil]);
    let (at, _) = bout.weapon_changes()[0];
    assert!((2_500_000..=2_510_000).contains(&at), "switched at {at}");
}

#[test]
fn opponent_lame_contact_with_both_orange_switches_epee_to_sabre() {
    let mut bout = Bout::new(WeaponKind::Epee, DetectionMode::Auto).plug_in();
    for side in Side::BOTH {
        bout.close(Path::OpponentLame(side));
    }
    bout.run_until(1_000_000);
    assert!(bout.sensor.light_state().contains(LightState::ORANGE_LEFT | LightState::ORANGE_RIGHT));

    bout.run_until(3_000_000);
    assert_eq!(switched_to(&bout), vec![WeaponKind::Sabre]);
}

#[test]
fn broken_wires_on_the_lame_switch_sabre_to_foil() {
    let mut bout = Bout::new(WeaponKind::Sabre, DetectionMode::Auto);
    for side in Side::BOTH {
        bout.close(Path::OpponentLame(side));
    }
    bout.run_until(2_400_000);
    assert!(bout.weapon_changes().is_empty());
    assert!(!bout.hits().is_empty());

    bout.run_until(3_000_000);
    assert_eq!(switched_to(&bout), vec![WeaponKind::Foil]);
    let (at, _) = bout.weapon_changes()[0];
    assert!((2_500_000..=2_501_000).contains(&at), "switched at {at}");
}

#[test]
fn broken_wires_with_own_lame_contact_switch_sabre_to_epee() {
    let mut bout = Bout::new(WeaponKind::Sabre, DetectionMode::Auto);
    for side in Side::BOTH {
        bout.close(Path::OwnLame(side));
    }
    bout.run_until(2_400_000);
    assert!(bout.weapon_changes().is_empty());

    bout.run_until(3_000_000);
    assert_eq!(switched_to(&bout), vec![WeaponKind::Epee]);
    let (at, _) = bout.weapon_changes()[0];
    assert!((2_500_000..=2_510_000).contains(&at), "switched at {at}");
}

#[test]
fn unplugged_sabre_box_falls_back_to_epee() {
    let mut bout =
        Bout::new(WeaponKind::Sabre, DetectionMode::Auto).with_step(Duration::from_millis(10));
    bout.run_until(1_000_000);
    assert!(bout.sensor.light_state().contains(LightState::WHITE_LEFT | LightState::WHITE_RIGHT));
    assert!(bout.sensor.detector().fallback_pending());

    bout.run_until(119_000_000);
    assert!(bout.weapon_changes().is_empty());
    bout.run_until(121_000_000);

    let changes = bout.weapon_changes();
    assert_eq!(changes.len(), 1);
    let (at, kind) = changes[0];
    assert_eq!(kind, WeaponKind::Epee);
    assert!((120_000_000..=120_100_000).contains(&at));
}

#[test]
fn unplugged_box_stays_put_in_manual_mode() {
    let mut bout =
        Bout::new(WeaponKind::Foil, DetectionMode::Manual).with_step(Duration::from_millis(10));
    bout.run_until(125_000_000);

    assert!(bout.weapon_changes().is_empty());
    assert_eq!(bout.sensor.active_weapon(), WeaponKind::Foil);
}
