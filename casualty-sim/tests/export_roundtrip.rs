use casualty_sim::{
    Ambient, Facing, GateKey, Intervention, Mechanism, Session, SessionConfig, SessionExport,
    Supply, WoundMarker,
};

fn played_session() -> Session {
    let config = SessionConfig::new(Mechanism::Blast, 84.0, Ambient::Cold).with_seed(31);
    let mut session = Session::initialize(config).unwrap();
    session.add_marker(WoundMarker {
        x: 0.42,
        y: 0.81,
        facing: Facing::Front,
        kind: "amputation".to_string(),
    });
    session.add_marker(WoundMarker {
        x: 0.55,
        y: 0.3,
        facing: Facing::Back,
        kind: "fragment".to_string(),
    });
    session.advance(15);
    session.apply(&Intervention::Tourniquet);
    session.apply(&Intervention::HypothermiaKit);
    session.advance(200);
    session
}

#[test]
fn json_export_restores_a_playable_session() {
    let session = played_session();
    let json = session
        .export()
        .with_timestamp("2026-10-18T09:30:00Z")
        .to_json()
        .unwrap();
    let restored = SessionExport::from_json(&json)
        .unwrap()
        .into_session()
        .unwrap();

    assert_eq!(restored.config(), session.config());
    assert_eq!(restored.inventory(), session.inventory());
    assert_eq!(restored.ledger(), session.ledger());
    assert_eq!(restored.markers(), session.markers());
    assert_eq!(restored.score(), session.score());
    assert_eq!(restored.patient().elapsed_s, 215);
    assert!((restored.patient().map - session.patient().map).abs() < 1e-9);
    assert!(
        (restored.patient().volume_fraction - session.patient().volume_fraction).abs() < 1e-9
    );
    assert!(restored.patient().hypothermia_kit);
    assert_eq!(restored.inventory().count(Supply::Tourniquet), 1);
    assert!(restored.ledger().gate_verdict(GateKey::M).is_some());
}

#[test]
fn export_json_has_the_documented_top_level_shape() {
    let json = played_session().export().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();
    for key in ["meta", "patient", "inventory", "wounds", "score", "ledger"] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert_eq!(value["wounds"][1]["facing"], "back");
    assert_eq!(value["inventory"]["tourniquet"], 1);
    assert!(value["meta"].get("exported_at").is_none());
}

#[test]
fn restored_session_keeps_ticking() {
    let mut restored = played_session().export().into_session().unwrap();
    restored.apply(&Intervention::WholeBlood);
    restored.advance(60);
    assert_eq!(restored.patient().elapsed_s, 275);
    assert_eq!(restored.inventory().count(Supply::WholeBlood), 3);
}

fn seeded_mvc() -> Session {
    let config = SessionConfig::new(Mechanism::Mvc, 80.0, Ambient::Temperate).with_seed(7);
    let mut session = Session::initialize(config).unwrap();
    session.advance(120);
    session
}

#[test]
fn resumed_session_continues_the_seeded_noise() {
    let mut live = seeded_mvc();
    let mut resumed = live.export().into_session().unwrap();
    live.advance(60);
    resumed.advance(60);
    assert_eq!(live.patient(), resumed.patient());
}

#[test]
fn resuming_through_json_matches_the_uninterrupted_run() {
    let mut live = seeded_mvc();
    let json = live.export().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["meta"]["noise"]["vitals"]["draws"].as_u64().unwrap() > 0);

    let mut resumed = SessionExport::from_json(&json)
        .unwrap()
        .into_session()
        .unwrap();
    live.advance(60);
    resumed.advance(60);
    assert_eq!(live.patient(), resumed.patient());
    assert_eq!(live.noise().cursor(), resumed.noise().cursor());
}

#[test]
fn snapshots_without_a_cursor_restart_the_noise() {
    let session = seeded_mvc();
    let json = session.export().to_json().unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["meta"].as_object_mut().unwrap().remove("noise");

    let restored = SessionExport::from_json(&value.to_string())
        .unwrap()
        .into_session()
        .unwrap();
    let cursor = restored.noise().cursor().unwrap();
    assert_eq!(cursor.vitals.draws, 0);
    assert_eq!(restored.patient().elapsed_s, 120);
}

#[test]
fn quiet_sessions_export_no_cursor() {
    let session = Session::initialize(SessionConfig::default()).unwrap();
    assert!(session.export().meta.noise.is_none());
}
