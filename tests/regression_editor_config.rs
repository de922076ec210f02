use jmx_studio::{EditorConfig, Error, PlanEditor, Result, TraceConfig};

const PLAN: &str = r#"<jmeterTestPlan version="1.2"><hashTree><TestPlan testname="Tiny"/><hashTree><ThreadGroup testname="Only"><stringProp name="ThreadGroup.num_threads">2</stringProp></ThreadGroup><hashTree/></hashTree></hashTree></jmeterTestPlan>"#;

#[test]
fn editor_without_a_plan_reports_it() {
    let mut editor = PlanEditor::new();
    assert!(!editor.is_loaded());
    assert!(matches!(editor.session(), Err(Error::NoPlanLoaded)));
    assert!(matches!(editor.session_mut(), Err(Error::NoPlanLoaded)));
    assert_eq!(editor.export(), Err(Error::NoPlanLoaded));
}

#[test]
fn oversized_input_is_rejected_before_parsing() -> Result<()> {
    let config = EditorConfig {
        max_input_bytes: 64,
        ..EditorConfig::default()
    };
    let mut editor = PlanEditor::with_config(config)?;
    match editor.load_str(PLAN) {
        Err(Error::InputTooLarge { size, limit }) => {
            assert_eq!(size, PLAN.len() as u64);
            assert_eq!(limit, 64);
        }
        other => panic!("expected size error, got: {other:?}"),
    }
    assert!(!editor.is_loaded());
    Ok(())
}

#[test]
fn failed_load_keeps_the_current_plan() -> Result<()> {
    let mut editor = PlanEditor::new();
    editor.load_str(PLAN)?.apply_users(0, 7)?;

    match editor.load_str("<jmeterTestPlan><hashTree></jmeterTestPlan>") {
        Err(Error::XmlParse(message)) => assert!(!message.is_empty()),
        other => panic!("expected parse error, got: {other:?}"),
    }
    assert!(matches!(
        editor.load_bytes(&[0x3c, 0x61, 0xff, 0x3e]),
        Err(Error::XmlParse(_))
    ));
    assert_eq!(editor.session()?.thread_groups()[0].users, 7);
    Ok(())
}

#[test]
fn export_uses_the_configured_filename() -> Result<()> {
    let mut editor = PlanEditor::new();
    editor.load_bytes(PLAN.as_bytes())?;
    let export = editor.export()?;
    assert_eq!(export.filename, "modified_test_plan.jmx");
    assert!(export
        .content
        .starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<jmeterTestPlan"));

    let config = EditorConfig {
        download_filename: "checkout.jmx".into(),
        ..EditorConfig::default()
    };
    let mut editor = PlanEditor::with_config(config)?;
    editor.load_str(PLAN)?;
    assert_eq!(editor.export()?.filename, "checkout.jmx");
    assert!(editor.close().is_some());
    assert!(!editor.is_loaded());
    Ok(())
}

#[test]
fn plans_round_trip_through_files() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("jmx_studio_editor_{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let source = dir.join("source.jmx");
    let target = dir.join("target.jmx");
    std::fs::write(&source, PLAN)?;

    let mut editor = PlanEditor::new();
    editor.load_file(&source)?.apply_master_scale(200.0)?;
    editor.export_to(&target)?;

    let mut reopened = PlanEditor::new();
    let session = reopened.load_file(&target)?;
    assert_eq!(session.thread_groups()[0].users, 4);
    assert!(matches!(
        reopened.load_file(dir.join("missing.jmx")),
        Err(Error::Io(_))
    ));
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn partial_json_config_fills_in_defaults() -> Result<()> {
    let config = EditorConfig::from_json_str(
        r#"{ "max_input_bytes": 2048, "trace": { "enabled": true, "forward": false } }"#,
    )?;
    assert_eq!(config.max_input_bytes, 2048);
    assert_eq!(config.download_filename, "modified_test_plan.jmx");
    assert_eq!(config.default_variables_name, "User Defined Variables");
    assert_eq!(
        config.trace,
        TraceConfig {
            enabled: true,
            forward: false,
            ..TraceConfig::default()
        }
    );

    let json = config.to_json_string()?;
    assert_eq!(EditorConfig::from_json_str(&json)?, config);
    assert_eq!(EditorConfig::from_json_str("{}")?, EditorConfig::default());
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    for json in [
        r#"{ "max_input_bytes": 0 }"#,
        r#"{ "download_filename": "  " }"#,
        r#"{ "trace": { "log_limit": 0 } }"#,
        r#"{ "max_input_bytes": "big" }"#,
        "not json",
    ] {
        match EditorConfig::from_json_str(json) {
            Err(Error::Config(_)) => {}
            other => panic!("{json}: expected config error, got: {other:?}"),
        }
    }
    let config = EditorConfig {
        default_variables_name: String::new(),
        ..EditorConfig::default()
    };
    assert!(matches!(
        PlanEditor::with_config(config),
        Err(Error::Config(_))
    ));
}

#[test]
fn editor_config_carries_into_sessions() -> Result<()> {
    let config = EditorConfig {
        default_variables_name: "Globals".into(),
        trace: TraceConfig {
            enabled: true,
            forward: false,
            ..TraceConfig::default()
        },
        ..EditorConfig::default()
    };
    let mut editor = PlanEditor::with_config(config)?;
    let session = editor.load_str(PLAN)?;
    let logs = session.take_trace_logs();
    assert!(logs.iter().any(|line| line.contains("no user defined variables element")));
    assert_eq!(editor.config().default_variables_name, "Globals");
    Ok(())
}

#[test]
fn records_serialize_without_tree_handles() -> Result<()> {
    let mut editor = PlanEditor::new();
    let session = editor.load_str(PLAN)?;
    let value = serde_json::to_value(&session.thread_groups()[0])
        .map_err(|err| Error::Config(err.to_string()))?;
    assert_eq!(value["name"], "Only");
    assert_eq!(value["kind"], "Standard");
    assert_eq!(value["users"], 2);
    assert!(value.get("node").is_none());
    Ok(())
}
