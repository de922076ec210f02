use jmx_studio::{
    Allocation, DataSourceConfig, DataSourceKind, DataSourceOptions, EditorConfig, Error,
    NewTimer, Result, SamplerRename, Session, ThreadGroupEdit, TimerKind, TimerParams,
    TimerTarget, TimerUpdate, TraceConfig,
};

const PLAN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<jmeterTestPlan version="1.2" properties="5.0" jmeter="5.6.3">
  <hashTree>
    <TestPlan guiclass="TestPlanGui" testclass="TestPlan" testname="Shop" enabled="true">
      <boolProp name="TestPlan.functional_mode">false</boolProp>
    </TestPlan>
    <hashTree>
      <Arguments guiclass="ArgumentsPanel" testclass="Arguments" testname="User Defined Variables" enabled="true">
        <collectionProp name="Arguments.arguments">
          <elementProp name="env" elementType="Argument">
            <stringProp name="Argument.name">env</stringProp>
            <stringProp name="Argument.value">dev</stringProp>
            <stringProp name="Argument.metadata">=</stringProp>
          </elementProp>
          <elementProp name="host" elementType="Argument">
            <stringProp name="Argument.name">host</stringProp>
            <stringProp name="Argument.value">dev.shop.example</stringProp>
            <stringProp name="Argument.metadata">=</stringProp>
          </elementProp>
        </collectionProp>
      </Arguments>
      <hashTree/>
      <ThreadGroup guiclass="ThreadGroupGui" testclass="ThreadGroup" testname="Checkout" enabled="true">
        <stringProp name="ThreadGroup.num_threads">10</stringProp>
        <stringProp name="ThreadGroup.ramp_time">5</stringProp>
        <elementProp name="ThreadGroup.main_controller" elementType="LoopController">
          <stringProp name="LoopController.loops">3</stringProp>
        </elementProp>
      </ThreadGroup>
      <hashTree>
        <HTTPSamplerProxy guiclass="HttpTestSampleGui" testclass="HTTPSamplerProxy" testname="Login" enabled="true">
          <stringProp name="HTTPSampler.domain">shop.example</stringProp>
          <stringProp name="HTTPSampler.protocol">https</stringProp>
          <stringProp name="HTTPSampler.path">/login</stringProp>
          <stringProp name="HTTPSampler.method">POST</stringProp>
        </HTTPSamplerProxy>
        <hashTree>
          <ConstantTimer guiclass="ConstantTimerGui" testclass="ConstantTimer" testname="Pause" enabled="true">
            <stringProp name="ConstantTimer.delay">300</stringProp>
          </ConstantTimer>
          <hashTree/>
        </hashTree>
        <HTTPSamplerProxy guiclass="HttpTestSampleGui" testclass="HTTPSamplerProxy" testname="Browse" enabled="true">
          <stringProp name="HTTPSampler.domain">shop.example</stringProp>
          <stringProp name="HTTPSampler.path">/catalog</stringProp>
        </HTTPSamplerProxy>
        <hashTree/>
        <PreciseThroughputTimer guiclass="TestBeanGUI" testclass="PreciseThroughputTimer" testname="Rate" enabled="true">
          <doubleProp>
            <name>throughput</name>
            <value>5.0</value>
            <savedValue>0.0</savedValue>
          </doubleProp>
          <intProp name="throughputPeriod">1</intProp>
        </PreciseThroughputTimer>
        <hashTree/>
      </hashTree>
      <com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroup guiclass="com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroupGui" testclass="com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroup" testname="Search" enabled="true">
        <stringProp name="TargetLevel">4</stringProp>
        <stringProp name="RampUp">20</stringProp>
        <stringProp name="Hold">600</stringProp>
      </com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroup>
      <hashTree>
        <HTTPSamplerProxy guiclass="HttpTestSampleGui" testclass="HTTPSamplerProxy" testname="Search" enabled="true">
          <stringProp name="HTTPSampler.path">/search</stringProp>
        </HTTPSamplerProxy>
        <hashTree/>
      </hashTree>
    </hashTree>
  </hashTree>
</jmeterTestPlan>
"#;

fn user_counts(session: &Session) -> Vec<i64> {
    session.thread_groups().iter().map(|group| group.users).collect()
}

#[test]
fn records_are_read_from_both_thread_group_dialects() -> Result<()> {
    let session = Session::parse(PLAN)?;
    let groups = session.thread_groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].name, "Checkout");
    assert_eq!(
        (groups[0].users, groups[0].ramp_time, groups[0].loops, groups[0].duration),
        (10, 5, 3, 0)
    );
    assert_eq!(groups[0].throughput, 5.0);
    assert_eq!(
        (groups[1].users, groups[1].ramp_time, groups[1].duration),
        (4, 20, 600)
    );
    assert_eq!(groups[1].throughput, 0.0);

    let urls: Vec<&str> = session.samplers().iter().map(|s| s.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://shop.example/login", "http://shop.example/catalog", "/search"]
    );
    assert_eq!(session.samplers()[0].method, "POST");
    assert_eq!(session.samplers()[1].method, "GET");

    let pause = &session.timers()[0];
    assert_eq!(pause.sampler.as_deref(), Some("Login"));
    assert_eq!(pause.thread_group.as_deref(), Some("Checkout"));
    assert_eq!(
        pause.params,
        TimerParams::Delay {
            delay_ms: 300.0,
            range_ms: 0.0
        }
    );
    assert_eq!(session.timers()[1].sampler, None);
    assert_eq!(
        session.variables_container_name().as_deref(),
        Some("User Defined Variables")
    );
    Ok(())
}

#[test]
fn untouched_plan_exports_identically() -> Result<()> {
    let session = Session::parse(PLAN)?;
    assert_eq!(session.to_xml_string(), PLAN.trim_end());
    Ok(())
}

#[test]
fn master_scale_always_starts_from_loaded_values() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert_eq!(session.apply_master_scale(150.0)?, 2);
    assert_eq!(user_counts(&session), vec![15, 6]);
    assert_eq!(session.plan_throughput(), Some(7.5));

    session.apply_master_scale(50.0)?;
    assert_eq!(user_counts(&session), vec![5, 2]);
    assert_eq!(session.plan_throughput(), Some(2.5));
    assert_eq!(session.thread_groups()[0].throughput, 2.5);
    assert_eq!(session.thread_groups()[0].original_users, 10);

    let xml = session.to_xml_string();
    assert!(xml.contains(r#"<stringProp name="ThreadGroup.num_threads">5</stringProp>"#));
    assert!(xml.contains(r#"<stringProp name="TargetLevel">2</stringProp>"#));
    assert!(xml.contains("<value>2.5</value>"));
    Ok(())
}

#[test]
fn master_scale_never_drops_below_one_user_and_skips_disabled_groups() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.set_thread_group_enabled(1, false)?;
    assert_eq!(session.apply_master_scale(1.0)?, 1);
    assert_eq!(user_counts(&session), vec![1, 4]);

    match session.apply_master_scale(0.0) {
        Err(Error::Validation(message)) => {
            assert!(message.contains("greater than 0"), "unexpected message: {message}")
        }
        other => panic!("expected validation error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn performance_summary_counts_active_groups_across_generators() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let summary = session.performance_summary(200.0, 2)?;
    assert_eq!((summary.active_groups, summary.total_groups), (2, 2));
    assert_eq!(summary.original_users, 14);
    assert_eq!(summary.scaled_users, 56);
    assert_eq!(summary.original_tps, Some(5.0));
    assert_eq!(summary.scaled_tps, Some(20.0));

    session.toggle_timer(1)?;
    let summary = session.performance_summary(100.0, 1)?;
    assert_eq!(summary.original_tps, None);
    assert!(session.performance_summary(100.0, 0).is_err());
    Ok(())
}

#[test]
fn thread_group_edit_writes_users_loops_and_ramp() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.apply_thread_group_edit(
        0,
        ThreadGroupEdit {
            users: 400,
            ramp_time: 60,
            loops: -1,
            duration: 0,
        },
    )?;
    let group = &session.thread_groups()[0];
    assert_eq!((group.users, group.ramp_time, group.loops), (400, 60, -1));
    assert_eq!(group.original_users, 10);

    let xml = session.to_xml_string();
    assert!(xml.contains(r#"<stringProp name="ThreadGroup.num_threads">400</stringProp>"#));
    assert!(xml.contains(r#"<stringProp name="LoopController.loops">-1</stringProp>"#));
    assert!(xml.contains(r#"<stringProp name="ThreadGroup.ramp_time">60</stringProp>"#));

    let reloaded = Session::parse(&xml)?;
    assert_eq!(reloaded.thread_groups()[0].users, 400);
    Ok(())
}

#[test]
fn thread_group_edit_rejects_out_of_range_values() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let edit = ThreadGroupEdit {
        users: 0,
        ramp_time: 1,
        loops: 1,
        duration: 0,
    };
    match session.apply_thread_group_edit(0, edit) {
        Err(Error::Validation(message)) => assert_eq!(message, "Users must be at least 1"),
        other => panic!("expected validation error, got: {other:?}"),
    }
    let edit = ThreadGroupEdit {
        users: 1,
        loops: -2,
        ..edit
    };
    assert!(session.apply_thread_group_edit(0, edit).is_err());
    assert!(matches!(
        session.apply_thread_group_edit(9, ThreadGroupEdit { loops: 1, ..edit }),
        Err(Error::NotFound(_))
    ));
    assert_eq!(session.thread_groups()[0].users, 10);
    Ok(())
}

#[test]
fn deleting_a_thread_group_drops_everything_below_it() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let removed = session.delete_thread_group(0)?;
    assert_eq!(removed.name, "Checkout");
    assert_eq!(session.thread_groups().len(), 1);
    assert_eq!(session.samplers().len(), 1);
    assert_eq!(session.samplers()[0].original_index, 2);
    assert!(session.timers().is_empty());
    assert_eq!(session.plan_throughput(), None);

    let xml = session.to_xml_string();
    assert!(!xml.contains("Checkout"));
    assert!(!xml.contains("PreciseThroughputTimer"));
    Session::parse(&xml)?;
    Ok(())
}

#[test]
fn toggling_a_thread_group_flips_the_enabled_attribute() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert!(!session.toggle_thread_group(1)?);
    assert!(!session.thread_groups()[1].enabled);
    assert!(session.to_xml_string().contains(r#"testname="Search" enabled="false""#));
    assert!(session.toggle_thread_group(1)?);
    Ok(())
}

#[test]
fn samplers_are_listed_per_thread_group() -> Result<()> {
    let session = Session::parse(PLAN)?;
    let names: Vec<&str> = session
        .samplers_in_thread_group(0)?
        .into_iter()
        .map(|sampler| sampler.name.as_str())
        .collect();
    assert_eq!(names, vec!["Login", "Browse"]);
    assert_eq!(session.samplers_in_thread_group(1)?.len(), 1);
    Ok(())
}

#[test]
fn duplicate_variable_names_are_rejected_after_trimming() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    match session.add_variable(" env ", "prod") {
        Err(Error::Validation(message)) => assert_eq!(message, "Variable already exists"),
        other => panic!("expected duplicate error, got: {other:?}"),
    }
    assert_eq!(session.variables()[0].value, "dev");
    assert!(session.add_variable("  ", "x").is_err());

    let index = session.add_variable(" region ", "eu-west")?;
    assert_eq!(index, 2);
    assert_eq!(session.variables()[2].name, "region");
    let xml = session.to_xml_string();
    assert!(xml.contains(r#"<elementProp name="region" elementType="Argument">"#));
    assert!(xml.contains(r#"<stringProp name="Argument.value">eu-west</stringProp>"#));

    let reloaded = Session::parse(&xml)?;
    assert_eq!(reloaded.variables().len(), 3);
    Ok(())
}

#[test]
fn variables_can_be_updated_replaced_and_deleted() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert_eq!(session.preview_find_replace("dev").len(), 2);
    assert_eq!(session.find_and_replace("dev", "prod")?, 2);
    assert_eq!(session.variables()[1].value, "prod.shop.example");
    assert!(session.find_and_replace("", "x").is_err());

    session.update_variable(0, "staging")?;
    let removed = session.delete_variable(1)?;
    assert_eq!(removed.name, "host");

    let reloaded = Session::parse(&session.to_xml_string())?;
    let pairs: Vec<(&str, &str)> = reloaded
        .variables()
        .iter()
        .map(|variable| (variable.name.as_str(), variable.value.as_str()))
        .collect();
    assert_eq!(pairs, vec![("env", "staging")]);
    Ok(())
}

#[test]
fn blank_variables_container_name_restores_the_default() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert_eq!(session.rename_variables_container("Globals")?, "Globals");
    assert_eq!(session.variables_container_name().as_deref(), Some("Globals"));
    assert_eq!(
        session.rename_variables_container("   ")?,
        "User Defined Variables"
    );
    Ok(())
}

#[test]
fn bulk_delete_uses_indices_from_before_the_call() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert_eq!(session.bulk_delete_samplers(&[2, 0])?, 2);
    let names: Vec<&str> = session.samplers().iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Browse"]);
    assert_eq!(session.samplers()[0].original_index, 1);
    assert_eq!(session.timers().len(), 1);
    assert!(matches!(session.sampler(0), Err(Error::NotFound(_))));

    let xml = session.to_xml_string();
    assert!(!xml.contains(r#"testname="Login""#));
    assert!(!xml.contains("ConstantTimer"));
    Ok(())
}

#[test]
fn bulk_delete_validates_the_selection_first() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    match session.bulk_delete_samplers(&[]) {
        Err(Error::Validation(message)) => assert_eq!(message, "No samplers selected"),
        other => panic!("expected validation error, got: {other:?}"),
    }
    assert!(matches!(
        session.bulk_delete_samplers(&[0, 7]),
        Err(Error::NotFound(_))
    ));
    assert_eq!(session.samplers().len(), 3);
    Ok(())
}

#[test]
fn sampler_filters_fold_case_and_width() -> Result<()> {
    let session = Session::parse(PLAN)?;
    let names = |found: Vec<&jmx_studio::SamplerRecord>| {
        found
            .into_iter()
            .map(|sampler| sampler.name.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(names(session.filter_samplers("LOGIN")), vec!["Login"]);
    assert_eq!(names(session.filter_samplers("ｌｏｇｉｎ")), vec!["Login"]);
    assert_eq!(names(session.filter_samplers("catalog")), vec!["Browse"]);
    assert_eq!(session.filter_samplers("").len(), 3);
    assert_eq!(
        names(session.filter_samplers_matching("^(Login|Search)$")?),
        vec!["Login", "Search"]
    );
    assert!(matches!(
        session.filter_samplers_matching("(unclosed"),
        Err(Error::Validation(_))
    ));
    Ok(())
}

#[test]
fn renames_apply_valid_entries_and_report_blank_ones() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let report = session.rename_all_samplers(&[
        SamplerRename {
            original_index: 0,
            name: "Sign in".into(),
        },
        SamplerRename {
            original_index: 1,
            name: " ".into(),
        },
        SamplerRename {
            original_index: 2,
            name: "Search".into(),
        },
    ])?;
    assert_eq!((report.renamed, report.unchanged), (1, 1));
    assert_eq!(report.rejected, vec![1]);
    assert!(!report.is_complete());
    assert_eq!(session.samplers()[0].name, "Sign in");
    assert_eq!(session.timers()[0].sampler.as_deref(), Some("Sign in"));

    assert!(session
        .rename_all_samplers(&[SamplerRename {
            original_index: 9,
            name: "x".into(),
        }])
        .is_err());
    assert!(!session.rename_sampler(0, "Sign in")?);
    assert!(session.rename_sampler(0, "").is_err());
    Ok(())
}

#[test]
fn data_sources_go_before_the_first_thread_group() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let config = DataSourceConfig::new(
        DataSourceKind::Standard,
        "Accounts",
        "data/accounts.csv",
        "user,password",
    );
    assert_eq!(session.add_data_source(config)?, 0);

    let xml = session.to_xml_string();
    assert!(xml.contains(r#"</CSVDataSet><hashTree/><ThreadGroup"#));
    let record = &session.data_sources()[0];
    assert_eq!(record.config.filename, "data/accounts.csv");
    assert_eq!(record.config.variable_names, "user,password");
    assert_eq!(record.kind(), DataSourceKind::Standard);

    let reloaded = Session::parse(&xml)?;
    assert_eq!(reloaded.data_sources().len(), 1);
    assert_eq!(reloaded.data_sources()[0].config, record.config);
    assert_eq!(reloaded.thread_groups().len(), 2);
    Ok(())
}

#[test]
fn data_source_updates_rewrite_the_element_in_place() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.add_data_source(DataSourceConfig::new(
        DataSourceKind::Standard,
        "Accounts",
        "accounts.csv",
        "user",
    ))?;
    let mut extended = DataSourceConfig::new(DataSourceKind::Extended, "Accounts", "a.csv", "user");
    if let DataSourceOptions::Extended { allocation, .. } = &mut extended.options {
        *allocation = Allocation::Manual { count: Some(25) };
    }
    session.update_data_source(0, extended.clone())?;

    let record = &session.data_sources()[0];
    assert_eq!(record.kind(), DataSourceKind::Extended);
    assert_eq!(record.config.options, extended.options);
    let xml = session.to_xml_string();
    assert!(!xml.contains("<CSVDataSet"));
    assert!(xml.contains("</com.di.jmeter.config.ExtendedCsvDataSetConfig><hashTree/><ThreadGroup"));

    if let DataSourceOptions::Extended { allocation, .. } = &mut extended.options {
        *allocation = Allocation::Manual { count: None };
    }
    match session.update_data_source(0, extended) {
        Err(Error::Validation(message)) => assert!(message.contains("Allocation count")),
        other => panic!("expected validation error, got: {other:?}"),
    }

    session.delete_data_source(0)?;
    assert!(session.data_sources().is_empty());
    assert!(!session.to_xml_string().contains("ExtendedCsvDataSetConfig"));
    Ok(())
}

#[test]
fn data_sources_need_a_test_plan() -> Result<()> {
    let mut session = Session::parse("<jmeterTestPlan><hashTree/></jmeterTestPlan>")?;
    let config = DataSourceConfig::new(DataSourceKind::RandomOrder, "Rows", "rows.csv", "a");
    match session.add_data_source(config) {
        Err(Error::Structure(message)) => assert_eq!(message, "No Test Plan found"),
        other => panic!("expected structure error, got: {other:?}"),
    }
    Ok(())
}

#[test]
fn timers_are_added_to_every_sampler_of_the_group() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let added = session.add_timer(
        0,
        TimerTarget::AllSamplers,
        NewTimer {
            kind: TimerKind::UniformRandom,
            name: "Wait".into(),
            delay_ms: 1000,
            random_range_ms: Some(500.0),
            deviation_ms: None,
        },
    )?;
    assert_eq!(added, 2);
    let names: Vec<&str> = session.timers().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Pause", "Wait", "Wait", "Rate"]);
    let browse = &session.timers()[2];
    assert_eq!(browse.sampler.as_deref(), Some("Browse"));
    assert_eq!(browse.thread_group.as_deref(), Some("Checkout"));
    assert_eq!(
        browse.params,
        TimerParams::Delay {
            delay_ms: 1000.0,
            range_ms: 500.0
        }
    );

    let reloaded = Session::parse(&session.to_xml_string())?;
    assert_eq!(reloaded.timers(), session.timers());
    Ok(())
}

#[test]
fn added_records_keep_their_index_after_reload() -> Result<()> {
    let group_end = "</com.blazemeter.jmeter.threads.concurrency.ConcurrencyThreadGroup>\n      <hashTree>";
    let plan = PLAN.replace(
        group_end,
        &format!(
            r#"{group_end}<CSVDataSet testname="Local"><stringProp name="filename">local.csv</stringProp></CSVDataSet><hashTree/>"#
        ),
    );
    let mut session = Session::parse(&plan)?;
    assert_eq!(session.data_sources().len(), 1);
    let pause = NewTimer {
        kind: TimerKind::Constant,
        name: "Settle".into(),
        delay_ms: 50,
        random_range_ms: None,
        deviation_ms: None,
    };
    session.add_timer(0, TimerTarget::Sampler(0), pause)?;
    assert_eq!(session.timers()[1].name, "Settle");
    assert_eq!(session.timers()[2].name, "Rate");

    let first = DataSourceConfig::new(DataSourceKind::Standard, "Accounts", "a.csv", "user");
    let second = DataSourceConfig::new(DataSourceKind::RandomOrder, "Products", "p.csv", "sku");
    assert_eq!(session.add_data_source(first)?, 0);
    assert_eq!(session.add_data_source(second)?, 1);
    assert_eq!(session.data_sources()[2].config.name, "Local");

    let reloaded = Session::parse(&session.to_xml_string())?;
    assert_eq!(reloaded.timers(), session.timers());
    assert_eq!(reloaded.data_sources(), session.data_sources());
    assert_eq!(reloaded.thread_groups(), session.thread_groups());
    assert_eq!(reloaded.samplers(), session.samplers());
    assert_eq!(reloaded.variables(), session.variables());
    Ok(())
}

#[test]
fn timers_target_only_samplers_of_the_chosen_group() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    let timer = NewTimer {
        kind: TimerKind::Constant,
        name: "Pause".into(),
        delay_ms: 100,
        random_range_ms: None,
        deviation_ms: None,
    };
    match session.add_timer(0, TimerTarget::Sampler(2), timer.clone()) {
        Err(Error::NotFound(message)) => {
            assert_eq!(message, "Selected sampler not found in this thread group")
        }
        other => panic!("expected not found, got: {other:?}"),
    }
    assert_eq!(session.add_timer(1, TimerTarget::Sampler(2), timer.clone())?, 1);

    let blank = NewTimer {
        name: " ".into(),
        ..timer
    };
    assert!(matches!(
        session.add_timer(1, TimerTarget::AllSamplers, blank),
        Err(Error::Validation(_))
    ));
    Ok(())
}

#[test]
fn think_time_skips_samplers_that_already_have_one() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    assert_eq!(session.bulk_add_think_time(300, 0)?, 2);
    let names: Vec<&str> = session.timers().iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"Think Time - Browse"));
    assert!(names.contains(&"Think Time - Search"));
    assert_eq!(session.bulk_add_think_time(300, 0)?, 0);
    assert_eq!(session.bulk_add_think_time(300, 200)?, 3);
    assert!(session.bulk_add_think_time(-1, 0).is_err());
    Ok(())
}

#[test]
fn timer_updates_respect_the_timer_kind() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.update_timer(
        0,
        TimerUpdate {
            delay_ms: Some(750.0),
            ..TimerUpdate::default()
        },
    )?;
    assert_eq!(
        session.timers()[0].params,
        TimerParams::Delay {
            delay_ms: 750.0,
            range_ms: 0.0
        }
    );
    assert!(session
        .update_timer(
            0,
            TimerUpdate {
                range_ms: Some(10.0),
                ..TimerUpdate::default()
            }
        )
        .is_err());

    session.update_timer(
        1,
        TimerUpdate {
            throughput: Some(8.0),
            ..TimerUpdate::default()
        },
    )?;
    assert_eq!(session.thread_groups()[0].throughput, 8.0);

    let removed = session.delete_timer(1)?;
    assert_eq!(removed.name, "Rate");
    assert_eq!(session.thread_groups()[0].throughput, 0.0);
    Ok(())
}

#[test]
fn trace_reports_shadowed_properties_and_edits() -> Result<()> {
    let plan = PLAN.replace(
        r#"<stringProp name="ThreadGroup.num_threads">10</stringProp>"#,
        r#"<stringProp name="ThreadGroup.num_threads">10</stringProp><intProp name="ThreadGroup.num_threads">99</intProp>"#,
    );
    let config = EditorConfig {
        trace: TraceConfig {
            enabled: true,
            forward: false,
            ..TraceConfig::default()
        },
        ..EditorConfig::default()
    };
    let mut session = Session::parse_with_config(&plan, &config)?;
    assert_eq!(session.thread_groups()[0].users, 10);
    let logs = session.take_trace_logs();
    assert!(
        logs.iter()
            .any(|line| line.starts_with("[parse]") && line.contains("only the first is used")),
        "missing shadowed property line: {logs:?}"
    );

    session.add_variable("region", "eu")?;
    assert_eq!(session.take_trace_logs(), vec!["[edit] added variable 'region'"]);

    session.set_trace_edits(false);
    session.add_variable("zone", "a")?;
    assert!(session.take_trace_logs().is_empty());
    assert!(session.set_trace_log_limit(0).is_err());
    Ok(())
}

#[test]
fn single_sampler_edits_keep_original_indices() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.set_sampler_enabled(1, false)?;
    assert!(!session.sampler(1)?.enabled);
    assert!(session
        .to_xml_string()
        .contains(r#"testname="Browse" enabled="false""#));

    let removed = session.delete_sampler(0)?;
    assert_eq!(removed.name, "Login");
    assert_eq!(session.sampler(1)?.name, "Browse");
    assert_eq!(session.sampler(2)?.name, "Search");
    assert!(matches!(session.delete_sampler(0), Err(Error::NotFound(_))));
    assert_eq!(session.timers().len(), 1);
    Ok(())
}

#[test]
fn tracing_can_be_switched_on_after_loading() -> Result<()> {
    let mut session = Session::parse(PLAN)?;
    session.apply_users(0, 12)?;
    assert!(session.take_trace_logs().is_empty());

    session.enable_trace(true);
    session.set_trace_parse(false);
    session.apply_users(0, 13)?;
    assert_eq!(
        session.take_trace_logs(),
        vec!["[edit] thread group 'Checkout' users=13"]
    );
    Ok(())
}
