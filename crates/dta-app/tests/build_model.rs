use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use dta_app::{
    AnalysisConfig, AppError, average_phase_times, build_model, experiments_by_instance,
    experiments_by_instance_and_algorithm, read_json, simulation_times_by_prefix_and_aggregation,
    write_json,
};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    dir
}

fn experiment_log(output_dir: &str, router: &str, steps: u32) -> String {
    let mut log = format!(
        "Calling duaIterate.py with output directory: {output_dir} and arguments: --routing-algorithm x\n"
    );
    for i in 0..steps {
        log.push_str(&format!(
            "> Executing step {i}
>> Running router
>>> Duration: 0:00:0{i}.500000
<<
{router}; {output_dir}; {i}; routing; 2000000000
>> Running simulation
>>> Duration: 0:00:1{i}
<<
< relative gap in iteration {i}: 0.{i}
< Step {i} ended (duration: 0:00:20)
"
        ));
    }
    log.push_str("dua-iterate ended (duration: 0:01:00)\n");
    log
}

const PARAMS: &str = "# in_dir;prefix;trips;begin;end;aggregation;dev;relgap;last_iter
/nets/berlin;berlin;trips_a.xml;0;3600;300;0.02;0.01;20
/nets/karlsruhe;karlsruhe;trips_b.xml;0;7200;900.5;0.02;0.001;50
";

fn write_inputs(dir: &PathBuf) -> (PathBuf, PathBuf) {
    fs::create_dir_all(dir).expect("failed to create temp dir");
    let mut log = experiment_log("/out/0/cch/1", "cch-router", 3);
    log.push_str(&experiment_log("/out/0/fastdta_1_2/1", "fastdta-router", 2));
    log.push_str(&experiment_log("/out/1/cch/1", "cch-router", 2));
    log.push_str(&experiment_log("/out/4/cch/1", "cch-router", 1));

    let log_path = dir.join("experiments.log");
    let csv_path = dir.join("experiments.csv");
    fs::write(&log_path, log).expect("failed to write log");
    fs::write(&csv_path, PARAMS).expect("failed to write csv");
    (log_path, csv_path)
}

#[test]
fn build_and_query() {
    let dir = unique_temp_dir("dta_app_build");
    let (log_path, csv_path) = write_inputs(&dir);

    let (model, report) =
        build_model(&log_path, &csv_path, &AnalysisConfig::default()).expect("model builds");
    assert_eq!(model.experiments.len(), 4);
    assert_eq!(model.instances.len(), 2);
    assert_eq!(model.algorithms, vec!["cch", "fastdta_1_2"]);
    assert!(report.rejected_rows.is_empty());
    assert_eq!(report.parse_stats.malformed_tokens, 0);

    // instance 4 has no parameter row but is still in the model
    let by_instance = experiments_by_instance(&model);
    assert_eq!(by_instance.keys().copied().collect::<Vec<_>>(), vec![0, 1, 4]);
    assert_eq!(by_instance[&0].len(), 2);
    assert!(model.instance_for(by_instance[&4][0]).is_none());

    let groups = experiments_by_instance_and_algorithm(&model);
    assert_eq!(groups[&(0, "fastdta_1_2".to_string())][0].samples.as_deref(), Some("1 2"));

    let sims = simulation_times_by_prefix_and_aggregation(&model);
    assert_eq!(sims[&("berlin".to_string(), 300)], vec![10.0, 11.0, 12.0, 10.0, 11.0]);
    assert_eq!(sims[&("karlsruhe".to_string(), 900)], vec![10.0, 11.0]);

    let cch: Vec<_> = model.experiments.iter().filter(|e| e.algorithm == "cch").collect();
    let avg = average_phase_times(&cch, &[]);
    assert_eq!(avg["routing"], 2.0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn configured_families_change_identity() {
    let dir = unique_temp_dir("dta_app_config");
    let (log_path, csv_path) = write_inputs(&dir);
    let config_path = dir.join("analysis.yaml");
    fs::write(&config_path, "sampled_algorithms: [sumo-sample]\n").expect("failed to write config");

    let config = AnalysisConfig::load(&config_path).expect("config loads");
    let (model, _) = build_model(&log_path, &csv_path, &config).expect("model builds");
    let fastdta = model
        .experiments
        .iter()
        .find(|e| e.algorithm == "fastdta_1_2")
        .expect("fastdta experiment");
    assert_eq!(fastdta.algorithm_base, "fastdta_1_2");
    assert_eq!(fastdta.samples, None);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn export_round_trip_through_file() {
    let dir = unique_temp_dir("dta_app_export");
    let (log_path, csv_path) = write_inputs(&dir);
    let (model, _) =
        build_model(&log_path, &csv_path, &AnalysisConfig::default()).expect("model builds");

    let out = dir.join("model.json");
    write_json(&model, &out).expect("export writes");
    let restored = read_json(&out).expect("export reads");
    assert_eq!(restored, model);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_inputs_are_errors() {
    let dir = unique_temp_dir("dta_app_missing");
    let config = AnalysisConfig::default();

    let err = build_model(&dir.join("nope.log"), &dir.join("nope.csv"), &config).unwrap_err();
    assert!(matches!(err, AppError::Log(_)));

    let (log_path, _) = write_inputs(&dir);
    let err = build_model(&log_path, &dir.join("nope.csv"), &config).unwrap_err();
    assert!(matches!(err, AppError::Params(_)));

    let err = AnalysisConfig::load(&dir.join("nope.yaml")).unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));

    let _ = fs::remove_dir_all(&dir);
}
