use pretty_assertions::assert_eq;
use std::path::PathBuf;
use xperf_trace_studio::commands::{
    execute_classify, execute_counters, execute_stacks, execute_timers, ClassifyArgs, CountersArgs, StacksArgs,
    TimersArgs,
};
use xperf_trace_studio::output::read_report;
use xperf_trace_studio::report::ReportKind;

const STACK_DUMP: &str = "\
SampledProfile,  TimeStamp,     Process Name ( PID),   ThreadID,           PrgrmCtr, CPU
SampledProfile, 5, app.exe (1), 9, 0x10, 0
SampledProfile, 7, app.exe (1), 9, 0x10, 0
SampledProfile, 8, other.exe (2), 4, 0x10, 1
Stack, 5, 9, 1, 0x10, app.exe!leaf
Stack, 5, 9, 2, 0x20, app.exe!main
Stack, 7, 9, 1, 0x10, app.exe!leaf
Stack, 7, 9, 2, 0x20, app.exe!main
Stack, 8, 4, 1, 0x10, other.exe!main
";

fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_stacks_writes_collapsed_file_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "dump.txt", STACK_DUMP);
    let out = dir.path().join("out");
    let json = out.join("report.json");

    execute_stacks(StacksArgs {
        input,
        output_dir: out.clone(),
        flamegraph: true,
        output_json: Some(json.clone()),
        ..Default::default()
    })
    .unwrap();

    let collapsed = std::fs::read_to_string(out.join("collapsed_stacks_0.txt")).unwrap();
    assert_eq!(collapsed, "app.exe_1_9;app.exe!main;app.exe!leaf 2\n");
    assert!(out.join("app.exe_1_9.svg").exists());
    assert!(!out.join("collapsed_stacks_1.txt").exists());

    let report = read_report(&json).unwrap();
    assert_eq!(report.kind, ReportKind::Stacks);
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].key, "app.exe (1) [9]");
    assert_eq!(report.stats.matched, 3);
}

#[test]
fn test_missing_input_fails_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("never");

    let err = execute_stacks(StacksArgs {
        input: dir.path().join("missing.txt"),
        output_dir: out.clone(),
        ..Default::default()
    })
    .unwrap_err();

    assert!(err.to_string().contains("Input file not found"));
    assert!(!out.exists());
}

#[test]
fn test_counters_broken_pairing_names_line() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(
        &dir,
        "pmc.txt",
        "Pmc, 100, 1, 10, 10\nSampledProfile, 5, app.exe (1), 9, 0x10, 0\n",
    );

    let err = execute_counters(CountersArgs {
        input,
        ..Default::default()
    })
    .unwrap_err();

    let message = format!("{:#}", err);
    assert!(message.contains("Line 2"), "{}", message);
    assert!(message.contains("CSwitch"), "{}", message);
}

#[test]
fn test_counters_report_json() {
    let cswitch = |ts: u64, new: &str, old: &str| {
        format!("CSwitch, {ts}, {new}, 1, 8, -1, 31, 0, {old}, 2, 8, -1, Waiting, WrQueue, Swapable, 14, 0, 4, 0, 0, 0")
    };
    let dump = [
        "Pmc, 100, 1, 10, 2000000".to_string(),
        cswitch(100, "a.exe (1)", "Idle (   0)"),
        "Pmc, 150, 1, 30, 3000000".to_string(),
        cswitch(150, "Idle (   0)", "a.exe (1)"),
    ]
    .join("\n");

    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "pmc.txt", &dump);
    let json = dir.path().join("counters.json");

    execute_counters(CountersArgs {
        input,
        summarize_by_name: true,
        output_json: Some(json.clone()),
        ..Default::default()
    })
    .unwrap();

    let report = read_report(&json).unwrap();
    assert_eq!(report.kind, ReportKind::Counters);
    assert_eq!(report.rank_by, "cpu_time");
    assert_eq!(report.rows[0].key, "a.exe");
    assert_eq!(report.rows[0].rank_value, 50);
}

#[test]
fn test_counters_rejects_unknown_counter_sort() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir, "pmc.txt", "");

    let err = execute_counters(CountersArgs {
        input,
        sort_by: "counter3".parse().unwrap(),
        ..Default::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("counter3"));
}

#[test]
fn test_timers_and_classify_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_input(
        &dir,
        "timers.csv",
        "Task Name, Process Name, Process, Interval (0x), Time (s), PID (0x), App Name\n\
         SystemTimeResolutionChange, a.exe, a.exe (1), 0x2710, 1.0, 0x1, a.exe\n\
         SystemTimeResolutionChange, a.exe, a.exe (1), 0x0, 2.0, 0x1, a.exe\n",
    );
    let listing = write_input(
        &dir,
        "processes.txt",
        "       MIN,   1, Process, 0X1,       chrome.exe (  10),          1,          1, 0x1, \"C:\\chrome.exe\"\n",
    );
    let json = dir.path().join("timers.json");

    execute_timers(TimersArgs {
        input: csv,
        processes: Some(listing.clone()),
        output_json: Some(json.clone()),
    })
    .unwrap();
    execute_classify(ClassifyArgs { input: listing }).unwrap();

    let report = read_report(&json).unwrap();
    assert_eq!(report.kind, ReportKind::Timers);
    assert_eq!(report.rows[0].breakdown[0].label, "1.0 ms");
    assert_eq!(report.rows[0].breakdown[0].value, 1_000_000);
}
