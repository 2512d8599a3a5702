use std::fs;

use aim_up::{
    launcher::runtime::{
        environment::{AIM_TF_LOGS_PATH_KEY, AIM_UI_MOUNTED_REPO_PATH, AIM_UI_TELEMETRY_KEY},
        DeclinedAction, LaunchOutcome, Launcher,
    },
    lib::{
        errors::{LaunchError, RepoError},
        process::ExitOutcome,
    },
    repo::{Repo, RepoStatus},
};
use tempfile::tempdir;

use crate::common::{
    launch_config, output_lines, seed_legacy_repo, seed_version, stub_commands, RecordingRunner,
    Scripted, ScriptedConfirm,
};

#[tokio::test]
async fn declining_init_on_missing_repo_runs_nothing() {
    let temp = tempdir().expect("can create temp directory");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect("declining is not an error");

    assert_eq!(outcome, LaunchOutcome::Declined(DeclinedAction::Initialize));
    assert!(runner.calls.borrow().is_empty(), "no subprocess may run");
    assert!(!temp.path().join(".aim").exists(), "repo must not be created");
    assert_eq!(confirm.prompts.borrow().len(), 1);
    assert!(confirm.prompts.borrow()[0].contains("is not a valid Aim repository"));
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("To initialize repo please run the following command:"));
    assert!(text.contains("aim init"));
}

#[tokio::test]
async fn accepting_init_creates_repo_then_migrates_and_serves() {
    let temp = tempdir().expect("can create temp directory");
    let confirm = ScriptedConfirm::answering(true);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .with_telemetry_opt_out(Some("0".into()))
    .launch()
    .await
    .expect("launch succeeds");

    assert_eq!(outcome, LaunchOutcome::Served);
    assert_eq!(
        Repo::check_status(temp.path()).expect("status readable"),
        RepoStatus::Valid
    );
    assert_eq!(runner.programs(), vec!["migrate", "serve"]);
    let mounted = temp.path().join(".aim").to_string_lossy().into_owned();
    assert_eq!(
        runner.calls.borrow()[0].env.get(AIM_UI_MOUNTED_REPO_PATH),
        Some(&mounted)
    );
}

#[tokio::test]
async fn declining_upgrade_leaves_legacy_repo_untouched() {
    let temp = tempdir().expect("can create temp directory");
    let run_dir = seed_legacy_repo(temp.path());
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect("declining is not an error");

    assert_eq!(outcome, LaunchOutcome::Declined(DeclinedAction::Upgrade));
    assert!(runner.calls.borrow().is_empty(), "no subprocess may run");
    assert!(run_dir.join("params.json").is_file());
    assert!(!temp.path().join(".aim").join("VERSION").exists());
    assert!(!temp.path().join(".aim_legacy").exists());
    assert!(confirm.prompts.borrow()[0].contains("requires upgrade"));
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains(&format!(
        "aim upgrade --repo {} 2to3",
        temp.path().display()
    )));
}

#[tokio::test]
async fn accepting_upgrade_migrates_without_dropping_legacy_data() {
    let temp = tempdir().expect("can create temp directory");
    seed_legacy_repo(temp.path());
    let confirm = ScriptedConfirm::answering(true);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect("launch succeeds");

    assert_eq!(outcome, LaunchOutcome::Served);
    assert_eq!(
        Repo::check_status(temp.path()).expect("status readable"),
        RepoStatus::Valid
    );
    assert!(temp
        .path()
        .join(".aim")
        .join("meta")
        .join("run-1")
        .join("params.json")
        .is_file());
    assert!(
        temp.path().join(".aim_legacy").is_dir(),
        "legacy data is kept as a backup"
    );
    assert_eq!(runner.calls.borrow().len(), 2);
}

#[tokio::test]
async fn patch_required_repo_is_patched_without_prompting() {
    let temp = tempdir().expect("can create temp directory");
    seed_version(temp.path(), "3.0");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect("launch succeeds");

    assert_eq!(outcome, LaunchOutcome::Served);
    assert!(confirm.prompts.borrow().is_empty());
    assert_eq!(
        fs::read_to_string(temp.path().join(".aim").join("VERSION")).expect("marker readable"),
        "3.2"
    );
    assert!(temp.path().join(".aim").join("locks").is_dir());
}

#[tokio::test]
async fn valid_repo_is_opened_without_prompting_or_changes() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let store = temp.path().join(".aim").join("structured.json");
    let before = fs::read(&store).expect("store readable");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    let outcome = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect("launch succeeds");

    assert_eq!(outcome, LaunchOutcome::Served);
    assert!(confirm.prompts.borrow().is_empty());
    assert_eq!(fs::read(&store).expect("store readable"), before);
}

#[tokio::test]
async fn migration_failure_prevents_server_start() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::scripted([Scripted::Exit(ExitOutcome::Failure {
        exit_code: Some(2),
    })]);
    let mut out = Vec::new();

    let err = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect_err("migration failure is fatal");

    assert!(matches!(
        err,
        LaunchError::MigrationFailed { exit_code: Some(2) }
    ));
    assert_eq!(runner.programs(), vec!["migrate"]);
    let lines = output_lines(&out);
    assert!(lines
        .iter()
        .any(|line| line == "Failed to initialize Aim DB. Please see the logs above for details."));
    assert!(!lines.iter().any(|line| line.starts_with("Open http")));
}

#[tokio::test]
async fn migration_spawn_error_is_treated_as_failure() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::scripted([Scripted::SpawnError]);
    let mut out = Vec::new();

    let err = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .launch()
    .await
    .expect_err("spawn failure is fatal");

    assert!(matches!(err, LaunchError::MigrationFailed { exit_code: None }));
    assert_eq!(runner.calls.borrow().len(), 1);
}

#[tokio::test]
async fn server_failure_is_reported_after_announcement() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::scripted([
        Scripted::Exit(ExitOutcome::Success),
        Scripted::Exit(ExitOutcome::Failure { exit_code: Some(1) }),
    ]);
    let mut out = Vec::new();

    let err = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .with_telemetry_opt_out(Some("0".into()))
    .launch()
    .await
    .expect_err("server failure is fatal");

    assert!(matches!(err, LaunchError::ServerFailed { exit_code: Some(1) }));
    let lines = output_lines(&out);
    let open = lines
        .iter()
        .position(|line| line == "Open http://127.0.0.1:43800")
        .expect("URL is announced");
    let failed = lines
        .iter()
        .position(|line| line == "Failed to run Aim UI. Please see the logs above for details.")
        .expect("failure is reported");
    assert!(open < failed);
}

#[tokio::test]
async fn announcement_prints_exact_url_line_and_exit_hint() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let confirm = ScriptedConfirm::answering(false);
    let runner = RecordingRunner::default();
    let mut out = Vec::new();

    Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        &mut out,
    )
    .with_telemetry_opt_out(Some("0".into()))
    .launch()
    .await
    .expect("launch succeeds");

    let lines = output_lines(&out);
    assert!(lines.iter().any(|line| line == "Open http://127.0.0.1:43800"));
    assert!(lines.iter().any(|line| line == "Press Ctrl+C to exit"));
    assert!(lines
        .iter()
        .any(|line| line.contains("Running Aim UI on repo `<Repo path=")));
    assert_eq!(
        runner.calls.borrow()[1].args,
        vec!["127.0.0.1:43800".to_string()]
    );
}

#[tokio::test]
async fn tf_logs_reach_migration_environment_only_when_given() {
    let temp = tempdir().expect("can create temp directory");
    Repo::init(temp.path()).expect("can init repo");
    let logs = temp.path().join("tb-logs");
    fs::create_dir_all(&logs).expect("can create logs dir");

    let with_logs = RecordingRunner::default();
    let mut config = launch_config(temp.path());
    config.tf_logs = Some(logs.clone());
    Launcher::new(
        config,
        stub_commands(),
        ScriptedConfirm::answering(false),
        &with_logs,
        Vec::new(),
    )
    .launch()
    .await
    .expect("launch succeeds");

    let without_logs = RecordingRunner::default();
    Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        ScriptedConfirm::answering(false),
        &without_logs,
        Vec::new(),
    )
    .launch()
    .await
    .expect("launch succeeds");

    let expected = logs.to_string_lossy().into_owned();
    assert_eq!(
        with_logs.calls.borrow()[0].env.get(AIM_TF_LOGS_PATH_KEY),
        Some(&expected)
    );
    assert!(!without_logs.calls.borrow()[0]
        .env
        .contains_key(AIM_TF_LOGS_PATH_KEY));
}

#[tokio::test]
async fn telemetry_flag_reaches_server_and_controls_notice() {
    let cases = [
        (true, Some("1"), "0", false),
        (true, None, "0", false),
        (false, Some("0"), "0", false),
        (false, Some("1"), "1", true),
        (false, None, "1", true),
    ];

    for (dev, opt_out, expected_flag, expect_notice) in cases {
        let temp = tempdir().expect("can create temp directory");
        Repo::init(temp.path()).expect("can init repo");
        let runner = RecordingRunner::default();
        let mut out = Vec::new();
        let mut config = launch_config(temp.path());
        config.dev = dev;

        Launcher::new(
            config,
            stub_commands(),
            ScriptedConfirm::answering(false),
            &runner,
            &mut out,
        )
        .with_telemetry_opt_out(opt_out.map(str::to_string))
        .launch()
        .await
        .expect("launch succeeds");

        let calls = runner.calls.borrow();
        assert!(
            !calls[0].env.contains_key(AIM_UI_TELEMETRY_KEY),
            "migration runs before the telemetry decision"
        );
        assert_eq!(
            calls[1].env.get(AIM_UI_TELEMETRY_KEY).map(String::as_str),
            Some(expected_flag),
            "dev={dev} opt_out={opt_out:?}"
        );
        let text = String::from_utf8_lossy(&out);
        assert_eq!(
            text.contains("Aim UI collects anonymous usage analytics."),
            expect_notice,
            "dev={dev} opt_out={opt_out:?}"
        );
    }
}

#[tokio::test]
async fn newer_repo_format_is_fatal_before_any_subprocess() {
    let temp = tempdir().expect("can create temp directory");
    seed_version(temp.path(), "4.0");
    let confirm = ScriptedConfirm::answering(true);
    let runner = RecordingRunner::default();

    let err = Launcher::new(
        launch_config(temp.path()),
        stub_commands(),
        &confirm,
        &runner,
        Vec::new(),
    )
    .launch()
    .await
    .expect_err("unsupported format must fail");

    assert!(matches!(
        err,
        LaunchError::Repo(RepoError::UnsupportedVersion { .. })
    ));
    assert!(confirm.prompts.borrow().is_empty());
    assert!(runner.calls.borrow().is_empty());
}
