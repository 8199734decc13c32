//! Lifecycle tests for full scaffold runs.
//!
//! These drive `run_plan` against a seeded temporary repository with scripted
//! tools, fetches, and prompts, and verify end-to-end behavior: commit
//! ordering, checkpoint completeness, guard correctness, and abort semantics.

use furnish::core::types::{AnswerKey, StepOutcome};
use furnish::io::git::Git;
use furnish::run::{RunnerEnv, StepFailedError, run_plan};
use furnish::test_support::{
    GEMFILE_SEED, LOCALE_BODY, ScriptedFetcher, ScriptedPrompter, ScriptedToolRunner, TestRepo,
};

fn env<'a>(
    tools: &'a ScriptedToolRunner,
    prompter: &'a ScriptedPrompter,
) -> RunnerEnv<'a> {
    RunnerEnv {
        tools,
        fetcher: &ScriptedFetcher,
        prompter,
    }
}

/// Commit subjects oldest-first.
fn commits(repo: &TestRepo) -> Vec<String> {
    let mut subjects = Git::new(repo.root()).log_subjects().expect("git log");
    subjects.reverse();
    subjects
}

#[test]
fn full_run_checkpoints_every_step_in_order() {
    let repo = TestRepo::new().expect("repo");
    let tools = ScriptedToolRunner::new();
    let prompter = ScriptedPrompter::always(true);

    let report = run_plan(repo.root(), &env(&tools, &prompter)).expect("run");

    assert_eq!(
        commits(&repo),
        vec![
            "rails new",
            "Install rubocop",
            "rubocop -a",
            "Install rspec-rails",
            "rails g rspec:install",
            "Install simplecov",
            "Install pry-byebug",
            "Install hamlit-rails",
            "rake hamlit:erb2haml",
            "Uninstall jbuilder",
            "Localize to Japan",
            "Disable active_storage/engine, action_text/engine",
        ]
    );

    // Checkpoint completeness: nothing left uncommitted.
    assert!(Git::new(repo.root()).is_clean().expect("status"));

    // 6.1.4 is above the backport ceiling, so the step must be skipped.
    let backports = report
        .steps
        .iter()
        .find(|s| s.name == "legacy-backports")
        .expect("step report");
    assert_eq!(backports.outcome, StepOutcome::Skipped);
    assert!(
        !repo
            .root()
            .join("config/initializers/active_support_backports.rb")
            .exists()
    );

    // Ordering: the lint tool enters the manifest before the test framework.
    let gemfile = repo.read("Gemfile").expect("gemfile");
    let rubocop_pos = gemfile.find("gem \"rubocop\"").expect("rubocop entry");
    let rspec_pos = gemfile.find("gem \"rspec-rails\"").expect("rspec entry");
    assert!(rubocop_pos < rspec_pos);

    // Fetched baselines landed verbatim (modulo the retired cop rename).
    let baseline = repo.read(".rubocop-6-1-4.yml").expect("baseline");
    assert!(baseline.contains("Layout/IndentationStyle:"));
    assert!(!baseline.contains("Layout/Tab:"));
    let rubocop_yml = repo.read(".rubocop.yml").expect("rubocop.yml");
    assert!(rubocop_yml.contains("inherit_from:\n  - .rubocop-6-1-4.yml"));
    assert_eq!(repo.read("config/locales/ja.yml").expect("ja.yml"), LOCALE_BODY);

    // Localization and railtie pruning rewrote the application config.
    let app = repo.read("config/application.rb").expect("application.rb");
    assert!(app.contains("config.time_zone = \"Tokyo\""));
    assert!(app.contains("config.i18n.default_locale = :ja"));
    assert!(app.contains("# require \"rails/all\""));
    assert!(app.contains("require \"active_record/railtie\""));
    assert!(!app.contains("require \"active_storage/engine\""));
    assert!(!app.contains("require \"action_text/engine\""));

    // Simplecov ignored its coverage directory; the old test dir is gone.
    assert!(repo.read(".gitignore").expect("gitignore").contains("coverage"));
    assert!(!repo.root().join("test").exists());

    // The generator actually ran.
    assert!(
        tools
            .invocations()
            .iter()
            .any(|argv| argv == &["bin/rails", "generate", "rspec:install"])
    );
}

#[test]
fn declined_guards_produce_no_commit_and_no_effect() {
    let repo = TestRepo::new().expect("repo");
    let tools = ScriptedToolRunner::new();
    let prompter = ScriptedPrompter::always(false);

    let report = run_plan(repo.root(), &env(&tools, &prompter)).expect("run");

    let subjects = commits(&repo);
    assert!(!subjects.iter().any(|s| s == "Uninstall jbuilder"));
    assert!(!subjects.iter().any(|s| s == "Localize to Japan"));
    assert!(!subjects.iter().any(|s| s.starts_with("Disable ")));

    let gemfile = repo.read("Gemfile").expect("gemfile");
    assert!(gemfile.contains("gem \"jbuilder\""));
    assert!(!gemfile.contains("# gem \"jbuilder\""));

    let app = repo.read("config/application.rb").expect("application.rb");
    assert!(app.contains("require \"rails/all\""));
    assert!(!app.contains("# require \"rails/all\""));
    assert!(!app.contains("Tokyo"));
    assert!(!repo.root().join("config/locales/ja.yml").exists());

    let skipped: Vec<&str> = report
        .steps
        .iter()
        .filter(|s| s.outcome == StepOutcome::Skipped)
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(
        skipped,
        vec![
            "uninstall-jbuilder",
            "localize-japan",
            "prune-railties",
            "legacy-backports"
        ]
    );
}

#[test]
fn localization_scenario_injects_config_and_commit() {
    let repo = TestRepo::new().expect("repo");
    let tools = ScriptedToolRunner::new();
    let prompter = ScriptedPrompter::new(&[
        (AnswerKey::UninstallJbuilder, false),
        (AnswerKey::LocalizeJapan, true),
        (AnswerKey::DisableActiveStorage, false),
        (AnswerKey::DisableActionText, false),
    ]);

    run_plan(repo.root(), &env(&tools, &prompter)).expect("run");

    let app = repo.read("config/application.rb").expect("application.rb");
    assert!(app.contains("config.time_zone = \"Tokyo\""));
    assert!(app.contains("config.i18n.default_locale = :ja"));
    assert!(commits(&repo).iter().any(|s| s == "Localize to Japan"));
}

#[test]
fn jbuilder_scenario_comments_without_deleting() {
    let declined = TestRepo::new().expect("repo");
    let accepted = TestRepo::new().expect("repo");
    let tools = ScriptedToolRunner::new();

    run_plan(
        declined.root(),
        &env(&tools, &ScriptedPrompter::always(false)),
    )
    .expect("declined run");
    let accepting = ScriptedPrompter::new(&[
        (AnswerKey::UninstallJbuilder, true),
        (AnswerKey::LocalizeJapan, false),
        (AnswerKey::DisableActiveStorage, false),
        (AnswerKey::DisableActionText, false),
    ]);
    run_plan(accepted.root(), &env(&tools, &accepting)).expect("accepted run");

    let with = accepted.read("Gemfile").expect("gemfile");
    assert!(with.contains("# gem \"jbuilder\""));
    assert!(commits(&accepted).iter().any(|s| s == "Uninstall jbuilder"));

    // Commented, not deleted: same shape as the declined manifest.
    let without = declined.read("Gemfile").expect("gemfile");
    assert_eq!(with.lines().count(), without.lines().count());
    for line in GEMFILE_SEED.lines() {
        assert!(
            with.lines().any(|l| l == line || l == format!("# {line}")),
            "seed line '{line}' missing from manifest"
        );
    }
}

#[test]
fn failing_tool_aborts_and_preserves_prior_commits() {
    let repo = TestRepo::new().expect("repo");
    // The conversion task is the only invocation containing "rake".
    let tools = ScriptedToolRunner::failing_on("rake");
    let prompter = ScriptedPrompter::new(&[]);

    let err = run_plan(repo.root(), &env(&tools, &prompter)).expect_err("run should abort");
    let marker = err.downcast_ref::<StepFailedError>().expect("typed marker");
    assert_eq!(marker.step, "erb2haml");

    let subjects = commits(&repo);
    assert_eq!(subjects.last().map(String::as_str), Some("Install hamlit-rails"));
    assert!(!subjects.iter().any(|s| s == "rake hamlit:erb2haml"));
}

#[test]
fn backports_step_runs_below_version_ceiling() {
    let repo = TestRepo::with_framework_version("6.0.3").expect("repo");
    let tools = ScriptedToolRunner::new();
    let prompter = ScriptedPrompter::always(false);

    run_plan(repo.root(), &env(&tools, &prompter)).expect("run");

    assert!(
        repo.root()
            .join("config/initializers/active_support_backports.rb")
            .exists()
    );
    assert!(
        commits(&repo)
            .iter()
            .any(|s| s == "Add backport of irb completion")
    );
}

#[test]
fn rerunning_the_full_plan_creates_no_new_commits() {
    let repo = TestRepo::new().expect("repo");
    let tools = ScriptedToolRunner::new();
    let prompter = ScriptedPrompter::always(true);

    run_plan(repo.root(), &env(&tools, &prompter)).expect("first run");
    let after_first = commits(&repo);

    let report = run_plan(repo.root(), &env(&tools, &prompter)).expect("second run");
    assert_eq!(commits(&repo), after_first);

    // Every step re-ran (or re-skipped); none produced a commit.
    for step in &report.steps {
        match &step.outcome {
            StepOutcome::Executed { commit } => assert_eq!(commit, &None, "step {}", step.name),
            StepOutcome::Skipped => {}
        }
    }
}
