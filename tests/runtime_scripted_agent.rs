// tests/runtime_scripted_agent.rs
//
// Drives the full runtime against a scripted agent with Tokio's clock
// paused, so the 5s/12s delays elapse instantly but deterministically.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use agentexec::config::RunConfig;
use agentexec::console::CapturedConsole;
use agentexec::engine::{RunEvent, RunSummary, Runtime};
use agentexec::fs::mock::MockFileSystem;
use agentexec::report::MarkerStatus;
use agentexec::exit_codes;
use agentexec_test_utils::{init_tracing, RunConfigBuilder, ScriptedAgent};

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    fs: MockFileSystem,
    console: CapturedConsole,
    config: RunConfig,
}

impl Harness {
    fn new(config: RunConfig) -> Self {
        init_tracing();
        Self {
            fs: MockFileSystem::new(),
            console: CapturedConsole::new(),
            config,
        }
    }

    fn default_config() -> Self {
        Self::new(RunConfigBuilder::new("file watcher summons you").build())
    }

    async fn run(&self, agent: ScriptedAgent) -> Result<RunSummary, Box<dyn Error>> {
        let runtime = Runtime::new(
            &self.config,
            agent,
            Arc::new(self.fs.clone()),
            Box::new(self.console.clone()),
        );
        Ok(runtime.run().await?)
    }

    fn saved_log(&self) -> Option<String> {
        self.fs.file_contents(&self.config.files.output)
    }
}

#[tokio::test(start_paused = true)]
async fn message_is_sent_after_warmup_and_output_saved_after_response_window() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new()
        .on_launch(100, RunEvent::stdout("Welcome\n"))
        .on_line(500, RunEvent::stdout("Working on it\n"))
        .on_line(600, RunEvent::stderr("rate limited\n"));
    let probe = agent.probe();

    let started = Instant::now();
    let summary = h.run(agent).await?;
    let elapsed = started.elapsed();

    assert_eq!(summary.exit_code, exit_codes::OK);

    let received = probe.received();
    assert_eq!(received.len(), 1, "message must be sent exactly once");
    assert_eq!(received[0].text, "file watcher summons you\n");
    assert!(received[0].after_launch >= Duration::from_millis(5000));
    assert!(received[0].after_launch < Duration::from_millis(5100));

    assert!(elapsed >= Duration::from_millis(17000));
    assert!(elapsed < Duration::from_millis(17100));

    assert!(summary.log_saved);
    assert_eq!(
        h.saved_log().as_deref(),
        Some("Welcome\nWorking on it\n[STDERR] rate limited\n")
    );
    assert!(probe.was_shut_down());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn agent_output_is_mirrored_to_matching_streams() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new()
        .on_launch(10, RunEvent::stdout("hello from agent\n"))
        .on_launch(20, RunEvent::stderr("warning from agent\n"));

    h.run(agent).await?;

    let out = h.console.stdout_text();
    let err = h.console.stderr_text();
    assert!(out.contains("hello from agent\n"));
    assert!(err.contains("warning from agent\n"));
    assert!(!err.contains("[STDERR]"), "mirror must not carry the log tag");
    assert!(out.contains("[*] Starting agent with initial message..."));
    assert!(out.contains("[*] Sending initial message..."));
    assert!(out.contains("[+] Message sent!"));
    assert!(out.contains("[*] Waiting 12 seconds for agent response..."));
    assert!(out.contains("[+] Terminal output saved to terminal_output.txt"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn marker_found_reports_content_and_exits_zero() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new().create_marker_on_line(
        &h.fs,
        h.config.files.marker.clone(),
        "done",
    );

    let summary = h.run(agent).await?;

    assert_eq!(summary.exit_code, exit_codes::OK);
    let report = summary.report.expect("report must be produced");
    assert_eq!(
        report.marker,
        MarkerStatus::Found {
            content: "done".to_string()
        }
    );

    let out = h.console.stdout_text();
    assert!(out.contains("[SUCCESS] Agent created success.txt!"));
    assert!(out.contains("Content: done"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn missing_marker_is_reported_but_still_exits_zero() -> TestResult {
    let h = Harness::default_config();

    let summary = h.run(ScriptedAgent::new()).await?;

    assert_eq!(summary.exit_code, exit_codes::OK);
    assert_eq!(
        summary.report.map(|r| r.marker),
        Some(MarkerStatus::Missing)
    );
    let out = h.console.stdout_text();
    assert!(out.contains("[FAILED] No success.txt found"));
    assert!(out.contains("[i] Check terminal_output.txt to see what happened"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn strict_mode_reports_missing_marker_through_exit_code() -> TestResult {
    let h = Harness::new(RunConfigBuilder::new("go").strict().build());

    let summary = h.run(ScriptedAgent::new()).await?;

    assert_eq!(summary.exit_code, exit_codes::MARKER_MISSING);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn strict_mode_with_marker_exits_zero() -> TestResult {
    let h = Harness::new(RunConfigBuilder::new("go").strict().build());
    let agent =
        ScriptedAgent::new().create_marker_on_line(&h.fs, h.config.files.marker.clone(), "ok");

    let summary = h.run(agent).await?;

    assert_eq!(summary.exit_code, exit_codes::OK);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn agent_exiting_before_warmup_short_circuits_with_its_code() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new()
        .on_launch(1000, RunEvent::stdout("fatal: not logged in\n"))
        .on_launch(2000, RunEvent::AgentExited { code: Some(42) });
    let probe = agent.probe();

    let started = Instant::now();
    let summary = h.run(agent).await?;

    assert_eq!(summary.exit_code, 42);
    assert!(started.elapsed() < Duration::from_millis(5000));
    assert!(probe.received().is_empty(), "message must never be sent");
    assert!(h
        .console
        .stdout_text()
        .contains("[i] Agent exited with code 42"));

    // The output is kept for diagnosis even though the run was cut short.
    assert_eq!(h.saved_log().as_deref(), Some("fatal: not logged in\n"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn agent_exiting_during_response_window_uses_its_code() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new()
        .create_marker_on_line(&h.fs, h.config.files.marker.clone(), "done")
        .on_line(1000, RunEvent::AgentExited { code: Some(0) });
    let probe = agent.probe();

    let started = Instant::now();
    let summary = h.run(agent).await?;
    let elapsed = started.elapsed();

    assert_eq!(summary.exit_code, 0);
    assert_eq!(probe.received().len(), 1);
    assert!(elapsed >= Duration::from_millis(6000));
    assert!(elapsed < Duration::from_millis(17000));
    assert!(summary.report.is_some_and(|r| r.succeeded()));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn spawn_failure_exits_one_without_saving_or_waiting() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new().fail_spawn("No such file or directory");
    let probe = agent.probe();

    let started = Instant::now();
    let summary = h.run(agent).await?;

    assert_eq!(summary.exit_code, exit_codes::FAILURE);
    assert!(started.elapsed() < Duration::from_millis(5000));
    assert!(!probe.was_launched());
    assert!(!summary.log_saved);
    assert!(summary.report.is_none());
    assert!(h.saved_log().is_none());
    assert!(h
        .console
        .stderr_text()
        .contains("[X] Error spawning agent:"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn ready_pattern_sends_message_before_warmup() -> TestResult {
    let h = Harness::new(
        RunConfigBuilder::new("hello")
            .ready_pattern(r"> $")
            .build(),
    );
    let agent = ScriptedAgent::new()
        .on_launch(300, RunEvent::stdout("Loading model...\n"))
        .on_launch(1200, RunEvent::stdout("> "));
    let probe = agent.probe();

    let started = Instant::now();
    h.run(agent).await?;

    let received = probe.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].after_launch, Duration::from_millis(1200));
    // Response window is measured from the send, not from start.
    assert!(started.elapsed() >= Duration::from_millis(13200));
    assert!(started.elapsed() < Duration::from_millis(17000));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn custom_delays_are_honoured() -> TestResult {
    let h = Harness::new(
        RunConfigBuilder::new("hello")
            .warmup("250ms")
            .response_wait("2s")
            .build(),
    );
    let agent = ScriptedAgent::new();
    let probe = agent.probe();

    let started = Instant::now();
    h.run(agent).await?;

    assert_eq!(probe.received()[0].after_launch, Duration::from_millis(250));
    assert!(started.elapsed() >= Duration::from_millis(2250));
    assert!(h
        .console
        .stdout_text()
        .contains("[*] Waiting 2 seconds for agent response..."));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_stdin_is_reported_and_run_continues() -> TestResult {
    let h = Harness::default_config();

    let summary = h.run(ScriptedAgent::new().reject_stdin()).await?;

    assert_eq!(summary.exit_code, exit_codes::OK);
    assert!(summary.log_saved);
    assert!(h
        .console
        .stderr_text()
        .contains("[!] Failed to send message"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_log_write_still_checks_marker() -> TestResult {
    let h = Harness::default_config();
    h.fs.set_read_only(true);

    let summary = h.run(ScriptedAgent::new()).await?;

    assert_eq!(summary.exit_code, exit_codes::OK);
    assert!(!summary.log_saved);
    assert!(summary.report.is_some());
    assert!(h
        .console
        .stderr_text()
        .contains("[X] Failed to save terminal_output.txt"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn previous_output_file_is_overwritten() -> TestResult {
    let h = Harness::default_config();
    h.fs.add_file(&h.config.files.output, "stale output from last run");

    h.run(ScriptedAgent::new().on_launch(1, RunEvent::stdout("fresh")))
        .await?;

    assert_eq!(h.saved_log().as_deref(), Some("fresh"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn interrupt_saves_output_and_exits_130() -> TestResult {
    let h = Harness::default_config();
    let agent = ScriptedAgent::new().on_launch(500, RunEvent::stdout("thinking"));
    let probe = agent.probe();

    let runtime = Runtime::new(
        &h.config,
        agent,
        Arc::new(h.fs.clone()),
        Box::new(h.console.clone()),
    );
    let tx = runtime.event_sender();
    let handle = tokio::spawn(runtime.run());

    tokio::time::sleep(Duration::from_millis(3000)).await;
    tx.send(RunEvent::Interrupted).await?;

    let summary = handle.await??;
    assert_eq!(summary.exit_code, exit_codes::INTERRUPTED);
    assert!(probe.received().is_empty());
    assert!(probe.was_shut_down());
    assert_eq!(h.saved_log().as_deref(), Some("thinking"));
    Ok(())
}
