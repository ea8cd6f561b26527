#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use taskrunner_core::{ExecutorError, JobRunner, TaskId, TimeoutPolicy};
    use taskrunner_local::{normalize_output, LocalProcessRunner, ProcessSpawner, RunningProcess};
    use tokio_util::sync::CancellationToken;

    /// What the fake process does once waited on.
    #[derive(Clone)]
    enum Script {
        Exit { code: i32, output: &'static str },
        Hang { output_so_far: &'static str },
        /// The shell exits but something it started keeps the pipes open.
        ExitHoldingPipes { code: i32, output_so_far: &'static str },
    }

    #[derive(Default)]
    struct Journal {
        argv: Vec<Vec<String>>,
        kills: usize,
    }

    struct FakeSpawner {
        script: Script,
        journal: Arc<Mutex<Journal>>,
        fail_spawn: bool,
    }

    impl FakeSpawner {
        fn new(script: Script) -> Self {
            Self {
                script,
                journal: Arc::new(Mutex::new(Journal::default())),
                fail_spawn: false,
            }
        }
    }

    struct FakeProcess {
        script: Script,
        journal: Arc<Mutex<Journal>>,
        killed: bool,
    }

    #[async_trait::async_trait]
    impl ProcessSpawner for FakeSpawner {
        async fn spawn(&self, argv: &[String]) -> io::Result<Box<dyn RunningProcess>> {
            if self.fail_spawn {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no shell"));
            }
            self.journal.lock().unwrap().argv.push(argv.to_vec());
            Ok(Box::new(FakeProcess {
                script: self.script.clone(),
                journal: Arc::clone(&self.journal),
                killed: false,
            }))
        }
    }

    #[async_trait::async_trait]
    impl RunningProcess for FakeProcess {
        async fn wait(&mut self) -> io::Result<i32> {
            match self.script {
                Script::Exit { code, .. } | Script::ExitHoldingPipes { code, .. } => Ok(code),
                Script::Hang { .. } => std::future::pending().await,
            }
        }

        async fn force_kill(&mut self) -> io::Result<()> {
            self.journal.lock().unwrap().kills += 1;
            self.killed = true;
            Ok(())
        }

        async fn read_all_output(&mut self) -> io::Result<String> {
            match self.script {
                Script::Exit { output, .. } => Ok(output.to_string()),
                Script::Hang { output_so_far } => Ok(output_so_far.to_string()),
                Script::ExitHoldingPipes { output_so_far, .. } if self.killed => {
                    Ok(output_so_far.to_string())
                }
                Script::ExitHoldingPipes { .. } => std::future::pending().await,
            }
        }
    }

    fn runner(spawner: FakeSpawner, timeout_ms: u64) -> LocalProcessRunner {
        LocalProcessRunner::with_spawner(Arc::new(spawner), Duration::from_millis(timeout_ms))
    }

    #[test]
    fn test_normalize_output() {
        assert_eq!(normalize_output("  hello\n", 0), "hello");
        assert_eq!(normalize_output("", 0), "");
        assert_eq!(normalize_output("", 3), "Process exited with code 3");
        assert_eq!(normalize_output("   \n", 1), "Process exited with code 1");
        assert_eq!(
            normalize_output("boom\n", 2),
            format!(
                "boom{}Process exited with code 2",
                if cfg!(windows) { "\r\n" } else { "\n" }
            )
        );
    }

    #[test]
    fn test_shell_argv_per_platform() {
        let unix = LocalProcessRunner::new(Duration::from_secs(1)).for_windows(false);
        assert_eq!(unix.shell_argv("echo hi"), vec!["sh", "-c", "echo hi"]);

        let windows = LocalProcessRunner::new(Duration::from_secs(1)).for_windows(true);
        assert_eq!(windows.shell_argv("echo hi"), vec!["cmd.exe", "/c", "echo hi"]);
    }

    #[tokio::test]
    async fn test_exit_is_captured_through_the_shell() {
        let spawner = FakeSpawner::new(Script::Exit { code: 0, output: "hello\n" });
        let journal = Arc::clone(&spawner.journal);
        let runner = runner(spawner, 1000).for_windows(false);

        let run = runner
            .run_and_capture(&TaskId::from("t1"), "echo hello", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(run.output(), "hello");
        assert!(run.end_time() >= run.start_time());
        let journal = journal.lock().unwrap();
        assert_eq!(journal.argv, vec![vec!["sh", "-c", "echo hello"]]);
        assert_eq!(journal.kills, 0);
    }

    #[tokio::test]
    async fn test_timeout_kills_and_fails_by_default() {
        let spawner = FakeSpawner::new(Script::Hang { output_so_far: "partial" });
        let journal = Arc::clone(&spawner.journal);
        let runner = runner(spawner, 50);

        let err = runner
            .run_and_capture(&TaskId::from("t1"), "sleep 10", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Timeout { .. }));
        assert_eq!(journal.lock().unwrap().kills, 1);
    }

    #[tokio::test]
    async fn test_timeout_with_partial_policy_keeps_output() {
        let spawner = FakeSpawner::new(Script::Hang { output_so_far: "step 1\n" });
        let journal = Arc::clone(&spawner.journal);
        let runner = LocalProcessRunner::with_spawner(Arc::new(spawner), Duration::from_secs(1))
            .with_timeout_policy(TimeoutPolicy::Partial);

        let run = runner
            .run_and_capture(&TaskId::from("t1"), "sleep 10", &CancellationToken::new())
            .await
            .unwrap();

        assert!(run.output().starts_with("step 1"));
        assert!(run.output().ends_with("Process timed out after 1 seconds"));
        assert_eq!(journal.lock().unwrap().kills, 1);
    }

    #[tokio::test]
    async fn test_open_pipes_after_exit_still_hit_the_deadline() {
        let spawner = FakeSpawner::new(Script::ExitHoldingPipes { code: 0, output_so_far: "" });
        let journal = Arc::clone(&spawner.journal);
        let runner = runner(spawner, 50);

        let err = tokio::time::timeout(
            Duration::from_secs(5),
            runner.run_and_capture(&TaskId::from("t1"), "daemon", &CancellationToken::new()),
        )
        .await
        .expect("runner returned within its deadline")
        .unwrap_err();

        assert!(matches!(err, ExecutorError::Timeout { .. }));
        assert_eq!(journal.lock().unwrap().kills, 1);
    }

    #[tokio::test]
    async fn test_open_pipes_with_partial_policy_keep_output() {
        let spawner = FakeSpawner::new(Script::ExitHoldingPipes {
            code: 0,
            output_so_far: "started\n",
        });
        let runner = LocalProcessRunner::with_spawner(Arc::new(spawner), Duration::from_secs(1))
            .with_timeout_policy(TimeoutPolicy::Partial);

        let run = runner
            .run_and_capture(&TaskId::from("t1"), "daemon", &CancellationToken::new())
            .await
            .unwrap();

        assert!(run.output().starts_with("started"));
        assert!(run.output().ends_with("Process timed out after 1 seconds"));
    }

    #[tokio::test]
    async fn test_cancellation_while_draining_pipes() {
        let spawner = FakeSpawner::new(Script::ExitHoldingPipes { code: 0, output_so_far: "" });
        let journal = Arc::clone(&spawner.journal);
        let runner = runner(spawner, 60_000);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = runner
            .run_and_capture(&TaskId::from("t1"), "daemon", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Interrupted));
        assert_eq!(journal.lock().unwrap().kills, 1);
    }

    #[tokio::test]
    async fn test_cancellation_kills_and_reports_interrupted() {
        let spawner = FakeSpawner::new(Script::Hang { output_so_far: "" });
        let journal = Arc::clone(&spawner.journal);
        let runner = runner(spawner, 60_000);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = runner
            .run_and_capture(&TaskId::from("t1"), "sleep 10", &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Interrupted));
        assert_eq!(journal.lock().unwrap().kills, 1);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_dispatch_error() {
        let mut spawner = FakeSpawner::new(Script::Exit { code: 0, output: "" });
        spawner.fail_spawn = true;

        let err = runner(spawner, 1000)
            .run_and_capture(&TaskId::from("t1"), "echo hi", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutorError::Dispatch(ref msg) if msg.contains("no shell")));
    }

    #[cfg(unix)]
    mod real_shell {
        use super::*;

        #[tokio::test]
        async fn test_echo_hello() {
            let runner = LocalProcessRunner::new(Duration::from_secs(5));
            let run = runner
                .run_and_capture(&TaskId::from("t1"), "echo hello", &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(run.output(), "hello");
            assert!(run.end_time() >= run.start_time());
        }

        #[tokio::test]
        async fn test_stderr_is_merged() {
            let runner = LocalProcessRunner::new(Duration::from_secs(5));
            let run = runner
                .run_and_capture(
                    &TaskId::from("t1"),
                    "ls /definitely-not-here-taskrunner",
                    &CancellationToken::new(),
                )
                .await
                .unwrap();

            assert!(run.output().contains("definitely-not-here-taskrunner"));
            assert!(run.output().lines().last().unwrap().starts_with("Process exited with code "));
        }

        #[tokio::test]
        async fn test_exit_code_without_output() {
            let runner = LocalProcessRunner::new(Duration::from_secs(5));
            let run = runner
                .run_and_capture(&TaskId::from("t1"), "exit 3", &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(run.output(), "Process exited with code 3");
        }

        #[tokio::test]
        async fn test_sleep_past_timeout() {
            let runner = LocalProcessRunner::new(Duration::from_secs(2));
            let started = std::time::Instant::now();
            let err = runner
                .run_and_capture(&TaskId::from("t1"), "sleep 10", &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(matches!(err, ExecutorError::Timeout { seconds: 2 }));
            assert!(started.elapsed() < Duration::from_secs(8));
        }

        #[cfg(target_os = "linux")]
        #[tokio::test]
        async fn test_detached_child_holding_pipes_times_out() {
            let runner = LocalProcessRunner::new(Duration::from_secs(2));
            let started = std::time::Instant::now();
            let err = runner
                .run_and_capture(&TaskId::from("t1"), "setsid -f sleep 6", &CancellationToken::new())
                .await
                .unwrap_err();

            assert!(matches!(err, ExecutorError::Timeout { seconds: 2 }));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
