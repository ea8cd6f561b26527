use taskrunner_core::Config;

const SAMPLE_CONFIG: &str = r#"# taskrunner configuration

runner:
  # pod: run each task as a Kubernetes pod; local: run as a child process
  mode: pod
  timeout_seconds: 60
  namespace: default
  image: busybox:latest
  kubectl_path: kubectl
  poll_interval_ms: 1000
  # fail | partial. Unset keeps each runner's default
  # (local fails on timeout, pod returns the logs it has).
  # on_timeout: fail

store:
  # file: one JSON file per task; memory: nothing persists between runs
  kind: file
  # path: /var/lib/taskrunner/tasks
"#;

pub async fn run(path: bool, init: bool) -> anyhow::Result<()> {
    if path {
        println!("{}", Config::default_path().display());
        return Ok(());
    }

    if init {
        let config_path = Config::default_path();
        if config_path.exists() {
            println!("Config already exists at: {}", config_path.display());
            println!("Remove it first if you want to reinitialize.");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, SAMPLE_CONFIG)?;
        println!("Sample config written to: {}", config_path.display());
        return Ok(());
    }

    let config_path = Config::default_path();
    println!("Config path: {}", config_path.display());
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else {
        println!("Status:      not found, using defaults");
        println!("Run `taskrunner config --init` to create one.");
        Config::default()
    };

    println!("Runner:      {}", config.runner.mode);
    println!("Timeout:     {}s", config.runner.timeout_seconds);
    if let Some(policy) = config.runner.on_timeout {
        println!("On timeout:  {}", policy);
    }
    if config.runner.mode == taskrunner_core::config::RunnerMode::Pod {
        println!("Namespace:   {}", config.runner.namespace);
        println!("Image:       {}", config.runner.image);
    }
    match config.store.kind {
        taskrunner_core::config::StoreKind::File => {
            println!("Store:       {}", config.store.resolved_path().display())
        }
        taskrunner_core::config::StoreKind::Memory => println!("Store:       in-memory"),
    }

    Ok(())
}
