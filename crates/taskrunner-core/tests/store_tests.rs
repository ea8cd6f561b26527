#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use taskrunner_core::{JsonDirTaskStore, MemoryTaskStore, Task, TaskExecution, TaskId, TaskStore};

    fn sample_task() -> Task {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut task = Task::new("Nightly Report", "echo report").with_owner("ops");
        task.record(TaskExecution::new(start, start + Duration::milliseconds(1500), "done"));
        task
    }

    #[tokio::test]
    async fn test_dir_store_round_trips_across_instances() {
        let tmp = tempfile::tempdir().unwrap();
        let task = sample_task();

        JsonDirTaskStore::open(tmp.path())
            .unwrap()
            .save(task.clone())
            .await
            .unwrap();

        let reopened = JsonDirTaskStore::open(tmp.path()).unwrap();
        let loaded = reopened.find_by_id(&task.id).await.unwrap().unwrap();
        assert_eq!(loaded, task);
    }

    #[tokio::test]
    async fn test_dir_store_missing_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirTaskStore::open(tmp.path()).unwrap();

        assert!(store.find_by_id(&TaskId::from("ghost")).await.unwrap().is_none());
        store.delete_by_id(&TaskId::from("ghost")).await.unwrap();

        let task = store.save(sample_task()).await.unwrap();
        store.delete_by_id(&task.id).await.unwrap();
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dir_store_handles_awkward_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirTaskStore::open(tmp.path()).unwrap();

        let mut task = sample_task();
        task.id = TaskId::from("../team/a b");
        store.save(task.clone()).await.unwrap();

        assert_eq!(store.find_by_id(&task.id).await.unwrap(), Some(task));
        // Nothing escaped the store directory.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_dir_store_skips_corrupt_files_when_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = JsonDirTaskStore::open(tmp.path()).unwrap();
        store.save(sample_task()).await.unwrap();
        std::fs::write(tmp.path().join("broken.json"), "{ not json").unwrap();

        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_dir_store_concurrent_saves_of_one_task() {
        let tmp = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonDirTaskStore::open(tmp.path()).unwrap());
        let base = sample_task();

        for round in 0..20 {
            let saves: Vec<_> = (0..4)
                .map(|writer| {
                    let store = std::sync::Arc::clone(&store);
                    let mut task = base.clone();
                    task.name = format!("round {} writer {}", round, writer);
                    tokio::spawn(async move { store.save(task).await })
                })
                .collect();

            for save in saves {
                save.await.unwrap().unwrap();
            }

            let stored = store.find_by_id(&base.id).await.unwrap().unwrap();
            assert!(stored.name.starts_with(&format!("round {} writer ", round)));
        }

        // Only the task file is left behind.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let store = MemoryTaskStore::new();
        store.save(Task::new("Nightly Report", "echo a")).await.unwrap();
        store.save(Task::new("weekly report", "echo b")).await.unwrap();
        store.save(Task::new("cleanup", "echo c")).await.unwrap();

        let hits = store.find_by_name_containing_ignore_case("REPORT").await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(store
            .find_by_name_containing_ignore_case("nothing")
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_wire_format_field_names() {
        let task = sample_task();
        let json = serde_json::to_value(&task).unwrap();

        assert_eq!(json["name"], "Nightly Report");
        assert_eq!(json["owner"], "ops");
        let run = &json["taskExecutions"][0];
        assert_eq!(run["startTime"], "2024-05-01T12:00:00.000Z");
        assert_eq!(run["endTime"], "2024-05-01T12:00:01.500Z");
        assert_eq!(run["output"], "done");
    }

    #[test]
    fn test_execution_end_never_precedes_start() {
        let start = Utc::now();
        let run = TaskExecution::new(start, start - Duration::seconds(5), "");
        assert_eq!(run.end_time(), start);
    }

    #[test]
    fn test_loaded_execution_end_never_precedes_start() {
        let json = r#"{
            "startTime": "2024-05-01T12:00:05.000Z",
            "endTime": "2024-05-01T12:00:00.000Z",
            "output": "skewed"
        }"#;

        let run: TaskExecution = serde_json::from_str(json).unwrap();
        assert_eq!(run.end_time(), run.start_time());
        assert_eq!(run.duration(), Duration::zero());
        assert_eq!(run.output(), "skewed");
    }
}
