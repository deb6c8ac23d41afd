use std::fs;
use std::path::Path;

use tempfile::TempDir;
use zenith::commands::*;
use zenith::models::Priority;
use zenith::repository::TaskRepository;
use zenith::storage::Store;

fn with_test_db<F>(f: F)
where
    F: FnOnce(&Store, &Path),
{
    let dir = TempDir::new().unwrap();
    let store = Store::open(dir.path());
    f(&store, dir.path());
}

fn load(store: &Store) -> TaskRepository {
    TaskRepository::open(store.clone(), 0)
}

#[test]
fn test_add_and_list() {
    with_test_db(|store, dir| {
        cmd_add(store, "  Test Task ".into(), Some("A".into()), Some("work, home, work".into()), None, true);

        let repo = load(store);
        assert_eq!(repo.tasks().len(), 1);
        let task = &repo.tasks()[0];
        assert_eq!(task.text, "Test Task");
        assert_eq!(task.priority, Priority::A);
        assert_eq!(task.tags.iter().collect::<Vec<_>>(), vec!["work", "home"]);
        assert_eq!(task.order, task.id);
        assert!(dir.join("tasks.json").exists());
        assert!(dir.join("allTags.json").exists());

        cmd_list(store, ListArgs::default());
    });
}

#[test]
fn test_add_rejects_invalid_input() {
    with_test_db(|store, _| {
        cmd_add(store, "   ".into(), None, None, None, true);
        cmd_add(store, "Bad priority".into(), Some("Z".into()), None, None, true);
        cmd_add(store, "Bad reminder".into(), None, None, Some("tomorrow".into()), true);
        assert!(load(store).tasks().is_empty());
    });
}

#[test]
fn test_toggle_task() {
    with_test_db(|store, _| {
        cmd_add(store, "Task to complete".into(), None, None, None, true);
        let id = load(store).tasks()[0].id;

        cmd_toggle(store, id, true);
        let repo = load(store);
        assert!(repo.tasks()[0].completed);
        assert!(repo.tasks()[0].completed_at.is_some());

        cmd_toggle(store, id, true);
        let repo = load(store);
        assert!(!repo.tasks()[0].completed);
        assert!(repo.tasks()[0].completed_at.is_none());
    });
}

#[test]
fn test_toggle_unknown_id_changes_nothing() {
    with_test_db(|store, dir| {
        cmd_toggle(store, 12345, true);
        assert!(!dir.join("tasks.json").exists());
    });
}

#[test]
fn test_edit_task() {
    with_test_db(|store, _| {
        cmd_add(store, "Draft".into(), None, Some("old".into()), None, true);
        let id = load(store).tasks()[0].id;

        cmd_edit(store, id, Some("Final".into()), Some("c".into()), Some("new".into()), None, false, true);

        let repo = load(store);
        let task = repo.get(id).unwrap();
        assert_eq!(task.text, "Final");
        assert_eq!(task.priority, Priority::C);
        assert_eq!(task.tags.iter().collect::<Vec<_>>(), vec!["new"]);
        assert_eq!(repo.tags().iter().collect::<Vec<_>>(), vec!["new"]);
    });
}

#[test]
fn test_remind_fires_once_until_rescheduled() {
    with_test_db(|store, _| {
        cmd_add(store, "Call bank".into(), None, None, Some("2000-01-01 09:00".into()), true);
        cmd_add(store, "No reminder".into(), None, None, None, true);
        let id = load(store).tasks()[0].id;

        assert_eq!(cmd_remind(store, true), 1);
        assert_eq!(cmd_remind(store, true), 0);
        assert!(load(store).get(id).unwrap().reminder_notified);

        cmd_edit(store, id, None, None, None, Some("2000-01-02".into()), false, true);
        assert!(!load(store).get(id).unwrap().reminder_notified);
        assert_eq!(cmd_remind(store, true), 1);

        cmd_edit(store, id, None, None, None, None, true, true);
        assert_eq!(load(store).get(id).unwrap().reminder_at, None);
    });
}

#[test]
fn test_remind_skips_completed_tasks() {
    with_test_db(|store, _| {
        cmd_add(store, "Done already".into(), None, None, Some("2000-01-01".into()), true);
        let id = load(store).tasks()[0].id;
        cmd_toggle(store, id, true);
        assert_eq!(cmd_remind(store, true), 0);
    });
}

#[test]
fn test_remove_prunes_tags() {
    with_test_db(|store, _| {
        cmd_add(store, "One".into(), None, Some("shared, only-one".into()), None, true);
        cmd_add(store, "Two".into(), None, Some("shared".into()), None, true);
        let id = load(store).tasks()[0].id;

        cmd_remove(store, id, true, true);

        let repo = load(store);
        assert_eq!(repo.tasks().len(), 1);
        assert_eq!(repo.tags().iter().collect::<Vec<_>>(), vec!["shared"]);
    });
}

#[test]
fn test_move_task() {
    with_test_db(|store, _| {
        for text in ["a", "b", "c"] {
            cmd_add(store, text.into(), None, None, None, true);
        }
        let ids: Vec<i64> = load(store).tasks().iter().map(|t| t.id).collect();

        cmd_move(store, ids[2], ids[0], true);

        let repo = load(store);
        let mut ordered: Vec<(&str, i64)> = repo.tasks().iter().map(|t| (t.text.as_str(), t.order)).collect();
        ordered.sort_by_key(|(_, order)| *order);
        assert_eq!(ordered, vec![("c", 0), ("a", 1), ("b", 2)]);
    });
}

#[test]
fn test_legacy_file_is_migrated_on_load() {
    with_test_db(|store, dir| {
        fs::write(
            dir.join("tasks.json"),
            r#"[{"id": 5, "text": "Old task"}, null, "junk", {"text": "", "priority": "X", "tags": "a"}]"#,
        )
        .unwrap();

        let repo = TaskRepository::open(store.clone(), 99);
        assert_eq!(repo.tasks().len(), 2);
        assert_eq!(repo.tasks()[0].text, "Old task");
        assert_eq!(repo.tasks()[0].order, 5);
        assert_eq!(repo.tasks()[1].id, 99);
        assert_eq!(repo.tasks()[1].text, "Untitled Task");
        assert_eq!(repo.tasks()[1].priority, Priority::B);
    });
}

#[test]
fn test_list_args_validation() {
    let bad_sort = ListArgs { sort: Some("random".into()), ..Default::default() };
    assert!(bad_sort.into_options().is_err());

    let ok = ListArgs {
        priority: Some("high".into()),
        tag: Some(" work ".into()),
        sort: Some("due-date".into()),
        desc: true,
        ..Default::default()
    };
    let options = ok.into_options().unwrap();
    assert_eq!(options.priority, Some(Priority::A));
    assert_eq!(options.tag.as_deref(), Some("work"));
}

#[test]
fn test_parse_reminder_formats() {
    let with_time = parse_reminder("2025-03-04 14:30").unwrap();
    let date_only = parse_reminder("2025-03-04").unwrap();
    assert_eq!(with_time - date_only, (5 * 60 + 30) * 60 * 1000);
    assert!(parse_reminder("04/03/2025").is_err());
}
