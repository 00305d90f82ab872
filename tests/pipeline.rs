use seashell::executor::Outcome;
use seashell::{Executor, ExitSignal, parse};
use std::fs;

const SEARCH_PATH: &str = "/usr/bin:/bin";

#[test]
fn three_stage_pipeline_with_file_ends() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("words.txt");
    let output = tmp.path().join("counted.txt");
    fs::write(&input, "pear\napple\npear\nfig\n").unwrap();

    let line = format!(
        "sort < {} | uniq -c | wc -l > {}",
        input.display(),
        output.display()
    );
    let pipeline = parse(&line);
    assert_eq!(pipeline.len(), 3);

    let mut executor = Executor::with_search_path(SEARCH_PATH);
    match executor.run(&pipeline).unwrap() {
        Outcome::Finished(status) => assert!(status.success()),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(fs::read_to_string(&output).unwrap().trim(), "3");
}

#[test]
fn failures_do_not_stop_the_shell() {
    let tmp = tempfile::tempdir().unwrap();
    let mut executor = Executor::with_search_path(SEARCH_PATH);

    for line in [
        "definitely-not-a-program-xyz",
        "cat < /nonexistent/seashell/input",
        "echo hi >",
        "echo dangling |",
    ] {
        assert_eq!(executor.execute(parse(line)), ExitSignal::Continue);
    }

    let out = tmp.path().join("after.txt");
    let line = format!("echo still here > {}", out.display());
    assert_eq!(executor.execute(parse(&line)), ExitSignal::Continue);
    assert_eq!(fs::read_to_string(&out).unwrap(), "still here\n");
}

#[test]
fn exit_is_recognised_after_trimming() {
    let mut executor = Executor::with_search_path(SEARCH_PATH);
    assert_eq!(executor.execute(parse("  exit  ")), ExitSignal::ShellExit);
}

#[test]
fn background_pipeline_is_reaped_later() {
    let mut executor = Executor::with_search_path(SEARCH_PATH);
    match executor.run(&parse("sleep 0.1 &")).unwrap() {
        Outcome::Detached(count) => assert_eq!(count, 1),
        other => panic!("unexpected outcome {:?}", other),
    }
    assert_eq!(executor.pending_jobs(), 1);

    std::thread::sleep(std::time::Duration::from_millis(400));
    assert_eq!(executor.reap_background(), 1);
    assert_eq!(executor.pending_jobs(), 0);
}
