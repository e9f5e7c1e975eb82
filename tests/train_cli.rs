use clap::Parser;
use minitree::{
    TrainingSummary,
    cli::commands::{
        duel::{DuelArgs, run as duel},
        train::{TrainArgs, execute as train},
    },
};
use tempfile::tempdir;

#[test]
fn train_writes_a_loadable_summary() {
    let tmp = tempdir().unwrap();
    let summary = tmp.path().join("summary.json");

    let args = TrainArgs::parse_from([
        "minitree-train",
        "--games",
        "30",
        "--stones",
        "7",
        "--seed",
        "3",
        "--opponent",
        "greedy",
        "--progress",
        "false",
        "--summary",
        summary.to_str().unwrap(),
    ]);
    train(args).expect("training should succeed");

    let loaded = TrainingSummary::load(&summary).unwrap();
    assert_eq!(loaded.games, 30);
    assert_eq!(loaded.learner, "exploring");
    assert!(loaded.tree.nodes > 1);
}

#[test]
fn train_seeds_from_records_and_renders() {
    let tmp = tempdir().unwrap();
    let records = tmp.path().join("games.csv");
    std::fs::write(&records, "3,3,1\n1,2,3,1\n").unwrap();
    let config = tmp.path().join("minitree.toml");
    std::fs::write(&config, "[game]\nstones = 7\nmax_take = 3\n").unwrap();
    let summary = tmp.path().join("seeded.json");

    let args = TrainArgs::parse_from([
        "minitree-train",
        "--config",
        config.to_str().unwrap(),
        "--games",
        "10",
        "--records",
        records.to_str().unwrap(),
        "--render-depth",
        "1",
        "--progress",
        "false",
        "--summary",
        summary.to_str().unwrap(),
    ]);
    train(args).expect("training from records should succeed");

    // Both recorded games end on the last stone, so they are tallied too.
    let loaded = TrainingSummary::load(&summary).unwrap();
    assert_eq!(loaded.games, 10);
    assert_eq!(loaded.tree.root_visits, 12);
    assert!(loaded.tree.terminal_nodes >= 2);
}

#[test]
fn train_rejects_an_illegal_record() {
    let tmp = tempdir().unwrap();
    let records = tmp.path().join("games.csv");
    std::fs::write(&records, "5\n").unwrap();

    let args = TrainArgs::parse_from([
        "minitree-train",
        "--games",
        "1",
        "--records",
        records.to_str().unwrap(),
        "--progress",
        "false",
    ]);
    assert!(train(args).is_err());
}

#[test]
fn parallel_training_plays_exactly_the_requested_games() {
    let tmp = tempdir().unwrap();
    let summary = tmp.path().join("parallel.json");

    let args = TrainArgs::parse_from([
        "minitree-train",
        "--games",
        "10",
        "--workers",
        "3",
        "--stones",
        "9",
        "--seed",
        "8",
        "--summary",
        summary.to_str().unwrap(),
    ]);
    train(args).expect("parallel training should succeed");

    let loaded = TrainingSummary::load(&summary).unwrap();
    assert_eq!(loaded.games, 10);
    assert_eq!(loaded.wins + loaded.draws + loaded.losses, 10);
    assert_eq!(loaded.tree.root_visits, 10);
}

#[test]
fn parallel_training_follows_the_configured_schedule_and_history() {
    let tmp = tempdir().unwrap();
    let config = tmp.path().join("minitree.toml");
    std::fs::write(
        &config,
        "[session]\nhistory_interval = 5\n\n[session.rate_schedule]\nstart = 1.0\nend = 0.0\nramp_games = 10\n",
    )
    .unwrap();
    let summary = tmp.path().join("scheduled.json");

    let args = TrainArgs::parse_from([
        "minitree-train",
        "--config",
        config.to_str().unwrap(),
        "--games",
        "20",
        "--workers",
        "2",
        "--stones",
        "6",
        "--seed",
        "2",
        "--summary",
        summary.to_str().unwrap(),
    ]);
    train(args).expect("scheduled parallel training should succeed");

    let loaded = TrainingSummary::load(&summary).unwrap();
    assert_eq!(loaded.games, 20);
    assert_eq!(loaded.win_rate_history.len(), 4);
    // The ramp ends at zero and the default floor applies after the last decay.
    assert_eq!(loaded.final_exploration_rate, 0.05);
}

#[test]
fn duel_between_two_learners_tallies_each_game_once() {
    let args = DuelArgs::parse_from([
        "minitree-duel",
        "greedy",
        "exploring",
        "--games",
        "20",
        "--stones",
        "8",
        "--depth",
        "2",
        "--seed",
        "1",
        "--progress",
        "false",
    ]);
    let report = duel(&args).expect("duel should succeed");
    assert_eq!(report.first, "greedy-d2");
    assert_eq!(report.results.games(), 20);

    let args = DuelArgs::parse_from([
        "minitree-duel",
        "exploring",
        "exploring",
        "--games",
        "15",
        "--stones",
        "6",
        "--seed",
        "4",
        "--progress",
        "false",
    ]);
    let report = duel(&args).expect("self-play duel should succeed");
    assert_eq!(report.results.games(), 15);
    assert_eq!(report.tree.root_visits, 15);
}
