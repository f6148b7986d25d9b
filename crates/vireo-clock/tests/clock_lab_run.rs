#![forbid(unsafe_code)]

//! Drives the clock binary's run loop on a lab scheduler.

use std::rc::Rc;

use clap::Parser;
use vireo_clock::{Cli, WallClock, run_on};
use vireo_core::{LabClock, MemoryTarget, Scheduler};

// 2024-03-09T13:45:30Z
const BASE: i64 = 1_709_991_930_000;

fn lab_wall_clock(lab: &LabClock) -> WallClock {
    let lab = lab.clone();
    Rc::new(move || BASE + lab.elapsed().as_millis() as i64)
}

fn seconds_label(html: &str) -> Option<&str> {
    let start = html.find("S: ")? + 3;
    let end = html[start..].find('<')? + start;
    Some(&html[start..end])
}

#[test]
fn one_publish_per_tick_plus_initial() {
    let (scheduler, lab) = Scheduler::lab();
    let target = Rc::new(MemoryTarget::new());
    let cli = Cli::parse_from(["vireo-clock", "--ticks", "3"]);

    let publishes = run_on(&cli, &scheduler, target.clone(), lab_wall_clock(&lab)).expect("run");

    assert_eq!(publishes, 4);
    let seconds: Vec<String> = target
        .history()
        .iter()
        .filter_map(|html| seconds_label(html).map(str::to_owned))
        .collect();
    assert_eq!(seconds, vec!["30", "31", "32", "33"]);
}

#[test]
fn custom_selector_and_tick() {
    let (scheduler, lab) = Scheduler::lab();
    let target = Rc::new(MemoryTarget::new());
    let cli = Cli::parse_from([
        "vireo-clock",
        "--selector",
        "#cat",
        "--tick-ms",
        "500",
        "--ticks",
        "4",
    ]);

    let publishes = run_on(&cli, &scheduler, target.clone(), lab_wall_clock(&lab)).expect("run");

    // Four half-second ticks move the seconds hand twice.
    assert_eq!(publishes, 5);
    assert_eq!(lab.elapsed().as_millis(), 2000);
    let last = target.content().expect("published");
    assert_eq!(seconds_label(&last), Some("32"));
    assert!(last.contains("rotateZ(192deg)"));
}

#[test]
fn zero_tick_is_an_argument_error() {
    let (scheduler, lab) = Scheduler::lab();
    let target = Rc::new(MemoryTarget::new());
    let cli = Cli::parse_from(["vireo-clock", "--tick-ms", "0", "--ticks", "1"]);

    let err = run_on(&cli, &scheduler, target.clone(), lab_wall_clock(&lab)).expect_err("zero");
    assert_eq!(err.exit_code(), 2);
    assert_eq!(target.replacements(), 0);
}
