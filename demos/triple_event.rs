//! Triple Event
//!
//! Detects the same event arriving three times in a row. States A..G track
//! the recent history of "0"/"1" events; D and G are reached on a third
//! consecutive "0" or "1" respectively.
//!
//! Key concepts:
//! - Entry callbacks attached to shared state handles
//! - First-match dispatch on (current state, event)
//! - Stop, start again, and restart from the persisted snapshot
//!
//! Run with: cargo run --example triple_event

use resumable_fsm::{
    init_logging, Event, FileStore, MachineError, SnapshotFormat, State, StateMachine,
};
use std::sync::Arc;

fn run(machine: &mut StateMachine<&'static str>, events: &[&Event]) -> Result<(), MachineError> {
    for event in events {
        machine.trigger_event(event, &"")?;
    }
    Ok(())
}

fn announced(name: &str) -> State<&'static str> {
    let state = State::new(name);
    let label = name.to_string();
    state.on_entry(move |_| {
        println!("{label}");
        Ok(())
    });
    state
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("warn");

    println!("=== Triple Event Example ===\n");

    let snapshot_dir = std::env::temp_dir().join("resumable-fsm-triple-event");
    let store = Arc::new(FileStore::new(&snapshot_dir, SnapshotFormat::Json)?);
    let mut machine = StateMachine::new("Triple Event", store);

    let [a, b, c, d, e, f, g] = ["A", "B", "C", "D", "E", "F", "G"].map(announced);
    for three_in_a_row in [&d, &g] {
        three_in_a_row.on_entry(|_| {
            println!("event triggered THREE TIMES IN A ROW!");
            Ok(())
        });
    }

    machine.add_initial_state(a.clone())?;
    for state in [&b, &c, &d, &e, &f, &g] {
        machine.add_state(state.clone())?;
    }

    let e0 = Event::new("0");
    let e1 = Event::new("1");
    machine.add_event(e0.clone());
    machine.add_event(e1.clone());

    let edges = [
        (&a, &b, &e0),
        (&a, &e, &e1),
        (&b, &c, &e0),
        (&b, &e, &e1),
        (&c, &d, &e0),
        (&c, &e, &e1),
        (&d, &e, &e1),
        (&e, &b, &e0),
        (&e, &f, &e1),
        (&f, &b, &e0),
        (&f, &g, &e1),
        (&g, &e, &e0),
    ];
    for (src, dst, evt) in edges {
        if machine.add_transition(src, dst, evt).is_none() {
            return Err(format!("could not add {} -> {} on {}", src, dst, evt).into());
        }
    }


    println!("-- start");
    machine.start(&"")?;
    run(&mut machine, &[&e0, &e1, &e0, &e0, &e0])?;
    machine.stop(&"")?;

    println!("-- start again");
    machine.start(&"")?;
    run(&mut machine, &[&e0, &e1])?;
    machine.stop(&"")?;

    println!("-- restart from snapshot");
    machine.restart(&"")?;
    run(&mut machine, &[&e1, &e1])?;

    if let Some(state) = machine.current_state() {
        println!("\nFinished in state {}", state);
    }
    println!("Path since restart: {}", machine.history().path().join(" -> "));

    println!("\n=== Example Complete ===");
    Ok(())
}
