//! Property tests for the session timer's structural invariants.

use std::rc::Rc;

use proptest::prelude::*;
use respira_core::storage::SessionConfig;
use respira_core::timer::{reconcile, PhaseCursor, ResyncPolicy};
use respira_core::{ManualClock, Phase, Program, SessionTimer, TimerState};

#[derive(Debug, Clone)]
enum Op {
    Tick(u8),
    Start,
    Pause,
    Reset,
    Background(u16),
}

fn program_strategy() -> impl Strategy<Value = Program> {
    (1u32..15, 0u32..10, 1u32..15, 1u32..6).prop_map(|(inhale, pause, exhale, cycles)| {
        Program::custom("prop", inhale, pause, exhale, cycles).unwrap()
    })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (1u8..40).prop_map(Op::Tick),
        2 => Just(Op::Start),
        1 => Just(Op::Pause),
        1 => Just(Op::Reset),
        1 => (0u16..300).prop_map(Op::Background),
    ]
}

fn policy_strategy() -> impl Strategy<Value = ResyncPolicy> {
    prop_oneof![Just(ResyncPolicy::Cascade), Just(ResyncPolicy::SingleStep)]
}

fn check(timer: &SessionTimer, program: &Program) -> Result<(), TestCaseError> {
    let cycle = timer.current_cycle();
    prop_assert!(cycle >= 1 && cycle <= program.cycle_count, "cycle {cycle} out of range");
    prop_assert!(timer.time_remaining_secs() <= program.phase_duration(timer.phase()));
    if program.pause_seconds == 0 {
        prop_assert_ne!(timer.phase(), Phase::Pause);
    }
    let progress = timer.session_progress();
    prop_assert!((0.0..=1.0).contains(&progress));
    if timer.state() == TimerState::Idle {
        prop_assert_eq!(timer.phase(), Phase::Inhale);
        prop_assert_eq!(timer.current_cycle(), 1);
        prop_assert_eq!(timer.time_remaining_secs(), program.inhale_seconds);
    }
    Ok(())
}

proptest! {
    #[test]
    fn invariants_hold_under_any_command_sequence(
        program in program_strategy(),
        policy in policy_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..60),
    ) {
        let clock = ManualClock::default();
        let config = SessionConfig { resync: policy, ..SessionConfig::default() };
        let mut timer = SessionTimer::new(Rc::new(clock.clone()), config);
        let rx = timer.subscribe();
        timer.set_program(program.clone());
        check(&timer, &program)?;

        for op in ops {
            match op {
                Op::Tick(n) => {
                    for _ in 0..n {
                        clock.advance_secs(1);
                        timer.tick();
                    }
                }
                Op::Start => { timer.start(); }
                Op::Pause => { timer.pause(); }
                Op::Reset => { timer.reset(); }
                Op::Background(secs) => {
                    timer.suspend();
                    clock.advance_secs(i64::from(secs));
                    timer.resume();
                }
            }
            check(&timer, &program)?;
        }

        // resets never record, so every record is a full completion
        for event in rx.try_iter() {
            if let Some(record) = event.record() {
                prop_assert_eq!(record.completed_cycles, program.cycle_count);
                prop_assert!(record.end_time >= record.start_time);
            }
        }
    }

    #[test]
    fn cascade_resync_matches_ticking(program in program_strategy(), secs in 0u64..200) {
        let clock = ManualClock::default();
        let mut timer = SessionTimer::new(Rc::new(clock.clone()), SessionConfig::default());
        timer.set_program(program.clone());
        timer.start();

        let outcome = reconcile(&program, PhaseCursor::start(&program), secs, ResyncPolicy::Cascade);
        // stop at completion, before the cooldown hands back to Idle
        for _ in 0..secs.min(program.total_duration()) {
            clock.advance_secs(1);
            timer.tick();
        }

        if secs >= program.total_duration() {
            prop_assert_eq!(outcome.finished_after_secs, Some(program.total_duration()));
            prop_assert_eq!(timer.state(), TimerState::Completed);
        } else {
            prop_assert!(outcome.finished_after_secs.is_none());
            prop_assert_eq!(timer.phase(), outcome.cursor.phase);
            prop_assert_eq!(timer.current_cycle(), outcome.cursor.cycle);
            prop_assert_eq!(timer.time_remaining_secs(), outcome.cursor.remaining_secs);
        }
    }
}
