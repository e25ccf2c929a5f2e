use std::sync::Arc;

use serde_json::json;

use super::*;
use crate::host::{SelfSwitchStore, SwitchStore, VariableStore};
use crate::memory::MemoryHost;

fn cmd(code: i32, indent: usize, parameters: serde_json::Value) -> EventCommand {
    EventCommand {
        code,
        indent,
        parameters: serde_json::from_value(parameters).expect("parameters should parse"),
    }
}

fn list(commands: Vec<EventCommand>) -> CommandList {
    Arc::new(commands)
}

fn started(commands: Vec<EventCommand>, host: &MemoryHost) -> Interpreter {
    let mut interpreter = Interpreter::new();
    interpreter.setup(list(commands), 0, host.current_map_id);
    interpreter
}

fn run_to_end(interpreter: &mut Interpreter, host: &mut MemoryHost, max_frames: u32) {
    for _ in 0..max_frames {
        if !interpreter.is_running() {
            return;
        }
        interpreter.update(host).expect("update should pass");
        host.advance_frame();
    }
    panic!("stream did not finish within {max_frames} frames");
}

#[test]
fn straight_line_stream_runs_in_one_tick() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 9])),
            cmd(codes::CONTROL_SWITCHES, 0, json!([2, 2, 0])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
    assert_eq!(host.variables.value(1), 9);
    assert!(host.switches.value(2));
}

#[test]
fn false_condition_takes_the_else_block() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([0, 1, 0])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 5])),
            cmd(codes::ELSE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 9])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 9);
}

#[test]
fn true_condition_skips_the_else_block() {
    let mut host = MemoryHost::new();
    host.switches.set_value(1, true);
    let mut interpreter = started(
        vec![
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([0, 1, 0])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 5])),
            cmd(codes::ELSE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 9])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 5);
}

#[test]
fn loop_repeats_until_broken() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::LOOP, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 1, 0, 1])),
            cmd(codes::CONDITIONAL_BRANCH, 1, json!([1, 1, 0, 3, 1])),
            cmd(codes::BREAK_LOOP, 2, json!([])),
            cmd(codes::REPEAT_ABOVE, 0, json!([])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
    assert_eq!(host.variables.value(1), 3);
}

#[test]
fn break_loop_leaves_only_the_innermost_loop() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::LOOP, 0, json!([])),
            cmd(codes::LOOP, 1, json!([])),
            cmd(codes::BREAK_LOOP, 2, json!([])),
            cmd(codes::REPEAT_ABOVE, 1, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 7])),
            cmd(codes::BREAK_LOOP, 1, json!([])),
            cmd(codes::REPEAT_ABOVE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([2, 2, 0, 0, 3])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
    assert_eq!(host.variables.value(1), 7);
    assert_eq!(host.variables.value(2), 3);
}

#[test]
fn exit_event_abandons_the_rest_of_the_stream() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::EXIT_EVENT, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 9])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
    assert_eq!(host.variables.value(1), 0);
}

#[test]
fn jump_to_label_skips_the_block_in_between() {
    let mut host = MemoryHost::new();
    host.switches.set_value(1, true);
    let mut interpreter = started(
        vec![
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([0, 1, 0])),
            cmd(codes::JUMP_TO_LABEL, 1, json!(["after"])),
            cmd(codes::ELSE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 5])),
            cmd(codes::LABEL, 0, json!(["after"])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([2, 2, 0, 0, 7])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 0);
    assert_eq!(host.variables.value(2), 7);
}

#[test]
fn jump_across_blocks_invalidates_recorded_decisions() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_CHOICES, 0, json!([["Go", "Stay"], 2, 0, 2, 0])),
            cmd(codes::WHEN_CHOICE, 0, json!([0, "Go"])),
            cmd(codes::JUMP_TO_LABEL, 1, json!(["after"])),
            cmd(codes::WHEN_CHOICE, 0, json!([1, "Stay"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([2, 2, 0, 0, 1])),
            cmd(codes::LABEL, 0, json!(["after"])),
            cmd(codes::WHEN_CANCEL, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 9])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    host.message.resolve_choice(0);
    interpreter.update(&mut host).expect("update should pass");
    // The jump left the choice block, so the recorded selection no longer
    // decides the cancel continuation: undecided means its block runs.
    assert_eq!(host.variables.value(1), 9);
    assert_eq!(host.variables.value(2), 0);
}

#[test]
fn backward_jump_builds_a_counting_loop() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::LABEL, 0, json!(["top"])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 1, 0, 1])),
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([1, 1, 0, 3, 4])),
            cmd(codes::JUMP_TO_LABEL, 1, json!(["top"])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([2, 2, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 3);
    assert_eq!(host.variables.value(2), 1);
}

#[test]
fn common_event_child_runs_before_the_parent_continues() {
    let mut host = MemoryHost::new();
    host.common_events.insert(
        1,
        list(vec![cmd(codes::CONTROL_SWITCHES, 0, json!([5, 5, 0]))]),
    );
    let mut interpreter = started(
        vec![
            cmd(codes::COMMON_EVENT, 0, json!([1])),
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([0, 5, 0])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn missing_common_event_is_skipped() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::COMMON_EVENT, 0, json!([99])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn deep_common_event_chain_stays_under_the_call_limit() {
    let mut host = MemoryHost::new();
    for id in 1..99 {
        host.common_events.insert(
            id,
            list(vec![cmd(codes::COMMON_EVENT, 0, json!([id + 1]))]),
        );
    }
    host.common_events.insert(
        99,
        list(vec![cmd(codes::CONTROL_SWITCHES, 0, json!([1, 1, 0]))]),
    );
    let mut interpreter = started(vec![cmd(codes::COMMON_EVENT, 0, json!([1]))], &host);
    interpreter.update(&mut host).expect("chain should fit");
    assert!(host.switches.value(1));
}

#[test]
fn self_recursive_common_event_overflows_the_call_limit() {
    let mut host = MemoryHost::new();
    host.common_events
        .insert(1, list(vec![cmd(codes::COMMON_EVENT, 0, json!([1]))]));
    let mut interpreter = Interpreter::new();
    interpreter.setup(host.common_event(1).expect("event exists"), 0, 1);
    let error = interpreter
        .update(&mut host)
        .expect_err("recursion should overflow");
    assert_eq!(error.code, "INTERP_CALL_OVERFLOW");
}

#[test]
fn watchdog_yields_a_spinning_stream_and_resumes_it() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::LOOP, 0, json!([])),
            cmd(codes::REPEAT_ABOVE, 0, json!([])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(interpreter.is_running());
    host.advance_frame();
    interpreter.update(&mut host).expect("update should pass");
    assert!(interpreter.is_running());
}

#[test]
fn watchdog_splits_a_long_finite_stream_across_frames() {
    let mut host = MemoryHost::new();
    let mut commands: Vec<EventCommand> = (0..150_000)
        .map(|_| cmd(codes::LABEL, 0, json!(["spin"])))
        .collect();
    commands.push(cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])));
    let mut interpreter = started(commands, &host);
    interpreter.update(&mut host).expect("update should pass");
    assert!(interpreter.is_running());
    assert_eq!(host.variables.value(1), 0);
    host.advance_frame();
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn wait_suspends_dispatch_for_the_counted_frames() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::WAIT, 0, json!([3])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    host.advance_frame();
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 0);
    run_to_end(&mut interpreter, &mut host, 10);
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn message_lines_are_absorbed_and_dispatch_waits_on_the_window() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_TEXT, 0, json!(["", 0, 0, 2, "Elder"])),
            cmd(codes::TEXT_LINE, 0, json!(["Hello"])),
            cmd(codes::TEXT_LINE, 0, json!(["World"])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.message.lines, vec!["Hello", "World"]);
    assert_eq!(
        host.message.header.as_ref().map(|h| h.speaker_name.clone()),
        Some("Elder".to_string())
    );
    assert_eq!(host.variables.value(1), 0);
    host.message.close();
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn choice_branches_follow_the_selected_index() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_CHOICES, 0, json!([["Yes", "No"], 1, 0, 2, 0])),
            cmd(codes::WHEN_CHOICE, 0, json!([0, "Yes"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
            cmd(codes::WHEN_CHOICE, 0, json!([1, "No"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 2])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(host.message.busy);
    host.message.resolve_choice(1);
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 2);
}

#[test]
fn out_of_range_cancel_lands_in_the_cancel_branch() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_CHOICES, 0, json!([["A", "B"], 2, 0, 2, 0])),
            cmd(codes::WHEN_CHOICE, 0, json!([0, "A"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
            cmd(codes::WHEN_CANCEL, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 9])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    let cancel_type = host
        .message
        .choices
        .as_ref()
        .map(|setup| setup.cancel_type);
    assert_eq!(cancel_type, Some(-2));
    host.message.resolve_choice(-2);
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 9);
}

#[test]
fn rearmed_interpreter_does_not_leak_old_branch_decisions() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_CHOICES, 0, json!([["A", "B"], 2])),
            cmd(codes::WHEN_CHOICE, 0, json!([0, "A"])),
            cmd(codes::WHEN_CANCEL, 0, json!([])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    host.message.resolve_choice(0);
    run_to_end(&mut interpreter, &mut host, 5);

    // With a clean table the cancel continuation runs its block.
    interpreter.setup(
        list(vec![
            cmd(codes::WHEN_CANCEL, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([9, 9, 0, 0, 1])),
        ]),
        0,
        host.current_map_id,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(9), 1);
}

#[test]
fn number_input_prompt_reaches_the_window() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![cmd(codes::INPUT_NUMBER, 0, json!([5, 3]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.message.number_input, Some((5, 3)));
    assert!(host.message.busy);
}

#[test]
fn comment_block_is_retained_while_the_stream_runs() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::COMMENT, 0, json!(["first"])),
            cmd(codes::COMMENT_LINE, 0, json!(["second"])),
            cmd(codes::WAIT, 0, json!([2])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(interpreter.is_running());
    assert_eq!(interpreter.comments(), ["first", "second"]);
    // Terminating the stream discards them with the rest of the run state.
    run_to_end(&mut interpreter, &mut host, 10);
    assert!(interpreter.comments().is_empty());
}

#[test]
fn variable_operations_cover_the_arithmetic_forms() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 10])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 1, 0, 4])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 2, 0, 2])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 3, 0, 3])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 4, 0, 5])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 5, 0, 4])),
        ],
        &host,
    );
    // 10, +4, -2, *3, /5 (floored), %4
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 3);
}

#[test]
fn division_floors_toward_negative_infinity() {
    let mut host = MemoryHost::new();
    host.variables.set_value(1, -7);
    let mut interpreter = started(
        vec![cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 4, 0, 2]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), -4);
}

#[test]
fn division_by_zero_stores_zero_instead_of_aborting() {
    let mut host = MemoryHost::new();
    host.variables.set_value(1, 5);
    let mut interpreter = started(
        vec![
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 4, 0, 0])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([2, 2, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 0);
    assert_eq!(host.variables.value(2), 1);
}

#[test]
fn failed_script_operand_stores_zero() {
    let mut host = MemoryHost::new();
    host.variables.set_value(1, 3);
    let mut interpreter = started(
        vec![cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 4, "???("]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 0);
}

#[test]
fn script_operand_reads_game_state() {
    let mut host = MemoryHost::new();
    host.variables.set_value(2, 6);
    let mut interpreter = started(
        vec![cmd(
            codes::CONTROL_VARIABLES,
            0,
            json!([1, 1, 0, 4, "v[2] * 7"]),
        )],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 42);
}

#[test]
fn random_operand_draws_within_the_authored_span() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![cmd(codes::CONTROL_VARIABLES, 0, json!([1, 10, 0, 2, 5, 10]))],
        &host,
    );
    interpreter.set_random_seed(0x1234_5678);
    interpreter.update(&mut host).expect("update should pass");
    for id in 1..=10 {
        assert!((5..=10).contains(&host.variables.value(id)));
    }
}

#[test]
fn game_data_operand_reads_the_purse() {
    let mut host = MemoryHost::new();
    host.party.gold = 250;
    let mut interpreter = started(
        vec![cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 3, 7, 2]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 250);
}

#[test]
fn failed_script_condition_is_treated_as_false() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([12, "garbage("])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 0);
}

#[test]
fn self_switch_writes_are_scoped_to_the_owning_event() {
    let mut host = MemoryHost::new();
    let mut interpreter = Interpreter::new();
    interpreter.setup(
        list(vec![
            cmd(codes::CONTROL_SELF_SWITCH, 0, json!(["A", 0])),
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([2, "A", 0])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
        ]),
        12,
        host.current_map_id,
    );
    interpreter.update(&mut host).expect("update should pass");
    let key = SelfSwitchKey {
        map_id: 1,
        event_id: 12,
        switch_ch: "A".to_string(),
    };
    assert!(host.self_switches.value(&key));
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn hp_loss_without_death_allowance_stops_at_one() {
    let mut host = MemoryHost::new();
    host.actors.insert_test_actor(1, "Alice", 50, 10);
    host.party.members = vec![1];
    let mut interpreter = started(
        vec![cmd(codes::CHANGE_HP, 0, json!([0, 1, 1, 0, 60, false]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    let actor = &host.actors.entries[&1];
    assert_eq!(actor.hp, 1);
    assert!(!actor.collapsed);
}

#[test]
fn hp_loss_with_death_allowance_kills_and_collapses() {
    let mut host = MemoryHost::new();
    host.actors.insert_test_actor(1, "Alice", 50, 10);
    let mut interpreter = started(
        vec![cmd(codes::CHANGE_HP, 0, json!([0, 1, 1, 0, 60, true]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    let actor = &host.actors.entries[&1];
    assert_eq!(actor.hp, 0);
    assert!(actor.states.contains(&1));
    assert!(actor.collapsed);
}

#[test]
fn whole_party_selector_touches_every_member() {
    let mut host = MemoryHost::new();
    host.actors.insert_test_actor(1, "Alice", 50, 10);
    host.actors.insert_test_actor(2, "Bob", 40, 10);
    host.party.members = vec![1, 2];
    let mut interpreter = started(
        vec![cmd(codes::CHANGE_HP, 0, json!([0, 0, 1, 0, 10, false]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.actors.entries[&1].hp, 40);
    assert_eq!(host.actors.entries[&2].hp, 30);
}

#[test]
fn variable_indexed_selector_resolves_through_the_variable() {
    let mut host = MemoryHost::new();
    host.actors.insert_test_actor(2, "Bob", 40, 10);
    host.variables.set_value(7, 2);
    let mut interpreter = started(
        vec![cmd(codes::CHANGE_MP, 0, json!([1, 7, 1, 0, 4]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.actors.entries[&2].mp, 6);
}

#[test]
fn transfer_waits_until_the_player_arrives() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::TRANSFER_PLAYER, 0, json!([0, 5, 3, 4, 2, 0])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    let pending = host.player.pending_transfer.clone().expect("reserved");
    assert_eq!((pending.map_id, pending.x, pending.y), (5, 3, 4));
    assert_eq!(host.variables.value(1), 0);

    host.player.pending_transfer = None;
    host.current_map_id = 5;
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn battle_result_selects_the_matching_continuation() {
    let mut host = MemoryHost::new();
    host.battle.known_troops.insert(5);
    let mut interpreter = started(
        vec![
            cmd(codes::BATTLE_PROCESSING, 0, json!([0, 5, true, false])),
            cmd(codes::IF_WIN, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
            cmd(codes::IF_ESCAPE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 2])),
            cmd(codes::IF_LOSE, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 3])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.battle.pending, Some((5, true, false)));
    assert_eq!(host.player.encounter_counts_made, 1);

    host.battle.finish_battle(1);
    host.scene.settle();
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 2);
}

#[test]
fn forced_action_arms_the_action_wait() {
    let mut host = MemoryHost::new();
    host.party.battle = true;
    host.troop.push_test_enemy(31, 100, 0);
    let mut interpreter = started(
        vec![cmd(codes::FORCE_ACTION, 0, json!([0, 0, 5, 1]))],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.battle.forced_actions, vec![BattlerRef::Enemy(0)]);
    assert_eq!(interpreter.wait_mode(), WaitMode::Action);
    assert!(interpreter.is_running());

    host.battle.action_forced = false;
    interpreter.update(&mut host).expect("update should pass");
    assert!(!interpreter.is_running());
}

#[test]
fn move_route_wait_polls_the_bound_character() {
    let mut host = MemoryHost::new();
    let mut interpreter = Interpreter::new();
    interpreter.setup(
        list(vec![
            cmd(
                codes::SET_MOVEMENT_ROUTE,
                0,
                json!([0, {"list": [{"code": 1}], "repeat": false, "skippable": false, "wait": true}]),
            ),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ]),
        3,
        host.current_map_id,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(host.characters.events[&3].route_forcing);
    assert_eq!(host.variables.value(1), 0);

    host.characters.events.get_mut(&3).expect("state exists").route_forcing = false;
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn erase_event_targets_the_owning_event() {
    let mut host = MemoryHost::new();
    let mut interpreter = Interpreter::new();
    interpreter.setup(
        list(vec![cmd(codes::ERASE_EVENT, 0, json!([]))]),
        7,
        host.current_map_id,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert!(host.map.erased_events.contains(&7));
}

#[test]
fn unknown_opcode_is_a_committed_no_op() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(9999, 0, json!([])),
            cmd(codes::CONTROL_VARIABLES, 0, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn show_text_absorbs_a_trailing_choice_prompt() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOW_TEXT, 0, json!(["", 0, 0, 2, ""])),
            cmd(codes::TEXT_LINE, 0, json!(["Pick one"])),
            cmd(codes::SHOW_CHOICES, 0, json!([["Yes", "No"], 1, 0, 2, 0])),
            cmd(codes::WHEN_CHOICE, 0, json!([0, "Yes"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
            cmd(codes::WHEN_CHOICE, 0, json!([1, "No"])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 2])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.message.lines, vec!["Pick one"]);
    assert!(host.message.choices.is_some());
    host.message.resolve_choice(0);
    interpreter.update(&mut host).expect("update should pass");
    assert_eq!(host.variables.value(1), 1);
}

#[test]
fn shop_goods_continuations_are_collected() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::SHOP_PROCESSING, 0, json!([0, 1, 0, 0, true])),
            cmd(codes::SHOP_GOODS_LINE, 0, json!([0, 2, 0, 0])),
            cmd(codes::SHOP_GOODS_LINE, 0, json!([1, 3, 0, 0])),
        ],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    match host.scene.pushed.first() {
        Some(SceneRequest::Shop {
            goods,
            purchase_only,
        }) => {
            assert_eq!(goods.len(), 3);
            assert!(purchase_only);
        }
        other => panic!("expected a shop scene, got {other:?}"),
    }
}

#[test]
fn timer_condition_reads_elapsed_seconds() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::CONTROL_TIMER, 0, json!([0, 2])),
            cmd(codes::CONDITIONAL_BRANCH, 0, json!([3, 1, 1])),
            cmd(codes::CONTROL_VARIABLES, 1, json!([1, 1, 0, 0, 1])),
        ],
        &host,
    );
    // Timer starts at 120 frames; "<= 1 second" is still false.
    interpreter.update(&mut host).expect("update should pass");
    assert!(host.timer.working);
    assert_eq!(host.timer.frames, 120);
    assert_eq!(host.variables.value(1), 0);
}

#[test]
fn screen_and_audio_commands_reach_their_collaborators() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![
            cmd(codes::FADEOUT_SCREEN, 0, json!([])),
            cmd(
                codes::PLAY_BGM,
                0,
                json!([{"name": "Theme1", "volume": 90, "pitch": 100, "pan": 0}]),
            ),
        ],
        &host,
    );
    run_to_end(&mut interpreter, &mut host, 60);
    assert_eq!(host.screen.fade_out_frames, Some(24));
    assert_eq!(
        host.audio.current_bgm.as_ref().map(|bgm| bgm.name.clone()),
        Some("Theme1".to_string())
    );
}

#[test]
fn plugin_command_passes_the_argument_bag_through() {
    let mut host = MemoryHost::new();
    let mut interpreter = started(
        vec![cmd(
            codes::PLUGIN_COMMAND,
            0,
            json!(["QuestSystem", "start", "dummy", {"questId": 4}]),
        )],
        &host,
    );
    interpreter.update(&mut host).expect("update should pass");
    let (plugin, command, args) = host.plugins.calls.first().expect("one call");
    assert_eq!(plugin, "QuestSystem");
    assert_eq!(command, "start");
    assert_eq!(
        args.as_map().and_then(|map| map.get("questId")?.as_i64()),
        Some(4)
    );
}
