//! The event-command interpreter: reconstructs structured control flow
//! from a flat, indent-tagged command list and multiplexes its wait
//! conditions against the host's frame loop.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use evc_core::{
    codes, param_flag, param_int, param_str, AudioRequest, BattlerRef, BranchValue,
    CharacterRef, ChoiceSetup, CommandList, EventCommand, InterpreterError, ItemKind, MoveRoute,
    ParamValue, SceneRequest, SelfSwitchKey, TextHeader, WaitMode,
};
use log::{debug, warn};

use crate::expr;
use crate::host::{Battler, Host, IndexCallback};

mod actor_ops;
mod flow;
mod lifecycle;
mod messages;
mod rng;
mod scene_ops;
mod state_ops;
mod step;

#[cfg(test)]
mod tests;

pub use lifecycle::{Interpreter, FREEZE_THRESHOLD, MAX_CALL_DEPTH};
