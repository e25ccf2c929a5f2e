use super::*;

impl Interpreter {
    /// Evaluates one of the designer-facing condition forms, records the
    /// outcome at the current indent, and skips the block on false.
    pub(super) fn conditional_branch(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let result = match param_int(params, 0) {
            0 => {
                let expected = param_int(params, 2) == 0;
                host.switches().value(param_int(params, 1)) == expected
            }
            1 => {
                let value1 = host.variables().value(param_int(params, 1));
                let value2 = if param_int(params, 2) == 0 {
                    param_int(params, 3)
                } else {
                    host.variables().value(param_int(params, 3))
                };
                match param_int(params, 4) {
                    0 => value1 == value2,
                    1 => value1 >= value2,
                    2 => value1 <= value2,
                    3 => value1 > value2,
                    4 => value1 < value2,
                    5 => value1 != value2,
                    _ => false,
                }
            }
            2 => {
                if self.event_id > 0 {
                    let key = SelfSwitchKey {
                        map_id: self.map_id,
                        event_id: self.event_id,
                        switch_ch: param_str(params, 1).to_string(),
                    };
                    host.self_switches().value(&key) == (param_int(params, 2) == 0)
                } else {
                    false
                }
            }
            3 => {
                if host.timer().is_working() {
                    let seconds = host.timer().frames() / 60;
                    let bound = param_int(params, 1);
                    if param_int(params, 2) == 0 {
                        seconds >= bound
                    } else {
                        seconds <= bound
                    }
                } else {
                    false
                }
            }
            4 => self.actor_condition(host, params),
            5 => self.enemy_condition(host, params),
            6 => {
                let direction = param_int(params, 2);
                self.resolve_character(host, param_int(params, 1))
                    .is_some_and(|target| host.characters().direction(target) == direction)
            }
            7 => {
                let amount = param_int(params, 1);
                let gold = host.party().gold();
                match param_int(params, 2) {
                    0 => gold >= amount,
                    1 => gold <= amount,
                    2 => gold < amount,
                    _ => false,
                }
            }
            8 => host
                .party()
                .has_item(ItemKind::Item, param_int(params, 1), false),
            9 => host.party().has_item(
                ItemKind::Weapon,
                param_int(params, 1),
                param_flag(params, 2),
            ),
            10 => host.party().has_item(
                ItemKind::Armor,
                param_int(params, 1),
                param_flag(params, 2),
            ),
            11 => {
                let button = param_str(params, 1);
                match param_int(params, 2) {
                    0 => host.input().is_pressed(button),
                    1 => host.input().is_triggered(button),
                    2 => host.input().is_repeated(button),
                    _ => false,
                }
            }
            12 => {
                let source = param_str(params, 1);
                expr::eval_flag(source, host).unwrap_or_else(|error| {
                    warn!("condition {source:?} failed ({error}), treating as false");
                    false
                })
            }
            13 => host.player().vehicle() == Some(param_int(params, 1)),
            other => {
                debug!("unknown condition form {other}, treating as false");
                false
            }
        };
        self.set_branch(self.indent, BranchValue::Bool(result));
        if !result {
            self.skip_branch();
        }
        true
    }

    fn actor_condition(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let actor_id = param_int(params, 1);
        let form = param_int(params, 2);
        if form == 0 {
            return host.actors().actor(actor_id).is_some()
                && host.party().member_actor_ids().contains(&actor_id);
        }
        let operand = param_int(params, 3);
        let name = param_str(params, 3).to_string();
        let Some(actor) = host.actors().actor(actor_id) else {
            return false;
        };
        match form {
            1 => actor.name() == name,
            2 => actor.class_id() == operand,
            3 => actor.has_skill(operand),
            4 => actor.has_weapon(operand),
            5 => actor.has_armor(operand),
            6 => actor.is_state_affected(operand),
            _ => false,
        }
    }

    fn enemy_condition(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let index = param_int(params, 1).max(0) as usize;
        let Some(enemy) = host.troop().enemy(index) else {
            return false;
        };
        match param_int(params, 2) {
            0 => enemy.is_alive(),
            1 => enemy.is_state_affected(param_int(params, 3)),
            _ => false,
        }
    }

    /// Runs only when the conditional at this indent recorded false.
    pub(super) fn else_branch(&mut self) -> bool {
        if self.branch_value(self.indent) != Some(BranchValue::Bool(false)) {
            self.skip_branch();
        }
        true
    }

    /// Rewinds to the loop opener: the nearest earlier command at the same
    /// indent.
    pub(super) fn repeat_above(&mut self) -> bool {
        let Some(list) = self.list.clone() else {
            return true;
        };
        while self.index > 0 {
            self.index -= 1;
            if list[self.index].indent == self.indent {
                break;
            }
        }
        true
    }

    /// Scans forward past the terminator of the innermost enclosing loop,
    /// counting nested openers so inner loops are stepped over whole.
    pub(super) fn break_loop(&mut self) -> bool {
        let Some(list) = self.list.clone() else {
            return true;
        };
        let mut nesting = 0;
        while self.index + 1 < list.len() {
            self.index += 1;
            match list[self.index].code {
                codes::LOOP => nesting += 1,
                codes::REPEAT_ABOVE => {
                    if nesting > 0 {
                        nesting -= 1;
                    } else {
                        break;
                    }
                }
                _ => {}
            }
        }
        true
    }

    pub(super) fn skip_block(&mut self) -> bool {
        self.skip_branch();
        true
    }

    /// Parks the cursor past the end; the loop terminates on the next pass.
    pub(super) fn exit_event(&mut self) -> bool {
        if let Some(list) = self.list.as_ref() {
            self.index = list.len();
        }
        true
    }

    /// Spawns a child context over a globally defined stream. The parent
    /// resumes after the child runs to completion.
    pub(super) fn call_common_event(
        &mut self,
        host: &mut dyn Host,
        params: &[ParamValue],
    ) -> Result<bool, InterpreterError> {
        let id = param_int(params, 0);
        if let Some(list) = host.common_event(id) {
            let event_id = if self.is_on_current_map(host) {
                self.event_id
            } else {
                0
            };
            self.setup_child(list, event_id, host.map_id())?;
        } else {
            debug!("common event {id} is not defined");
        }
        Ok(true)
    }

    fn setup_child(
        &mut self,
        list: CommandList,
        event_id: i64,
        map_id: i64,
    ) -> Result<(), InterpreterError> {
        let mut child = Interpreter::with_depth(self.depth + 1)?;
        child.setup(list, event_id, map_id);
        self.child = Some(Box::new(child));
        Ok(())
    }

    pub(super) fn jump_to_label(&mut self, params: &[ParamValue]) -> bool {
        let label = param_str(params, 0).to_string();
        let Some(list) = self.list.clone() else {
            return true;
        };
        let found = list.iter().position(|command| {
            command.code == codes::LABEL && param_str(&command.parameters, 0) == label
        });
        if let Some(destination) = found {
            self.jump_to(destination);
        } else {
            debug!("label {label:?} not found, continuing");
        }
        true
    }

    /// Runs only when this indent's recorded decision matches the branch's
    /// option index.
    pub(super) fn when_choice(&mut self, params: &[ParamValue]) -> bool {
        let expected = BranchValue::Index(param_int(params, 0));
        if self.branch_value(self.indent) != Some(expected) {
            self.skip_branch();
        }
        true
    }

    /// Runs only when the recorded decision is the cancel sentinel (or no
    /// decision was recorded at all).
    pub(super) fn when_cancel(&mut self) -> bool {
        if let Some(BranchValue::Index(selected)) = self.branch_value(self.indent) {
            if selected >= 0 {
                self.skip_branch();
            }
        }
        true
    }

    pub(super) fn battle_result_branch(&mut self, expected: i64) -> bool {
        if self.branch_value(self.indent) != Some(BranchValue::Index(expected)) {
            self.skip_branch();
        }
        true
    }
}
