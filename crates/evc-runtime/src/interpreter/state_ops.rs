use super::*;

fn audio_param(params: &[ParamValue], index: usize) -> AudioRequest {
    AudioRequest::from_param(params.get(index).unwrap_or(&ParamValue::Null))
}

impl Interpreter {
    pub(super) fn control_switches(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let on = param_int(params, 2) == 0;
        for id in param_int(params, 0)..=param_int(params, 1) {
            host.switches().set_value(id, on);
        }
        true
    }

    /// Writes one operand value into a range of variables. The random
    /// operand redraws per variable; a failed script operand degrades to 0.
    pub(super) fn control_variables(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let start_id = param_int(params, 0);
        let end_id = param_int(params, 1);
        let operation = param_int(params, 2);
        let (value, random_span) = match param_int(params, 3) {
            0 => (param_int(params, 4), 0),
            1 => (host.variables().value(param_int(params, 4)), 0),
            2 => {
                let low = param_int(params, 4);
                let span = (param_int(params, 5) - low + 1).max(1);
                (low, span)
            }
            3 => {
                let operand = self.game_data_operand(
                    host,
                    param_int(params, 4),
                    param_int(params, 5),
                    param_int(params, 6),
                );
                (operand, 0)
            }
            4 => {
                let source = param_str(params, 4);
                let operand = expr::eval_amount(source, host).unwrap_or_else(|error| {
                    warn!("operand {source:?} failed ({error}), storing 0");
                    0
                });
                (operand, 0)
            }
            _ => (0, 0),
        };
        for id in start_id..=end_id {
            let drawn = if random_span > 1 {
                value + self.random_int(random_span)
            } else {
                value
            };
            self.operate_variable(host, id, operation, drawn);
        }
        true
    }

    /// Reads one engine-state quantity for the game-data operand form.
    /// Unresolvable designators read as 0.
    fn game_data_operand(
        &mut self,
        host: &mut dyn Host,
        kind: i64,
        param1: i64,
        param2: i64,
    ) -> i64 {
        match kind {
            0 => host.party().item_count(ItemKind::Item, param1),
            1 => host.party().item_count(ItemKind::Weapon, param1),
            2 => host.party().item_count(ItemKind::Armor, param1),
            3 => {
                let Some(actor) = host.actors().actor(param1) else {
                    return 0;
                };
                match param2 {
                    0 => actor.level(),
                    1 => actor.current_exp(),
                    2 => actor.hp(),
                    3 => actor.mp(),
                    12 => actor.tp(),
                    4..=11 => actor.param(param2 - 4),
                    _ => 0,
                }
            }
            4 => {
                let Some(enemy) = host.troop().enemy(param1.max(0) as usize) else {
                    return 0;
                };
                match param2 {
                    0 => enemy.hp(),
                    1 => enemy.mp(),
                    10 => enemy.tp(),
                    2..=9 => enemy.param(param2 - 2),
                    _ => 0,
                }
            }
            5 => {
                let Some(target) = self.resolve_character(host, param1) else {
                    return 0;
                };
                match param2 {
                    0 => host.characters().position(target).0,
                    1 => host.characters().position(target).1,
                    2 => host.characters().direction(target),
                    3 => host.characters().screen_position(target).0,
                    4 => host.characters().screen_position(target).1,
                    _ => 0,
                }
            }
            6 => {
                let members = host.party().member_actor_ids();
                members.get(param1.max(0) as usize).copied().unwrap_or(0)
            }
            7 => match param1 {
                0 => host.map_id(),
                1 => host.party().size() as i64,
                2 => host.party().gold(),
                3 => host.party().steps(),
                4 => host.system().playtime_seconds(),
                5 => host.timer().frames() / 60,
                6 => host.system().save_count(),
                7 => host.system().battle_count(),
                8 => host.system().win_count(),
                9 => host.system().escape_count(),
                _ => 0,
            },
            other => {
                debug!("unknown game data designator {other}, reading 0");
                0
            }
        }
    }

    /// Applies one arithmetic operation to a variable. Overflow and
    /// division by zero degrade to storing 0 rather than aborting the
    /// stream.
    fn operate_variable(
        &mut self,
        host: &mut dyn Host,
        variable_id: i64,
        operation: i64,
        value: i64,
    ) {
        let old = host.variables().value(variable_id);
        let result = match operation {
            0 => Some(value),
            1 => old.checked_add(value),
            2 => old.checked_sub(value),
            3 => old.checked_mul(value),
            // Floored division, matching how the authoring tool rounds.
            4 => old.checked_div_euclid(value),
            5 => old.checked_rem(value),
            _ => Some(old),
        };
        match result {
            Some(new_value) => host.variables().set_value(variable_id, new_value),
            None => {
                warn!("variable {variable_id} operation failed, storing 0");
                host.variables().set_value(variable_id, 0);
            }
        }
    }

    pub(super) fn control_self_switch(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if self.event_id > 0 {
            let key = SelfSwitchKey {
                map_id: self.map_id,
                event_id: self.event_id,
                switch_ch: param_str(params, 0).to_string(),
            };
            host.self_switches().set_value(&key, param_int(params, 1) == 0);
        }
        true
    }

    pub(super) fn control_timer(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if param_int(params, 0) == 0 {
            host.timer().start(param_int(params, 1) * 60);
        } else {
            host.timer().stop();
        }
        true
    }

    pub(super) fn change_gold(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 0),
            param_int(params, 1),
            param_int(params, 2),
        );
        host.party().gain_gold(value);
        true
    }

    pub(super) fn change_items(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        self.change_inventory(host, ItemKind::Item, params, false)
    }

    pub(super) fn change_weapons(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        self.change_inventory(host, ItemKind::Weapon, params, param_flag(params, 4))
    }

    pub(super) fn change_armors(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        self.change_inventory(host, ItemKind::Armor, params, param_flag(params, 4))
    }

    fn change_inventory(
        &mut self,
        host: &mut dyn Host,
        kind: ItemKind,
        params: &[ParamValue],
        include_equip: bool,
    ) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 1),
            param_int(params, 2),
            param_int(params, 3),
        );
        host.party()
            .gain_item(kind, param_int(params, 0), value, include_equip);
        true
    }

    pub(super) fn change_party_member(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let actor_id = param_int(params, 0);
        if host.actors().actor(actor_id).is_some() {
            if param_int(params, 1) == 0 {
                host.party().add_actor(actor_id, param_flag(params, 2));
            } else {
                host.party().remove_actor(actor_id);
            }
        }
        true
    }

    pub(super) fn change_battle_bgm(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_battle_bgm(&audio_param(params, 0));
        true
    }

    pub(super) fn change_victory_me(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_victory_me(&audio_param(params, 0));
        true
    }

    pub(super) fn change_defeat_me(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_defeat_me(&audio_param(params, 0));
        true
    }

    pub(super) fn change_save_access(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_save_enabled(param_int(params, 0) != 0);
        true
    }

    pub(super) fn change_menu_access(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_menu_enabled(param_int(params, 0) != 0);
        true
    }

    pub(super) fn change_encounter(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.system().set_encounter_enabled(param_int(params, 0) != 0);
        host.player().make_encounter_count();
        true
    }

    pub(super) fn change_formation_access(
        &mut self,
        host: &mut dyn Host,
        params: &[ParamValue],
    ) -> bool {
        host.system().set_formation_enabled(param_int(params, 0) != 0);
        true
    }

    pub(super) fn change_window_color(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let tone = params.first().cloned().unwrap_or(ParamValue::Null);
        host.system().set_window_tone(&tone);
        true
    }

    pub(super) fn change_vehicle_bgm(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let bgm = audio_param(params, 1);
        host.map().set_vehicle_bgm(param_int(params, 0), &bgm);
        true
    }
}
