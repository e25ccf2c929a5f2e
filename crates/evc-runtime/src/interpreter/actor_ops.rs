use super::*;

/// HP delta with the death-allowance clamp: without the allowance the
/// target is left at 1 HP instead of dying. Newly dead targets collapse.
fn apply_hp_change(target: &mut dyn Battler, mut value: i64, allow_death: bool) {
    if target.is_alive() {
        if !allow_death && target.hp() <= -value {
            value = 1 - target.hp();
        }
        target.gain_hp(value);
        if target.is_dead() {
            target.perform_collapse();
        }
    }
}

fn battler_mut(host: &mut dyn Host, target: BattlerRef) -> Option<&mut dyn Battler> {
    match target {
        BattlerRef::Actor(id) => host
            .actors()
            .actor_mut(id)
            .map(|actor| actor as &mut dyn Battler),
        BattlerRef::Enemy(index) => host
            .troop()
            .enemy_mut(index)
            .map(|enemy| enemy as &mut dyn Battler),
    }
}

impl Interpreter {
    /// Actor selector: 0 means the whole party, anything else one actor id.
    fn resolve_actor_ids(&mut self, host: &mut dyn Host, selector: i64) -> Vec<i64> {
        if selector == 0 {
            host.party().member_actor_ids()
        } else if host.actors().actor(selector).is_some() {
            vec![selector]
        } else {
            Vec::new()
        }
    }

    /// Extended actor selector: the id is fixed or read from a variable.
    fn resolve_actor_ids_ex(&mut self, host: &mut dyn Host, fixed: i64, operand: i64) -> Vec<i64> {
        if fixed == 0 {
            self.resolve_actor_ids(host, operand)
        } else {
            let actor_id = host.variables().value(operand);
            self.resolve_actor_ids(host, actor_id)
        }
    }

    /// Enemy selector: negative means the whole troop, otherwise one
    /// troop position.
    fn resolve_enemy_indexes(&mut self, host: &mut dyn Host, selector: i64) -> Vec<usize> {
        if selector < 0 {
            (0..host.troop().enemy_count()).collect()
        } else {
            let index = selector as usize;
            if host.troop().enemy(index).is_some() {
                vec![index]
            } else {
                Vec::new()
            }
        }
    }

    /// Battler selector, battle-gated: side 0 picks enemies by troop
    /// position, any other side picks actors by id.
    fn resolve_battlers(&mut self, host: &mut dyn Host, side: i64, selector: i64) -> Vec<BattlerRef> {
        if !host.party().in_battle() {
            return Vec::new();
        }
        if side == 0 {
            self.resolve_enemy_indexes(host, selector)
                .into_iter()
                .map(BattlerRef::Enemy)
                .collect()
        } else {
            self.resolve_actor_ids(host, selector)
                .into_iter()
                .map(BattlerRef::Actor)
                .collect()
        }
    }

    pub(super) fn change_hp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        let allow_death = param_flag(params, 5);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                apply_hp_change(actor, value, allow_death);
            }
        }
        true
    }

    pub(super) fn change_mp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                actor.gain_mp(value);
            }
        }
        true
    }

    pub(super) fn change_tp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                actor.gain_tp(value);
            }
        }
        true
    }

    pub(super) fn change_state(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let removing = param_int(params, 2) != 0;
        let state_id = param_int(params, 3);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                toggle_state(actor, removing, state_id);
            }
        }
        true
    }

    pub(super) fn recover_all(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                actor.recover_all();
            }
        }
        true
    }

    pub(super) fn change_exp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        let show = param_flag(params, 5);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                let target = actor.current_exp() + value;
                actor.change_exp(target, show);
            }
        }
        true
    }

    pub(super) fn change_level(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        let show = param_flag(params, 5);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                let target = actor.level() + value;
                actor.change_level(target, show);
            }
        }
        true
    }

    pub(super) fn change_parameter(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 3),
            param_int(params, 4),
            param_int(params, 5),
        );
        let param_id = param_int(params, 2);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                actor.add_param(param_id, value);
            }
        }
        true
    }

    pub(super) fn change_skill(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let forgetting = param_int(params, 2) != 0;
        let skill_id = param_int(params, 3);
        for actor_id in self.resolve_actor_ids_ex(host, param_int(params, 0), param_int(params, 1)) {
            if let Some(actor) = host.actors().actor_mut(actor_id) {
                if forgetting {
                    actor.forget_skill(skill_id);
                } else {
                    actor.learn_skill(skill_id);
                }
            }
        }
        true
    }

    pub(super) fn change_equipment(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(actor) = host.actors().actor_mut(param_int(params, 0)) {
            actor.change_equip(param_int(params, 1), param_int(params, 2));
        }
        true
    }

    pub(super) fn change_name(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(actor) = host.actors().actor_mut(param_int(params, 0)) {
            actor.set_name(param_str(params, 1));
        }
        true
    }

    pub(super) fn change_class(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(actor) = host.actors().actor_mut(param_int(params, 0)) {
            actor.change_class(param_int(params, 1), param_flag(params, 2));
        }
        true
    }

    pub(super) fn change_nickname(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(actor) = host.actors().actor_mut(param_int(params, 0)) {
            actor.set_nickname(param_str(params, 1));
        }
        true
    }

    pub(super) fn change_profile(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(actor) = host.actors().actor_mut(param_int(params, 0)) {
            actor.set_profile(param_str(params, 1));
        }
        true
    }

    pub(super) fn change_enemy_hp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 1),
            param_int(params, 2),
            param_int(params, 3),
        );
        let allow_death = param_flag(params, 4);
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                apply_hp_change(enemy, value, allow_death);
            }
        }
        true
    }

    pub(super) fn change_enemy_mp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 1),
            param_int(params, 2),
            param_int(params, 3),
        );
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                enemy.gain_mp(value);
            }
        }
        true
    }

    pub(super) fn change_enemy_tp(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let value = self.operate_value(
            host,
            param_int(params, 1),
            param_int(params, 2),
            param_int(params, 3),
        );
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                enemy.gain_tp(value);
            }
        }
        true
    }

    pub(super) fn change_enemy_state(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let removing = param_int(params, 1) != 0;
        let state_id = param_int(params, 2);
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                toggle_state(enemy, removing, state_id);
            }
        }
        true
    }

    pub(super) fn enemy_recover_all(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                enemy.recover_all();
            }
        }
        true
    }

    pub(super) fn enemy_appear(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                enemy.appear();
            }
            host.troop().make_unique_names();
        }
        true
    }

    pub(super) fn enemy_transform(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let enemy_id = param_int(params, 1);
        for index in self.resolve_enemy_indexes(host, param_int(params, 0)) {
            if let Some(enemy) = host.troop().enemy_mut(index) {
                enemy.transform(enemy_id);
            }
            host.troop().make_unique_names();
        }
        true
    }

    pub(super) fn show_battle_animation(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        // The "target all" flag overrides the position selector.
        let selector = if param_flag(params, 2) {
            -1
        } else {
            param_int(params, 0)
        };
        let targets: Vec<usize> = self
            .resolve_enemy_indexes(host, selector)
            .into_iter()
            .filter(|&index| host.troop().enemy(index).is_some_and(|enemy| enemy.is_alive()))
            .collect();
        host.troop().request_animation(&targets, param_int(params, 1));
        true
    }

    pub(super) fn force_action(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let skill_id = param_int(params, 2);
        let target_index = param_int(params, 3);
        for target in self.resolve_battlers(host, param_int(params, 0), param_int(params, 1)) {
            let Some(battler) = battler_mut(host, target) else {
                continue;
            };
            if battler.is_death_state_affected() {
                continue;
            }
            battler.force_action(skill_id, target_index);
            host.battle().request_forced_action(target);
            self.set_wait_mode(WaitMode::Action);
        }
        true
    }

    pub(super) fn abort_battle(&mut self, host: &mut dyn Host) -> bool {
        host.battle().abort();
        true
    }
}

/// State toggle with the shared collapse-on-newly-dead epilogue.
fn toggle_state(target: &mut dyn Battler, removing: bool, state_id: i64) {
    let already_dead = target.is_dead();
    if removing {
        target.remove_state(state_id);
    } else {
        target.add_state(state_id);
    }
    if target.is_dead() && !already_dead {
        target.perform_collapse();
    }
    target.clear_result();
}
