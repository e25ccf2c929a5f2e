use super::*;

impl Interpreter {
    /// Runs as many commands as this frame allows. Dispatch stops at the
    /// first suspension: an active child, a pending wait, a scene change,
    /// an uncommitted handler, or the watchdog.
    pub fn update(&mut self, host: &mut dyn Host) -> Result<(), InterpreterError> {
        while self.is_running() {
            if self.update_child(host)? || self.update_wait(host) {
                break;
            }
            if host.scene().is_changing() {
                break;
            }
            if !self.execute_command(host)? {
                break;
            }
            if self.check_freeze(host) {
                break;
            }
        }
        Ok(())
    }

    fn update_child(&mut self, host: &mut dyn Host) -> Result<bool, InterpreterError> {
        if let Some(child) = self.child.as_mut() {
            child.update(host)?;
            if child.is_running() {
                return Ok(true);
            }
            self.child = None;
        }
        Ok(false)
    }

    fn update_wait(&mut self, host: &mut dyn Host) -> bool {
        self.update_wait_count() || self.update_wait_mode(host)
    }

    fn update_wait_count(&mut self) -> bool {
        if self.wait_count > 0 {
            self.wait_count -= 1;
            true
        } else {
            false
        }
    }

    /// Polls the collaborator predicate behind the armed wait mode. The
    /// mode disarms itself the first tick its predicate reads false.
    fn update_wait_mode(&mut self, host: &mut dyn Host) -> bool {
        let waiting = match self.wait_mode {
            WaitMode::None => false,
            WaitMode::Message => host.message().is_busy(),
            WaitMode::Transfer => host.player().is_transferring(),
            WaitMode::Scroll => host.map().is_scrolling(),
            WaitMode::Route(selector) => self
                .resolve_character(host, selector)
                .is_some_and(|target| host.characters().is_move_route_forcing(target)),
            WaitMode::Animation(selector) => self
                .resolve_character(host, selector)
                .is_some_and(|target| host.characters().is_animation_playing(target)),
            WaitMode::Balloon(selector) => self
                .resolve_character(host, selector)
                .is_some_and(|target| host.characters().is_balloon_playing(target)),
            WaitMode::Gather => host.player().are_followers_gathering(),
            WaitMode::Action => host.battle().is_action_forced(),
            WaitMode::Video => host.scene().is_video_playing(),
            WaitMode::Image => host.scene().is_image_loading(),
        };
        if !waiting {
            self.wait_mode = WaitMode::None;
        }
        waiting
    }

    /// Dispatches the command under the cursor. A committed handler moves
    /// the cursor forward; an uncommitted one leaves it in place so the
    /// same command retries next tick. Running past the end terminates.
    fn execute_command(&mut self, host: &mut dyn Host) -> Result<bool, InterpreterError> {
        let Some(command) = self.current_command().cloned() else {
            self.terminate();
            return Ok(true);
        };
        self.indent = command.indent;
        if !self.dispatch(host, &command)? {
            return Ok(false);
        }
        self.index += 1;
        Ok(true)
    }

    /// Resets the dispatch budget on each new host frame; trips once a
    /// single frame burns through the whole budget.
    fn check_freeze(&mut self, host: &mut dyn Host) -> bool {
        let frame = host.frame_count();
        if self.frame_count != frame {
            self.frame_count = frame;
            self.freeze_checker = 0;
        }
        self.freeze_checker += 1;
        if self.freeze_checker > FREEZE_THRESHOLD {
            debug!(
                "event {} hit the per-frame dispatch budget, yielding",
                self.event_id
            );
            true
        } else {
            false
        }
    }

    fn dispatch(
        &mut self,
        host: &mut dyn Host,
        command: &EventCommand,
    ) -> Result<bool, InterpreterError> {
        let params = command.parameters.as_slice();
        let advance = match command.code {
            codes::SHOW_TEXT => self.show_text(host, params),
            codes::SHOW_CHOICES => self.show_choices(host, params),
            codes::INPUT_NUMBER => self.input_number(host, params),
            codes::SELECT_ITEM => self.select_item(host, params),
            codes::SHOW_SCROLLING_TEXT => self.show_scrolling_text(host, params),
            codes::COMMENT => self.absorb_comment(params),
            codes::SKIP => self.skip_block(),
            codes::CONDITIONAL_BRANCH => self.conditional_branch(host, params),
            codes::ELSE => self.else_branch(),
            codes::LOOP | codes::LABEL => true,
            codes::REPEAT_ABOVE => self.repeat_above(),
            codes::BREAK_LOOP => self.break_loop(),
            codes::EXIT_EVENT => self.exit_event(),
            codes::COMMON_EVENT => return self.call_common_event(host, params),
            codes::JUMP_TO_LABEL => self.jump_to_label(params),
            codes::WHEN_CHOICE => self.when_choice(params),
            codes::WHEN_CANCEL => self.when_cancel(),
            codes::IF_WIN => self.battle_result_branch(0),
            codes::IF_ESCAPE => self.battle_result_branch(1),
            codes::IF_LOSE => self.battle_result_branch(2),
            codes::CONTROL_SWITCHES => self.control_switches(host, params),
            codes::CONTROL_VARIABLES => self.control_variables(host, params),
            codes::CONTROL_SELF_SWITCH => self.control_self_switch(host, params),
            codes::CONTROL_TIMER => self.control_timer(host, params),
            codes::CHANGE_GOLD => self.change_gold(host, params),
            codes::CHANGE_ITEMS => self.change_items(host, params),
            codes::CHANGE_WEAPONS => self.change_weapons(host, params),
            codes::CHANGE_ARMORS => self.change_armors(host, params),
            codes::CHANGE_PARTY_MEMBER => self.change_party_member(host, params),
            codes::CHANGE_BATTLE_BGM => self.change_battle_bgm(host, params),
            codes::CHANGE_VICTORY_ME => self.change_victory_me(host, params),
            codes::CHANGE_SAVE_ACCESS => self.change_save_access(host, params),
            codes::CHANGE_MENU_ACCESS => self.change_menu_access(host, params),
            codes::CHANGE_ENCOUNTER => self.change_encounter(host, params),
            codes::CHANGE_FORMATION_ACCESS => self.change_formation_access(host, params),
            codes::CHANGE_WINDOW_COLOR => self.change_window_color(host, params),
            codes::CHANGE_DEFEAT_ME => self.change_defeat_me(host, params),
            codes::CHANGE_VEHICLE_BGM => self.change_vehicle_bgm(host, params),
            codes::TRANSFER_PLAYER => self.transfer_player(host, params),
            codes::SET_VEHICLE_LOCATION => self.set_vehicle_location(host, params),
            codes::SET_EVENT_LOCATION => self.set_event_location(host, params),
            codes::SCROLL_MAP => self.scroll_map(host, params),
            codes::SET_MOVEMENT_ROUTE => self.set_movement_route(host, params),
            codes::GET_ON_OFF_VEHICLE => self.get_on_off_vehicle(host),
            codes::CHANGE_TRANSPARENCY => self.change_transparency(host, params),
            codes::SHOW_ANIMATION => self.show_animation(host, params),
            codes::SHOW_BALLOON => self.show_balloon(host, params),
            codes::ERASE_EVENT => self.erase_event(host),
            codes::CHANGE_FOLLOWERS => self.change_followers(host, params),
            codes::GATHER_FOLLOWERS => self.gather_followers(host),
            codes::FADEOUT_SCREEN => self.fadeout_screen(host),
            codes::FADEIN_SCREEN => self.fadein_screen(host),
            codes::TINT_SCREEN => self.tint_screen(host, params),
            codes::FLASH_SCREEN => self.flash_screen(host, params),
            codes::SHAKE_SCREEN => self.shake_screen(host, params),
            codes::WAIT => self.wait_frames(params),
            codes::SHOW_PICTURE => self.show_picture(host, params),
            codes::MOVE_PICTURE => self.move_picture(host, params),
            codes::ROTATE_PICTURE => self.rotate_picture(host, params),
            codes::TINT_PICTURE => self.tint_picture(host, params),
            codes::ERASE_PICTURE => self.erase_picture(host, params),
            codes::SET_WEATHER => self.set_weather(host, params),
            codes::PLAY_BGM => self.play_bgm(host, params),
            codes::FADEOUT_BGM => self.fadeout_bgm(host, params),
            codes::SAVE_BGM => self.save_bgm(host),
            codes::RESUME_BGM => self.resume_bgm(host),
            codes::PLAY_BGS => self.play_bgs(host, params),
            codes::FADEOUT_BGS => self.fadeout_bgs(host, params),
            codes::PLAY_ME => self.play_me(host, params),
            codes::PLAY_SE => self.play_se(host, params),
            codes::STOP_SE => self.stop_se(host),
            codes::PLAY_MOVIE => self.play_movie(host, params),
            codes::CHANGE_MAP_NAME_DISPLAY => self.change_map_name_display(host, params),
            codes::CHANGE_BATTLEBACK => self.change_battleback(host, params),
            codes::CHANGE_PARALLAX => self.change_parallax(host, params),
            codes::GET_LOCATION_INFO => self.get_location_info(host, params),
            codes::BATTLE_PROCESSING => self.battle_processing(host, params),
            codes::SHOP_PROCESSING => self.shop_processing(host, params),
            codes::NAME_INPUT => self.name_input(host, params),
            codes::CHANGE_HP => self.change_hp(host, params),
            codes::CHANGE_MP => self.change_mp(host, params),
            codes::CHANGE_STATE => self.change_state(host, params),
            codes::RECOVER_ALL => self.recover_all(host, params),
            codes::CHANGE_EXP => self.change_exp(host, params),
            codes::CHANGE_LEVEL => self.change_level(host, params),
            codes::CHANGE_PARAMETER => self.change_parameter(host, params),
            codes::CHANGE_SKILL => self.change_skill(host, params),
            codes::CHANGE_EQUIPMENT => self.change_equipment(host, params),
            codes::CHANGE_NAME => self.change_name(host, params),
            codes::CHANGE_CLASS => self.change_class(host, params),
            codes::CHANGE_NICKNAME => self.change_nickname(host, params),
            codes::CHANGE_PROFILE => self.change_profile(host, params),
            codes::CHANGE_TP => self.change_tp(host, params),
            codes::CHANGE_ENEMY_HP => self.change_enemy_hp(host, params),
            codes::CHANGE_ENEMY_MP => self.change_enemy_mp(host, params),
            codes::CHANGE_ENEMY_STATE => self.change_enemy_state(host, params),
            codes::ENEMY_RECOVER_ALL => self.enemy_recover_all(host, params),
            codes::ENEMY_APPEAR => self.enemy_appear(host, params),
            codes::ENEMY_TRANSFORM => self.enemy_transform(host, params),
            codes::SHOW_BATTLE_ANIMATION => self.show_battle_animation(host, params),
            codes::FORCE_ACTION => self.force_action(host, params),
            codes::ABORT_BATTLE => self.abort_battle(host),
            codes::CHANGE_ENEMY_TP => self.change_enemy_tp(host, params),
            codes::OPEN_MENU => self.open_menu(host),
            codes::OPEN_SAVE => self.open_save(host),
            codes::GAME_OVER => self.game_over(host),
            codes::RETURN_TO_TITLE => self.return_to_title(host),
            codes::SCRIPT => self.run_script(host),
            codes::PLUGIN_COMMAND => self.plugin_command(host, params),
            // Continuation lines are absorbed by the command that owns
            // them; one reached directly is inert.
            codes::TEXT_LINE
            | codes::SCROLLING_TEXT_LINE
            | codes::COMMENT_LINE
            | codes::SHOP_GOODS_LINE
            | codes::SCRIPT_LINE => true,
            other => {
                debug!("no handler for command code {other}, skipping");
                true
            }
        };
        Ok(advance)
    }
}
