use super::*;

use super::lifecycle::FADE_FRAMES;

/// Reads an (x, y) pair that is either authored directly or indirected
/// through two variables.
fn coordinate_pair(host: &mut dyn Host, params: &[ParamValue], mode_slot: usize) -> (i64, i64) {
    let x_slot = mode_slot + 1;
    let y_slot = mode_slot + 2;
    if param_int(params, mode_slot) == 0 {
        (param_int(params, x_slot), param_int(params, y_slot))
    } else {
        (
            host.variables().value(param_int(params, x_slot)),
            host.variables().value(param_int(params, y_slot)),
        )
    }
}

impl Interpreter {
    pub(super) fn transfer_player(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.party().in_battle() || host.message().is_busy() {
            return false;
        }
        let (map_id, x, y) = if param_int(params, 0) == 0 {
            (
                param_int(params, 1),
                param_int(params, 2),
                param_int(params, 3),
            )
        } else {
            (
                host.variables().value(param_int(params, 1)),
                host.variables().value(param_int(params, 2)),
                host.variables().value(param_int(params, 3)),
            )
        };
        host.player()
            .reserve_transfer(map_id, x, y, param_int(params, 4), param_int(params, 5));
        self.set_wait_mode(WaitMode::Transfer);
        true
    }

    pub(super) fn set_vehicle_location(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let (map_id, x, y) = if param_int(params, 1) == 0 {
            (
                param_int(params, 2),
                param_int(params, 3),
                param_int(params, 4),
            )
        } else {
            (
                host.variables().value(param_int(params, 2)),
                host.variables().value(param_int(params, 3)),
                host.variables().value(param_int(params, 4)),
            )
        };
        host.map()
            .set_vehicle_location(param_int(params, 0), map_id, x, y);
        true
    }

    pub(super) fn set_event_location(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if let Some(target) = self.resolve_character(host, param_int(params, 0)) {
            match param_int(params, 1) {
                0 | 1 => {
                    let (x, y) = coordinate_pair(host, params, 1);
                    host.characters().locate(target, x, y);
                }
                _ => {
                    if let Some(other) = self.resolve_character(host, param_int(params, 2)) {
                        host.characters().swap(target, other);
                    }
                }
            }
            let direction = param_int(params, 4);
            if direction > 0 {
                host.characters().set_direction(target, direction);
            }
        }
        true
    }

    /// Starts a map scroll; a scroll already in flight defers this command
    /// to the next tick.
    pub(super) fn scroll_map(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if !host.party().in_battle() {
            if host.map().is_scrolling() {
                self.set_wait_mode(WaitMode::Scroll);
                return false;
            }
            host.map().start_scroll(
                param_int(params, 0),
                param_int(params, 1),
                param_int(params, 2),
            );
            if param_flag(params, 3) {
                self.set_wait_mode(WaitMode::Scroll);
            }
        }
        true
    }

    pub(super) fn set_movement_route(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.map().refresh_if_needed();
        let selector = param_int(params, 0);
        if let Some(target) = self.resolve_character(host, selector) {
            let route = MoveRoute::from_param(params.get(1).unwrap_or(&ParamValue::Null));
            host.characters().force_move_route(target, &route);
            if route.wait {
                self.set_wait_mode(WaitMode::Route(selector));
            }
        }
        true
    }

    pub(super) fn get_on_off_vehicle(&mut self, host: &mut dyn Host) -> bool {
        host.player().get_on_off_vehicle();
        true
    }

    pub(super) fn change_transparency(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.player().set_transparent(param_int(params, 0) == 0);
        true
    }

    pub(super) fn show_animation(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let selector = param_int(params, 0);
        if let Some(target) = self.resolve_character(host, selector) {
            host.characters()
                .request_animation(&[target], param_int(params, 1));
            if param_flag(params, 2) {
                self.set_wait_mode(WaitMode::Animation(selector));
            }
        }
        true
    }

    pub(super) fn show_balloon(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let selector = param_int(params, 0);
        if let Some(target) = self.resolve_character(host, selector) {
            host.characters()
                .request_balloon(target, param_int(params, 1));
            if param_flag(params, 2) {
                self.set_wait_mode(WaitMode::Balloon(selector));
            }
        }
        true
    }

    pub(super) fn erase_event(&mut self, host: &mut dyn Host) -> bool {
        if self.is_on_current_map(host) && self.event_id > 0 {
            host.map().erase_event(self.event_id);
        }
        true
    }

    pub(super) fn change_followers(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.player().set_followers_visible(param_int(params, 0) == 0);
        host.player().refresh();
        true
    }

    pub(super) fn gather_followers(&mut self, host: &mut dyn Host) -> bool {
        if !host.party().in_battle() {
            host.player().gather_followers();
            self.set_wait_mode(WaitMode::Gather);
        }
        true
    }

    pub(super) fn fadeout_screen(&mut self, host: &mut dyn Host) -> bool {
        if host.message().is_busy() {
            return false;
        }
        host.screen().start_fade_out(FADE_FRAMES);
        self.wait(FADE_FRAMES);
        true
    }

    pub(super) fn fadein_screen(&mut self, host: &mut dyn Host) -> bool {
        if host.message().is_busy() {
            return false;
        }
        host.screen().start_fade_in(FADE_FRAMES);
        self.wait(FADE_FRAMES);
        true
    }

    pub(super) fn tint_screen(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let tone = params.first().cloned().unwrap_or(ParamValue::Null);
        let frames = param_int(params, 1);
        host.screen().start_tint(&tone, frames);
        if param_flag(params, 2) {
            self.wait(frames);
        }
        true
    }

    pub(super) fn flash_screen(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let color = params.first().cloned().unwrap_or(ParamValue::Null);
        let frames = param_int(params, 1);
        host.screen().start_flash(&color, frames);
        if param_flag(params, 2) {
            self.wait(frames);
        }
        true
    }

    pub(super) fn shake_screen(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let frames = param_int(params, 2);
        host.screen()
            .start_shake(param_int(params, 0), param_int(params, 1), frames);
        if param_flag(params, 3) {
            self.wait(frames);
        }
        true
    }

    pub(super) fn wait_frames(&mut self, params: &[ParamValue]) -> bool {
        self.wait(param_int(params, 0));
        true
    }

    pub(super) fn show_picture(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let (x, y) = coordinate_pair(host, params, 3);
        host.screen().show_picture(
            param_int(params, 0),
            param_str(params, 1),
            param_int(params, 2),
            x,
            y,
            param_int(params, 6),
            param_int(params, 7),
            param_int(params, 8),
            param_int(params, 9),
        );
        true
    }

    pub(super) fn move_picture(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let (x, y) = coordinate_pair(host, params, 3);
        let duration = param_int(params, 10);
        host.screen().move_picture(
            param_int(params, 0),
            param_int(params, 2),
            x,
            y,
            param_int(params, 6),
            param_int(params, 7),
            param_int(params, 8),
            param_int(params, 9),
            duration,
            param_int(params, 12),
        );
        if param_flag(params, 11) {
            self.wait(duration);
        }
        true
    }

    pub(super) fn rotate_picture(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.screen()
            .rotate_picture(param_int(params, 0), param_int(params, 1));
        true
    }

    pub(super) fn tint_picture(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let tone = params.get(1).cloned().unwrap_or(ParamValue::Null);
        let duration = param_int(params, 2);
        host.screen()
            .tint_picture(param_int(params, 0), &tone, duration);
        if param_flag(params, 3) {
            self.wait(duration);
        }
        true
    }

    pub(super) fn erase_picture(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.screen().erase_picture(param_int(params, 0));
        true
    }

    pub(super) fn set_weather(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if !host.party().in_battle() {
            let frames = param_int(params, 2);
            host.screen()
                .change_weather(param_str(params, 0), param_int(params, 1), frames);
            if param_flag(params, 3) {
                self.wait(frames);
            }
        }
        true
    }

    pub(super) fn play_bgm(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let bgm = AudioRequest::from_param(params.first().unwrap_or(&ParamValue::Null));
        host.audio().play_bgm(&bgm);
        true
    }

    pub(super) fn fadeout_bgm(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.audio().fade_out_bgm(param_int(params, 0));
        true
    }

    pub(super) fn save_bgm(&mut self, host: &mut dyn Host) -> bool {
        host.audio().save_bgm();
        true
    }

    pub(super) fn resume_bgm(&mut self, host: &mut dyn Host) -> bool {
        host.audio().replay_bgm();
        true
    }

    pub(super) fn play_bgs(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let bgs = AudioRequest::from_param(params.first().unwrap_or(&ParamValue::Null));
        host.audio().play_bgs(&bgs);
        true
    }

    pub(super) fn fadeout_bgs(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.audio().fade_out_bgs(param_int(params, 0));
        true
    }

    pub(super) fn play_me(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let me = AudioRequest::from_param(params.first().unwrap_or(&ParamValue::Null));
        host.audio().play_me(&me);
        true
    }

    pub(super) fn play_se(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let se = AudioRequest::from_param(params.first().unwrap_or(&ParamValue::Null));
        host.audio().play_se(&se);
        true
    }

    pub(super) fn stop_se(&mut self, host: &mut dyn Host) -> bool {
        host.audio().stop_se();
        true
    }

    pub(super) fn play_movie(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if host.message().is_busy() {
            return false;
        }
        let name = param_str(params, 0);
        if !name.is_empty() {
            host.scene().play_video(name);
            self.set_wait_mode(WaitMode::Video);
        }
        true
    }

    pub(super) fn change_map_name_display(
        &mut self,
        host: &mut dyn Host,
        params: &[ParamValue],
    ) -> bool {
        host.map().set_name_display(param_int(params, 0) == 0);
        true
    }

    pub(super) fn change_battleback(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.map()
            .change_battleback(param_str(params, 0), param_str(params, 1));
        true
    }

    pub(super) fn change_parallax(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        host.map().change_parallax(
            param_str(params, 0),
            param_flag(params, 1),
            param_flag(params, 2),
            param_int(params, 3),
            param_int(params, 4),
        );
        true
    }

    pub(super) fn get_location_info(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let (x, y) = match param_int(params, 2) {
            0 | 1 => coordinate_pair(host, params, 2),
            _ => self
                .resolve_character(host, param_int(params, 3))
                .map(|target| host.characters().position(target))
                .unwrap_or((0, 0)),
        };
        let value = match param_int(params, 1) {
            0 => host.map().terrain_tag(x, y),
            1 => host.map().event_id_xy(x, y),
            layer @ 2..=5 => host.map().tile_id(x, y, layer - 2),
            _ => host.map().region_id(x, y),
        };
        host.variables().set_value(param_int(params, 0), value);
        true
    }

    /// Arms a battle: resolves the troop, hands the result callback to the
    /// battle collaborator, and pushes the battle scene. The 601/602/603
    /// continuations read the recorded result index.
    pub(super) fn battle_processing(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if !host.party().in_battle() {
            let troop_id = match param_int(params, 0) {
                0 => param_int(params, 1),
                1 => host.variables().value(param_int(params, 1)),
                _ => host.player().make_encounter_troop_id(),
            };
            if host.battle().troop_exists(troop_id) {
                let callback = self.branch_writer(self.indent);
                host.battle().setup_battle(
                    troop_id,
                    param_flag(params, 2),
                    param_flag(params, 3),
                    callback,
                );
                host.player().make_encounter_count();
                host.scene().push(SceneRequest::Battle);
            }
        }
        true
    }

    pub(super) fn shop_processing(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        if !host.party().in_battle() {
            let mut goods = vec![params.to_vec()];
            while self.next_event_code() == codes::SHOP_GOODS_LINE {
                self.index += 1;
                if let Some(command) = self.current_command() {
                    goods.push(command.parameters.clone());
                }
            }
            host.scene().push(SceneRequest::Shop {
                goods,
                purchase_only: param_flag(params, 4),
            });
        }
        true
    }

    pub(super) fn name_input(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let actor_id = param_int(params, 0);
        if !host.party().in_battle() && host.actors().actor(actor_id).is_some() {
            host.scene().push(SceneRequest::NameInput {
                actor_id,
                max_chars: param_int(params, 1),
            });
        }
        true
    }

    pub(super) fn open_menu(&mut self, host: &mut dyn Host) -> bool {
        if !host.party().in_battle() {
            host.scene().push(SceneRequest::Menu);
        }
        true
    }

    pub(super) fn open_save(&mut self, host: &mut dyn Host) -> bool {
        if !host.party().in_battle() {
            host.scene().push(SceneRequest::Save);
        }
        true
    }

    pub(super) fn game_over(&mut self, host: &mut dyn Host) -> bool {
        host.scene().goto(SceneRequest::GameOver);
        true
    }

    pub(super) fn return_to_title(&mut self, host: &mut dyn Host) -> bool {
        host.scene().goto(SceneRequest::Title);
        true
    }

    /// Evaluates an authored script block line by line, discarding the
    /// results. A line that fails to evaluate is logged and skipped.
    pub(super) fn run_script(&mut self, host: &mut dyn Host) -> bool {
        let mut lines = vec![self
            .current_command()
            .map(|command| param_str(&command.parameters, 0).to_string())
            .unwrap_or_default()];
        while self.next_event_code() == codes::SCRIPT_LINE {
            self.index += 1;
            if let Some(command) = self.current_command() {
                lines.push(param_str(&command.parameters, 0).to_string());
            }
        }
        for line in &lines {
            if line.trim().is_empty() {
                continue;
            }
            if let Err(error) = expr::eval(line, host) {
                warn!("script line {line:?} failed ({error}), skipping");
            }
        }
        true
    }

    pub(super) fn plugin_command(&mut self, host: &mut dyn Host, params: &[ParamValue]) -> bool {
        let args = params.get(3).cloned().unwrap_or(ParamValue::Null);
        host.plugins()
            .call(param_str(params, 0), param_str(params, 1), &args);
        true
    }
}
