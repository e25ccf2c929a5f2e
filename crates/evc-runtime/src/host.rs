//! Capability traits the interpreter calls into. The engine owns none of
//! the game state; every mutation and every wait predicate goes through
//! one of these collaborator interfaces.

use evc_core::{
    AudioRequest, BattlerRef, CharacterRef, ChoiceSetup, CommandList, ItemKind, MoveRoute,
    ParamValue, SceneRequest, SelfSwitchKey, TextHeader,
};

/// Completion callback for an asynchronous multi-way decision (a choice
/// prompt or a battle result). Invoked once, with the selected index.
pub type IndexCallback = Box<dyn FnOnce(i64)>;

/// Message box: text, choices, number input, item choice.
pub trait MessageSink {
    fn is_busy(&self) -> bool;
    fn begin_message(&mut self, header: &TextHeader);
    fn add(&mut self, line: &str);
    fn set_scroll(&mut self, speed: i64, no_fast: bool);
    fn show_choices(&mut self, setup: ChoiceSetup, callback: IndexCallback);
    fn set_number_input(&mut self, variable_id: i64, max_digits: i64);
    fn set_item_choice(&mut self, variable_id: i64, item_type_id: i64);
}

/// Global switch bank. Range checking is the store's concern.
pub trait SwitchStore {
    fn value(&self, id: i64) -> bool;
    fn set_value(&mut self, id: i64, value: bool);
}

/// Global variable bank. Range checking is the store's concern.
pub trait VariableStore {
    fn value(&self, id: i64) -> i64;
    fn set_value(&mut self, id: i64, value: i64);
}

pub trait SelfSwitchStore {
    fn value(&self, key: &SelfSwitchKey) -> bool;
    fn set_value(&mut self, key: &SelfSwitchKey, on: bool);
}

pub trait TimerControl {
    fn is_working(&self) -> bool;
    fn frames(&self) -> i64;
    fn start(&mut self, frames: i64);
    fn stop(&mut self);
}

/// Party roster, inventory and purse.
pub trait PartyOps {
    fn in_battle(&self) -> bool;
    fn gold(&self) -> i64;
    fn gain_gold(&mut self, amount: i64);
    fn steps(&self) -> i64;
    fn size(&self) -> usize;
    fn member_actor_ids(&self) -> Vec<i64>;
    fn has_item(&self, kind: ItemKind, id: i64, include_equip: bool) -> bool;
    fn item_count(&self, kind: ItemKind, id: i64) -> i64;
    fn gain_item(&mut self, kind: ItemKind, id: i64, amount: i64, include_equip: bool);
    fn add_actor(&mut self, actor_id: i64, initialize: bool);
    fn remove_actor(&mut self, actor_id: i64);
}

/// The stat surface shared by actors and enemies. The interpreter resolves
/// a designer selector to targets and applies one mutation per target.
pub trait Battler {
    fn hp(&self) -> i64;
    fn mp(&self) -> i64;
    fn tp(&self) -> i64;
    fn param(&self, param_id: i64) -> i64;
    fn is_alive(&self) -> bool;
    fn is_dead(&self) -> bool;
    fn is_death_state_affected(&self) -> bool;
    fn is_state_affected(&self, state_id: i64) -> bool;
    fn gain_hp(&mut self, amount: i64);
    fn gain_mp(&mut self, amount: i64);
    fn gain_tp(&mut self, amount: i64);
    fn add_state(&mut self, state_id: i64);
    fn remove_state(&mut self, state_id: i64);
    fn recover_all(&mut self);
    fn perform_collapse(&mut self);
    fn clear_result(&mut self);
    fn force_action(&mut self, skill_id: i64, target_index: i64);
}

pub trait ActorOps: Battler {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: &str);
    fn set_nickname(&mut self, nickname: &str);
    fn set_profile(&mut self, profile: &str);
    fn level(&self) -> i64;
    fn change_level(&mut self, level: i64, show: bool);
    fn current_exp(&self) -> i64;
    fn change_exp(&mut self, exp: i64, show: bool);
    fn add_param(&mut self, param_id: i64, amount: i64);
    fn has_skill(&self, skill_id: i64) -> bool;
    fn learn_skill(&mut self, skill_id: i64);
    fn forget_skill(&mut self, skill_id: i64);
    fn change_equip(&mut self, slot_id: i64, item_id: i64);
    fn class_id(&self) -> i64;
    fn change_class(&mut self, class_id: i64, keep_exp: bool);
    fn has_weapon(&self, weapon_id: i64) -> bool;
    fn has_armor(&self, armor_id: i64) -> bool;
}

pub trait EnemyOps: Battler {
    fn appear(&mut self);
    fn transform(&mut self, enemy_id: i64);
}

pub trait ActorStore {
    fn actor(&self, actor_id: i64) -> Option<&dyn ActorOps>;
    fn actor_mut(&mut self, actor_id: i64) -> Option<&mut dyn ActorOps>;
}

/// The enemy side of the active battle, indexed by troop position.
pub trait TroopOps {
    fn enemy_count(&self) -> usize;
    fn enemy(&self, index: usize) -> Option<&dyn EnemyOps>;
    fn enemy_mut(&mut self, index: usize) -> Option<&mut dyn EnemyOps>;
    fn request_animation(&mut self, targets: &[usize], animation_id: i64);
    fn make_unique_names(&mut self);
}

/// Map grid queries, scrolling, and map-owned cosmetics.
pub trait MapOps {
    fn is_scrolling(&self) -> bool;
    fn start_scroll(&mut self, direction: i64, distance: i64, speed: i64);
    fn refresh_if_needed(&mut self);
    fn erase_event(&mut self, event_id: i64);
    fn terrain_tag(&self, x: i64, y: i64) -> i64;
    fn event_id_xy(&self, x: i64, y: i64) -> i64;
    fn tile_id(&self, x: i64, y: i64, layer: i64) -> i64;
    fn region_id(&self, x: i64, y: i64) -> i64;
    fn set_name_display(&mut self, visible: bool);
    fn change_battleback(&mut self, name1: &str, name2: &str);
    fn change_parallax(&mut self, name: &str, loop_x: bool, loop_y: bool, sx: i64, sy: i64);
    fn set_vehicle_location(&mut self, vehicle_id: i64, map_id: i64, x: i64, y: i64);
    fn set_vehicle_bgm(&mut self, vehicle_id: i64, bgm: &AudioRequest);
}

/// The player character: transfer, vehicles, followers, encounters.
pub trait PlayerOps {
    fn is_transferring(&self) -> bool;
    fn reserve_transfer(&mut self, map_id: i64, x: i64, y: i64, direction: i64, fade_type: i64);
    fn vehicle(&self) -> Option<i64>;
    fn get_on_off_vehicle(&mut self);
    fn set_transparent(&mut self, transparent: bool);
    fn set_followers_visible(&mut self, visible: bool);
    fn refresh(&mut self);
    fn gather_followers(&mut self);
    fn are_followers_gathering(&self) -> bool;
    fn make_encounter_count(&mut self);
    fn make_encounter_troop_id(&mut self) -> i64;
}

/// Per-character movement, animation and balloon control. All methods take
/// an already-resolved [`CharacterRef`]; resolution against the owning
/// event is the interpreter's job.
pub trait CharacterControl {
    fn direction(&self, target: CharacterRef) -> i64;
    fn position(&self, target: CharacterRef) -> (i64, i64);
    fn screen_position(&self, target: CharacterRef) -> (i64, i64);
    fn locate(&mut self, target: CharacterRef, x: i64, y: i64);
    fn swap(&mut self, first: CharacterRef, second: CharacterRef);
    fn set_direction(&mut self, target: CharacterRef, direction: i64);
    fn force_move_route(&mut self, target: CharacterRef, route: &MoveRoute);
    fn is_move_route_forcing(&self, target: CharacterRef) -> bool;
    fn request_animation(&mut self, targets: &[CharacterRef], animation_id: i64);
    fn is_animation_playing(&self, target: CharacterRef) -> bool;
    fn request_balloon(&mut self, target: CharacterRef, balloon_id: i64);
    fn is_balloon_playing(&self, target: CharacterRef) -> bool;
}

/// Screen effects and pictures. Tones and colors are passed through as
/// authored; the interpreter does not interpret them.
pub trait ScreenOps {
    fn start_fade_out(&mut self, frames: i64);
    fn start_fade_in(&mut self, frames: i64);
    fn start_tint(&mut self, tone: &ParamValue, frames: i64);
    fn start_flash(&mut self, color: &ParamValue, frames: i64);
    fn start_shake(&mut self, power: i64, speed: i64, frames: i64);
    fn change_weather(&mut self, kind: &str, power: i64, frames: i64);
    #[allow(clippy::too_many_arguments)]
    fn show_picture(
        &mut self,
        id: i64,
        name: &str,
        origin: i64,
        x: i64,
        y: i64,
        scale_x: i64,
        scale_y: i64,
        opacity: i64,
        blend_mode: i64,
    );
    #[allow(clippy::too_many_arguments)]
    fn move_picture(
        &mut self,
        id: i64,
        origin: i64,
        x: i64,
        y: i64,
        scale_x: i64,
        scale_y: i64,
        opacity: i64,
        blend_mode: i64,
        duration: i64,
        easing: i64,
    );
    fn rotate_picture(&mut self, id: i64, speed: i64);
    fn tint_picture(&mut self, id: i64, tone: &ParamValue, duration: i64);
    fn erase_picture(&mut self, id: i64);
}

pub trait AudioOps {
    fn play_bgm(&mut self, bgm: &AudioRequest);
    fn fade_out_bgm(&mut self, seconds: i64);
    fn save_bgm(&mut self);
    fn replay_bgm(&mut self);
    fn play_bgs(&mut self, bgs: &AudioRequest);
    fn fade_out_bgs(&mut self, seconds: i64);
    fn play_me(&mut self, me: &AudioRequest);
    fn play_se(&mut self, se: &AudioRequest);
    fn stop_se(&mut self);
}

/// Engine-wide settings and counters the interpreter reads or flips.
pub trait SystemOps {
    fn set_battle_bgm(&mut self, bgm: &AudioRequest);
    fn set_victory_me(&mut self, me: &AudioRequest);
    fn set_defeat_me(&mut self, me: &AudioRequest);
    fn set_save_enabled(&mut self, enabled: bool);
    fn set_menu_enabled(&mut self, enabled: bool);
    fn set_encounter_enabled(&mut self, enabled: bool);
    fn set_formation_enabled(&mut self, enabled: bool);
    fn set_window_tone(&mut self, tone: &ParamValue);
    fn playtime_seconds(&self) -> i64;
    fn save_count(&self) -> i64;
    fn battle_count(&self) -> i64;
    fn win_count(&self) -> i64;
    fn escape_count(&self) -> i64;
}

/// Entry gate to the turn-based battle collaborator. The interpreter never
/// resolves battles; it only arms them and learns the outcome through the
/// result callback.
pub trait BattleGate {
    fn is_action_forced(&self) -> bool;
    fn troop_exists(&self, troop_id: i64) -> bool;
    fn setup_battle(&mut self, troop_id: i64, can_escape: bool, can_lose: bool, on_result: IndexCallback);
    fn request_forced_action(&mut self, target: BattlerRef);
    fn abort(&mut self);
}

/// Presentation scene stack and long-running media.
pub trait SceneGate {
    fn is_changing(&self) -> bool;
    fn push(&mut self, request: SceneRequest);
    fn goto(&mut self, request: SceneRequest);
    fn play_video(&mut self, name: &str);
    fn is_video_playing(&self) -> bool;
    fn is_image_loading(&self) -> bool {
        false
    }
}

pub trait InputState {
    fn is_pressed(&self, button: &str) -> bool;
    fn is_triggered(&self, button: &str) -> bool;
    fn is_repeated(&self, button: &str) -> bool;
}

/// Opaque plugin command dispatch; the interpreter never interprets the
/// argument bag.
pub trait PluginRegistry {
    fn call(&mut self, plugin_name: &str, command_name: &str, args: &ParamValue);
}

/// The aggregate the interpreter runs against: one accessor per
/// collaborator, plus the ambient queries that belong to no single one.
pub trait Host {
    /// Monotonic host frame counter; drives the freeze watchdog.
    fn frame_count(&self) -> u64;
    /// Id of the currently loaded map.
    fn map_id(&self) -> i64;
    /// Looks up a globally defined instruction stream by id.
    fn common_event(&self, id: i64) -> Option<CommandList>;

    fn message(&mut self) -> &mut dyn MessageSink;
    fn switches(&mut self) -> &mut dyn SwitchStore;
    fn variables(&mut self) -> &mut dyn VariableStore;
    fn self_switches(&mut self) -> &mut dyn SelfSwitchStore;
    fn timer(&mut self) -> &mut dyn TimerControl;
    fn party(&mut self) -> &mut dyn PartyOps;
    fn actors(&mut self) -> &mut dyn ActorStore;
    fn troop(&mut self) -> &mut dyn TroopOps;
    fn map(&mut self) -> &mut dyn MapOps;
    fn player(&mut self) -> &mut dyn PlayerOps;
    fn characters(&mut self) -> &mut dyn CharacterControl;
    fn screen(&mut self) -> &mut dyn ScreenOps;
    fn audio(&mut self) -> &mut dyn AudioOps;
    fn system(&mut self) -> &mut dyn SystemOps;
    fn battle(&mut self) -> &mut dyn BattleGate;
    fn scene(&mut self) -> &mut dyn SceneGate;
    fn input(&mut self) -> &mut dyn InputState;
    fn plugins(&mut self) -> &mut dyn PluginRegistry;
}
