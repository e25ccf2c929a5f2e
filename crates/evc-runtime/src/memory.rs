//! An in-memory host: every collaborator backed by plain maps and flags.
//! This is the reference wiring for the interpreter's tests and for the
//! command line runner; an engine embedding the interpreter supplies its
//! own implementations instead.

use std::collections::{BTreeMap, BTreeSet};

use evc_core::{
    AudioRequest, BattlerRef, CharacterRef, ChoiceSetup, CommandList, ItemKind, MoveRoute,
    ParamValue, SceneRequest, SelfSwitchKey, TextHeader,
};

use crate::host::{
    ActorOps, ActorStore, AudioOps, Battler, BattleGate, CharacterControl, EnemyOps, Host,
    IndexCallback, InputState, MapOps, MessageSink, PartyOps, PlayerOps, PluginRegistry, SceneGate,
    ScreenOps, SelfSwitchStore, SwitchStore, SystemOps, TimerControl, TroopOps, VariableStore,
};

#[derive(Debug, Default)]
pub struct MemorySwitches {
    values: BTreeMap<i64, bool>,
}

impl SwitchStore for MemorySwitches {
    fn value(&self, id: i64) -> bool {
        id > 0 && self.values.get(&id).copied().unwrap_or(false)
    }

    fn set_value(&mut self, id: i64, value: bool) {
        if id > 0 {
            self.values.insert(id, value);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryVariables {
    values: BTreeMap<i64, i64>,
}

impl VariableStore for MemoryVariables {
    fn value(&self, id: i64) -> i64 {
        if id > 0 {
            self.values.get(&id).copied().unwrap_or(0)
        } else {
            0
        }
    }

    fn set_value(&mut self, id: i64, value: i64) {
        if id > 0 {
            self.values.insert(id, value);
        }
    }
}

/// Off entries are dropped rather than stored, so the map holds only the
/// switches that are on.
#[derive(Debug, Default)]
pub struct MemorySelfSwitches {
    values: BTreeSet<SelfSwitchKey>,
}

impl SelfSwitchStore for MemorySelfSwitches {
    fn value(&self, key: &SelfSwitchKey) -> bool {
        self.values.contains(key)
    }

    fn set_value(&mut self, key: &SelfSwitchKey, on: bool) {
        if on {
            self.values.insert(key.clone());
        } else {
            self.values.remove(key);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryTimer {
    pub frames: i64,
    pub working: bool,
}

impl MemoryTimer {
    fn tick(&mut self) {
        if self.working && self.frames > 0 {
            self.frames -= 1;
            if self.frames == 0 {
                self.working = false;
            }
        }
    }
}

impl TimerControl for MemoryTimer {
    fn is_working(&self) -> bool {
        self.working
    }

    fn frames(&self) -> i64 {
        self.frames
    }

    fn start(&mut self, frames: i64) {
        self.frames = frames;
        self.working = true;
    }

    fn stop(&mut self) {
        self.working = false;
    }
}

/// The message window: queued lines plus at most one pending prompt.
/// `resolve_choice` plays the role of the player picking an option.
#[derive(Default)]
pub struct MemoryMessage {
    pub busy: bool,
    pub header: Option<TextHeader>,
    pub lines: Vec<String>,
    pub scroll: Option<(i64, bool)>,
    pub choices: Option<ChoiceSetup>,
    choice_callback: Option<IndexCallback>,
    pub number_input: Option<(i64, i64)>,
    pub item_choice: Option<(i64, i64)>,
}

impl MemoryMessage {
    /// Closes the window without touching any pending prompt callback.
    pub fn close(&mut self) {
        self.busy = false;
    }

    /// Feeds the selected index into the pending choice prompt and closes
    /// the window.
    pub fn resolve_choice(&mut self, selected: i64) {
        if let Some(callback) = self.choice_callback.take() {
            callback(selected);
        }
        self.choices = None;
        self.busy = false;
    }

    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

impl MessageSink for MemoryMessage {
    fn is_busy(&self) -> bool {
        self.busy
    }

    fn begin_message(&mut self, header: &TextHeader) {
        self.header = Some(header.clone());
        self.busy = true;
    }

    fn add(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn set_scroll(&mut self, speed: i64, no_fast: bool) {
        self.scroll = Some((speed, no_fast));
        self.busy = true;
    }

    fn show_choices(&mut self, setup: ChoiceSetup, callback: IndexCallback) {
        self.choices = Some(setup);
        self.choice_callback = Some(callback);
        self.busy = true;
    }

    fn set_number_input(&mut self, variable_id: i64, max_digits: i64) {
        self.number_input = Some((variable_id, max_digits));
        self.busy = true;
    }

    fn set_item_choice(&mut self, variable_id: i64, item_type_id: i64) {
        self.item_choice = Some((variable_id, item_type_id));
        self.busy = true;
    }
}

#[derive(Debug, Default)]
pub struct MemoryParty {
    pub battle: bool,
    pub gold: i64,
    pub steps: i64,
    pub members: Vec<i64>,
    pub inventory: BTreeMap<(ItemKind, i64), i64>,
}

impl PartyOps for MemoryParty {
    fn in_battle(&self) -> bool {
        self.battle
    }

    fn gold(&self) -> i64 {
        self.gold
    }

    fn gain_gold(&mut self, amount: i64) {
        self.gold = (self.gold + amount).max(0);
    }

    fn steps(&self) -> i64 {
        self.steps
    }

    fn size(&self) -> usize {
        self.members.len()
    }

    fn member_actor_ids(&self) -> Vec<i64> {
        self.members.clone()
    }

    fn has_item(&self, kind: ItemKind, id: i64, _include_equip: bool) -> bool {
        self.item_count(kind, id) > 0
    }

    fn item_count(&self, kind: ItemKind, id: i64) -> i64 {
        self.inventory.get(&(kind, id)).copied().unwrap_or(0)
    }

    fn gain_item(&mut self, kind: ItemKind, id: i64, amount: i64, _include_equip: bool) {
        let count = self.inventory.entry((kind, id)).or_insert(0);
        *count = (*count + amount).max(0);
    }

    fn add_actor(&mut self, actor_id: i64, _initialize: bool) {
        if !self.members.contains(&actor_id) {
            self.members.push(actor_id);
        }
    }

    fn remove_actor(&mut self, actor_id: i64) {
        self.members.retain(|&member| member != actor_id);
    }
}

const DEATH_STATE_ID: i64 = 1;

/// One actor sheet. Stat math is deliberately plain: just enough state
/// for the interpreter's mutations to be observable.
#[derive(Debug, Default)]
pub struct MemoryActor {
    pub name: String,
    pub nickname: String,
    pub profile: String,
    pub class_id: i64,
    pub level: i64,
    pub exp: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub mp: i64,
    pub max_mp: i64,
    pub tp: i64,
    pub param_bonus: [i64; 8],
    pub states: BTreeSet<i64>,
    pub skills: BTreeSet<i64>,
    pub equips: BTreeMap<i64, i64>,
    pub collapsed: bool,
}

impl MemoryActor {
    fn refresh_death_state(&mut self) {
        if self.hp == 0 {
            self.states.insert(DEATH_STATE_ID);
        }
    }
}

impl Battler for MemoryActor {
    fn hp(&self) -> i64 {
        self.hp
    }

    fn mp(&self) -> i64 {
        self.mp
    }

    fn tp(&self) -> i64 {
        self.tp
    }

    fn param(&self, param_id: i64) -> i64 {
        let base = match param_id {
            0 => self.max_hp,
            1 => self.max_mp,
            _ => 0,
        };
        let bonus = usize::try_from(param_id)
            .ok()
            .and_then(|index| self.param_bonus.get(index))
            .copied()
            .unwrap_or(0);
        base + bonus
    }

    fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    fn is_dead(&self) -> bool {
        self.states.contains(&DEATH_STATE_ID)
    }

    fn is_death_state_affected(&self) -> bool {
        self.is_dead()
    }

    fn is_state_affected(&self, state_id: i64) -> bool {
        self.states.contains(&state_id)
    }

    fn gain_hp(&mut self, amount: i64) {
        self.hp = (self.hp + amount).clamp(0, self.max_hp);
        self.refresh_death_state();
    }

    fn gain_mp(&mut self, amount: i64) {
        self.mp = (self.mp + amount).clamp(0, self.max_mp);
    }

    fn gain_tp(&mut self, amount: i64) {
        self.tp = (self.tp + amount).clamp(0, 100);
    }

    fn add_state(&mut self, state_id: i64) {
        self.states.insert(state_id);
        if state_id == DEATH_STATE_ID {
            self.hp = 0;
        }
    }

    fn remove_state(&mut self, state_id: i64) {
        if self.states.remove(&state_id) && state_id == DEATH_STATE_ID {
            self.hp = self.hp.max(1);
        }
    }

    fn recover_all(&mut self) {
        self.states.clear();
        self.hp = self.max_hp;
        self.mp = self.max_mp;
    }

    fn perform_collapse(&mut self) {
        self.collapsed = true;
    }

    fn clear_result(&mut self) {}

    fn force_action(&mut self, _skill_id: i64, _target_index: i64) {}
}

impl ActorOps for MemoryActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn set_nickname(&mut self, nickname: &str) {
        self.nickname = nickname.to_string();
    }

    fn set_profile(&mut self, profile: &str) {
        self.profile = profile.to_string();
    }

    fn level(&self) -> i64 {
        self.level
    }

    fn change_level(&mut self, level: i64, _show: bool) {
        self.level = level.max(1);
    }

    fn current_exp(&self) -> i64 {
        self.exp
    }

    fn change_exp(&mut self, exp: i64, _show: bool) {
        self.exp = exp.max(0);
    }

    fn add_param(&mut self, param_id: i64, amount: i64) {
        if let Some(bonus) = usize::try_from(param_id)
            .ok()
            .and_then(|index| self.param_bonus.get_mut(index))
        {
            *bonus += amount;
        }
        if param_id == 0 {
            self.max_hp = (self.max_hp + amount).max(1);
            self.hp = self.hp.min(self.max_hp);
        }
    }

    fn has_skill(&self, skill_id: i64) -> bool {
        self.skills.contains(&skill_id)
    }

    fn learn_skill(&mut self, skill_id: i64) {
        self.skills.insert(skill_id);
    }

    fn forget_skill(&mut self, skill_id: i64) {
        self.skills.remove(&skill_id);
    }

    fn change_equip(&mut self, slot_id: i64, item_id: i64) {
        if item_id == 0 {
            self.equips.remove(&slot_id);
        } else {
            self.equips.insert(slot_id, item_id);
        }
    }

    fn class_id(&self) -> i64 {
        self.class_id
    }

    fn change_class(&mut self, class_id: i64, keep_exp: bool) {
        self.class_id = class_id;
        if !keep_exp {
            self.exp = 0;
        }
    }

    fn has_weapon(&self, weapon_id: i64) -> bool {
        self.equips.get(&1) == Some(&weapon_id)
    }

    fn has_armor(&self, armor_id: i64) -> bool {
        self.equips
            .iter()
            .any(|(&slot, &item)| slot > 1 && item == armor_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryActors {
    pub entries: BTreeMap<i64, MemoryActor>,
}

impl MemoryActors {
    pub fn insert_test_actor(&mut self, actor_id: i64, name: &str, hp: i64, mp: i64) {
        self.entries.insert(
            actor_id,
            MemoryActor {
                name: name.to_string(),
                class_id: 1,
                level: 1,
                hp,
                max_hp: hp,
                mp,
                max_mp: mp,
                ..MemoryActor::default()
            },
        );
    }
}

impl ActorStore for MemoryActors {
    fn actor(&self, actor_id: i64) -> Option<&dyn ActorOps> {
        self.entries.get(&actor_id).map(|actor| actor as &dyn ActorOps)
    }

    fn actor_mut(&mut self, actor_id: i64) -> Option<&mut dyn ActorOps> {
        self.entries
            .get_mut(&actor_id)
            .map(|actor| actor as &mut dyn ActorOps)
    }
}

#[derive(Debug, Default)]
pub struct MemoryEnemy {
    pub enemy_id: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub mp: i64,
    pub max_mp: i64,
    pub tp: i64,
    pub hidden: bool,
    pub states: BTreeSet<i64>,
    pub collapsed: bool,
}

impl Battler for MemoryEnemy {
    fn hp(&self) -> i64 {
        self.hp
    }

    fn mp(&self) -> i64 {
        self.mp
    }

    fn tp(&self) -> i64 {
        self.tp
    }

    fn param(&self, param_id: i64) -> i64 {
        match param_id {
            0 => self.max_hp,
            1 => self.max_mp,
            _ => 0,
        }
    }

    fn is_alive(&self) -> bool {
        !self.hidden && !self.is_dead()
    }

    fn is_dead(&self) -> bool {
        self.states.contains(&DEATH_STATE_ID)
    }

    fn is_death_state_affected(&self) -> bool {
        self.is_dead()
    }

    fn is_state_affected(&self, state_id: i64) -> bool {
        self.states.contains(&state_id)
    }

    fn gain_hp(&mut self, amount: i64) {
        self.hp = (self.hp + amount).clamp(0, self.max_hp);
        if self.hp == 0 {
            self.states.insert(DEATH_STATE_ID);
        }
    }

    fn gain_mp(&mut self, amount: i64) {
        self.mp = (self.mp + amount).clamp(0, self.max_mp);
    }

    fn gain_tp(&mut self, amount: i64) {
        self.tp = (self.tp + amount).clamp(0, 100);
    }

    fn add_state(&mut self, state_id: i64) {
        self.states.insert(state_id);
        if state_id == DEATH_STATE_ID {
            self.hp = 0;
        }
    }

    fn remove_state(&mut self, state_id: i64) {
        if self.states.remove(&state_id) && state_id == DEATH_STATE_ID {
            self.hp = self.hp.max(1);
        }
    }

    fn recover_all(&mut self) {
        self.states.clear();
        self.hp = self.max_hp;
        self.mp = self.max_mp;
    }

    fn perform_collapse(&mut self) {
        self.collapsed = true;
    }

    fn clear_result(&mut self) {}

    fn force_action(&mut self, _skill_id: i64, _target_index: i64) {}
}

impl EnemyOps for MemoryEnemy {
    fn appear(&mut self) {
        self.hidden = false;
    }

    fn transform(&mut self, enemy_id: i64) {
        self.enemy_id = enemy_id;
    }
}

#[derive(Debug, Default)]
pub struct MemoryTroop {
    pub enemies: Vec<MemoryEnemy>,
    pub animations: Vec<(Vec<usize>, i64)>,
    pub unique_name_passes: u32,
}

impl MemoryTroop {
    pub fn push_test_enemy(&mut self, enemy_id: i64, hp: i64, mp: i64) {
        self.enemies.push(MemoryEnemy {
            enemy_id,
            hp,
            max_hp: hp,
            mp,
            max_mp: mp,
            ..MemoryEnemy::default()
        });
    }
}

impl TroopOps for MemoryTroop {
    fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    fn enemy(&self, index: usize) -> Option<&dyn EnemyOps> {
        self.enemies.get(index).map(|enemy| enemy as &dyn EnemyOps)
    }

    fn enemy_mut(&mut self, index: usize) -> Option<&mut dyn EnemyOps> {
        self.enemies
            .get_mut(index)
            .map(|enemy| enemy as &mut dyn EnemyOps)
    }

    fn request_animation(&mut self, targets: &[usize], animation_id: i64) {
        self.animations.push((targets.to_vec(), animation_id));
    }

    fn make_unique_names(&mut self) {
        self.unique_name_passes += 1;
    }
}

#[derive(Debug, Default)]
pub struct MemoryMap {
    pub scroll_remaining: i64,
    pub erased_events: BTreeSet<i64>,
    pub needs_refresh: bool,
    pub refreshes: u32,
    pub name_display: bool,
    pub battleback: Option<(String, String)>,
    pub parallax: Option<String>,
    pub terrain: BTreeMap<(i64, i64), i64>,
    pub regions: BTreeMap<(i64, i64), i64>,
    pub tiles: BTreeMap<(i64, i64, i64), i64>,
    pub events_at: BTreeMap<(i64, i64), i64>,
    pub vehicle_locations: BTreeMap<i64, (i64, i64, i64)>,
    pub vehicle_bgms: BTreeMap<i64, AudioRequest>,
}

impl MemoryMap {
    fn tick(&mut self) {
        if self.scroll_remaining > 0 {
            self.scroll_remaining -= 1;
        }
    }
}

impl MapOps for MemoryMap {
    fn is_scrolling(&self) -> bool {
        self.scroll_remaining > 0
    }

    fn start_scroll(&mut self, _direction: i64, distance: i64, _speed: i64) {
        self.scroll_remaining = distance.max(0);
    }

    fn refresh_if_needed(&mut self) {
        if self.needs_refresh {
            self.needs_refresh = false;
            self.refreshes += 1;
        }
    }

    fn erase_event(&mut self, event_id: i64) {
        self.erased_events.insert(event_id);
    }

    fn terrain_tag(&self, x: i64, y: i64) -> i64 {
        self.terrain.get(&(x, y)).copied().unwrap_or(0)
    }

    fn event_id_xy(&self, x: i64, y: i64) -> i64 {
        self.events_at.get(&(x, y)).copied().unwrap_or(0)
    }

    fn tile_id(&self, x: i64, y: i64, layer: i64) -> i64 {
        self.tiles.get(&(x, y, layer)).copied().unwrap_or(0)
    }

    fn region_id(&self, x: i64, y: i64) -> i64 {
        self.regions.get(&(x, y)).copied().unwrap_or(0)
    }

    fn set_name_display(&mut self, visible: bool) {
        self.name_display = visible;
    }

    fn change_battleback(&mut self, name1: &str, name2: &str) {
        self.battleback = Some((name1.to_string(), name2.to_string()));
    }

    fn change_parallax(&mut self, name: &str, _loop_x: bool, _loop_y: bool, _sx: i64, _sy: i64) {
        self.parallax = Some(name.to_string());
    }

    fn set_vehicle_location(&mut self, vehicle_id: i64, map_id: i64, x: i64, y: i64) {
        self.vehicle_locations.insert(vehicle_id, (map_id, x, y));
    }

    fn set_vehicle_bgm(&mut self, vehicle_id: i64, bgm: &AudioRequest) {
        self.vehicle_bgms.insert(vehicle_id, bgm.clone());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub map_id: i64,
    pub x: i64,
    pub y: i64,
    pub direction: i64,
    pub fade_type: i64,
}

#[derive(Debug, Default)]
pub struct MemoryPlayer {
    pub pending_transfer: Option<TransferRequest>,
    pub transparent: bool,
    pub followers_visible: bool,
    pub gathering: bool,
    pub vehicle: Option<i64>,
    pub refreshes: u32,
    pub encounter_counts_made: u32,
    pub encounter_troop_id: i64,
}

impl PlayerOps for MemoryPlayer {
    fn is_transferring(&self) -> bool {
        self.pending_transfer.is_some()
    }

    fn reserve_transfer(&mut self, map_id: i64, x: i64, y: i64, direction: i64, fade_type: i64) {
        self.pending_transfer = Some(TransferRequest {
            map_id,
            x,
            y,
            direction,
            fade_type,
        });
    }

    fn vehicle(&self) -> Option<i64> {
        self.vehicle
    }

    fn get_on_off_vehicle(&mut self) {
        self.vehicle = match self.vehicle {
            Some(_) => None,
            None => Some(0),
        };
    }

    fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    fn set_followers_visible(&mut self, visible: bool) {
        self.followers_visible = visible;
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }

    fn gather_followers(&mut self) {
        self.gathering = true;
    }

    fn are_followers_gathering(&self) -> bool {
        self.gathering
    }

    fn make_encounter_count(&mut self) {
        self.encounter_counts_made += 1;
    }

    fn make_encounter_troop_id(&mut self) -> i64 {
        self.encounter_troop_id
    }
}

#[derive(Debug, Clone)]
pub struct CharacterState {
    pub x: i64,
    pub y: i64,
    pub direction: i64,
    pub route: Option<MoveRoute>,
    pub route_forcing: bool,
    pub animation_playing: bool,
    pub balloon_playing: bool,
    pub balloons: Vec<i64>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            direction: 2,
            route: None,
            route_forcing: false,
            animation_playing: false,
            balloon_playing: false,
            balloons: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCharacters {
    pub player: CharacterState,
    pub events: BTreeMap<i64, CharacterState>,
    pub animations: Vec<(Vec<CharacterRef>, i64)>,
}

impl MemoryCharacters {
    pub fn state(&self, target: CharacterRef) -> CharacterState {
        match target {
            CharacterRef::Player => self.player.clone(),
            CharacterRef::Event(id) => self.events.get(&id).cloned().unwrap_or_default(),
        }
    }

    pub fn state_mut(&mut self, target: CharacterRef) -> &mut CharacterState {
        match target {
            CharacterRef::Player => &mut self.player,
            CharacterRef::Event(id) => self.events.entry(id).or_default(),
        }
    }
}

impl CharacterControl for MemoryCharacters {
    fn direction(&self, target: CharacterRef) -> i64 {
        self.state(target).direction
    }

    fn position(&self, target: CharacterRef) -> (i64, i64) {
        let state = self.state(target);
        (state.x, state.y)
    }

    fn screen_position(&self, target: CharacterRef) -> (i64, i64) {
        // Tile size 48, the authoring tool's default.
        let state = self.state(target);
        (state.x * 48 + 24, state.y * 48 + 48)
    }

    fn locate(&mut self, target: CharacterRef, x: i64, y: i64) {
        let state = self.state_mut(target);
        state.x = x;
        state.y = y;
    }

    fn swap(&mut self, first: CharacterRef, second: CharacterRef) {
        let (ax, ay) = self.position(first);
        let (bx, by) = self.position(second);
        self.locate(first, bx, by);
        self.locate(second, ax, ay);
    }

    fn set_direction(&mut self, target: CharacterRef, direction: i64) {
        self.state_mut(target).direction = direction;
    }

    fn force_move_route(&mut self, target: CharacterRef, route: &MoveRoute) {
        let state = self.state_mut(target);
        state.route = Some(route.clone());
        state.route_forcing = true;
    }

    fn is_move_route_forcing(&self, target: CharacterRef) -> bool {
        self.state(target).route_forcing
    }

    fn request_animation(&mut self, targets: &[CharacterRef], animation_id: i64) {
        for target in targets {
            self.state_mut(*target).animation_playing = true;
        }
        self.animations.push((targets.to_vec(), animation_id));
    }

    fn is_animation_playing(&self, target: CharacterRef) -> bool {
        self.state(target).animation_playing
    }

    fn request_balloon(&mut self, target: CharacterRef, balloon_id: i64) {
        let state = self.state_mut(target);
        state.balloon_playing = true;
        state.balloons.push(balloon_id);
    }

    fn is_balloon_playing(&self, target: CharacterRef) -> bool {
        self.state(target).balloon_playing
    }
}

#[derive(Debug, Default)]
pub struct MemoryScreen {
    pub fade_out_frames: Option<i64>,
    pub fade_in_frames: Option<i64>,
    pub tint: Option<(ParamValue, i64)>,
    pub flash: Option<(ParamValue, i64)>,
    pub shake: Option<(i64, i64, i64)>,
    pub weather: Option<(String, i64, i64)>,
    pub pictures: BTreeMap<i64, String>,
    pub picture_moves: Vec<i64>,
    pub picture_rotations: BTreeMap<i64, i64>,
    pub picture_tints: Vec<i64>,
}

impl ScreenOps for MemoryScreen {
    fn start_fade_out(&mut self, frames: i64) {
        self.fade_out_frames = Some(frames);
    }

    fn start_fade_in(&mut self, frames: i64) {
        self.fade_in_frames = Some(frames);
    }

    fn start_tint(&mut self, tone: &ParamValue, frames: i64) {
        self.tint = Some((tone.clone(), frames));
    }

    fn start_flash(&mut self, color: &ParamValue, frames: i64) {
        self.flash = Some((color.clone(), frames));
    }

    fn start_shake(&mut self, power: i64, speed: i64, frames: i64) {
        self.shake = Some((power, speed, frames));
    }

    fn change_weather(&mut self, kind: &str, power: i64, frames: i64) {
        self.weather = Some((kind.to_string(), power, frames));
    }

    fn show_picture(
        &mut self,
        id: i64,
        name: &str,
        _origin: i64,
        _x: i64,
        _y: i64,
        _scale_x: i64,
        _scale_y: i64,
        _opacity: i64,
        _blend_mode: i64,
    ) {
        self.pictures.insert(id, name.to_string());
    }

    fn move_picture(
        &mut self,
        id: i64,
        _origin: i64,
        _x: i64,
        _y: i64,
        _scale_x: i64,
        _scale_y: i64,
        _opacity: i64,
        _blend_mode: i64,
        _duration: i64,
        _easing: i64,
    ) {
        self.picture_moves.push(id);
    }

    fn rotate_picture(&mut self, id: i64, speed: i64) {
        self.picture_rotations.insert(id, speed);
    }

    fn tint_picture(&mut self, id: i64, _tone: &ParamValue, _duration: i64) {
        self.picture_tints.push(id);
    }

    fn erase_picture(&mut self, id: i64) {
        self.pictures.remove(&id);
    }
}

#[derive(Debug, Default)]
pub struct MemoryAudio {
    pub current_bgm: Option<AudioRequest>,
    pub saved_bgm: Option<AudioRequest>,
    pub bgm_fadeouts: Vec<i64>,
    pub current_bgs: Option<AudioRequest>,
    pub bgs_fadeouts: Vec<i64>,
    pub last_me: Option<AudioRequest>,
    pub played_se: Vec<AudioRequest>,
    pub se_stopped: bool,
}

impl AudioOps for MemoryAudio {
    fn play_bgm(&mut self, bgm: &AudioRequest) {
        self.current_bgm = Some(bgm.clone());
    }

    fn fade_out_bgm(&mut self, seconds: i64) {
        self.bgm_fadeouts.push(seconds);
        self.current_bgm = None;
    }

    fn save_bgm(&mut self) {
        self.saved_bgm = self.current_bgm.clone();
    }

    fn replay_bgm(&mut self) {
        if let Some(bgm) = self.saved_bgm.clone() {
            self.current_bgm = Some(bgm);
        }
    }

    fn play_bgs(&mut self, bgs: &AudioRequest) {
        self.current_bgs = Some(bgs.clone());
    }

    fn fade_out_bgs(&mut self, seconds: i64) {
        self.bgs_fadeouts.push(seconds);
        self.current_bgs = None;
    }

    fn play_me(&mut self, me: &AudioRequest) {
        self.last_me = Some(me.clone());
    }

    fn play_se(&mut self, se: &AudioRequest) {
        self.played_se.push(se.clone());
    }

    fn stop_se(&mut self) {
        self.se_stopped = true;
    }
}

#[derive(Debug)]
pub struct MemorySystem {
    pub battle_bgm: Option<AudioRequest>,
    pub victory_me: Option<AudioRequest>,
    pub defeat_me: Option<AudioRequest>,
    pub save_enabled: bool,
    pub menu_enabled: bool,
    pub encounter_enabled: bool,
    pub formation_enabled: bool,
    pub window_tone: ParamValue,
    pub playtime: i64,
    pub saves: i64,
    pub battles: i64,
    pub wins: i64,
    pub escapes: i64,
}

impl Default for MemorySystem {
    fn default() -> Self {
        Self {
            battle_bgm: None,
            victory_me: None,
            defeat_me: None,
            save_enabled: true,
            menu_enabled: true,
            encounter_enabled: true,
            formation_enabled: true,
            window_tone: ParamValue::Null,
            playtime: 0,
            saves: 0,
            battles: 0,
            wins: 0,
            escapes: 0,
        }
    }
}

impl SystemOps for MemorySystem {
    fn set_battle_bgm(&mut self, bgm: &AudioRequest) {
        self.battle_bgm = Some(bgm.clone());
    }

    fn set_victory_me(&mut self, me: &AudioRequest) {
        self.victory_me = Some(me.clone());
    }

    fn set_defeat_me(&mut self, me: &AudioRequest) {
        self.defeat_me = Some(me.clone());
    }

    fn set_save_enabled(&mut self, enabled: bool) {
        self.save_enabled = enabled;
    }

    fn set_menu_enabled(&mut self, enabled: bool) {
        self.menu_enabled = enabled;
    }

    fn set_encounter_enabled(&mut self, enabled: bool) {
        self.encounter_enabled = enabled;
    }

    fn set_formation_enabled(&mut self, enabled: bool) {
        self.formation_enabled = enabled;
    }

    fn set_window_tone(&mut self, tone: &ParamValue) {
        self.window_tone = tone.clone();
    }

    fn playtime_seconds(&self) -> i64 {
        self.playtime
    }

    fn save_count(&self) -> i64 {
        self.saves
    }

    fn battle_count(&self) -> i64 {
        self.battles
    }

    fn win_count(&self) -> i64 {
        self.wins
    }

    fn escape_count(&self) -> i64 {
        self.escapes
    }
}

/// Pending battle bookkeeping. `finish_battle` plays the role of the
/// battle collaborator reporting its outcome index.
#[derive(Default)]
pub struct MemoryBattle {
    pub known_troops: BTreeSet<i64>,
    pub pending: Option<(i64, bool, bool)>,
    result_callback: Option<IndexCallback>,
    pub action_forced: bool,
    pub forced_actions: Vec<BattlerRef>,
    pub aborted: bool,
}

impl MemoryBattle {
    pub fn finish_battle(&mut self, result: i64) {
        if let Some(callback) = self.result_callback.take() {
            callback(result);
        }
        self.pending = None;
    }
}

impl BattleGate for MemoryBattle {
    fn is_action_forced(&self) -> bool {
        self.action_forced
    }

    fn troop_exists(&self, troop_id: i64) -> bool {
        self.known_troops.contains(&troop_id)
    }

    fn setup_battle(
        &mut self,
        troop_id: i64,
        can_escape: bool,
        can_lose: bool,
        on_result: IndexCallback,
    ) {
        self.pending = Some((troop_id, can_escape, can_lose));
        self.result_callback = Some(on_result);
    }

    fn request_forced_action(&mut self, target: BattlerRef) {
        self.forced_actions.push(target);
        self.action_forced = true;
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[derive(Debug, Default)]
pub struct MemoryScene {
    pub changing: bool,
    pub pushed: Vec<SceneRequest>,
    pub replaced: Vec<SceneRequest>,
    pub video: Option<String>,
    pub video_playing: bool,
    pub image_loading: bool,
}

impl MemoryScene {
    /// Completes the pending scene transition.
    pub fn settle(&mut self) {
        self.changing = false;
    }
}

impl SceneGate for MemoryScene {
    fn is_changing(&self) -> bool {
        self.changing
    }

    fn push(&mut self, request: SceneRequest) {
        self.pushed.push(request);
        self.changing = true;
    }

    fn goto(&mut self, request: SceneRequest) {
        self.replaced.push(request);
        self.changing = true;
    }

    fn play_video(&mut self, name: &str) {
        self.video = Some(name.to_string());
        self.video_playing = true;
    }

    fn is_video_playing(&self) -> bool {
        self.video_playing
    }

    fn is_image_loading(&self) -> bool {
        self.image_loading
    }
}

#[derive(Debug, Default)]
pub struct MemoryInput {
    pub pressed: BTreeSet<String>,
    pub triggered: BTreeSet<String>,
    pub repeated: BTreeSet<String>,
}

impl InputState for MemoryInput {
    fn is_pressed(&self, button: &str) -> bool {
        self.pressed.contains(button)
    }

    fn is_triggered(&self, button: &str) -> bool {
        self.triggered.contains(button)
    }

    fn is_repeated(&self, button: &str) -> bool {
        self.repeated.contains(button)
    }
}

#[derive(Default)]
pub struct MemoryPlugins {
    pub calls: Vec<(String, String, ParamValue)>,
}

impl PluginRegistry for MemoryPlugins {
    fn call(&mut self, plugin_name: &str, command_name: &str, args: &ParamValue) {
        self.calls
            .push((plugin_name.to_string(), command_name.to_string(), args.clone()));
    }
}

/// The aggregate. Fields are public so tests and the runner can arrange
/// state directly instead of going through the trait surface.
#[derive(Default)]
pub struct MemoryHost {
    pub frame: u64,
    pub current_map_id: i64,
    pub common_events: BTreeMap<i64, CommandList>,
    pub message: MemoryMessage,
    pub switches: MemorySwitches,
    pub variables: MemoryVariables,
    pub self_switches: MemorySelfSwitches,
    pub timer: MemoryTimer,
    pub party: MemoryParty,
    pub actors: MemoryActors,
    pub troop: MemoryTroop,
    pub map: MemoryMap,
    pub player: MemoryPlayer,
    pub characters: MemoryCharacters,
    pub screen: MemoryScreen,
    pub audio: MemoryAudio,
    pub system: MemorySystem,
    pub battle: MemoryBattle,
    pub scene: MemoryScene,
    pub input: MemoryInput,
    pub plugins: MemoryPlugins,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            current_map_id: 1,
            ..Self::default()
        }
    }

    /// Moves the simulated frame clock forward one tick, driving the
    /// timer and any running scroll with it.
    pub fn advance_frame(&mut self) {
        self.frame += 1;
        self.timer.tick();
        self.map.tick();
    }
}

impl Host for MemoryHost {
    fn frame_count(&self) -> u64 {
        self.frame
    }

    fn map_id(&self) -> i64 {
        self.current_map_id
    }

    fn common_event(&self, id: i64) -> Option<CommandList> {
        self.common_events.get(&id).cloned()
    }

    fn message(&mut self) -> &mut dyn MessageSink {
        &mut self.message
    }

    fn switches(&mut self) -> &mut dyn SwitchStore {
        &mut self.switches
    }

    fn variables(&mut self) -> &mut dyn VariableStore {
        &mut self.variables
    }

    fn self_switches(&mut self) -> &mut dyn SelfSwitchStore {
        &mut self.self_switches
    }

    fn timer(&mut self) -> &mut dyn TimerControl {
        &mut self.timer
    }

    fn party(&mut self) -> &mut dyn PartyOps {
        &mut self.party
    }

    fn actors(&mut self) -> &mut dyn ActorStore {
        &mut self.actors
    }

    fn troop(&mut self) -> &mut dyn TroopOps {
        &mut self.troop
    }

    fn map(&mut self) -> &mut dyn MapOps {
        &mut self.map
    }

    fn player(&mut self) -> &mut dyn PlayerOps {
        &mut self.player
    }

    fn characters(&mut self) -> &mut dyn CharacterControl {
        &mut self.characters
    }

    fn screen(&mut self) -> &mut dyn ScreenOps {
        &mut self.screen
    }

    fn audio(&mut self) -> &mut dyn AudioOps {
        &mut self.audio
    }

    fn system(&mut self) -> &mut dyn SystemOps {
        &mut self.system
    }

    fn battle(&mut self) -> &mut dyn BattleGate {
        &mut self.battle
    }

    fn scene(&mut self) -> &mut dyn SceneGate {
        &mut self.scene
    }

    fn input(&mut self) -> &mut dyn InputState {
        &mut self.input
    }

    fn plugins(&mut self) -> &mut dyn PluginRegistry {
        &mut self.plugins
    }
}

#[cfg(test)]
mod memory_tests {
    use super::*;

    #[test]
    fn switch_and_variable_ids_start_at_one() {
        let mut switches = MemorySwitches::default();
        switches.set_value(0, true);
        assert!(!switches.value(0));
        let mut variables = MemoryVariables::default();
        variables.set_value(-3, 7);
        assert_eq!(variables.value(-3), 0);
    }

    #[test]
    fn turning_a_self_switch_off_drops_its_entry() {
        let mut store = MemorySelfSwitches::default();
        let key = SelfSwitchKey {
            map_id: 1,
            event_id: 4,
            switch_ch: "B".to_string(),
        };
        store.set_value(&key, true);
        assert!(store.value(&key));
        store.set_value(&key, false);
        assert!(!store.value(&key));
        assert!(store.values.is_empty());
    }

    #[test]
    fn timer_stops_itself_at_zero() {
        let mut timer = MemoryTimer::default();
        timer.start(2);
        timer.tick();
        assert!(timer.is_working());
        timer.tick();
        assert!(!timer.is_working());
        assert_eq!(timer.frames(), 0);
    }

    #[test]
    fn inventory_and_gold_never_go_negative() {
        let mut party = MemoryParty::default();
        party.gain_gold(-50);
        assert_eq!(party.gold(), 0);
        party.gain_item(ItemKind::Item, 3, 2, false);
        party.gain_item(ItemKind::Item, 3, -5, false);
        assert_eq!(party.item_count(ItemKind::Item, 3), 0);
    }

    #[test]
    fn hp_at_zero_applies_the_death_state() {
        let mut actors = MemoryActors::default();
        actors.insert_test_actor(1, "Alice", 30, 10);
        let actor = actors.entries.get_mut(&1).expect("actor exists");
        actor.gain_hp(-30);
        assert!(actor.is_dead());
        actor.remove_state(1);
        assert_eq!(actor.hp, 1);
        assert!(actor.is_alive());
    }
}
