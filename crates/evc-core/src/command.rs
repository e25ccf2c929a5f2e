use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::value::ParamValue;

/// One authored event command: an opcode, the block nesting depth it sits
/// at, and its parameter list. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCommand {
    pub code: i32,
    pub indent: usize,
    #[serde(default)]
    pub parameters: Vec<ParamValue>,
}

impl EventCommand {
    pub fn new(code: i32, indent: usize, parameters: Vec<ParamValue>) -> Self {
        Self {
            code,
            indent,
            parameters,
        }
    }
}

/// A loaded command stream. Shared between the owning event page and any
/// interpreter bound to it; the interpreter never mutates the list.
pub type CommandList = Arc<Vec<EventCommand>>;

/// Opcode numbers as the authoring tool assigns them. The continuation
/// opcodes (4xx, 6xx) belong to the control command one indent above them.
pub mod codes {
    pub const SHOW_TEXT: i32 = 101;
    pub const SHOW_CHOICES: i32 = 102;
    pub const INPUT_NUMBER: i32 = 103;
    pub const SELECT_ITEM: i32 = 104;
    pub const SHOW_SCROLLING_TEXT: i32 = 105;
    pub const COMMENT: i32 = 108;
    pub const SKIP: i32 = 109;
    pub const CONDITIONAL_BRANCH: i32 = 111;
    pub const LOOP: i32 = 112;
    pub const BREAK_LOOP: i32 = 113;
    pub const EXIT_EVENT: i32 = 115;
    pub const COMMON_EVENT: i32 = 117;
    pub const LABEL: i32 = 118;
    pub const JUMP_TO_LABEL: i32 = 119;
    pub const CONTROL_SWITCHES: i32 = 121;
    pub const CONTROL_VARIABLES: i32 = 122;
    pub const CONTROL_SELF_SWITCH: i32 = 123;
    pub const CONTROL_TIMER: i32 = 124;
    pub const CHANGE_GOLD: i32 = 125;
    pub const CHANGE_ITEMS: i32 = 126;
    pub const CHANGE_WEAPONS: i32 = 127;
    pub const CHANGE_ARMORS: i32 = 128;
    pub const CHANGE_PARTY_MEMBER: i32 = 129;
    pub const CHANGE_BATTLE_BGM: i32 = 132;
    pub const CHANGE_VICTORY_ME: i32 = 133;
    pub const CHANGE_SAVE_ACCESS: i32 = 134;
    pub const CHANGE_MENU_ACCESS: i32 = 135;
    pub const CHANGE_ENCOUNTER: i32 = 136;
    pub const CHANGE_FORMATION_ACCESS: i32 = 137;
    pub const CHANGE_WINDOW_COLOR: i32 = 138;
    pub const CHANGE_DEFEAT_ME: i32 = 139;
    pub const CHANGE_VEHICLE_BGM: i32 = 140;
    pub const TRANSFER_PLAYER: i32 = 201;
    pub const SET_VEHICLE_LOCATION: i32 = 202;
    pub const SET_EVENT_LOCATION: i32 = 203;
    pub const SCROLL_MAP: i32 = 204;
    pub const SET_MOVEMENT_ROUTE: i32 = 205;
    pub const GET_ON_OFF_VEHICLE: i32 = 206;
    pub const CHANGE_TRANSPARENCY: i32 = 211;
    pub const SHOW_ANIMATION: i32 = 212;
    pub const SHOW_BALLOON: i32 = 213;
    pub const ERASE_EVENT: i32 = 214;
    pub const CHANGE_FOLLOWERS: i32 = 216;
    pub const GATHER_FOLLOWERS: i32 = 217;
    pub const FADEOUT_SCREEN: i32 = 221;
    pub const FADEIN_SCREEN: i32 = 222;
    pub const TINT_SCREEN: i32 = 223;
    pub const FLASH_SCREEN: i32 = 224;
    pub const SHAKE_SCREEN: i32 = 225;
    pub const WAIT: i32 = 230;
    pub const SHOW_PICTURE: i32 = 231;
    pub const MOVE_PICTURE: i32 = 232;
    pub const ROTATE_PICTURE: i32 = 233;
    pub const TINT_PICTURE: i32 = 234;
    pub const ERASE_PICTURE: i32 = 235;
    pub const SET_WEATHER: i32 = 236;
    pub const PLAY_BGM: i32 = 241;
    pub const FADEOUT_BGM: i32 = 242;
    pub const SAVE_BGM: i32 = 243;
    pub const RESUME_BGM: i32 = 244;
    pub const PLAY_BGS: i32 = 245;
    pub const FADEOUT_BGS: i32 = 246;
    pub const PLAY_ME: i32 = 249;
    pub const PLAY_SE: i32 = 250;
    pub const STOP_SE: i32 = 251;
    pub const PLAY_MOVIE: i32 = 261;
    pub const CHANGE_MAP_NAME_DISPLAY: i32 = 281;
    pub const CHANGE_BATTLEBACK: i32 = 283;
    pub const CHANGE_PARALLAX: i32 = 284;
    pub const GET_LOCATION_INFO: i32 = 285;
    pub const BATTLE_PROCESSING: i32 = 301;
    pub const SHOP_PROCESSING: i32 = 302;
    pub const NAME_INPUT: i32 = 303;
    pub const CHANGE_HP: i32 = 311;
    pub const CHANGE_MP: i32 = 312;
    pub const CHANGE_STATE: i32 = 313;
    pub const RECOVER_ALL: i32 = 314;
    pub const CHANGE_EXP: i32 = 315;
    pub const CHANGE_LEVEL: i32 = 316;
    pub const CHANGE_PARAMETER: i32 = 317;
    pub const CHANGE_SKILL: i32 = 318;
    pub const CHANGE_EQUIPMENT: i32 = 319;
    pub const CHANGE_NAME: i32 = 320;
    pub const CHANGE_CLASS: i32 = 321;
    pub const CHANGE_NICKNAME: i32 = 324;
    pub const CHANGE_PROFILE: i32 = 325;
    pub const CHANGE_TP: i32 = 326;
    pub const CHANGE_ENEMY_HP: i32 = 331;
    pub const CHANGE_ENEMY_MP: i32 = 332;
    pub const CHANGE_ENEMY_STATE: i32 = 333;
    pub const ENEMY_RECOVER_ALL: i32 = 334;
    pub const ENEMY_APPEAR: i32 = 335;
    pub const ENEMY_TRANSFORM: i32 = 336;
    pub const SHOW_BATTLE_ANIMATION: i32 = 337;
    pub const FORCE_ACTION: i32 = 339;
    pub const ABORT_BATTLE: i32 = 340;
    pub const CHANGE_ENEMY_TP: i32 = 342;
    pub const OPEN_MENU: i32 = 351;
    pub const OPEN_SAVE: i32 = 352;
    pub const GAME_OVER: i32 = 353;
    pub const RETURN_TO_TITLE: i32 = 354;
    pub const SCRIPT: i32 = 355;
    pub const PLUGIN_COMMAND: i32 = 357;
    pub const TEXT_LINE: i32 = 401;
    pub const WHEN_CHOICE: i32 = 402;
    pub const WHEN_CANCEL: i32 = 403;
    pub const SCROLLING_TEXT_LINE: i32 = 405;
    pub const COMMENT_LINE: i32 = 408;
    pub const ELSE: i32 = 411;
    pub const REPEAT_ABOVE: i32 = 413;
    pub const IF_WIN: i32 = 601;
    pub const IF_ESCAPE: i32 = 602;
    pub const IF_LOSE: i32 = 603;
    pub const SHOP_GOODS_LINE: i32 = 605;
    pub const SCRIPT_LINE: i32 = 655;
}
