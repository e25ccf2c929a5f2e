use serde::{Deserialize, Serialize};

use crate::value::{param_int, param_int_or, param_str, ParamValue};

/// A suspension condition armed by a command handler. The interpreter polls
/// the matching collaborator predicate each tick and resumes dispatch once
/// it clears. Character-bound variants carry the raw character selector
/// (< 0 player, 0 the owning event, > 0 a map event id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMode {
    #[default]
    None,
    Message,
    Transfer,
    Scroll,
    Route(i64),
    Animation(i64),
    Balloon(i64),
    Gather,
    Action,
    Video,
    Image,
}

/// The last decision recorded at one indent level: a conditional outcome,
/// or the index chosen in a multi-way branch (choice or battle result).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchValue {
    Bool(bool),
    Index(i64),
}

/// Key of a per-event switch: scoped to one event on one map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelfSwitchKey {
    pub map_id: i64,
    pub event_id: i64,
    pub switch_ch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Item,
    Weapon,
    Armor,
}

/// A character selector resolved against the interpreter's owning event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterRef {
    Player,
    Event(i64),
}

/// A battler resolved from a designer selector, addressed the way the
/// battle collaborator indexes its sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlerRef {
    Actor(i64),
    Enemy(usize),
}

/// A sound asset request as authored: name plus playback parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioRequest {
    pub name: String,
    pub volume: i64,
    pub pitch: i64,
    pub pan: i64,
}

impl AudioRequest {
    /// Reads an audio parameter object, tolerating missing fields the way
    /// the authoring tool leaves them out of older data files.
    pub fn from_param(param: &ParamValue) -> Self {
        let map = param.as_map();
        let field = |name: &str, default: i64| {
            map.and_then(|m| m.get(name))
                .and_then(ParamValue::as_i64)
                .unwrap_or(default)
        };
        Self {
            name: map
                .and_then(|m| m.get("name"))
                .and_then(ParamValue::as_str)
                .unwrap_or("")
                .to_string(),
            volume: field("volume", 100),
            pitch: field("pitch", 100),
            pan: field("pan", 0),
        }
    }
}

/// A presentation scene the interpreter asks the host to enter. The
/// interpreter never renders; it only gates and delegates.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneRequest {
    Battle,
    Shop {
        goods: Vec<Vec<ParamValue>>,
        purchase_only: bool,
    },
    NameInput {
        actor_id: i64,
        max_chars: i64,
    },
    Menu,
    Save,
    GameOver,
    Title,
}

/// A forced movement route: the step list plus its replay flags.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRoute {
    pub list: Vec<ParamValue>,
    pub repeat: bool,
    pub skippable: bool,
    pub wait: bool,
}

impl MoveRoute {
    pub fn from_param(param: &ParamValue) -> Self {
        let map = param.as_map();
        let flag = |name: &str| {
            map.and_then(|m| m.get(name))
                .is_some_and(ParamValue::is_truthy)
        };
        Self {
            list: map
                .and_then(|m| m.get("list"))
                .and_then(ParamValue::as_array)
                .map(<[_]>::to_vec)
                .unwrap_or_default(),
            repeat: flag("repeat"),
            skippable: flag("skippable"),
            wait: flag("wait"),
        }
    }
}

/// Parameters of a queued choice prompt, decoded from the raw slots of a
/// Show Choices command.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSetup {
    pub choices: Vec<String>,
    pub cancel_type: i64,
    pub default_type: i64,
    pub position_type: i64,
    pub background: i64,
}

impl ChoiceSetup {
    /// Decodes the positional parameters. A cancel slot past the end of the
    /// option list means "cancel is its own branch" and maps to the -2
    /// sentinel consumed by the When Cancel continuation.
    pub fn from_params(params: &[ParamValue]) -> Self {
        let choices: Vec<String> = params
            .first()
            .and_then(ParamValue::as_array)
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.as_str().unwrap_or("").to_string())
                    .collect()
            })
            .unwrap_or_default();
        let raw_cancel = param_int(params, 1);
        let cancel_type = if raw_cancel < choices.len() as i64 {
            raw_cancel
        } else {
            -2
        };
        Self {
            cancel_type,
            default_type: param_int(params, 2),
            position_type: param_int_or(params, 3, 2),
            background: param_int(params, 4),
            choices,
        }
    }
}

/// Decoded face/background/position header of a Show Text command.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHeader {
    pub face_name: String,
    pub face_index: i64,
    pub background: i64,
    pub position_type: i64,
    pub speaker_name: String,
}

impl TextHeader {
    pub fn from_params(params: &[ParamValue]) -> Self {
        Self {
            face_name: param_str(params, 0).to_string(),
            face_index: param_int(params, 1),
            background: param_int(params, 2),
            position_type: param_int(params, 3),
            speaker_name: param_str(params, 4).to_string(),
        }
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn audio_request_reads_authored_object() {
        let param: ParamValue =
            serde_json::from_str(r#"{"name":"Theme1","volume":90,"pitch":100,"pan":0}"#)
                .expect("audio param should parse");
        let request = AudioRequest::from_param(&param);
        assert_eq!(request.name, "Theme1");
        assert_eq!(request.volume, 90);
    }

    #[test]
    fn audio_request_defaults_missing_fields() {
        let request = AudioRequest::from_param(&ParamValue::Null);
        assert_eq!(request.name, "");
        assert_eq!(request.volume, 100);
        assert_eq!(request.pitch, 100);
        assert_eq!(request.pan, 0);
    }

    #[test]
    fn choice_setup_maps_out_of_range_cancel_to_sentinel() {
        let params: Vec<ParamValue> =
            serde_json::from_str(r#"[["A","B"],2,0,2,0]"#).expect("choice params should parse");
        let setup = ChoiceSetup::from_params(&params);
        assert_eq!(setup.choices, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(setup.cancel_type, -2);
    }

    #[test]
    fn choice_setup_keeps_in_range_cancel() {
        let params: Vec<ParamValue> =
            serde_json::from_str(r#"[["A","B"],1]"#).expect("choice params should parse");
        let setup = ChoiceSetup::from_params(&params);
        assert_eq!(setup.cancel_type, 1);
        assert_eq!(setup.position_type, 2);
    }

    #[test]
    fn move_route_decodes_flags() {
        let param: ParamValue =
            serde_json::from_str(r#"{"list":[{"code":1}],"repeat":false,"skippable":true,"wait":true}"#)
                .expect("route should parse");
        let route = MoveRoute::from_param(&param);
        assert_eq!(route.list.len(), 1);
        assert!(route.wait);
        assert!(route.skippable);
        assert!(!route.repeat);
    }
}
